/// Static ETH→USD conversion. The rate is read from configuration once at
/// startup; a live price feed is deliberately out of scope here.
#[derive(Debug, Clone, Copy)]
pub struct UsdConverter {
    eth_price_usd: f64,
}

impl UsdConverter {
    pub fn new(eth_price_usd: f64) -> Self {
        Self { eth_price_usd }
    }

    pub fn rate(&self) -> f64 {
        self.eth_price_usd
    }

    pub fn to_usd(&self, amount_eth: f64) -> f64 {
        amount_eth * self.eth_price_usd
    }
}
