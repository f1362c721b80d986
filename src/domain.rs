use ethers_core::types::{Address, H256};

/// Surge taxonomy carried in the alert vocabulary. Only `Capital` is fired
/// by the current detector; the other two are reserved codes understood by
/// the AlertVault contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurgeKind {
    Capital,
    Velocity,
    Group,
}

impl SurgeKind {
    pub fn code(self) -> u8 {
        match self {
            SurgeKind::Capital => 1,
            SurgeKind::Velocity => 2,
            SurgeKind::Group => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SurgeKind::Capital => "Capital Surge",
            SurgeKind::Velocity => "Velocity Surge",
            SurgeKind::Group => "Group Surge",
        }
    }
}

/// Outcome of evaluating one address after a qualifying transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fire(SurgeKind),
    Suppress(SuppressReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    BelowThreshold,
    CooldownActive,
}

/// A transaction that passed the filter: non-zero value, has a recipient,
/// converted USD value at or above the qualifying minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedTransfer {
    pub recipient: Address,
    pub value_usd: f64,
    pub tx_hash: H256,
}

/// Handle returned by a successful alert dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub tx_hash: H256,
}

#[cfg(test)]
mod tests {
    use super::SurgeKind;

    #[test]
    fn surge_codes_match_contract_vocabulary() {
        assert_eq!(SurgeKind::Capital.code(), 1);
        assert_eq!(SurgeKind::Velocity.code(), 2);
        assert_eq!(SurgeKind::Group.code(), 3);
        assert_eq!(SurgeKind::Capital.label(), "Capital Surge");
    }
}
