pub fn mask_url(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let scheme = &url[..scheme_end + 3];
        if let Some(host_end) = url[scheme_end + 3..].find('/') {
            let host = &url[scheme_end + 3..scheme_end + 3 + host_end];
            return format!("{scheme}{host}/***/");
        }
        let host = &url[scheme_end + 3..];
        if !host.is_empty() {
            return format!("{scheme}{host}");
        }
    }
    "***".to_string()
}

/// Dollar amount with thousands separators for operator logs,
/// e.g. `$1,250,000.50`.
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}
