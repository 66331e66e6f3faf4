//! Display formatting for valuation figures.
//!
//! Currency is whole US dollars, shares are whole shares, and percentages
//! carry two decimals with an explicit sign.

/// `322500.0` becomes `$322,500`; negatives become `-$50,000`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return String::from("n/a");
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs()))
}

/// `4000.0` becomes `4,000`.
pub fn format_shares(value: f64) -> String {
    if !value.is_finite() {
        return String::from("n/a");
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(rounded.abs()))
}

/// `50.0` becomes `+50.00%`.
pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return String::from("n/a");
    }
    if value >= 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}

/// Two-decimal price such as `$314.69`.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return String::from("n/a");
    }
    format!("${value:.2}")
}

fn group_thousands(whole: f64) -> String {
    let digits = format!("{whole:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
