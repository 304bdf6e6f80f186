/// Format an amount in Colombian pesos: rounded to the peso, `.` as the
/// thousands separator, e.g. `$10.000`.
pub fn format_cop(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Render a quantity without a trailing `.0` for whole numbers. Fractions
/// show up to three decimals; anything smaller prints in full.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        return format!("{quantity:.0}");
    }
    let s = format!("{quantity:.3}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "0" {
        quantity.to_string()
    } else {
        trimmed.to_string()
    }
}
