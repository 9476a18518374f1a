//! Utility functions and helpers

/// Format a monetary amount for the console table
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Format an optional rate as a percentage, "--" when undefined
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:6.2}%", r * 100.0),
        None => "     --".to_string(),
    }
}
