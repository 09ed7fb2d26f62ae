//! Result formatting for display and speech.

/// Upper bound for the decimal places setting.
pub const MAX_DECIMAL_PLACES: u8 = 10;

/// Render a finite value for display.
///
/// Integral values print without a decimal point. Everything else is rounded
/// to `decimal_places` and printed in its shortest form, so trailing zeros
/// never appear (`2.50` prints as `2.5`).
pub fn format_result(value: f64, decimal_places: u8) -> String {
    if value.fract() == 0.0 {
        return render(value);
    }

    let factor = 10f64.powi(i32::from(decimal_places.min(MAX_DECIMAL_PLACES)));
    let rounded = (value * factor).round() / factor;
    render(rounded)
}

fn render(value: f64) -> String {
    // Avoids printing "-0".
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}
