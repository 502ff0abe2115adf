//! Number formatting for generated markup.
//!
//! Every number written into output documents goes through [`fmt_num`] so the
//! text matches ECMAScript's `Number.prototype.toString`: whole numbers carry
//! no `.0` suffix and the shortest round-trippable decimal is used.

/// Formats a number the way a browser would print it into an attribute.
///
/// Non-finite values are written as `NaN`, `Infinity` or `-Infinity` rather
/// than being rejected. Negative zero prints as `0`.
pub fn fmt_num(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let mut buf = ryu_js::Buffer::new();
    buf.format_finite(value).to_string()
}

/// Linear interpolation between `start` and `end`.
pub fn lerp(start: f64, end: f64, progress: f64) -> f64 {
    start + (end - start) * progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_have_no_fraction() {
        assert_eq!(fmt_num(256.0), "256");
        assert_eq!(fmt_num(-256.0), "-256");
        assert_eq!(fmt_num(-0.0), "0");
    }

    #[test]
    fn fractions_use_shortest_form() {
        assert_eq!(fmt_num(10.0 / 100.0 * 256.0), "25.6");
        assert_eq!(fmt_num(1.5), "1.5");
        assert_eq!(fmt_num(0.35), "0.35");
    }

    #[test]
    fn non_finite_values_propagate() {
        assert_eq!(fmt_num(f64::NAN), "NaN");
        assert_eq!(fmt_num(f64::INFINITY), "Infinity");
        assert_eq!(fmt_num(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn lerp_midpoint() {
        assert_eq!(lerp(0.0, 100.0, 0.5), 50.0);
        assert_eq!(lerp(1.0, 2.0, 0.5), 1.5);
    }
}
