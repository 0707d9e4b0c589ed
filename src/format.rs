//! Readout formatting for bounded floating-point parameters.
//!
//! A float slider spans `[min, max]` in 1000 steps, so showing the raw `f64` would
//! print noise digits. [`format_value`] keeps only the digits that are meaningful
//! for the slider's range: the finest distinguishable step is taken to be
//! `(max - min) / 5000`, and the number of significant digits is the distance in
//! decades between that step and the value itself.

/// Divisor turning a range span into its smallest distinguishable step.
const SENSITIVITY_DIVISOR: f64 = 5000.0;

/// Upper bound for significant digits (same limit as ECMAScript `toPrecision`).
const MAX_SIGNIFICANT_DIGITS: usize = 100;

/// Formats `value` with as many significant digits as the `[min, max]` range can resolve.
///
/// Always keeps at least one significant digit. `value == 0.0` is valid: the noise
/// floor stands in for the undefined `log10(0)`. When the range is empty, inverted
/// or not finite, the plain value is returned unchanged.
///
/// ```
/// use param_panel::format::format_value;
///
/// assert_eq!(format_value(1.0, 0.01, 2.0), "1.00");
/// assert_eq!(format_value(123.456, 0.0, 1000.0), "123");
/// ```
pub fn format_value(value: f64, min: f64, max: f64) -> String {
    if !value.is_finite() || !min.is_finite() || !max.is_finite() || min >= max {
        return value.to_string();
    }
    to_precision(value, significant_digits(value, min, max))
}

/// Number of significant digits [`format_value`] uses for `value` over `[min, max]`.
pub fn significant_digits(value: f64, min: f64, max: f64) -> usize {
    let sensitivity = (max - min) / SENSITIVITY_DIVISOR;
    let noise_floor = round_half_up(sensitivity.log10());
    let magnitude = if value == 0.0 {
        noise_floor
    } else {
        round_half_up(value.abs().log10())
    };

    let digits = (magnitude - noise_floor).max(1.0);
    (digits as usize).min(MAX_SIGNIFICANT_DIGITS)
}

// Ties go toward +infinity, so -2.5 rounds to -2.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Every `f64` has an exact decimal expansion of at most 767 significant digits.
const EXACT_DIGITS: usize = 800;

/// Renders `value` with `digits` significant digits.
///
/// Follows the ECMAScript `Number.prototype.toPrecision` layout: fixed notation
/// when the decimal exponent `e` satisfies `-6 <= e < digits`, exponential
/// notation (`1.2e+7`, `5e-8`) otherwise. Rounding works on the exact binary
/// value and sends ties away from zero, so `0.125` at two digits is `0.13`.
pub fn to_precision(value: f64, digits: usize) -> String {
    let digits = digits.clamp(1, MAX_SIGNIFICANT_DIGITS);
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let (significand, exponent) = if value == 0.0 {
        ("0".repeat(digits), 0)
    } else {
        round_significand(value.abs(), digits)
    };

    if exponent < -6 || exponent >= digits as i32 {
        let (lead, rest) = significand.split_at(1);
        let point = if rest.is_empty() { "" } else { "." };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{lead}{point}{rest}e{exp_sign}{}", exponent.unsigned_abs())
    } else if exponent >= 0 {
        let (integer, fraction) = significand.split_at(exponent as usize + 1);
        if fraction.is_empty() {
            format!("{sign}{integer}")
        } else {
            format!("{sign}{integer}.{fraction}")
        }
    } else {
        let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
        format!("{sign}0.{zeros}{significand}")
    }
}

/// First `digits` decimal digits of `magnitude` and its decimal exponent.
fn round_significand(magnitude: f64, digits: usize) -> (String, i32) {
    let exact = format!("{:.*e}", EXACT_DIGITS, magnitude);
    let (mantissa, exponent) = exact.split_once('e').unwrap_or((exact.as_str(), "0"));
    let mut exponent: i32 = exponent.parse().unwrap_or(0);

    let all: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();
    let mut kept: Vec<u8> = all.iter().copied().take(digits).collect();
    kept.resize(digits, b'0');

    if all.get(digits).is_some_and(|next| *next >= b'5') {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        // 9.99 -> 10.0: shift in a leading one
        if carry {
            kept.insert(0, b'1');
            kept.truncate(digits);
            exponent += 1;
        }
    }

    (kept.into_iter().map(char::from).collect(), exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_slider_readout() {
        // 0.01..2 -> step 0.000398, noise floor 1e-3
        assert_eq!(format_value(1.0, 0.01, 2.0), "1.00");
        assert_eq!(format_value(0.5, 0.01, 2.0), "0.500");
        assert_eq!(format_value(1.23456, 0.01, 2.0), "1.23");
    }

    #[test]
    fn zero_keeps_one_digit() {
        assert_eq!(format_value(0.0, 0.0, 1.0), "0");
        assert_eq!(format_value(0.0, -5.0, 3.0), "0");
    }

    #[test]
    fn near_noise_floor_collapses_to_one_digit() {
        // Step 2e-4 -> noise floor 1e-4 (rounded log10 is -4); value ~1e-4
        assert_eq!(significant_digits(0.0001, 0.0, 1.0), 1);
        assert_eq!(format_value(0.00012, 0.0, 1.0), "0.0001");
    }

    #[test]
    fn large_values_get_more_digits() {
        // 0..1000 -> step 0.2, noise floor 1e-1
        assert_eq!(significant_digits(123.456, 0.0, 1000.0), 3);
        assert_eq!(format_value(-123.456, 0.0, 1000.0), "-123");
        assert_eq!(significant_digits(123.456, 0.0, 10.0), 5);
        assert_eq!(format_value(123.456, 0.0, 10.0), "123.46");
    }

    #[test]
    fn degenerate_range_returns_raw_value() {
        assert_eq!(format_value(1.5, 2.0, 2.0), "1.5");
        assert_eq!(format_value(1.5, 3.0, 2.0), "1.5");
        assert_eq!(format_value(1.5, f64::NAN, 2.0), "1.5");
    }

    #[test]
    fn to_precision_matches_ecmascript_layout() {
        assert_eq!(to_precision(123.456, 2), "1.2e+2");
        assert_eq!(to_precision(123.456, 3), "123");
        assert_eq!(to_precision(0.000123, 2), "0.00012");
        assert_eq!(to_precision(0.0000000123, 2), "1.2e-8");
        assert_eq!(to_precision(9.99, 2), "10");
        assert_eq!(to_precision(0.0, 3), "0.00");
        assert_eq!(to_precision(-1.5, 1), "-2");
        assert_eq!(to_precision(1.5e21, 3), "1.50e+21");
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(to_precision(0.125, 2), "0.13");
        assert_eq!(to_precision(2.5, 1), "3");
        assert_eq!(to_precision(0.25, 1), "0.3");
        assert_eq!(to_precision(-0.125, 2), "-0.13");
        assert_eq!(to_precision(0.375, 2), "0.38");
        // 0.15 is stored just below the tie
        assert_eq!(to_precision(0.15, 1), "0.1");
        assert_eq!(format_value(0.125, 0.0, 5.0), "0.13");
    }

    #[test]
    fn output_stays_within_precision_step() {
        let ranges = [(0.0, 1.0), (0.01, 2.0), (-5.0, 3.0), (-1000.0, 1000.0), (0.0, 50.0)];
        for (min, max) in ranges {
            let noise = round_half_up(((max - min) / SENSITIVITY_DIVISOR).log10());
            let tolerance = 10f64.powf(noise + 1.0);
            for i in 0..=200 {
                let value = min + (max - min) * f64::from(i) / 200.0;
                let shown = format_value(value, min, max);
                let parsed: f64 = shown.parse().unwrap_or(f64::NAN);
                assert!(
                    (parsed - value).abs() <= tolerance,
                    "{value} over [{min}, {max}] shown as {shown}"
                );
            }
        }
    }
}
