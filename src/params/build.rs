//! Square build animation inputs.

/// Shortest allowed interval between build steps (seconds)
pub const MIN_STEP_S: f64 = 0.1;

/// Step interval used when the user input is empty or unparsable (seconds)
pub const DEFAULT_STEP_S: f64 = 1.0;

/// Odd harmonic count used when the user input is empty or unparsable
pub const DEFAULT_ODD_COUNT: usize = 32;

/// Normalized parameters of one build run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildSettings {
    /// Number of odd harmonics to enable, within `[1, ceil(total / 2)]`
    pub target_odd_count: usize,

    /// Wall-clock interval between steps (seconds, at least `MIN_STEP_S`)
    pub step_s: f64,
}

impl BuildSettings {
    /// Clamp numeric inputs into range. Never fails.
    pub fn clamped(target_odd_count: usize, step_s: f64, total_partials: usize) -> Self {
        let max_odd = total_partials.div_ceil(2).max(1);
        // NaN fails every comparison, so route it to the floor explicitly
        let step_s = if step_s.is_nan() {
            MIN_STEP_S
        } else {
            step_s.max(MIN_STEP_S)
        };
        Self {
            target_odd_count: target_odd_count.clamp(1, max_odd),
            step_s,
        }
    }

    /// Coerce raw user text into settings.
    ///
    /// Only the numeric prefix is read (`"0.5s"` is half a second). Unparsable or
    /// zero values fall back to the defaults before clamping, so `"abc"` becomes
    /// a one second step and `"0"` becomes 32 harmonics.
    pub fn from_raw(step_text: &str, count_text: &str, total_partials: usize) -> Self {
        let step_s = leading_float(step_text)
            .filter(|v| v.is_finite() && *v != 0.0)
            .unwrap_or(DEFAULT_STEP_S);

        let count = leading_integer(count_text)
            .filter(|v| *v != 0)
            .unwrap_or(DEFAULT_ODD_COUNT as i64);

        Self::clamped(count.max(0) as usize, step_s, total_partials)
    }
}

/// Parse the integer prefix of `text` ("12.5" -> 12, "7 odd" -> 7)
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign_len = usize::from(text.starts_with(['-', '+']));
    let digits = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    text[..sign_len + digits].parse().ok()
}

/// Parse the decimal prefix of `text` ("0.5s" -> 0.5, "2e1 sec" -> 20, ".5" -> 0.5)
fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(text.starts_with(['-', '+']));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'-' | b'+')));
        let exp_digits = digits_from(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }

    text[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_out_of_range_inputs() {
        let settings = BuildSettings::clamped(1000, 0.0001, 64);
        assert_eq!(settings.target_odd_count, 32);
        assert_eq!(settings.step_s, 0.1);

        let settings = BuildSettings::clamped(0, f64::NAN, 64);
        assert_eq!(settings.target_odd_count, 1);
        assert_eq!(settings.step_s, MIN_STEP_S);
    }

    #[test]
    fn test_in_range_inputs_pass_through() {
        let settings = BuildSettings::clamped(5, 0.5, 64);
        assert_eq!(settings.target_odd_count, 5);
        assert_eq!(settings.step_s, 0.5);
    }

    #[test]
    fn test_raw_text_is_coerced() {
        let settings = BuildSettings::from_raw("abc", "xyz", 64);
        assert_eq!(settings.step_s, DEFAULT_STEP_S);
        assert_eq!(settings.target_odd_count, DEFAULT_ODD_COUNT);

        let settings = BuildSettings::from_raw("0", "0", 64);
        assert_eq!(settings.step_s, DEFAULT_STEP_S);
        assert_eq!(settings.target_odd_count, DEFAULT_ODD_COUNT);

        let settings = BuildSettings::from_raw(" 0.25 ", "7.9", 64);
        assert_eq!(settings.step_s, 0.25);
        assert_eq!(settings.target_odd_count, 7);

        let settings = BuildSettings::from_raw("0.5s", "7 odd", 64);
        assert_eq!(settings.step_s, 0.5);
        assert_eq!(settings.target_odd_count, 7);

        let settings = BuildSettings::from_raw("2 sec", "3", 64);
        assert_eq!(settings.step_s, 2.0);

        let settings = BuildSettings::from_raw("-3", "-4", 64);
        assert_eq!(settings.step_s, MIN_STEP_S);
        assert_eq!(settings.target_odd_count, 1);
    }

    #[test]
    fn test_leading_float() {
        assert_eq!(leading_float("0.5s"), Some(0.5));
        assert_eq!(leading_float("  .25"), Some(0.25));
        assert_eq!(leading_float("3."), Some(3.0));
        assert_eq!(leading_float("-1.5e1x"), Some(-15.0));
        assert_eq!(leading_float("2e"), Some(2.0));
        assert_eq!(leading_float("1.2.3"), Some(1.2));
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("-"), None);
        assert_eq!(leading_float("abc"), None);
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("12.5"), Some(12));
        assert_eq!(leading_integer("  +3x"), Some(3));
        assert_eq!(leading_integer("-"), None);
        assert_eq!(leading_integer(""), None);
    }
}
