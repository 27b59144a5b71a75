//! Conversion between playback positions in seconds and the `M:SS` labels
//! shown next to tagged events.

/// Longest text accepted while a time label is still being typed.
const MAX_PARTIAL_LEN: usize = 5;

/// Render a playback position as `M:SS`, truncating to whole seconds.
///
/// Minutes are not padded and grow past 59 (`3725.0` renders as `62:05`).
pub fn format(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Parse a complete `M:SS` / `MM:SS` label into seconds.
///
/// Only one or two minute digits and exactly two second digits are accepted.
/// The seconds field is not range checked, so `1:75` yields `135.0`.
pub fn parse(text: &str) -> Option<f64> {
    let (minutes, seconds) = text.split_once(':')?;
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    if !(1..=2).contains(&minutes.len()) || seconds.len() != 2 {
        return None;
    }
    if !all_digits(minutes) || !all_digits(seconds) {
        return None;
    }

    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    Some(f64::from(minutes * 60 + seconds))
}

/// Whether `text` looks like a label still being typed: short enough to grow
/// into a full `MM:SS` but not parseable yet.
pub fn is_partial(text: &str) -> bool {
    text.len() <= MAX_PARTIAL_LEN && parse(text).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_and_fractional_seconds() {
        assert_eq!(format(0.0), "0:00");
        assert_eq!(format(59.99), "0:59");
        assert_eq!(format(125.4), "2:05");
        assert_eq!(format(3725.0), "62:05");
    }

    #[test]
    fn clamps_invalid_positions() {
        assert_eq!(format(-3.0), "0:00");
        assert_eq!(format(f64::NAN), "0:00");
        assert_eq!(format(f64::INFINITY), "0:00");
    }

    #[test]
    fn parses_valid_labels() {
        assert_eq!(parse("2:05"), Some(125.0));
        assert_eq!(parse("02:05"), Some(125.0));
        assert_eq!(parse("99:59"), Some(5999.0));
        assert_eq!(parse("1:75"), Some(135.0));
    }

    #[test]
    fn rejects_malformed_labels() {
        for text in ["", ":", "2:5", "123:00", "2:050", "a:00", "2-05", "2:0x", " 2:05", "+1:00"] {
            assert_eq!(parse(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn canonical_labels_round_trip() {
        for minutes in 0..=99 {
            for seconds in 0..=59 {
                let label = format!("{minutes}:{seconds:02}");
                let parsed = parse(&label).unwrap();
                assert_eq!(format(parsed), label);
            }
        }
    }

    #[test]
    fn detects_partial_input() {
        assert!(is_partial(""));
        assert!(is_partial("1"));
        assert!(is_partial("12:"));
        assert!(is_partial("12:3"));
        assert!(!is_partial("12:34"));
        assert!(!is_partial("123:45"));
    }
}
