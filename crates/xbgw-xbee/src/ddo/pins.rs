//! Digital output pin names and values

use crate::error::XBeeCommandError;

/// Highest addressable I/O pin
pub const MAX_PIN: u8 = 12;

/// Pin setting value: digital output, driven low
pub const OUTPUT_LOW: u32 = 4;
/// Pin setting value: digital output, driven high
pub const OUTPUT_HIGH: u32 = 5;

/// Alternate-function names that are refused in favour of `DIOn`/`Dn`
fn deprecated_alias(name: &str) -> Option<u8> {
    let pin = match name {
        "ASSOC" => 5,
        "RTS" => 6,
        "CTS" => 7,
        "DTR" | "SLEEP_RQ" => 8,
        "ON" | "SLEEP" => 9,
        "PWM0" | "RSSI" | "P0" => 10,
        "PWM" | "P1" => 11,
        "P2" => 12,
        _ => return analog_alias(name),
    };
    Some(pin)
}

fn analog_alias(name: &str) -> Option<u8> {
    let n: u8 = name.strip_prefix("AD")?.parse().ok()?;
    (n < 7 && name.len() == 3).then_some(n)
}

/// `DIO0`..`DIO12` and `D0`..`D9`
fn accepted_name(name: &str) -> Option<u8> {
    let (digits, max) = match name.strip_prefix("DIO") {
        Some(rest) => (rest, MAX_PIN),
        None => (name.strip_prefix('D')?, 9),
    };
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // No leading zeros: "D05" is not a pin name
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok().filter(|&n: &u8| n <= max)
}

/// Names that may be used for `pin`
fn suggestions(pin: u8) -> String {
    if pin < 10 {
        format!("DIO{pin} or D{pin}")
    } else {
        format!("DIO{pin}")
    }
}

/// Resolve the `index`/`name` attributes of a digital output command to a
/// pin number. Empty attribute values count as absent, but an attribute
/// that is present at all conflicts with the other one.
pub fn resolve_pin(index: Option<&str>, name: Option<&str>) -> Result<u8, XBeeCommandError> {
    let given = |v: Option<&str>| v.is_some_and(|s| !s.is_empty());

    if !given(index) && !given(name) {
        return Err(XBeeCommandError::MissingAttr(
            "No digital output pin number (attribute 'index') or name alias (attribute 'name') given"
                .to_string(),
        ));
    }
    if index.is_some() && name.is_some() {
        return Err(XBeeCommandError::TooManyAttrs(
            "Must specify only an index or a name, not both.".to_string(),
        ));
    }

    let pin = if let Some(index) = index {
        index
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|n| u8::try_from(n).ok())
            .filter(|&n| n <= MAX_PIN)
            .ok_or_else(|| {
                XBeeCommandError::InvalidAttr(
                    "Pin number ('index') must be an integer between 0 and 12".to_string(),
                )
            })?
    } else {
        let name = name.unwrap_or_default();
        if let Some(pin) = deprecated_alias(name) {
            return Err(XBeeCommandError::InvalidAttr(format!(
                "Bad digital output name; use {} instead.",
                suggestions(pin)
            )));
        }
        accepted_name(name).ok_or_else(|| {
            XBeeCommandError::InvalidAttr(format!("Unrecognized digital output name: '{}'", name))
        })?
    };

    if pin == 9 {
        return Err(XBeeCommandError::InvalidAttr(
            "DIO9 cannot be configured for digital".to_string(),
        ));
    }
    Ok(pin)
}

/// Remote setting name for a pin: `Dn` below 10, `P(n-10)` above
pub fn pin_setting(pin: u8) -> [u8; 2] {
    if pin < 10 {
        [b'D', b'0' + pin]
    } else {
        [b'P', b'0' + (pin - 10)]
    }
}

/// Parse a digital output value into its pin setting
pub fn parse_digital_value(value: &str) -> Option<u32> {
    match value.to_ascii_lowercase().as_str() {
        "low" | "n" | "no" | "f" | "false" | "off" | "0" => Some(OUTPUT_LOW),
        "high" | "y" | "yes" | "t" | "true" | "on" | "1" => Some(OUTPUT_HIGH),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(err: XBeeCommandError) -> String {
        use xbgw_core::CommandError;
        err.hint().unwrap_or_default()
    }

    #[test]
    fn index_and_names_resolve() {
        assert_eq!(resolve_pin(Some("5"), None), Ok(5));
        assert_eq!(resolve_pin(Some(" 12 "), None), Ok(12));
        assert_eq!(resolve_pin(None, Some("DIO3")), Ok(3));
        assert_eq!(resolve_pin(None, Some("D3")), Ok(3));
        assert_eq!(resolve_pin(None, Some("DIO11")), Ok(11));
    }

    #[test]
    fn missing_and_conflicting_attributes() {
        assert!(matches!(resolve_pin(None, None), Err(XBeeCommandError::MissingAttr(_))));
        assert!(matches!(resolve_pin(Some(""), None), Err(XBeeCommandError::MissingAttr(_))));
        assert!(matches!(
            resolve_pin(Some("1"), Some("D1")),
            Err(XBeeCommandError::TooManyAttrs(_))
        ));
        // Present but empty still conflicts
        assert!(matches!(
            resolve_pin(Some(""), Some("D1")),
            Err(XBeeCommandError::TooManyAttrs(_))
        ));
    }

    #[test]
    fn bad_indexes() {
        for index in ["13", "-1", "abc", "1.5"] {
            assert_eq!(
                hint(resolve_pin(Some(index), None).unwrap_err()),
                "Pin number ('index') must be an integer between 0 and 12",
                "index {index}"
            );
        }
    }

    #[test]
    fn deprecated_names_suggest_replacements() {
        assert_eq!(
            hint(resolve_pin(None, Some("AD5")).unwrap_err()),
            "Bad digital output name; use DIO5 or D5 instead."
        );
        assert_eq!(
            hint(resolve_pin(None, Some("PWM0")).unwrap_err()),
            "Bad digital output name; use DIO10 instead."
        );
        assert_eq!(
            hint(resolve_pin(None, Some("SLEEP_RQ")).unwrap_err()),
            "Bad digital output name; use DIO8 or D8 instead."
        );
    }

    #[test]
    fn unrecognized_names() {
        for name in ["DIO13", "D10", "dio1", "X"] {
            assert_eq!(
                hint(resolve_pin(None, Some(name)).unwrap_err()),
                format!("Unrecognized digital output name: '{name}'")
            );
        }
    }

    #[test]
    fn pin_nine_is_refused() {
        assert_eq!(
            hint(resolve_pin(Some("9"), None).unwrap_err()),
            "DIO9 cannot be configured for digital"
        );
        assert!(resolve_pin(None, Some("DIO9")).is_err());
    }

    #[test]
    fn settings_and_values() {
        assert_eq!(&pin_setting(5), b"D5");
        assert_eq!(&pin_setting(10), b"P0");
        assert_eq!(&pin_setting(12), b"P2");

        assert_eq!(parse_digital_value("HIGH"), Some(OUTPUT_HIGH));
        assert_eq!(parse_digital_value("On"), Some(OUTPUT_HIGH));
        assert_eq!(parse_digital_value("0"), Some(OUTPUT_LOW));
        assert_eq!(parse_digital_value("low"), Some(OUTPUT_LOW));
        assert_eq!(parse_digital_value("maybe"), None);
        assert_eq!(parse_digital_value(""), None);
    }
}
