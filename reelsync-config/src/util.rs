use std::time::Duration;

/// Parse a float from an env-style value. Blank input counts as unset.
pub fn parse_f64(raw: &str) -> Option<Result<f64, std::num::ParseFloatError>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.parse::<f64>())
    }
}

/// Render a duration the way config files spell it ("500ms", "2s").
pub fn display_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Serde adapter for durations written in humantime form. Bare integers are
/// read as milliseconds.
pub mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Millis(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => humantime::parse_duration(text.trim()).map_err(|err| {
                de::Error::custom(format!("invalid duration '{text}': {err}"))
            }),
            Raw::Millis(ms) => Ok(Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_unset() {
        assert!(parse_f64("  ").is_none());
        assert_eq!(parse_f64(" 1.5 ").map(Result::ok), Some(Some(1.5)));
        assert!(parse_f64("fast").is_some_and(|parsed| parsed.is_err()));
    }

    #[test]
    fn durations_render_in_humantime_form() {
        assert_eq!(display_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(display_duration(Duration::from_secs(2)), "2s");
    }
}
