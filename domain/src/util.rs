//! Shared utility functions.

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary, appending `...` when anything was cut.
///
/// Used to keep error details attached to invocations bounded.
pub fn truncate_detail(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes.saturating_sub(3);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Serde adapter storing a [`Duration`](std::time::Duration) as integer milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Same as [`duration_ms`] for optional durations.
pub mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_detail("refused", 64), "refused");
    }

    #[test]
    fn truncate_ascii_with_ellipsis() {
        assert_eq!(truncate_detail("connection reset by peer", 13), "connection...");
    }

    #[test]
    fn truncate_multibyte_boundary() {
        // Each kana is 3 bytes; max 8 leaves 5 bytes of budget, backing up to 3
        assert_eq!(truncate_detail("あのね", 8), "あ...");
    }

    #[test]
    fn duration_ms_round_trip_through_json() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Holder {
            #[serde(with = "duration_ms")]
            timeout: std::time::Duration,
        }

        let json = serde_json::to_string(&Holder {
            timeout: std::time::Duration::from_millis(2500),
        })
        .unwrap();
        assert_eq!(json, r#"{"timeout":2500}"#);
    }
}
