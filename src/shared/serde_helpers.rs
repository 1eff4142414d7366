//! Serde helpers for loosely-typed client input.

/// Lenient deserializer for optional timestamps.
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD` dates (midnight UTC), naive
/// `YYYY-MM-DDTHH:MM:SS` timestamps (read as UTC), epoch milliseconds,
/// `null` and the empty string. Use with
/// `#[serde(default, deserialize_with = "flexible_datetime::deserialize")]`.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => parse_str(&s).map_err(de::Error::custom),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", n))),
            Some(other) => Err(de::Error::custom(format!(
                "expected a date string or timestamp, got {}",
                other
            ))),
        }
    }

    pub fn parse_str(raw: &str) -> Result<Option<DateTime<Utc>>, String> {
        let s = raw.trim();
        if s.is_empty() {
            return Ok(None);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Some(naive.and_utc()));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Some(naive.and_utc()))
            .ok_or_else(|| format!("invalid date: '{}'", s))
    }
}

/// Cast a JSON scalar to text the way a loosely-typed document store does.
/// `null` means unset; arrays and objects are rejected.
fn scalar_to_string(value: serde_json::Value) -> Result<Option<String>, String> {
    use serde_json::Value;

    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected a string, got {}", other)),
    }
}

/// Optional text field that also takes numbers and booleans (`5` -> `"5"`).
///
/// Pair with `#[serde(default)]` on the field or container.
pub mod flexible_string {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None => Ok(None),
            Some(value) => super::scalar_to_string(value).map_err(de::Error::custom),
        }
    }
}

/// List of strings that also takes a single scalar (`"Ann"` -> `["Ann"]`).
/// A `null` value reads as empty and `null` entries are skipped.
pub mod flexible_string_list {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = match Option::<Value>::deserialize(deserializer)? {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(scalar) => vec![scalar],
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(s) = super::scalar_to_string(item).map_err(de::Error::custom)? {
                out.push(s);
            }
        }
        Ok(out)
    }
}

/// Boolean that also takes `"true"`/`"false"`, `"yes"`/`"no"`, `1`/`0` and
/// their string forms. `null` reads as `false`.
pub mod flexible_bool {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(b),
            Some(Value::String(s)) => match s.as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                other => Err(de::Error::custom(format!("invalid boolean: '{}'", other))),
            },
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v == 1.0 => Ok(true),
                Some(v) if v == 0.0 => Ok(false),
                _ => Err(de::Error::custom(format!("invalid boolean: {}", n))),
            },
            Some(other) => Err(de::Error::custom(format!(
                "expected a boolean, got {}",
                other
            ))),
        }
    }
}
