//! Shared wire helpers.

use serde::{Deserialize, Deserializer};

/// Deserializes an id field that may arrive as a JSON string or number.
///
/// The client compares ids as strings, so numeric source ids are folded
/// into their decimal representation here.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "string_or_number")]
        id: String,
    }

    #[test]
    fn test_string_id_passes_through() {
        let w: Wrapper = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(w.id, "7");
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let w: Wrapper = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(w.id, "7");
    }
}
