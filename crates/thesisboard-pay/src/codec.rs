use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::PayError;

/// Canonical JSON bytes: object keys sorted, no insignificant whitespace.
///
/// Both sides sign and verify these exact bytes, so the encoding must not
/// depend on struct field order.
///
/// Keys are sorted here rather than relying on `serde_json::Map` ordering,
/// which changes when the `preserve_order` feature is enabled anywhere in
/// the dependency graph.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, PayError> {
    let value = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_vec(&value)?)
}

/// Rebuild every object with its keys inserted in sorted order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// base64 of the canonical JSON, as carried in the payment headers.
pub fn encode_header<T: Serialize>(value: &T) -> Result<String, PayError> {
    Ok(BASE64.encode(canonical_json(value)?))
}

pub fn decode_header<T: DeserializeOwned>(header: &str) -> Result<T, PayError> {
    let bytes = BASE64.decode(header.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        zeta: u32,
        alpha: String,
        nested: Nested,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Nested {
        y: bool,
        b: Option<u8>,
    }

    fn sample() -> Sample {
        Sample {
            zeta: 1,
            alpha: "a b".into(),
            nested: Nested { y: true, b: None },
        }
    }

    #[test]
    fn keys_sorted_without_whitespace() {
        let bytes = canonical_json(&sample()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"alpha":"a b","nested":{"b":null,"y":true},"zeta":1}"#
        );
    }

    #[test]
    fn objects_inside_arrays_are_sorted() {
        let value = serde_json::json!({"z": [{"d": 1, "c": {"b": 2, "a": 3}}], "a": "x y"});
        assert_eq!(
            String::from_utf8(canonical_json(&value).unwrap()).unwrap(),
            r#"{"a":"x y","z":[{"c":{"a":3,"b":2},"d":1}]}"#
        );
    }

    #[test]
    fn header_decodes_back() {
        let header = encode_header(&sample()).unwrap();
        assert!(!header.contains('{'));
        let back: Sample = decode_header(&header).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn garbage_header_is_an_error() {
        assert!(matches!(
            decode_header::<Sample>("not base64!"),
            Err(PayError::Base64(_))
        ));
        let not_json = BASE64.encode("hello");
        assert!(matches!(
            decode_header::<Sample>(&not_json),
            Err(PayError::Json(_))
        ));
    }
}
