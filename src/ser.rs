//! JSON encoding of single attribute values.
//!
//! [`encode_value`] turns one [`AttributeValue`] into a JSON literal fragment. Collections go
//! through serde (compact form), everything that is not a number, a boolean or a collection is
//! written as an escaped string.
use serde::ser;

use crate::value::{AttributeValue, Feature, NULL};

impl ser::Serialize for AttributeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match self {
            AttributeValue::Null => serializer.serialize_unit(),
            AttributeValue::Int(val) => serializer.serialize_i32(*val),
            AttributeValue::UInt(val) => serializer.serialize_u32(*val),
            AttributeValue::LongLong(val) => serializer.serialize_i64(*val),
            AttributeValue::ULongLong(val) => serializer.serialize_u64(*val),
            AttributeValue::Double(val) => serializer.serialize_f64(*val),
            AttributeValue::Bool(val) => serializer.serialize_bool(*val),
            AttributeValue::String(val) | AttributeValue::DateTime(val) => {
                serializer.serialize_str(val)
            }
            AttributeValue::Binary(val) => serializer.serialize_str(&String::from_utf8_lossy(val)),
            AttributeValue::StringList(val) => serializer.collect_seq(val),
            AttributeValue::List(val) => serializer.collect_seq(val),
            AttributeValue::Map(val) => serializer.collect_map(val),
        }
    }
}

/// Encodes a value as a JSON literal.
///
/// ```rust
/// use geojson_export::{encode_value, value::AttributeValue};
///
/// assert_eq!(encode_value(&AttributeValue::Null), "null");
/// assert_eq!(encode_value(&AttributeValue::Int(-3)), "-3");
/// assert_eq!(encode_value(&"a/b".into()), r#""a\/b""#);
/// ```
#[must_use]
pub fn encode_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Null => "null".to_string(),
        AttributeValue::Int(val) => val.to_string(),
        AttributeValue::UInt(val) => val.to_string(),
        AttributeValue::LongLong(val) => val.to_string(),
        AttributeValue::ULongLong(val) => val.to_string(),
        // NaN and infinities have no JSON literal
        AttributeValue::Double(val) if !val.is_finite() => "null".to_string(),
        AttributeValue::Double(val) => val.to_string(),
        AttributeValue::Bool(val) => val.to_string(),
        AttributeValue::StringList(_) | AttributeValue::List(_) | AttributeValue::Map(_) => {
            match serde_json::to_string(value) {
                Ok(json) => json,
                Err(err) => {
                    tracing::debug!("cannot encode collection value: {err}");
                    "null".to_string()
                }
            }
        }
        AttributeValue::String(val) | AttributeValue::DateTime(val) => encode_string(val),
        AttributeValue::Binary(val) => encode_string(&String::from_utf8_lossy(val)),
    }
}

/// Quotes `text`, escaping backslash, double quote, carriage return, backspace, tab,
/// forward slash and newline. Other characters are copied as they are.
#[must_use]
pub fn encode_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '/' => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Encodes every attribute of `feature` as a JSON object, in schema order and without any
/// index filtering.
#[must_use]
pub fn export_attributes(feature: &Feature) -> String {
    let attrs = feature
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let value = feature.attribute(idx).unwrap_or(&NULL);
            format!("{}:{}", encode_string(&field.name), encode_value(value))
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{{attrs}}}")
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;
    use serde_json::Value;

    use super::*;
    use crate::value::{Field, Fields, ValueType};

    #[test]
    fn test_null_and_scalars() {
        assert_eq!(encode_value(&AttributeValue::Null), "null");
        assert_eq!(encode_value(&AttributeValue::UInt(42)), "42");
        assert_eq!(encode_value(&AttributeValue::LongLong(i64::MIN)), i64::MIN.to_string());
        assert_eq!(encode_value(&AttributeValue::ULongLong(u64::MAX)), u64::MAX.to_string());
        assert_eq!(encode_value(&AttributeValue::Double(1.5)), "1.5");
        assert_eq!(encode_value(&AttributeValue::Double(2.0)), "2");
        assert_eq!(encode_value(&AttributeValue::Double(f64::NAN)), "null");
        assert_eq!(encode_value(&true.into()), "true");
        assert_eq!(encode_value(&false.into()), "false");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(encode_value(&"\\".into()), r#""\\""#);
        assert_eq!(
            encode_value(&"a\"b\rc\u{8}d\te/f\ng".into()),
            r#""a\"b\rc\bd\te\/f\ng""#
        );
        // escaped quote must not pick up a second backslash
        assert_eq!(encode_value(&"\\\"".into()), r#""\\\"""#);
        assert_eq!(
            encode_value(&AttributeValue::DateTime("2016-05-01T10:00:00".into())),
            r#""2016-05-01T10:00:00""#
        );
    }

    #[test]
    fn test_collections_are_compact() {
        let list = AttributeValue::List(vec![1.into(), "x".into(), AttributeValue::Null]);
        assert_eq!(encode_value(&list), r#"[1,"x",null]"#);

        let strings = AttributeValue::StringList(vec!["a".into(), "b/c".into()]);
        assert_eq!(encode_value(&strings), r#"["a","b/c"]"#);

        let map = AttributeValue::Map(BTreeMap::from([
            ("b".to_string(), AttributeValue::List(vec![true.into()])),
            ("a".to_string(), 2.5.into()),
        ]));
        assert_eq!(encode_value(&map), r#"{"a":2.5,"b":[true]}"#);
    }

    #[test]
    fn test_round_trip() -> anyhow::Result<()> {
        let value: Value = serde_json::from_str(&encode_value(&AttributeValue::Int(-17)))?;
        assert_eq!(value.as_i64(), Some(-17));

        let value: Value = serde_json::from_str(&encode_value(&AttributeValue::Double(0.1)))?;
        assert_relative_eq!(value.as_f64().unwrap(), 0.1);

        let value: Value = serde_json::from_str(&encode_value(&false.into()))?;
        assert_eq!(value.as_bool(), Some(false));

        let text = "path/to \"file\"\\name\twith\nlines";
        let value: Value = serde_json::from_str(&encode_value(&text.into()))?;
        assert_eq!(value.as_str(), Some(text));
        Ok(())
    }

    #[test]
    fn test_export_attributes() -> anyhow::Result<()> {
        let fields: Fields = [
            Field::new("name", ValueType::String),
            Field::new("size", ValueType::Double),
        ]
        .into_iter()
        .collect();
        let feature = crate::value::Feature::new(1, fields)
            .with_attributes(vec!["pond".into(), 12.5.into()]);

        let json = export_attributes(&feature);
        assert_eq!(json, "{\"name\":\"pond\",\n\"size\":12.5}");

        let value: Value = serde_json::from_str(&json)?;
        assert_eq!(value["size"].as_f64(), Some(12.5));
        Ok(())
    }
}
