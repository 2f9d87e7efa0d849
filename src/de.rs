use geozero::GeozeroDatasource;
use serde_json::Value;

use crate::{
    collector::FeatureCollector,
    error::{Error, Result},
    value::{AttributeValue, Feature, Field, Fields, ValueType},
};

impl From<&Value> for AttributeValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(val) => AttributeValue::Bool(*val),
            Value::Number(val) => {
                if let Some(val) = val.as_i64() {
                    AttributeValue::LongLong(val)
                } else if let Some(val) = val.as_u64() {
                    AttributeValue::ULongLong(val)
                } else {
                    val.as_f64().map_or(AttributeValue::Null, AttributeValue::Double)
                }
            }
            Value::String(val) => AttributeValue::String(val.clone()),
            Value::Array(vals) => AttributeValue::List(vals.iter().map(Into::into).collect()),
            Value::Object(map) => AttributeValue::Map(
                map.iter()
                    .map(|(key, val)| (key.clone(), val.into()))
                    .collect(),
            ),
        }
    }
}

/// Values decoded by [`parse_array`], plus everything that went wrong along the way.
#[derive(Debug, Default)]
pub struct ParsedArray {
    pub values: Vec<AttributeValue>,
    pub errors: Vec<Error>,
}

/// Parses a JSON array and converts every element to `target`.
///
/// Malformed JSON or a top-level value that is not an array gives no values and one error.
/// Elements that cannot be converted are skipped, each with its own error. Every error is
/// also logged as a warning.
///
/// ```rust
/// use geojson_export::{parse_array, value::{AttributeValue, ValueType}};
///
/// let parsed = parse_array(r#"[1, "x", 3]"#, ValueType::Int);
/// assert_eq!(parsed.values, vec![AttributeValue::Int(1), AttributeValue::Int(3)]);
/// assert_eq!(parsed.errors.len(), 1);
/// ```
#[must_use]
pub fn parse_array(json: &str, target: ValueType) -> ParsedArray {
    let mut parsed = ParsedArray::default();
    let elements = match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(elements)) => elements,
        Ok(_) => {
            tracing::warn!("Cannot parse json as array: {json}");
            parsed.errors.push(Error::NotAnArray(json.to_string()));
            return parsed;
        }
        Err(err) => {
            tracing::warn!("Cannot parse json ({err}): {json}");
            parsed.errors.push(Error::SerdeError(err));
            return parsed;
        }
    };

    for (index, element) in elements.iter().enumerate() {
        if let Some(value) = convert_value(element, target) {
            parsed.values.push(value);
        } else {
            tracing::warn!("Cannot convert json array element: {element}");
            parsed.errors.push(Error::Conversion {
                index,
                text: element.to_string(),
                target,
            });
        }
    }
    parsed
}

/// Converts a JSON value to `target`, `None` when it has no sensible counterpart.
///
/// `null` never converts.
#[must_use]
pub fn convert_value(value: &Value, target: ValueType) -> Option<AttributeValue> {
    match target {
        ValueType::Int => to_i64(value)
            .and_then(|val| i32::try_from(val).ok())
            .map(AttributeValue::Int),
        ValueType::UInt => to_i64(value)
            .and_then(|val| u32::try_from(val).ok())
            .map(AttributeValue::UInt),
        ValueType::LongLong => to_i64(value).map(AttributeValue::LongLong),
        ValueType::ULongLong => to_u64(value).map(AttributeValue::ULongLong),
        ValueType::Double => to_f64(value).map(AttributeValue::Double),
        ValueType::Bool => to_bool(value).map(AttributeValue::Bool),
        ValueType::String => to_text(value).map(AttributeValue::String),
        ValueType::DateTime => value
            .as_str()
            .map(|val| AttributeValue::DateTime(val.to_string())),
        ValueType::Binary => value
            .as_str()
            .map(|val| AttributeValue::Binary(val.as_bytes().to_vec())),
        ValueType::StringList => match value {
            Value::Array(vals) => vals
                .iter()
                .map(to_text)
                .collect::<Option<Vec<_>>>()
                .map(AttributeValue::StringList),
            Value::String(val) => Some(AttributeValue::StringList(vec![val.clone()])),
            _ => None,
        },
        ValueType::List => value
            .is_array()
            .then(|| AttributeValue::from(value)),
        ValueType::Map => value
            .is_object()
            .then(|| AttributeValue::from(value)),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(val) => val.as_i64().or_else(|| {
            let val = val.as_f64()?.round();
            (val.is_finite() && val >= i64::MIN as f64 && val < i64::MAX as f64)
                .then_some(val as i64)
        }),
        Value::String(val) => val.trim().parse().ok(),
        Value::Bool(val) => Some(i64::from(*val)),
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(val) => val.as_u64().or_else(|| {
            let val = val.as_f64()?.round();
            (val.is_finite() && val >= 0.0 && val < u64::MAX as f64).then_some(val as u64)
        }),
        Value::String(val) => val.trim().parse().ok(),
        Value::Bool(val) => Some(u64::from(*val)),
        _ => None,
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(val) => val.as_f64(),
        Value::String(val) => val.trim().parse().ok(),
        Value::Bool(val) => Some(if *val { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(val) => Some(*val),
        Value::Number(val) => val.as_f64().map(|val| val != 0.0),
        Value::String(val) => {
            let val = val.trim();
            Some(!(val.is_empty() || val == "0" || val.eq_ignore_ascii_case("false")))
        }
        _ => None,
    }
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(val) => Some(val.clone()),
        Value::Number(val) => Some(val.to_string()),
        Value::Bool(val) => Some(val.to_string()),
        _ => None,
    }
}

/// Reads a `GeoJSON` `Feature` or `FeatureCollection` into features using `fields` as schema.
///
/// Properties are matched to fields by name and converted to the field type; missing or
/// unconvertible properties become null. Feature ids are the position in the source.
///
/// ```rust
/// use geojson_export::{string_to_feature_list, value::{AttributeValue, Field, Fields, ValueType}};
///
/// let fields: Fields = [
///     Field::new("population", ValueType::LongLong),
///     Field::new("name", ValueType::String),
/// ]
/// .into_iter()
/// .collect();
///
/// let geojson = r#"{
///     "type": "Feature",
///     "geometry": { "type": "Point", "coordinates": [13.4, 52.5] },
///     "properties": { "name": "Berlin", "population": "3669495" }
/// }"#;
///
/// let cities = string_to_feature_list(geojson, &fields).unwrap();
/// assert_eq!(cities[0].attribute(0), Some(&AttributeValue::LongLong(3_669_495)));
/// assert!(cities[0].geometry().is_some());
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid `GeoJSON`.
pub fn string_to_feature_list(json: &str, fields: &Fields) -> Result<Vec<Feature>> {
    let mut collector = FeatureCollector::new();
    geozero::geojson::GeoJsonReader(json.as_bytes()).process(&mut collector)?;

    Ok(collector
        .features
        .into_iter()
        .map(|raw| {
            let attributes = fields
                .iter()
                .map(|field| {
                    raw.properties
                        .iter()
                        .find(|(name, _)| *name == field.name)
                        .map_or(AttributeValue::Null, |(_, value)| {
                            convert_attribute(value, field)
                        })
                })
                .collect();
            let feature = Feature::new(i64::try_from(raw.idx).unwrap_or(i64::MAX), fields.clone())
                .with_attributes(attributes);
            match raw.geometry {
                Some(geometry) => feature.with_geometry(geometry),
                None => feature,
            }
        })
        .collect())
}

fn convert_attribute(value: &AttributeValue, field: &Field) -> AttributeValue {
    if value.is_null() || value.value_type() == Some(field.value_type) {
        return value.clone();
    }
    let converted = serde_json::to_value(value)
        .ok()
        .and_then(|json| convert_value(&json, field.value_type));
    converted.unwrap_or_else(|| {
        tracing::debug!(
            "cannot convert property {} to {:?}, using null",
            field.name,
            field.value_type
        );
        AttributeValue::Null
    })
}

/// Derives a field schema from the properties of the first feature in a `GeoJSON` text.
///
/// Null properties are typed as strings.
///
/// # Errors
///
/// Returns an error if the text is not valid `GeoJSON`.
pub fn string_to_fields(json: &str) -> Result<Fields> {
    let mut collector = FeatureCollector::new();
    geozero::geojson::GeoJsonReader(json.as_bytes()).process(&mut collector)?;

    Ok(collector
        .features
        .first()
        .map(|raw| {
            raw.properties
                .iter()
                .map(|(name, value)| {
                    Field::new(name.clone(), value.value_type().unwrap_or(ValueType::String))
                })
                .collect()
        })
        .unwrap_or_default())
}
