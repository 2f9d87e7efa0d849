//! Typed attribute values, field schemas and features.
//!
//! A [`Feature`] carries an identifier, an optional [`geo::Geometry`] and a list of
//! [`AttributeValue`]s positionally aligned with its [`Fields`] schema.
//!
//! ```rust
//! use geo::{point, Geometry};
//! use geojson_export::value::{AttributeValue, Feature, Field, Fields, ValueType};
//!
//! let fields: Fields = [
//!     Field::new("name", ValueType::String),
//!     Field::new("population", ValueType::LongLong),
//! ]
//! .into_iter()
//! .collect();
//!
//! let berlin = Feature::new(1, fields)
//!     .with_attributes(vec!["Berlin".into(), AttributeValue::LongLong(3_669_495)])
//!     .with_geometry(Geometry::Point(point!(x: 13.4, y: 52.5)));
//!
//! assert_eq!(berlin.attribute_by_name("name"), Some(&AttributeValue::from("Berlin")));
//! ```
use std::collections::BTreeMap;

use geo::Geometry;

/// The declared type of a field, or the requested target type of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    UInt,
    LongLong,
    ULongLong,
    Double,
    Bool,
    String,
    DateTime,
    Binary,
    StringList,
    List,
    Map,
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeValue {
    #[default]
    Null,
    Int(i32),
    UInt(u32),
    LongLong(i64),
    ULongLong(u64),
    Double(f64),
    Bool(bool),
    String(String),
    DateTime(String),
    Binary(Vec<u8>),
    StringList(Vec<String>),
    List(Vec<AttributeValue>),
    Map(BTreeMap<String, AttributeValue>),
}

pub(crate) static NULL: AttributeValue = AttributeValue::Null;

impl AttributeValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// The type tag of this value, `None` for null.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            AttributeValue::Null => return None,
            AttributeValue::Int(_) => ValueType::Int,
            AttributeValue::UInt(_) => ValueType::UInt,
            AttributeValue::LongLong(_) => ValueType::LongLong,
            AttributeValue::ULongLong(_) => ValueType::ULongLong,
            AttributeValue::Double(_) => ValueType::Double,
            AttributeValue::Bool(_) => ValueType::Bool,
            AttributeValue::String(_) => ValueType::String,
            AttributeValue::DateTime(_) => ValueType::DateTime,
            AttributeValue::Binary(_) => ValueType::Binary,
            AttributeValue::StringList(_) => ValueType::StringList,
            AttributeValue::List(_) => ValueType::List,
            AttributeValue::Map(_) => ValueType::Map,
        })
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::UInt(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::LongLong(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::ULongLong(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value_type: ValueType,
}

impl Field {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }
}

/// Ordered field schema shared by every feature of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fields(Vec<Field>);

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field) {
        self.0.push(field);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Field> {
        self.0.get(idx)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|field| field.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.0.iter()
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: i64,
    fields: Fields,
    attributes: Vec<AttributeValue>,
    geometry: Option<Geometry>,
}

impl Feature {
    /// Creates a feature without geometry whose attributes are all null.
    #[must_use]
    pub fn new(id: i64, fields: Fields) -> Self {
        let attributes = vec![AttributeValue::Null; fields.len()];
        Self {
            id,
            fields,
            attributes,
            geometry: None,
        }
    }

    /// Replaces the attribute list; it is padded with nulls or truncated to the schema length.
    #[must_use]
    pub fn with_attributes(mut self, mut attributes: Vec<AttributeValue>) -> Self {
        attributes.resize(self.fields.len(), AttributeValue::Null);
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    #[must_use]
    pub fn without_geometry(mut self) -> Self {
        self.geometry = None;
        self
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, idx: usize) -> Option<&AttributeValue> {
        self.attributes.get(idx)
    }

    #[must_use]
    pub fn attribute_by_name(&self, name: &str) -> Option<&AttributeValue> {
        self.fields
            .index_of(name)
            .and_then(|idx| self.attributes.get(idx))
    }

    /// Sets the attribute at `idx`, returning `false` when the index is outside the schema.
    pub fn set_attribute(&mut self, idx: usize, value: impl Into<AttributeValue>) -> bool {
        match self.attributes.get_mut(idx) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn schema() -> Fields {
        [
            Field::new("name", ValueType::String),
            Field::new("count", ValueType::Int),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_attributes_follow_schema_length() {
        let feature = Feature::new(7, schema()).with_attributes(vec!["a".into()]);
        assert_eq!(feature.attributes().len(), 2);
        assert!(feature.attribute(1).unwrap().is_null());

        let feature = Feature::new(7, schema())
            .with_attributes(vec!["a".into(), 1.into(), true.into()]);
        assert_eq!(feature.attributes(), &["a".into(), AttributeValue::Int(1)]);
    }

    #[test]
    fn test_set_attribute() {
        let mut feature = Feature::new(1, schema());
        assert!(feature.set_attribute(1, 5));
        assert!(!feature.set_attribute(2, 5));
        assert_eq!(feature.attribute_by_name("count"), Some(&AttributeValue::Int(5)));
        assert_eq!(feature.attribute_by_name("missing"), None);
    }

    #[test]
    fn test_value_type() {
        assert_eq!(AttributeValue::Null.value_type(), None);
        assert_eq!(AttributeValue::from(2.5).value_type(), Some(ValueType::Double));
        assert_eq!(
            AttributeValue::from(None::<i64>),
            AttributeValue::Null
        );
    }
}
