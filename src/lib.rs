//! # geojson-export
//!
//! A library for turning typed geospatial features into `GeoJSON` text and for decoding JSON
//! arrays into typed value lists.
//!
//! ## Features
//!
//! - Encode single attribute values as JSON literals
//! - Export features and feature collections as `GeoJSON`, with optional reprojection to
//!   `WGS84`, attribute filtering, extra properties and the attributes of related features
//! - Parse JSON arrays into values of one type, skipping elements that do not convert
//! - Read `GeoJSON` back into features through geozero
//!
//! ## Main Components
//!
//! - [`exporter::JsonExporter`] - Export settings and the `Feature` / `FeatureCollection` writer
//! - [`encode_value`] - The JSON literal encoder used for every attribute
//! - [`parse_array`] - Lenient JSON array decoding
//! - [`relation::LayerRegistry`] - Lookup of layers and related features
//! - [`error::Error`] - Custom error types for the library
//!
//! ## Example
//!
//! ```rust
//! use geo::{point, Geometry};
//! use geojson_export::{
//!     exporter::JsonExporter,
//!     value::{AttributeValue, Feature, Field, Fields, ValueType},
//! };
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
//! let geojson = JsonExporter::new(6).export_features(&[berlin]);
//! let value: serde_json::Value = serde_json::from_str(&geojson).unwrap();
//!
//! assert_eq!(value["type"], "FeatureCollection");
//! assert_eq!(value["features"][0]["properties"]["name"], "Berlin");
//! assert_eq!(value["features"][0]["geometry"]["coordinates"][0], 13.4);
//! ```
//!
//! ## Modules
//!
//! - [`collector`] - geozero processor gathering features from a source
//! - [`de`] - Array parsing and `GeoJSON` reading
//! - [`error`] - Error types and handling
//! - [`exporter`] - `GeoJSON` export
//! - [`geometry`] - Geometry writing, coordinate formatting and reprojection hooks
//! - [`relation`] - Layers, relations and the layer registry
//! - [`ser`] - Value encoding
//! - [`value`] - Attribute values, fields and features

pub mod collector;
#[allow(clippy::module_name_repetitions)]
pub mod de;
pub mod error;
#[allow(clippy::module_name_repetitions)]
pub mod exporter;
#[allow(clippy::module_name_repetitions)]
pub mod geometry;
pub mod relation;
pub mod ser;
pub mod value;

pub use de::{parse_array, string_to_feature_list, string_to_fields, ParsedArray};
pub use error::{Error, Result};
pub use exporter::JsonExporter;
pub use ser::encode_value;
