//! A collector for geometry and property data from geospatial sources.
//!
//! [`FeatureCollector`] implements the geozero processor traits and gathers each feature's
//! geometry together with its properties, in source order.
//!
//! # Example
//!
//! ```rust
//! use geo::Geometry;
//! use geozero::GeozeroDatasource;
//! use geojson_export::{collector::FeatureCollector, value::AttributeValue};
//!
//! let geojson = r#"{
//!     "type": "Feature",
//!     "geometry": {
//!         "type": "Point",
//!         "coordinates": [102.0, 0.5]
//!     },
//!     "properties": {
//!         "name": "Test Point",
//!         "value": 42
//!     }
//! }"#;
//!
//! let mut collector = FeatureCollector::new();
//! let mut reader = geozero::geojson::GeoJsonReader(geojson.as_bytes());
//! reader.process(&mut collector).unwrap();
//!
//! let feature = &collector.features[0];
//! assert!(matches!(feature.geometry, Some(Geometry::Point(_))));
//! assert_eq!(feature.properties[0], ("name".to_string(), AttributeValue::from("Test Point")));
//! ```
use geo::Geometry;
use geozero::{
    geo_types::GeoWriter, ColumnValue, FeatureProcessor, GeomProcessor, PropertyProcessor,
};
use serde_json::Value;

use crate::value::AttributeValue;

/// One feature as read from the source, before it is aligned to a field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub idx: u64,
    pub geometry: Option<Geometry>,
    pub properties: Vec<(String, AttributeValue)>,
}

impl From<&ColumnValue<'_>> for AttributeValue {
    fn from(value: &ColumnValue<'_>) -> Self {
        match value {
            ColumnValue::Byte(val) => AttributeValue::Int(i32::from(*val)),
            ColumnValue::Short(val) => AttributeValue::Int(i32::from(*val)),
            ColumnValue::Int(val) => AttributeValue::Int(*val),
            ColumnValue::UByte(val) => AttributeValue::UInt(u32::from(*val)),
            ColumnValue::UShort(val) => AttributeValue::UInt(u32::from(*val)),
            ColumnValue::UInt(val) => AttributeValue::UInt(*val),
            ColumnValue::Long(val) => AttributeValue::LongLong(*val),
            ColumnValue::ULong(val) => AttributeValue::ULongLong(*val),
            ColumnValue::Float(val) => AttributeValue::Double(f64::from(*val)),
            ColumnValue::Double(val) => AttributeValue::Double(*val),
            ColumnValue::Bool(val) => AttributeValue::Bool(*val),
            ColumnValue::String(val) => AttributeValue::String((*val).to_string()),
            ColumnValue::Json(val) => serde_json::from_str::<Value>(val).map_or_else(
                |_| AttributeValue::String((*val).to_string()),
                |json| AttributeValue::from(&json),
            ),
            ColumnValue::DateTime(val) => AttributeValue::DateTime(val.to_string()),
            ColumnValue::Binary(val) => AttributeValue::Binary(val.to_vec()),
        }
    }
}

pub struct FeatureCollector {
    pub features: Vec<RawFeature>,

    current_geometry: GeoWriter,
    current_properties: Vec<(String, AttributeValue)>,
}

impl FeatureCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            current_geometry: GeoWriter::new(),
            current_properties: Vec::new(),
        }
    }
}

impl Default for FeatureCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyProcessor for FeatureCollector {
    fn property(
        &mut self,
        _idx: usize,
        name: &str,
        value: &ColumnValue,
    ) -> geozero::error::Result<bool> {
        self.current_properties
            .push((name.to_string(), AttributeValue::from(value)));
        Ok(false)
    }
}

macro_rules! forward_to_geometry {
    ($($method:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            fn $method(&mut self, $($arg: $ty),*) -> geozero::error::Result<()> {
                self.current_geometry.$method($($arg),*)
            }
        )*
    };
}

impl GeomProcessor for FeatureCollector {
    fn dimensions(&self) -> geozero::CoordDimensions {
        self.current_geometry.dimensions()
    }

    forward_to_geometry! {
        xy(x: f64, y: f64, idx: usize);
        empty_point(idx: usize);
        point_begin(idx: usize);
        point_end(idx: usize);
        multipoint_begin(size: usize, idx: usize);
        multipoint_end(idx: usize);
        linestring_begin(tagged: bool, size: usize, idx: usize);
        linestring_end(tagged: bool, idx: usize);
        multilinestring_begin(size: usize, idx: usize);
        multilinestring_end(idx: usize);
        polygon_begin(tagged: bool, size: usize, idx: usize);
        polygon_end(tagged: bool, idx: usize);
        multipolygon_begin(size: usize, idx: usize);
        multipolygon_end(idx: usize);
        geometrycollection_begin(size: usize, idx: usize);
        geometrycollection_end(idx: usize);
    }
}

impl FeatureProcessor for FeatureCollector {
    fn feature_begin(&mut self, _idx: u64) -> geozero::error::Result<()> {
        self.current_geometry = GeoWriter::new();
        self.current_properties.clear();
        Ok(())
    }

    fn properties_begin(&mut self) -> geozero::error::Result<()> {
        self.current_properties.clear();
        Ok(())
    }

    fn geometry_begin(&mut self) -> geozero::error::Result<()> {
        self.current_geometry = GeoWriter::new();
        Ok(())
    }

    fn feature_end(&mut self, idx: u64) -> geozero::error::Result<()> {
        self.features.push(RawFeature {
            idx,
            geometry: self.current_geometry.take_geometry(),
            properties: std::mem::take(&mut self.current_properties),
        });
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use approx::assert_relative_eq;
    use geo::Geometry;
    use geozero::GeozeroDatasource;

    use crate::{collector::FeatureCollector, value::AttributeValue};

    #[test]
    fn test_from_geojson() -> geozero::error::Result<()> {
        let geojson = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 3.0], [0.0, 0.0]]]
                    },
                    "properties": {
                        "name": "Test Area",
                        "value": 42,
                        "tags": ["a", "b"]
                    }
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": {
                        "name": "No Shape",
                        "value": 1.5
                    }
                }
            ]
        }"#;

        let mut collector = FeatureCollector::new();

        let mut reader = geozero::geojson::GeoJsonReader(geojson.as_bytes());
        reader.process(&mut collector)?;

        assert_eq!(collector.features.len(), 2);

        // Check first feature
        let feature = &collector.features[0];
        match &feature.geometry {
            Some(Geometry::Polygon(polygon)) => {
                assert_eq!(polygon.exterior().0.len(), 4);
                assert_relative_eq!(polygon.exterior().0[2].y, 3.0);
            }
            other => panic!("Expected Polygon geometry, got {other:?}"),
        }
        assert_eq!(
            feature.properties[0],
            ("name".to_string(), AttributeValue::from("Test Area"))
        );
        assert_eq!(
            feature.properties[2].1,
            AttributeValue::List(vec!["a".into(), "b".into()])
        );

        // Check second feature
        let feature = &collector.features[1];
        assert!(feature.geometry.is_none());
        assert_eq!(feature.properties[1].1, AttributeValue::Double(1.5));

        Ok(())
    }
}
