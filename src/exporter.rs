//! `GeoJSON` export of features and feature collections.
//!
//! ```rust
//! use geo::{line_string, Geometry};
//! use geojson_export::{
//!     exporter::JsonExporter,
//!     value::{Feature, Field, Fields, ValueType},
//! };
//!
//! let fields: Fields = [Field::new("name", ValueType::String)].into_iter().collect();
//! let road = Feature::new(4, fields)
//!     .with_attributes(vec!["A10".into()])
//!     .with_geometry(Geometry::LineString(line_string![(x: 13.0, y: 52.0), (x: 13.5, y: 52.25)]));
//!
//! let exporter = JsonExporter::new(6);
//! let json: serde_json::Value = serde_json::from_str(&exporter.export_feature(&road, None, None)).unwrap();
//!
//! assert_eq!(json["id"], 4);
//! assert_eq!(json["bbox"], serde_json::json!([13, 52, 13.5, 52.25]));
//! assert_eq!(json["properties"]["name"], "A10");
//! ```
use std::sync::Arc;

use geo::Geometry;
use hashbrown::{HashMap, HashSet};

use crate::{
    geometry::{self, CoordinateTransform, Crs},
    relation::{LayerRegistry, VectorLayer},
    ser::{encode_string, encode_value, export_attributes},
    value::{AttributeValue, Feature, NULL},
};

pub const DEFAULT_PRECISION: usize = 17;

/// Export settings. Cheap to clone, never mutated while exporting.
#[derive(Clone)]
pub struct JsonExporter {
    precision: usize,
    include_geometry: bool,
    include_attributes: bool,
    include_related_attributes: bool,
    attribute_indexes: HashSet<usize>,
    excluded_attribute_indexes: HashSet<usize>,
    source_crs: Option<Crs>,
    layer_id: Option<String>,
    registry: Option<Arc<dyn LayerRegistry>>,
    transform: Option<Arc<dyn CoordinateTransform>>,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl JsonExporter {
    #[must_use]
    pub fn new(precision: usize) -> Self {
        Self {
            precision,
            include_geometry: true,
            include_attributes: true,
            include_related_attributes: false,
            attribute_indexes: HashSet::new(),
            excluded_attribute_indexes: HashSet::new(),
            source_crs: None,
            layer_id: None,
            registry: None,
            transform: None,
        }
    }

    /// Exporter bound to `layer`, whose CRS becomes the source CRS.
    #[must_use]
    pub fn for_layer(layer: &VectorLayer, precision: usize) -> Self {
        let mut exporter = Self::new(precision);
        exporter.set_vector_layer(Some(layer));
        exporter
    }

    /// Rebinds the exporter. Unbinding keeps the current source CRS.
    pub fn set_vector_layer(&mut self, layer: Option<&VectorLayer>) {
        self.layer_id = layer.map(|layer| layer.id.clone());
        if let Some(layer) = layer {
            self.source_crs.clone_from(&layer.crs);
        }
    }

    #[must_use]
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    #[must_use]
    pub fn with_include_geometry(mut self, include: bool) -> Self {
        self.include_geometry = include;
        self
    }

    #[must_use]
    pub fn with_include_attributes(mut self, include: bool) -> Self {
        self.include_attributes = include;
        self
    }

    #[must_use]
    pub fn with_include_related_attributes(mut self, include: bool) -> Self {
        self.include_related_attributes = include;
        self
    }

    /// Only export these attribute indexes. An empty list exports all of them.
    #[must_use]
    pub fn with_attribute_indexes(mut self, indexes: impl IntoIterator<Item = usize>) -> Self {
        self.attribute_indexes = indexes.into_iter().collect();
        self
    }

    /// Never export these attribute indexes, even when they are in the allow-list.
    #[must_use]
    pub fn with_excluded_attribute_indexes(
        mut self,
        indexes: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.excluded_attribute_indexes = indexes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_source_crs(mut self, crs: Crs) -> Self {
        self.source_crs = Some(crs);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn LayerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Arc<dyn CoordinateTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn precision(&self) -> usize {
        self.precision
    }

    #[must_use]
    pub fn include_geometry(&self) -> bool {
        self.include_geometry
    }

    #[must_use]
    pub fn include_attributes(&self) -> bool {
        self.include_attributes
    }

    #[must_use]
    pub fn include_related_attributes(&self) -> bool {
        self.include_related_attributes
    }

    #[must_use]
    pub fn attribute_indexes(&self) -> &HashSet<usize> {
        &self.attribute_indexes
    }

    #[must_use]
    pub fn excluded_attribute_indexes(&self) -> &HashSet<usize> {
        &self.excluded_attribute_indexes
    }

    #[must_use]
    pub fn source_crs(&self) -> Option<&Crs> {
        self.source_crs.as_ref()
    }

    /// The bound layer, if it can be found in the registry.
    #[must_use]
    pub fn vector_layer(&self) -> Option<&VectorLayer> {
        let layer_id = self.layer_id.as_deref()?;
        self.registry.as_deref()?.layer(layer_id)
    }

    fn is_exported(&self, idx: usize) -> bool {
        (self.attribute_indexes.is_empty() || self.attribute_indexes.contains(&idx))
            && !self.excluded_attribute_indexes.contains(&idx)
    }

    /// Reprojects to `WGS84` when a source CRS is set, keeping the original geometry if that
    /// fails.
    fn output_geometry(&self, geometry: &Geometry) -> Geometry {
        let Some(source) = self.source_crs.as_ref().filter(|crs| crs.is_valid()) else {
            return geometry.clone();
        };
        match geometry::to_wgs84(geometry, source, self.transform.as_deref()) {
            Ok(transformed) => transformed,
            Err(err) => {
                tracing::debug!("exporting untransformed geometry: {err}");
                geometry.clone()
            }
        }
    }

    /// `"bbox"` and `"geometry"` members, each followed by a separator.
    fn geometry_members(&self, feature: &Feature) -> String {
        let geometry = match feature.geometry() {
            Some(geometry) if self.include_geometry && !geometry::is_empty(geometry) => {
                self.output_geometry(geometry)
            }
            _ => return "   \"geometry\":null,\n".to_string(),
        };

        let json = match geometry::geometry_to_json(&geometry, self.precision) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!("cannot write geometry of feature {}: {err}", feature.id());
                return "   \"geometry\":null,\n".to_string();
            }
        };

        let bbox = geometry::bbox(&geometry).map_or_else(String::new, |rect| {
            format!(
                "   \"bbox\":{},\n",
                geometry::bbox_to_json(&rect, self.precision)
            )
        });
        format!("{bbox}   \"geometry\":\n   {json},\n")
    }

    /// `"<relation name>":[...]` entries for every relation pointing at the bound layer.
    fn related_properties(&self, feature: &Feature) -> Vec<String> {
        let (Some(registry), Some(layer_id)) = (self.registry.as_deref(), self.layer_id.as_deref())
        else {
            return Vec::new();
        };
        if registry.layer(layer_id).is_none() {
            return Vec::new();
        }

        registry
            .referenced_relations(layer_id)
            .into_iter()
            .filter(|relation| relation.referencing_layer != layer_id)
            .filter_map(|relation| {
                let Some(related) = registry.related_features(relation, feature) else {
                    tracing::debug!(
                        "skipping relation {}: layer {} not found",
                        relation.name,
                        relation.referencing_layer
                    );
                    return None;
                };
                let attributes = related
                    .map(|related| export_attributes(&related))
                    .collect::<Vec<_>>()
                    .join(",\n");
                Some(format!(
                    "      {}:[{attributes}]",
                    encode_string(&relation.name)
                ))
            })
            .collect()
    }

    /// Exports one feature as a `GeoJSON` `Feature` object.
    ///
    /// `extra_properties` are appended after the feature's own attributes; `id` replaces
    /// the feature id when given.
    #[must_use]
    pub fn export_feature(
        &self,
        feature: &Feature,
        extra_properties: Option<&HashMap<String, AttributeValue>>,
        id: Option<&AttributeValue>,
    ) -> String {
        let id = id.map_or_else(|| feature.id().to_string(), encode_value);
        let head = format!(
            "{{\n   \"type\":\"Feature\",\n   \"id\":{id},\n{}",
            self.geometry_members(feature)
        );

        let extra_properties = extra_properties.filter(|extra| !extra.is_empty());
        let mut properties: Vec<String> = Vec::new();
        if self.include_attributes || extra_properties.is_some() {
            if self.include_attributes {
                for (idx, field) in feature.fields().iter().enumerate() {
                    if !self.is_exported(idx) {
                        continue;
                    }
                    let value = feature.attribute(idx).unwrap_or(&NULL);
                    properties.push(format!(
                        "      {}:{}",
                        encode_string(&field.name),
                        encode_value(value)
                    ));
                }
            }

            if let Some(extra) = extra_properties {
                properties.extend(extra.iter().map(|(key, value)| {
                    format!("      {}:{}", encode_string(key), encode_value(value))
                }));
            }

            if self.include_related_attributes {
                properties.extend(self.related_properties(feature));
            }
        }

        let properties = if properties.is_empty() {
            "null".to_string()
        } else {
            format!("{{\n{}\n   }}", properties.join(",\n"))
        };
        format!("{head}   \"properties\":{properties}\n}}")
    }

    /// Exports features as a `GeoJSON` `FeatureCollection`, in input order.
    #[must_use]
    pub fn export_features(&self, features: &[Feature]) -> String {
        let features = features
            .iter()
            .map(|feature| self.export_feature(feature, None, None))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{{ \"type\": \"FeatureCollection\",\n    \"features\":[\n{features}\n]}}")
    }
}
