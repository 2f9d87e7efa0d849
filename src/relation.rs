//! Layers, relations between them and the registry that resolves related features.
//!
//! A [`Relation`] links a referencing (child) layer to a referenced (parent) layer through
//! pairs of fields. The [`LayerRegistry`] is handed to the exporter explicitly; it is only
//! ever read.
use hashbrown::HashMap;

use crate::{
    geometry::Crs,
    value::{Feature, Fields},
};

#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    pub id: String,
    pub name: String,
    pub crs: Option<Crs>,
    pub fields: Fields,
    pub features: Vec<Feature>,
}

impl VectorLayer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            crs: None,
            fields,
            features: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub referencing_layer: String,
    pub referenced_layer: String,
    /// `(referencing field, referenced field)` pairs.
    pub field_pairs: Vec<(String, String)>,
}

impl Relation {
    pub fn new(
        name: impl Into<String>,
        referencing_layer: impl Into<String>,
        referenced_layer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            referencing_layer: referencing_layer.into(),
            referenced_layer: referenced_layer.into(),
            field_pairs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field_pair(
        mut self,
        referencing_field: impl Into<String>,
        referenced_field: impl Into<String>,
    ) -> Self {
        self.field_pairs
            .push((referencing_field.into(), referenced_field.into()));
        self
    }

    /// Whether `child` (a feature of the referencing layer) points at `parent`.
    ///
    /// Null keys never match, and a relation without field pairs matches nothing.
    #[must_use]
    pub fn is_related(&self, parent: &Feature, child: &Feature) -> bool {
        !self.field_pairs.is_empty()
            && self
                .field_pairs
                .iter()
                .all(|(referencing, referenced)| {
                    match (
                        child.attribute_by_name(referencing),
                        parent.attribute_by_name(referenced),
                    ) {
                        (Some(child_value), Some(parent_value)) => {
                            !parent_value.is_null() && child_value == parent_value
                        }
                        _ => false,
                    }
                })
    }
}

/// Read-only lookup of layers and relations.
pub trait LayerRegistry: Send + Sync {
    fn layer(&self, layer_id: &str) -> Option<&VectorLayer>;

    /// All relations known to the registry.
    fn relations(&self) -> Vec<&Relation>;

    /// Relations whose referenced ("one") side is `layer_id`.
    fn referenced_relations(&self, layer_id: &str) -> Vec<&Relation> {
        self.relations()
            .into_iter()
            .filter(|relation| relation.referenced_layer == layer_id)
            .collect()
    }

    /// Features of the referencing layer that point at `feature`, without geometry.
    ///
    /// `None` when the referencing layer cannot be resolved.
    fn related_features<'a>(
        &'a self,
        relation: &'a Relation,
        feature: &'a Feature,
    ) -> Option<Box<dyn Iterator<Item = Feature> + 'a>> {
        let child_layer = self.layer(&relation.referencing_layer)?;
        Some(Box::new(
            child_layer
                .features
                .iter()
                .filter(move |child| relation.is_related(feature, child))
                .map(|child| child.clone().without_geometry()),
        ))
    }
}

/// In-memory registry of a project's layers and relations.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    layers: HashMap<String, VectorLayer>,
    relations: Vec<Relation>,
}

impl ProjectRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self, layer: VectorLayer) {
        self.layers.insert(layer.id.clone(), layer);
    }

    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }
}

impl LayerRegistry for ProjectRegistry {
    fn layer(&self, layer_id: &str) -> Option<&VectorLayer> {
        self.layers.get(layer_id)
    }

    fn relations(&self) -> Vec<&Relation> {
        self.relations.iter().collect()
    }
}

#[cfg(test)]
mod test {
    use geo::{point, Geometry};

    use super::*;
    use crate::value::{AttributeValue, Field, ValueType};

    fn registry() -> ProjectRegistry {
        let parent_fields: Fields = [Field::new("id", ValueType::Int)].into_iter().collect();
        let child_fields: Fields = [
            Field::new("parent_id", ValueType::Int),
            Field::new("label", ValueType::String),
        ]
        .into_iter()
        .collect();

        let children = vec![
            Feature::new(1, child_fields.clone())
                .with_attributes(vec![1.into(), "a".into()])
                .with_geometry(Geometry::Point(point!(x: 1.0, y: 1.0))),
            Feature::new(2, child_fields.clone()).with_attributes(vec![2.into(), "b".into()]),
            Feature::new(3, child_fields.clone()).with_attributes(vec![1.into(), "c".into()]),
            Feature::new(4, child_fields.clone())
                .with_attributes(vec![AttributeValue::Null, "d".into()]),
        ];

        let mut registry = ProjectRegistry::new();
        registry.add_layer(VectorLayer::new("parents", "Parents", parent_fields));
        registry.add_layer(VectorLayer::new("children", "Children", child_fields).with_features(children));
        registry.add_relation(
            Relation::new("children", "children", "parents").with_field_pair("parent_id", "id"),
        );
        registry.add_relation(Relation::new("orphans", "missing", "parents"));
        registry
    }

    #[test]
    fn test_referenced_relations() {
        let registry = registry();
        assert_eq!(registry.referenced_relations("parents").len(), 2);
        assert!(registry.referenced_relations("children").is_empty());
    }

    #[test]
    fn test_related_features() {
        let registry = registry();
        let parent_fields = registry.layer("parents").unwrap().fields.clone();
        let parent = Feature::new(10, parent_fields).with_attributes(vec![1.into()]);
        let relations = registry.referenced_relations("parents");

        let related: Vec<Feature> = registry
            .related_features(relations[0], &parent)
            .unwrap()
            .collect();
        assert_eq!(
            related.iter().map(Feature::id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert!(related.iter().all(|feature| feature.geometry().is_none()));

        assert!(registry.related_features(relations[1], &parent).is_none());
    }

    #[test]
    fn test_null_keys_do_not_match() {
        let registry = registry();
        let parent_fields = registry.layer("parents").unwrap().fields.clone();
        let parent = Feature::new(10, parent_fields);
        let relations = registry.referenced_relations("parents");
        assert_eq!(
            registry.related_features(relations[0], &parent).unwrap().count(),
            0
        );
    }
}
