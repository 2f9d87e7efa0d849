//! Geometry output: coordinate formatting, reprojection hooks and a geozero processor that
//! writes `GeoJSON` geometry objects at a fixed decimal precision.
use geo::{BoundingRect, Geometry, HasDimensions, Rect};
use geozero::{error::GeozeroError, GeomProcessor, GeozeroGeometry};

use crate::error::{Error, Result};

/// A coordinate reference system, identified by its authority id (e.g. `EPSG:4326`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    pub fn new(authid: impl Into<String>) -> Self {
        Self(authid.into())
    }

    #[must_use]
    pub fn epsg(code: u32) -> Self {
        Self(format!("EPSG:{code}"))
    }

    /// `WGS84` geographic, the reference `GeoJSON` output is written in.
    #[must_use]
    pub fn wgs84() -> Self {
        Self::epsg(4326)
    }

    #[must_use]
    pub fn authid(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

/// Reprojects geometries between coordinate reference systems.
///
/// Any `Fn(&Geometry, &Crs, &Crs) -> Result<Geometry>` closure is a transform.
pub trait CoordinateTransform: Send + Sync {
    /// # Errors
    ///
    /// Returns [`Error::Transform`] when the geometry cannot be expressed in `target`.
    fn transform(&self, geometry: &Geometry, source: &Crs, target: &Crs) -> Result<Geometry>;
}

impl<F> CoordinateTransform for F
where
    F: Fn(&Geometry, &Crs, &Crs) -> Result<Geometry> + Send + Sync,
{
    fn transform(&self, geometry: &Geometry, source: &Crs, target: &Crs) -> Result<Geometry> {
        self(geometry, source, target)
    }
}

/// Reprojects `geometry` from `source` to `WGS84`.
///
/// # Errors
///
/// Fails when `source` differs from `WGS84` and no transform is available, or when the
/// transform itself fails.
pub fn to_wgs84(
    geometry: &Geometry,
    source: &Crs,
    transform: Option<&dyn CoordinateTransform>,
) -> Result<Geometry> {
    let target = Crs::wgs84();
    if *source == target {
        return Ok(geometry.clone());
    }
    match transform {
        Some(transform) => transform.transform(geometry, source, &target),
        None => Err(Error::Transform(format!(
            "no transform from {} to {}",
            source.authid(),
            target.authid()
        ))),
    }
}

/// Formats `value` with `precision` decimals, dropping trailing zeros and a trailing
/// decimal point.
/// NaN and infinities come out as `null`.
///
/// ```rust
/// use geojson_export::geometry::format_double;
///
/// assert_eq!(format_double(1.250, 3), "1.25");
/// assert_eq!(format_double(100.0, 3), "100");
/// assert_eq!(format_double(2.4, 0), "2");
/// ```
#[must_use]
pub fn format_double(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    let text = format!("{value:.precision$}");
    if precision == 0 {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// `true` when the geometry holds no coordinates at all.
#[must_use]
pub fn is_empty(geometry: &Geometry) -> bool {
    geometry.is_empty()
}

/// Bounding box of everything but plain points, which never get one in `GeoJSON` output.
#[must_use]
pub fn bbox(geometry: &Geometry) -> Option<Rect> {
    match geometry {
        Geometry::Point(_) => None,
        other => other.bounding_rect(),
    }
}

/// Formats a bounding box as `[xmin, ymin, xmax, ymax]`.
#[must_use]
pub fn bbox_to_json(rect: &Rect, precision: usize) -> String {
    format!(
        "[{}, {}, {}, {}]",
        format_double(rect.min().x, precision),
        format_double(rect.min().y, precision),
        format_double(rect.max().x, precision),
        format_double(rect.max().y, precision)
    )
}

/// Serializes a geometry as a compact `GeoJSON` geometry object.
///
/// # Errors
///
/// Returns the geozero error raised while walking the geometry, including for NaN or
/// infinite coordinates, which have no JSON representation.
pub fn geometry_to_json(geometry: &Geometry, precision: usize) -> Result<String> {
    let mut writer = GeoJsonGeometryWriter::new(precision);
    geometry.process_geom(&mut writer)?;
    Ok(writer.finish())
}

/// Writes `GeoJSON` geometry text from geozero geometry events.
pub struct GeoJsonGeometryWriter {
    out: String,
    precision: usize,
}

impl GeoJsonGeometryWriter {
    #[must_use]
    pub fn new(precision: usize) -> Self {
        Self {
            out: String::new(),
            precision,
        }
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn separator(&mut self, idx: usize) {
        if idx > 0 {
            self.out.push(',');
        }
    }

    fn begin(&mut self, kind: &str, idx: usize) {
        self.separator(idx);
        self.out.push_str("{\"type\":\"");
        self.out.push_str(kind);
        self.out.push_str("\",\"coordinates\":[");
    }

    fn begin_ring(&mut self, tagged: bool, kind: &str, idx: usize) {
        if tagged {
            self.begin(kind, idx);
        } else {
            self.separator(idx);
            self.out.push('[');
        }
    }

    fn end_ring(&mut self, tagged: bool) {
        self.out.push_str(if tagged { "]}" } else { "]" });
    }
}

impl GeomProcessor for GeoJsonGeometryWriter {
    fn xy(&mut self, x: f64, y: f64, idx: usize) -> geozero::error::Result<()> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeozeroError::Geometry(format!(
                "non-finite coordinate ({x}, {y})"
            )));
        }
        self.separator(idx);
        self.out.push('[');
        self.out.push_str(&format_double(x, self.precision));
        self.out.push(',');
        self.out.push_str(&format_double(y, self.precision));
        self.out.push(']');
        Ok(())
    }

    fn empty_point(&mut self, idx: usize) -> geozero::error::Result<()> {
        self.separator(idx);
        self.out.push_str("{\"type\":\"Point\",\"coordinates\":[]}");
        Ok(())
    }

    fn point_begin(&mut self, idx: usize) -> geozero::error::Result<()> {
        self.separator(idx);
        self.out.push_str("{\"type\":\"Point\",\"coordinates\":");
        Ok(())
    }

    fn point_end(&mut self, _idx: usize) -> geozero::error::Result<()> {
        self.out.push('}');
        Ok(())
    }

    fn multipoint_begin(&mut self, _size: usize, idx: usize) -> geozero::error::Result<()> {
        self.begin("MultiPoint", idx);
        Ok(())
    }

    fn multipoint_end(&mut self, _idx: usize) -> geozero::error::Result<()> {
        self.end_ring(true);
        Ok(())
    }

    fn linestring_begin(
        &mut self,
        tagged: bool,
        _size: usize,
        idx: usize,
    ) -> geozero::error::Result<()> {
        self.begin_ring(tagged, "LineString", idx);
        Ok(())
    }

    fn linestring_end(&mut self, tagged: bool, _idx: usize) -> geozero::error::Result<()> {
        self.end_ring(tagged);
        Ok(())
    }

    fn multilinestring_begin(&mut self, _size: usize, idx: usize) -> geozero::error::Result<()> {
        self.begin("MultiLineString", idx);
        Ok(())
    }

    fn multilinestring_end(&mut self, _idx: usize) -> geozero::error::Result<()> {
        self.end_ring(true);
        Ok(())
    }

    fn polygon_begin(
        &mut self,
        tagged: bool,
        _size: usize,
        idx: usize,
    ) -> geozero::error::Result<()> {
        self.begin_ring(tagged, "Polygon", idx);
        Ok(())
    }

    fn polygon_end(&mut self, tagged: bool, _idx: usize) -> geozero::error::Result<()> {
        self.end_ring(tagged);
        Ok(())
    }

    fn multipolygon_begin(&mut self, _size: usize, idx: usize) -> geozero::error::Result<()> {
        self.begin("MultiPolygon", idx);
        Ok(())
    }

    fn multipolygon_end(&mut self, _idx: usize) -> geozero::error::Result<()> {
        self.end_ring(true);
        Ok(())
    }

    fn geometrycollection_begin(&mut self, _size: usize, idx: usize) -> geozero::error::Result<()> {
        self.separator(idx);
        self.out
            .push_str("{\"type\":\"GeometryCollection\",\"geometries\":[");
        Ok(())
    }

    fn geometrycollection_end(&mut self, _idx: usize) -> geozero::error::Result<()> {
        self.end_ring(true);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use geo::{line_string, point, polygon, Geometry, GeometryCollection, LineString, MultiPoint};
    use serde_json::Value;

    use super::*;

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(0.1, 17), "0.10000000000000001");
        assert_eq!(format_double(-3.0, 5), "-3");
        assert_eq!(format_double(12.345_678, 2), "12.35");
        assert_eq!(format_double(100.0, 0), "100");
        assert_eq!(format_double(0.000_01, 3), "0");
    }

    #[test]
    fn test_point() -> Result<()> {
        let geometry = Geometry::Point(point!(x: 1.123_456, y: 2.0));
        assert_eq!(
            geometry_to_json(&geometry, 3)?,
            r#"{"type":"Point","coordinates":[1.123,2]}"#
        );
        assert!(bbox(&geometry).is_none());
        Ok(())
    }

    #[test]
    fn test_linestring_and_bbox() -> Result<()> {
        let geometry = Geometry::LineString(line_string![(x: 0.5, y: -1.0), (x: 3.0, y: 4.25)]);
        assert_eq!(
            geometry_to_json(&geometry, 6)?,
            r#"{"type":"LineString","coordinates":[[0.5,-1],[3,4.25]]}"#
        );
        let rect = bbox(&geometry).unwrap();
        assert_eq!(bbox_to_json(&rect, 6), "[0.5, -1, 3, 4.25]");
        Ok(())
    }

    #[test]
    fn test_polygon_is_valid_geojson() -> anyhow::Result<()> {
        let geometry = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 1.0),
        ]);
        let value: Value = serde_json::from_str(&geometry_to_json(&geometry, 8)?)?;
        assert_eq!(value["type"], "Polygon");
        let ring = value["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 4);
        assert_relative_eq!(ring[2][1].as_f64().unwrap(), 1.0);
        Ok(())
    }

    #[test]
    fn test_collections() -> anyhow::Result<()> {
        let multipoint = Geometry::MultiPoint(MultiPoint::from(vec![(1.0, 2.0), (3.0, 4.0)]));
        assert_eq!(
            geometry_to_json(&multipoint, 2)?,
            r#"{"type":"MultiPoint","coordinates":[[1,2],[3,4]]}"#
        );

        let collection = Geometry::GeometryCollection(
            [
                Geometry::Point(point!(x: 1.0, y: 1.0)),
                Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]),
            ]
            .into_iter()
            .collect::<GeometryCollection>(),
        );
        let value: Value = serde_json::from_str(&geometry_to_json(&collection, 2)?)?;
        assert_eq!(value["type"], "GeometryCollection");
        assert_eq!(value["geometries"][1]["type"], "LineString");
        Ok(())
    }

    #[test]
    fn test_non_finite_coordinates() {
        assert_eq!(format_double(f64::NAN, 3), "null");
        assert_eq!(format_double(f64::NEG_INFINITY, 0), "null");

        let point = Geometry::Point(point!(x: f64::NAN, y: 1.0));
        assert!(matches!(geometry_to_json(&point, 6), Err(Error::GeozeroError(_))));

        let line = Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: f64::INFINITY, y: 2.0)
        ]);
        assert!(geometry_to_json(&line, 6).is_err());
    }

    #[test]
    fn test_empty_geometry() {
        assert!(is_empty(&Geometry::LineString(LineString::new(vec![]))));
        assert!(!is_empty(&Geometry::Point(point!(x: 0.0, y: 0.0))));
    }

    #[test]
    fn test_to_wgs84() -> Result<()> {
        let geometry = Geometry::Point(point!(x: 1.0, y: 2.0));
        assert_eq!(to_wgs84(&geometry, &Crs::wgs84(), None)?, geometry);
        assert!(matches!(
            to_wgs84(&geometry, &Crs::epsg(3857), None),
            Err(Error::Transform(_))
        ));

        let shift = |geometry: &Geometry, _: &Crs, _: &Crs| -> Result<Geometry> {
            use geo::MapCoords;
            Ok(geometry.map_coords(|c| geo::coord! { x: c.x + 10.0, y: c.y }))
        };
        let moved = to_wgs84(&geometry, &Crs::epsg(3857), Some(&shift))?;
        assert_eq!(moved, Geometry::Point(point!(x: 11.0, y: 2.0)));
        Ok(())
    }
}
