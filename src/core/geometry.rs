//! Extents and cutline polygons.
use geo::{BoundingRect, Coord, Geometry, Intersects, MapCoords, MultiPolygon, Polygon, Rect};

use crate::core::crs::CoordinateTransform;
use crate::error::{Error, Result};

/// Axis-aligned extent in map units, ordered like OGR's `(minX, maxX, minY, maxY)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut extent: Option<Extent> = None;
        for (x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            extent = Some(match extent {
                None => Extent::new(x, x, y, y),
                Some(e) => Extent::new(e.min_x.min(x), e.max_x.max(x), e.min_y.min(y), e.max_y.max(y)),
            });
        }
        extent
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Zero-area, inverted or non-finite extents are degenerate.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Grow the max-X and max-Y sides only. Min-X/min-Y stay put so the
    /// origin of the clipped grid is anchored on the cutline.
    pub fn pad_max(&self, margin: f64) -> Self {
        Extent::new(self.min_x, self.max_x + margin, self.min_y, self.max_y + margin)
    }

    pub fn intersection_area(&self, other: &Extent) -> f64 {
        let w = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let h = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }
}

impl From<Rect<f64>> for Extent {
    fn from(r: Rect<f64>) -> Self {
        Extent::new(r.min().x, r.max().x, r.min().y, r.max().y)
    }
}

/// Area-of-interest polygons together with the CRS they are expressed in.
/// The polygons are immutable once built so the cached bounds stay valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cutline {
    pub crs: String,
    polygons: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl Cutline {
    pub fn new(crs: impl Into<String>, polygons: MultiPolygon<f64>) -> Self {
        let bounds = polygons.bounding_rect();
        Self {
            crs: crs.into(),
            polygons,
            bounds,
        }
    }

    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    pub fn into_polygons(self) -> MultiPolygon<f64> {
        self.polygons
    }

    /// Collect every polygon out of a (possibly nested) geometry.
    pub fn from_geometries(
        crs: impl Into<String>,
        geometries: impl IntoIterator<Item = Geometry<f64>>,
    ) -> Result<Self> {
        let mut polygons = Vec::new();
        for geometry in geometries {
            collect_polygons(geometry, &mut polygons)?;
        }
        Ok(Self::new(crs, MultiPolygon(polygons)))
    }

    /// Bounding extent of all rings. Empty or zero-area cutlines are rejected.
    pub fn extent(&self) -> Result<Extent> {
        let rect = self
            .bounds
            .ok_or_else(|| Error::Geometry("cutline contains no polygons".to_string()))?;
        let extent = Extent::from(rect);
        if extent.is_degenerate() {
            return Err(Error::Geometry(format!(
                "degenerate cutline extent ({}, {}, {}, {})",
                extent.min_x, extent.max_x, extent.min_y, extent.max_y
            )));
        }
        Ok(extent)
    }

    /// Whether a point lies inside the polygons (boundary counts as inside).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let Some(bounds) = self.bounds else {
            return false;
        };
        if x < bounds.min().x || x > bounds.max().x || y < bounds.min().y || y > bounds.max().y {
            return false;
        }
        self.polygons.intersects(&Coord { x, y })
    }

    /// Move every vertex into `target_crs` through `transform`.
    pub fn reprojected(
        &self,
        target_crs: &str,
        transform: &dyn CoordinateTransform,
    ) -> Result<Cutline> {
        let polygons = self.polygons.try_map_coords(|c: Coord<f64>| {
            let mut xs = [c.x];
            let mut ys = [c.y];
            transform.transform(&mut xs, &mut ys)?;
            Ok::<_, Error>(Coord { x: xs[0], y: ys[0] })
        })?;
        Ok(Cutline::new(target_crs, polygons))
    }
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) -> Result<()> {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp.0),
        Geometry::Rect(r) => out.push(r.to_polygon()),
        Geometry::GeometryCollection(gc) => {
            for g in gc.0 {
                collect_polygons(g, out)?;
            }
        }
        other => {
            return Err(Error::Geometry(format!(
                "cutline must contain polygons, found {}",
                geometry_name(&other)
            )));
        }
    }
    Ok(())
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Triangle(_) => "Triangle",
        _ => "Geometry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crs::IdentityTransform;
    use geo::{LineString, polygon};

    fn square(min: f64, max: f64) -> Polygon<f64> {
        polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
            (x: min, y: min),
        ]
    }

    #[test]
    fn pad_only_touches_max_sides() {
        let e = Extent::new(0.0, 100.0, 0.0, 100.0).pad_max(2560.0);
        assert_eq!(e, Extent::new(0.0, 2660.0, 0.0, 2660.0));
    }

    #[test]
    fn cutline_extent_and_membership() {
        let cutline = Cutline::new("EPSG:25832", MultiPolygon(vec![square(0.0, 100.0)]));
        assert_eq!(cutline.extent().unwrap(), Extent::new(0.0, 100.0, 0.0, 100.0));
        assert!(cutline.contains(50.0, 50.0));
        assert!(cutline.contains(0.0, 50.0));
        assert!(!cutline.contains(150.0, 50.0));
    }

    #[test]
    fn empty_and_flat_cutlines_are_geometry_errors() {
        let empty = Cutline::new("EPSG:25832", MultiPolygon(vec![]));
        assert_eq!(empty.extent().unwrap_err().kind(), "GeometryError");

        let flat = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]),
            vec![],
        );
        let flat = Cutline::new("EPSG:25832", MultiPolygon(vec![flat]));
        assert_eq!(flat.extent().unwrap_err().kind(), "GeometryError");
    }

    #[test]
    fn non_polygon_geometry_is_rejected() {
        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        let err = Cutline::from_geometries("EPSG:4326", vec![line]).unwrap_err();
        assert!(err.to_string().contains("LineString"));
    }

    #[test]
    fn identity_reprojection_keeps_vertices() {
        let cutline = Cutline::new("EPSG:4326", MultiPolygon(vec![square(1.0, 2.0)]));
        let moved = cutline.reprojected("EPSG:4326", &IdentityTransform).unwrap();
        assert_eq!(moved.polygons(), cutline.polygons());
    }

    #[test]
    fn bounds_follow_the_polygons_they_were_built_from() {
        let small = Cutline::new("EPSG:25832", MultiPolygon(vec![square(0.0, 10.0)]));
        let mut grown = small.clone().into_polygons();
        grown.0.push(square(20.0, 30.0));
        let grown = Cutline::new(small.crs.clone(), grown);

        assert!(!small.contains(25.0, 25.0));
        assert!(grown.contains(25.0, 25.0));
        assert_eq!(grown.extent().unwrap(), Extent::new(0.0, 30.0, 0.0, 30.0));
    }

    #[test]
    fn overlap_area() {
        let a = Extent::new(0.0, 10.0, 0.0, 10.0);
        assert_eq!(a.intersection_area(&Extent::new(5.0, 20.0, 5.0, 20.0)), 25.0);
        assert_eq!(a.intersection_area(&Extent::new(20.0, 30.0, 0.0, 10.0)), 0.0);
    }
}
