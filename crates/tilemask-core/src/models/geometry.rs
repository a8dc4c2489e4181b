//! Geographic geometry types shared by all tilemask crates.
//!
//! Coordinates are WGS84 degrees. Footprints keep the polygon/multipolygon
//! distinction of the source data; the rasterizer and the clipper work on the
//! flattened list of polygon parts.

use crate::error::{Result, TilemaskError};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned geographic rectangle
///
/// This is plain data: any four numbers can be stored. Operations that divide
/// by the extent call [`GeoBoundingBox::ensure_non_degenerate`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Box spanned by a north-west and a south-east corner
    pub fn from_corners(north_west: GeoPoint, south_east: GeoPoint) -> Self {
        Self::new(north_west.lon, south_east.lat, south_east.lon, north_west.lat)
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }

    /// True when the box has no positive area or holds non-finite values
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
            .iter()
            .all(|v| v.is_finite());
        !finite || !(self.min_lon < self.max_lon && self.min_lat < self.max_lat)
    }

    pub fn ensure_non_degenerate(&self) -> Result<()> {
        if self.is_degenerate() {
            return Err(TilemaskError::DegenerateBoundingBox {
                min_lon: self.min_lon,
                min_lat: self.min_lat,
                max_lon: self.max_lon,
                max_lat: self.max_lat,
            });
        }
        Ok(())
    }

    /// Closed-interval overlap test; boxes sharing only an edge intersect
    pub fn intersects(&self, other: &GeoBoundingBox) -> bool {
        let x_overlap = self.min_lon <= other.max_lon && self.max_lon >= other.min_lon;
        let y_overlap = self.min_lat <= other.max_lat && self.max_lat >= other.min_lat;

        x_overlap && y_overlap
    }

    pub fn contains_point(&self, point: GeoPoint) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }

    /// Smallest box covering both boxes
    pub fn union(&self, other: &GeoBoundingBox) -> GeoBoundingBox {
        GeoBoundingBox::new(
            self.min_lon.min(other.min_lon),
            self.min_lat.min(other.min_lat),
            self.max_lon.max(other.max_lon),
            self.max_lat.max(other.max_lat),
        )
    }

    /// Smallest box covering all points, `None` for an empty iterator
    pub fn enclosing<'a, I>(points: I) -> Option<GeoBoundingBox>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        points.into_iter().fold(None, |acc, p| {
            let point_box = GeoBoundingBox::new(p.lon, p.lat, p.lon, p.lat);
            Some(match acc {
                Some(b) => b.union(&point_box),
                None => point_box,
            })
        })
    }
}

/// One polygon: an exterior ring and optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRings {
    pub exterior: Vec<GeoPoint>,
    pub interiors: Vec<Vec<GeoPoint>>,
}

impl PolygonRings {
    pub fn new(exterior: Vec<GeoPoint>) -> Self {
        Self { exterior, interiors: Vec::new() }
    }

    pub fn with_interiors(mut self, interiors: Vec<Vec<GeoPoint>>) -> Self {
        self.interiors = interiors;
        self
    }

    /// Closed rectangular ring covering `bbox`
    pub fn rectangle(bbox: &GeoBoundingBox) -> Self {
        Self::new(vec![
            GeoPoint::new(bbox.max_lat, bbox.min_lon),
            GeoPoint::new(bbox.max_lat, bbox.max_lon),
            GeoPoint::new(bbox.min_lat, bbox.max_lon),
            GeoPoint::new(bbox.min_lat, bbox.min_lon),
            GeoPoint::new(bbox.max_lat, bbox.min_lon),
        ])
    }

    /// Extent of the exterior ring
    pub fn bounds(&self) -> Option<GeoBoundingBox> {
        GeoBoundingBox::enclosing(&self.exterior)
    }
}

/// A building entity as delivered by the polygon source
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
}

impl Footprint {
    /// Polygon parts; a single polygon is a one-element slice
    pub fn parts(&self) -> &[PolygonRings] {
        match self {
            Footprint::Polygon(rings) => std::slice::from_ref(rings),
            Footprint::MultiPolygon(parts) => parts,
        }
    }

    pub fn bounds(&self) -> Option<GeoBoundingBox> {
        self.parts()
            .iter()
            .filter_map(PolygonRings::bounds)
            .reduce(|a, b| a.union(&b))
    }
}

/// Ordered collection of footprints for one locality
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonSet {
    footprints: Vec<Footprint>,
}

impl PolygonSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, footprint: Footprint) {
        self.footprints.push(footprint);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Footprint> {
        self.footprints.iter()
    }

    /// Every polygon part, multipolygons flattened, in set order
    pub fn parts(&self) -> impl Iterator<Item = &PolygonRings> + '_ {
        self.footprints.iter().flat_map(|f| f.parts().iter())
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Total bounds of all footprints
    pub fn bounds(&self) -> Option<GeoBoundingBox> {
        self.footprints
            .iter()
            .filter_map(Footprint::bounds)
            .reduce(|a, b| a.union(&b))
    }
}

impl From<Vec<Footprint>> for PolygonSet {
    fn from(footprints: Vec<Footprint>) -> Self {
        Self { footprints }
    }
}

impl FromIterator<Footprint> for PolygonSet {
    fn from_iter<I: IntoIterator<Item = Footprint>>(iter: I) -> Self {
        Self { footprints: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a PolygonSet {
    type Item = &'a Footprint;
    type IntoIter = std::slice::Iter<'a, Footprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.footprints.iter()
    }
}

/// What a polygon source hands back for one locality
#[derive(Debug, Clone, PartialEq)]
pub struct LocalityGeometry {
    pub footprints: PolygonSet,
    pub centroid: GeoPoint,
}

/// How polygon rings become occupied pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FillRule {
    /// Fill every exterior ring solid, ignore holes
    #[default]
    ExteriorOnly,
    /// Combine exterior and interior rings of a part with even-odd parity
    EvenOdd,
}

/// Geometry validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidityMode {
    /// Reject the locality when a footprint is invalid
    Strict,
    /// Skip invalid footprints and keep going
    #[default]
    Lenient,
}
