use rstar::{RTree, RTreeObject, AABB};
use tilemask_core::models::{Footprint, GeoBoundingBox, PolygonRings, PolygonSet};

/// Footprints whose extent touches `bbox`
///
/// This is a coarse bounding-box filter: kept footprints are not trimmed to
/// the box. Multi-polygons keep only the parts that touch the box. Boxes that
/// only share an edge count as touching.
pub fn clip(polygons: &PolygonSet, bbox: &GeoBoundingBox) -> PolygonSet {
    polygons
        .iter()
        .filter_map(|footprint| match footprint {
            Footprint::Polygon(rings) => {
                part_touches(rings, bbox).then(|| Footprint::Polygon(rings.clone()))
            }
            Footprint::MultiPolygon(parts) => {
                let kept: Vec<PolygonRings> =
                    parts.iter().filter(|p| part_touches(p, bbox)).cloned().collect();
                (!kept.is_empty()).then_some(Footprint::MultiPolygon(kept))
            }
        })
        .collect()
}

fn part_touches(rings: &PolygonRings, bbox: &GeoBoundingBox) -> bool {
    rings.bounds().is_some_and(|bounds| bounds.intersects(bbox))
}

/// A polygon part with its position in the source set
#[derive(Debug, Clone, PartialEq)]
struct IndexedPart {
    ordinal: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPart {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over the polygon parts of one locality
///
/// Built once per locality and queried once per tile. Queries select the same
/// parts as [`clip`] and return them in source order, so masks do not depend
/// on the tree layout.
pub struct FootprintIndex {
    parts: Vec<PolygonRings>,
    tree: RTree<IndexedPart>,
}

impl FootprintIndex {
    /// Index every part of `polygons`; parts with an empty exterior are dropped
    pub fn build(polygons: &PolygonSet) -> Self {
        let parts: Vec<PolygonRings> = polygons.parts().cloned().collect();

        let indexed: Vec<IndexedPart> = parts
            .iter()
            .enumerate()
            .filter_map(|(ordinal, part)| {
                part.bounds().map(|b| IndexedPart {
                    ordinal,
                    envelope: AABB::from_corners([b.min_lon, b.min_lat], [b.max_lon, b.max_lat]),
                })
            })
            .collect();

        tracing::debug!("Indexed {} footprint parts", indexed.len());

        Self { parts, tree: RTree::bulk_load(indexed) }
    }

    /// Parts whose extent touches `bbox`, in source order
    pub fn query(&self, bbox: &GeoBoundingBox) -> Vec<&PolygonRings> {
        let envelope =
            AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat]);

        let mut ordinals: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.ordinal)
            .collect();
        ordinals.sort_unstable();

        ordinals.into_iter().map(|ordinal| &self.parts[ordinal]).collect()
    }

    /// Number of indexed parts
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_lon: f64, min_lat: f64, side: f64) -> PolygonRings {
        PolygonRings::rectangle(&GeoBoundingBox::new(
            min_lon,
            min_lat,
            min_lon + side,
            min_lat + side,
        ))
    }

    #[test]
    fn test_clip_keeps_touching_footprints() {
        let set = PolygonSet::from(vec![
            Footprint::Polygon(square(0.0, 0.0, 1.0)),
            Footprint::Polygon(square(5.0, 5.0, 1.0)),
            Footprint::Polygon(square(1.0, 0.0, 1.0)),
        ]);
        let bbox = GeoBoundingBox::new(0.5, 0.5, 1.0, 1.0);

        let clipped = clip(&set, &bbox);

        assert_eq!(clipped.len(), 2);
        let kept: Vec<_> = clipped.iter().collect();
        assert_eq!(kept[0], &Footprint::Polygon(square(0.0, 0.0, 1.0)));
        assert_eq!(kept[1], &Footprint::Polygon(square(1.0, 0.0, 1.0)));
    }

    #[test]
    fn test_clip_does_not_trim_geometry() {
        let big = square(-10.0, -10.0, 20.0);
        let set = PolygonSet::from(vec![Footprint::Polygon(big.clone())]);

        let clipped = clip(&set, &GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(clipped.parts().next(), Some(&big));
    }

    #[test]
    fn test_clip_multipolygon_keeps_touching_parts() {
        let set = PolygonSet::from(vec![Footprint::MultiPolygon(vec![
            square(0.0, 0.0, 1.0),
            square(10.0, 10.0, 1.0),
        ])]);

        let clipped = clip(&set, &GeoBoundingBox::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped.parts().count(), 1);

        let none = clip(&set, &GeoBoundingBox::new(50.0, 50.0, 51.0, 51.0));
        assert!(none.is_empty());
    }

    #[test]
    fn test_clip_empty_input() {
        let clipped = clip(&PolygonSet::new(), &GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_index_matches_clip_in_source_order() {
        let set: PolygonSet = (0..50)
            .map(|i| {
                let offset = f64::from(i % 10);
                Footprint::Polygon(square(offset, f64::from(i / 10), 0.5))
            })
            .collect();
        let index = FootprintIndex::build(&set);
        assert_eq!(index.len(), 50);

        let bbox = GeoBoundingBox::new(2.2, 1.2, 4.5, 3.0);
        let expected: Vec<PolygonRings> = clip(&set, &bbox).parts().cloned().collect();
        let found: Vec<PolygonRings> = index.query(&bbox).into_iter().cloned().collect();

        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_index_skips_empty_rings() {
        let set = PolygonSet::from(vec![
            Footprint::Polygon(PolygonRings::new(vec![])),
            Footprint::Polygon(square(0.0, 0.0, 1.0)),
        ]);
        let index = FootprintIndex::build(&set);

        assert_eq!(index.len(), 1);
        assert_eq!(index.query(&GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0)).len(), 1);
    }
}
