//! Quadtree over drawn geometry.
//!
//! The index is rebuilt from scratch every draw pass from the pixel geometry
//! that was actually drawn. Entries are keyed on one representative
//! coordinate (the center of a marker, the top-left corner of a rectangle).

use crate::geom::{ScreenPoint, ScreenRect};

const NODE_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 16;

/// One indexed shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry {
    /// Caller-defined target this shape belongs to.
    pub target: usize,
    /// Representative x coordinate.
    pub x: f64,
    /// Representative y coordinate.
    pub y: f64,
    /// Width for rectangles, 0 for point-like shapes.
    pub width: f64,
    /// Height for rectangles, 0 for point-like shapes.
    pub height: f64,
}

impl IndexEntry {
    /// A point-like entry.
    pub fn point(target: usize, center: ScreenPoint) -> Self {
        Self {
            target,
            x: center.x,
            y: center.y,
            width: 0.0,
            height: 0.0,
        }
    }

    /// A rectangle keyed on its top-left corner.
    pub fn rect(target: usize, rect: ScreenRect) -> Self {
        let rect = rect.normalized();
        Self {
            target,
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        }
    }

    /// Covered area of the entry.
    pub fn bounds(&self) -> ScreenRect {
        ScreenRect::from_xywh(self.x, self.y, self.width, self.height)
    }

    fn position(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }
}

#[derive(Debug, Clone)]
struct QuadNode {
    bounds: ScreenRect,
    depth: usize,
    items: Vec<usize>,
    children: Option<Box<[QuadNode; 4]>>,
}

impl QuadNode {
    fn new(bounds: ScreenRect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, index: usize, entries: &[IndexEntry]) {
        if let Some(children) = self.children.as_mut() {
            let quadrant = quadrant_of(self.bounds, entries[index].position());
            children[quadrant].insert(index, entries);
            return;
        }
        self.items.push(index);
        if self.items.len() > NODE_CAPACITY && self.depth < MAX_DEPTH {
            self.split(entries);
        }
    }

    fn split(&mut self, entries: &[IndexEntry]) {
        let ScreenRect { min, max } = self.bounds;
        let mid = self.bounds.center();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            QuadNode::new(ScreenRect::new(min, mid), depth),
            QuadNode::new(
                ScreenRect::new(ScreenPoint::new(mid.x, min.y), ScreenPoint::new(max.x, mid.y)),
                depth,
            ),
            QuadNode::new(
                ScreenRect::new(ScreenPoint::new(min.x, mid.y), ScreenPoint::new(mid.x, max.y)),
                depth,
            ),
            QuadNode::new(ScreenRect::new(mid, max), depth),
        ]));
        for index in std::mem::take(&mut self.items) {
            self.insert(index, entries);
        }
    }

    fn collect(&self, window: ScreenRect, entries: &[IndexEntry], out: &mut Vec<usize>) {
        if !overlaps_inclusive(self.bounds, window) {
            return;
        }
        out.extend(
            self.items
                .iter()
                .copied()
                .filter(|index| window.contains(entries[*index].position())),
        );
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect(window, entries, out);
            }
        }
    }
}

fn quadrant_of(bounds: ScreenRect, point: ScreenPoint) -> usize {
    let mid = bounds.center();
    let right = usize::from(point.x >= mid.x);
    let bottom = usize::from(point.y >= mid.y);
    right + 2 * bottom
}

fn overlaps_inclusive(a: ScreenRect, b: ScreenRect) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}

/// Point/rectangle index for one layer of one draw pass.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    entries: Vec<IndexEntry>,
    root: Option<QuadNode>,
    max_width: f64,
    max_height: f64,
}

impl SpatialIndex {
    /// Build an index bounded by `extent`, grown to cover stray entries.
    pub fn build(entries: Vec<IndexEntry>, extent: ScreenRect) -> Self {
        let entries: Vec<IndexEntry> = entries
            .into_iter()
            .filter(|entry| {
                let finite = entry.x.is_finite()
                    && entry.y.is_finite()
                    && entry.width.is_finite()
                    && entry.height.is_finite();
                if !finite {
                    tracing::warn!(target = entry.target, "skipping non-finite index entry");
                }
                finite
            })
            .collect();

        let mut bounds = extent.normalized();
        let mut max_width: f64 = 0.0;
        let mut max_height: f64 = 0.0;
        for entry in &entries {
            bounds = bounds.union(&ScreenRect::new(entry.position(), entry.position()));
            max_width = max_width.max(entry.width);
            max_height = max_height.max(entry.height);
        }

        let mut root = QuadNode::new(bounds, 0);
        for index in 0..entries.len() {
            root.insert(index, &entries);
        }

        Self {
            entries,
            root: Some(root),
            max_width,
            max_height,
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest indexed rectangle, as `(width, height)`.
    pub fn max_extent(&self) -> (f64, f64) {
        (self.max_width, self.max_height)
    }

    /// Entries whose representative coordinate lies inside `window`, in
    /// insertion order.
    pub fn within(&self, window: ScreenRect) -> Vec<&IndexEntry> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        root.collect(window.normalized(), &self.entries, &mut found);
        found.sort_unstable();
        found.into_iter().map(|index| &self.entries[index]).collect()
    }

    /// Nearest entry within `tolerance` pixels. Ties keep insertion order.
    pub fn nearest(&self, point: ScreenPoint, tolerance: f64) -> Option<&IndexEntry> {
        let tolerance = tolerance.max(0.0);
        let window = ScreenRect::new(
            ScreenPoint::new(point.x - tolerance, point.y - tolerance),
            ScreenPoint::new(point.x + tolerance, point.y + tolerance),
        );
        let limit = tolerance * tolerance;
        let mut best: Option<(&IndexEntry, f64)> = None;
        for entry in self.within(window) {
            let distance = entry.position().distance_sq(point);
            if distance > limit {
                continue;
            }
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((entry, distance));
            }
        }
        best.map(|(entry, _)| entry)
    }

    /// Every rectangle covering `point`.
    ///
    /// The search window is widened by the largest indexed rectangle, because
    /// a rectangle keyed on its corner can cover a point far from that corner.
    pub fn containing(&self, point: ScreenPoint) -> Vec<&IndexEntry> {
        let window = ScreenRect::new(
            ScreenPoint::new(point.x - self.max_width, point.y - self.max_height),
            point,
        );
        self.within(window)
            .into_iter()
            .filter(|entry| entry.bounds().contains(point))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent() -> ScreenRect {
        ScreenRect::from_xywh(0.0, 0.0, 1000.0, 100.0)
    }

    #[test]
    fn nearest_respects_tolerance() {
        let entries = vec![
            IndexEntry::point(0, ScreenPoint::new(10.0, 10.0)),
            IndexEntry::point(1, ScreenPoint::new(20.0, 10.0)),
        ];
        let index = SpatialIndex::build(entries, extent());
        let hit = index.nearest(ScreenPoint::new(18.0, 11.0), 5.0).expect("hit");
        assert_eq!(hit.target, 1);
        assert!(index.nearest(ScreenPoint::new(50.0, 50.0), 5.0).is_none());
    }

    #[test]
    fn rect_query_finds_wide_rect_far_from_origin() {
        let entries = vec![
            IndexEntry::rect(0, ScreenRect::from_xywh(0.0, 0.0, 600.0, 20.0)),
            IndexEntry::rect(1, ScreenRect::from_xywh(700.0, 0.0, 10.0, 20.0)),
        ];
        let index = SpatialIndex::build(entries, extent());
        let hits = index.containing(ScreenPoint::new(550.0, 10.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, 0);
        assert!(index.containing(ScreenPoint::new(650.0, 10.0)).is_empty());
    }

    #[test]
    fn overlapping_rects_are_all_returned() {
        let entries = vec![
            IndexEntry::rect(0, ScreenRect::from_xywh(10.0, 0.0, 50.0, 20.0)),
            IndexEntry::rect(1, ScreenRect::from_xywh(10.0, 0.0, 50.0, 20.0)),
            IndexEntry::rect(2, ScreenRect::from_xywh(40.0, 0.0, 50.0, 20.0)),
        ];
        let index = SpatialIndex::build(entries, extent());
        let targets: Vec<usize> = index
            .containing(ScreenPoint::new(45.0, 5.0))
            .iter()
            .map(|entry| entry.target)
            .collect();
        assert_eq!(targets, vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_and_zero_coordinates_do_not_break_splitting() {
        let entries: Vec<IndexEntry> = (0..100)
            .map(|target| IndexEntry::point(target, ScreenPoint::new(0.0, 0.0)))
            .collect();
        let index = SpatialIndex::build(entries, extent());
        assert_eq!(index.len(), 100);
        assert_eq!(index.within(ScreenRect::from_xywh(0.0, 0.0, 1.0, 1.0)).len(), 100);
        assert_eq!(
            index.nearest(ScreenPoint::new(0.0, 0.0), 1.0).map(|entry| entry.target),
            Some(0)
        );
    }

    #[test]
    fn entries_outside_extent_are_still_indexed() {
        let entries = vec![IndexEntry::point(3, ScreenPoint::new(-50.0, 500.0))];
        let index = SpatialIndex::build(entries, extent());
        assert!(index.nearest(ScreenPoint::new(-50.0, 500.0), 0.5).is_some());
    }

    #[test]
    fn many_points_match_linear_scan() {
        let entries: Vec<IndexEntry> = (0..500)
            .map(|i| {
                let x = (i * 37 % 1000) as f64;
                let y = (i * 13 % 100) as f64;
                IndexEntry::point(i, ScreenPoint::new(x, y))
            })
            .collect();
        let index = SpatialIndex::build(entries.clone(), extent());
        let window = ScreenRect::from_xywh(200.0, 20.0, 300.0, 40.0);
        let expected: Vec<usize> = entries
            .iter()
            .filter(|entry| window.contains(ScreenPoint::new(entry.x, entry.y)))
            .map(|entry| entry.target)
            .collect();
        let found: Vec<usize> = index.within(window).iter().map(|entry| entry.target).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn empty_index_answers_nothing() {
        let index = SpatialIndex::default();
        assert!(index.is_empty());
        assert!(index.containing(ScreenPoint::new(1.0, 1.0)).is_empty());
        assert!(index.nearest(ScreenPoint::new(1.0, 1.0), 10.0).is_none());
    }
}
