//! Greedy lane packing for activity bars.
//!
//! Root activities are placed in start order into the first lane whose
//! occupied extent ends at or before their start. Children never compete for
//! lanes: each descendant is stacked one lane below the previous one in
//! depth-first arrival order, so a decomposition tree reads top to bottom.

/// One interval to pack, in pixels, with its already-resolved children.
#[derive(Debug, Clone, PartialEq)]
pub struct PackItem {
    /// Caller-defined key echoed back in the placement.
    pub key: usize,
    /// Leftmost occupied pixel.
    pub start: f64,
    /// Rightmost occupied pixel.
    pub end: f64,
    /// Children in arrival order.
    pub children: Vec<PackItem>,
}

impl PackItem {
    /// Create a childless item.
    pub fn new(key: usize, start: f64, end: f64) -> Self {
        Self {
            key,
            start,
            end,
            children: Vec::new(),
        }
    }

    /// Attach children.
    pub fn with_children(mut self, children: Vec<PackItem>) -> Self {
        self.children = children;
        self
    }
}

/// Vertical placement of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Key of the placed item.
    pub key: usize,
    /// Lane index, counted from the top.
    pub lane: usize,
    /// Nesting depth below its root (0 for roots).
    pub depth: usize,
    /// Vertical offset in pixels.
    pub y: f64,
}

/// Result of a packing run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packing {
    /// Placements in packing order (roots by start, descendants depth-first).
    pub placements: Vec<Placement>,
    /// Number of lanes used.
    pub lanes: usize,
    /// Lowest pixel reached, i.e. the height needed to show every lane.
    pub height: f64,
}

impl Packing {
    /// Placement of a key.
    pub fn placement(&self, key: usize) -> Option<&Placement> {
        self.placements.iter().find(|placement| placement.key == key)
    }
}

/// Lane packer with a fixed lane pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPacker {
    row_height: f64,
}

impl RowPacker {
    /// Create a packer where each lane is `row_height` pixels tall.
    pub fn new(row_height: f64) -> Self {
        Self {
            row_height: row_height.max(0.0),
        }
    }

    /// Pack root items (and their subtrees) into lanes.
    ///
    /// Items with identical starts keep their input order.
    pub fn pack(&self, items: &[PackItem]) -> Packing {
        let mut order: Vec<&PackItem> = items.iter().collect();
        order.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut lane_ends: Vec<f64> = Vec::new();
        let mut placements = Vec::new();
        for item in order {
            let mut stack = Vec::new();
            flatten(item, 0, &mut stack);
            let lane = first_fit(&lane_ends, &stack);
            for (offset, (node, depth)) in stack.iter().enumerate() {
                let index = lane + offset;
                if index >= lane_ends.len() {
                    lane_ends.resize(index + 1, f64::NEG_INFINITY);
                }
                lane_ends[index] = lane_ends[index].max(node.end.max(node.start));
                placements.push(Placement {
                    key: node.key,
                    lane: index,
                    depth: *depth,
                    y: index as f64 * self.row_height,
                });
            }
        }

        Packing {
            placements,
            lanes: lane_ends.len(),
            height: lane_ends.len() as f64 * self.row_height,
        }
    }
}

fn flatten<'a>(item: &'a PackItem, depth: usize, out: &mut Vec<(&'a PackItem, usize)>) {
    out.push((item, depth));
    for child in &item.children {
        flatten(child, depth + 1, out);
    }
}

/// First lane where every node of the stack fits on consecutive lanes.
fn first_fit(lane_ends: &[f64], stack: &[(&PackItem, usize)]) -> usize {
    let free = |lane: usize, start: f64| lane_ends.get(lane).is_none_or(|end| *end <= start);
    (0..=lane_ends.len())
        .find(|lane| {
            stack
                .iter()
                .enumerate()
                .all(|(offset, (node, _))| free(lane + offset, node.start))
        })
        .unwrap_or(lane_ends.len())
}
