//! Uniform-grid spatial hash broadphase
//!
//! Buckets are keyed by packed integer cell coordinates. The index is meant
//! to be rebuilt from scratch every substep since every body moves.

use std::collections::HashMap;

use glam::{IVec2, Vec2};

use crate::consts::MIN_CELL_SIZE;

/// Largest per-axis cell span a square is bucketed into
pub const MAX_CELL_SPAN: f32 = 64.0;

/// Spatial hash mapping grid cells to the handles overlapping them
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<u64, Vec<usize>>,
    /// Handles whose square spans too many cells (or is non-finite);
    /// every query checks them directly
    oversized: Vec<usize>,
    /// Every inserted handle, in insertion order
    handles: Vec<usize>,
    /// Per-handle query stamp used to dedup candidates across buckets
    seen: Vec<u32>,
    stamp: u32,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(crate::consts::CELL_SIZE)
    }
}

/// Pack signed cell coordinates into one map key
#[inline]
fn cell_key(cell: IVec2) -> u64 {
    ((cell.x as u32 as u64) << 32) | (cell.y as u32 as u64)
}

/// Cell size with zero, negative and non-finite values raised to the minimum
#[inline]
pub fn sanitize_cell_size(cell_size: f32) -> f32 {
    if cell_size.is_finite() && cell_size >= MIN_CELL_SIZE {
        cell_size
    } else {
        MIN_CELL_SIZE
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: sanitize_cell_size(cell_size),
            cells: HashMap::new(),
            oversized: Vec::new(),
            handles: Vec::new(),
            seen: Vec::new(),
            stamp: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size; drops all buckets since they no longer line up
    pub fn set_cell_size(&mut self, cell_size: f32) {
        let cell_size = sanitize_cell_size(cell_size);
        if cell_size != self.cell_size {
            self.cell_size = cell_size;
            self.cells.clear();
        }
    }

    /// Cell containing `point`
    #[inline]
    pub fn cell_of(&self, point: Vec2) -> IVec2 {
        (point / self.cell_size).floor().as_ivec2()
    }

    /// Inclusive cell range covered by the square of half-size `extent`
    ///
    /// `None` when the square is non-finite or spans more than
    /// `MAX_CELL_SPAN` cells on either axis.
    #[inline]
    fn cell_range(&self, center: Vec2, extent: f32) -> Option<(IVec2, IVec2)> {
        let half = Vec2::splat(extent);
        let lo = ((center - half) / self.cell_size).floor();
        let hi = ((center + half) / self.cell_size).floor();
        if !lo.is_finite() || !hi.is_finite() || (hi - lo).max_element() > MAX_CELL_SPAN {
            return None;
        }
        Some((lo.as_ivec2(), hi.as_ivec2()))
    }

    /// Empty every bucket
    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
        self.handles.clear();
    }

    /// Number of handles kept outside the grid
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    /// Number of non-empty buckets
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|bucket| !bucket.is_empty()).count()
    }

    /// Handles stored in the bucket for `cell`
    pub fn bucket(&self, cell: IVec2) -> &[usize] {
        self.cells
            .get(&cell_key(cell))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Add `handle` to every cell its bounding square touches
    ///
    /// Squares wider than `MAX_CELL_SPAN` cells go to a side list that every
    /// query scans, so huge or runaway particles cost O(n) instead of
    /// filling the map.
    pub fn insert(&mut self, handle: usize, center: Vec2, extent: f32) {
        match self.cell_range(center, extent) {
            Some((lo, hi)) => {
                for cx in lo.x..=hi.x {
                    for cy in lo.y..=hi.y {
                        self.cells
                            .entry(cell_key(IVec2::new(cx, cy)))
                            .or_default()
                            .push(handle);
                    }
                }
            }
            None => self.oversized.push(handle),
        }
        self.handles.push(handle);
        if handle >= self.seen.len() {
            self.seen.resize(handle + 1, 0);
        }
    }

    /// Clear and insert every `(handle, center, extent)` triple
    pub fn rebuild<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (usize, Vec2, f32)>,
    {
        self.clear();
        for (handle, center, extent) in items {
            self.insert(handle, center, extent);
        }
    }

    /// Collect every other handle sharing at least one cell with the query
    /// square into `out` (cleared first). No handle is yielded twice and
    /// `handle` itself is never yielded. Order is unspecified.
    pub fn candidates(&mut self, handle: usize, center: Vec2, extent: f32, out: &mut Vec<usize>) {
        out.clear();
        self.next_stamp();
        let stamp = self.stamp;
        let Some((lo, hi)) = self.cell_range(center, extent) else {
            // Query square too large for the grid: everything is a candidate
            out.extend(self.handles.iter().copied().filter(|&other| other != handle));
            out.sort_unstable();
            out.dedup();
            return;
        };
        let seen = &mut self.seen;
        let mut visit = |other: usize| {
            // Every inserted handle has a slot in `seen`
            if other != handle && seen[other] != stamp {
                seen[other] = stamp;
                out.push(other);
            }
        };
        for cx in lo.x..=hi.x {
            for cy in lo.y..=hi.y {
                if let Some(bucket) = self.cells.get(&cell_key(IVec2::new(cx, cy))) {
                    bucket.iter().copied().for_each(&mut visit);
                }
            }
        }
        self.oversized.iter().copied().for_each(visit);
    }

    fn next_stamp(&mut self) {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            // Wrapped: old marks could alias the new stamp
            self.seen.fill(0);
            self.stamp = 1;
        }
    }
}
