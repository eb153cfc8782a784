//! Host-side rebuild of the cell to particle lookup used by neighbour queries.
//!
//! Particles are binned with a counting sort over cell ids: one pass counts
//! occupancy, an exclusive prefix sum turns counts into offsets, and a stable
//! scatter in ascending particle order fills the permutation. Indices that
//! share a cell therefore keep ascending particle order, and the whole rebuild
//! is `O(N + C)` regardless of how skewed the occupancy is.

use bytemuck::{Pod, Zeroable};

/// Contiguous run of the permutation holding one cell's particles.
///
/// `offset` is meaningless when `size` is zero and must not be dereferenced.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub offset: i32,
    pub size: i32,
}
unsafe impl Zeroable for CellRange {}
unsafe impl Pod for CellRange {}

impl CellRange {
    pub const EMPTY: CellRange = CellRange { offset: 0, size: 0 };

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

pub struct SpatialHash {
    permutation: Vec<u32>,
    lookup: Vec<CellRange>,
    /// per-cell write position used during the scatter pass
    cursors: Vec<u32>,
}

impl SpatialHash {
    pub fn new(particle_count: usize, cell_count: usize) -> Self {
        SpatialHash {
            permutation: vec![0; particle_count],
            lookup: vec![CellRange::EMPTY; cell_count],
            cursors: vec![0; cell_count],
        }
    }

    pub fn particle_count(&self) -> usize {
        self.permutation.len()
    }

    pub fn cell_count(&self) -> usize {
        self.lookup.len()
    }

    /// Rebuilds the permutation and lookup table from scratch.
    ///
    /// `cell_ids` must hold exactly one id in `[0, cell_count)` per particle.
    /// Out-of-range ids are a kernel contract violation and are not defended
    /// against.
    pub fn rebuild(&mut self, cell_ids: &[u32]) {
        debug_assert_eq!(cell_ids.len(), self.permutation.len());

        self.cursors.fill(0);
        for &cell in cell_ids {
            debug_assert!((cell as usize) < self.lookup.len(), "cell id {cell} out of range");
            self.cursors[cell as usize] += 1;
        }

        let mut cursor = 0u32;
        for (range, count) in self.lookup.iter_mut().zip(self.cursors.iter_mut()) {
            let size = *count;
            *range = if size == 0 {
                CellRange::EMPTY
            } else {
                CellRange {
                    offset: cursor as i32,
                    size: size as i32,
                }
            };
            *count = cursor;
            cursor += size;
        }

        for (particle, &cell) in cell_ids.iter().enumerate() {
            let slot = &mut self.cursors[cell as usize];
            self.permutation[*slot as usize] = particle as u32;
            *slot += 1;
        }
    }

    pub fn permutation(&self) -> &[u32] {
        &self.permutation
    }

    pub fn lookup(&self) -> &[CellRange] {
        &self.lookup
    }

    /// Particles assigned to `cell`, in ascending index order.
    pub fn cell_particles(&self, cell: u32) -> &[u32] {
        let range = self.lookup[cell as usize];
        if range.is_empty() {
            return &[];
        }
        let start = range.offset as usize;
        &self.permutation[start..start + range.size as usize]
    }
}
