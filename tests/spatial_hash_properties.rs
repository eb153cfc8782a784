//! Property tests for the host neighbour index rebuild.
//!
//! For arbitrary cell assignments the rebuilt permutation and lookup table must
//! agree with a straightforward ordered grouping of particle indices.

use std::collections::BTreeMap;

use pbf::spatial_hash::{CellRange, SpatialHash};
use proptest::prelude::*;

/// (cell count, one cell id per particle)
fn assignments() -> impl Strategy<Value = (usize, Vec<u32>)> {
    (1usize..64).prop_flat_map(|cell_count| {
        (
            Just(cell_count),
            prop::collection::vec(0..cell_count as u32, 1..400),
        )
    })
}

fn rebuilt(cell_count: usize, cell_ids: &[u32]) -> SpatialHash {
    let mut hash = SpatialHash::new(cell_ids.len(), cell_count);
    hash.rebuild(cell_ids);
    hash
}

proptest! {
    #[test]
    fn sizes_sum_to_particle_count((cell_count, cell_ids) in assignments()) {
        let hash = rebuilt(cell_count, &cell_ids);
        let total: i32 = hash.lookup().iter().map(|range| range.size).sum();
        prop_assert_eq!(total as usize, cell_ids.len());
    }

    #[test]
    fn permutation_is_a_bijection((cell_count, cell_ids) in assignments()) {
        let hash = rebuilt(cell_count, &cell_ids);
        let mut seen = vec![false; cell_ids.len()];
        for &particle in hash.permutation() {
            prop_assert!(!seen[particle as usize], "particle {} appears twice", particle);
            seen[particle as usize] = true;
        }
        prop_assert!(seen.iter().all(|&present| present));
    }

    #[test]
    fn ranges_match_ordered_grouping((cell_count, cell_ids) in assignments()) {
        let hash = rebuilt(cell_count, &cell_ids);

        let mut groups: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for (particle, &cell) in cell_ids.iter().enumerate() {
            groups.entry(cell).or_default().push(particle as u32);
        }

        let mut cursor = 0;
        for cell in 0..cell_count as u32 {
            let range = hash.lookup()[cell as usize];
            match groups.get(&cell) {
                Some(members) => {
                    prop_assert_eq!(range, CellRange { offset: cursor, size: members.len() as i32 });
                    let start = range.offset as usize;
                    let end = start + range.size as usize;
                    prop_assert_eq!(&hash.permutation()[start..end], members.as_slice());
                    prop_assert_eq!(hash.cell_particles(cell), members.as_slice());
                    cursor += range.size;
                }
                None => {
                    prop_assert_eq!(range.size, 0);
                    prop_assert!(hash.cell_particles(cell).is_empty());
                }
            }
        }
    }

    #[test]
    fn rebuild_is_idempotent((cell_count, cell_ids) in assignments()) {
        let mut hash = rebuilt(cell_count, &cell_ids);
        let permutation = hash.permutation().to_vec();
        let lookup = hash.lookup().to_vec();

        hash.rebuild(&cell_ids);
        prop_assert_eq!(hash.permutation(), permutation.as_slice());
        prop_assert_eq!(hash.lookup(), lookup.as_slice());
    }
}

#[test]
fn skewed_occupancy() {
    let cell_count = 100_000;
    let cell_ids: Vec<u32> = (0..10_000u32)
        .map(|i| if i % 100 == 0 { 99_999 } else { 7 })
        .collect();
    let hash = rebuilt(cell_count, &cell_ids);

    assert_eq!(hash.lookup()[7], CellRange { offset: 0, size: 9_900 });
    assert_eq!(hash.lookup()[99_999], CellRange { offset: 9_900, size: 100 });
    let occupied = hash.lookup().iter().filter(|range| !range.is_empty()).count();
    assert_eq!(occupied, 2);
    assert!(hash.cell_particles(99_999).iter().all(|particle| particle % 100 == 0));
}
