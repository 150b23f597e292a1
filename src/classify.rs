//! Buckets sections by constraint mask and places the most-constrained
//! first, tie-broken by decreasing size.
//!
//! Grounded on `original_source/src/link/assign.c`'s `categorizeSection` and
//! the placement order `assign_AssignSections` drives: bucket 6
//! (`BANK | ORG`, both bank and address fixed) is placed first and checked
//! against the overlay precondition, then the remaining buckets follow in
//! decreasing order down to 0. Buckets 3 and 7 are unreachable since `ORG`
//! and `ALIGN` never coexist in [`crate::section::ConstraintMask`].

use crate::section::ConstraintMask;
use crate::section::Section;

/// Index into a section list, used instead of references so the classifier
/// doesn't need to borrow the section slice for as long as the buckets live.
pub type SectionId = usize;

/// Sections grouped by [`Section::constraint_mask`], each group sorted by
/// decreasing size.
///
/// Index `i` holds the sections whose mask equals `i`; index 6 (fully
/// bank+address fixed) is placed first by [`crate::placer`], then the rest
/// follow from 5 down to 0 (7 and 3 are always empty).
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    groups: [Vec<SectionId>; ConstraintMask::BUCKET_COUNT],
}

impl Buckets {
    /// The sections in bucket `mask`, in placement order (largest first).
    #[must_use]
    pub fn bucket(&self, mask: u8) -> &[SectionId] {
        &self.groups[mask as usize]
    }

    /// Iterates buckets in the order the reference placer visits them:
    /// fully fixed (6) first, then 7, then 5 down to 0.
    pub fn in_placement_order(&self) -> impl Iterator<Item = (u8, &[SectionId])> {
        std::iter::once(6u8)
            .chain((0..=7u8).rev().filter(|&m| m != 6))
            .map(|mask| (mask, self.bucket(mask)))
    }
}

/// Classifies every section in `sections` by its constraint mask, sorting
/// each bucket by decreasing size to get first-fit-decreasing behavior once
/// [`crate::placer`] walks the buckets.
#[must_use]
pub fn classify_sections(sections: &[Section]) -> Buckets {
    let mut buckets = Buckets::default();
    for (id, section) in sections.iter().enumerate() {
        buckets.groups[section.constraint_mask() as usize].push(id);
    }
    for group in &mut buckets.groups {
        group.sort_by_key(|&id| std::cmp::Reverse(sections[id].size));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;

    #[test]
    fn groups_by_mask_and_sorts_by_size_descending() {
        let sections = vec![
            Section::new("small", Region::RomX, 4),
            Section::new("big", Region::RomX, 100).with_bank(1),
            Section::new("mid", Region::RomX, 50).with_bank(1),
        ];
        let buckets = classify_sections(&sections);
        assert_eq!(buckets.bucket(ConstraintMask::BANK), &[1, 2]);
        assert_eq!(buckets.bucket(0), &[0]);
    }

    #[test]
    fn buckets_3_and_7_unreachable_via_public_api() {
        let sections = vec![Section::new("a", Region::RomX, 1).with_bank(1).with_address(0x4000)];
        let buckets = classify_sections(&sections);
        assert_eq!(buckets.bucket(ConstraintMask::BANK | ConstraintMask::ORG), &[0]);
        assert!(buckets.bucket(3).is_empty());
        assert!(buckets.bucket(7).is_empty());
    }

    #[test]
    fn placement_order_starts_fully_fixed() {
        let sections = vec![Section::new("a", Region::RomX, 1)];
        let buckets = classify_sections(&sections);
        let order: Vec<u8> = buckets.in_placement_order().map(|(m, _)| m).collect();
        assert_eq!(order, vec![6, 7, 5, 4, 3, 2, 1, 0]);
    }
}
