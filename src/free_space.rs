//! Free-space bookkeeping per `(region, bank)`.
//!
//! The reference linker threads an intrusive doubly-linked list of
//! `struct FreeSpace` nodes through each bank, with a sentinel node marking
//! end-of-list (`original_source/src/link/assign.c`, `initFreeSpace` and the
//! split logic in `placeSection`). This module keeps the same per-bank,
//! address-ordered-interval model but stores it as a plain `Vec`, so there is
//! no unsafe code and no sentinel to special-case.

use crate::region::{MemoryModel, Region};

/// A maximal run of unplaced bytes `[start, end)` within one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeInterval {
    pub start: u16,
    pub end: u16,
}

impl FreeInterval {
    fn len(self) -> u32 {
        u32::from(self.end) - u32::from(self.start)
    }
}

/// Tracks, for every bank of every region in a [`MemoryModel`], the set of
/// address ranges not yet claimed by a placed section.
#[derive(Debug, Clone)]
pub struct FreeSpaceMap {
    // Indexed by global bank index (see `MemoryModel::region_of`).
    banks: Vec<Vec<FreeInterval>>,
}

impl FreeSpaceMap {
    /// Builds a free-space map with every bank in `model` fully free.
    #[must_use]
    pub fn new(model: &MemoryModel) -> Self {
        let mut banks = Vec::new();
        for region in Region::ALL {
            let (lo, hi) = model.bank_range(region);
            for _ in lo..=hi {
                banks.push(vec![FreeInterval {
                    start: model.start_addr(region),
                    end: model.start_addr(region) + model.max_size(region),
                }]);
            }
        }
        Self { banks }
    }

    fn intervals(&self, bank_index: u32) -> &[FreeInterval] {
        &self.banks[bank_index as usize]
    }

    fn intervals_mut(&mut self, bank_index: u32) -> &mut Vec<FreeInterval> {
        &mut self.banks[bank_index as usize]
    }

    /// The first (lowest-addressed) free interval in `bank_index`, if any.
    #[must_use]
    pub fn first(&self, bank_index: u32) -> Option<FreeInterval> {
        self.intervals(bank_index).first().copied()
    }

    /// Every free interval in `bank_index`, in ascending address order.
    pub fn iter(&self, bank_index: u32) -> impl Iterator<Item = FreeInterval> + '_ {
        self.intervals(bank_index).iter().copied()
    }

    /// Total bytes still free across every bank of `bank_index`'s region.
    #[must_use]
    pub fn total_free(&self, bank_index: u32) -> u32 {
        self.intervals(bank_index).iter().map(|iv| iv.len()).sum()
    }

    /// Finds the free interval in `bank_index` that contains
    /// `[start, start + size)`, if the whole range lies within one free
    /// interval.
    #[must_use]
    pub fn containing(&self, bank_index: u32, start: u16, size: u16) -> Option<FreeInterval> {
        let end = start.checked_add(size)?;
        self.intervals(bank_index)
            .iter()
            .copied()
            .find(|iv| iv.start <= start && end <= iv.end)
    }

    /// Removes `[start, start + size)` from the free space of `bank_index`.
    ///
    /// Mirrors `placeSection`'s four cases: the claimed range may consume an
    /// entire free interval, leave a right-hand remainder (claim from the
    /// left edge), leave a left-hand remainder (claim from the right edge),
    /// or split one free interval into two.
    ///
    /// # Panics
    ///
    /// Panics if `[start, start + size)` is not fully contained in a single
    /// free interval of `bank_index`; callers must check with
    /// [`Self::containing`] (or `is_location_suitable` in
    /// [`crate::placer`]) first.
    pub fn carve(&mut self, bank_index: u32, start: u16, size: u16) {
        if size == 0 {
            return;
        }
        let end = start + size;
        let intervals = self.intervals_mut(bank_index);
        let idx = intervals
            .iter()
            .position(|iv| iv.start <= start && end <= iv.end)
            .expect("carve range must lie within a single free interval");
        let iv = intervals[idx];

        match (iv.start == start, end == iv.end) {
            (true, true) => {
                intervals.remove(idx);
            }
            (true, false) => {
                intervals[idx].start = end;
            }
            (false, true) => {
                intervals[idx].end = start;
            }
            (false, false) => {
                intervals[idx].end = start;
                intervals.insert(idx + 1, FreeInterval { start: end, end: iv.end });
            }
        }
    }
}
