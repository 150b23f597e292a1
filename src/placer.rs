//! The placement engine: first-fit-decreasing assignment of sections to
//! banked address space.
//!
//! Bundles the per-run state the reference implementation keeps at file
//! scope (`memory[type]`, `sections`, `nbSectionsToAssign`,
//! `unassignedSections[]` in `original_source/src/link/assign.c`) into one
//! [`PlacementEngine`]: one struct owning all configuration, one entry
//! point that consumes it.

use tracing::{debug, info, warn};

use crate::classify::classify_sections;
use crate::free_space::{FreeInterval, FreeSpaceMap};
use crate::region::{MemoryModel, Region};
use crate::script::{apply_script, ScriptDiagnostic, ScriptPlacement};
use crate::section::Section;

/// Why a section could not be placed, ordered from weakest to strongest
/// evidence, matching the reference's cascading diagnostic in
/// `placeSection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// No fully-fixed address is known, and no free space anywhere in the
    /// candidate bank(s) was large/aligned enough.
    NoSuitableSpace,
    /// The section's fixed `(bank, org)` would run past the end of the
    /// region's address window.
    PastEndOfRegion,
    /// The section's fixed `(bank, org)` overlaps an already-placed section.
    OverlapsSection {
        /// Name of the section it collides with.
        name: String,
    },
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuitableSpace => write!(f, "no suitable space"),
            Self::PastEndOfRegion => write!(f, "runs past the end of the region"),
            Self::OverlapsSection { name } => write!(f, "overlaps with section \"{name}\""),
        }
    }
}

/// Fatal placement failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaceError {
    /// Overlay mode was requested but not every section could be placed by
    /// its own fixed bank/address.
    #[error(
        "overlay mode requires every section to be fully fixed, but {unfixed_count} remained unfixed"
    )]
    OverlayRequiresFixedSections {
        /// How many sections had not been placed when the overlay
        /// precondition was checked.
        unfixed_count: usize,
    },
    /// A section could not be assigned a location.
    #[error("cannot place section \"{name}\" in {region}: {reason}")]
    Unplaceable {
        /// The section's name.
        name: String,
        /// The region it was targeting.
        region: Region,
        /// Why it could not be placed.
        reason: FailReason,
    },
}

/// One section's final resting place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub name: String,
    pub region: Region,
    pub bank: u32,
    pub org: u16,
}

/// The result of a successful [`PlacementEngine::assign_sections`] run.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    /// Placed sections, in the order the engine assigned them.
    pub placements: Vec<Placement>,
    /// All sections, with `bank`/`org` updated to their final placement,
    /// handed to [`crate::report`] for map/symbol file generation.
    pub sections: Vec<Section>,
    /// Non-fatal diagnostics accumulated while applying the linker script.
    pub diagnostics: Vec<ScriptDiagnostic>,
}

/// Owns every piece of mutable state one placement run needs.
pub struct PlacementEngine {
    model: MemoryModel,
    free_space: FreeSpaceMap,
    sections: Vec<Section>,
    placed: Vec<usize>,
}

impl PlacementEngine {
    /// Starts a new run over `sections`, with every bank of `model` free.
    #[must_use]
    pub fn new(model: MemoryModel, sections: Vec<Section>) -> Self {
        let free_space = FreeSpaceMap::new(&model);
        Self {
            model,
            free_space,
            sections,
            placed: Vec::new(),
        }
    }

    /// Applies `script`, classifies, and places every section.
    ///
    /// Places the fully-fixed bucket (`BANK | ORG`) first and checks the
    /// overlay precondition immediately afterward, then proceeds through
    /// the remaining buckets from most to least constrained (§4.4/§4.5 of
    /// the engine's specification).
    ///
    /// # Errors
    ///
    /// Returns [`PlaceError::OverlayRequiresFixedSections`] if `overlay` is
    /// set and any section remains unplaced after the fully-fixed bucket, or
    /// [`PlaceError::Unplaceable`] the first time a section cannot be
    /// assigned a location.
    pub fn assign_sections(
        mut self,
        script: &[ScriptPlacement],
        overlay: bool,
    ) -> Result<PlacementOutcome, PlaceError> {
        let diagnostics = apply_script(&mut self.sections, script);
        info!(count = self.sections.len(), "classifying sections for placement");

        let order: Vec<(u8, Vec<usize>)> = {
            let buckets = classify_sections(&self.sections);
            buckets
                .in_placement_order()
                .map(|(mask, ids)| (mask, ids.to_vec()))
                .collect()
        };

        for (mask, ids) in order {
            debug!(mask, count = ids.len(), "placing bucket");
            for id in ids {
                self.place_one(id)?;
            }
            if mask == 6 && overlay {
                let unfixed_count = self.sections.len() - self.placed.len();
                if unfixed_count > 0 {
                    warn!(unfixed_count, "overlay requested with unfixed sections remaining");
                    return Err(PlaceError::OverlayRequiresFixedSections { unfixed_count });
                }
            }
        }

        let placements = self
            .placed
            .iter()
            .map(|&id| {
                let s = &self.sections[id];
                Placement {
                    name: s.name.clone(),
                    region: s.region,
                    bank: s.bank,
                    org: s.org,
                }
            })
            .collect();

        Ok(PlacementOutcome {
            placements,
            sections: self.sections,
            diagnostics,
        })
    }

    fn place_one(&mut self, id: usize) -> Result<(), PlaceError> {
        let region = self.sections[id].region;
        let size = self.sections[id].size;

        if size == 0 {
            let org = if self.sections[id].is_address_fixed {
                self.sections[id].org
            } else {
                self.model.start_addr(region)
            };
            let bank = if self.sections[id].is_bank_fixed {
                self.sections[id].bank
            } else {
                self.model.bank_range(region).0
            };
            self.sections[id].org = org;
            self.sections[id].bank = bank;
            self.sections[id].is_address_fixed = true;
            self.sections[id].is_bank_fixed = true;
            self.placed.push(id);
            return Ok(());
        }

        match self.get_placement(id) {
            Some((bank, addr)) => {
                self.free_space.carve(bank, addr, size);
                self.sections[id].bank = bank;
                self.sections[id].org = addr;
                self.sections[id].is_bank_fixed = true;
                self.sections[id].is_address_fixed = true;
                self.placed.push(id);
                Ok(())
            }
            None => {
                let reason = self.diagnose_failure(id);
                let name = self.sections[id].name.clone();
                warn!(section = %name, %region, %reason, "section could not be placed");
                Err(PlaceError::Unplaceable { name, region, reason })
            }
        }
    }

    /// First-fit-decreasing search for a `(bank, address)` this section
    /// fits into, scanning banks from its fixed bank (or the region's
    /// first) upward, and within each bank its free intervals in address
    /// order.
    fn get_placement(&self, id: usize) -> Option<(u32, u16)> {
        let s = &self.sections[id];
        let (region_lo, region_hi) = self.model.bank_range(s.region);
        let mut bank = if s.is_bank_fixed { s.bank } else { region_lo };

        loop {
            let intervals: Vec<FreeInterval> = self.free_space.iter(bank).collect();
            if !intervals.is_empty() {
                let mut idx = 0usize;
                let mut addr = intervals[idx].start;

                while idx < intervals.len() {
                    let space = intervals[idx];
                    if Self::is_suitable(s, space, addr) {
                        return Some((bank, addr));
                    }

                    if s.is_address_fixed {
                        if addr < s.org {
                            addr = s.org;
                        } else {
                            idx = intervals.len();
                            break;
                        }
                    } else if s.is_align_fixed {
                        let mask = u32::from(s.align_mask);
                        let offset = u32::from(s.align_offset);
                        let a = u32::from(addr);
                        let next = ((a.wrapping_sub(offset)) & !mask) + mask + 1 + offset;
                        if next > 0xFFFF {
                            idx = intervals.len();
                            break;
                        }
                        addr = next as u16;
                    } else {
                        idx += 1;
                        if idx < intervals.len() {
                            addr = intervals[idx].start;
                        } else {
                            break;
                        }
                    }

                    while idx < intervals.len() && intervals[idx].end <= addr {
                        idx += 1;
                    }
                    if idx < intervals.len() && addr < intervals[idx].start {
                        addr = intervals[idx].start;
                    }
                }
            }

            if s.is_bank_fixed {
                return None;
            }
            bank += 1;
            if bank > region_hi {
                return None;
            }
        }
    }

    fn is_suitable(s: &Section, space: FreeInterval, addr: u16) -> bool {
        if s.is_address_fixed && addr != s.org {
            return false;
        }
        if s.is_align_fixed {
            let mask = u32::from(s.align_mask);
            let offset = u32::from(s.align_offset);
            if (u32::from(addr).wrapping_sub(offset)) & mask != 0 {
                return false;
            }
        }
        if addr < space.start {
            return false;
        }
        u32::from(addr) + u32::from(s.size) <= u32::from(space.end)
    }

    /// Picks the strongest diagnosable cause for `id`'s placement failure.
    fn diagnose_failure(&self, id: usize) -> FailReason {
        let s = &self.sections[id];
        if !s.is_bank_fixed || !s.is_address_fixed {
            return FailReason::NoSuitableSpace;
        }
        let region_end = u32::from(self.model.end_addr(s.region)) + 1;
        if u32::from(s.org) + u32::from(s.size) > region_end {
            return FailReason::PastEndOfRegion;
        }
        self.placed
            .iter()
            .map(|&pid| &self.sections[pid])
            .find(|p| p.region == s.region && p.bank == s.bank && ranges_overlap(p.org, p.size, s.org, s.size))
            .map_or(FailReason::NoSuitableSpace, |p| FailReason::OverlapsSection {
                name: p.name.clone(),
            })
    }
}

fn ranges_overlap(a_start: u16, a_size: u16, b_start: u16, b_size: u16) -> bool {
    let a_end = u32::from(a_start) + u32::from(a_size);
    let b_end = u32::from(b_start) + u32::from(b_size);
    u32::from(a_start) < b_end && u32::from(b_start) < a_end
}
