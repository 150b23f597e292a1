//! The target machine's partitioned address spaces.
//!
//! A [`MemoryModel`] is a static, immutable description of every region a
//! section can be placed into: its start address, the size of one bank, and
//! the range of global bank indices that belong to it. It answers pure
//! queries only; all mutable placement state lives in
//! [`crate::free_space::FreeSpaceMap`] and [`crate::placer::PlacementEngine`].

use std::fmt;

/// A family of banks sharing a start address and a per-bank size.
///
/// Declaration order is significant: the placer iterates regions in this
/// order to keep assignment deterministic, and it matches the reference
/// linker's `enum SectionType`.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Fixed home bank, always mapped at `$0000`.
    Rom0,
    /// Switchable ROM banks, mapped at `$4000`.
    RomX,
    /// Fixed work RAM bank, always mapped at `$C000`.
    Wram0,
    /// Switchable work RAM banks (CGB), mapped at `$D000`.
    WramX,
    /// Video RAM, mapped at `$8000`.
    Vram,
    /// Object attribute memory, mapped at `$FE00`.
    Oam,
    /// High RAM / zero page, mapped at `$FF80`.
    Hram,
    /// Switchable cartridge RAM, mapped at `$A000`.
    Sram,
}

impl Region {
    /// All regions, in the declaration/iteration order the placer relies on.
    pub const ALL: [Region; 8] = [
        Region::Rom0,
        Region::RomX,
        Region::Wram0,
        Region::WramX,
        Region::Vram,
        Region::Oam,
        Region::Hram,
        Region::Sram,
    ];

    /// The label this region uses for local bank 0 in map files, e.g.
    /// `"ROM Bank #0 (HOME)"` for [`Region::Rom0`].
    #[must_use]
    pub const fn bank_zero_label(self) -> &'static str {
        match self {
            Region::Rom0 => "ROM Bank #0 (HOME)",
            Region::RomX => "ROM Bank #1",
            Region::Wram0 => "WRAM Bank #0",
            Region::WramX => "WRAM Bank #1",
            Region::Vram => "VRAM Bank #0",
            Region::Oam => "OAM",
            Region::Hram => "HRAM",
            Region::Sram => "SRAM Bank #0",
        }
    }

    /// Whether this region's map-file label carries a bank number at all
    /// (`OAM` and `HRAM` are always singular, unnumbered banks).
    #[must_use]
    pub const fn is_unnumbered(self) -> bool {
        matches!(self, Region::Oam | Region::Hram)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Rom0 => "ROM0",
            Region::RomX => "ROMX",
            Region::Wram0 => "WRAM0",
            Region::WramX => "WRAMX",
            Region::Vram => "VRAM",
            Region::Oam => "OAM",
            Region::Hram => "HRAM",
            Region::Sram => "SRAM",
        };
        f.write_str(name)
    }
}

/// Per-region static layout: where its one-bank address window starts, how
/// large one bank is, and how many banks exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionLayout {
    /// First address of the region's address window, shared by every bank.
    pub start_address: u16,
    /// Number of bytes available in a single bank of this region.
    pub max_size: u16,
    /// How many banks this region has. Must be at least 1.
    pub bank_count: u32,
}

/// Errors that can occur constructing a [`MemoryModel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryModelError {
    /// A region was configured with zero banks.
    #[error("region {region} must have at least one bank")]
    ZeroBanks {
        /// The misconfigured region.
        region: Region,
    },
    /// A region's bank size is zero, which can never hold a non-zero-size
    /// section.
    #[error("region {region} must have a non-zero bank size")]
    ZeroSize {
        /// The misconfigured region.
        region: Region,
    },
    /// A region's address window would reach or wrap past the top of
    /// 16-bit address space. The window's exclusive end (`start + size`)
    /// must fit in a `u16`, so a region may use at most through address
    /// `0xFFFE`; `end_addr` and `FreeSpaceMap`'s intervals both store that
    /// exclusive end natively in a `u16` and cannot represent `0x10000`.
    #[error(
        "region {region} window {start:#06x}+{size:#x} reaches or overflows 16-bit address space"
    )]
    WindowOverflow {
        /// The misconfigured region.
        region: Region,
        /// The region's configured start address.
        start: u16,
        /// The region's configured bank size.
        size: u16,
    },
}

/// Static description of the target's partitioned address spaces.
///
/// Bank indices are contiguous within a region and globally unique: "bank 0
/// of WRAMX" and "bank 0 of ROMX" are distinct global indices. Regions are
/// assigned index ranges in [`Region::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryModel {
    layouts: [RegionLayout; 8],
    /// First global bank index for each region, parallel to `layouts`.
    bank_base: [u32; 8],
}

impl MemoryModel {
    /// Builds a memory model from an explicit per-region layout table.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryModelError`] if any region has zero banks, zero bank
    /// size, or an address window that overflows 16-bit address space.
    pub fn new(table: impl Fn(Region) -> RegionLayout) -> Result<Self, MemoryModelError> {
        let mut layouts = [RegionLayout {
            start_address: 0,
            max_size: 0,
            bank_count: 0,
        }; 8];
        let mut bank_base = [0u32; 8];
        let mut next_bank = 0u32;

        for (i, region) in Region::ALL.iter().enumerate() {
            let layout = table(*region);
            if layout.bank_count == 0 {
                return Err(MemoryModelError::ZeroBanks { region: *region });
            }
            if layout.max_size == 0 {
                return Err(MemoryModelError::ZeroSize { region: *region });
            }
            let end = u32::from(layout.start_address) + u32::from(layout.max_size);
            if end >= 0x1_0000 {
                return Err(MemoryModelError::WindowOverflow {
                    region: *region,
                    start: layout.start_address,
                    size: layout.max_size,
                });
            }
            layouts[i] = layout;
            bank_base[i] = next_bank;
            next_bank += layout.bank_count;
        }

        Ok(Self { layouts, bank_base })
    }

    fn index_of(region: Region) -> usize {
        Region::ALL.iter().position(|r| *r == region).expect("Region::ALL is exhaustive")
    }

    fn layout(&self, region: Region) -> &RegionLayout {
        &self.layouts[Self::index_of(region)]
    }

    /// The first address of `region`'s address window (shared by all its
    /// banks).
    #[must_use]
    pub fn start_addr(&self, region: Region) -> u16 {
        self.layout(region).start_address
    }

    /// The number of bytes available in one bank of `region`.
    #[must_use]
    pub fn max_size(&self, region: Region) -> u16 {
        self.layout(region).max_size
    }

    /// The last valid address of `region`'s address window.
    #[must_use]
    pub fn end_addr(&self, region: Region) -> u16 {
        self.start_addr(region) + self.max_size(region) - 1
    }

    /// The inclusive `[lo, hi]` global bank index range belonging to
    /// `region`.
    #[must_use]
    pub fn bank_range(&self, region: Region) -> (u32, u32) {
        let idx = Self::index_of(region);
        let lo = self.bank_base[idx];
        let hi = lo + self.layouts[idx].bank_count - 1;
        (lo, hi)
    }

    /// How many banks `region` has.
    #[must_use]
    pub fn nb_banks(&self, region: Region) -> u32 {
        self.layout(region).bank_count
    }

    /// Resolves a global bank index back to its region and 0-based local
    /// bank number within that region, or `None` if the index names no bank.
    #[must_use]
    pub fn region_of(&self, bank_index: u32) -> Option<(Region, u32)> {
        for (i, region) in Region::ALL.iter().enumerate() {
            let (lo, hi) = self.bank_range(*region);
            if bank_index >= lo && bank_index <= hi {
                return Some((*region, bank_index - lo));
            }
        }
        None
    }

    /// Produces the map-file bank header label for a global bank index, e.g.
    /// `"ROM Bank #3"` or `"HRAM"`.
    #[must_use]
    pub fn bank_label(&self, bank_index: u32) -> Option<String> {
        let (region, local) = self.region_of(bank_index)?;
        Some(if region.is_unnumbered() {
            region.bank_zero_label().to_string()
        } else if local == 0 {
            region.bank_zero_label().to_string()
        } else {
            // "ROM Bank #1" + local offset, recomputed for local > 0.
            let base = region.bank_zero_label();
            let stripped = base.trim_end_matches(|c: char| c.is_ascii_digit());
            let base_num: u32 = base[stripped.len()..].parse().unwrap_or(0);
            format!("{stripped}{}", base_num + local)
        })
    }
}

/// Ready-made [`MemoryModel`]s for well-known targets.
pub mod presets {
    use super::{MemoryModel, Region, RegionLayout};

    /// The classic Game Boy / Game Boy Color address map: ROM0 at `$0000`,
    /// switchable ROM banks at `$4000`, VRAM at `$8000`, switchable SRAM at
    /// `$A000`, fixed WRAM at `$C000`, switchable WRAM banks at `$D000`
    /// (CGB), OAM at `$FE00`, and HRAM at `$FF80`.
    ///
    /// `romx_banks` and `sram_banks` are parameterized since they depend on
    /// the cartridge's mapper and are not architectural constants.
    #[must_use]
    pub fn game_boy(romx_banks: u32, sram_banks: u32) -> MemoryModel {
        MemoryModel::new(|region| match region {
            Region::Rom0 => RegionLayout {
                start_address: 0x0000,
                max_size: 0x4000,
                bank_count: 1,
            },
            Region::RomX => RegionLayout {
                start_address: 0x4000,
                max_size: 0x4000,
                bank_count: romx_banks.max(1),
            },
            Region::Vram => RegionLayout {
                start_address: 0x8000,
                max_size: 0x2000,
                bank_count: 2,
            },
            Region::Sram => RegionLayout {
                start_address: 0xA000,
                max_size: 0x2000,
                bank_count: sram_banks.max(1),
            },
            Region::Wram0 => RegionLayout {
                start_address: 0xC000,
                max_size: 0x1000,
                bank_count: 1,
            },
            Region::WramX => RegionLayout {
                start_address: 0xD000,
                max_size: 0x1000,
                bank_count: 7,
            },
            Region::Oam => RegionLayout {
                start_address: 0xFE00,
                max_size: 0xA0,
                bank_count: 1,
            },
            Region::Hram => RegionLayout {
                start_address: 0xFF80,
                max_size: 0x7F,
                bank_count: 1,
            },
        })
        .expect("built-in Game Boy layout is always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_boy_preset_ranges() {
        let mem = presets::game_boy(4, 4);
        assert_eq!(mem.start_addr(Region::Rom0), 0x0000);
        assert_eq!(mem.end_addr(Region::Rom0), 0x3FFF);
        assert_eq!(mem.start_addr(Region::RomX), 0x4000);
        assert_eq!(mem.end_addr(Region::RomX), 0x7FFF);
        assert_eq!(mem.bank_range(Region::RomX), (1, 4));
        assert_eq!(mem.nb_banks(Region::RomX), 4);
    }

    #[test]
    fn bank_indices_are_globally_unique_and_contiguous() {
        let mem = presets::game_boy(2, 2);
        let mut seen = std::collections::HashSet::new();
        for region in Region::ALL {
            let (lo, hi) = mem.bank_range(region);
            for bank in lo..=hi {
                assert!(seen.insert(bank), "bank {bank} claimed by two regions");
                assert_eq!(mem.region_of(bank), Some((region, bank - lo)));
            }
        }
    }

    #[test]
    fn region_of_rejects_out_of_range_bank() {
        let mem = presets::game_boy(2, 2);
        let total: u32 = Region::ALL.iter().map(|r| mem.nb_banks(*r)).sum();
        assert_eq!(mem.region_of(total), None);
    }

    #[test]
    fn rejects_zero_banks() {
        let err = MemoryModel::new(|region| {
            if region == Region::RomX {
                RegionLayout {
                    start_address: 0x4000,
                    max_size: 0x4000,
                    bank_count: 0,
                }
            } else {
                RegionLayout {
                    start_address: 0,
                    max_size: 1,
                    bank_count: 1,
                }
            }
        });
        assert_eq!(
            err,
            Err(MemoryModelError::ZeroBanks { region: Region::RomX })
        );
    }

    #[test]
    fn rejects_window_overflow() {
        let err = MemoryModel::new(|region| {
            if region == Region::Sram {
                RegionLayout {
                    start_address: 0xFF00,
                    max_size: 0x200,
                    bank_count: 1,
                }
            } else {
                RegionLayout {
                    start_address: 0,
                    max_size: 1,
                    bank_count: 1,
                }
            }
        });
        assert!(matches!(err, Err(MemoryModelError::WindowOverflow { .. })));
    }

    #[test]
    fn rejects_window_that_reaches_exactly_0x10000() {
        let err = MemoryModel::new(|region| {
            if region == Region::Wram0 {
                RegionLayout {
                    start_address: 0xC000,
                    max_size: 0x4000,
                    bank_count: 1,
                }
            } else {
                RegionLayout {
                    start_address: 0,
                    max_size: 1,
                    bank_count: 1,
                }
            }
        });
        assert!(matches!(err, Err(MemoryModelError::WindowOverflow { .. })));
    }

    #[test]
    fn bank_label_numbers_increase_with_local_bank() {
        let mem = presets::game_boy(3, 1);
        let (lo, _) = mem.bank_range(Region::RomX);
        assert_eq!(mem.bank_label(lo).as_deref(), Some("ROM Bank #1"));
        assert_eq!(mem.bank_label(lo + 1).as_deref(), Some("ROM Bank #2"));
        assert_eq!(mem.bank_label(lo + 2).as_deref(), Some("ROM Bank #3"));
    }
}
