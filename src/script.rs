//! Linker-script overrides.
//!
//! A build may pin a handful of sections to specific banks/addresses from
//! outside the object files themselves; the reference linker reads these
//! from a `.link` script (`original_source/src/link/assign.c`,
//! `processLinkerScript`). This module models the same step as data: a
//! caller hands [`apply_script`] an iterator of [`ScriptPlacement`] records
//! and the section list to rewrite in place.

use tracing::warn;

use crate::section::Section;

/// One linker-script directive: pin `section` to `bank` and, optionally, to
/// `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPlacement {
    pub section: String,
    pub bank: u32,
    pub address: Option<u16>,
}

impl ScriptPlacement {
    /// Pins `section` to `bank` without constraining its address.
    #[must_use]
    pub fn bank_only(section: impl Into<String>, bank: u32) -> Self {
        Self {
            section: section.into(),
            bank,
            address: None,
        }
    }

    /// Pins `section` to `bank` at a fixed `address`.
    #[must_use]
    pub fn fixed(section: impl Into<String>, bank: u32, address: u16) -> Self {
        Self {
            section: section.into(),
            bank,
            address: Some(address),
        }
    }
}

/// A non-fatal problem found while applying script placements.
///
/// Unlike [`crate::placer::PlaceError`], these never abort the link; the
/// reference implementation reports them as warnings and keeps going
/// (`processLinkerScript` logs and continues rather than calling `fatalerror`
/// for an unknown or re-specified section).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptDiagnostic {
    /// The script names a section that isn't in the object list.
    UnknownSection { name: String },
    /// The script places a section in a different bank than the object file
    /// already fixed it to. The script's value wins regardless; this
    /// diagnostic only records that the two disagreed.
    BankContradiction { name: String, script_bank: u32, object_bank: u32 },
    /// The script places a section at a different address than the object
    /// file already fixed it to. The script's value wins regardless.
    AddressContradiction { name: String, script_org: u16, object_org: u16 },
    /// The script's address does not satisfy a section's pre-existing
    /// alignment constraint. The script's value wins regardless.
    AlignContradiction { name: String, script_org: u16, align_mask: u16, align_offset: u16 },
}

impl std::fmt::Display for ScriptDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSection { name } => {
                write!(f, "linker script places unknown section \"{name}\"")
            }
            Self::BankContradiction { name, script_bank, object_bank } => {
                write!(
                    f,
                    "linker script places \"{name}\" in bank {script_bank}, but it is already fixed to bank {object_bank}"
                )
            }
            Self::AddressContradiction { name, script_org, object_org } => {
                write!(
                    f,
                    "linker script places \"{name}\" at ${script_org:04X}, but it is already fixed at ${object_org:04X}"
                )
            }
            Self::AlignContradiction { name, script_org, align_mask, align_offset } => {
                write!(
                    f,
                    "linker script places \"{name}\" at ${script_org:04X}, which does not satisfy its alignment (mask ${align_mask:04X}, offset ${align_offset:04X})"
                )
            }
        }
    }
}

/// Applies every `placement` to the matching section in `sections`,
/// returning one diagnostic per record that could not be honored as-is.
///
/// Matches are by section name, a linear scan exactly as the reference
/// implementation does (`processLinkerScript`'s `sect_GetSection` lookup).
pub fn apply_script<'a>(
    sections: &mut [Section],
    placements: impl IntoIterator<Item = &'a ScriptPlacement>,
) -> Vec<ScriptDiagnostic> {
    let mut diagnostics = Vec::new();

    for placement in placements {
        let Some(section) = sections.iter_mut().find(|s| s.name == placement.section) else {
            warn!(section = %placement.section, "linker script places unknown section");
            diagnostics.push(ScriptDiagnostic::UnknownSection {
                name: placement.section.clone(),
            });
            continue;
        };

        // Contradictions are reported but do not stop the script from
        // winning: the script's placement is applied unconditionally below,
        // the same way the reference implementation logs and keeps going.
        if section.is_bank_fixed && section.bank != placement.bank {
            warn!(
                section = %section.name,
                script_bank = placement.bank,
                object_bank = section.bank,
                "linker script contradicts object file's bank"
            );
            diagnostics.push(ScriptDiagnostic::BankContradiction {
                name: section.name.clone(),
                script_bank: placement.bank,
                object_bank: section.bank,
            });
        }

        if let Some(address) = placement.address {
            if section.is_address_fixed && section.org != address {
                warn!(
                    section = %section.name,
                    script_org = address,
                    object_org = section.org,
                    "linker script contradicts object file's address"
                );
                diagnostics.push(ScriptDiagnostic::AddressContradiction {
                    name: section.name.clone(),
                    script_org: address,
                    object_org: section.org,
                });
            } else if section.is_align_fixed
                && (address.wrapping_sub(section.align_offset) & section.align_mask) != 0
            {
                warn!(
                    section = %section.name,
                    script_org = address,
                    "linker script address does not satisfy section's alignment"
                );
                diagnostics.push(ScriptDiagnostic::AlignContradiction {
                    name: section.name.clone(),
                    script_org: address,
                    align_mask: section.align_mask,
                    align_offset: section.align_offset,
                });
            }
        }

        section.is_bank_fixed = true;
        section.bank = placement.bank;

        if let Some(address) = placement.address {
            section.is_address_fixed = true;
            section.org = address;
            section.is_align_fixed = false;
        }
    }

    diagnostics
}
