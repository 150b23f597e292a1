//! Section placement for a banked 8-bit linker.
//!
//! This crate assigns each relocatable [`section::Section`] in a program to
//! a concrete `(bank, address)` pair inside a banked, 16-bit address space
//! modeled by [`region::MemoryModel`] (the kind of partitioned memory map a
//! Game Boy cartridge exposes: a fixed home ROM bank, switchable ROM/WRAM
//! banks, and a handful of singleton regions (VRAM, OAM, HRAM, SRAM)).
//!
//! The crate does not parse object files, resolve symbols, or patch
//! relocations; it consumes an already-parsed section list and a memory
//! model, and emits placements plus a placement report. See
//! [`placer::PlacementEngine`] for the entry point.
//!
//! # Getting started
//!
//! Build a [`region::MemoryModel`] (or use one of the [`region::presets`]),
//! describe your sections, and hand both to a [`placer::PlacementEngine`]:
//!
//! ```
//! use bankld::placer::PlacementEngine;
//! use bankld::region::{presets, Region};
//! use bankld::section::Section;
//!
//! let model = presets::game_boy(/* romx banks */ 4, /* sram banks */ 1);
//! let sections = vec![
//!     Section::new("Header", Region::Rom0, 0x150).with_address(0x0000),
//!     Section::new("Main", Region::RomX, 0x3000),
//!     Section::new("Stack", Region::Wram0, 0x100),
//! ];
//!
//! let engine = PlacementEngine::new(model, sections);
//! let outcome = engine.assign_sections(&[], /* overlay */ false)?;
//! for placement in &outcome.placements {
//!     println!("{} -> bank {} at ${:04X}", placement.name, placement.bank, placement.org);
//! }
//! # Ok::<(), bankld::placer::PlaceError>(())
//! ```
//!
//! # Linker scripts
//!
//! A build may pin specific sections to specific banks/addresses from
//! outside the object files, overriding whatever constraints the section
//! itself carries. Pass a slice of [`script::ScriptPlacement`] records to
//! [`placer::PlacementEngine::assign_sections`]; any contradictions between
//! the script and a section's own constraints are collected as
//! non-fatal [`script::ScriptDiagnostic`]s rather than aborting the run.
//!
//! # Reports
//!
//! Once placement succeeds, [`report::write_map_file`] and
//! [`report::write_symbol_file`] emit the reference linker's map/symbol file
//! formats to any [`std::io::Write`] destination.
//!
//! # Character maps
//!
//! [`charmap::Charmap`] is a standalone, assembly-time concern unrelated to
//! placement: a longest-match input-byte-sequence to output-byte
//! translation table, used to transliterate source text into a section's
//! payload bytes before it ever reaches the placer.
//!
//! # Feature overview
//!
//! - [`region`], the target's static memory model (C1).
//! - [`free_space`], per-bank free-interval bookkeeping (C2).
//! - [`script`], linker-script constraint overrides (C3).
//! - [`classify`], constraint-priority bucketing (C4).
//! - [`placer`], the first-fit-decreasing placement engine (C5).
//! - [`charmap`], character-map string translation (C6).
//! - [`report`], map/symbol file emission (C7).

#![warn(missing_docs)]
#![warn(clippy::wildcard_enum_match_arm)]

pub mod charmap;
pub mod classify;
pub mod free_space;
pub mod placer;
pub mod region;
pub mod report;
pub mod script;
pub mod section;

pub use charmap::{Charmap, CharmapError};
pub use placer::{FailReason, PlaceError, Placement, PlacementEngine, PlacementOutcome};
pub use region::{MemoryModel, MemoryModelError, Region, RegionLayout};
pub use script::{apply_script, ScriptDiagnostic, ScriptPlacement};
pub use section::{ConstraintMask, Section, Symbol};
