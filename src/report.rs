//! Map file and symbol file emission.
//!
//! Grounded on `original_source/src/link/mapfile.c`'s `MapfileInitBank`,
//! `MapfileWriteSection`, and `MapfileCloseBank`. The reference holds two
//! `FILE*` handles opened once at link start; this port is generic over any
//! [`std::io::Write`] destination instead, so callers (and tests) can point
//! it at an in-memory buffer without touching the filesystem.

use std::io::{self, Write};

use crate::placer::PlacementOutcome;
use crate::region::MemoryModel;
use crate::section::Symbol;

/// Writes a map file to `out`: one header line per occupied bank, one
/// section line per section placed in that bank (in placement order), one
/// symbol line per exported symbol, and a closing `EMPTY`/`SLACK` line.
///
/// Matches the reference's line formats exactly: `"BANK LABEL:\n"`,
/// `"  SECTION: $ORG-$END ($SIZE bytes) [\"NAME\"]\n"` (or
/// `"  SECTION: $ORG ($0 bytes) [\"NAME\"]\n"` for empty sections),
/// `"           $ADDR = NAME\n"`, and either `"  EMPTY\n\n"` or
/// `"    SLACK: $XXXX bytes\n\n"`.
///
/// # Errors
///
/// Propagates any [`io::Error`] from writing to `out`.
pub fn write_map_file(out: &mut impl Write, model: &MemoryModel, outcome: &PlacementOutcome) -> io::Result<()> {
    for (bank, label) in banks_with_sections(model, outcome) {
        writeln!(out, "{label}:")?;

        let mut used = 0u32;
        for placement in outcome.placements.iter().filter(|p| p.bank == bank) {
            let section = outcome.sections.iter().find(|s| s.name == placement.name);
            let size = section.map_or(0, |s| s.size);
            if size > 0 {
                writeln!(
                    out,
                    "  SECTION: ${:04X}-${:04X} (${:04X} bytes) [\"{}\"]",
                    placement.org,
                    u32::from(placement.org) + u32::from(size) - 1,
                    size,
                    placement.name
                )?;
            } else {
                writeln!(out, "  SECTION: ${:04X} ($0 bytes) [\"{}\"]", placement.org, placement.name)?;
            }
            used += u32::from(size);

            if let Some(section) = section {
                for symbol in &section.symbols {
                    if is_reportable(symbol) {
                        writeln!(out, "           ${:04X} = {}", u32::from(placement.org) + u32::from(symbol.offset), symbol.name)?;
                    }
                }
            }
        }

        let region = model.region_of(bank).map_or(crate::region::Region::Rom0, |(region, _)| region);
        let max = u32::from(model.max_size(region));
        let slack = max.saturating_sub(used);
        if slack == max {
            writeln!(out, "  EMPTY\n")?;
        } else {
            writeln!(out, "    SLACK: ${slack:04X} bytes\n")?;
        }
    }
    Ok(())
}

/// Writes a symbol file to `out`: the reference's leading generated-by
/// comment, then one `"BB:AAAA NAME"` line per exported, non-`@` symbol.
///
/// # Errors
///
/// Propagates any [`io::Error`] from writing to `out`.
pub fn write_symbol_file(out: &mut impl Write, model: &MemoryModel, outcome: &PlacementOutcome, tool_name: &str) -> io::Result<()> {
    writeln!(out, "; File generated by {tool_name}\n")?;

    for placement in &outcome.placements {
        let Some(section) = outcome.sections.iter().find(|s| s.name == placement.name) else {
            continue;
        };
        let local_bank = model.region_of(placement.bank).map_or(0, |(_, local)| local);
        for symbol in &section.symbols {
            if is_reportable(symbol) {
                writeln!(out, "{local_bank:02X}:{:04X} {}", u32::from(placement.org) + u32::from(symbol.offset), symbol.name)?;
            }
        }
    }
    Ok(())
}

fn is_reportable(symbol: &Symbol) -> bool {
    !symbol.is_imported && symbol.name != Symbol::CURRENT
}

/// Every bank that has at least one placed section, in ascending global
/// bank index order, paired with its map-file header label.
fn banks_with_sections(model: &MemoryModel, outcome: &PlacementOutcome) -> Vec<(u32, String)> {
    let mut banks: Vec<u32> = outcome.placements.iter().map(|p| p.bank).collect();
    banks.sort_unstable();
    banks.dedup();
    banks
        .into_iter()
        .filter_map(|bank| model.bank_label(bank).map(|label| (bank, label)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placer::{PlacementEngine, PlacementOutcome};
    use crate::region::presets;
    use crate::section::Section;

    fn outcome_for(sections: Vec<Section>) -> (MemoryModel, PlacementOutcome) {
        let model = presets::game_boy(1, 1);
        let engine = PlacementEngine::new(model.clone(), sections);
        (model, engine.assign_sections(&[], false).unwrap())
    }

    #[test]
    fn empty_bank_reports_empty() {
        let (model, outcome) = outcome_for(vec![Section::new("A", crate::region::Region::Rom0, 0x100)]);
        let mut buf = Vec::new();
        write_map_file(&mut buf, &model, &outcome).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("ROM Bank #0 (HOME):"));
        assert!(text.contains("SECTION: $0000-$00FF ($0100 bytes) [\"A\"]"));
        assert!(text.contains("SLACK: $3F00 bytes"));
    }

    #[test]
    fn fully_used_bank_reports_zero_slack() {
        let (model, outcome) = outcome_for(vec![Section::new("A", crate::region::Region::Rom0, 0x4000)]);
        let mut buf = Vec::new();
        write_map_file(&mut buf, &model, &outcome).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("SLACK: $0000 bytes"));
    }

    #[test]
    fn bank_with_only_zero_size_sections_reports_empty() {
        let (model, outcome) = outcome_for(vec![Section::new("A", crate::region::Region::Rom0, 0)]);
        let mut buf = Vec::new();
        write_map_file(&mut buf, &model, &outcome).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("  EMPTY"));
    }

    #[test]
    fn symbols_skip_at_and_imports() {
        let section = Section::new("A", crate::region::Region::Rom0, 0x10)
            .with_symbol("Visible", 0x4)
            .with_symbol(Symbol::CURRENT, 0x0);
        let mut section = section;
        section.symbols.push(Symbol { name: "Hidden".into(), offset: 0x8, is_imported: true });

        let (model, outcome) = outcome_for(vec![section]);
        let mut map = Vec::new();
        write_map_file(&mut map, &model, &outcome).unwrap();
        let map_text = String::from_utf8(map).unwrap();
        assert!(map_text.contains("$0004 = Visible"));
        assert!(!map_text.contains("Hidden"));
        assert!(!map_text.contains("= @"));

        let mut sym = Vec::new();
        write_symbol_file(&mut sym, &model, &outcome, "bankld").unwrap();
        let sym_text = String::from_utf8(sym).unwrap();
        assert!(sym_text.starts_with("; File generated by bankld\n\n"));
        assert!(sym_text.contains("00:0004 Visible"));
    }
}
