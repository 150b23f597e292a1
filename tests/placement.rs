//! End-to-end placement scenarios, driving the engine through its public
//! API the way a linker front end would: build a memory model, describe
//! sections, optionally apply a script, then assign and inspect the report.

use bankld::placer::{FailReason, PlaceError, PlacementEngine};
use bankld::region::{presets, Region};
use bankld::report::{write_map_file, write_symbol_file};
use bankld::script::ScriptPlacement;
use bankld::section::Section;

#[test]
fn s1_first_fit_decreasing_places_larger_section_first() {
    let model = presets::game_boy(1, 1);
    let sections = vec![
        Section::new("A", Region::Rom0, 0x100),
        Section::new("B", Region::Rom0, 0x200),
    ];
    let outcome = PlacementEngine::new(model, sections).assign_sections(&[], false).unwrap();

    let a = outcome.placements.iter().find(|p| p.name == "A").unwrap();
    let b = outcome.placements.iter().find(|p| p.name == "B").unwrap();
    assert_eq!(b.org, 0x0000, "larger section B should claim the first slot");
    assert_eq!(a.org, 0x0200, "smaller section A follows B");
    assert_eq!(b.bank, 0);
    assert_eq!(a.bank, 0);
}

#[test]
fn s2_fixed_section_does_not_block_free_section_placed_before_it() {
    let model = presets::game_boy(1, 1);
    let sections = vec![
        Section::new("F", Region::Rom0, 0x100).with_bank(0).with_address(0x1000),
        Section::new("G", Region::Rom0, 0x100),
    ];
    let outcome = PlacementEngine::new(model, sections).assign_sections(&[], false).unwrap();

    let f = outcome.placements.iter().find(|p| p.name == "F").unwrap();
    let g = outcome.placements.iter().find(|p| p.name == "G").unwrap();
    assert_eq!(f.org, 0x1000);
    assert_eq!(g.org, 0x0000);
}

#[test]
fn s3_alignment_constraint_is_satisfied() {
    let model = presets::game_boy(1, 1);
    let sections = vec![Section::new("H", Region::Rom0, 0x10).with_alignment(0xFF, 0)];
    let outcome = PlacementEngine::new(model, sections).assign_sections(&[], false).unwrap();
    let h = &outcome.placements[0];
    assert_eq!(h.org & 0xFF, 0);
    assert_eq!(h.org, 0x0000);
}

#[test]
fn s4_overlay_mode_rejects_unfixed_sections() {
    let model = presets::game_boy(1, 1);
    let sections = vec![Section::new("U", Region::Rom0, 0x10)];
    let err = PlacementEngine::new(model, sections).assign_sections(&[], true).unwrap_err();
    match err {
        PlaceError::OverlayRequiresFixedSections { unfixed_count } => assert_eq!(unfixed_count, 1),
        other => panic!("expected OverlayRequiresFixedSections, got {other:?}"),
    }
}

#[test]
fn s5_script_overrides_object_bank_with_diagnostic() {
    let model = presets::game_boy(8, 1);
    let sections = vec![Section::new("X", Region::RomX, 0x10).with_bank(3)];
    let script = vec![ScriptPlacement::fixed("X", 5, 0x4100)];
    let outcome = PlacementEngine::new(model, sections).assign_sections(&script, false).unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    let x = outcome.sections.iter().find(|s| s.name == "X").unwrap();
    assert_eq!(x.bank, 5);
    assert_eq!(x.org, 0x4100);
}

#[test]
fn s6_charmap_longest_match_end_to_end() {
    use bankld::Charmap;

    let mut map = Charmap::new();
    map.add(b"AB", 0x01).unwrap();
    map.add(b"A", 0x02).unwrap();
    assert_eq!(map.convert(b"ABA"), vec![0x01, 0x02]);
}

#[test]
fn multibank_romx_spreads_oversized_sections_across_banks() {
    let model = presets::game_boy(2, 1);
    let sections = vec![
        Section::new("Big1", Region::RomX, 0x3000),
        Section::new("Big2", Region::RomX, 0x3000),
    ];
    let outcome = PlacementEngine::new(model, sections).assign_sections(&[], false).unwrap();
    let banks: std::collections::HashSet<u32> = outcome.placements.iter().map(|p| p.bank).collect();
    assert_eq!(banks.len(), 2, "each oversized section needs its own bank");
}

#[test]
fn fixed_overlap_reports_colliding_section_by_name() {
    let model = presets::game_boy(1, 1);
    let sections = vec![
        Section::new("First", Region::Rom0, 0x100).with_bank(0).with_address(0x0000),
        Section::new("Second", Region::Rom0, 0x100).with_bank(0).with_address(0x0050),
    ];
    let err = PlacementEngine::new(model, sections).assign_sections(&[], false).unwrap_err();
    match err {
        PlaceError::Unplaceable { name, reason: FailReason::OverlapsSection { name: other }, .. } => {
            assert_eq!(name, "Second");
            assert_eq!(other, "First");
        }
        other => panic!("expected an overlap failure, got {other:?}"),
    }
}

#[test]
fn map_and_symbol_files_render_placed_sections() {
    let model = presets::game_boy(1, 1);
    let sections = vec![
        Section::new("Entry", Region::Rom0, 0x10).with_symbol("Start", 0x0),
        Section::new("Tail", Region::Rom0, 0x10),
    ];
    let outcome = PlacementEngine::new(model.clone(), sections).assign_sections(&[], false).unwrap();

    let mut map_buf = Vec::new();
    write_map_file(&mut map_buf, &model, &outcome).unwrap();
    let map_text = String::from_utf8(map_buf).unwrap();
    assert!(map_text.contains("ROM Bank #0 (HOME):"));
    assert!(map_text.contains("[\"Entry\"]"));
    assert!(map_text.contains("[\"Tail\"]"));
    assert!(map_text.contains("= Start"));

    let mut sym_buf = Vec::new();
    write_symbol_file(&mut sym_buf, &model, &outcome, "bankld").unwrap();
    let sym_text = String::from_utf8(sym_buf).unwrap();
    assert!(sym_text.starts_with("; File generated by bankld"));
    assert!(sym_text.contains("Start"));
}

#[test]
fn unplaceable_oversized_section_reports_no_suitable_space() {
    let model = presets::game_boy(1, 1);
    let sections = vec![Section::new("TooBig", Region::Hram, 0x200)];
    let err = PlacementEngine::new(model, sections).assign_sections(&[], false).unwrap_err();
    assert!(matches!(
        err,
        PlaceError::Unplaceable { reason: FailReason::NoSuitableSpace, .. }
    ));
}
