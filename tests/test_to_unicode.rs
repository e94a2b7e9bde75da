//! Integration tests for generated ToUnicode programs and `/W` arrays.

use font_oxide::cmap::{generate_to_unicode, CMapToUnicode};
use font_oxide::fonts::widths::{cid_widths, parse_cid_widths};
use font_oxide::fonts::Glyph;
use font_oxide::{MemoryObjectStore, Object};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn block_sizes(program: &str) -> Vec<usize> {
    program
        .lines()
        .filter_map(|line| line.strip_suffix(" beginbfrange"))
        .map(|n| n.parse().unwrap())
        .collect()
}

#[test]
fn test_bfrange_blocks_are_batched() {
    let glyphs: Vec<Glyph> = (0..250).map(|i| Glyph::new(i + 1, 500, Some(0x4E00 + i as u32))).collect();
    let program = generate_to_unicode(&glyphs, 100).unwrap();
    let text = String::from_utf8(program.clone()).unwrap();
    assert_eq!(block_sizes(&text), vec![100, 100, 50]);
    assert_eq!(text.matches("endbfrange").count(), 3);

    let parsed = CMapToUnicode::parse(&program).unwrap();
    assert_eq!(parsed.len(), 250);
    assert_eq!(parsed.lookup_string(1).as_deref(), Some("\u{4E00}"));
    assert_eq!(parsed.lookup_string(250).as_deref(), Some("\u{4EF9}"));
}

#[test]
fn test_batch_of_zero_is_one() {
    let glyphs = vec![Glyph::new(1, 500, Some(0x41)), Glyph::new(2, 500, Some(0x42))];
    let program = generate_to_unicode(&glyphs, 0).unwrap();
    let text = String::from_utf8(program).unwrap();
    assert_eq!(block_sizes(&text), vec![1, 1]);
    assert!(text.contains("<0001><0001><0041>"));
}

#[test]
fn test_only_glyphs_with_text_are_written() {
    let glyphs = vec![
        Glyph::new(0, 500, None),
        Glyph::placeholder(0x41),
        Glyph::new(5, 1000, Some(0x1F600)),
    ];
    let program = generate_to_unicode(&glyphs, 100).unwrap();
    let text = String::from_utf8(program).unwrap();
    assert_eq!(block_sizes(&text), vec![1]);
    assert!(text.contains("<0005><0005><D83DDE00>"));

    assert!(generate_to_unicode(&glyphs[..2], 100).is_none());
}

#[test]
fn test_w_array_forms() {
    let store = MemoryObjectStore::new();
    let w = vec![
        Object::Integer(1),
        Object::int_array([500, 600]),
        Object::Integer(10),
        Object::Integer(12),
        Object::Integer(250),
    ];
    let widths = parse_cid_widths(&w, &store);
    let expected: BTreeMap<u32, i32> = [(1, 500), (2, 600), (10, 250), (11, 250), (12, 250)].into_iter().collect();
    assert_eq!(widths, expected);
}

proptest! {
    #[test]
    fn prop_cid_widths_compact_runs(
        glyphs in prop::collection::btree_map(0i32..600, prop_oneof![Just(1000), 100i32..2000], 0..80)
    ) {
        let w = cid_widths(glyphs.iter().map(|(c, w)| (*c, *w)), 1000);

        // blocks alternate start CID and width list, never adjacent
        prop_assert_eq!(w.len() % 2, 0);
        let mut previous_end: Option<i64> = None;
        for pair in w.chunks(2) {
            let start = pair[0].as_integer().unwrap();
            let count = pair[1].as_array().unwrap().len() as i64;
            prop_assert!(count > 0);
            if let Some(end) = previous_end {
                prop_assert!(start > end + 1);
            }
            previous_end = Some(start + count - 1);
        }

        let store = MemoryObjectStore::new();
        let parsed = parse_cid_widths(&w, &store);
        let expected: BTreeMap<u32, i32> = glyphs
            .iter()
            .filter(|(_, w)| **w != 1000)
            .map(|(c, w)| (*c as u32, *w))
            .collect();
        prop_assert_eq!(parsed, expected);
    }
}
