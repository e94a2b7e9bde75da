//! `/Widths` and `/W` arrays.

use crate::object::{Object, ObjectStore};
use std::collections::BTreeMap;

/// `/Widths` of a simple font: one entry per code in `first..=last`.
pub fn simple_widths(first: u8, last: u8, width_of: impl Fn(u8) -> i32) -> Object {
    Object::int_array((first..=last).map(|code| width_of(code) as i64))
}

/// `/W` of a CID font.
///
/// `glyphs` are `(cid, width)` pairs in ascending CID order. Glyphs with
/// `default_width` are left to `/DW`; consecutive CIDs share one
/// `cid [w1 w2 ...]` block, and a gap or a default-width glyph starts a
/// new one.
pub fn cid_widths<I>(glyphs: I, default_width: i32) -> Vec<Object>
where
    I: IntoIterator<Item = (i32, i32)>,
{
    let mut out = Vec::new();
    let mut block: Vec<Object> = Vec::new();
    let mut last_cid = i64::MIN;

    for (cid, width) in glyphs {
        if width == default_width {
            continue;
        }
        let cid = cid as i64;
        if cid != last_cid + 1 && !block.is_empty() {
            out.push(Object::Array(std::mem::take(&mut block)));
        }
        if block.is_empty() {
            out.push(Object::Integer(cid));
        }
        block.push(Object::Integer(width as i64));
        last_cid = cid;
    }
    if !block.is_empty() {
        out.push(Object::Array(block));
    }
    out
}

/// Read a `/W` array into CID → width.
///
/// Both forms are accepted: `c [w1 w2 ...]` and `c_first c_last w`.
/// Malformed tails are ignored.
pub fn parse_cid_widths(w: &[Object], store: &dyn ObjectStore) -> BTreeMap<u32, i32> {
    let mut widths = BTreeMap::new();
    let items: Vec<&Object> = w.iter().map(|o| store.resolve(o)).collect();
    let mut i = 0;
    while i < items.len() {
        let Some(first) = items[i].as_integer() else {
            log::warn!("Unexpected {} in /W array", items[i].type_name());
            i += 1;
            continue;
        };
        match items.get(i + 1) {
            Some(Object::Array(run)) => {
                for (k, value) in run.iter().enumerate() {
                    if let Some(width) = store.resolve(value).as_number() {
                        widths.insert((first + k as i64) as u32, width as i32);
                    }
                }
                i += 2;
            },
            Some(last) => {
                let (Some(last), Some(width)) =
                    (last.as_integer(), items.get(i + 2).and_then(|o| o.as_number()))
                else {
                    break;
                };
                if last - first > 0xFFFF {
                    log::warn!("Ignoring oversized /W range {}..{}", first, last);
                } else {
                    for cid in first..=last {
                        widths.insert(cid as u32, width as i32);
                    }
                }
                i += 3;
            },
            None => break,
        }
    }
    widths
}

/// Read `/FirstChar` + `/Widths` into code → width.
pub fn parse_simple_widths(first_char: i64, widths: &[Object], store: &dyn ObjectStore) -> BTreeMap<u8, i32> {
    widths
        .iter()
        .enumerate()
        .filter_map(|(i, w)| {
            let code = u8::try_from(first_char + i as i64).ok()?;
            store.resolve(w).as_number().map(|w| (code, w as i32))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MemoryObjectStore;
    use crate::writer::ObjectSerializer;

    fn render(objs: Vec<Object>) -> String {
        ObjectSerializer::compact().serialize_to_string(&Object::Array(objs))
    }

    #[test]
    fn test_cid_widths_compaction() {
        let w = cid_widths(vec![(5, 200), (6, 200), (7, 200), (10, 300)], 1000);
        assert_eq!(render(w), "[5 [200 200 200] 10 [300]]");
    }

    #[test]
    fn test_default_width_breaks_block() {
        let w = cid_widths(vec![(1, 500), (2, 1000), (3, 500)], 1000);
        assert_eq!(render(w), "[1 [500] 3 [500]]");
    }

    #[test]
    fn test_all_default_is_empty() {
        assert!(cid_widths(vec![(1, 1000), (2, 1000)], 1000).is_empty());
    }

    #[test]
    fn test_simple_widths() {
        let widths = simple_widths(65, 67, |c| if c == 66 { 0 } else { 600 });
        assert_eq!(
            ObjectSerializer::compact().serialize_to_string(&widths),
            "[600 0 600]"
        );
    }

    #[test]
    fn test_parse_both_forms() {
        let store = MemoryObjectStore::new();
        let w = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(500), Object::Real(250.0)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(333),
        ];
        let parsed = parse_cid_widths(&w, &store);
        assert_eq!(parsed.get(&1), Some(&500));
        assert_eq!(parsed.get(&2), Some(&250));
        assert_eq!(parsed.get(&11), Some(&333));
        assert_eq!(parsed.len(), 5);
    }

    #[test]
    fn test_parse_truncated_w() {
        let store = MemoryObjectStore::new();
        let w = vec![Object::Integer(3), Object::Integer(4)];
        assert!(parse_cid_widths(&w, &store).is_empty());
    }

    #[test]
    fn test_parse_simple_widths() {
        let store = MemoryObjectStore::new();
        let widths = vec![Object::Integer(278), Object::Integer(556)];
        let parsed = parse_simple_widths(254, &widths, &store);
        assert_eq!(parsed.get(&254), Some(&278));
        assert_eq!(parsed.get(&255), Some(&556));
        assert_eq!(parsed.len(), 2);
    }
}
