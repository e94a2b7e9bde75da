//! PDF object serialization.
//!
//! Writes [`Object`] graphs in PDF syntax (ISO 32000-1:2008, section 7.3).
//! Used to inspect what a font engine wrote into an [`ObjectStore`].

use crate::object::{Dictionary, MemoryObjectStore, Object, ObjectRef, ObjectStore};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Whitespace layout of dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One entry per line
    #[default]
    Indented,
    /// Everything on one line
    Compact,
}

/// Serializer for PDF objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectSerializer {
    layout: Layout,
}

impl ObjectSerializer {
    /// Serializer with one dictionary entry per line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer writing each object on one line.
    pub fn compact() -> Self {
        Self {
            layout: Layout::Compact,
        }
    }

    /// Serialize an object to bytes.
    pub fn serialize(&self, obj: &Object) -> Vec<u8> {
        let mut buf = Vec::new();
        // writes into a Vec cannot fail
        let _ = self.write_object(&mut buf, obj);
        buf
    }

    /// Serialize an object to a string; stream data is decoded lossily.
    pub fn serialize_to_string(&self, obj: &Object) -> String {
        String::from_utf8_lossy(&self.serialize(obj)).into_owned()
    }

    /// Every object of `store` as consecutive indirect objects.
    pub fn serialize_store(&self, store: &MemoryObjectStore) -> Vec<u8> {
        let mut buf = Vec::new();
        for (r, obj) in store.iter() {
            let _ = self.write_indirect(&mut buf, r, obj);
        }
        buf
    }

    /// `root` and every object reachable from it, in object number order.
    ///
    /// Dangling references are skipped.
    pub fn serialize_reachable(&self, store: &dyn ObjectStore, root: ObjectRef) -> Vec<u8> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![root];
        while let Some(r) = pending.pop() {
            if !seen.insert(r) {
                continue;
            }
            if let Some(obj) = store.get(r) {
                collect_references(obj, &mut pending);
            }
        }

        let mut buf = Vec::new();
        for r in seen {
            if let Some(obj) = store.get(r) {
                let _ = self.write_indirect(&mut buf, r, obj);
            }
        }
        buf
    }

    /// Write `r` as an indirect object definition.
    pub fn write_indirect<W: Write>(&self, w: &mut W, r: ObjectRef, obj: &Object) -> io::Result<()> {
        writeln!(w, "{} {} obj", r.id, r.gen)?;
        self.write_object(w, obj)?;
        w.write_all(b"\nendobj\n")
    }

    /// Write a direct object.
    pub fn write_object<W: Write>(&self, w: &mut W, obj: &Object) -> io::Result<()> {
        match obj {
            Object::Null => w.write_all(b"null"),
            Object::Boolean(b) => write!(w, "{}", b),
            Object::Integer(i) => write!(w, "{}", i),
            Object::Real(r) => write_real(w, *r),
            Object::String(s) => write_string(w, s),
            Object::Name(n) => write_name(w, n),
            Object::Array(items) => {
                w.write_all(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        w.write_all(b" ")?;
                    }
                    self.write_object(w, item)?;
                }
                w.write_all(b"]")
            },
            Object::Dictionary(dict) => self.write_dictionary(w, dict),
            Object::Stream { dict, data } => {
                let mut dict = dict.clone();
                dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
                self.write_dictionary(w, &dict)?;
                w.write_all(b"\nstream\n")?;
                w.write_all(data)?;
                w.write_all(b"\nendstream")
            },
            Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen),
        }
    }

    fn write_dictionary<W: Write>(&self, w: &mut W, dict: &Dictionary) -> io::Result<()> {
        let separator: &[u8] = match self.layout {
            Layout::Indented => b"\n  ",
            Layout::Compact => b" ",
        };
        w.write_all(b"<<")?;
        for (key, value) in dict {
            w.write_all(separator)?;
            write_name(w, key)?;
            w.write_all(b" ")?;
            self.write_object(w, value)?;
        }
        if !dict.is_empty() {
            match self.layout {
                Layout::Indented => w.write_all(b"\n")?,
                Layout::Compact => w.write_all(b" ")?,
            }
        }
        w.write_all(b">>")
    }
}

fn collect_references(obj: &Object, out: &mut Vec<ObjectRef>) {
    match obj {
        Object::Reference(r) => out.push(*r),
        Object::Array(items) => items.iter().for_each(|o| collect_references(o, out)),
        Object::Dictionary(dict) | Object::Stream { dict, .. } => {
            dict.values().for_each(|o| collect_references(o, out))
        },
        _ => {},
    }
}

/// Reals with at most five decimals, trailing zeros dropped.
fn write_real<W: Write>(w: &mut W, value: f64) -> io::Result<()> {
    if value.fract() == 0.0 {
        return write!(w, "{}", value as i64);
    }
    let formatted = format!("{:.5}", value);
    w.write_all(formatted.trim_end_matches('0').trim_end_matches('.').as_bytes())
}

/// Literal `(...)` for printable text, hex `<...>` otherwise.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    let printable = data
        .iter()
        .all(|&b| matches!(b, b'\n' | b'\r' | b'\t' | 0x20..=0x7E));
    if !printable {
        w.write_all(b"<")?;
        for b in data {
            write!(w, "{:02X}", b)?;
        }
        return w.write_all(b">");
    }

    w.write_all(b"(")?;
    for &b in data {
        let escaped: &[u8] = match b {
            b'(' => b"\\(",
            b')' => b"\\)",
            b'\\' => b"\\\\",
            b'\n' => b"\\n",
            b'\r' => b"\\r",
            b'\t' => b"\\t",
            _ => {
                w.write_all(&[b])?;
                continue;
            },
        };
        w.write_all(escaped)?;
    }
    w.write_all(b")")
}

/// Regular characters are written as-is; delimiters, whitespace, `#` and
/// non-ASCII bytes become `#xx`.
fn write_name<W: Write>(w: &mut W, name: &str) -> io::Result<()> {
    w.write_all(b"/")?;
    for b in name.bytes() {
        let regular = (0x21..=0x7E).contains(&b) && !b"#%()/<>[]{}".contains(&b);
        if regular {
            w.write_all(&[b])?;
        } else {
            write!(w, "#{:02X}", b)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_scalars() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::Null), "null");
        assert_eq!(s.serialize_to_string(&Object::Boolean(true)), "true");
        assert_eq!(s.serialize_to_string(&Object::Integer(-123)), "-123");
        assert_eq!(s.serialize_to_string(&Object::Real(0.001)), "0.001");
        assert_eq!(s.serialize_to_string(&Object::Real(1.0)), "1");
        assert_eq!(s.serialize_to_string(&Object::Real(-12.5)), "-12.5");
    }

    #[test]
    fn test_serialize_string() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::String(b"GB1".to_vec())), "(GB1)");
        assert_eq!(
            s.serialize_to_string(&Object::String(b"Test (parens)".to_vec())),
            "(Test \\(parens\\))"
        );
        assert_eq!(s.serialize_to_string(&Object::String(vec![0x00, 0xFF, 0x80])), "<00FF80>");
    }

    #[test]
    fn test_serialize_glyph_names() {
        let s = ObjectSerializer::new();
        assert_eq!(s.serialize_to_string(&Object::name("Aacute")), "/Aacute");
        assert_eq!(s.serialize_to_string(&Object::name("uni20AC")), "/uni20AC");
        assert_eq!(s.serialize_to_string(&Object::name(".notdef")), "/.notdef");
        assert_eq!(s.serialize_to_string(&Object::name("a b")), "/a#20b");
        assert_eq!(s.serialize_to_string(&Object::name("x(y)")), "/x#28y#29");
        assert_eq!(s.serialize_to_string(&Object::name("AB#C")), "/AB#23C");
    }

    #[test]
    fn test_serialize_w_array() {
        let s = ObjectSerializer::compact();
        let arr = Object::Array(vec![
            Object::Integer(5),
            Object::int_array([200, 200, 200]),
            Object::Integer(10),
            Object::int_array([300]),
        ]);
        assert_eq!(s.serialize_to_string(&arr), "[5 [200 200 200] 10 [300]]");
    }

    #[test]
    fn test_serialize_dictionary_sorted() {
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("Font"));
        dict.insert("Subtype".to_string(), Object::name("Type1"));
        dict.insert("BaseFont".to_string(), Object::name("Helvetica"));
        let obj = Object::Dictionary(dict);
        assert_eq!(
            ObjectSerializer::compact().serialize_to_string(&obj),
            "<< /BaseFont /Helvetica /Subtype /Type1 /Type /Font >>"
        );
        assert_eq!(
            ObjectSerializer::new().serialize_to_string(&obj),
            "<<\n  /BaseFont /Helvetica\n  /Subtype /Type1\n  /Type /Font\n>>"
        );
        assert_eq!(ObjectSerializer::compact().serialize_to_string(&Object::Dictionary(Dictionary::new())), "<<>>");
    }

    #[test]
    fn test_serialize_stream_sets_length() {
        let s = ObjectSerializer::compact();
        let stream = Object::stream(Dictionary::new(), &b"stream data"[..]);
        let result = s.serialize_to_string(&stream);
        assert!(result.contains("/Length 11"));
        assert!(result.contains("stream\nstream data\nendstream"));
    }

    #[test]
    fn test_serialize_store() {
        let mut store = MemoryObjectStore::new();
        store.add(Object::Integer(42));
        store.add(Object::name("Identity-H"));
        let out = String::from_utf8(ObjectSerializer::compact().serialize_store(&store)).unwrap();
        assert_eq!(out, "1 0 obj\n42\nendobj\n2 0 obj\n/Identity-H\nendobj\n");
    }

    #[test]
    fn test_serialize_reachable() {
        let mut store = MemoryObjectStore::new();
        let unrelated = store.add(Object::Integer(1));
        let leaf = store.add(Object::Integer(2));
        let mid = store.add(Object::Array(vec![
            Object::Reference(leaf),
            Object::Reference(ObjectRef::new(99, 0)),
        ]));
        let mut dict = Dictionary::new();
        dict.insert("Kids".to_string(), Object::Reference(mid));
        dict.insert("Self".to_string(), Object::Reference(ObjectRef::new(4, 0)));
        let root = store.add(Object::Dictionary(dict));
        assert_eq!(root, ObjectRef::new(4, 0));

        let out = String::from_utf8(ObjectSerializer::compact().serialize_reachable(&store, root)).unwrap();
        assert!(!out.contains(&format!("{} 0 obj", unrelated.id)));
        assert!(out.starts_with("2 0 obj\n2\nendobj\n3 0 obj\n"));
        assert!(out.ends_with("4 0 obj\n<< /Kids 3 0 R /Self 4 0 R >>\nendobj\n"));
    }
}
