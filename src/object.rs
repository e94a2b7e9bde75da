//! PDF object boundary.
//!
//! The font engine reads existing font dictionaries and writes new ones
//! through these types. Document management lives elsewhere; the
//! [`ObjectStore`] trait is the only contact point with it.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Dictionary with deterministic key order.
pub type Dictionary = BTreeMap<String, Object>;

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (without the leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dictionary),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: Dictionary,
        /// Stream data, as stored (possibly filtered)
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Shorthand for `Object::Name`.
    pub fn name(name: impl Into<String>) -> Self {
        Object::Name(name.into())
    }

    /// Build an array of integers.
    pub fn int_array<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Object::Array(values.into_iter().map(Object::Integer).collect())
    }

    /// Build an unfiltered stream.
    pub fn stream(dict: Dictionary, data: impl Into<bytes::Bytes>) -> Self {
        Object::Stream {
            dict,
            data: data.into(),
        }
    }

    /// Build a FlateDecode stream from raw bytes.
    pub fn flate_stream(mut dict: Dictionary, data: &[u8]) -> Result<Self> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;
        dict.insert("Filter".to_string(), Object::name("FlateDecode"));
        Ok(Object::stream(dict, compressed))
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(_) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integer or real, as f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to real number.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to string (bytes).
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Stream data with FlateDecode undone.
    ///
    /// Only the filters a font engine meets in practice are handled: none,
    /// or a single FlateDecode.
    pub fn stream_data(&self) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters: Vec<&str> = match dict.get("Filter") {
                    Some(Object::Name(name)) => vec![name.as_str()],
                    Some(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_name()).collect(),
                    _ => Vec::new(),
                };
                match filters.as_slice() {
                    [] => Ok(data.to_vec()),
                    ["FlateDecode"] => {
                        let mut out = Vec::new();
                        flate2::read::ZlibDecoder::new(&data[..])
                            .read_to_end(&mut out)
                            .map_err(|e| Error::Decode(format!("FlateDecode: {}", e)))?;
                        Ok(out)
                    },
                    other => Err(Error::UnsupportedFilter(other.join(" "))),
                }
            },
            _ => Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }
}

/// Owner of indirect objects.
///
/// Fonts add their dictionaries, descriptors and streams here at flush time
/// and resolve references through it when reading existing fonts.
pub trait ObjectStore {
    /// Register an object and return its reference.
    fn add(&mut self, obj: Object) -> ObjectRef;

    /// Replace the object behind an existing reference.
    fn set(&mut self, r: ObjectRef, obj: Object) -> Result<()>;

    /// Look up an indirect object.
    fn get(&self, r: ObjectRef) -> Option<&Object>;

    /// Follow references until a direct object is reached.
    ///
    /// Dangling references resolve to `Null`.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        let mut current = obj;
        // reference chains longer than this are cycles
        for _ in 0..32 {
            match current {
                Object::Reference(r) => match self.get(*r) {
                    Some(next) => current = next,
                    None => return &Object::Null,
                },
                _ => return current,
            }
        }
        &Object::Null
    }

    /// Resolve `dict[key]`.
    fn resolve_key<'a>(&'a self, dict: &'a Dictionary, key: &str) -> Option<&'a Object> {
        dict.get(key).map(|o| self.resolve(o)).filter(|o| !o.is_null())
    }
}

/// In-memory object store with sequential object numbers starting at 1.
#[derive(Debug, Default, Clone)]
pub struct MemoryObjectStore {
    objects: Vec<Object>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over `(reference, object)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, obj)| (ObjectRef::new(i as u32 + 1, 0), obj))
    }
}

impl ObjectStore for MemoryObjectStore {
    fn add(&mut self, obj: Object) -> ObjectRef {
        self.objects.push(obj);
        ObjectRef::new(self.objects.len() as u32, 0)
    }

    fn set(&mut self, r: ObjectRef, obj: Object) -> Result<()> {
        let slot = (r.id as usize)
            .checked_sub(1)
            .and_then(|i| self.objects.get_mut(i))
            .ok_or(Error::ObjectNotFound(r.id, r.gen))?;
        *slot = obj;
        Ok(())
    }

    fn get(&self, r: ObjectRef) -> Option<&Object> {
        (r.id as usize)
            .checked_sub(1)
            .and_then(|i| self.objects.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_integer() {
        let obj = Object::Integer(42);
        assert_eq!(obj.as_integer(), Some(42));
        assert_eq!(obj.as_number(), Some(42.0));
        assert!(obj.as_name().is_none());
        assert!(!obj.is_null());
    }

    #[test]
    fn test_object_name() {
        let obj = Object::name("Type");
        assert_eq!(obj.as_name(), Some("Type"));
        assert!(obj.as_integer().is_none());
    }

    #[test]
    fn test_stream_as_dict() {
        let mut dict = Dictionary::new();
        dict.insert("Length1".to_string(), Object::Integer(3));
        let obj = Object::stream(dict, vec![1u8, 2, 3]);
        assert_eq!(
            obj.as_dict().and_then(|d| d.get("Length1")),
            Some(&Object::Integer(3))
        );
        assert_eq!(obj.stream_data().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_flate_stream_round_trip() {
        let payload = b"begincmap endcmap".repeat(20);
        let obj = Object::flate_stream(Dictionary::new(), &payload).unwrap();
        assert_eq!(
            obj.as_dict().and_then(|d| d.get("Filter")),
            Some(&Object::name("FlateDecode"))
        );
        assert_eq!(obj.stream_data().unwrap(), payload);
    }

    #[test]
    fn test_stream_data_on_non_stream() {
        let err = Object::Integer(1).stream_data().unwrap_err();
        assert!(format!("{}", err).contains("Stream"));
    }

    #[test]
    fn test_unsupported_filter() {
        let mut dict = Dictionary::new();
        dict.insert("Filter".to_string(), Object::name("LZWDecode"));
        let obj = Object::stream(dict, vec![0u8]);
        assert!(matches!(obj.stream_data(), Err(Error::UnsupportedFilter(_))));
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(format!("{}", ObjectRef::new(10, 0)), "10 0 R");
    }

    #[test]
    fn test_memory_store_add_and_resolve() {
        let mut store = MemoryObjectStore::new();
        let a = store.add(Object::Integer(7));
        let b = store.add(Object::Reference(a));
        assert_eq!(a, ObjectRef::new(1, 0));
        assert_eq!(b, ObjectRef::new(2, 0));
        assert_eq!(store.resolve(&Object::Reference(b)), &Object::Integer(7));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_memory_store_dangling_and_cycle() {
        let mut store = MemoryObjectStore::new();
        assert!(store.resolve(&Object::Reference(ObjectRef::new(9, 0))).is_null());

        let a = store.add(Object::Null);
        store.set(a, Object::Reference(a)).unwrap();
        assert!(store.resolve(&Object::Reference(a)).is_null());
    }

    #[test]
    fn test_memory_store_set_missing() {
        let mut store = MemoryObjectStore::new();
        assert!(store.set(ObjectRef::new(3, 0), Object::Null).is_err());
    }

    #[test]
    fn test_resolve_key_skips_null() {
        let store = MemoryObjectStore::new();
        let mut dict = Dictionary::new();
        dict.insert("A".to_string(), Object::Null);
        dict.insert("B".to_string(), Object::Integer(1));
        assert!(store.resolve_key(&dict, "A").is_none());
        assert_eq!(store.resolve_key(&dict, "B"), Some(&Object::Integer(1)));
    }
}
