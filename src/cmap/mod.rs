//! CMap support: parsing, code ↔ CID and code ↔ Unicode maps, and the
//! cache of predefined CMap resources.

pub mod cache;
pub mod codespace;
pub mod encoding;
pub mod lexer;
pub mod parser;
pub mod to_unicode;

pub use cache::{CMapCache, CMapResourceProvider, DirectoryCMapProvider, MemoryCMapProvider};
pub use codespace::{CharCode, CodespaceRange};
pub use encoding::{CMapEncoding, IDENTITY_H, IDENTITY_V};
pub use parser::{parse_cmap, CMapData};
pub use to_unicode::{generate_to_unicode, CMapToUnicode, DEFAULT_BFRANGE_BATCH};
