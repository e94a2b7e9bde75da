//! Font engines.
//!
//! - [`program`]: glyph repositories (TrueType, Type 1, CJK, Type 3,
//!   rebuilt-from-document)
//! - [`encoding`]: single-byte encodings with `/Differences`
//! - [`simple`], [`type0`], [`type3`]: the engines behind [`PdfFont`]
//! - [`factory`]: engine selection, embedding strategy and reconstruction

pub mod encoding;
pub mod encoding_tables;
pub mod factory;
pub mod font;
pub mod glyph;
pub mod glyph_list;
pub mod metrics;
pub mod program;
pub mod simple;
pub mod subset;
pub mod type0;
pub mod type3;
pub mod widths;

pub use encoding::{FontEncoding, FONT_SPECIFIC};
pub use encoding_tables::BaseEncoding;
pub use factory::{EmbeddingStrategy, FontFactory, DEFAULT_SIMPLE_ENCODING};
pub use font::{DecodedText, Font, PdfFont};
pub use glyph::Glyph;
pub use metrics::{FontDescriptorFlags, FontMetrics, FontNames};
pub use program::{
    CidFontProgram, DocFontProgram, FontProgram, GlyphRepository, TrueTypeProgram, Type1Program,
    Type3Glyph, Type3Program,
};
pub use simple::SimpleFont;
pub use type0::{CidFontType, Type0Font};
pub use type3::Type3Font;
