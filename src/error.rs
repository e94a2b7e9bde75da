//! Error types for the font engine.
//!
//! Construction and flush failures are fatal and surface as [`Error`].
//! Decode gaps are not errors: they are reported through
//! [`DecodedText::fully_decoded`](crate::fonts::DecodedText).

/// Result type alias for font engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building, reading or flushing fonts.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Parse error at a specific byte offset of a CMap program
    #[error("Failed to parse CMap at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// A required dictionary entry is missing
    #[error("Missing /{key} in {dict}")]
    MissingEntry {
        /// Description of the dictionary (usually the font name)
        dict: String,
        /// Key that was expected
        key: String,
    },

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Referenced object not found in the object store
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Font dictionary declares a subtype this engine cannot handle
    #[error("Unsupported font subtype: {0}")]
    UnsupportedFontSubtype(String),

    /// Licensing flags of the font program forbid embedding
    #[error("{font} cannot be embedded due to licensing restrictions")]
    EmbeddingNotAllowed {
        /// Font name
        font: String,
    },

    /// One of the 14 standard fonts was asked to be embedded
    #[error("Cannot embed standard font {font}")]
    CannotEmbedStandardFont {
        /// Font name
        font: String,
    },

    /// The embedding strategy contradicts the program/encoding combination
    #[error("Cannot create {font} with strategy {strategy}: {reason}")]
    StrategyConflict {
        /// Font name
        font: String,
        /// Requested strategy
        strategy: String,
        /// What makes the combination impossible
        reason: String,
    },

    /// Type 3 symbol registration on a code that is already taken
    #[error("Character code {0} is already registered in the encoding")]
    CodeAlreadyRegistered(u8),

    /// Type 3 font has no free code left in 1..=255
    #[error("No free character code left in Type 3 font")]
    Type3CodeSpaceExhausted,

    /// Type 3 font flushed without glyphs
    #[error("No glyphs defined for Type 3 font {font}")]
    NoType3Glyphs {
        /// Font name
        font: String,
    },

    /// Font was flushed twice
    #[error("Font {font} has already been flushed")]
    AlreadyFlushed {
        /// Font name
        font: String,
    },

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Predefined CMap resource could not be located
    #[error("CMap resource not found: {0}")]
    CMapNotFound(String),

    /// Font program could not be read
    #[error("Font program error: {0}")]
    FontProgram(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::MissingEntry`].
    pub fn missing(dict: impl Into<String>, key: impl Into<String>) -> Self {
        Error::MissingEntry {
            dict: dict.into(),
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = Error::ParseError {
            offset: 1234,
            reason: "unbalanced array".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("unbalanced array"));
    }

    #[test]
    fn test_missing_entry_error() {
        let err = Error::missing("Type1 font MyFont", "FontDescriptor");
        let msg = format!("{}", err);
        assert!(msg.contains("/FontDescriptor"));
        assert!(msg.contains("MyFont"));
    }

    #[test]
    fn test_object_not_found_error() {
        let err = Error::ObjectNotFound(10, 0);
        assert!(format!("{}", err).contains("10 0 R"));
    }

    #[test]
    fn test_embedding_errors() {
        let err = Error::CannotEmbedStandardFont {
            font: "Helvetica".to_string(),
        };
        assert!(format!("{}", err).contains("Helvetica"));

        let err = Error::EmbeddingNotAllowed {
            font: "Restricted".to_string(),
        };
        assert!(format!("{}", err).contains("licensing"));

        let err = Error::StrategyConflict {
            font: "Song".to_string(),
            strategy: "ForceEmbedded".to_string(),
            reason: "CID fonts are never embedded".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("ForceEmbedded"));
        assert!(msg.contains("never embedded"));
    }

    #[test]
    fn test_type3_errors() {
        assert!(format!("{}", Error::CodeAlreadyRegistered(65)).contains("65"));
        let err = Error::NoType3Glyphs {
            font: "Icons".to_string(),
        };
        assert!(format!("{}", err).contains("Icons"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        let msg = format!("{}", err);
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
