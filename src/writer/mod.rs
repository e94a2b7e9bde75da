//! PDF output helpers: object serialization and content streams.

pub mod content_stream;
pub mod object_serializer;

pub use content_stream::{ContentStreamBuilder, ContentStreamOp};
pub use object_serializer::{Layout, ObjectSerializer};
