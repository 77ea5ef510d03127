pub mod document;
pub mod legacy;

pub use document::{DOCUMENT_VERSION, DocumentError, parse_month, serialize_month};
pub use legacy::{LegacyParse, LegacyParseError, parse_legacy};
