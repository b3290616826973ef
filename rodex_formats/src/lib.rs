pub mod encoding;
pub mod table;

pub use encoding::{DEFAULT_ENCODING_LABELS, DecodeError, decode_text};
pub use table::{Record, SALVAGE_FIELD, ScanOptions, Value, scan_records};
