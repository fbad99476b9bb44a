//! BIDS output layout.
//!
//! # Structure
//!
//! - `entities` - Entity labels, directories and file stems
//! - `info` - Info table of a dataset and participant aggregation
//! - `tsv` - Tab-separated table reading and writing
//! - `writer` - Per-recording file writer

pub mod entities;
pub mod info;
pub mod tsv;
pub mod writer;

pub use entities::{sanitize_label, BidsEntities};
pub use info::{InfoRow, InfoTable, DEFAULT_INFO_FILE};
pub use tsv::TsvTable;
pub use writer::{BidsWriter, WrittenFile};
