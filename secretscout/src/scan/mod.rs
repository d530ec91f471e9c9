//! The concurrent scan core: pattern compilation, chunked line reading, and
//! the worker pool that fans sources out and match events back in.

pub mod engine;
pub mod matcher;
pub mod reader;

pub use engine::{run_scan, CancelToken, ScanOptions};
pub use matcher::{LineMatch, PatternSet};
pub use reader::LineReader;
