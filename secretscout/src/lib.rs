pub mod config;
pub mod errors;
pub mod filters;
pub mod input;
pub mod patterns;
pub mod results;
pub mod scan;

pub use config::ScanConfig;
pub use errors::{ScanError, ScanResult};
pub use input::InputSource;
pub use patterns::{Confidence, PatternRegistry, PatternSpec};
pub use results::{MatchEvent, ScanEvent, ScanSummary};
pub use scan::engine::{run_scan, CancelToken};
pub use scan::matcher::PatternSet;
