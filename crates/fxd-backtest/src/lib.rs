//! Historical replay driver: a strictly sequential, single-threaded scan
//! over historical rows, fully deterministic given identical rows and oracle
//! responses.
//!
//! Pipeline per row: session state → oracle verdict → executor step
//! (protective exits, risk gating, transition table) → snapshot persist →
//! equity point.

mod artifacts;
mod driver;
mod loader;

pub use artifacts::{write_run_artifacts, RunArtifacts};
pub use driver::{ReplayConfig, ReplayDriver, ReplayReport};
pub use loader::{load_csv_file, load_verdict_log, parse_csv_rows, LoadError, ReplayRow};
