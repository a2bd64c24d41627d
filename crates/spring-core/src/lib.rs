//! SPRING: stream monitoring under the time warping distance.
//!
//! Detects occurrences of a fixed reference profile in an unbounded numeric
//! stream with subsequence Dynamic Time Warping, one sample per cycle, in
//! O(profile length) time and memory per sample. Matches are reported with
//! bounded latency once no reachable warping path can still improve on them.
//!
//! Zero I/O: the engine consumes samples and returns detections. Diagnostics
//! go through an injected [`DebugSink`].

pub mod cell;
pub mod config;
pub mod constants;
pub mod csv;
pub mod debug;
pub mod engine;
pub mod error;
pub mod occurrence;
pub mod profile;

pub use cell::Cell;
pub use config::SpringConfig;
pub use constants::{UNREACHED_CYCLE, UNREACHED_DISTANCE};
pub use csv::{CSV_HEADER, csv_header};
pub use debug::{DebugSink, Recorder, Silent, TracingSink};
pub use engine::SpringEngine;
pub use error::{ConfigError, Result};
pub use occurrence::DetectedOccurrence;
pub use profile::Profile;
