//! Remux pipeline for live stream copying.
//!
//! Pulls compressed packets from a source container one at a time, repairs
//! and rescales their timing into the destination's time base, and commits
//! them to a fragmented destination container — no re-encoding, no
//! buffering, safe for non-seekable output.

mod engine;
mod error;
mod sink;
mod source;
pub mod timing;

pub use engine::{EngineState, RemuxConfig, RemuxEngine, RemuxSummary};
pub use error::{EngineError, Result};
pub use sink::DestinationSession;
pub use source::{ReadOutcome, SourceSession};
