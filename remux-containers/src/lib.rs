//! Container format contract for the remux pipeline.
//!
//! The pipeline never parses or writes container bytes itself; it talks to a
//! container library through the narrow [`Demuxer`] and [`Muxer`] traits
//! defined here. Implementations are looked up through the format registry by
//! the format-hint name they were registered under.
//!
//! This crate also ships an in-memory format (`mem`) implementing both sides
//! of the contract, used by the pipeline test suite and by embedders that
//! feed packets from their own transport.

pub mod memory;
pub mod registry;
pub mod traits;

pub use memory::{MemorySink, MemorySource, SinkState};
pub use registry::FormatRegistry;
pub use traits::{
    CodecId, CodecParameters, Demuxer, Muxer, MuxerOptions, StreamInfo, TrackType,
};
