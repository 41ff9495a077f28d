//! In-memory container format.
//!
//! Implements both sides of the container contract without touching any
//! bytes on disk: [`MemorySource`] replays a scripted packet sequence,
//! [`MemorySink`] records everything a destination container would be asked
//! to do (streams declared, header/trailer writes, committed packets,
//! accepted options) behind a shared handle that stays readable after the
//! session closes.
//!
//! The format registers under the `"mem"` hint. Sources are published to a
//! location name ahead of opening; sink state is retrievable by location
//! after the run.

use crate::registry::FormatRegistry;
use crate::traits::{Demuxer, Muxer, MuxerOptions, StreamInfo};
use parking_lot::Mutex;
use remux_core::error::{OpenError, ReadError, WriteError};
use remux_core::packet::Packet;
use remux_core::timestamp::TimeBase;
use remux_core::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, OnceLock};

/// A demuxer replaying a scripted packet sequence.
pub struct MemorySource {
    streams: Vec<StreamInfo>,
    packets: VecDeque<Packet>,
    /// Error to surface once the scripted packets run out, instead of a
    /// normal end of stream.
    trailing_error: Option<String>,
    closed: bool,
}

impl MemorySource {
    /// Create a source with the given streams and packet sequence.
    pub fn new(streams: Vec<StreamInfo>, packets: Vec<Packet>) -> Self {
        Self {
            streams,
            packets: packets.into(),
            trailing_error: None,
            closed: false,
        }
    }

    /// Fail with a transport error after the scripted packets are exhausted,
    /// instead of reporting end of stream.
    pub fn with_trailing_error(mut self, message: impl Into<String>) -> Self {
        self.trailing_error = Some(message.into());
        self
    }
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("streams", &self.streams)
            .field("packets_remaining", &self.packets.len())
            .field("trailing_error", &self.trailing_error)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Demuxer for MemorySource {
    fn format_name(&self) -> &str {
        "mem"
    }

    fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    fn read_packet(&mut self) -> Result<Option<Packet>> {
        if self.closed {
            return Err(ReadError::Underlying("source is closed".into()).into());
        }
        match self.packets.pop_front() {
            Some(packet) => Ok(Some(packet)),
            None => match self.trailing_error.take() {
                Some(message) => Err(ReadError::Underlying(message).into()),
                None => Ok(None),
            },
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.packets.clear();
    }
}

/// Recorded state of a [`MemorySink`], shared behind `Arc<Mutex<_>>` so it
/// outlives the session that owned the sink.
#[derive(Default)]
pub struct SinkState {
    /// Streams declared through `add_stream`, after index/time-base rewrite.
    pub streams: Vec<StreamInfo>,
    /// Number of header writes.
    pub header_writes: usize,
    /// Number of trailer writes.
    pub trailer_writes: usize,
    /// Options accepted at header time.
    pub options: Option<MuxerOptions>,
    /// Every packet committed, in order.
    pub packets: Vec<Packet>,
    /// Fragment boundaries observed (keyframe packets while fragmenting).
    pub fragments: usize,
    /// Whether the sink has been closed.
    pub closed: bool,
    last_dts: Option<i64>,
}

impl SinkState {
    /// Decode timestamps of the committed packets, in commit order.
    pub fn committed_dts(&self) -> Vec<i64> {
        self.packets.iter().map(|p| p.dts.value).collect()
    }

    /// Total payload bytes committed.
    pub fn committed_bytes(&self) -> usize {
        self.packets.iter().map(|p| p.size()).sum()
    }
}

/// A muxer recording everything it is asked to write.
///
/// Declared streams get the sink's native time base (milliseconds by
/// default), the way a real container substitutes its own units for the
/// caller's. Decode timestamps must be set and strictly increasing; the sink
/// hard-rejects anything else, as a fragmented destination format does.
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
    time_base: TimeBase,
    supports_fragmentation: bool,
    fail_writes: bool,
    fail_trailer: bool,
}

impl MemorySink {
    /// Create a sink with the default (millisecond) native time base.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState::default())),
            time_base: TimeBase::MILLISECONDS,
            supports_fragmentation: true,
            fail_writes: false,
            fail_trailer: false,
        }
    }

    /// Use a different native time base for declared streams.
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Build a sink that does not implement fragmented output. Opening a
    /// pipe-safe destination on top of it must fail.
    pub fn without_fragment_support(mut self) -> Self {
        self.supports_fragmentation = false;
        self
    }

    /// Build a sink whose packet writes fail.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Build a sink whose trailer write fails.
    pub fn failing_trailer(mut self) -> Self {
        self.fail_trailer = true;
        self
    }

    /// Get a handle to the recorded state.
    pub fn state(&self) -> Arc<Mutex<SinkState>> {
        Arc::clone(&self.state)
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink")
            .field("time_base", &self.time_base)
            .field("supports_fragmentation", &self.supports_fragmentation)
            .field("fail_writes", &self.fail_writes)
            .field("fail_trailer", &self.fail_trailer)
            .finish()
    }
}

impl Muxer for MemorySink {
    fn format_name(&self) -> &str {
        "mem"
    }

    fn add_stream(&mut self, info: StreamInfo) -> Result<StreamInfo> {
        let mut state = self.state.lock();
        if state.header_writes > 0 {
            return Err(
                OpenError::Underlying("cannot add stream after header".into()).into(),
            );
        }
        let declared = StreamInfo {
            index: state.streams.len(),
            time_base: self.time_base,
            ..info
        };
        state.streams.push(declared.clone());
        Ok(declared)
    }

    fn write_header(&mut self, options: &MuxerOptions) -> Result<()> {
        if options.fragment_at_keyframes && !self.supports_fragmentation {
            return Err(OpenError::OptionRejected("fragment_at_keyframes".into()).into());
        }
        let mut state = self.state.lock();
        if state.streams.is_empty() {
            return Err(OpenError::Underlying("no streams declared".into()).into());
        }
        state.header_writes += 1;
        state.options = Some(*options);
        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        if self.fail_writes {
            return Err(WriteError::Underlying("write refused".into()).into());
        }
        let mut state = self.state.lock();
        if state.header_writes == 0 {
            return Err(WriteError::Underlying("header not written".into()).into());
        }
        if packet.stream_index as usize >= state.streams.len() {
            return Err(
                WriteError::Underlying(format!("unknown stream {}", packet.stream_index)).into(),
            );
        }
        if !packet.dts.is_valid() {
            return Err(WriteError::Underlying("packet has no DTS".into()).into());
        }
        if let Some(last) = state.last_dts {
            if packet.dts.value <= last {
                return Err(WriteError::NonMonotonicDts {
                    last,
                    dts: packet.dts.value,
                }
                .into());
            }
        }
        state.last_dts = Some(packet.dts.value);
        let fragmenting = state
            .options
            .map(|o| o.fragment_at_keyframes)
            .unwrap_or(false);
        if fragmenting && packet.is_keyframe() {
            state.fragments += 1;
        }
        state.packets.push(packet.clone());
        Ok(())
    }

    fn write_trailer(&mut self) -> Result<()> {
        if self.fail_trailer {
            return Err(WriteError::Underlying("trailer write refused".into()).into());
        }
        let mut state = self.state.lock();
        state.trailer_writes += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().closed = true;
    }
}

static PUBLISHED_SOURCES: OnceLock<Mutex<HashMap<String, MemorySource>>> = OnceLock::new();
static PUBLISHED_SINKS: OnceLock<Mutex<HashMap<String, MemorySink>>> = OnceLock::new();
static SINK_STATES: OnceLock<Mutex<HashMap<String, Arc<Mutex<SinkState>>>>> = OnceLock::new();

fn published_sources() -> &'static Mutex<HashMap<String, MemorySource>> {
    PUBLISHED_SOURCES.get_or_init(Default::default)
}

fn published_sinks() -> &'static Mutex<HashMap<String, MemorySink>> {
    PUBLISHED_SINKS.get_or_init(Default::default)
}

fn sink_states() -> &'static Mutex<HashMap<String, Arc<Mutex<SinkState>>>> {
    SINK_STATES.get_or_init(Default::default)
}

/// Publish a source under a location name, to be consumed by the next
/// `open_source("mem", location)`.
pub fn publish_source(location: impl Into<String>, source: MemorySource) {
    published_sources().lock().insert(location.into(), source);
}

/// Publish a preconfigured sink under a location name. Without a published
/// sink, opening a `mem` destination creates a default recording sink.
pub fn publish_sink(location: impl Into<String>, sink: MemorySink) {
    published_sinks().lock().insert(location.into(), sink);
}

/// Get the recorded state of the sink opened at a location, if any.
pub fn sink_state(location: &str) -> Option<Arc<Mutex<SinkState>>> {
    sink_states().lock().get(location).cloned()
}

/// Register the `mem` format into a registry.
pub fn register(registry: &mut FormatRegistry) {
    registry.register_demuxer("mem", |location| {
        published_sources()
            .lock()
            .remove(location)
            .map(|source| Box::new(source) as Box<dyn Demuxer>)
            .ok_or_else(|| {
                OpenError::Underlying(format!("no memory source published at {location}")).into()
            })
    });
    registry.register_muxer("mem", |location| {
        let sink = published_sinks()
            .lock()
            .remove(location)
            .unwrap_or_default();
        sink_states()
            .lock()
            .insert(location.to_string(), sink.state());
        Ok(Box::new(sink) as Box<dyn Muxer>)
    });
}
