//! Demuxer and muxer traits.

use remux_core::packet::Packet;
use remux_core::timestamp::TimeBase;
use remux_core::Result;

/// Track type in a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
    /// Subtitle track.
    Subtitle,
    /// Data track.
    Data,
    /// Unknown track type.
    Unknown,
}

/// Codec identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecId {
    /// H.264/AVC.
    H264,
    /// H.265/HEVC.
    H265,
    /// VP9.
    Vp9,
    /// AV1.
    Av1,
    /// AAC.
    Aac,
    /// Opus.
    Opus,
    /// Unknown codec.
    Unknown(String),
}

/// Codec parameters attached to a stream.
///
/// The remux pipeline copies these verbatim from the selected source stream
/// to the declared destination stream and never interprets them; only the
/// container implementations look inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecParameters {
    /// Codec identifier.
    pub codec_id: CodecId,
    /// Codec-specific extra data (e.g. decoder configuration record).
    pub extra_data: Option<Vec<u8>>,
}

impl CodecParameters {
    /// Create codec parameters with no extra data.
    pub fn new(codec_id: CodecId) -> Self {
        Self {
            codec_id,
            extra_data: None,
        }
    }
}

/// Stream information.
///
/// A stream's time base is fixed when the stream is declared and never
/// changes for the lifetime of the session that owns it.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Stream index within the owning container.
    pub index: usize,
    /// Track type.
    pub track_type: TrackType,
    /// Time base.
    pub time_base: TimeBase,
    /// Codec parameters.
    pub codec: CodecParameters,
}

impl StreamInfo {
    /// Create a video stream descriptor.
    pub fn video(index: usize, time_base: TimeBase, codec: CodecParameters) -> Self {
        Self {
            index,
            track_type: TrackType::Video,
            time_base,
            codec,
        }
    }

    /// Create an audio stream descriptor.
    pub fn audio(index: usize, time_base: TimeBase, codec: CodecParameters) -> Self {
        Self {
            index,
            track_type: TrackType::Audio,
            time_base,
            codec,
        }
    }
}

/// Options requested when writing a destination header.
///
/// Contract: a muxer that does not implement a requested option must fail
/// `write_header` with `OpenError::OptionRejected` instead of silently
/// ignoring it. Proceeding with an unhonored option would leave the output
/// with ambiguous muxing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MuxerOptions {
    /// Start a new fragment at every keyframe, so successive fragments are
    /// independently decodable.
    pub fragment_at_keyframes: bool,
    /// Write the leading metadata box eagerly (empty) instead of deferring it
    /// to end-of-stream. Required when the destination cannot be rewritten
    /// after the fact (e.g. a pipe).
    pub eager_header: bool,
    /// Flush every packet to the underlying writer as it is committed.
    pub flush_packets: bool,
}

impl MuxerOptions {
    /// Options for pipe-safe, progressively playable output.
    pub fn pipe_safe() -> Self {
        Self {
            fragment_at_keyframes: true,
            eager_header: true,
            flush_packets: true,
        }
    }
}

/// Demuxer trait for reading container formats.
pub trait Demuxer: Send + std::fmt::Debug {
    /// Get container format name.
    fn format_name(&self) -> &str;

    /// Get the streams discovered while probing, in declaration order.
    fn streams(&self) -> &[StreamInfo];

    /// Read the next packet.
    ///
    /// Returns `Ok(None)` at end of stream. The packet carries its raw
    /// timing exactly as delivered by the container; no repair happens here.
    fn read_packet(&mut self) -> Result<Option<Packet>>;

    /// Close the demuxer and release the underlying handle.
    fn close(&mut self);
}

/// Muxer trait for writing container formats.
pub trait Muxer: Send + std::fmt::Debug {
    /// Get container format name.
    fn format_name(&self) -> &str;

    /// Declare an output stream.
    ///
    /// Returns the stream descriptor as actually declared: the muxer assigns
    /// the index and may substitute its native time base for the requested
    /// one. The returned descriptor is authoritative for all subsequent
    /// packet timing.
    fn add_stream(&mut self, info: StreamInfo) -> Result<StreamInfo>;

    /// Write the container header with the requested options.
    fn write_header(&mut self, options: &MuxerOptions) -> Result<()>;

    /// Write a packet.
    ///
    /// Timestamps must already be in the destination stream's time base, and
    /// decode timestamps must be strictly increasing per stream.
    fn write_packet(&mut self, packet: &Packet) -> Result<()>;

    /// Write the trailer and finalize the fragment structure.
    fn write_trailer(&mut self) -> Result<()>;

    /// Close the muxer and release the underlying handle.
    fn close(&mut self);
}
