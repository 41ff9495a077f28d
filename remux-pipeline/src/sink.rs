//! Destination session: owns an opened destination container and commits
//! corrected packets to it.

use crate::timing;
use remux_containers::registry;
use remux_containers::traits::{Muxer, MuxerOptions, StreamInfo};
use remux_core::error::Error;
use remux_core::packet::Packet;
use remux_core::timestamp::Timestamp;
use remux_core::Result;
use tracing::{debug, trace, warn};

/// An open destination container with a single declared output stream.
///
/// The destination is configured for fragmented, pipe-safe output: a new
/// fragment at every keyframe and the leading metadata box written eagerly
/// at open, since the output may be a pipe that cannot be rewritten.
pub struct DestinationSession {
    muxer: Box<dyn Muxer>,
    stream: StreamInfo,
    last_dts: Timestamp,
    closed: bool,
}

impl std::fmt::Debug for DestinationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationSession")
            .field("format", &self.muxer.format_name())
            .field("stream", &self.stream)
            .field("last_dts", &self.last_dts)
            .field("closed", &self.closed)
            .finish()
    }
}

impl DestinationSession {
    /// Open a destination by format hint and location through the global
    /// format registry, declaring one output stream that mirrors the
    /// selected source stream's codec parameters.
    ///
    /// The header is written immediately as part of opening.
    pub fn open(format: &str, location: &str, source_stream: &StreamInfo) -> Result<Self> {
        if format.is_empty() {
            return Err(Error::invalid_param("destination format must not be empty"));
        }
        if location.is_empty() {
            return Err(Error::invalid_param("destination location must not be empty"));
        }
        let muxer = registry::open_sink(format, location)?;
        Self::from_muxer(muxer, source_stream)
    }

    /// Build a session around an already-opened muxer.
    pub fn from_muxer(mut muxer: Box<dyn Muxer>, source_stream: &StreamInfo) -> Result<Self> {
        let requested = StreamInfo {
            index: 0,
            ..source_stream.clone()
        };
        let stream = match muxer.add_stream(requested) {
            Ok(stream) => stream,
            Err(e) => {
                muxer.close();
                return Err(e);
            }
        };

        if let Err(e) = muxer.write_header(&MuxerOptions::pipe_safe()) {
            muxer.close();
            return Err(e);
        }
        debug!(
            stream = stream.index,
            time_base = %stream.time_base.as_rational(),
            "destination header written"
        );

        Ok(Self {
            muxer,
            stream,
            last_dts: Timestamp::none(),
            closed: false,
        })
    }

    /// The declared output stream's descriptor.
    pub fn stream(&self) -> &StreamInfo {
        &self.stream
    }

    /// Decode timestamp of the most recently committed packet, in the
    /// destination time base. Unset until the first commit.
    pub fn last_dts(&self) -> Timestamp {
        self.last_dts
    }

    /// Commit one packet to the destination.
    ///
    /// Remaps the stream index, repairs and rescales the timing, and writes
    /// the packet through immediately — no buffering or reordering. Returns
    /// the payload size. On failure the committed-timestamp state is left
    /// unchanged.
    pub fn commit_unit(&mut self, mut packet: Packet, source_stream: &StreamInfo) -> Result<usize> {
        packet.stream_index = self.stream.index as u32;

        timing::correct(
            &mut packet,
            source_stream.time_base,
            self.stream.time_base,
            self.last_dts,
        );
        // A corrected DTS at or before the previous one is a defect in the
        // corrector, not a condition this layer tolerates.
        debug_assert!(!self.last_dts.is_valid() || packet.dts.value > self.last_dts.value);

        let size = packet.size();
        let dts = packet.dts;
        self.muxer.write_packet(&packet)?;
        self.last_dts = dts;

        trace!(size, pts = %packet.pts, dts = %packet.dts, "committed unit");
        Ok(size)
    }

    /// Finalize and release the destination. Idempotent, best-effort: a
    /// trailer failure still releases the handle, and vice versa.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.muxer.write_trailer() {
            warn!(error = %e, "failed to write destination trailer");
        } else {
            debug!("destination trailer written");
        }
        self.muxer.close();
    }
}

impl Drop for DestinationSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remux_containers::memory::MemorySink;
    use remux_containers::traits::{CodecId, CodecParameters};
    use remux_core::error::{OpenError, WriteError};
    use remux_core::timestamp::TimeBase;

    fn source_stream() -> StreamInfo {
        StreamInfo::video(1, TimeBase::MPEG, CodecParameters::new(CodecId::H264))
    }

    fn unit(pts: i64, dts: i64) -> Packet {
        Packet::new(vec![0u8; 100])
            .with_stream_index(1)
            .with_pts(Timestamp::new(pts, TimeBase::MPEG))
            .with_dts(Timestamp::new(dts, TimeBase::MPEG))
    }

    #[test]
    fn test_open_declares_stream_and_writes_header() {
        let sink = MemorySink::new();
        let state = sink.state();
        let session = DestinationSession::from_muxer(Box::new(sink), &source_stream()).unwrap();

        assert_eq!(session.stream().index, 0);
        assert_eq!(session.stream().time_base, TimeBase::MILLISECONDS);
        assert!(!session.last_dts().is_valid());

        let state = state.lock();
        assert_eq!(state.header_writes, 1);
        assert_eq!(state.options, Some(MuxerOptions::pipe_safe()));
        assert_eq!(state.streams[0].codec.codec_id, CodecId::H264);
    }

    #[test]
    fn test_rejected_option_fails_open() {
        let sink = MemorySink::new().without_fragment_support();
        let err =
            DestinationSession::from_muxer(Box::new(sink), &source_stream()).unwrap_err();
        assert!(matches!(err, Error::Open(OpenError::OptionRejected(_))));
    }

    #[test]
    fn test_commit_remaps_rescales_and_tracks_dts() {
        let sink = MemorySink::new();
        let state = sink.state();
        let mut session =
            DestinationSession::from_muxer(Box::new(sink), &source_stream()).unwrap();

        let size = session.commit_unit(unit(90000, 45000), &source_stream()).unwrap();
        assert_eq!(size, 100);
        assert_eq!(session.last_dts().value, 500);

        let state = state.lock();
        let committed = &state.packets[0];
        assert_eq!(committed.stream_index, 0);
        assert_eq!(committed.pts.value, 1000);
        assert_eq!(committed.dts.value, 500);
        assert_eq!(committed.pos, None);
    }

    #[test]
    fn test_failed_write_leaves_last_dts_unchanged() {
        let sink = MemorySink::new().failing_writes();
        let mut session =
            DestinationSession::from_muxer(Box::new(sink), &source_stream()).unwrap();

        let err = session.commit_unit(unit(90000, 45000), &source_stream()).unwrap_err();
        assert!(matches!(err, Error::Write(WriteError::Underlying(_))));
        assert!(!session.last_dts().is_valid());
    }

    #[test]
    fn test_close_is_idempotent() {
        let sink = MemorySink::new();
        let state = sink.state();
        let mut session =
            DestinationSession::from_muxer(Box::new(sink), &source_stream()).unwrap();

        session.close();
        session.close();

        let state = state.lock();
        assert_eq!(state.trailer_writes, 1);
        assert!(state.closed);
    }

    #[test]
    fn test_trailer_failure_still_releases_handle() {
        let sink = MemorySink::new().failing_trailer();
        let state = sink.state();
        let mut session =
            DestinationSession::from_muxer(Box::new(sink), &source_stream()).unwrap();

        session.close();

        let state = state.lock();
        assert_eq!(state.trailer_writes, 0);
        assert!(state.closed);
    }
}
