//! Source session: owns an opened source container and selects the stream
//! to copy.

use remux_containers::registry;
use remux_containers::traits::{Demuxer, StreamInfo, TrackType};
use remux_core::error::{Error, OpenError, ReadError};
use remux_core::packet::Packet;
use remux_core::Result;
use tracing::{debug, trace};

/// Outcome of pulling one unit from the source.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A packet belonging to the selected stream, timing untouched.
    Unit(Packet),
    /// A packet belonging to an unselected stream. Not an error; the caller
    /// simply tries again.
    Skipped,
}

/// An open source stream with one selected video sub-stream.
pub struct SourceSession {
    demuxer: Box<dyn Demuxer>,
    selected: usize,
    closed: bool,
}

impl std::fmt::Debug for SourceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSession")
            .field("format", &self.demuxer.format_name())
            .field("selected", &self.selected)
            .field("closed", &self.closed)
            .finish()
    }
}

impl SourceSession {
    /// Open a source by format hint and location through the global format
    /// registry.
    ///
    /// Probes the container's streams and selects the first video stream in
    /// declaration order. Nothing is left open on failure.
    pub fn open(format: &str, location: &str) -> Result<Self> {
        if format.is_empty() {
            return Err(Error::invalid_param("source format must not be empty"));
        }
        if location.is_empty() {
            return Err(Error::invalid_param("source location must not be empty"));
        }
        let demuxer = registry::open_source(format, location)?;
        Self::from_demuxer(demuxer)
    }

    /// Build a session around an already-opened demuxer.
    pub fn from_demuxer(mut demuxer: Box<dyn Demuxer>) -> Result<Self> {
        let selected = match demuxer
            .streams()
            .iter()
            .find(|s| s.track_type == TrackType::Video)
        {
            Some(stream) => stream.index,
            None => {
                demuxer.close();
                return Err(OpenError::NoVideoStream.into());
            }
        };
        debug!(stream = selected, "selected video stream");
        Ok(Self {
            demuxer,
            selected,
            closed: false,
        })
    }

    /// The selected stream's descriptor.
    pub fn selected_stream(&self) -> &StreamInfo {
        &self.demuxer.streams()[self.selected]
    }

    /// Pull exactly one unit from the source.
    ///
    /// End of stream surfaces as `ReadError::EndOfStream`; like every other
    /// read failure it is fatal to the pump loop.
    pub fn read_unit(&mut self) -> Result<ReadOutcome> {
        let packet = self
            .demuxer
            .read_packet()?
            .ok_or(ReadError::EndOfStream)?;

        if packet.stream_index as usize != self.selected {
            trace!(stream = packet.stream_index, "skipping packet from unselected stream");
            return Ok(ReadOutcome::Skipped);
        }

        trace!(
            size = packet.size(),
            pts = %packet.pts,
            dts = %packet.dts,
            "read unit"
        );
        Ok(ReadOutcome::Unit(packet))
    }

    /// Release the underlying demuxer. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.demuxer.close();
            self.closed = true;
            debug!("source session closed");
        }
    }
}

impl Drop for SourceSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remux_containers::memory::MemorySource;
    use remux_containers::traits::{CodecId, CodecParameters};
    use remux_core::timestamp::{TimeBase, Timestamp};

    fn streams_audio_then_video() -> Vec<StreamInfo> {
        vec![
            StreamInfo::audio(0, TimeBase::new(1, 48000), CodecParameters::new(CodecId::Aac)),
            StreamInfo::video(1, TimeBase::MPEG, CodecParameters::new(CodecId::H264)),
        ]
    }

    fn packet_on(stream: u32, dts: i64) -> Packet {
        Packet::new(vec![0u8; 32])
            .with_stream_index(stream)
            .with_dts(Timestamp::new(dts, TimeBase::MPEG))
            .with_pts(Timestamp::new(dts, TimeBase::MPEG))
    }

    #[test]
    fn test_selects_first_video_stream() {
        let source = MemorySource::new(streams_audio_then_video(), Vec::new());
        let session = SourceSession::from_demuxer(Box::new(source)).unwrap();
        assert_eq!(session.selected_stream().index, 1);
        assert_eq!(session.selected_stream().track_type, TrackType::Video);
    }

    #[test]
    fn test_no_video_stream_fails_open() {
        let streams = vec![StreamInfo::audio(
            0,
            TimeBase::new(1, 48000),
            CodecParameters::new(CodecId::Aac),
        )];
        let source = MemorySource::new(streams, Vec::new());
        let err = SourceSession::from_demuxer(Box::new(source)).unwrap_err();
        assert!(matches!(err, Error::Open(OpenError::NoVideoStream)));
    }

    #[test]
    fn test_unselected_packets_are_skipped() {
        let source = MemorySource::new(
            streams_audio_then_video(),
            vec![packet_on(0, 0), packet_on(1, 3000)],
        );
        let mut session = SourceSession::from_demuxer(Box::new(source)).unwrap();

        assert!(matches!(session.read_unit().unwrap(), ReadOutcome::Skipped));
        match session.read_unit().unwrap() {
            ReadOutcome::Unit(p) => assert_eq!(p.stream_index, 1),
            other => panic!("expected unit, got {other:?}"),
        }
    }

    #[test]
    fn test_exhaustion_is_a_read_error() {
        let source = MemorySource::new(streams_audio_then_video(), Vec::new());
        let mut session = SourceSession::from_demuxer(Box::new(source)).unwrap();
        let err = session.read_unit().unwrap_err();
        assert!(err.is_eof());
    }

    #[test]
    fn test_empty_arguments_rejected() {
        assert!(matches!(
            SourceSession::open("", "rtsp://cam/live").unwrap_err(),
            Error::InvalidParameter(_)
        ));
        assert!(matches!(
            SourceSession::open("rtsp", "").unwrap_err(),
            Error::InvalidParameter(_)
        ));
    }
}
