//! Packet abstractions for compressed media data.
//!
//! A packet is one compressed access unit plus its timing metadata. Packets
//! move through the remux pipeline unmodified except for container-level
//! metadata: stream index, timestamps, and the byte position hint.

use crate::timestamp::{Duration, Timestamp};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Flags for packet properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u32 {
        /// This packet contains a keyframe. Fragmented destinations start a
        /// new fragment here.
        const KEYFRAME = 0x0001;
        /// Packet data is corrupted.
        const CORRUPT = 0x0002;
        /// Packet should be discarded.
        const DISCARD = 0x0004;
    }
}

/// A compressed media packet.
#[derive(Clone)]
pub struct Packet {
    /// The packet payload. Opaque to the pipeline; only its size is observed.
    data: Vec<u8>,
    /// Presentation timestamp.
    pub pts: Timestamp,
    /// Decode timestamp.
    pub dts: Timestamp,
    /// Duration of the packet.
    pub duration: Duration,
    /// Stream index this packet belongs to.
    pub stream_index: u32,
    /// Packet flags.
    pub flags: PacketFlags,
    /// Byte position hint in the owning container, if known.
    pub pos: Option<u64>,
}

impl Packet {
    /// Create a new packet with the given payload.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pts: Timestamp::none(),
            dts: Timestamp::none(),
            duration: Duration::zero(),
            stream_index: 0,
            flags: PacketFlags::empty(),
            pos: None,
        }
    }

    /// Create an empty packet.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Set the presentation timestamp.
    pub fn with_pts(mut self, pts: Timestamp) -> Self {
        self.pts = pts;
        self
    }

    /// Set the decode timestamp.
    pub fn with_dts(mut self, dts: Timestamp) -> Self {
        self.dts = dts;
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the stream index.
    pub fn with_stream_index(mut self, index: u32) -> Self {
        self.stream_index = index;
        self
    }

    /// Mark this packet as a keyframe.
    pub fn with_keyframe(mut self, keyframe: bool) -> Self {
        self.flags.set(PacketFlags::KEYFRAME, keyframe);
        self
    }

    /// Get the packet payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Check if this packet contains a keyframe.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(PacketFlags::KEYFRAME)
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("size", &self.size())
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("duration", &self.duration.value)
            .field("stream_index", &self.stream_index)
            .field("flags", &self.flags)
            .field("pos", &self.pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::TimeBase;

    #[test]
    fn test_new_packet_has_unset_timing() {
        let packet = Packet::new(vec![0u8; 64]);
        assert!(!packet.pts.is_valid());
        assert!(!packet.dts.is_valid());
        assert!(packet.duration.is_zero());
        assert_eq!(packet.size(), 64);
        assert_eq!(packet.pos, None);
    }

    #[test]
    fn test_builder_style_setters() {
        let tb = TimeBase::MPEG;
        let packet = Packet::new(vec![1, 2, 3])
            .with_pts(Timestamp::new(9000, tb))
            .with_dts(Timestamp::new(6000, tb))
            .with_duration(Duration::new(3000, tb))
            .with_stream_index(1)
            .with_keyframe(true);

        assert_eq!(packet.pts.value, 9000);
        assert_eq!(packet.dts.value, 6000);
        assert_eq!(packet.duration.value, 3000);
        assert_eq!(packet.stream_index, 1);
        assert!(packet.is_keyframe());
    }

    #[test]
    fn test_keyframe_flag_clears() {
        let packet = Packet::empty().with_keyframe(true).with_keyframe(false);
        assert!(!packet.is_keyframe());
    }
}
