//! Timestamp repair and rescaling.
//!
//! Live sources are frequently non-conformant: decode timestamps reset, jump
//! backward, or go missing mid-stream, while the fragmented destination
//! format hard-rejects any non-monotonic sequence. Before each commit the
//! packet's timing is either repaired onto a synthetic monotonic timeline or,
//! when already well-formed, rescaled untouched into the destination time
//! base.

use remux_core::packet::Packet;
use remux_core::timestamp::{TimeBase, Timestamp};

/// Repair and rescale a packet's timing in place.
///
/// `last_dts` is the decode timestamp of the previous committed packet, in
/// the destination time base, or unset before the first commit. After this
/// call the packet's PTS/DTS/duration are in the destination time base, its
/// DTS is set and strictly greater than `last_dts`, its PTS is at least its
/// DTS, and its position hint is cleared.
pub fn correct(packet: &mut Packet, src: TimeBase, dst: TimeBase, last_dts: Timestamp) {
    debug_assert!(!last_dts.is_valid() || last_dts.time_base == dst);

    let raw_pts = Timestamp::new(packet.pts.value, src);
    let raw_dts = Timestamp::new(packet.dts.value, src);
    let rescaled_pts = raw_pts.rescale(dst);
    let rescaled_dts = raw_dts.rescale(dst);

    // The decode timeline needs repair when the source DTS went missing or
    // would not land strictly after the previous committed DTS.
    let needs_repair = last_dts.is_valid()
        && (!rescaled_dts.is_valid() || rescaled_dts.value <= last_dts.value);

    if needs_repair {
        let dts = Timestamp::new(last_dts.value + 1, dst);
        // Keep presentation at or after decode. A raw PTS that already
        // ordered correctly against its raw DTS is preserved where possible;
        // anything else collapses onto the repaired DTS.
        let pts = if raw_pts.is_valid()
            && rescaled_dts.is_valid()
            && rescaled_pts.value >= rescaled_dts.value
        {
            Timestamp::new(rescaled_pts.value.max(dts.value), dst)
        } else {
            dts
        };
        packet.pts = pts;
        packet.dts = dts;
    } else {
        packet.pts = if rescaled_pts.is_valid() {
            rescaled_pts
        } else {
            Timestamp::new(0, dst)
        };
        packet.dts = if rescaled_dts.is_valid() {
            rescaled_dts
        } else {
            Timestamp::new(0, dst)
        };
    }

    packet.duration = packet.duration.rescale(dst);

    // The source byte offset means nothing in the destination.
    packet.pos = None;
}
