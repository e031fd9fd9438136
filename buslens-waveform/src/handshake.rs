use crate::signal::{EdgeKind, EdgePolarity, SignalCursor};

const RISING: EdgeKind = EdgeKind::Polarity(EdgePolarity::Rising);

/// The timestamp of the next clock cycle at which `valid` and `ready` are
/// both asserted, starting from the ready cursor's last known position.
///
/// The valid sample is checked before searching for a valid edge:
/// back-to-back transfers keep `valid` high with no intervening edge, so
/// the level at the clock edge is what counts.
pub fn next_handshake(
    clock: &mut SignalCursor,
    valid: &mut SignalCursor,
    ready: &mut SignalCursor,
) -> Option<u64> {
    // Re-anchor the clock to wherever the previous handshake left `ready`.
    // The anchor never moves the clock backward: with both sides held
    // asserted the clock cursor is what paces successive handshakes.
    let anchor = ready.current_timestamp().max(clock.current_timestamp());
    clock.value_at(anchor, true);
    let clock_timestamp = clock.next_edge(&RISING, true)?.timestamp;

    let valid_timestamp = match valid.value_at(clock_timestamp, true) {
        Some(sample) if sample.value.is_one() => clock_timestamp,
        _ => valid.next_edge(&RISING, true)?.timestamp,
    };

    let handshake_timestamp = match ready.value_at(valid_timestamp, true) {
        Some(sample) if sample.value.is_one() => valid_timestamp,
        _ => ready.next_edge(&RISING, true)?.timestamp,
    };

    let edge = clock.edge_at(handshake_timestamp, EdgePolarity::Rising, true)?;
    Some(edge.timestamp)
}
