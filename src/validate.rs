//! Frame synchronisation for the fixed-length serial dialects.

/// Set on the first byte of every serial frame and clear on all others.
pub const SYNC_BIT: u8 = 0x80;

/// Check a frame of `len` bytes at the start of `data`.
///
/// Returns 0 for a well-formed frame. Otherwise returns how many bytes to
/// drop before trying again: the offset of the first later byte carrying the
/// sync bit (it may start the next frame), or the whole frame length when no
/// such byte exists.
pub fn validate(data: &[u8], len: usize) -> usize {
    let frame = &data[..len.min(data.len())];
    let mut bad = false;

    for (i, &b) in frame.iter().enumerate() {
        let sync = b & SYNC_BIT != 0;
        if i == 0 && !sync {
            bad = true;
            log::warn!("Frame missing sync bit at 0 (v={:#04x} len={})", b, len);
        } else if i != 0 && sync {
            if i != 1 {
                log::warn!("Unexpected sync bit at {} (v={:#04x} len={})", i, b, len);
            }
            return i;
        }
    }

    if bad {
        len
    } else {
        0
    }
}
