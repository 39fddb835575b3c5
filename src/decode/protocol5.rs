//! Protocol 5 serial frames (Intuos, Intuos2): 9 bytes, two tool channels.
//!
//! Byte 0 bit 0 selects the channel; the remaining header bits select the
//! record type by mask, see [`Record::classify`]. All other bytes carry 7
//! data bits.

use crate::accumulate::Accumulator;
use crate::error::DropReason;
use crate::state::DeviceState;
use crate::tool::ToolCategory;

const PROXIMITY_BIT: u8 = 0x40;
const TILT_SIGN_BIT: u8 = 0x40;
const TILT_BITS: u8 = 0x3F;

/// Rotation values at or above this are clockwise.
const ROTATION_HALF_TURN: i32 = 900;

/// Record types a Protocol 5 header can announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    /// Tool entered proximity: device id and serial number follow.
    Enter,
    Exit,
    /// Pen, eraser or airbrush first packet.
    Pen,
    AirbrushSecond,
    /// 4D mouse, lens cursor or 2D mouse.
    MouseFirst,
    MouseSecond,
}

impl Record {
    /// Match the header masks in wire priority order.
    pub fn classify(b0: u8) -> Option<Record> {
        if b0 & 0xFC == 0xC0 {
            Some(Record::Enter)
        } else if b0 & 0xFE == 0x80 {
            Some(Record::Exit)
        } else if b0 & 0xB8 == 0xA0 {
            Some(Record::Pen)
        } else if b0 & 0xBE == 0xB4 {
            Some(Record::AirbrushSecond)
        } else if b0 & 0xBE == 0xA8 || b0 & 0xBE == 0xB0 {
            Some(Record::MouseFirst)
        } else if b0 & 0xBE == 0xAA {
            Some(Record::MouseSecond)
        } else {
            None
        }
    }
}

/// Byte 0 bit 0.
pub fn channel(b0: u8) -> usize {
    (b0 & 0x01) as usize
}

pub fn proximity(b0: u8) -> bool {
    b0 & PROXIMITY_BIT != 0
}

/// Enter record: 12-bit tool id from byte 1 bits 6-0 (id 11-5) and
/// byte 2 bits 6-2 (id 4-0).
pub fn device_id(f: &[u8]) -> u32 {
    ((f[1] as u32 & 0x7f) << 5) | ((f[2] as u32 & 0x7c) >> 2)
}

/// Enter record: 32-bit serial from byte 2 bits 1-0, five 7-bit groups in
/// bytes 3-6 and byte 7 bits 6-5.
pub fn serial(f: &[u8]) -> u32 {
    ((f[2] as u32 & 0x03) << 30)
        | ((f[3] as u32 & 0x7f) << 23)
        | ((f[4] as u32 & 0x7f) << 16)
        | ((f[5] as u32 & 0x7f) << 9)
        | ((f[6] as u32 & 0x7f) << 2)
        | ((f[7] as u32 & 0x60) >> 5)
}

/// X: byte 1 bits 6-0 (x 15-9), byte 2 bits 6-0 (x 8-2), byte 3 bits 6-5 (x 1-0).
pub fn x(f: &[u8]) -> u32 {
    ((f[1] as u32 & 0x7f) << 9) | ((f[2] as u32 & 0x7f) << 2) | ((f[3] as u32 & 0x60) >> 5)
}

/// Y: byte 3 bits 4-0 (y 15-11), byte 4 bits 6-0 (y 10-4), byte 5 bits 6-3 (y 3-0).
pub fn y(f: &[u8]) -> u32 {
    ((f[3] as u32 & 0x1f) << 11) | ((f[4] as u32 & 0x7f) << 4) | ((f[5] as u32 & 0x78) >> 3)
}

/// 10-bit value in byte 5 bits 2-0 and byte 6 bits 6-0: pressure on pen
/// packets, wheel on airbrush packets, throttle magnitude on 4D mice.
pub fn ten_bit(f: &[u8]) -> i32 {
    ((f[5] as i32 & 0x07) << 7) | (f[6] as i32 & 0x7f)
}

/// Tilt byte: bits 5-0 magnitude, bit 6 sign (subtracts 64).
pub fn tilt(b: u8) -> i32 {
    let value = (b & TILT_BITS) as i32;
    if b & TILT_SIGN_BIT != 0 {
        value - (TILT_BITS as i32 + 1)
    } else {
        value
    }
}

/// 4D mouse rotation raw value: byte 6 bits 3-0 and byte 7 bits 6-0.
pub fn rotation_raw(f: &[u8]) -> i32 {
    ((f[6] as i32 & 0x0f) << 7) | (f[7] as i32 & 0x7f)
}

/// Map the 0..1799 wire rotation onto -900..899.
pub fn rotation(raw: i32) -> i32 {
    if raw < ROTATION_HALF_TURN {
        -raw
    } else {
        1799 - raw
    }
}

/// 4D mouse buttons: byte 8 bits 6-4 become bits 5-3, bits 2-0 stay.
pub fn mouse4d_buttons(b8: u8) -> u32 {
    (((b8 & 0x70) >> 1) | (b8 & 0x07)) as u32
}

/// 4D mouse throttle, negative when byte 8 bit 3 is set.
pub fn throttle(f: &[u8]) -> i32 {
    let value = ten_bit(f);
    if f[8] & 0x08 != 0 {
        -value
    } else {
        value
    }
}

/// 2D mouse buttons: byte 8 bits 4-2.
pub fn mouse2d_buttons(b8: u8) -> u32 {
    ((b8 & 0x1C) >> 2) as u32
}

/// 2D mouse wheel: byte 8 bit 1 up, bit 0 down.
pub fn mouse2d_wheel(b8: u8) -> i32 {
    -((b8 & 1) as i32) + ((b8 & 2) >> 1) as i32
}

/// Tools that enter without a clean first packet (everything but pens).
fn ambiguous_entry(device_id: u32) -> bool {
    device_id & 0xF06 != 0x802
}

#[derive(Debug, Clone, Default)]
pub struct Protocol5;

impl Protocol5 {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&mut self, f: &[u8], acc: &mut Accumulator<'_>) -> Result<(), DropReason> {
        let index = channel(f[0]);
        let Some(record) = Record::classify(f[0]) else {
            log::debug!("Unknown Protocol 5 header {:#04x}", f[0]);
            return Err(DropReason::UnknownRecord(f[0]));
        };

        let ds = acc.begin(index);
        log::trace!("ch{} {:?} record", index, record);

        let emit = match record {
            // enter only seeds the channel; a 4D mouse then stays quiet until
            // its first rotation packet clears `discard_first`
            Record::Enter => {
                let device_id = device_id(f);
                *ds = DeviceState {
                    proximity: true,
                    device_id,
                    serial: serial(f),
                    discard_first: ambiguous_entry(device_id),
                    tool: ToolCategory::from_device_id(device_id),
                    ..DeviceState::default()
                };
                log::debug!(
                    "ch{} enter: {} id={:#05x} serial={:#x}",
                    index,
                    ds.tool,
                    ds.device_id,
                    ds.serial
                );
                return Ok(());
            }
            Record::Exit => {
                ds.clear_axes();
                true
            }
            Record::Pen | Record::AirbrushSecond => {
                ds.x = x(f);
                ds.y = y(f);
                if record == Record::Pen {
                    ds.pressure = ten_bit(f);
                    ds.buttons = (f[0] & 0x06) as u32;
                } else {
                    ds.abs_wheel = ten_bit(f);
                }
                ds.tilt_x = tilt(f[7]);
                ds.tilt_y = tilt(f[8]);
                ds.proximity = proximity(f[0]);
                true
            }
            Record::MouseFirst => {
                ds.x = x(f);
                ds.y = y(f);
                ds.tilt_y = 0;
                let emit = match ds.tool {
                    ToolCategory::Mouse4D => {
                        ds.throttle = throttle(f);
                        ds.buttons = mouse4d_buttons(f[8]);
                        !ds.discard_first
                    }
                    ToolCategory::LensCursor => {
                        ds.buttons = f[8] as u32;
                        true
                    }
                    ToolCategory::Mouse2D => {
                        ds.buttons = mouse2d_buttons(f[8]);
                        ds.rel_wheel = mouse2d_wheel(f[8]);
                        true
                    }
                    _ => false,
                };
                ds.proximity = proximity(f[0]);
                emit
            }
            Record::MouseSecond => {
                ds.x = x(f);
                ds.y = y(f);
                ds.rotation = rotation(rotation_raw(f));
                ds.proximity = proximity(f[0]);
                ds.discard_first = false;
                true
            }
        };

        if emit {
            acc.emit(index);
            Ok(())
        } else {
            Err(DropReason::Suppressed)
        }
    }
}
