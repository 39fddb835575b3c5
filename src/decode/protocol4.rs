//! Protocol 4 serial frames (PenPartner, Graphire, PL/Cintiq, UD).
//!
//! ```text
//! byte 0  1 P T . B . X15 X14     P proximity, T stylus (1) / cursor (0)
//! byte 1  0 X13..X7
//! byte 2  0 X6..X0
//! byte 3  0 B3 B2 B1 B0 P0 Y15 Y14
//! byte 4  0 Y13..Y7
//! byte 5  0 Y6..Y0
//! byte 6  0 S P6..P1              S pressure sign
//! byte 7  0 S Xt6..Xt1            tilt frames only
//! byte 8  0 S Yt6..Yt1            tilt frames only
//! ```

use crate::accumulate::Accumulator;
use crate::error::DropReason;
use crate::model::{Dialect, ModelDescriptor, PressureLayout};
use crate::state::DeviceState;
use crate::tool::{ToolCategory, ToolClass, ERASER_DEVICE_ID};

const PROXIMITY_BIT: u8 = 0x40;
const POINTER_BIT: u8 = 0x20;
const BUTTONS_BITS: u8 = 0x78;
const ZAXIS_SIGN_BIT: u8 = 0x40;
const ZAXIS_BIT: u8 = 0x04;
const ZAXIS_BITS: u8 = 0x3F;
const TILT_SIGN_BIT: u8 = 0x40;
const TILT_BITS: u8 = 0x3F;

/// Side switch that selects the eraser end of a stylus.
const ERASER_SWITCH: u32 = 0x04;
/// Graphire reports its eraser through B3.
const GRAPHIRE_ERASER: u32 = 0x08;

/// Protocol 4 tablets track a single tool.
const CHANNEL: usize = 0;

/// Byte 0 bit 6.
pub fn proximity(b0: u8) -> bool {
    b0 & PROXIMITY_BIT != 0
}

/// Byte 0 bit 5: set for a stylus, clear for a cursor.
pub fn is_stylus(b0: u8) -> bool {
    b0 & POINTER_BIT != 0
}

/// 16-bit coordinate: bits 15-14 from `high` bits 1-0, then two 7-bit groups.
pub fn coord(high: u8, mid: u8, low: u8) -> u32 {
    ((high as u32 & 0x3) << 14) + ((mid as u32) << 7) + low as u32
}

/// Byte 3 bits 6-3: B3..B0.
pub fn buttons(b3: u8) -> u32 {
    ((b3 & BUTTONS_BITS) >> 3) as u32
}

/// Pressure from byte 6 (magnitude and sign) and byte 3 bit 2 (P0).
///
/// A clear sign bit adds the layout's half-range offset.
pub fn pressure(layout: PressureLayout, frame: &[u8]) -> i32 {
    let magnitude = (frame[6] & ZAXIS_BITS) as i32;
    let p0 = ((frame[3] & ZAXIS_BIT) >> 2) as i32;
    let positive = frame[6] & ZAXIS_SIGN_BIT == 0;

    match layout {
        PressureLayout::Bits7 => magnitude | if positive { 0x40 } else { 0 },
        PressureLayout::Bits8 => (magnitude << 1) | p0 | if positive { 0x80 } else { 0 },
        // the lowest bit is never reported by these tablets
        PressureLayout::Bits9 => (magnitude << 2) + (p0 << 1) + if positive { 0x100 } else { 0 },
    }
}

/// Sign-and-magnitude tilt: bits 5-0 magnitude, bit 6 shifts down by half the range.
pub fn tilt(b: u8, max_tilt: i32) -> i32 {
    let value = (b & TILT_BITS) as i32;
    if b & TILT_SIGN_BIT != 0 {
        value - max_tilt / 2
    } else {
        value
    }
}

/// Graphire cursor wheel in byte 6: bits 5-4 magnitude, bit 6 sign.
pub fn cursor_wheel(b6: u8) -> i32 {
    let value = ((b6 & 0x30) >> 4) as i32;
    if b6 & 0x40 != 0 {
        -value
    } else {
        value
    }
}

/// Tool the frame itself claims, before the entry-freeze rule applies.
fn claimed_tool(stylus: bool, buttons: u32) -> ToolCategory {
    if buttons & GRAPHIRE_ERASER != 0 {
        ToolCategory::Eraser
    } else if !stylus {
        ToolCategory::Mouse2D
    } else if buttons & ERASER_SWITCH != 0 {
        ToolCategory::Eraser
    } else {
        ToolCategory::Pen
    }
}

#[derive(Debug, Clone)]
pub struct Protocol4 {
    pressure: PressureLayout,
    cursor_wheel: bool,
    tilt: bool,
    max_tilt: i32,
}

impl Protocol4 {
    pub fn new(model: &ModelDescriptor) -> Self {
        let (pressure, cursor_wheel) = match model.dialect {
            Dialect::Serial4 {
                pressure,
                cursor_wheel,
            } => (pressure, cursor_wheel),
            _ => (PressureLayout::Bits8, false),
        };
        Self {
            pressure,
            cursor_wheel,
            tilt: model.tilt_enabled,
            max_tilt: model.max_tilt,
        }
    }

    /// Decode one validated frame; every frame produces a record.
    pub fn decode(&mut self, frame: &[u8], acc: &mut Accumulator<'_>) -> Result<(), DropReason> {
        let was_in_proximity = acc.last(CHANNEL).proximity;
        let mut ds = *acc.begin(CHANNEL);

        ds.pressure = pressure(self.pressure, frame);
        ds.buttons = buttons(frame[3]);

        let stylus = is_stylus(frame[0]);
        let claimed = claimed_tool(stylus, ds.buttons);

        ds.proximity = proximity(frame[0]);
        ds.x = coord(frame[0], frame[1], frame[2]);
        ds.y = coord(frame[3], frame[4], frame[5]);

        if self.tilt && stylus && frame.len() >= 9 {
            ds.tilt_x = tilt(frame[7], self.max_tilt);
            ds.tilt_y = tilt(frame[8], self.max_tilt);
        }

        if !was_in_proximity && ds.proximity {
            ds.tool = claimed;
        } else if ds.buttons != 0
            && ds.proximity
            && ds.tool != claimed
            && ds.tool == ToolCategory::Eraser
        {
            // entered with the side switch held: the eraser was a misread
            log::debug!("Eraser at entry was {}, sending eraser proximity-out", claimed);
            let out = DeviceState {
                tool: ToolCategory::Eraser,
                device_id: ERASER_DEVICE_ID,
                ..DeviceState::default()
            };
            acc.emit_state(CHANNEL, out);
            ds.tool = claimed;
        }

        ds.device_id = ds.class().generic_device_id();
        if ds.class() == ToolClass::Eraser {
            // contact comes from the pressure threshold
            ds.buttons = 0;
        }

        if self.cursor_wheel && ds.class() == ToolClass::Cursor {
            ds.rel_wheel = cursor_wheel(frame[6]);
        }

        *acc.work(CHANNEL) = ds;
        acc.emit(CHANNEL);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::Stats;
    use crate::channel::ChannelTable;
    use crate::tool::{CURSOR_DEVICE_ID, STYLUS_DEVICE_ID};

    struct Pkt {
        prox: bool,
        stylus: bool,
        x: u32,
        y: u32,
        buttons: u8,
        z: u8,
        tilt: Option<(u8, u8)>,
    }

    impl Default for Pkt {
        fn default() -> Self {
            Pkt {
                prox: true,
                stylus: true,
                x: 0,
                y: 0,
                buttons: 0,
                z: 0,
                tilt: None,
            }
        }
    }

    impl Pkt {
        fn bytes(&self) -> Vec<u8> {
            let mut f = vec![
                0x80 | if self.prox { 0x40 } else { 0 }
                    | if self.stylus { 0x20 } else { 0 }
                    | ((self.x >> 14) & 3) as u8,
                ((self.x >> 7) & 0x7f) as u8,
                (self.x & 0x7f) as u8,
                (self.buttons << 3) | ((self.y >> 14) & 3) as u8,
                ((self.y >> 7) & 0x7f) as u8,
                (self.y & 0x7f) as u8,
                self.z,
            ];
            if let Some((tx, ty)) = self.tilt {
                f.push(tx);
                f.push(ty);
            }
            f
        }
    }

    fn run(model: &ModelDescriptor, frames: &[Pkt]) -> Vec<(usize, DeviceState)> {
        let mut decoder = Protocol4::new(model);
        let mut channels = ChannelTable::new();
        let mut stats = Stats::default();
        let mut out = Vec::new();
        let mut sink = |ch: usize, ds: DeviceState| out.push((ch, ds));
        let mut acc = Accumulator::new(model, &mut channels, &mut sink, &mut stats);
        for f in frames {
            decoder.decode(&f.bytes(), &mut acc).unwrap();
        }
        drop(acc);
        out
    }

    fn penpartner() -> ModelDescriptor {
        ModelDescriptor::find("serial-penpartner").unwrap()
    }

    #[test]
    fn test_field_extraction() {
        assert_eq!(coord(0x83, 0x7f, 0x7f), 0xFFFF);
        assert_eq!(coord(0x80, 0x01, 0x00), 128);
        assert_eq!(buttons(0x78), 0xF);
        assert_eq!(tilt(0x10, 128), 16);
        assert_eq!(tilt(0x40 | 0x10, 128), -48);
        assert_eq!(cursor_wheel(0x10), 1);
        assert_eq!(cursor_wheel(0x40 | 0x20), -2);
    }

    #[test]
    fn test_pressure_layouts() {
        let mut f = [0x80u8, 0, 0, 0x04, 0, 0, 0x3F];
        assert_eq!(pressure(PressureLayout::Bits8, &f), 0xFF);
        assert_eq!(pressure(PressureLayout::Bits7, &f), 0x7F);
        assert_eq!(pressure(PressureLayout::Bits9, &f), 0x1FE);

        f[6] = ZAXIS_SIGN_BIT | 0x05;
        f[3] = 0;
        assert_eq!(pressure(PressureLayout::Bits8, &f), 10);
        assert_eq!(pressure(PressureLayout::Bits7, &f), 5);
        assert_eq!(pressure(PressureLayout::Bits9, &f), 20);
    }

    #[test]
    fn test_stylus_record() {
        let out = run(
            &penpartner(),
            &[Pkt {
                x: 4321,
                y: 1234,
                buttons: 0x1,
                z: 0x3F,
                ..Default::default()
            }],
        );
        assert_eq!(out.len(), 1);
        let (ch, ds) = out[0];
        assert_eq!(ch, 0);
        assert_eq!((ds.x, ds.y), (4321, 1234));
        assert_eq!(ds.tool, ToolCategory::Pen);
        assert_eq!(ds.device_id, STYLUS_DEVICE_ID);
        assert!(ds.proximity);
        assert!(ds.touch);
    }

    #[test]
    fn test_cursor_record() {
        let out = run(
            &penpartner(),
            &[Pkt {
                stylus: false,
                buttons: 0x2,
                ..Default::default()
            }],
        );
        assert_eq!(out[0].1.tool, ToolCategory::Mouse2D);
        assert_eq!(out[0].1.device_id, CURSOR_DEVICE_ID);
        assert_eq!(out[0].1.buttons, 0x2);
    }

    #[test]
    fn test_eraser_entry_clears_buttons() {
        let out = run(
            &penpartner(),
            &[Pkt {
                buttons: 0x4,
                ..Default::default()
            }],
        );
        let ds = out[0].1;
        assert_eq!(ds.tool, ToolCategory::Eraser);
        assert_eq!(ds.device_id, ERASER_DEVICE_ID);
        assert_eq!(ds.buttons, 0);
    }

    #[test]
    fn test_class_frozen_after_entry() {
        let out = run(
            &penpartner(),
            &[
                Pkt::default(),
                Pkt {
                    buttons: 0x4 | 0x1,
                    ..Default::default()
                },
            ],
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].1.tool, ToolCategory::Pen);
    }

    #[test]
    fn test_eraser_misread_corrected() {
        let out = run(
            &penpartner(),
            &[
                Pkt {
                    buttons: 0x4,
                    ..Default::default()
                },
                Pkt {
                    buttons: 0x1,
                    z: 0x3F,
                    ..Default::default()
                },
            ],
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].1.tool, ToolCategory::Eraser);
        assert!(!out[1].1.proximity);
        assert_eq!(out[2].1.tool, ToolCategory::Pen);
        assert!(out[2].1.proximity);
        assert_eq!(out[2].1.device_id, STYLUS_DEVICE_ID);
    }

    #[test]
    fn test_tilt_only_when_enabled() {
        let model = penpartner().with_tilt(true);
        let out = run(
            &model,
            &[Pkt {
                tilt: Some((0x40 | 0x10, 0x20)),
                ..Default::default()
            }],
        );
        assert_eq!((out[0].1.tilt_x, out[0].1.tilt_y), (-48, 32));

        let out = run(
            &penpartner(),
            &[Pkt {
                tilt: Some((0x40 | 0x10, 0x20)),
                ..Default::default()
            }],
        );
        assert_eq!((out[0].1.tilt_x, out[0].1.tilt_y), (0, 0));
    }

    #[test]
    fn test_graphire_cursor_wheel_and_eraser() {
        let model = ModelDescriptor::find("serial-graphire").unwrap();
        let out = run(
            &model,
            &[
                Pkt {
                    stylus: false,
                    z: 0x40 | 0x10,
                    ..Default::default()
                },
                Pkt {
                    prox: false,
                    stylus: false,
                    ..Default::default()
                },
                Pkt {
                    buttons: 0x8,
                    ..Default::default()
                },
            ],
        );
        assert_eq!(out[0].1.rel_wheel, -1);
        assert_eq!(out[1].1.rel_wheel, 0);
        assert_eq!(out[2].1.tool, ToolCategory::Eraser);
    }
}
