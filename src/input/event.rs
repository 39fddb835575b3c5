//! Linux `input_event` records and the event codes the USB dialect speaks.

use evdevil::event::{EventType, InputEvent};

/// `struct input_event` on 32-bit hosts (timeval 8 + type 2 + code 2 + value 4).
pub const INPUT_EVENT_SIZE_32: usize = 16;
/// `struct input_event` on 64-bit hosts (timeval 16 + type 2 + code 2 + value 4).
pub const INPUT_EVENT_SIZE_64: usize = 24;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;
pub const EV_MSC: u16 = 0x04;

pub const SYN_REPORT: u16 = 0;
pub const MSC_SERIAL: u16 = 0x00;
pub const REL_WHEEL: u16 = 0x08;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_Z: u16 = 0x02;
pub const ABS_RX: u16 = 0x03;
pub const ABS_RY: u16 = 0x04;
pub const ABS_RZ: u16 = 0x05;
pub const ABS_THROTTLE: u16 = 0x06;
pub const ABS_WHEEL: u16 = 0x08;
pub const ABS_PRESSURE: u16 = 0x18; // 24
pub const ABS_DISTANCE: u16 = 0x19; // 25
pub const ABS_TILT_X: u16 = 0x1a; // 26
pub const ABS_TILT_Y: u16 = 0x1b; // 27
pub const ABS_MISC: u16 = 0x28; // 40

pub const BTN_0: u16 = 0x100;
pub const BTN_1: u16 = 0x101;
pub const BTN_2: u16 = 0x102;
pub const BTN_3: u16 = 0x103;
pub const BTN_4: u16 = 0x104;
pub const BTN_5: u16 = 0x105;
pub const BTN_6: u16 = 0x106;
pub const BTN_7: u16 = 0x107;
pub const BTN_8: u16 = 0x108;
pub const BTN_9: u16 = 0x109;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;
pub const BTN_FORWARD: u16 = 0x115;
pub const BTN_BACK: u16 = 0x116;
pub const BTN_TASK: u16 = 0x117;

pub const BTN_BASE: u16 = 0x126;
pub const BTN_BASE2: u16 = 0x127;
pub const BTN_BASE3: u16 = 0x128;
pub const BTN_BASE4: u16 = 0x129;
pub const BTN_BASE5: u16 = 0x12a;
pub const BTN_BASE6: u16 = 0x12b;

pub const BTN_A: u16 = 0x130;
pub const BTN_B: u16 = 0x131;
pub const BTN_C: u16 = 0x132;
pub const BTN_X: u16 = 0x133;
pub const BTN_Y: u16 = 0x134;
pub const BTN_Z: u16 = 0x135;
pub const BTN_TL: u16 = 0x136;
pub const BTN_TR: u16 = 0x137;
pub const BTN_TL2: u16 = 0x138;
pub const BTN_TR2: u16 = 0x139;
pub const BTN_SELECT: u16 = 0x13a;

pub const BTN_TOOL_PEN: u16 = 0x140;
pub const BTN_TOOL_RUBBER: u16 = 0x141;
pub const BTN_TOOL_BRUSH: u16 = 0x142;
pub const BTN_TOOL_PENCIL: u16 = 0x143;
pub const BTN_TOOL_AIRBRUSH: u16 = 0x144;
pub const BTN_TOOL_FINGER: u16 = 0x145;
pub const BTN_TOOL_MOUSE: u16 = 0x146;
pub const BTN_TOOL_LENS: u16 = 0x147;
pub const BTN_TOUCH: u16 = 0x14a;
pub const BTN_STYLUS: u16 = 0x14b;
pub const BTN_STYLUS2: u16 = 0x14c;

/// Parse a Linux input_event from raw bytes (32-bit or 64-bit layout).
pub fn parse_input_event(buf: &[u8]) -> Option<InputEvent> {
    match buf.len() {
        INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        len if len >= INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        len if len >= INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        _ => None,
    }
}

fn parse_input_event_32(buf: &[u8]) -> Option<InputEvent> {
    let ty = u16::from_le_bytes([buf[8], buf[9]]);
    let code = u16::from_le_bytes([buf[10], buf[11]]);
    let value = i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);

    Some(InputEvent::new(EventType::from_raw(ty), code, value))
}

fn parse_input_event_64(buf: &[u8]) -> Option<InputEvent> {
    let ty = u16::from_le_bytes([buf[16], buf[17]]);
    let code = u16::from_le_bytes([buf[18], buf[19]]);
    let value = i32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);

    Some(InputEvent::new(EventType::from_raw(ty), code, value))
}

/// Build an event from its raw (type, code, value) triple.
pub fn raw_event(ty: u16, code: u16, value: i32) -> InputEvent {
    InputEvent::new(EventType::from_raw(ty), code, value)
}

pub fn key_event(code: u16, value: i32) -> InputEvent {
    raw_event(EV_KEY, code, value)
}

pub fn abs_event(code: u16, value: i32) -> InputEvent {
    raw_event(EV_ABS, code, value)
}

/// Split an event back into its raw (type, code, value) triple.
pub fn triple(ev: &InputEvent) -> (u16, u16, i32) {
    (ev.event_type().raw(), ev.raw_code(), ev.raw_value())
}

/// Human readable name of an event code, for dumps and trace logs.
pub fn code_name(ty: u16, code: u16) -> String {
    match ty {
        EV_SYN => "SYN_REPORT".into(),
        EV_MSC if code == MSC_SERIAL => "MSC_SERIAL".into(),
        EV_REL if code == REL_WHEEL => "REL_WHEEL".into(),
        EV_KEY => {
            let name = match code {
                BTN_LEFT => "LEFT",
                BTN_RIGHT => "RIGHT",
                BTN_MIDDLE => "MIDDLE",
                BTN_SIDE => "SIDE",
                BTN_EXTRA => "EXTRA",
                BTN_TOOL_PEN => "TOOL_PEN",
                BTN_TOOL_RUBBER => "TOOL_RUBBER",
                BTN_TOOL_BRUSH => "TOOL_BRUSH",
                BTN_TOOL_PENCIL => "TOOL_PENCIL",
                BTN_TOOL_AIRBRUSH => "TOOL_AIRBRUSH",
                BTN_TOOL_FINGER => "TOOL_FINGER",
                BTN_TOOL_MOUSE => "TOOL_MOUSE",
                BTN_TOOL_LENS => "TOOL_LENS",
                BTN_TOUCH => "TOUCH",
                BTN_STYLUS => "STYLUS",
                BTN_STYLUS2 => "STYLUS2",
                BTN_0..=BTN_9 => return format!("BTN_{}", code - BTN_0),
                _ => return format!("KEY/{:#x}", code),
            };
            format!("BTN_{}", name)
        }
        EV_ABS => {
            let abs = match code {
                ABS_X => "X",
                ABS_Y => "Y",
                ABS_Z => "Z",
                ABS_RX => "RX",
                ABS_RY => "RY",
                ABS_RZ => "RZ",
                ABS_THROTTLE => "THROTTLE",
                ABS_WHEEL => "WHEEL",
                ABS_PRESSURE => "PRESSURE",
                ABS_DISTANCE => "DISTANCE",
                ABS_TILT_X => "TILT_X",
                ABS_TILT_Y => "TILT_Y",
                ABS_MISC => "MISC",
                _ => "?",
            };
            format!("ABS_{}({})", abs, code)
        }
        _ => format!("type{} code{}", ty, code),
    }
}
