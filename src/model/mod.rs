//! Static per-model configuration: wire dialect, ranges and capabilities.

mod serial;
mod usb;

pub use serial::{detect as detect_serial, parse_coord_answer, SERIAL_MODELS};
pub use usb::{find_usb, DTF720_PRODUCT_ID, GENERIC_USB, USB_MODELS};

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::input::event::{
    BTN_0, BTN_1, BTN_2, BTN_3, BTN_4, BTN_5, BTN_6, BTN_7, BTN_8, BTN_9, BTN_A, BTN_B, BTN_BASE,
    BTN_BASE2, BTN_BASE3, BTN_BASE4, BTN_BASE5, BTN_BASE6, BTN_C, BTN_SELECT, BTN_TL, BTN_TL2,
    BTN_TR, BTN_TR2, BTN_X, BTN_Y, BTN_Z,
};

/// Tilt range reported by every tilt-capable tablet (-64..=63 after centering).
pub const MAX_TILT: i32 = 128;

/// Pad key codes in the order their button bits are assigned.
pub const PADKEY_CODES: [u16; 27] = [
    BTN_0, BTN_1, BTN_2, BTN_3, BTN_4, BTN_5, BTN_6, BTN_7, BTN_8, BTN_9, BTN_A, BTN_B, BTN_C,
    BTN_X, BTN_Y, BTN_Z, BTN_BASE, BTN_BASE2, BTN_BASE3, BTN_BASE4, BTN_BASE5, BTN_BASE6, BTN_TL,
    BTN_TR, BTN_TL2, BTN_TR2, BTN_SELECT,
];

/// Pressure encodings used by Protocol 4 serial tablets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureLayout {
    /// 6 bits + sign (max 120 / 127 class tablets).
    Bits7,
    /// 7 bits + sign (max 255).
    Bits8,
    /// 8 bits + sign (Graphire, PL-550/PL-800).
    Bits9,
}

impl PressureLayout {
    /// Layout implied by a tablet's pressure range.
    pub fn for_max_pressure(max: i32) -> Self {
        match max {
            255 => PressureLayout::Bits8,
            m if m > 255 => PressureLayout::Bits9,
            _ => PressureLayout::Bits7,
        }
    }
}

/// USB report families; each has its own HID report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbFamily {
    PenPartner,
    Graphire,
    Graphire4,
    BambooFun,
    Pl,
    CintiqPartner,
    Intuos,
    Intuos3S,
    Intuos3,
    Intuos3L,
    Cintiq,
    CintiqWide,
}

impl UsbFamily {
    /// Intuos-class tablets identify tools by serial number.
    pub fn protocol(self) -> ProtocolLevel {
        match self {
            UsbFamily::Intuos
            | UsbFamily::Intuos3S
            | UsbFamily::Intuos3
            | UsbFamily::Intuos3L
            | UsbFamily::Cintiq
            | UsbFamily::CintiqWide => ProtocolLevel::Five,
            _ => ProtocolLevel::Four,
        }
    }

    /// Intuos3 generation: 17-bit coordinates, 6-bit distance.
    pub fn is_intuos3_class(self) -> bool {
        matches!(
            self,
            UsbFamily::Intuos3S
                | UsbFamily::Intuos3
                | UsbFamily::Intuos3L
                | UsbFamily::Cintiq
                | UsbFamily::CintiqWide
        )
    }

    pub const fn capabilities(self) -> Capabilities {
        match self {
            UsbFamily::PenPartner => Capabilities::PENPARTNER_SET,
            UsbFamily::Graphire => Capabilities::GRAPHIRE_SET,
            UsbFamily::Graphire4 => Capabilities::GRAPHIRE4_SET,
            UsbFamily::BambooFun => Capabilities::BAMBOO_FUN_SET,
            UsbFamily::Pl | UsbFamily::CintiqPartner => Capabilities::PL_SET,
            UsbFamily::Intuos => Capabilities::INTUOS_SET,
            UsbFamily::Intuos3S => Capabilities::INTUOS3S_SET,
            UsbFamily::Intuos3 | UsbFamily::Intuos3L | UsbFamily::Cintiq | UsbFamily::CintiqWide => {
                Capabilities::INTUOS3_SET
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolLevel {
    Four,
    Five,
}

/// Wire dialect and the layout parameters it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// 7-byte serial frames (9 with tilt).
    Serial4 {
        pressure: PressureLayout,
        /// Cursor reports a relative wheel in the pressure byte.
        cursor_wheel: bool,
    },
    /// 9-byte serial frames, two multiplexed tool channels.
    Serial5,
    /// USB: raw HID reports or the kernel's input event stream.
    Usb(UsbFamily),
}

impl Dialect {
    pub fn protocol(self) -> ProtocolLevel {
        match self {
            Dialect::Serial4 { .. } => ProtocolLevel::Four,
            Dialect::Serial5 => ProtocolLevel::Five,
            Dialect::Usb(family) => family.protocol(),
        }
    }
}

/// Which event closes a record in a USB event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerMode {
    /// MSC_SERIAL ends the record (2.4-era kernels).
    #[default]
    Serial,
    /// SYN_REPORT ends the record; MSC_SERIAL only carries the serial.
    Report,
}

impl FromStr for MarkerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "serial" | "msc" | "msc-serial" => Ok(MarkerMode::Serial),
            "report" | "syn" | "syn-report" => Ok(MarkerMode::Report),
            _ => Err(format!("Invalid marker '{}'. Valid values: serial, report", s)),
        }
    }
}

/// Per-model corrections applied while assembling a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaling {
    /// Added to the raw pressure to obtain the unsigned canonical axis.
    pub pressure_bias: i32,
    /// Pressure at or above this value means the tip is in contact.
    pub touch_threshold: i32,
}

impl Scaling {
    pub const fn for_pressure(max_pressure: i32) -> Self {
        Self::biased(max_pressure, 0)
    }

    pub const fn biased(max_pressure: i32, pressure_bias: i32) -> Self {
        Self {
            pressure_bias,
            touch_threshold: max_pressure * 3 / 50,
        }
    }

    pub fn pressure(&self, raw: i32) -> i32 {
        raw + self.pressure_bias
    }

    pub fn touching(&self, pressure: i32) -> bool {
        pressure >= self.touch_threshold
    }
}

/// Capabilities a tablet advertises, composed from small named sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const PEN: Self = Self(1 << 0);
    pub const ERASER: Self = Self(1 << 1);
    pub const STYLUS2: Self = Self(1 << 2);
    pub const MOUSE: Self = Self(1 << 3);
    pub const MOUSE_SIDE: Self = Self(1 << 4);
    pub const REL_WHEEL: Self = Self(1 << 5);
    pub const ABS_WHEEL: Self = Self(1 << 6);
    pub const DISTANCE: Self = Self(1 << 7);
    pub const TILT: Self = Self(1 << 8);
    pub const ROTATION: Self = Self(1 << 9);
    pub const THROTTLE: Self = Self(1 << 10);
    /// Pencil, brush, airbrush and lens cursor tools.
    pub const TOOL_KINDS: Self = Self(1 << 11);
    pub const SERIALS: Self = Self(1 << 12);
    /// BTN_0 and BTN_4 (Graphire4 pad).
    pub const PAD_0_4: Self = Self(1 << 13);
    /// BTN_1 and BTN_5 (BambooFun pad).
    pub const PAD_1_5: Self = Self(1 << 14);
    pub const PAD_0_3: Self = Self(1 << 15);
    pub const PAD_4_7: Self = Self(1 << 16);
    pub const STRIP_X: Self = Self(1 << 17);
    pub const STRIP_Y: Self = Self(1 << 18);

    pub const PENPARTNER_SET: Self = Self::PEN.union(Self::ERASER);
    pub const PL_SET: Self = Self::PENPARTNER_SET.union(Self::STYLUS2);
    pub const GRAPHIRE_SET: Self = Self::PL_SET
        .union(Self::MOUSE)
        .union(Self::REL_WHEEL)
        .union(Self::DISTANCE);
    pub const GRAPHIRE4_SET: Self = Self::GRAPHIRE_SET.union(Self::SERIALS).union(Self::PAD_0_4);
    pub const BAMBOO_FUN_SET: Self = Self::GRAPHIRE4_SET
        .union(Self::PAD_1_5)
        .union(Self::ABS_WHEEL);
    pub const INTUOS_SET: Self = Self::GRAPHIRE_SET
        .union(Self::SERIALS)
        .union(Self::MOUSE_SIDE)
        .union(Self::TOOL_KINDS)
        .union(Self::ABS_WHEEL)
        .union(Self::TILT)
        .union(Self::ROTATION)
        .union(Self::THROTTLE);
    pub const INTUOS3S_SET: Self = Self::INTUOS_SET.union(Self::PAD_0_3).union(Self::STRIP_X);
    pub const INTUOS3_SET: Self = Self::INTUOS3S_SET.union(Self::PAD_4_7).union(Self::STRIP_Y);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the tablet reports the pad key `code`.
    pub fn has_pad_key(self, code: u16) -> bool {
        let groups = match code {
            BTN_0 => Self::PAD_0_4.union(Self::PAD_0_3),
            BTN_1 => Self::PAD_1_5.union(Self::PAD_0_3),
            BTN_2 | BTN_3 => Self::PAD_0_3,
            BTN_4 => Self::PAD_0_4.union(Self::PAD_4_7),
            BTN_5 => Self::PAD_1_5.union(Self::PAD_4_7),
            BTN_6 | BTN_7 => Self::PAD_4_7,
            _ => return false,
        };
        self.0 & groups.0 != 0
    }

    /// The tablet's auxiliary key table: index n maps to button bit 8+n.
    pub fn aux_keys(self) -> Vec<u16> {
        PADKEY_CODES
            .iter()
            .copied()
            .filter(|&code| self.has_pad_key(code))
            .collect()
    }

    /// Number of tool buttons, counting the mouse side buttons when present.
    pub fn button_count(self) -> u32 {
        if self.contains(Self::MOUSE_SIDE) {
            7
        } else {
            5
        }
    }
}

/// Read-only description of one tablet model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelDescriptor {
    /// Stable lookup key, e.g. `serial-intuos2` or `usb-0xb2`.
    pub key: &'static str,
    pub name: &'static str,
    pub dialect: Dialect,
    /// Fixed frame or report length in bytes.
    pub packet_len: usize,
    pub max_x: u32,
    pub max_y: u32,
    pub max_pressure: i32,
    pub max_distance: i32,
    pub max_tilt: i32,
    /// Points per inch.
    pub resolution: u32,
    pub tilt_enabled: bool,
    pub capabilities: Capabilities,
    pub scaling: Scaling,
    /// Initial end-of-record marker for USB event streams.
    pub marker: MarkerMode,
    pub product_id: Option<u16>,
}

impl ModelDescriptor {
    /// Look a model up by key, full name, `usb:<product id>` or a serial
    /// `~#` model answer.
    pub fn find(name: &str) -> Option<Self> {
        if name.trim_start().starts_with("~#") {
            return Some(detect_serial(name));
        }
        let wanted = name.trim().to_lowercase();

        if let Some(pid) = wanted
            .strip_prefix("usb:")
            .or_else(|| wanted.strip_prefix("usb-"))
        {
            let pid = pid.trim_start_matches("0x");
            return u16::from_str_radix(pid, 16).ok().map(find_usb);
        }

        SERIAL_MODELS
            .iter()
            .chain(USB_MODELS.iter())
            .find(|m| m.key == wanted || m.name.to_lowercase() == wanted)
            .copied()
    }

    /// Serial frame length including the optional tilt bytes.
    pub fn frame_len(&self) -> usize {
        match self.dialect {
            Dialect::Serial4 { .. } if self.tilt_enabled => 9,
            _ => self.packet_len,
        }
    }

    /// Protocol 4 frames change their pressure encoding with the range.
    pub fn with_max_pressure(mut self, max: i32) -> Self {
        self.max_pressure = max;
        self.scaling = Scaling::biased(max, self.scaling.pressure_bias);
        if let Dialect::Serial4 { pressure, .. } = &mut self.dialect {
            *pressure = PressureLayout::for_max_pressure(max);
        }
        self
    }

    pub fn with_tilt(mut self, enabled: bool) -> Self {
        self.tilt_enabled = enabled;
        self
    }

    pub fn with_marker(mut self, marker: MarkerMode) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_ranges(mut self, max_x: u32, max_y: u32) -> Self {
        self.max_x = max_x;
        self.max_y = max_y;
        self
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<20} {:<24} {}x{} p{} len{}",
            self.key, self.name, self.max_x, self.max_y, self.max_pressure, self.packet_len
        )
    }
}
