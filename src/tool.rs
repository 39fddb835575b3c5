//! Tool identity: raw device-id codes and tool keys to logical tool categories.

use std::fmt;

use crate::input::event::{
    BTN_TOOL_AIRBRUSH, BTN_TOOL_BRUSH, BTN_TOOL_FINGER, BTN_TOOL_LENS, BTN_TOOL_MOUSE,
    BTN_TOOL_PEN, BTN_TOOL_PENCIL, BTN_TOOL_RUBBER,
};

/// Generic device ids reported by tablets without per-tool identification.
pub const STYLUS_DEVICE_ID: u32 = 0x02;
pub const CURSOR_DEVICE_ID: u32 = 0x06;
pub const ERASER_DEVICE_ID: u32 = 0x0A;
pub const PAD_DEVICE_ID: u32 = 0x0F;

/// The closed set of logical tools a tablet can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolCategory {
    #[default]
    Pen,
    Pencil,
    Brush,
    Airbrush,
    Mouse4D,
    Mouse2D,
    LensCursor,
    Eraser,
    Pad,
}

/// Coarse class used to route a record to one logical input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolClass {
    Stylus,
    Eraser,
    Cursor,
    Pad,
}

impl ToolCategory {
    /// Resolve a 12-bit device-id code. Codes outside the table are pens.
    pub fn from_device_id(code: u32) -> Self {
        match code {
            // inking pens
            0x812 | 0x801 | 0x012 => ToolCategory::Pencil,
            // standard pens (grip, classic, marker)
            0x822 | 0x842 | 0x852 | 0x823 | 0x813 | 0x885 | 0x022 => ToolCategory::Pen,
            // stroke pens
            0x832 | 0x032 => ToolCategory::Brush,
            0x094 | 0x09C => ToolCategory::Mouse4D,
            0x007 | 0x017 => ToolCategory::Mouse2D,
            0x096 | 0x097 => ToolCategory::LensCursor,
            0x82A | 0x85A | 0x91A | 0xD1A | 0x0FA | 0x82B | 0x81B | 0x91B => ToolCategory::Eraser,
            0xD12 | 0x912 | 0x112 | 0x913 => ToolCategory::Airbrush,
            _ => {
                log::debug!("Unknown tool id {:#05x}, assuming pen", code);
                ToolCategory::Pen
            }
        }
    }

    /// Category announced by a `BTN_TOOL_*` key, if `code` is one.
    ///
    /// Mouse keys resolve through `device_id` so a 4D mouse stays a 4D mouse;
    /// generic cursor ids fall back to a 2D mouse.
    pub fn from_tool_key(code: u16, device_id: u32) -> Option<Self> {
        let category = match code {
            BTN_TOOL_PEN => ToolCategory::Pen,
            BTN_TOOL_PENCIL => ToolCategory::Pencil,
            BTN_TOOL_BRUSH => ToolCategory::Brush,
            BTN_TOOL_AIRBRUSH => ToolCategory::Airbrush,
            BTN_TOOL_RUBBER => ToolCategory::Eraser,
            BTN_TOOL_LENS => ToolCategory::LensCursor,
            BTN_TOOL_FINGER => ToolCategory::Pad,
            BTN_TOOL_MOUSE => ToolCategory::mouse_from_id(device_id).unwrap_or(ToolCategory::Mouse2D),
            _ => return None,
        };
        Some(category)
    }

    /// The `BTN_TOOL_*` key a kernel driver reports for this category.
    pub fn tool_key(self) -> u16 {
        match self {
            ToolCategory::Pen => BTN_TOOL_PEN,
            ToolCategory::Pencil => BTN_TOOL_PENCIL,
            ToolCategory::Brush => BTN_TOOL_BRUSH,
            ToolCategory::Airbrush => BTN_TOOL_AIRBRUSH,
            ToolCategory::Mouse4D | ToolCategory::Mouse2D => BTN_TOOL_MOUSE,
            ToolCategory::LensCursor => BTN_TOOL_LENS,
            ToolCategory::Eraser => BTN_TOOL_RUBBER,
            ToolCategory::Pad => BTN_TOOL_FINGER,
        }
    }

    pub fn class(self) -> ToolClass {
        match self {
            ToolCategory::Pen
            | ToolCategory::Pencil
            | ToolCategory::Brush
            | ToolCategory::Airbrush => ToolClass::Stylus,
            ToolCategory::Mouse4D | ToolCategory::Mouse2D | ToolCategory::LensCursor => {
                ToolClass::Cursor
            }
            ToolCategory::Eraser => ToolClass::Eraser,
            ToolCategory::Pad => ToolClass::Pad,
        }
    }

    pub fn is_cursor(self) -> bool {
        self.class() == ToolClass::Cursor
    }

    fn mouse_from_id(code: u32) -> Option<Self> {
        match code {
            0x094 | 0x09C => Some(ToolCategory::Mouse4D),
            0x007 | 0x017 => Some(ToolCategory::Mouse2D),
            _ => None,
        }
    }
}

impl ToolClass {
    /// Device id reported for this class by tablets without tool ids.
    pub fn generic_device_id(self) -> u32 {
        match self {
            ToolClass::Stylus => STYLUS_DEVICE_ID,
            ToolClass::Eraser => ERASER_DEVICE_ID,
            ToolClass::Cursor => CURSOR_DEVICE_ID,
            ToolClass::Pad => PAD_DEVICE_ID,
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolCategory::Pen => "pen",
            ToolCategory::Pencil => "pencil",
            ToolCategory::Brush => "brush",
            ToolCategory::Airbrush => "airbrush",
            ToolCategory::Mouse4D => "mouse-4d",
            ToolCategory::Mouse2D => "mouse-2d",
            ToolCategory::LensCursor => "lens-cursor",
            ToolCategory::Eraser => "eraser",
            ToolCategory::Pad => "pad",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ToolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolClass::Stylus => write!(f, "stylus"),
            ToolClass::Eraser => write!(f, "eraser"),
            ToolClass::Cursor => write!(f, "cursor"),
            ToolClass::Pad => write!(f, "pad"),
        }
    }
}
