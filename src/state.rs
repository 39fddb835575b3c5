//! Canonical, tool-agnostic device state.

use std::fmt;

use crate::tool::{ToolCategory, ToolClass};

/// Button bits shared by every dialect.
pub const BUTTON_TIP: u32 = 1 << 0;
pub const BUTTON_SIDE_LOWER: u32 = 1 << 1;
pub const BUTTON_SIDE_UPPER: u32 = 1 << 2;

/// Pad and auxiliary keys start above the mouse buttons.
pub const AUX_BUTTON_BASE: u32 = 8;

/// One tool's state at one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    pub tool: ToolCategory,
    pub proximity: bool,
    /// Tip or contact, derived from pressure on tablets without a touch bit.
    pub touch: bool,
    pub x: u32,
    pub y: u32,
    pub pressure: i32,
    pub tilt_x: i32,
    pub tilt_y: i32,
    /// Tenths of a degree, -900..=899.
    pub rotation: i32,
    pub throttle: i32,
    /// Relative wheel delta; reset at the start of every record.
    pub rel_wheel: i32,
    pub abs_wheel: i32,
    pub distance: i32,
    pub strip_x: i32,
    pub strip_y: i32,
    pub buttons: u32,
    pub device_id: u32,
    pub serial: u32,
    /// Suppress the next record: the tool entered with ambiguous data.
    pub discard_first: bool,
}

impl DeviceState {
    /// Clear the fields that only describe a single record.
    pub fn reset_relative(&mut self) {
        self.rel_wheel = 0;
    }

    pub fn class(&self) -> ToolClass {
        self.tool.class()
    }

    /// Set or clear one button bit. Bits beyond the mask width are ignored.
    pub fn set_button(&mut self, bit: u32, pressed: bool) {
        let Some(mask) = 1u32.checked_shl(bit) else {
            log::debug!("Button bit {} out of range", bit);
            return;
        };
        if pressed {
            self.buttons |= mask;
        } else {
            self.buttons &= !mask;
        }
    }

    pub fn button(&self, bit: u32) -> bool {
        1u32.checked_shl(bit).is_some_and(|mask| self.buttons & mask != 0)
    }

    /// Zero every axis and button, keeping the tool identity.
    pub fn clear_axes(&mut self) {
        *self = DeviceState {
            tool: self.tool,
            device_id: self.device_id,
            serial: self.serial,
            ..DeviceState::default()
        };
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x={} y={} p={} tilt=({},{}) rot={} thr={} wheel={}/{} dist={} btn={:#x} id={:#x} serial={:#x}",
            self.tool,
            if self.proximity { "in" } else { "out" },
            self.x,
            self.y,
            self.pressure,
            self.tilt_x,
            self.tilt_y,
            self.rotation,
            self.throttle,
            self.abs_wheel,
            self.rel_wheel,
            self.distance,
            self.buttons,
            self.device_id,
            self.serial,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons() {
        let mut ds = DeviceState::default();
        ds.set_button(0, true);
        ds.set_button(AUX_BUTTON_BASE + 2, true);
        assert_eq!(ds.buttons, 0b1 | (1 << 10));
        assert!(ds.button(10));
        ds.set_button(0, false);
        assert!(!ds.button(0));
        ds.set_button(40, true);
        assert_eq!(ds.buttons, 1 << 10);
    }

    #[test]
    fn test_clear_axes_keeps_identity() {
        let mut ds = DeviceState {
            tool: ToolCategory::Airbrush,
            proximity: true,
            x: 10,
            pressure: 300,
            abs_wheel: 7,
            buttons: 3,
            device_id: 0x912,
            serial: 0xABCD,
            ..Default::default()
        };
        ds.clear_axes();
        assert_eq!(ds.tool, ToolCategory::Airbrush);
        assert_eq!(ds.serial, 0xABCD);
        assert_eq!(ds.device_id, 0x912);
        assert!(!ds.proximity);
        assert_eq!((ds.x, ds.pressure, ds.abs_wheel, ds.buttons), (0, 0, 0, 0));
    }
}
