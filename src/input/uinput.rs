//! Virtual evdev devices fed with decoded records, one per logical tool.

use evdevil::event::{Abs, InputEvent, Key, Rel};
use evdevil::uinput::{AbsSetup, UinputDevice};
use evdevil::{AbsInfo, Bus, InputId, InputProp};

use crate::emit::{Emit, ToolHandle};
use crate::error::Result;
use crate::model::{Capabilities, ModelDescriptor};
use crate::state::{DeviceState, AUX_BUTTON_BASE};
use crate::tool::{ToolCategory, ToolClass};

use super::event::{
    abs_event, key_event, raw_event, ABS_DISTANCE, ABS_MISC, ABS_PRESSURE, ABS_RX, ABS_RY,
    ABS_RZ, ABS_THROTTLE, ABS_TILT_X, ABS_TILT_Y, ABS_WHEEL, ABS_X, ABS_Y, BTN_EXTRA, BTN_LEFT,
    BTN_MIDDLE, BTN_RIGHT, BTN_SIDE, BTN_STYLUS, BTN_STYLUS2, BTN_TOUCH, EV_REL, EV_SYN,
    REL_WHEEL, SYN_REPORT,
};

const WACOM_VENDOR_ID: u16 = 0x056a;
const USB_BUS: u16 = 0x03;
const STRIP_MAX: i32 = 4096;
const ROTATION_RANGE: i32 = 900;
const WHEEL_MAX: i32 = 1023;

/// Stylus buttons: tip, lower and upper side switch.
const PEN_BUTTONS: [u16; 3] = [BTN_TOUCH, BTN_STYLUS, BTN_STYLUS2];
/// Cursor buttons in record bit order.
const CURSOR_BUTTONS: [u16; 5] = [BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, BTN_SIDE, BTN_EXTRA];

fn tool_keys(class: ToolClass) -> Vec<Key> {
    match class {
        ToolClass::Stylus => vec![
            Key::BTN_TOOL_PEN,
            Key::BTN_TOOL_PENCIL,
            Key::BTN_TOOL_BRUSH,
            Key::BTN_TOOL_AIRBRUSH,
            Key::BTN_TOUCH,
            Key::BTN_STYLUS,
            Key::BTN_STYLUS2,
        ],
        ToolClass::Eraser => vec![Key::BTN_TOOL_RUBBER, Key::BTN_TOUCH],
        ToolClass::Cursor => vec![
            Key::BTN_TOOL_MOUSE,
            Key::BTN_TOOL_LENS,
            Key::BTN_LEFT,
            Key::BTN_MIDDLE,
            Key::BTN_RIGHT,
            Key::BTN_SIDE,
            Key::BTN_EXTRA,
        ],
        ToolClass::Pad => vec![Key::BTN_TOOL_FINGER],
    }
}

fn create_tool_device(model: &ModelDescriptor, class: ToolClass) -> Result<UinputDevice> {
    // points per inch to units per millimetre
    let res = (model.resolution * 10 / 254).max(1) as i32;
    let mut axes = vec![
        AbsSetup::new(Abs::X, AbsInfo::new(0, model.max_x as i32).with_resolution(res)),
        AbsSetup::new(Abs::Y, AbsInfo::new(0, model.max_y as i32).with_resolution(res)),
        AbsSetup::new(Abs::MISC, AbsInfo::new(0, i32::MAX)),
    ];
    let half_tilt = model.max_tilt / 2;

    match class {
        ToolClass::Stylus | ToolClass::Eraser => {
            axes.push(AbsSetup::new(Abs::PRESSURE, AbsInfo::new(0, model.max_pressure)));
            axes.push(AbsSetup::new(Abs::DISTANCE, AbsInfo::new(0, model.max_distance)));
            if model.tilt_enabled {
                axes.push(AbsSetup::new(Abs::TILT_X, AbsInfo::new(-half_tilt, half_tilt - 1)));
                axes.push(AbsSetup::new(Abs::TILT_Y, AbsInfo::new(-half_tilt, half_tilt - 1)));
            }
            if class == ToolClass::Stylus {
                axes.push(AbsSetup::new(Abs::WHEEL, AbsInfo::new(0, WHEEL_MAX)));
            }
        }
        ToolClass::Cursor => {
            axes.push(AbsSetup::new(Abs::DISTANCE, AbsInfo::new(0, model.max_distance)));
            axes.push(AbsSetup::new(Abs::RZ, AbsInfo::new(-ROTATION_RANGE, ROTATION_RANGE - 1)));
            axes.push(AbsSetup::new(Abs::THROTTLE, AbsInfo::new(-WHEEL_MAX, WHEEL_MAX)));
        }
        ToolClass::Pad => {
            axes.push(AbsSetup::new(Abs::RX, AbsInfo::new(0, STRIP_MAX)));
            axes.push(AbsSetup::new(Abs::RY, AbsInfo::new(0, STRIP_MAX)));
            axes.push(AbsSetup::new(Abs::WHEEL, AbsInfo::new(0, 71)));
        }
    }

    let mut keys = tool_keys(class);
    if class == ToolClass::Pad {
        keys.extend(model.capabilities.aux_keys().into_iter().map(Key::from_raw));
    }

    let builder = UinputDevice::builder()?
        .with_input_id(InputId::new(
            Bus::from_raw(USB_BUS),
            WACOM_VENDOR_ID,
            model.product_id.unwrap_or(0),
            0,
        ))?
        .with_abs_axes(axes)?
        .with_keys(keys)?;

    let builder = match class {
        ToolClass::Cursor if model.capabilities.contains(Capabilities::REL_WHEEL) => {
            builder.with_rel_axes([Rel::WHEEL])?
        }
        ToolClass::Stylus | ToolClass::Eraser => builder.with_props([InputProp::POINTER])?,
        _ => builder,
    };

    Ok(builder.build(&format!("wacdec {} {}", model.name, class))?)
}

/// Events describing one record on a tool's virtual device.
pub fn record_events(state: &DeviceState, aux_keys: &[u16]) -> Vec<InputEvent> {
    let mut batch = Vec::with_capacity(24);
    let pressed = |bit: u32| state.button(bit) as i32;

    batch.push(key_event(state.tool.tool_key(), state.proximity as i32));
    batch.push(abs_event(ABS_X, state.x as i32));
    batch.push(abs_event(ABS_Y, state.y as i32));

    match state.class() {
        ToolClass::Stylus | ToolClass::Eraser => {
            batch.push(abs_event(ABS_PRESSURE, state.pressure));
            batch.push(abs_event(ABS_DISTANCE, state.distance));
            batch.push(abs_event(ABS_TILT_X, state.tilt_x));
            batch.push(abs_event(ABS_TILT_Y, state.tilt_y));
            batch.push(key_event(PEN_BUTTONS[0], state.touch as i32));
            if state.class() == ToolClass::Stylus {
                batch.push(key_event(PEN_BUTTONS[1], pressed(1)));
                batch.push(key_event(PEN_BUTTONS[2], pressed(2)));
            }
            if state.tool == ToolCategory::Airbrush {
                batch.push(abs_event(ABS_WHEEL, state.abs_wheel));
            }
        }
        ToolClass::Cursor => {
            for (bit, &code) in CURSOR_BUTTONS.iter().enumerate() {
                batch.push(key_event(code, pressed(bit as u32)));
            }
            batch.push(abs_event(ABS_DISTANCE, state.distance));
            batch.push(abs_event(ABS_RZ, state.rotation));
            batch.push(abs_event(ABS_THROTTLE, state.throttle));
            if state.rel_wheel != 0 {
                // records count wheel steps away from the user
                batch.push(raw_event(EV_REL, REL_WHEEL, -state.rel_wheel));
            }
        }
        ToolClass::Pad => {
            for (n, &code) in aux_keys.iter().enumerate() {
                batch.push(key_event(code, pressed(AUX_BUTTON_BASE + n as u32)));
            }
            batch.push(abs_event(ABS_RX, state.strip_x));
            batch.push(abs_event(ABS_RY, state.strip_y));
            batch.push(abs_event(ABS_WHEEL, state.abs_wheel));
        }
    }

    batch.push(abs_event(ABS_MISC, state.device_id as i32));
    batch.push(raw_event(EV_SYN, SYN_REPORT, 0));
    batch
}

/// Forwards the records of one logical tool to its virtual device.
pub struct UinputSink {
    handle: ToolHandle,
    device: UinputDevice,
    aux_keys: Vec<u16>,
    forwarded: u64,
}

impl UinputSink {
    pub fn create(model: &ModelDescriptor, handle: ToolHandle) -> Result<Self> {
        log::info!("Creating {} uinput device", handle);
        let device = create_tool_device(model, handle.class)?;

        if let Ok(name) = device.sysname() {
            log::info!(
                "{} device ready: /sys/devices/virtual/input/{}",
                handle,
                name.to_string_lossy()
            );
        }

        Ok(Self {
            handle,
            device,
            aux_keys: model.capabilities.aux_keys(),
            forwarded: 0,
        })
    }
}

impl Emit for UinputSink {
    fn emit(&mut self, _channel: usize, state: DeviceState) {
        let batch = record_events(&state, &self.aux_keys);
        if let Err(e) = self.device.write(&batch) {
            log::error!("{}: uinput write failed: {}", self.handle, e);
            return;
        }

        if self.forwarded == 0 {
            log::info!("{} events flowing", self.handle);
        }
        self.forwarded += 1;
        if self.forwarded % 500 == 0 {
            log::debug!("{} records forwarded: {}", self.handle, self.forwarded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{triple, BTN_0, BTN_TOOL_FINGER, BTN_TOOL_MOUSE, BTN_TOOL_PEN, EV_ABS, EV_KEY};

    fn has(batch: &[InputEvent], ty: u16, code: u16, value: i32) -> bool {
        batch.iter().map(triple).any(|t| t == (ty, code, value))
    }

    #[test]
    fn test_stylus_record() {
        let state = DeviceState {
            proximity: true,
            touch: true,
            x: 10,
            y: 20,
            pressure: 300,
            buttons: 0b101,
            ..Default::default()
        };
        let batch = record_events(&state, &[]);
        assert!(has(&batch, EV_KEY, BTN_TOOL_PEN, 1));
        assert!(has(&batch, EV_ABS, ABS_PRESSURE, 300));
        assert!(has(&batch, EV_KEY, BTN_TOUCH, 1));
        assert!(has(&batch, EV_KEY, BTN_STYLUS, 0));
        assert!(has(&batch, EV_KEY, BTN_STYLUS2, 1));
        assert_eq!(batch.last().map(triple), Some((EV_SYN, SYN_REPORT, 0)));
    }

    #[test]
    fn test_cursor_wheel_only_when_moved() {
        let mut state = DeviceState {
            tool: ToolCategory::Mouse4D,
            proximity: true,
            buttons: 0b1,
            ..Default::default()
        };
        let batch = record_events(&state, &[]);
        assert!(has(&batch, EV_KEY, BTN_TOOL_MOUSE, 1));
        assert!(has(&batch, EV_KEY, BTN_LEFT, 1));
        assert!(!batch.iter().any(|e| triple(e).0 == EV_REL));

        state.rel_wheel = 1;
        let batch = record_events(&state, &[]);
        assert!(has(&batch, EV_REL, REL_WHEEL, -1));
    }

    #[test]
    fn test_pad_keys() {
        let state = DeviceState {
            tool: ToolCategory::Pad,
            proximity: true,
            buttons: 1 << AUX_BUTTON_BASE,
            ..Default::default()
        };
        let batch = record_events(&state, &[BTN_0]);
        assert!(has(&batch, EV_KEY, BTN_TOOL_FINGER, 1));
        assert!(has(&batch, EV_KEY, BTN_0, 1));
    }
}
