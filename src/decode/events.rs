//! USB input event stream: queue events until an end-of-record marker,
//! then fold the group into one channel's state.

use evdevil::event::InputEvent;

use crate::accumulate::Accumulator;
use crate::error::DropReason;
use crate::input::event::{
    triple, ABS_DISTANCE, ABS_MISC, ABS_PRESSURE, ABS_RX, ABS_RY, ABS_RZ, ABS_THROTTLE,
    ABS_TILT_X, ABS_TILT_Y, ABS_WHEEL, ABS_X, ABS_Y, ABS_Z, BTN_EXTRA, BTN_LEFT, BTN_MIDDLE,
    BTN_RIGHT, BTN_SIDE, BTN_STYLUS, BTN_STYLUS2, BTN_TOUCH, EV_ABS, EV_KEY, EV_MSC, EV_REL,
    EV_SYN, MSC_SERIAL, REL_WHEEL, SYN_REPORT,
};
use crate::model::{MarkerMode, ModelDescriptor, ProtocolLevel, DTF720_PRODUCT_ID};
use crate::state::{DeviceState, AUX_BUTTON_BASE};
use crate::tool::{ToolCategory, ToolClass};

/// Events buffered before a marker must arrive.
pub const EVENT_QUEUE_CAPACITY: usize = 32;

/// Tilt axes are reported 0..127 and centred on 64.
const TILT_CENTER: i32 = 64;

type RawEvent = (u16, u16, i32);

#[derive(Debug, Clone)]
pub struct EventAccumulator {
    queue: heapless::Vec<RawEvent, EVENT_QUEUE_CAPACITY>,
    marker: MarkerMode,
    last_serial: u32,
    protocol: ProtocolLevel,
    aux_keys: Vec<u16>,
    no_eraser: bool,
}

impl EventAccumulator {
    pub fn new(model: &ModelDescriptor) -> Self {
        Self {
            queue: heapless::Vec::new(),
            marker: model.marker,
            last_serial: 0,
            protocol: model.dialect.protocol(),
            aux_keys: model.capabilities.aux_keys(),
            no_eraser: model.product_id == Some(DTF720_PRODUCT_ID),
        }
    }

    /// Marker currently closing records; flips at most once per session.
    pub fn marker(&self) -> MarkerMode {
        self.marker
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Drop buffered events. The adopted marker mode survives.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.last_serial = 0;
    }

    /// Queue one event. Returns `Ok(true)` when it closed a record that was
    /// emitted, `Ok(false)` while the group is still open.
    pub fn push(&mut self, ev: &InputEvent, acc: &mut Accumulator<'_>) -> Result<bool, DropReason> {
        let (ty, code, value) = triple(ev);
        if self.queue.push((ty, code, value)).is_err() {
            log::error!("Exceeded event queue ({}) without a marker", self.queue.len());
            self.reset();
            return Err(DropReason::QueueOverflow);
        }

        match (ty, code) {
            (EV_MSC, MSC_SERIAL) => {
                self.last_serial = value as u32;
                if self.marker == MarkerMode::Report {
                    return Ok(false);
                }
            }
            (EV_SYN, SYN_REPORT) => {
                if self.marker != MarkerMode::Report {
                    log::warn!("Unexpected SYN_REPORT, using it as the end-of-record marker");
                    self.marker = MarkerMode::Report;
                }
            }
            _ => return Ok(false),
        }

        let result = self.finish_group(acc);
        self.reset();
        result
    }

    fn finish_group(&mut self, acc: &mut Accumulator<'_>) -> Result<bool, DropReason> {
        // marker alone, e.g. the SYN_REPORT after an MSC_SERIAL-terminated group
        if self.queue.len() == 1 {
            return Ok(false);
        }

        let serial = self.last_serial;
        let channel = match self.protocol {
            ProtocolLevel::Four => acc.channels.allocate_fixed(serial),
            ProtocolLevel::Five => acc.channels.allocate(serial)?,
        };

        let mut ds = *acc.begin(channel);
        ds.serial = serial;
        self.fold(&mut ds);

        if self.marker == MarkerMode::Serial && (ds.device_id == 0 || ds.serial == 0) {
            ds.proximity = false;
        }

        *acc.work(channel) = ds;

        if self.no_eraser && ds.class() == ToolClass::Eraser {
            log::debug!("Model has no eraser, dropping record");
            return Err(DropReason::Unsupported);
        }

        acc.emit(channel);
        Ok(true)
    }

    fn fold(&self, ds: &mut DeviceState) {
        let mut tool_key = None;

        for &(ty, code, value) in &self.queue {
            match ty {
                EV_ABS => match code {
                    ABS_X => ds.x = value as u32,
                    ABS_Y => ds.y = value as u32,
                    ABS_RX => ds.strip_x = value,
                    ABS_RY => ds.strip_y = value,
                    ABS_RZ => ds.rotation = value,
                    ABS_TILT_X => ds.tilt_x = value - TILT_CENTER,
                    ABS_TILT_Y => ds.tilt_y = value - TILT_CENTER,
                    ABS_PRESSURE => ds.pressure = value,
                    ABS_DISTANCE => ds.distance = value,
                    ABS_WHEEL | ABS_Z => ds.abs_wheel = value,
                    ABS_THROTTLE => ds.throttle = value,
                    ABS_MISC if value != 0 => ds.device_id = value as u32,
                    _ => {}
                },
                EV_REL => {
                    if code == REL_WHEEL {
                        ds.rel_wheel = -value;
                    } else {
                        log::warn!("Unexpected relative axis {}", code);
                    }
                }
                EV_KEY => {
                    if ToolCategory::from_tool_key(code, 0).is_some() {
                        tool_key = Some(code);
                        ds.proximity = value != 0;
                        continue;
                    }
                    let bit = match code {
                        // contact comes from the pressure threshold
                        BTN_TOUCH => continue,
                        BTN_STYLUS | BTN_MIDDLE => 1,
                        BTN_STYLUS2 | BTN_RIGHT => 2,
                        BTN_LEFT => 0,
                        BTN_SIDE => 3,
                        BTN_EXTRA => 4,
                        _ => match self.aux_keys.iter().position(|&k| k == code) {
                            Some(n) => AUX_BUTTON_BASE + n as u32,
                            None => {
                                log::debug!("Ignoring key {:#x}", code);
                                continue;
                            }
                        },
                    };
                    ds.set_button(bit, value != 0);
                }
                _ => {}
            }
        }

        // resolved last so a mouse key sees the id reported in the same group
        if let Some(tool) = tool_key.and_then(|code| ToolCategory::from_tool_key(code, ds.device_id)) {
            ds.tool = tool;
        }
    }
}
