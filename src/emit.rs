//! Delivery of completed records to consumers, and logical tool routing.

use std::fmt;

use crate::state::DeviceState;
use crate::tool::ToolClass;

/// Consumer of completed records: called once per logical record.
pub trait Emit {
    fn emit(&mut self, channel: usize, state: DeviceState);
}

impl<F> Emit for F
where
    F: FnMut(usize, DeviceState),
{
    fn emit(&mut self, channel: usize, state: DeviceState) {
        self(channel, state)
    }
}

/// One logical input device (stylus, eraser, cursor or pad) of a tablet.
///
/// Handles do not own decoder state; they name the tablet they belong to by
/// its index in the caller's tablet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToolHandle {
    pub tablet: usize,
    pub class: ToolClass,
}

impl ToolHandle {
    pub fn new(tablet: usize, class: ToolClass) -> Self {
        Self { tablet, class }
    }

    /// The four logical tools every tablet exposes.
    pub fn all(tablet: usize) -> [ToolHandle; 4] {
        [
            ToolHandle::new(tablet, ToolClass::Stylus),
            ToolHandle::new(tablet, ToolClass::Eraser),
            ToolHandle::new(tablet, ToolClass::Cursor),
            ToolHandle::new(tablet, ToolClass::Pad),
        ]
    }

    pub fn accepts(&self, state: &DeviceState) -> bool {
        state.class() == self.class
    }
}

impl fmt::Display for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tablet{}/{}", self.tablet, self.class)
    }
}

/// Routes every record to the sink of the logical tool matching its class.
pub struct Router {
    tools: Vec<(ToolHandle, Box<dyn Emit>)>,
    unrouted: u64,
}

impl Router {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            unrouted: 0,
        }
    }

    pub fn attach(&mut self, handle: ToolHandle, sink: Box<dyn Emit>) {
        log::debug!("Attached logical tool {}", handle);
        self.tools.push((handle, sink));
    }

    pub fn handles(&self) -> impl Iterator<Item = &ToolHandle> {
        self.tools.iter().map(|(h, _)| h)
    }

    /// Records no attached tool accepted.
    pub fn unrouted(&self) -> u64 {
        self.unrouted
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Emit for Router {
    fn emit(&mut self, channel: usize, state: DeviceState) {
        match self.tools.iter_mut().find(|(h, _)| h.accepts(&state)) {
            Some((_, sink)) => sink.emit(channel, state),
            None => {
                self.unrouted += 1;
                log::trace!("No logical tool for {} record", state.class());
            }
        }
    }
}
