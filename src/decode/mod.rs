//! Packet and event decoders, one per wire dialect.

pub mod events;
pub mod hid;
pub mod protocol4;
pub mod protocol5;

pub use events::{EventAccumulator, EVENT_QUEUE_CAPACITY};
pub use hid::HidDecoder;
pub use protocol4::Protocol4;
pub use protocol5::Protocol5;

use crate::model::{Dialect, MarkerMode, ModelDescriptor};

/// What the transport delivers for a USB tablet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsbInput {
    /// `input_event` records from an evdev node.
    #[default]
    Events,
    /// Raw HID reports from a hidraw node or capture.
    Reports,
}

/// The decoder selected by a model's dialect.
#[derive(Debug, Clone)]
pub enum Decoder {
    Serial4(Protocol4),
    Serial5(Protocol5),
    UsbEvents(EventAccumulator),
    /// Reports are turned into event groups first, then folded as events.
    UsbReports(HidDecoder, EventAccumulator),
}

impl Decoder {
    pub fn new(model: &ModelDescriptor, input: UsbInput) -> Self {
        match (model.dialect, input) {
            (Dialect::Serial4 { .. }, _) => Decoder::Serial4(Protocol4::new(model)),
            (Dialect::Serial5, _) => Decoder::Serial5(Protocol5::new()),
            (Dialect::Usb(_), UsbInput::Events) => {
                Decoder::UsbEvents(EventAccumulator::new(model))
            }
            (Dialect::Usb(family), UsbInput::Reports) => {
                // every decoded report ends with SYN_REPORT
                let folded = model.with_marker(MarkerMode::Report);
                Decoder::UsbReports(HidDecoder::new(model, family), EventAccumulator::new(&folded))
            }
        }
    }

    /// Bytes per unit of input, given the size of one `input_event`.
    pub fn unit_len(&self, model: &ModelDescriptor, event_size: usize) -> usize {
        match self {
            Decoder::Serial4(_) | Decoder::Serial5(_) => model.frame_len(),
            Decoder::UsbEvents(_) => event_size,
            Decoder::UsbReports(..) => model.packet_len,
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, Decoder::Serial4(_) | Decoder::Serial5(_))
    }

    pub fn marker(&self) -> Option<MarkerMode> {
        match self {
            Decoder::UsbEvents(events) | Decoder::UsbReports(_, events) => Some(events.marker()),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        match self {
            Decoder::UsbEvents(events) => events.reset(),
            Decoder::UsbReports(hid, events) => {
                hid.reset();
                events.reset();
            }
            _ => {}
        }
    }
}
