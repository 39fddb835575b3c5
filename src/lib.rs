//! Decoder for Wacom tablet data streams.
//!
//! Serial Protocol 4 and Protocol 5 frames, USB HID reports and the Linux
//! input event stream are decoded into per-tool [`DeviceState`] records,
//! tracked on up to [`MAX_CHANNELS`](channel::MAX_CHANNELS) channels and
//! handed to an [`Emit`] consumer.

pub mod accumulate;
pub mod channel;
pub mod decode;
pub mod emit;
pub mod error;
pub mod input;
pub mod model;
pub mod session;
pub mod state;
pub mod tool;
pub mod validate;

pub use decode::UsbInput;
pub use emit::{Emit, Router, ToolHandle};
pub use error::{DropReason, Error, Result};
pub use model::ModelDescriptor;
pub use session::Tablet;
pub use state::DeviceState;
pub use tool::{ToolCategory, ToolClass};
