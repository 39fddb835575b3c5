pub mod event;
pub mod uinput;

pub use event::parse_input_event;
pub use uinput::UinputSink;
