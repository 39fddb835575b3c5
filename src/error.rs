//! Error types shared by the library and the binary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Conditions that end a decoding session or prevent one from starting.
///
/// Recoverable decode outcomes (resync, unknown headers, a full channel table)
/// are not errors; they are reported as [`DropReason`] and logged.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown tablet model '{0}'")]
    UnknownModel(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a packet or event group did not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DropReason {
    /// Every channel holds a tool in proximity and none matches the serial.
    #[error("no free channel")]
    ChannelsExhausted,
    /// The USB event queue filled up before an end-of-record marker.
    #[error("event queue overflow")]
    QueueOverflow,
    /// The header byte matched no known record type.
    #[error("unknown record header {0:#04x}")]
    UnknownRecord(u8),
    /// The HID report id is not handled by this model family.
    #[error("unknown report id {0}")]
    UnknownReport(u8),
    /// The model cannot report this tool (e.g. an eraser on DTF720).
    #[error("tool not supported by this model")]
    Unsupported,
    /// A HID report shorter than its family's layout.
    #[error("report truncated to {0} bytes")]
    Truncated(usize),
    /// The record was decoded but deliberately not emitted.
    #[error("record suppressed")]
    Suppressed,
}
