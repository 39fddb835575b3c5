use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wacdec::model::MarkerMode;

#[derive(Parser)]
#[command(name = "wacdec")]
#[command(about = "Decode Wacom tablet serial and USB streams into tool records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Tablet model key (see `wacdec models`), usb:<product id> or a `~#` model answer
    #[arg(long, env = "WACDEC_MODEL")]
    pub model: Option<String>,

    /// Input device or capture file
    #[arg(long, env = "WACDEC_DEVICE")]
    pub device: Option<PathBuf>,

    /// Initial USB end-of-record marker (serial, report)
    #[arg(long, value_parser = clap::value_parser!(MarkerMode))]
    pub marker: Option<MarkerMode>,

    /// Coordinate answer `~C<max x>,<max y>` overriding the model's ranges
    #[arg(long)]
    pub coords: Option<String>,

    /// Override the model's maximum pressure
    #[arg(long)]
    pub max_pressure: Option<i32>,

    /// Expect tilt bytes on Protocol 4 serial frames
    #[arg(long)]
    pub tilt: bool,

    /// Ignore tilt even if the model reports it
    #[arg(long, conflicts_with = "tilt")]
    pub no_tilt: bool,

    /// Input is raw HID reports (hidraw) instead of input events
    #[arg(long)]
    pub reports: bool,

    /// Input events use the 32-bit layout (16 bytes)
    #[arg(long)]
    pub compat32: bool,

    /// Forward records to virtual input devices
    #[arg(long)]
    pub uinput: bool,

    /// Path to config file
    #[arg(long, env = "WACDEC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode the input and log every record (default)
    Decode,
    /// Print raw input events for debugging
    Dump,
    /// List known tablet models
    Models,
}
