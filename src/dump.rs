//! Dump raw input from a tablet device for debugging.
//! Run: wacdec dump --device /dev/input/eventN  (add --reports for hidraw).

use std::fs::File;
use std::io::{ErrorKind, Read};

use wacdec::decode::UsbInput;
use wacdec::input::event::{code_name, parse_input_event, triple};

use crate::config::Config;

pub fn run_dump(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut source = File::open(&config.device)?;
    eprintln!("Dumping {} (Ctrl+C to stop):\n", config.device.display());

    let unit = match config.input {
        UsbInput::Events => config.event_size,
        UsbInput::Reports => config.descriptor()?.packet_len,
    };
    let mut buf = vec![0u8; unit];
    let mut n = 0u64;

    loop {
        match source.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        n += 1;

        if config.input == UsbInput::Reports {
            let hex: Vec<String> = buf.iter().map(|b| format!("{:02x}", b)).collect();
            println!("{:6}  {}", n, hex.join(" "));
        } else if let Some(ev) = parse_input_event(&buf) {
            let (ty, code, value) = triple(&ev);
            println!("{:6}  {}  value={}", n, code_name(ty, code), value);
        }
    }
}
