mod config;
mod dump;

use std::fs::File;
use std::io::Read;

use clap::Parser;

use config::{Cli, Command, Config};
use wacdec::emit::{Emit, Router, ToolHandle};
use wacdec::input::UinputSink;
use wacdec::model::{SERIAL_MODELS, USB_MODELS};
use wacdec::session::{Tablet, BUFFER_CAPACITY};
use wacdec::state::DeviceState;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Dump)) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
        let config = Config::load(&cli);
        return dump::run_dump(&config);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if matches!(cli.command, Some(Command::Models)) {
        for model in SERIAL_MODELS.iter().chain(USB_MODELS.iter()) {
            println!("{:<20} {}", model.key, model);
        }
        return Ok(());
    }

    let config = Config::load(&cli);
    config.validate()?;
    let model = config.descriptor()?;

    log::info!(
        "wacdec starting (model={}, device={}, uinput={})",
        model.key,
        config.device.display(),
        if config.uinput { "on" } else { "off" }
    );

    let mut tablet = Tablet::new(model, config.input).with_event_size(config.event_size);

    let mut sink: Box<dyn Emit> = if config.uinput {
        let mut router = Router::new();
        for handle in ToolHandle::all(0) {
            router.attach(handle, Box::new(UinputSink::create(&model, handle)?));
        }
        Box::new(router)
    } else {
        Box::new(|channel: usize, state: DeviceState| log::info!("ch{} {}", channel, state))
    };

    run_decode(&config, &mut tablet, sink.as_mut())
}

fn run_decode(
    config: &Config,
    tablet: &mut Tablet,
    sink: &mut dyn Emit,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut source = File::open(&config.device)?;
    log::info!("Reading {}", config.device.display());

    let mut buf = [0u8; BUFFER_CAPACITY];
    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            break;
        }
        tablet.feed(&buf[..n], sink);
    }

    let stats = tablet.stats();
    log::info!(
        "End of input: {} records, {} dropped, {} resyncs",
        stats.records,
        stats.dropped,
        stats.resyncs
    );
    if tablet.pending() > 0 {
        log::warn!("{} trailing bytes did not form a packet", tablet.pending());
    }
    Ok(())
}
