//! One tablet: a byte stream in, records out.

use crate::accumulate::{Accumulator, Stats};
use crate::channel::ChannelTable;
use crate::decode::{Decoder, UsbInput};
use crate::emit::Emit;
use crate::error::DropReason;
use crate::input::event::{parse_input_event, INPUT_EVENT_SIZE_32, INPUT_EVENT_SIZE_64};
use crate::model::{MarkerMode, ModelDescriptor};
use crate::validate::validate;

/// Input bytes held between calls; larger writes are consumed in chunks.
pub const BUFFER_CAPACITY: usize = 256;

pub struct Tablet {
    model: ModelDescriptor,
    decoder: Decoder,
    channels: ChannelTable,
    stats: Stats,
    buf: Vec<u8>,
    event_size: usize,
}

impl Tablet {
    pub fn new(model: ModelDescriptor, input: UsbInput) -> Self {
        log::debug!("New session for {}", model);
        Self {
            decoder: Decoder::new(&model, input),
            model,
            channels: ChannelTable::new(),
            stats: Stats::default(),
            buf: Vec::with_capacity(BUFFER_CAPACITY),
            event_size: INPUT_EVENT_SIZE_64,
        }
    }

    /// Size of one `input_event` on the source machine (16 or 24 bytes).
    /// Any other size is ignored with a warning.
    pub fn with_event_size(mut self, size: usize) -> Self {
        match size {
            INPUT_EVENT_SIZE_32 | INPUT_EVENT_SIZE_64 => self.event_size = size,
            _ => log::warn!(
                "Unsupported input_event size {}, keeping {}",
                size,
                self.event_size
            ),
        }
        self
    }

    fn unit_len(&self) -> usize {
        self.decoder.unit_len(&self.model, self.event_size)
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn channels(&self) -> &ChannelTable {
        &self.channels
    }

    /// End-of-record marker in use, for USB event sources.
    pub fn marker(&self) -> Option<MarkerMode> {
        self.decoder.marker()
    }

    /// Bytes waiting for the rest of their packet.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Forget every tool and any partial input. Counters are kept.
    pub fn reset(&mut self) {
        log::info!("Resetting {} session", self.model.key);
        self.channels.reset();
        self.decoder.reset();
        self.buf.clear();
    }

    /// Feed raw bytes from the transport. Returns the number of records emitted.
    pub fn feed(&mut self, mut bytes: &[u8], sink: &mut dyn Emit) -> u64 {
        let before = self.stats.records;
        let unit = self.unit_len();
        if unit == 0 || unit > BUFFER_CAPACITY {
            log::error!("Packet size {} does not fit the input buffer, discarding input", unit);
            return 0;
        }

        while !bytes.is_empty() {
            let room = BUFFER_CAPACITY - self.buf.len();
            let (chunk, rest) = bytes.split_at(room.min(bytes.len()));
            self.buf.extend_from_slice(chunk);
            bytes = rest;
            self.process(sink);
        }
        self.stats.records - before
    }

    fn process(&mut self, sink: &mut dyn Emit) {
        let unit = self.unit_len();
        if unit == 0 || unit > BUFFER_CAPACITY {
            return;
        }
        let serial = self.decoder.is_serial();
        let mut pos = 0;
        let mut resyncs = 0;

        let mut acc = Accumulator::new(&self.model, &mut self.channels, sink, &mut self.stats);

        while self.buf.len() - pos >= unit {
            if serial {
                let skip = validate(&self.buf[pos..], unit);
                if skip > 0 {
                    log::debug!("Discarding {} bytes to resync", skip);
                    resyncs += 1;
                    pos += skip;
                    continue;
                }
            }

            let packet = &self.buf[pos..pos + unit];
            pos += unit;

            let result = match &mut self.decoder {
                Decoder::Serial4(p4) => p4.decode(packet, &mut acc),
                Decoder::Serial5(p5) => p5.decode(packet, &mut acc),
                Decoder::UsbEvents(events) => match parse_input_event(packet) {
                    Some(ev) => events.push(&ev, &mut acc).map(drop),
                    None => Ok(()),
                },
                Decoder::UsbReports(hid, events) => hid.decode(packet).map(|group| {
                    for ev in group {
                        let folded = events.push(ev, &mut acc).map(drop);
                        note(&mut acc, folded);
                    }
                }),
            };
            note(&mut acc, result);
        }

        drop(acc);
        self.stats.resyncs += resyncs;
        self.buf.drain(..pos);
    }
}

fn note(acc: &mut Accumulator<'_>, result: Result<(), DropReason>) {
    let Err(reason) = result else {
        return;
    };
    match reason {
        DropReason::Suppressed => {
            log::trace!("Record suppressed");
            return;
        }
        // the channel table and event queue log these themselves
        DropReason::ChannelsExhausted | DropReason::QueueOverflow => {}
        _ => log::debug!("Dropped packet: {}", reason),
    }
    acc.count_drop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::{INPUT_EVENT_SIZE_32, MSC_SERIAL};
    use crate::state::DeviceState;
    use crate::tool::ToolCategory;

    fn penpartner() -> ModelDescriptor {
        ModelDescriptor::find("serial-penpartner").unwrap()
    }

    // stylus in proximity at (128, 256), full positive pressure
    const P4_FRAME: [u8; 7] = [0xE0, 0x01, 0x00, 0x00, 0x02, 0x00, 0x3F];

    fn collect(tablet: &mut Tablet, bytes: &[u8]) -> Vec<DeviceState> {
        let mut out = Vec::new();
        let mut sink = |_: usize, ds: DeviceState| out.push(ds);
        tablet.feed(bytes, &mut sink);
        out
    }

    #[test]
    fn test_partial_frames_buffered() {
        let mut tablet = Tablet::new(penpartner(), UsbInput::default());
        assert!(collect(&mut tablet, &P4_FRAME[..4]).is_empty());
        assert_eq!(tablet.pending(), 4);

        let out = collect(&mut tablet, &P4_FRAME[4..]);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].x, out[0].y), (128, 256));
        assert_eq!(tablet.pending(), 0);
    }

    #[test]
    fn test_garbage_is_skipped() {
        let mut tablet = Tablet::new(penpartner(), UsbInput::default());
        let mut bytes = vec![0x01, 0x02, 0x03];
        bytes.extend_from_slice(&P4_FRAME);
        bytes.extend_from_slice(&P4_FRAME);

        let out = collect(&mut tablet, &bytes);
        assert_eq!(out.len(), 2);
        assert!(tablet.stats().resyncs >= 1);
    }

    #[test]
    fn test_large_writes_are_chunked() {
        let mut tablet = Tablet::new(penpartner(), UsbInput::default());
        let bytes: Vec<u8> = P4_FRAME.iter().copied().cycle().take(P4_FRAME.len() * 100).collect();
        let out = collect(&mut tablet, &bytes);
        assert_eq!(out.len(), 100);
        assert_eq!(tablet.stats().records, 100);
    }

    fn event_bytes(ty: u16, code: u16, value: i32) -> Vec<u8> {
        let mut buf = vec![0u8; INPUT_EVENT_SIZE_32];
        buf[8..10].copy_from_slice(&ty.to_le_bytes());
        buf[10..12].copy_from_slice(&code.to_le_bytes());
        buf[12..16].copy_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn test_usb_event_stream_32bit() {
        let model = ModelDescriptor::find("usb:0xb2").unwrap();
        let mut tablet = Tablet::new(model, UsbInput::Events).with_event_size(INPUT_EVENT_SIZE_32);
        let mut bytes = Vec::new();
        bytes.extend(event_bytes(3, 0x00, 1000));
        bytes.extend(event_bytes(3, 0x28, 0x802));
        bytes.extend(event_bytes(1, 0x140, 1));
        bytes.extend(event_bytes(4, MSC_SERIAL, 42));

        let out = collect(&mut tablet, &bytes);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].x, 1000);
        assert_eq!(out[0].serial, 42);
        assert_eq!(tablet.marker(), Some(MarkerMode::Serial));
    }

    #[test]
    fn test_odd_event_size_keeps_default() {
        let model = ModelDescriptor::find("usb:0xb2").unwrap();
        let mut tablet = Tablet::new(model, UsbInput::Events).with_event_size(300);
        assert_eq!(tablet.unit_len(), INPUT_EVENT_SIZE_64);
        assert!(collect(&mut tablet, &[0; 300]).is_empty());
        assert_eq!(tablet.pending(), 300 % INPUT_EVENT_SIZE_64);

        let mut tablet = Tablet::new(model, UsbInput::Events).with_event_size(0);
        assert_eq!(tablet.unit_len(), INPUT_EVENT_SIZE_64);
        collect(&mut tablet, &[0; 48]);
        assert_eq!(tablet.pending(), 0);
    }

    #[test]
    fn test_protocol4_pressure_follows_override() {
        let model = ModelDescriptor::find("serial-protocol4").unwrap().with_max_pressure(120);
        let mut tablet = Tablet::new(model, UsbInput::default());
        let out = collect(&mut tablet, &[0xE0, 0x01, 0x00, 0x04, 0x02, 0x00, 0x05]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pressure, 0x05 | 0x40);

        let mut tablet = Tablet::new(penpartner(), UsbInput::default());
        let out = collect(&mut tablet, &[0xE0, 0x01, 0x00, 0x04, 0x02, 0x00, 0x05]);
        assert_eq!(out[0].pressure, (0x05 << 1) | 1 | 0x80);
    }

    #[test]
    fn test_usb_reports() {
        let model = ModelDescriptor::find("usb:0x10").unwrap();
        let mut tablet = Tablet::new(model, UsbInput::Reports);
        let out = collect(&mut tablet, &[2, 0x81, 0x34, 0x12, 0x00, 0x01, 0x50, 0x01]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tool, ToolCategory::Pen);
        assert_eq!(out[0].pressure, 0x150);
        assert!(out[0].touch);
        assert_eq!(tablet.marker(), Some(MarkerMode::Report));
    }

    #[test]
    fn test_unknown_report_counted() {
        let model = ModelDescriptor::find("usb:0x10").unwrap();
        let mut tablet = Tablet::new(model, UsbInput::Reports);
        assert!(collect(&mut tablet, &[7, 0, 0, 0, 0, 0, 0, 0]).is_empty());
        assert_eq!(tablet.stats().dropped, 1);
    }

    #[test]
    fn test_reset_clears_channels_and_buffer() {
        let mut tablet = Tablet::new(penpartner(), UsbInput::default());
        collect(&mut tablet, &P4_FRAME);
        collect(&mut tablet, &P4_FRAME[..3]);
        assert_eq!(tablet.channels().occupied(), 1);

        tablet.reset();
        assert_eq!(tablet.channels().occupied(), 0);
        assert_eq!(tablet.pending(), 0);
        assert_eq!(tablet.stats().records, 1);
    }
}
