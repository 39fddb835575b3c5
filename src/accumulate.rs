//! Merging decoded fields into a channel and publishing completed records.

use crate::channel::ChannelTable;
use crate::emit::Emit;
use crate::model::ModelDescriptor;
use crate::state::{DeviceState, BUTTON_TIP};
use crate::tool::ToolClass;

/// Progress log interval, in emitted records.
const PROGRESS_EVERY: u64 = 500;

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub records: u64,
    pub dropped: u64,
    pub resyncs: u64,
}

/// Everything a decoder needs while handling one packet: the model,
/// the channel table and the consumer.
pub struct Accumulator<'a> {
    pub model: &'a ModelDescriptor,
    pub channels: &'a mut ChannelTable,
    sink: &'a mut dyn Emit,
    stats: &'a mut Stats,
}

impl<'a> Accumulator<'a> {
    pub fn new(
        model: &'a ModelDescriptor,
        channels: &'a mut ChannelTable,
        sink: &'a mut dyn Emit,
        stats: &'a mut Stats,
    ) -> Self {
        Self {
            model,
            channels,
            sink,
            stats,
        }
    }

    /// Working state of `channel` with per-record fields cleared.
    pub fn begin(&mut self, channel: usize) -> &mut DeviceState {
        self.channels[channel].begin_record()
    }

    pub fn work(&mut self, channel: usize) -> &mut DeviceState {
        &mut self.channels[channel].work
    }

    pub fn last(&self, channel: usize) -> &DeviceState {
        &self.channels[channel].last
    }

    /// Finish the working record of `channel` and hand it to the consumer.
    pub fn emit(&mut self, channel: usize) {
        let model = self.model;
        let slot = &mut self.channels[channel];
        finish(model, &mut slot.work);
        let state = slot.commit();
        self.publish(channel, state);
    }

    /// Publish a record that did not come from the working state, such as a
    /// synthetic proximity-out for a stale tool.
    pub fn emit_state(&mut self, channel: usize, mut state: DeviceState) {
        finish(self.model, &mut state);
        self.channels[channel].last = state;
        self.publish(channel, state);
    }

    pub fn count_drop(&mut self) {
        self.stats.dropped += 1;
    }

    fn publish(&mut self, channel: usize, state: DeviceState) {
        self.stats.records += 1;
        if self.stats.records == 1 {
            log::info!("First record on channel {}: {}", channel, state);
        } else if self.stats.records % PROGRESS_EVERY == 0 {
            log::debug!(
                "Decoded {} records ({} dropped)",
                self.stats.records,
                self.stats.dropped
            );
        }
        log::trace!("ch{} {}", channel, state);
        self.sink.emit(channel, state);
    }
}

/// Per-model post-processing of a completed record.
///
/// Stylus and eraser contact comes from the pressure threshold; the tip
/// button mirrors it.
pub fn finish(model: &ModelDescriptor, state: &mut DeviceState) {
    match state.class() {
        ToolClass::Stylus | ToolClass::Eraser => {
            state.touch = state.proximity && model.scaling.touching(state.pressure);
            state.set_button(0, state.touch);
        }
        ToolClass::Cursor => state.touch = state.buttons & BUTTON_TIP != 0,
        ToolClass::Pad => state.touch = false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDescriptor;
    use crate::tool::ToolCategory;

    fn intuos() -> ModelDescriptor {
        ModelDescriptor::find("serial-intuos").unwrap()
    }

    #[test]
    fn test_touch_from_pressure() {
        let model = intuos();
        let mut ds = DeviceState {
            proximity: true,
            pressure: 80,
            ..Default::default()
        };
        finish(&model, &mut ds);
        assert!(ds.touch);
        assert!(ds.button(0));

        ds.pressure = 20;
        finish(&model, &mut ds);
        assert!(!ds.touch);
        assert!(!ds.button(0));
    }

    #[test]
    fn test_cursor_buttons_untouched() {
        let model = intuos();
        let mut ds = DeviceState {
            tool: ToolCategory::Mouse2D,
            proximity: true,
            buttons: 0b101,
            ..Default::default()
        };
        finish(&model, &mut ds);
        assert_eq!(ds.buttons, 0b101);
        assert!(ds.touch);
    }

    #[test]
    fn test_emit_commits_and_counts() {
        let model = intuos();
        let mut channels = ChannelTable::new();
        let mut stats = Stats::default();
        let mut out = Vec::new();
        let mut sink = |ch: usize, ds: DeviceState| out.push((ch, ds));

        let mut acc = Accumulator::new(&model, &mut channels, &mut sink, &mut stats);
        let ds = acc.begin(1);
        ds.proximity = true;
        ds.x = 42;
        ds.rel_wheel = 3;
        acc.emit(1);
        assert_eq!(acc.begin(1).rel_wheel, 0);
        drop(acc);

        assert_eq!(stats.records, 1);
        assert_eq!(channels[1].last.x, 42);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, 1);
        assert_eq!(out[0].1.rel_wheel, 3);
    }
}
