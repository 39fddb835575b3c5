//! Channel table: one state slot per physical tool currently on the tablet.

use std::ops::{Index, IndexMut};

use crate::error::DropReason;
use crate::state::DeviceState;

/// Number of tools a tablet can track at once.
pub const MAX_CHANNELS: usize = 4;

/// Serial reported by Protocol 4 USB tablets for their pad side channel.
pub const PAD_MARKER_SERIAL: u32 = 0xF0;

/// A slot holding the last committed record and the one being built.
#[derive(Debug, Clone, Copy, Default)]
pub struct Channel {
    pub last: DeviceState,
    pub work: DeviceState,
}

impl Channel {
    /// A channel is occupied while its tool is in proximity.
    pub fn is_occupied(&self) -> bool {
        self.work.proximity
    }

    /// Start a record: sticky fields carry over, relative ones are zeroed.
    pub fn begin_record(&mut self) -> &mut DeviceState {
        self.work.reset_relative();
        &mut self.work
    }

    /// Commit the working state as the last emitted one.
    pub fn commit(&mut self) -> DeviceState {
        self.last = self.work;
        self.work
    }

    /// Take over a free slot for a tool whose enter record may have been lost.
    fn claim(&mut self, serial: u32) {
        *self = Channel::default();
        self.work.proximity = true;
        self.work.serial = serial;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    channels: [Channel; MAX_CHANNELS],
}

impl ChannelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every tool; all channels become free.
    pub fn reset(&mut self) {
        self.channels = [Channel::default(); MAX_CHANNELS];
    }

    pub fn get(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn occupied(&self) -> usize {
        self.channels.iter().filter(|c| c.is_occupied()).count()
    }

    /// Find the channel tracking `serial`, or claim the first free one.
    pub fn allocate(&mut self, serial: u32) -> Result<usize, DropReason> {
        if let Some(index) = self
            .channels
            .iter()
            .position(|c| c.is_occupied() && c.work.serial == serial)
        {
            return Ok(index);
        }

        let Some(index) = self.channels.iter().position(|c| !c.is_occupied()) else {
            log::error!("Exceeded channel count ({}); ignoring serial {:#x}", MAX_CHANNELS, serial);
            return Err(DropReason::ChannelsExhausted);
        };

        log::debug!("Channel {} claimed by serial {:#x}", index, serial);
        self.channels[index].claim(serial);
        Ok(index)
    }

    /// Two-slot selection for tablets without tool serial numbers:
    /// the pad side channel reports a marker serial, everything else is slot 0.
    pub fn allocate_fixed(&mut self, serial: u32) -> usize {
        let index = if serial == PAD_MARKER_SERIAL { 1 } else { 0 };
        if !self.channels[index].is_occupied() {
            self.channels[index].claim(serial);
        }
        index
    }
}

impl Index<usize> for ChannelTable {
    type Output = Channel;

    fn index(&self, index: usize) -> &Channel {
        &self.channels[index]
    }
}

impl IndexMut<usize> for ChannelTable {
    fn index_mut(&mut self, index: usize) -> &mut Channel {
        &mut self.channels[index]
    }
}
