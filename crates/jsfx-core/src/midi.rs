//! Timestamped MIDI event storage.
//!
//! A [`MidiBuffer`] packs events into one contiguous byte store. Each
//! record is a 12-byte little-endian header (`bus`, `offset`, `size`)
//! followed by `size` payload bytes. Nothing is allocated on push unless
//! the buffer is extensible and full.
//!
//! Reads are sequential. [`MidiBuffer::get_next`] walks every event in
//! order; [`MidiBuffer::get_next_from_bus`] walks only the events of one
//! bus, keeping one cursor per bus. The two styles must not be mixed on the
//! same buffer between clears.

use crate::MAX_MIDI_BUSES;

const RECORD_HEADER: usize = 12;

/// A borrowed MIDI event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEventRef<'a> {
    /// Bus number, `0..16`.
    pub bus: u32,
    /// Frame offset inside the processing block.
    pub offset: u32,
    /// Message bytes.
    pub data: &'a [u8],
}

impl MidiEventRef<'_> {
    /// Copy into an owned [`MidiEvent`].
    pub fn to_owned_event(&self) -> MidiEvent {
        MidiEvent {
            bus: self.bus,
            offset: self.offset,
            data: self.data.to_vec(),
        }
    }
}

/// An owned MIDI event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiEvent {
    /// Bus number, `0..16`.
    pub bus: u32,
    /// Frame offset inside the processing block.
    pub offset: u32,
    /// Message bytes.
    pub data: Vec<u8>,
}

impl MidiEvent {
    /// Create an event from its parts.
    pub fn new(bus: u32, offset: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            bus,
            offset,
            data: data.into(),
        }
    }

    /// Borrow as a [`MidiEventRef`].
    pub fn as_ref(&self) -> MidiEventRef<'_> {
        MidiEventRef {
            bus: self.bus,
            offset: self.offset,
            data: &self.data,
        }
    }
}

/// Capacity-bounded store of MIDI events.
#[derive(Debug, Clone)]
pub struct MidiBuffer {
    data: Vec<u8>,
    capacity: usize,
    extensible: bool,
    read_pos: usize,
    read_pos_for_bus: [usize; MAX_MIDI_BUSES],
}

impl Default for MidiBuffer {
    fn default() -> Self {
        Self::new(0, true)
    }
}

impl MidiBuffer {
    /// Create a buffer holding up to `capacity` bytes of records.
    pub fn new(capacity: usize, extensible: bool) -> Self {
        let mut buffer = Self {
            data: Vec::new(),
            capacity: 0,
            extensible,
            read_pos: 0,
            read_pos_for_bus: [0; MAX_MIDI_BUSES],
        };
        buffer.reserve(capacity, extensible);
        buffer
    }

    /// Reallocate storage for `capacity` bytes. Pending events are kept.
    pub fn reserve(&mut self, capacity: usize, extensible: bool) {
        let capacity = capacity.max(self.data.len());
        self.data.reserve_exact(capacity.saturating_sub(self.data.len()));
        self.capacity = capacity;
        self.extensible = extensible;
    }

    /// Byte capacity before push fails (or grows, when extensible).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether pushes past capacity grow the store.
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Whether no events are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of the sequential read cursor, in bytes.
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    /// Drop every event and rewind all read cursors.
    pub fn clear(&mut self) {
        self.data.clear();
        self.rewind();
    }

    /// Rewind all read cursors without dropping events.
    pub fn rewind(&mut self) {
        self.read_pos = 0;
        self.read_pos_for_bus = [0; MAX_MIDI_BUSES];
    }

    /// Append an event.
    ///
    /// Returns `false` when the bus is out of range, the payload does not
    /// fit a record, or the buffer is full and not extensible.
    pub fn push(&mut self, event: &MidiEventRef<'_>) -> bool {
        if event.bus as usize >= MAX_MIDI_BUSES {
            return false;
        }
        let Ok(size) = u32::try_from(event.data.len()) else {
            return false;
        };
        let needed = RECORD_HEADER + event.data.len();
        if self.data.len() + needed > self.capacity {
            if !self.extensible {
                return false;
            }
            self.capacity = (self.capacity * 2).max(self.data.len() + needed);
            self.data.reserve_exact(self.capacity - self.data.len());
        }

        self.data.extend_from_slice(&event.bus.to_le_bytes());
        self.data.extend_from_slice(&event.offset.to_le_bytes());
        self.data.extend_from_slice(&size.to_le_bytes());
        self.data.extend_from_slice(event.data);
        true
    }

    /// Read the next event in stored order.
    pub fn get_next(&mut self) -> Option<MidiEventRef<'_>> {
        let (event_end, _) = self.record_at(self.read_pos)?;
        let start = self.read_pos;
        self.read_pos = event_end;
        self.decode(start)
    }

    /// Read the next event of `bus` in stored order.
    pub fn get_next_from_bus(&mut self, bus: u32) -> Option<MidiEventRef<'_>> {
        let slot = bus as usize;
        if slot >= MAX_MIDI_BUSES {
            return None;
        }
        let mut pos = self.read_pos_for_bus[slot];
        while let Some((end, record_bus)) = self.record_at(pos) {
            if record_bus == bus {
                self.read_pos_for_bus[slot] = end;
                return self.decode(pos);
            }
            pos = end;
        }
        self.read_pos_for_bus[slot] = pos;
        None
    }

    /// Iterate over every stored event without moving any cursor.
    pub fn iter(&self) -> impl Iterator<Item = MidiEventRef<'_>> {
        let mut pos = 0;
        std::iter::from_fn(move || {
            let (end, _) = self.record_at(pos)?;
            let event = self.decode(pos);
            pos = end;
            event
        })
    }

    /// End position and bus of the record starting at `pos`.
    fn record_at(&self, pos: usize) -> Option<(usize, u32)> {
        let header = self.data.get(pos..pos + RECORD_HEADER)?;
        let bus = read_u32(&header[0..4]);
        let size = read_u32(&header[8..12]) as usize;
        let end = pos + RECORD_HEADER + size;
        (end <= self.data.len()).then_some((end, bus))
    }

    fn decode(&self, pos: usize) -> Option<MidiEventRef<'_>> {
        let (end, bus) = self.record_at(pos)?;
        let offset = read_u32(&self.data[pos + 4..pos + 8]);
        Some(MidiEventRef {
            bus,
            offset,
            data: &self.data[pos + RECORD_HEADER..end],
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(bus: u32, offset: u32, key: u8) -> MidiEvent {
        MidiEvent::new(bus, offset, vec![0x90, key, 0x40])
    }

    #[test]
    fn push_then_read_in_order() {
        let mut buf = MidiBuffer::new(1024, false);
        assert!(buf.push(&note(0, 10, 60).as_ref()));
        assert!(buf.push(&note(1, 20, 61).as_ref()));

        let first = buf.get_next().unwrap().to_owned_event();
        assert_eq!(first, note(0, 10, 60));
        let second = buf.get_next().unwrap().to_owned_event();
        assert_eq!(second, note(1, 20, 61));
        assert!(buf.get_next().is_none());
        assert_ne!(buf.read_pos(), 0);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.read_pos(), 0);
    }

    #[test]
    fn full_fixed_buffer_rejects_push() {
        let mut buf = MidiBuffer::new(RECORD_HEADER + 3, false);
        assert!(buf.push(&note(0, 0, 1).as_ref()));
        assert!(!buf.push(&note(0, 1, 2).as_ref()));
        assert_eq!(buf.iter().count(), 1);
    }

    #[test]
    fn extensible_buffer_grows() {
        let mut buf = MidiBuffer::new(RECORD_HEADER, true);
        for i in 0..100 {
            assert!(buf.push(&note(0, i, 1).as_ref()));
        }
        assert_eq!(buf.iter().count(), 100);
        assert!(buf.capacity() >= 100 * (RECORD_HEADER + 3));
    }

    #[test]
    fn bus_scoped_reads() {
        let mut buf = MidiBuffer::new(1024, false);
        buf.push(&note(0, 1, 10).as_ref());
        buf.push(&note(2, 2, 20).as_ref());
        buf.push(&note(0, 3, 30).as_ref());
        buf.push(&note(2, 4, 40).as_ref());

        assert_eq!(buf.get_next_from_bus(2).unwrap().offset, 2);
        assert_eq!(buf.get_next_from_bus(0).unwrap().offset, 1);
        assert_eq!(buf.get_next_from_bus(2).unwrap().offset, 4);
        assert!(buf.get_next_from_bus(2).is_none());
        assert_eq!(buf.get_next_from_bus(0).unwrap().offset, 3);
        assert!(buf.get_next_from_bus(0).is_none());
        assert!(buf.get_next_from_bus(5).is_none());
        assert!(buf.get_next_from_bus(99).is_none());
    }

    #[test]
    fn invalid_bus_is_rejected() {
        let mut buf = MidiBuffer::new(1024, true);
        assert!(!buf.push(&note(16, 0, 1).as_ref()));
        assert!(buf.is_empty());
    }

    #[test]
    fn reserve_keeps_events() {
        let mut buf = MidiBuffer::new(64, false);
        buf.push(&note(0, 5, 1).as_ref());
        buf.reserve(4096, true);
        assert!(buf.is_extensible());
        assert_eq!(buf.get_next().unwrap().offset, 5);
    }

    #[test]
    fn sysex_payloads() {
        let mut buf = MidiBuffer::new(1024, false);
        let sysex = MidiEvent::new(0, 7, vec![0xf0, 1, 2, 3, 4, 0xf7]);
        assert!(buf.push(&sysex.as_ref()));
        let got = buf.get_next().unwrap();
        assert_eq!(got.data, &[0xf0, 1, 2, 3, 4, 0xf7]);
    }
}
