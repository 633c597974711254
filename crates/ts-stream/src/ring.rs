use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use bytemuck::Pod;

use crate::error::{Result, StreamError};

/// Cursor state of a slot ring.
///
/// Records occupy slots `head .. head + filled` (mod `slots`). A grant
/// reserves the `reserved` slots after them, starting at `tail`, and may wrap
/// past the last slot.
#[derive(Debug)]
struct RingState {
    buf: Vec<u8>,
    head: usize,
    tail: usize,
    filled: usize,
    reserved: usize,
    writer_alive: bool,
    reader_alive: bool,
}

impl RingState {
    fn free(&self, slots: usize) -> usize {
        slots - self.filled - self.reserved
    }
}

#[derive(Debug)]
struct Ring {
    name: String,
    slots: usize,
    slot_size: usize,
    state: Mutex<RingState>,
    /// Signalled when the reader frees slots.
    space: Condvar,
    /// Signalled when the writer commits slots.
    data: Condvar,
}

impl Ring {
    fn lock(&self) -> Result<MutexGuard<'_, RingState>> {
        self.state
            .lock()
            .map_err(|_| StreamError::Poisoned(self.name.clone()))
    }

    fn check_count(&self, count: usize) -> Result<()> {
        if count == 0 || count > self.slots {
            return Err(StreamError::InvalidRequest(format!(
                "stream '{}': requested {} slots from a ring of {}",
                self.name, count, self.slots
            )));
        }
        Ok(())
    }
}

/// Create a slot-acquire stream of `slots` records of `slot_size` bytes.
///
/// The writer half is the producer side of the handshake: acquire a run of
/// free slots, fill them, then commit. The reader half
/// consumes committed records in commit order.
pub fn slot_stream(
    name: &str,
    slots: usize,
    slot_size: usize,
) -> Result<(SlotWriter, SlotReader)> {
    if slots == 0 || slot_size == 0 {
        return Err(StreamError::InvalidRequest(format!(
            "stream '{}': ring needs at least one slot of at least one byte",
            name
        )));
    }
    let ring = Arc::new(Ring {
        name: name.to_string(),
        slots,
        slot_size,
        state: Mutex::new(RingState {
            buf: vec![0; slots * slot_size],
            head: 0,
            tail: 0,
            filled: 0,
            reserved: 0,
            writer_alive: true,
            reader_alive: true,
        }),
        space: Condvar::new(),
        data: Condvar::new(),
    });
    tracing::debug!(stream = name, slots, slot_size, "slot stream set up");
    Ok((
        SlotWriter {
            ring: Arc::clone(&ring),
        },
        SlotReader { ring },
    ))
}

/// Producer end of a slot stream.
#[derive(Debug)]
pub struct SlotWriter {
    ring: Arc<Ring>,
}

impl SlotWriter {
    pub fn name(&self) -> &str {
        &self.ring.name
    }

    /// Ring depth in slots.
    pub fn capacity(&self) -> usize {
        self.ring.slots
    }

    pub fn slot_size(&self) -> usize {
        self.ring.slot_size
    }

    /// Slots that could be granted right now.
    pub fn free_slots(&self) -> Result<usize> {
        let state = self.ring.lock()?;
        Ok(state.free(self.ring.slots))
    }

    /// Try once to acquire `count` slots.
    ///
    /// Returns `Ok(None)` when the ring lacks room; that is backpressure,
    /// not an error, and the caller retries. A grant is never partial.
    pub fn try_acquire(&mut self, count: usize) -> Result<Option<WriteSlots<'_>>> {
        self.ring.check_count(count)?;
        let mut state = self.ring.lock()?;
        if !state.reader_alive {
            return Err(StreamError::Closed(self.ring.name.clone()));
        }
        if state.free(self.ring.slots) < count {
            tracing::trace!(stream = %self.ring.name, count, "acquire refused");
            return Ok(None);
        }
        Ok(Some(WriteSlots::reserve(&self.ring, &mut state, count)))
    }

    /// Block until `count` slots are free, or `timeout` elapses.
    ///
    /// `None` waits indefinitely.
    ///
    /// # Errors
    /// Returns `Timeout` if the deadline passes first and `Closed` if the
    /// reader has gone away.
    pub fn acquire(&mut self, count: usize, timeout: Option<Duration>) -> Result<WriteSlots<'_>> {
        self.ring.check_count(count)?;
        let ring = &*self.ring;
        let state = ring.lock()?;
        let blocked = |s: &mut RingState| s.reader_alive && s.free(ring.slots) < count;

        let mut state = match timeout {
            None => ring
                .space
                .wait_while(state, blocked)
                .map_err(|_| StreamError::Poisoned(ring.name.clone()))?,
            Some(limit) => {
                let (state, waited) = ring
                    .space
                    .wait_timeout_while(state, limit, blocked)
                    .map_err(|_| StreamError::Poisoned(ring.name.clone()))?;
                if waited.timed_out() && state.reader_alive && state.free(ring.slots) < count {
                    return Err(StreamError::Timeout {
                        stream: ring.name.clone(),
                        waited: limit,
                    });
                }
                state
            }
        };
        if !state.reader_alive {
            return Err(StreamError::Closed(ring.name.clone()));
        }
        Ok(WriteSlots::reserve(ring, &mut state, count))
    }
}

impl Drop for SlotWriter {
    fn drop(&mut self) {
        if let Ok(mut state) = self.ring.state.lock() {
            state.writer_alive = false;
        }
        self.ring.data.notify_all();
    }
}

/// A granted run of slots, writable until committed.
///
/// Writes are staged in the grant; the ring lock is only taken again to
/// publish or release the slots. Dropping a grant without calling
/// [`WriteSlots::commit`] discards it: the slots stay free and nothing becomes
/// visible to the reader.
#[derive(Debug)]
pub struct WriteSlots<'a> {
    ring: &'a Ring,
    staged: Vec<u8>,
    start: usize,
    count: usize,
    committed: bool,
}

impl<'a> WriteSlots<'a> {
    fn reserve(ring: &'a Ring, state: &mut RingState, count: usize) -> Self {
        let start = state.tail;
        state.reserved = count;
        tracing::trace!(stream = %ring.name, start, count, "acquired slots");
        WriteSlots {
            ring,
            staged: vec![0; count * ring.slot_size],
            start,
            count,
            committed: false,
        }
    }

    /// Number of slots granted.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Raw bytes of granted slot `i`.
    pub fn slot_mut(&mut self, i: usize) -> &mut [u8] {
        assert!(i < self.count, "slot {} outside grant of {}", i, self.count);
        let size = self.ring.slot_size;
        &mut self.staged[i * size..(i + 1) * size]
    }

    /// Store `record` in granted slot `i`.
    ///
    /// # Errors
    /// Returns `InvalidRequest` if `T` is larger than a slot. Shorter records
    /// are zero-extended.
    pub fn write_record<T: Pod>(&mut self, i: usize, record: &T) -> Result<()> {
        let bytes = bytemuck::bytes_of(record);
        let size = self.ring.slot_size;
        if bytes.len() > size {
            return Err(StreamError::InvalidRequest(format!(
                "record of {} bytes does not fit a {} byte slot",
                bytes.len(),
                size
            )));
        }
        let slot = self.slot_mut(i);
        slot[..bytes.len()].copy_from_slice(bytes);
        slot[bytes.len()..].fill(0);
        Ok(())
    }

    /// Publish every granted slot to the reader.
    ///
    /// # Errors
    /// Returns `Poisoned` if the ring lock was poisoned; the grant is then
    /// lost.
    pub fn commit(mut self) -> Result<()> {
        let ring = self.ring;
        let (slots, size) = (ring.slots, ring.slot_size);
        {
            let mut state = ring.lock()?;
            for i in 0..self.count {
                let offset = ((self.start + i) % slots) * size;
                state.buf[offset..offset + size]
                    .copy_from_slice(&self.staged[i * size..(i + 1) * size]);
            }
            state.tail = (self.start + self.count) % slots;
            state.filled += self.count;
            state.reserved = 0;
            self.committed = true;
        }
        tracing::trace!(stream = %ring.name, count = self.count, "committed slots");
        ring.data.notify_all();
        Ok(())
    }
}

impl Drop for WriteSlots<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Ok(mut state) = self.ring.state.lock() {
            state.reserved = 0;
        }
        self.ring.space.notify_all();
    }
}

/// Consumer end of a slot stream.
#[derive(Debug)]
pub struct SlotReader {
    ring: Arc<Ring>,
}

impl SlotReader {
    pub fn name(&self) -> &str {
        &self.ring.name
    }

    /// Committed records not yet read.
    pub fn pending(&self) -> Result<usize> {
        Ok(self.ring.lock()?.filled)
    }

    fn take(&self, state: &mut RingState, count: usize) -> Vec<u8> {
        let size = self.ring.slot_size;
        let mut out = Vec::with_capacity(count * size);
        for i in 0..count {
            let offset = ((state.head + i) % self.ring.slots) * size;
            out.extend_from_slice(&state.buf[offset..offset + size]);
        }
        state.head = (state.head + count) % self.ring.slots;
        state.filled -= count;
        self.ring.space.notify_all();
        out
    }

    /// Read `count` committed records if they are all available.
    pub fn try_read(&mut self, count: usize) -> Result<Option<Vec<u8>>> {
        self.ring.check_count(count)?;
        let mut state = self.ring.lock()?;
        if state.filled < count {
            return Ok(None);
        }
        Ok(Some(self.take(&mut state, count)))
    }

    /// Block until `count` records are committed, or `timeout` elapses.
    ///
    /// # Errors
    /// Returns `Timeout` on deadline and `Closed` if the writer went away
    /// with fewer than `count` records left.
    pub fn read(&mut self, count: usize, timeout: Option<Duration>) -> Result<Vec<u8>> {
        self.ring.check_count(count)?;
        let ring = &*self.ring;
        let state = ring.lock()?;
        let blocked = |s: &mut RingState| s.writer_alive && s.filled < count;
        let mut state = match timeout {
            None => ring
                .data
                .wait_while(state, blocked)
                .map_err(|_| StreamError::Poisoned(ring.name.clone()))?,
            Some(limit) => {
                let (state, waited) = ring
                    .data
                    .wait_timeout_while(state, limit, blocked)
                    .map_err(|_| StreamError::Poisoned(ring.name.clone()))?;
                if waited.timed_out() && state.writer_alive && state.filled < count {
                    return Err(StreamError::Timeout {
                        stream: ring.name.clone(),
                        waited: limit,
                    });
                }
                state
            }
        };
        if state.filled < count {
            return Err(StreamError::Closed(ring.name.clone()));
        }
        Ok(self.take(&mut state, count))
    }

    /// Read `count` records and decode each as a `T`.
    pub fn read_records<T: Pod>(
        &mut self,
        count: usize,
        timeout: Option<Duration>,
    ) -> Result<Vec<T>> {
        let size = std::mem::size_of::<T>();
        if size > self.ring.slot_size {
            return Err(StreamError::InvalidRequest(format!(
                "record of {} bytes does not fit a {} byte slot",
                size, self.ring.slot_size
            )));
        }
        let bytes = self.read(count, timeout)?;
        Ok(bytes
            .chunks_exact(self.ring.slot_size)
            .map(|slot| bytemuck::pod_read_unaligned(&slot[..size]))
            .collect())
    }
}

impl Drop for SlotReader {
    fn drop(&mut self) {
        if let Ok(mut state) = self.ring.state.lock() {
            state.reader_alive = false;
        }
        self.ring.space.notify_all();
    }
}
