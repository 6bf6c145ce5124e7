use super::DelayQueueMember;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DelayQueueError {
    ZeroLength,
    DelayOutOfRange { delay: u8, horizon: u8 },
    BucketFull { address: u8, capacity: usize },
}

impl Display for DelayQueueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DelayQueueError::ZeroLength => write!(f, "A delay queue needs at least one slot"),
            DelayQueueError::DelayOutOfRange { delay, horizon } => {
                write!(f, "Delay {} is outside 1..={}", delay, horizon)
            }
            DelayQueueError::BucketFull { address, capacity } => write!(
                f,
                "No room for write to {:#04X}, {} writes are already due that cycle",
                address, capacity
            ),
        }
    }
}

impl std::error::Error for DelayQueueError {}

/// Horizon and per-cycle capacity the TIA needs: no register is delayed by
/// more than 16 color clocks
pub const DEFAULT_LENGTH: u8 = 16;
pub const DEFAULT_CAPACITY: usize = 16;

/// A ring of [`DelayQueueMember`]s, one per cycle of the horizon. Every
/// address has at most one pending write; pushing it again replaces the old
/// one.
#[derive(Debug, Clone)]
pub struct DelayQueue {
    members: Vec<DelayQueueMember>,
    index: u8,
    indices: [Option<u8>; 0x100],
}

impl DelayQueue {
    pub fn new(length: u8, capacity: usize) -> Result<DelayQueue, DelayQueueError> {
        if length == 0 {
            return Err(DelayQueueError::ZeroLength);
        }

        Ok(DelayQueue::with_geometry(length, capacity))
    }

    /// `length` must not be zero
    fn with_geometry(length: u8, capacity: usize) -> DelayQueue {
        DelayQueue {
            members: (0..length).map(|_| DelayQueueMember::new(capacity)).collect(),
            index: 0,
            indices: [None; 0x100],
        }
    }

    /// Schedules `value` to be written to `address` by the `delay`-th call to
    /// [`DelayQueue::execute`] from now.
    pub fn push(&mut self, address: u8, value: u8, delay: u8) -> Result<(), DelayQueueError> {
        let length = self.members.len();

        if delay == 0 || delay as usize > length {
            return Err(DelayQueueError::DelayOutOfRange {
                delay,
                horizon: self.horizon(),
            });
        }

        let target = (self.index as usize + delay as usize - 1) % length;
        let previous = self.indices[address as usize];

        // Check for room before touching anything, a failed push leaves the
        // old entry in place
        if previous != Some(target as u8) && self.members[target].is_full() {
            return Err(DelayQueueError::BucketFull {
                address,
                capacity: self.members[target].capacity(),
            });
        }

        if let Some(previous) = previous {
            self.members[previous as usize].remove(address);
        }

        self.members[target].push(address, value)?;
        self.indices[address as usize] = Some(target as u8);

        Ok(())
    }

    /// Delivers every write due this cycle to `executor`, then advances.
    pub fn execute<F: FnMut(u8, u8)>(&mut self, mut executor: F) {
        let member = &mut self.members[self.index as usize];

        for entry in member.iter() {
            executor(entry.address, entry.value);
            self.indices[entry.address as usize] = None;
        }

        member.clear();
        self.index = ((self.index as usize + 1) % self.members.len()) as u8;
    }

    /// Drops every pending write. The cursor stays where it is.
    pub fn reset(&mut self) {
        for member in &mut self.members {
            member.clear();
        }

        self.indices = [None; 0x100];
    }

    /// The value still scheduled for `address`, if any
    pub fn pending(&self, address: u8) -> Option<u8> {
        self.indices[address as usize].and_then(|i| self.members[i as usize].value_of(address))
    }

    pub fn len(&self) -> usize {
        self.members.iter().map(DelayQueueMember::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.members.iter().all(DelayQueueMember::is_empty)
    }

    pub fn horizon(&self) -> u8 {
        self.members.len() as u8
    }
}

impl Default for DelayQueue {
    fn default() -> Self {
        DelayQueue::with_geometry(DEFAULT_LENGTH, DEFAULT_CAPACITY)
    }
}
