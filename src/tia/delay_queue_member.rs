use super::DelayQueueError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Entry {
    pub address: u8,
    pub value: u8,
}

/// All writes that are due on the same cycle, in the order they were pushed.
/// The backing storage is allocated once and reused forever.
#[derive(Debug, Clone)]
pub struct DelayQueueMember {
    entries: Vec<Entry>,
    capacity: usize,
}

impl DelayQueueMember {
    pub fn new(capacity: usize) -> DelayQueueMember {
        DelayQueueMember {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, address: u8, value: u8) -> Result<(), DelayQueueError> {
        if self.is_full() {
            return Err(DelayQueueError::BucketFull {
                address,
                capacity: self.capacity,
            });
        }

        self.entries.push(Entry { address, value });
        Ok(())
    }

    /// Drops the entry for `address`, keeping the others in order
    pub fn remove(&mut self, address: u8) -> Option<u8> {
        let index = self.entries.iter().position(|e| e.address == address)?;
        Some(self.entries.remove(index).value)
    }

    pub fn value_of(&self, address: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|e| e.address == address)
            .map(|e| e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}
