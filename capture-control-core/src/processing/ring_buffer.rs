/// Fixed-capacity circular buffer.
///
/// Holds the pre-roll window of an engine output (encoded packets, audio
/// samples). Wrap in `Arc<parking_lot::Mutex<RingBuffer<T>>>` for
/// cross-thread access.
///
/// Overflow behavior: drops oldest items.
#[derive(Debug)]
pub struct RingBuffer<T> {
    buffer: Vec<Option<T>>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: (0..capacity).map(|_| None).collect(),
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
        }
    }

    /// Append one item, evicting the oldest when full.
    ///
    /// Returns the evicted item, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.available == self.capacity {
            let old = self.buffer[self.read_index].take();
            self.read_index = (self.read_index + 1) % self.capacity;
            self.available -= 1;
            old
        } else {
            None
        };

        self.buffer[self.write_index] = Some(item);
        self.write_index = (self.write_index + 1) % self.capacity;
        self.available += 1;
        evicted
    }

    /// Append every item in order. If more than `capacity` items are given,
    /// only the last `capacity` remain.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.push(item);
        }
    }

    /// Read and remove up to `count` of the oldest items.
    pub fn read(&mut self, count: usize) -> Vec<T> {
        let to_read = count.min(self.available);
        let mut result = Vec::with_capacity(to_read);
        for _ in 0..to_read {
            if let Some(item) = self.buffer[self.read_index].take() {
                result.push(item);
            }
            self.read_index = (self.read_index + 1) % self.capacity;
            self.available -= 1;
        }
        result
    }

    /// Empty the buffer, returning only the newest `count` items (oldest first).
    pub fn take_latest(&mut self, count: usize) -> Vec<T> {
        let skip = self.available.saturating_sub(count);
        drop(self.read(skip));
        let latest = self.read(self.available);
        self.reset();
        latest
    }

    /// Iterate over retained items, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.available).filter_map(move |i| self.buffer[(self.read_index + i) % self.capacity].as_ref())
    }

    /// Number of items currently retained.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn is_full(&self) -> bool {
        self.available == self.capacity
    }

    /// Reset the buffer to empty state.
    pub fn reset(&mut self) {
        for slot in &mut self.buffer {
            *slot = None;
        }
        self.write_index = 0;
        self.read_index = 0;
        self.available = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
