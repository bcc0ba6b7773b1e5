/// Fixed-capacity FIFO over the trailing observations of a window.
#[derive(Clone, Debug)]
pub(crate) struct RingBuffer<T> {
    buffer: Vec<T>,
    head: usize,
    capacity: usize,
}

impl<T: Copy> RingBuffer<T> {
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring buffer capacity must be positive");

        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn is_ready(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Appends `value`; once full, returns the evicted oldest value.
    #[inline]
    pub(crate) fn push(&mut self, value: T) -> Option<T> {
        if self.is_ready() {
            let old = std::mem::replace(&mut self.buffer[self.head], value);

            self.head += 1;
            if self.head == self.capacity {
                self.head = 0;
            }

            Some(old)
        } else {
            self.buffer.push(value);

            None
        }
    }

    /// Held values in storage order, not insertion order.
    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }
}
