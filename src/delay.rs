use nih_plug::nih_debug_assert;

/// Fixed-capacity ring buffer delay. The storage is allocated once in [`DelayLine::new`] and never
/// resized afterwards, so it's safe to use from the audio thread.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    delay: usize,
    pos: usize,
}

impl DelayLine {
    /// `capacity` is the ring size. The longest possible delay is `capacity - 1` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            delay: 0,
            pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Clamps `num_samples` to the capacity. Changing the delay clears the buffer, so the next
    /// `num_samples` outputs are silence.
    pub fn set_delay(&mut self, num_samples: usize) {
        let num_samples = num_samples.min(self.capacity() - 1);
        if num_samples == self.delay {
            return;
        }

        self.delay = num_samples;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }

    #[inline]
    pub fn process_sample(&mut self, sample: f32) -> f32 {
        let capacity = self.capacity();
        nih_debug_assert!(self.delay < capacity);

        self.buffer[(self.pos + self.delay) % capacity] = sample;
        let delayed = self.buffer[self.pos];
        self.pos = (self.pos + 1) % capacity;

        delayed
    }
}
