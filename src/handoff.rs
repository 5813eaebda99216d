//! Lock-free handoff of whole [`Settings`] records from a control thread to the audio thread.
//!
//! This is a sequence lock over atomic cells. The writer makes the sequence odd while it stores
//! the fields and even again once it's done. The reader only accepts a record if it saw the same
//! even sequence before and after reading the fields, so it never applies a half-written record
//! and never waits for the writer.

use atomic_float::AtomicF32;
use std::sync::atomic::{fence, AtomicU32, Ordering};
use std::sync::Arc;

use crate::limiter::Settings;

#[derive(Debug)]
struct Shared {
    sequence: AtomicU32,
    lookahead_ms: AtomicF32,
    input_db: AtomicF32,
    output_db: AtomicF32,
    threshold_db: AtomicF32,
    attack_ms: AtomicF32,
    release_ms: AtomicF32,
}

impl Shared {
    fn store(&self, settings: &Settings) {
        self.lookahead_ms
            .store(settings.lookahead_ms, Ordering::Relaxed);
        self.input_db.store(settings.input_db, Ordering::Relaxed);
        self.output_db.store(settings.output_db, Ordering::Relaxed);
        self.threshold_db
            .store(settings.threshold_db, Ordering::Relaxed);
        self.attack_ms.store(settings.attack_ms, Ordering::Relaxed);
        self.release_ms.store(settings.release_ms, Ordering::Relaxed);
    }

    fn load(&self) -> Settings {
        Settings {
            lookahead_ms: self.lookahead_ms.load(Ordering::Relaxed),
            input_db: self.input_db.load(Ordering::Relaxed),
            output_db: self.output_db.load(Ordering::Relaxed),
            threshold_db: self.threshold_db.load(Ordering::Relaxed),
            attack_ms: self.attack_ms.load(Ordering::Relaxed),
            release_ms: self.release_ms.load(Ordering::Relaxed),
        }
    }
}

/// The control side. There's exactly one per channel, publishing takes `&mut self`.
#[derive(Debug)]
pub struct SettingsWriter {
    shared: Arc<Shared>,
}

/// The audio side.
#[derive(Debug)]
pub struct SettingsReader {
    shared: Arc<Shared>,
    seen: u32,
}

/// Creates a connected writer and reader. The first [`SettingsReader::poll()`] returns `initial`.
pub fn settings_channel(initial: Settings) -> (SettingsWriter, SettingsReader) {
    let shared = Arc::new(Shared {
        sequence: AtomicU32::new(2),
        lookahead_ms: AtomicF32::new(initial.lookahead_ms),
        input_db: AtomicF32::new(initial.input_db),
        output_db: AtomicF32::new(initial.output_db),
        threshold_db: AtomicF32::new(initial.threshold_db),
        attack_ms: AtomicF32::new(initial.attack_ms),
        release_ms: AtomicF32::new(initial.release_ms),
    });

    (
        SettingsWriter {
            shared: shared.clone(),
        },
        SettingsReader { shared, seen: 0 },
    )
}

impl SettingsWriter {
    pub fn publish(&mut self, settings: Settings) {
        let sequence = self.shared.sequence.load(Ordering::Relaxed);

        self.shared
            .sequence
            .store(sequence.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        self.shared.store(&settings);
        self.shared
            .sequence
            .store(sequence.wrapping_add(2), Ordering::Release);
    }
}

impl SettingsReader {
    /// Returns the latest record if it's complete and hasn't been returned before. Returns `None`
    /// while the writer is in the middle of publishing, the next poll picks the record up.
    pub fn poll(&mut self) -> Option<Settings> {
        let before = self.shared.sequence.load(Ordering::Acquire);
        if before == self.seen || before % 2 == 1 {
            return None;
        }

        let settings = self.shared.load();
        fence(Ordering::Acquire);
        let after = self.shared.sequence.load(Ordering::Relaxed);
        if after != before {
            return None;
        }

        self.seen = before;
        Some(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn uniform(value: f32) -> Settings {
        Settings {
            lookahead_ms: value,
            input_db: value,
            output_db: value,
            threshold_db: value,
            attack_ms: value,
            release_ms: value,
        }
    }

    #[test]
    fn delivers_each_record_once() {
        let (mut writer, mut reader) = settings_channel(uniform(1.0));

        assert_eq!(reader.poll(), Some(uniform(1.0)));
        assert_eq!(reader.poll(), None);

        writer.publish(uniform(2.0));
        writer.publish(uniform(3.0));
        assert_eq!(reader.poll(), Some(uniform(3.0)));
        assert_eq!(reader.poll(), None);
    }

    #[test]
    fn never_observes_torn_records() {
        let (mut writer, mut reader) = settings_channel(uniform(0.0));

        let publisher = thread::spawn(move || {
            for i in 1..=20_000 {
                writer.publish(uniform(i as f32));
            }
        });

        let mut last = -1.0;
        while !publisher.is_finished() {
            if let Some(settings) = reader.poll() {
                assert_eq!(settings, uniform(settings.lookahead_ms));
                assert!(settings.lookahead_ms > last);
                last = settings.lookahead_ms;
            }
        }
        publisher.join().unwrap();

        if let Some(settings) = reader.poll() {
            last = settings.lookahead_ms;
        }
        assert_eq!(last, 20_000.0);
    }
}
