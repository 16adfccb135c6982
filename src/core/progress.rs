use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

/// Weighted progress over a fixed set of units (the whole payload, or one unit
/// per part). Each unit weighs `unit_size / total_size`, so the global value is
/// `floor(100 * sent / total)` computed exactly over byte counts.
pub struct ProgressAggregator {
    units: Mutex<UnitTable>,
    percent_tx: watch::Sender<u8>,
}

struct UnitTable {
    sizes: Vec<u64>,
    sent: Vec<u64>,
    finished: Vec<bool>,
    total_bytes: u64,
}

impl UnitTable {
    fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            let all_finished = !self.finished.is_empty() && self.finished.iter().all(|done| *done);
            return if all_finished { 100 } else { 0 };
        }

        let sent: u64 = self.sent.iter().sum();
        let percent = (sent as u128 * 100) / self.total_bytes as u128;
        percent.min(100) as u8
    }
}

impl ProgressAggregator {
    /// Starts every unit at zero and publishes into `percent_tx`.
    pub fn new(unit_sizes: Vec<u64>, percent_tx: watch::Sender<u8>) -> Self {
        let total_bytes = unit_sizes.iter().sum();
        let count = unit_sizes.len();

        Self {
            units: Mutex::new(UnitTable {
                sizes: unit_sizes,
                sent: vec![0; count],
                finished: vec![false; count],
                total_bytes,
            }),
            percent_tx,
        }
    }

    /// Aggregator with its own channel, for callers that only pull.
    pub fn detached(unit_sizes: Vec<u64>) -> Self {
        let (percent_tx, _) = watch::channel(0);
        Self::new(unit_sizes, percent_tx)
    }

    /// Records the cumulative bytes sent for `unit`. Values beyond the unit's
    /// size are clamped and values below the last seen one are ignored.
    pub fn update(&self, unit: usize, bytes_sent: u64) -> u8 {
        let percent = {
            let mut units = self.units.lock();
            let Some(size) = units.sizes.get(unit).copied() else {
                return units.percent();
            };
            let bytes_sent = bytes_sent.min(size);
            if bytes_sent > units.sent[unit] {
                units.sent[unit] = bytes_sent;
            }
            units.percent()
        };

        self.publish(percent)
    }

    /// Same as [`update`](Self::update) but with a fraction in `[0, 1]`.
    pub fn update_fraction(&self, unit: usize, fraction: f64) -> u8 {
        let size = self.units.lock().sizes.get(unit).copied();
        let Some(size) = size else {
            return self.percent();
        };
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };

        self.update(unit, (size as f64 * fraction).floor() as u64)
    }

    /// Marks `unit` fully transferred.
    pub fn finish(&self, unit: usize) -> u8 {
        let percent = {
            let mut units = self.units.lock();
            if let Some(size) = units.sizes.get(unit).copied() {
                units.sent[unit] = size;
                units.finished[unit] = true;
            }
            units.percent()
        };

        self.publish(percent)
    }

    pub fn percent(&self) -> u8 {
        self.units.lock().percent()
    }

    /// Progress of one unit in `[0, 1]`.
    pub fn fraction(&self, unit: usize) -> f64 {
        let units = self.units.lock();
        match units.sizes.get(unit) {
            Some(0) => if units.finished[unit] { 1.0 } else { 0.0 },
            Some(size) => units.sent[unit] as f64 / *size as f64,
            None => 0.0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.percent_tx.subscribe()
    }

    fn publish(&self, percent: u8) -> u8 {
        self.percent_tx.send_if_modified(|current| {
            if percent > *current {
                *current = percent;
                true
            } else {
                false
            }
        });

        percent
    }
}

/// Write access to a single unit of an aggregator, handed to the transport.
#[derive(Clone)]
pub struct UnitProgress {
    aggregator: Arc<ProgressAggregator>,
    unit: usize,
}

impl UnitProgress {
    pub fn new(aggregator: Arc<ProgressAggregator>, unit: usize) -> Self {
        Self { aggregator, unit }
    }

    pub fn report(&self, bytes_sent: u64) {
        self.aggregator.update(self.unit, bytes_sent);
    }

    pub fn finish(&self) {
        self.aggregator.finish(self.unit);
    }
}
