use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of points kept per series unless configured otherwise
pub const DEFAULT_HISTORY_LEN: usize = 50;

/// A fixed-size circular buffer of metric values.
///
/// Pushing into a full buffer overwrites the oldest value.
#[derive(Debug, Clone)]
pub struct HistorySeries {
    data: Vec<f32>,
    position: usize,
    capacity: usize,
}

impl HistorySeries {
    /// Creates an empty series holding at most `capacity` values
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity),
            position: 0,
            capacity,
        }
    }

    /// Adds a new value, evicting the oldest one when full
    pub fn push(&mut self, value: f32) {
        if self.data.len() < self.capacity {
            self.data.push(value);
        } else {
            self.data[self.position] = value;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns two slices representing the data in chronological order
    pub fn as_slices(&self) -> (&[f32], &[f32]) {
        if self.data.len() < self.capacity {
            return (&self.data, &[]);
        }
        let (first, second) = self.data.split_at(self.position);
        (second, first)
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        let (older, newer) = self.as_slices();
        older.iter().chain(newer)
    }

    /// Returns the values oldest first, newest at the end
    pub fn to_vec(&self) -> Vec<f32> {
        let (older, newer) = self.as_slices();
        let mut result = Vec::with_capacity(self.data.len());
        result.extend_from_slice(older);
        result.extend_from_slice(newer);
        result
    }

    pub fn last(&self) -> Option<f32> {
        if self.data.is_empty() {
            return None;
        }
        let idx = if self.position == 0 {
            self.data.len() - 1
        } else {
            self.position - 1
        };
        Some(self.data[idx])
    }

    pub fn average(&self) -> Option<f32> {
        if self.data.is_empty() {
            return None;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        Some((sum / self.data.len() as f64) as f32)
    }

    pub fn peak(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    /// Rebuilds the series with a new capacity, keeping the newest values that fit
    pub fn resized(&self, capacity: usize) -> Self {
        let mut series = Self::new(capacity);
        let values = self.to_vec();
        let skip = values.len().saturating_sub(series.capacity);
        for value in values.into_iter().skip(skip) {
            series.push(value);
        }
        series
    }
}

/// Average and peak of one series
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesStats {
    pub average: f32,
    pub peak: f32,
}

impl SeriesStats {
    fn of(series: &HistorySeries) -> Option<Self> {
        Some(Self {
            average: series.average()?,
            peak: series.peak()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoryStats {
    pub cpu: Option<SeriesStats>,
    pub memory: Option<SeriesStats>,
    pub network: Option<SeriesStats>,
    pub disk: Option<SeriesStats>,
}

/// The four charted series.
///
/// Appends come from the sampler thread; clear may come from the UI, so
/// the whole struct sits behind one lock (see [`SharedHistory`]).
#[derive(Debug, Clone)]
pub struct History {
    pub cpu: HistorySeries,
    pub memory: HistorySeries,
    /// Network throughput in KB/s
    pub network: HistorySeries,
    /// Usage percent of the monitored filesystem
    pub disk: HistorySeries,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: HistorySeries::new(capacity),
            memory: HistorySeries::new(capacity),
            network: HistorySeries::new(capacity),
            disk: HistorySeries::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cpu.capacity()
    }

    pub fn clear(&mut self) {
        self.cpu.clear();
        self.memory.clear();
        self.network.clear();
        self.disk.clear();
    }

    pub fn resize(&mut self, capacity: usize) {
        if capacity.max(1) == self.capacity() {
            return;
        }
        self.cpu = self.cpu.resized(capacity);
        self.memory = self.memory.resized(capacity);
        self.network = self.network.resized(capacity);
        self.disk = self.disk.resized(capacity);
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            cpu: SeriesStats::of(&self.cpu),
            memory: SeriesStats::of(&self.memory),
            network: SeriesStats::of(&self.network),
            disk: SeriesStats::of(&self.disk),
        }
    }
}

/// History shared between the sampler and the presenter
#[derive(Debug, Clone, Default)]
pub struct SharedHistory(Arc<RwLock<History>>);

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self(Arc::new(RwLock::new(History::new(capacity))))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, History> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, History> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Empties all four series in one critical section
    pub fn clear(&self) {
        self.write().clear();
    }
}
