use std::time::{Duration, Instant};

use log::debug;

use crate::metrics::{FeedReceiver, HistoryStats, Sample, SharedHistory};
use crate::process::{enumerate, ProcessFilter, ProcessListing, ProcessRecord, ProcessSource};
use crate::schedule::Ticker;

#[derive(Debug, Clone, PartialEq)]
pub struct PresenterConfig {
    /// How often the feed is drained
    pub consumer_interval: Duration,
    pub process_refresh_interval: Duration,
    pub chart_refresh_interval: Duration,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            consumer_interval: Duration::from_millis(500),
            process_refresh_interval: Duration::from_millis(1000),
            chart_refresh_interval: Duration::from_millis(1500),
        }
    }
}

/// The scalar values currently on screen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayState {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub sampled_at: Option<Instant>,
    pub network_kbps: Option<f32>,
    pub disk_percent: Option<f32>,
}

impl DisplayState {
    pub fn apply(&mut self, sample: &Sample) {
        self.cpu_percent = sample.cpu_percent;
        self.memory_percent = sample.memory_percent;
        self.memory_used_bytes = sample.memory_used_bytes;
        self.memory_total_bytes = sample.memory_total_bytes;
        self.sampled_at = Some(sample.timestamp);
    }
}

/// Copy of the history taken for drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSnapshot {
    pub cpu: Vec<f32>,
    pub memory: Vec<f32>,
    pub network: Vec<f32>,
    pub disk: Vec<f32>,
    pub capacity: usize,
    pub stats: HistoryStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub drained: usize,
    pub processes_refreshed: bool,
    pub charts_refreshed: bool,
}

/// Application state behind the UI.
///
/// Shares only the feed and the history with the sampler thread; all other
/// fields are owned here and touched on the UI thread.
pub struct Presenter<P> {
    feed: FeedReceiver,
    history: SharedHistory,
    processes: P,
    filter: ProcessFilter,
    snapshot: Vec<ProcessRecord>,
    listing: ProcessListing,
    display: DisplayState,
    charts: ChartSnapshot,
    consumer: Ticker,
    process_refresh: Ticker,
    chart_refresh: Ticker,
    auto_refresh: bool,
}

impl<P: ProcessSource> Presenter<P> {
    pub fn new(
        feed: FeedReceiver,
        history: SharedHistory,
        processes: P,
        config: &PresenterConfig,
        now: Instant,
    ) -> Self {
        Self {
            feed,
            history,
            processes,
            filter: ProcessFilter::default(),
            snapshot: Vec::new(),
            listing: ProcessListing::default(),
            display: DisplayState::default(),
            charts: ChartSnapshot::default(),
            consumer: Ticker::immediate(config.consumer_interval, now),
            process_refresh: Ticker::immediate(config.process_refresh_interval, now),
            chart_refresh: Ticker::immediate(config.chart_refresh_interval, now),
            auto_refresh: true,
        }
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn listing(&self) -> &ProcessListing {
        &self.listing
    }

    pub fn charts(&self) -> &ChartSnapshot {
        &self.charts
    }

    pub fn filter(&self) -> &ProcessFilter {
        &self.filter
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub fn processes_mut(&mut self) -> &mut P {
        &mut self.processes
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn set_config(&mut self, config: &PresenterConfig, now: Instant) {
        self.consumer.set_period(config.consumer_interval, now);
        self.process_refresh.set_period(config.process_refresh_interval, now);
        self.chart_refresh.set_period(config.chart_refresh_interval, now);
    }

    /// Applies a new filter to the last enumeration without querying the OS
    pub fn set_filter(&mut self, filter: ProcessFilter) {
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.apply_filter();
    }

    /// Time until the next consumer tick is due
    pub fn next_wakeup(&self, now: Instant) -> Duration {
        self.consumer.remaining(now)
    }

    /// Runs a consumer tick if one is due and auto refresh is on.
    ///
    /// While auto refresh is off the feed is still drained on schedule so the
    /// backlog stays bounded; those samples are discarded.
    pub fn poll(&mut self, now: Instant) -> Option<TickReport> {
        if !self.consumer.poll(now) {
            return None;
        }
        if !self.auto_refresh {
            let dropped = self.feed.drain().count;
            if dropped > 0 {
                debug!("Auto refresh off, discarded {} samples", dropped);
            }
            return None;
        }
        Some(self.tick(now))
    }

    /// Drains the feed, then refreshes whatever is due.
    ///
    /// Only the newest drained sample reaches the display.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let drained = self.feed.drain();
        if let Some(sample) = drained.latest {
            self.display.apply(&sample);
        }

        let processes_refreshed = self.process_refresh.poll(now);
        if processes_refreshed {
            self.refresh_processes();
        }
        let charts_refreshed = self.chart_refresh.poll(now);
        if charts_refreshed {
            self.refresh_charts();
        }

        TickReport {
            drained: drained.count,
            processes_refreshed,
            charts_refreshed,
        }
    }

    /// Refreshes processes and charts right away
    pub fn force_refresh(&mut self) {
        if let Some(sample) = self.feed.drain().latest {
            self.display.apply(&sample);
        }
        self.refresh_processes();
        self.refresh_charts();
    }

    pub fn refresh_processes(&mut self) {
        let entries = self.processes.snapshot();
        let everything = ProcessFilter {
            limit: usize::MAX,
            ..Default::default()
        };
        self.snapshot = enumerate(entries, &everything).records;
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        self.listing = enumerate(self.snapshot.iter().cloned().map(Ok), &self.filter);
        debug!(
            "Process list: {} shown, {} matched, {} total",
            self.listing.records.len(),
            self.listing.matched,
            self.listing.total
        );
    }

    pub fn refresh_charts(&mut self) {
        let history = self.history.read();
        self.charts = ChartSnapshot {
            cpu: history.cpu.to_vec(),
            memory: history.memory.to_vec(),
            network: history.network.to_vec(),
            disk: history.disk.to_vec(),
            capacity: history.capacity(),
            stats: history.stats(),
        };
        self.display.network_kbps = history.network.last();
        self.display.disk_percent = history.disk.last();
    }

    /// Empties all four series and the charts drawn from them
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.charts = ChartSnapshot {
            capacity: self.charts.capacity,
            ..Default::default()
        };
        self.display.network_kbps = None;
        self.display.disk_percent = None;
    }

    /// Changes how many points each series keeps
    pub fn resize_history(&mut self, capacity: usize) {
        self.history.write().resize(capacity);
        self.refresh_charts();
    }
}
