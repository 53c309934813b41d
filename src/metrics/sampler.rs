use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::{FeedSender, Sample, SampleError, SharedHistory, SystemSource};
use crate::cancel::CancelToken;
use crate::schedule::Ticker;

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// How often CPU and memory are read
    pub sample_interval: Duration,
    /// How often network and disk counters are read
    pub counters_interval: Duration,
    /// Any path on the filesystem whose usage is charted
    pub disk_path: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            counters_interval: Duration::from_millis(1000),
            disk_path: default_disk_path(),
        }
    }
}

pub fn default_disk_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

/// Turns the cumulative network byte counter into KB/s
#[derive(Debug, Clone, Default)]
pub struct NetworkRate {
    previous: Option<(u64, Instant)>,
}

impl NetworkRate {
    /// Returns the rate since the previous reading.
    ///
    /// The first reading, and any reading after the counter went
    /// backwards, only sets the baseline.
    pub fn update(&mut self, total_bytes: u64, at: Instant) -> Option<f32> {
        let previous = self.previous.replace((total_bytes, at));
        let (prev_bytes, prev_at) = previous?;
        if total_bytes < prev_bytes {
            debug!("Network counters went backwards, resetting baseline");
            return None;
        }
        let elapsed = at.saturating_duration_since(prev_at).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        Some(((total_bytes - prev_bytes) as f64 / elapsed / 1024.0) as f32)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CounterReading {
    pub network_kbps: Option<f32>,
    pub disk_percent: Option<f32>,
}

/// Reads system metrics on a fixed cadence and feeds the presenter
pub struct Sampler<S> {
    source: S,
    config: SamplerConfig,
    network: NetworkRate,
    cadence: Ticker,
    counters: Ticker,
}

impl<S: SystemSource> Sampler<S> {
    pub fn new(source: S, config: SamplerConfig) -> Self {
        let now = Instant::now();
        Self {
            cadence: Ticker::immediate(config.sample_interval, now),
            counters: Ticker::immediate(config.counters_interval, now),
            source,
            config,
            network: NetworkRate::default(),
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Reads CPU and memory once
    pub fn tick(&mut self) -> Result<Sample, SampleError> {
        let reading = self.source.cpu_memory()?;
        Ok(Sample {
            cpu_percent: reading.cpu_percent,
            memory_percent: reading.memory_percent(),
            memory_used_bytes: reading.memory_used_bytes,
            memory_total_bytes: reading.memory_total_bytes,
            timestamp: Instant::now(),
        })
    }

    /// Reads the network and disk counters. Each one may fail on its own.
    pub fn sample_counters(&mut self, now: Instant, cancel: &CancelToken) -> CounterReading {
        let mut reading = CounterReading::default();

        match self.source.network_totals() {
            Ok(total) => reading.network_kbps = self.network.update(total, now),
            Err(err) => warn!("Skipping network sample: {}", err),
        }

        if cancel.is_cancelled() {
            return reading;
        }

        match self.source.disk_usage(&self.config.disk_path) {
            Ok(percent) => reading.disk_percent = Some(percent),
            Err(err) => warn!("Skipping disk sample: {}", err),
        }

        reading
    }

    /// One sampling iteration: read, append to history, hand off.
    ///
    /// Returns the sample that was emitted, if any.
    pub fn step(
        &mut self,
        history: &SharedHistory,
        feed: &FeedSender,
        cancel: &CancelToken,
    ) -> Option<Sample> {
        if cancel.is_cancelled() {
            return None;
        }

        let sample = match self.tick() {
            Ok(sample) => sample,
            Err(err) => {
                warn!("Skipping sample: {}", err);
                return None;
            }
        };

        let counters = if !cancel.is_cancelled() && self.counters.poll(sample.timestamp) {
            self.sample_counters(sample.timestamp, cancel)
        } else {
            CounterReading::default()
        };

        {
            let mut history = history.write();
            history.cpu.push(sample.cpu_percent);
            history.memory.push(sample.memory_percent);
            if let Some(kbps) = counters.network_kbps {
                history.network.push(kbps);
            }
            if let Some(percent) = counters.disk_percent {
                history.disk.push(percent);
            }
        }

        if !feed.push(sample) {
            debug!("Presenter is gone, sample dropped");
        }
        Some(sample)
    }

    /// Runs [`Sampler::step`] if the sample interval has elapsed
    pub fn poll(
        &mut self,
        now: Instant,
        history: &SharedHistory,
        feed: &FeedSender,
        cancel: &CancelToken,
    ) -> Option<Sample> {
        if !self.cadence.poll(now) {
            return None;
        }
        self.step(history, feed, cancel)
    }

    /// Time left until the next sample is due
    pub fn next_sample_in(&self, now: Instant) -> Duration {
        self.cadence.remaining(now)
    }

    /// Samples until `cancel` fires
    pub fn run(mut self, history: SharedHistory, feed: FeedSender, cancel: CancelToken) {
        info!(
            "Sampler started (every {:?}, counters every {:?})",
            self.config.sample_interval, self.config.counters_interval
        );
        while !cancel.is_cancelled() {
            self.poll(Instant::now(), &history, &feed, &cancel);
            if cancel.wait(self.next_sample_in(Instant::now())) {
                break;
            }
        }
        info!("Sampler stopped");
    }
}

impl<S: SystemSource + Send + 'static> Sampler<S> {
    /// Runs the sampler on its own thread
    pub fn spawn(self, history: SharedHistory, feed: FeedSender) -> io::Result<SamplerHandle> {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let thread = thread::Builder::new()
            .name("sampler".into())
            .spawn(move || self.run(history, feed, token))?;
        Ok(SamplerHandle {
            cancel,
            thread: Some(thread),
        })
    }
}

/// Owns the sampler thread; stops it when dropped
#[derive(Debug)]
pub struct SamplerHandle {
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Sampler thread panicked");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{feed, CpuMemory};
    use std::collections::VecDeque;
    use std::path::Path;

    #[derive(Default)]
    struct ScriptedSource {
        readings: VecDeque<Result<CpuMemory, SampleError>>,
        network: VecDeque<Result<u64, SampleError>>,
        disk: VecDeque<Result<f32, SampleError>>,
    }

    impl SystemSource for ScriptedSource {
        fn cpu_memory(&mut self) -> Result<CpuMemory, SampleError> {
            self.readings
                .pop_front()
                .unwrap_or(Err(SampleError::Unavailable("cpu")))
        }

        fn network_totals(&mut self) -> Result<u64, SampleError> {
            self.network
                .pop_front()
                .unwrap_or(Err(SampleError::Unavailable("network")))
        }

        fn disk_usage(&mut self, _path: &Path) -> Result<f32, SampleError> {
            self.disk
                .pop_front()
                .unwrap_or(Err(SampleError::Unavailable("disk")))
        }
    }

    fn reading(cpu_percent: f32) -> Result<CpuMemory, SampleError> {
        Ok(CpuMemory {
            cpu_percent,
            memory_used_bytes: 3 << 30,
            memory_total_bytes: 4 << 30,
        })
    }

    #[test]
    fn network_rate_needs_a_baseline() {
        let start = Instant::now();
        let mut rate = NetworkRate::default();
        assert_eq!(rate.update(10_000, start), None);
        let kbps = rate.update(10_000 + 2048, start + Duration::from_secs(2));
        assert_eq!(kbps, Some(1.0));
    }

    #[test]
    fn network_rate_rebaselines_on_counter_reset() {
        let start = Instant::now();
        let mut rate = NetworkRate::default();
        rate.update(50_000, start);
        assert_eq!(rate.update(100, start + Duration::from_secs(1)), None);
        assert_eq!(
            rate.update(100 + 1024, start + Duration::from_secs(2)),
            Some(1.0)
        );
    }

    #[test]
    fn tick_computes_memory_percent() {
        let source = ScriptedSource {
            readings: VecDeque::from([reading(42.0)]),
            ..Default::default()
        };
        let mut sampler = Sampler::new(source, SamplerConfig::default());
        let sample = sampler.tick().unwrap();
        assert_eq!(sample.cpu_percent, 42.0);
        assert_eq!(sample.memory_percent, 75.0);
        assert_eq!(sample.memory_total_bytes, 4 << 30);
    }

    #[test]
    fn failed_tick_emits_nothing() {
        let mut sampler = Sampler::new(ScriptedSource::default(), SamplerConfig::default());
        let history = SharedHistory::new(10);
        let (tx, rx) = feed();

        assert_eq!(sampler.step(&history, &tx, &CancelToken::new()), None);
        assert_eq!(rx.drain().count, 0);
        assert!(history.read().cpu.is_empty());
        assert!(history.read().memory.is_empty());
    }

    #[test]
    fn step_appends_and_hands_off() {
        let source = ScriptedSource {
            readings: VecDeque::from([reading(10.0), reading(20.0)]),
            network: VecDeque::from([Ok(1_000)]),
            disk: VecDeque::from([Ok(61.5)]),
        };
        let mut sampler = Sampler::new(source, SamplerConfig::default());
        let history = SharedHistory::new(10);
        let (tx, rx) = feed();
        let cancel = CancelToken::new();

        sampler.step(&history, &tx, &cancel);
        sampler.step(&history, &tx, &cancel);

        let drained = rx.drain();
        assert_eq!(drained.count, 2);
        assert_eq!(drained.latest.map(|s| s.cpu_percent), Some(20.0));

        let history = history.read();
        assert_eq!(history.cpu.to_vec(), vec![10.0, 20.0]);
        assert_eq!(history.memory.to_vec(), vec![75.0, 75.0]);
        // Counters are due on the first step only; the network read is a baseline
        assert!(history.network.is_empty());
        assert_eq!(history.disk.to_vec(), vec![61.5]);
    }

    #[test]
    fn sampling_period_includes_step_time() {
        let source = ScriptedSource {
            readings: VecDeque::from([reading(10.0), reading(20.0)]),
            ..Default::default()
        };
        let config = SamplerConfig {
            sample_interval: Duration::from_millis(100),
            ..Default::default()
        };
        let mut sampler = Sampler::new(source, config);
        let history = SharedHistory::new(10);
        let (tx, _rx) = feed();
        let cancel = CancelToken::new();
        let start = Instant::now();

        assert!(sampler.poll(start, &history, &tx, &cancel).is_some());
        // A slow step eats into the wait rather than stretching the period
        let after_step = start + Duration::from_millis(30);
        assert_eq!(sampler.next_sample_in(after_step), Duration::from_millis(70));
        assert!(sampler.poll(after_step, &history, &tx, &cancel).is_none());

        let due = start + Duration::from_millis(100);
        assert_eq!(sampler.next_sample_in(due), Duration::ZERO);
        assert!(sampler.poll(due, &history, &tx, &cancel).is_some());
        assert_eq!(history.read().cpu.to_vec(), vec![10.0, 20.0]);
    }

    #[test]
    fn counter_failures_do_not_drop_the_sample() {
        let source = ScriptedSource {
            readings: VecDeque::from([reading(5.0)]),
            ..Default::default()
        };
        let mut sampler = Sampler::new(source, SamplerConfig::default());
        let history = SharedHistory::new(10);
        let (tx, rx) = feed();

        let sample = sampler.step(&history, &tx, &CancelToken::new());
        assert_eq!(sample.map(|s| s.cpu_percent), Some(5.0));
        assert_eq!(rx.drain().count, 1);
        assert!(history.read().disk.is_empty());
    }

    #[test]
    fn cancelled_step_reads_nothing() {
        let source = ScriptedSource {
            readings: VecDeque::from([reading(5.0)]),
            ..Default::default()
        };
        let mut sampler = Sampler::new(source, SamplerConfig::default());
        let (tx, rx) = feed();
        let cancel = CancelToken::new();
        cancel.cancel();

        assert_eq!(sampler.step(&SharedHistory::new(3), &tx, &cancel), None);
        assert_eq!(rx.drain().count, 0);
    }

    #[test]
    fn handle_stops_the_thread() {
        let source = ScriptedSource {
            readings: (0..1000).map(|n| reading(n as f32 % 100.0)).collect(),
            ..Default::default()
        };
        let config = SamplerConfig {
            sample_interval: Duration::from_millis(5),
            ..Default::default()
        };
        let history = SharedHistory::new(50);
        let (tx, rx) = feed();

        let handle = Sampler::new(source, config)
            .spawn(history.clone(), tx)
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        assert!(handle.is_running());
        handle.shutdown();

        let produced = rx.drain().count;
        assert!(produced > 0);
        assert!(history.read().cpu.len() <= 50);
        // Nothing arrives after shutdown
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.drain().count, 0);
    }
}
