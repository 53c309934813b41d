use std::collections::VecDeque;
use std::path::Path;
use std::time::Instant;

use taskview::cancel::CancelToken;
use taskview::metrics::{
    feed, CpuMemory, FeedSender, SampleError, Sampler, SamplerConfig, SharedHistory,
    SystemSource,
};
use taskview::presenter::{Presenter, PresenterConfig};
use taskview::process::{
    ControlAction, ControlError, ProcessController, ProcessError, ProcessRecord, ProcessSource,
};

struct ScriptedSystem {
    cpu: VecDeque<f32>,
}

impl ScriptedSystem {
    fn new(cpu: impl IntoIterator<Item = f32>) -> Self {
        Self {
            cpu: cpu.into_iter().collect(),
        }
    }
}

impl SystemSource for ScriptedSystem {
    fn cpu_memory(&mut self) -> Result<CpuMemory, SampleError> {
        let cpu_percent = self.cpu.pop_front().ok_or(SampleError::Unavailable("cpu"))?;
        Ok(CpuMemory {
            cpu_percent,
            memory_used_bytes: 1 << 30,
            memory_total_bytes: 4 << 30,
        })
    }

    fn network_totals(&mut self) -> Result<u64, SampleError> {
        Ok(1_000_000)
    }

    fn disk_usage(&mut self, _path: &Path) -> Result<f32, SampleError> {
        Ok(61.5)
    }
}

struct Processes(Vec<Result<ProcessRecord, ProcessError>>);

impl ProcessSource for Processes {
    fn snapshot(&mut self) -> Vec<Result<ProcessRecord, ProcessError>> {
        self.0.clone()
    }
}

fn record(pid: u32, name: &str) -> ProcessRecord {
    ProcessRecord {
        pid,
        name: name.to_string(),
        cpu_percent: 0.0,
        memory_percent: 0.0,
        memory_bytes: 0,
        status: "Run".to_string(),
        owner: Some("user".to_string()),
        thread_count: None,
        handle_count: None,
        executable_path: None,
    }
}

struct Pipeline {
    sampler: Sampler<ScriptedSystem>,
    sender: FeedSender,
    history: SharedHistory,
    presenter: Presenter<Processes>,
    cancel: CancelToken,
}

impl Pipeline {
    fn new(capacity: usize, cpu: impl IntoIterator<Item = f32>) -> Self {
        let history = SharedHistory::new(capacity);
        let (sender, receiver) = feed();
        let processes = Processes(vec![
            Ok(record(1, "init")),
            Err(ProcessError::Exited { pid: 2 }),
            Ok(record(3, "shell")),
        ]);
        let presenter = Presenter::new(
            receiver,
            history.clone(),
            processes,
            &PresenterConfig::default(),
            Instant::now(),
        );
        Self {
            sampler: Sampler::new(ScriptedSystem::new(cpu), SamplerConfig::default()),
            sender,
            history,
            presenter,
            cancel: CancelToken::new(),
        }
    }

    fn sample(&mut self, times: usize) {
        for _ in 0..times {
            self.sampler
                .step(&self.history, &self.sender, &self.cancel)
                .expect("scripted reading");
        }
    }
}

#[test]
fn display_shows_only_the_newest_sample() {
    let mut pipeline = Pipeline::new(50, [10.0, 15.0, 12.0]);
    pipeline.sample(3);

    let report = pipeline.presenter.tick(Instant::now());
    assert_eq!(report.drained, 3);
    assert!(report.processes_refreshed);
    assert!(report.charts_refreshed);

    let display = pipeline.presenter.display();
    assert_eq!(display.cpu_percent, 12.0);
    assert_eq!(display.memory_percent, 25.0);
    assert_eq!(display.disk_percent, Some(61.5));
    // First network reading only sets the baseline
    assert_eq!(display.network_kbps, None);

    let charts = pipeline.presenter.charts();
    assert_eq!(charts.cpu, vec![10.0, 15.0, 12.0]);
    assert_eq!(charts.memory.len(), 3);
    assert_eq!(charts.disk, vec![61.5]);
    assert!(charts.network.is_empty());
}

#[test]
fn process_listing_skips_unreadable_entries() {
    let mut pipeline = Pipeline::new(50, []);
    pipeline.presenter.tick(Instant::now());

    let listing = pipeline.presenter.listing();
    assert_eq!(listing.total, 2);
    let pids: Vec<u32> = listing.records.iter().map(|r| r.pid).collect();
    assert_eq!(pids, vec![1, 3]);
}

#[test]
fn history_keeps_at_most_capacity_points() {
    let mut pipeline = Pipeline::new(3, [1.0, 2.0, 3.0, 4.0, 5.0]);
    pipeline.sample(5);
    pipeline.presenter.tick(Instant::now());

    let charts = pipeline.presenter.charts();
    assert_eq!(charts.capacity, 3);
    assert_eq!(charts.cpu, vec![3.0, 4.0, 5.0]);
    assert_eq!(charts.memory.len(), 3);

    let stats = charts.stats.cpu.expect("cpu stats");
    assert_eq!(stats.average, 4.0);
    assert_eq!(stats.peak, 5.0);
}

#[test]
fn clearing_history_empties_every_series() {
    let mut pipeline = Pipeline::new(10, [30.0, 40.0, 50.0]);
    pipeline.sample(2);
    pipeline.presenter.tick(Instant::now());

    pipeline.presenter.clear_history();
    {
        let history = pipeline.history.read();
        assert!(history.cpu.is_empty());
        assert!(history.memory.is_empty());
        assert!(history.network.is_empty());
        assert!(history.disk.is_empty());
    }
    assert!(pipeline.presenter.charts().cpu.is_empty());
    assert_eq!(pipeline.presenter.display().disk_percent, None);

    pipeline.sample(1);
    pipeline.presenter.refresh_charts();
    assert_eq!(pipeline.presenter.charts().cpu, vec![50.0]);
}

#[test]
fn failed_control_leaves_pipeline_untouched() {
    let mut pipeline = Pipeline::new(10, [20.0, 25.0]);
    pipeline.sample(1);

    let missing = u32::MAX - 3;
    let mut controller = ProcessController::new();
    assert_eq!(
        controller.apply(missing, ControlAction::Kill),
        Err(ControlError::NotFound { pid: missing })
    );

    pipeline.sample(1);
    let report = pipeline.presenter.tick(Instant::now());
    assert_eq!(report.drained, 2);
    assert_eq!(pipeline.presenter.display().cpu_percent, 25.0);
    assert_eq!(pipeline.history.read().cpu.to_vec(), vec![20.0, 25.0]);
}

#[test]
fn cancelled_sampler_emits_nothing() {
    let mut pipeline = Pipeline::new(10, [20.0]);
    pipeline.cancel.cancel();

    assert_eq!(
        pipeline
            .sampler
            .step(&pipeline.history, &pipeline.sender, &pipeline.cancel),
        None
    );
    let report = pipeline.presenter.tick(Instant::now());
    assert_eq!(report.drained, 0);
    assert!(pipeline.history.read().cpu.is_empty());
}
