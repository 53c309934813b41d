use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::metrics::{default_disk_path, SamplerConfig, DEFAULT_HISTORY_LEN};
use crate::presenter::PresenterConfig;
use crate::process::{ProcessFilter, DEFAULT_PROCESS_LIMIT};

#[derive(serde::Deserialize, serde::Serialize, Clone, Copy, PartialEq, Debug)]
pub enum MemoryUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl MemoryUnit {
    pub const ALL: [MemoryUnit; 4] = [
        MemoryUnit::Bytes,
        MemoryUnit::Kilobytes,
        MemoryUnit::Megabytes,
        MemoryUnit::Gigabytes,
    ];

    pub fn format_value(&self, bytes: f64) -> (f64, &'static str) {
        match self {
            MemoryUnit::Bytes => (bytes, "B"),
            MemoryUnit::Kilobytes => (bytes / 1024.0, "KB"),
            MemoryUnit::Megabytes => (bytes / (1024.0 * 1024.0), "MB"),
            MemoryUnit::Gigabytes => (bytes / (1024.0 * 1024.0 * 1024.0), "GB"),
        }
    }

    pub fn format(&self, bytes: u64) -> String {
        let (value, suffix) = self.format_value(bytes as f64);
        match self {
            MemoryUnit::Bytes => format!("{value:.0} {suffix}"),
            _ => format!("{value:.1} {suffix}"),
        }
    }
}

/// Valid range of every refresh interval, in milliseconds
pub const INTERVAL_RANGE_MS: RangeInclusive<u64> = 100..=10_000;
/// Valid range of the points kept per history series
pub const HISTORY_LENGTH_RANGE: RangeInclusive<usize> = 10..=500;

fn interval(ms: u64) -> Duration {
    Duration::from_millis(ms.clamp(*INTERVAL_RANGE_MS.start(), *INTERVAL_RANGE_MS.end()))
}

/// User preferences, persisted through eframe storage.
///
/// Stored values are not trusted; the accessors clamp them to the ranges the
/// settings window allows.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub scale: f32,
    pub font_size: f32,
    pub memory_unit: MemoryUnit,
    pub consumer_interval_ms: u64,
    pub process_refresh_ms: u64,
    pub chart_refresh_ms: u64,
    /// Takes effect on next start
    pub sample_interval_ms: u64,
    /// Takes effect on next start
    pub counters_interval_ms: u64,
    /// Takes effect on next start
    pub disk_path: PathBuf,
    pub history_length: usize,
    pub process_filter: ProcessFilter,
    #[serde(skip)]
    show_window: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scale: 1.2,
            font_size: 15.0,
            memory_unit: MemoryUnit::Megabytes,
            consumer_interval_ms: 500,
            process_refresh_ms: 1000,
            chart_refresh_ms: 1500,
            sample_interval_ms: 500,
            counters_interval_ms: 1000,
            disk_path: default_disk_path(),
            history_length: DEFAULT_HISTORY_LEN,
            process_filter: ProcessFilter::default(),
            show_window: false,
        }
    }
}

impl Settings {
    pub fn show(&mut self) {
        self.show_window = true;
    }

    pub fn is_visible(&self) -> bool {
        self.show_window
    }

    pub fn hide(&mut self) {
        self.show_window = false;
    }

    pub fn history_length(&self) -> usize {
        self.history_length
            .clamp(*HISTORY_LENGTH_RANGE.start(), *HISTORY_LENGTH_RANGE.end())
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            sample_interval: interval(self.sample_interval_ms),
            counters_interval: interval(self.counters_interval_ms),
            disk_path: self.disk_path.clone(),
        }
    }

    pub fn presenter_config(&self) -> PresenterConfig {
        PresenterConfig {
            consumer_interval: interval(self.consumer_interval_ms),
            process_refresh_interval: interval(self.process_refresh_ms),
            chart_refresh_interval: interval(self.chart_refresh_ms),
        }
    }

    pub fn apply(&self, ctx: &egui::Context) {
        ctx.set_pixels_per_point(self.scale);

        let mut style = (*ctx.style()).clone();
        style.text_styles = [
            (
                egui::TextStyle::Heading,
                egui::FontId::new(self.font_size + 4.0, egui::FontFamily::Proportional),
            ),
            (
                egui::TextStyle::Body,
                egui::FontId::new(self.font_size, egui::FontFamily::Proportional),
            ),
            (
                egui::TextStyle::Monospace,
                egui::FontId::new(self.font_size, egui::FontFamily::Monospace),
            ),
            (
                egui::TextStyle::Button,
                egui::FontId::new(self.font_size, egui::FontFamily::Proportional),
            ),
            (
                egui::TextStyle::Small,
                egui::FontId::new(self.font_size - 2.0, egui::FontFamily::Proportional),
            ),
        ]
        .into();
        ctx.set_style(style);
    }
}
