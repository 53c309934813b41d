mod control;
mod monitor;

pub use control::*;
pub use monitor::*;

use std::cmp::Ordering;
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Processes shown per refresh unless configured otherwise
pub const DEFAULT_PROCESS_LIMIT: usize = 100;

/// A snapshot of one process, rebuilt on every refresh
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_bytes: u64,
    pub status: String,
    /// `None` when the process has no resolvable owning user
    pub owner: Option<String>,
    pub thread_count: Option<usize>,
    pub handle_count: Option<usize>,
    pub executable_path: Option<PathBuf>,
}

impl ProcessRecord {
    pub fn is_hidden(&self) -> bool {
        self.owner.is_none()
    }
}

/// Why a single process could not be read during enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("process {pid} exited during enumeration")]
    Exited { pid: u32 },

    #[error("process {pid} is a zombie")]
    Zombie { pid: u32 },
}

/// Anything that can list the processes currently running
pub trait ProcessSource {
    /// Returns one entry per process in enumeration order
    fn snapshot(&mut self) -> Vec<Result<ProcessRecord, ProcessError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Pid,
    Name,
    Cpu,
    Memory,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Pid, SortKey::Name, SortKey::Cpu, SortKey::Memory];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Pid => "PID",
            SortKey::Name => "Name",
            SortKey::Cpu => "CPU",
            SortKey::Memory => "Memory",
        }
    }

    fn compare(self, a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
        match self {
            SortKey::Pid => a.pid.cmp(&b.pid),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Cpu => a.cpu_percent.total_cmp(&b.cpu_percent),
            SortKey::Memory => a.memory_bytes.cmp(&b.memory_bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessFilter {
    /// Case-insensitive substring of the process name; empty matches all
    pub name: String,
    /// Keep processes without an owning user
    pub include_hidden: bool,
    /// `None` keeps enumeration order
    pub sort: Option<Sort>,
    pub limit: usize,
}

impl Default for ProcessFilter {
    fn default() -> Self {
        Self {
            name: String::new(),
            include_hidden: true,
            sort: None,
            limit: DEFAULT_PROCESS_LIMIT,
        }
    }
}

impl ProcessFilter {
    pub fn matches(&self, record: &ProcessRecord) -> bool {
        if !self.include_hidden && record.is_hidden() {
            return false;
        }
        self.name.is_empty()
            || record
                .name
                .to_lowercase()
                .contains(&self.name.to_lowercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessListing {
    pub records: Vec<ProcessRecord>,
    /// Processes read successfully, before filtering
    pub total: usize,
    /// Processes matching the filter, before the limit was applied
    pub matched: usize,
}

/// Filters, optionally sorts, and truncates one enumeration pass.
///
/// Entries that failed to read are skipped one by one.
pub fn enumerate<I>(entries: I, filter: &ProcessFilter) -> ProcessListing
where
    I: IntoIterator<Item = Result<ProcessRecord, ProcessError>>,
{
    let mut total = 0;
    let mut records: Vec<ProcessRecord> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(record) => {
                total += 1;
                Some(record)
            }
            Err(err) => {
                debug!("Skipping process: {}", err);
                None
            }
        })
        .filter(|record| filter.matches(record))
        .collect();

    let matched = records.len();
    if let Some(sort) = filter.sort {
        records.sort_by(|a, b| {
            let ordering = sort.key.compare(a, b);
            if sort.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
    records.truncate(filter.limit);

    ProcessListing {
        records,
        total,
        matched,
    }
}
