use super::{ProcessError, ProcessRecord, ProcessSource};
use log::debug;
use sysinfo::{
    Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, Uid, Users,
};

/// Everything the details window shows for one process
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDetails {
    pub record: ProcessRecord,
    pub parent_pid: Option<u32>,
    /// Seconds since the Unix epoch
    pub start_time: u64,
    /// Seconds
    pub run_time: u64,
    pub command_line: Vec<String>,
}

/// Enumerates system processes through `sysinfo`.
///
/// Keeps one `System` alive between refreshes so per-process CPU usage is
/// measured over the refresh interval.
pub struct ProcessMonitor {
    system: System,
    users: Users,
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMonitor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            users: Users::new_with_refreshed_list(),
        }
    }

    fn refresh(&mut self, processes: ProcessesToUpdate<'_>) {
        self.system.refresh_memory();
        self.system
            .refresh_processes_specifics(processes, true, ProcessRefreshKind::everything());
    }

    fn owner_name(&mut self, uid: &Uid, users_reloaded: &mut bool) -> Option<String> {
        if let Some(user) = self.users.get_user_by_id(uid) {
            return Some(user.name().to_string());
        }
        // A user created since startup; reload the list at most once per pass
        if !*users_reloaded {
            *users_reloaded = true;
            self.users = Users::new_with_refreshed_list();
            return self.users.get_user_by_id(uid).map(|u| u.name().to_string());
        }
        None
    }

    fn collect_record(
        &mut self,
        pid: Pid,
        users_reloaded: &mut bool,
    ) -> Result<ProcessRecord, ProcessError> {
        let total_memory = self.system.total_memory();
        let process = self
            .system
            .process(pid)
            .ok_or(ProcessError::Exited { pid: pid.as_u32() })?;
        if process.status() == ProcessStatus::Zombie {
            return Err(ProcessError::Zombie { pid: pid.as_u32() });
        }

        let mut record = record_without_owner(process, total_memory);
        let uid = process.user_id().cloned();
        if let Some(uid) = uid {
            record.owner = self.owner_name(&uid, users_reloaded);
        }
        Ok(record)
    }

    /// Looks up one process by PID, refreshing only that process
    pub fn details(&mut self, pid: u32) -> Option<ProcessDetails> {
        let pid = Pid::from_u32(pid);
        self.refresh(ProcessesToUpdate::Some(&[pid]));
        let record = self.collect_record(pid, &mut false).ok()?;
        let process = self.system.process(pid)?;
        Some(ProcessDetails {
            record,
            parent_pid: process.parent().map(|p| p.as_u32()),
            start_time: process.start_time(),
            run_time: process.run_time(),
            command_line: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
        })
    }
}

impl ProcessSource for ProcessMonitor {
    fn snapshot(&mut self) -> Vec<Result<ProcessRecord, ProcessError>> {
        self.refresh(ProcessesToUpdate::All);

        let mut pids: Vec<Pid> = self
            .system
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, _)| *pid)
            .collect();
        pids.sort();

        let mut users_reloaded = false;
        let entries: Vec<_> = pids
            .into_iter()
            .map(|pid| self.collect_record(pid, &mut users_reloaded))
            .collect();
        debug!("Enumerated {} processes", entries.len());
        entries
    }
}

fn record_without_owner(process: &Process, total_memory: u64) -> ProcessRecord {
    let memory_bytes = process.memory();
    let memory_percent = if total_memory == 0 {
        0.0
    } else {
        (memory_bytes as f64 / total_memory as f64 * 100.0) as f32
    };
    ProcessRecord {
        pid: process.pid().as_u32(),
        name: process.name().to_string_lossy().into_owned(),
        cpu_percent: process.cpu_usage(),
        memory_percent,
        memory_bytes,
        status: process.status().to_string(),
        owner: None,
        thread_count: process.tasks().map(|tasks| tasks.len()),
        handle_count: handle_count(process.pid()),
        executable_path: process.exe().map(|path| path.to_path_buf()),
    }
}

/// Open file descriptors; `None` where the platform or permissions hide them
#[cfg(target_os = "linux")]
fn handle_count(pid: Pid) -> Option<usize> {
    std::fs::read_dir(format!("/proc/{}/fd", pid.as_u32()))
        .ok()
        .map(|entries| entries.count())
}

#[cfg(not(target_os = "linux"))]
fn handle_count(_pid: Pid) -> Option<usize> {
    None
}
