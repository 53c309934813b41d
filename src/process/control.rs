//! Kill, suspend, resume and reprioritize processes.

use std::io;

use log::info;
use serde::{Deserialize, Serialize};
use sysinfo::{Pid, Process, ProcessesToUpdate, Signal, System};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("Process not found (PID {pid})")]
    NotFound { pid: u32 },

    #[error("Access denied to PID {pid}")]
    AccessDenied { pid: u32 },

    #[error("Cannot {action} processes on this platform")]
    Unsupported { action: &'static str },

    #[error("Refusing to {action} PID {pid} ({reason})")]
    Refused {
        pid: u32,
        action: &'static str,
        reason: &'static str,
    },

    #[error("Failed to {action} PID {pid}: {message}")]
    Os {
        pid: u32,
        action: &'static str,
        message: String,
    },
}

/// Scheduling priority, mapped onto Unix nice values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Realtime,
    High,
    AboveNormal,
    Normal,
    BelowNormal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 6] = [
        Priority::Realtime,
        Priority::High,
        Priority::AboveNormal,
        Priority::Normal,
        Priority::BelowNormal,
        Priority::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Realtime => "Realtime",
            Priority::High => "High",
            Priority::AboveNormal => "Above Normal",
            Priority::Normal => "Normal",
            Priority::BelowNormal => "Below Normal",
            Priority::Low => "Low",
        }
    }

    pub fn nice(self) -> i32 {
        match self {
            Priority::Realtime => -20,
            Priority::High => -10,
            Priority::AboveNormal => -5,
            Priority::Normal => 0,
            Priority::BelowNormal => 5,
            Priority::Low => 19,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Kill,
    Suspend,
    Resume,
    SetPriority(Priority),
}

impl ControlAction {
    pub fn label(self) -> String {
        match self {
            ControlAction::Kill => "Kill".to_string(),
            ControlAction::Suspend => "Suspend".to_string(),
            ControlAction::Resume => "Resume".to_string(),
            ControlAction::SetPriority(priority) => format!("Set priority to {}", priority.label()),
        }
    }
}

/// Issues control requests against live processes.
///
/// Every call looks the PID up again, so a stale table row yields
/// [`ControlError::NotFound`] rather than hitting a recycled PID blindly.
pub struct ProcessController {
    system: System,
}

impl Default for ProcessController {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessController {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    pub fn apply(&mut self, pid: u32, action: ControlAction) -> Result<(), ControlError> {
        let result = match action {
            ControlAction::Kill => self.kill(pid),
            ControlAction::Suspend => self.suspend(pid),
            ControlAction::Resume => self.resume(pid),
            ControlAction::SetPriority(priority) => self.set_priority(pid, priority),
        };
        if result.is_ok() {
            info!("{} PID {}: done", action.label(), pid);
        }
        result
    }

    pub fn kill(&mut self, pid: u32) -> Result<(), ControlError> {
        refuse_self(pid, "kill")?;
        self.signal(pid, Signal::Kill, "kill")
    }

    pub fn suspend(&mut self, pid: u32) -> Result<(), ControlError> {
        refuse_self(pid, "suspend")?;
        self.signal(pid, Signal::Stop, "suspend")
    }

    pub fn resume(&mut self, pid: u32) -> Result<(), ControlError> {
        self.signal(pid, Signal::Continue, "resume")
    }

    pub fn set_priority(&mut self, pid: u32, priority: Priority) -> Result<(), ControlError> {
        self.resolve(pid)?;
        set_nice(pid, priority.nice())
    }

    fn resolve(&mut self, pid: u32) -> Result<&Process, ControlError> {
        let sys_pid = Pid::from_u32(pid);
        self.system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
        self.system
            .process(sys_pid)
            .ok_or(ControlError::NotFound { pid })
    }

    fn signal(&mut self, pid: u32, signal: Signal, action: &'static str) -> Result<(), ControlError> {
        let process = self.resolve(pid)?;
        match process.kill_with(signal) {
            None => Err(ControlError::Unsupported { action }),
            Some(true) => Ok(()),
            Some(false) => Err(os_error(pid, action, io::Error::last_os_error())),
        }
    }
}

/// Stopping the monitor itself would freeze the UI
fn refuse_self(pid: u32, action: &'static str) -> Result<(), ControlError> {
    if pid == std::process::id() {
        return Err(ControlError::Refused {
            pid,
            action,
            reason: "this is the task manager",
        });
    }
    Ok(())
}

fn os_error(pid: u32, action: &'static str, err: io::Error) -> ControlError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        ControlError::AccessDenied { pid }
    } else if is_no_such_process(&err) {
        ControlError::NotFound { pid }
    } else {
        ControlError::Os {
            pid,
            action,
            message: err.to_string(),
        }
    }
}

#[cfg(unix)]
fn is_no_such_process(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ESRCH)
}

#[cfg(not(unix))]
fn is_no_such_process(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

#[cfg(unix)]
fn set_nice(pid: u32, nice: i32) -> Result<(), ControlError> {
    // SAFETY: setpriority only reads its scalar arguments.
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, pid as libc::id_t, nice) };
    if rc == 0 {
        Ok(())
    } else {
        Err(os_error(pid, "set priority of", io::Error::last_os_error()))
    }
}

#[cfg(not(unix))]
fn set_nice(_pid: u32, _nice: i32) -> Result<(), ControlError> {
    Err(ControlError::Unsupported {
        action: "set priority of",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_PID: u32 = u32::MAX - 7;

    #[test]
    fn missing_process_is_not_found() {
        let mut controller = ProcessController::new();
        let expected = Err(ControlError::NotFound { pid: MISSING_PID });
        assert_eq!(controller.kill(MISSING_PID), expected);
        assert_eq!(controller.suspend(MISSING_PID), expected);
        assert_eq!(controller.resume(MISSING_PID), expected);
        assert_eq!(controller.set_priority(MISSING_PID, Priority::Low), expected);
    }

    #[test]
    fn refuses_to_stop_itself() {
        let mut controller = ProcessController::new();
        let own = std::process::id();
        assert!(matches!(
            controller.kill(own),
            Err(ControlError::Refused { action: "kill", .. })
        ));
        assert!(matches!(
            controller.apply(own, ControlAction::Suspend),
            Err(ControlError::Refused { action: "suspend", .. })
        ));
    }

    #[test]
    fn priority_maps_to_nice_values() {
        let nice: Vec<i32> = Priority::ALL.iter().map(|p| p.nice()).collect();
        assert_eq!(nice, vec![-20, -10, -5, 0, 5, 19]);
    }

    #[cfg(unix)]
    #[test]
    fn classifies_os_errors() {
        let pid = 42;
        assert_eq!(
            os_error(pid, "kill", io::Error::from_raw_os_error(libc::EPERM)),
            ControlError::AccessDenied { pid }
        );
        assert_eq!(
            os_error(pid, "kill", io::Error::from_raw_os_error(libc::ESRCH)),
            ControlError::NotFound { pid }
        );
        assert!(matches!(
            os_error(pid, "kill", io::Error::from_raw_os_error(libc::EINVAL)),
            ControlError::Os { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn controls_a_child_process() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id();
        let mut controller = ProcessController::new();

        assert_eq!(controller.suspend(pid), Ok(()));
        assert_eq!(controller.resume(pid), Ok(()));
        // Lowering priority never needs privileges
        assert_eq!(controller.set_priority(pid, Priority::Low), Ok(()));
        assert_eq!(controller.kill(pid), Ok(()));
        child.wait().unwrap();
    }
}
