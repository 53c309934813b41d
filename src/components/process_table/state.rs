use crate::process::{ControlAction, ProcessDetails};

/// What the user asked for from the process table
#[derive(Debug, Clone, PartialEq)]
pub enum TableRequest {
    Control {
        pid: u32,
        name: String,
        action: ControlAction,
    },
    Details(u32),
}

#[derive(Default)]
pub struct ProcessTable {
    pub selected: Option<u32>,
    /// Kill waiting for confirmation
    pub confirm_kill: Option<(u32, String)>,
    pub details: Option<ProcessDetails>,
}

pub fn format_run_time(seconds: u64) -> String {
    let (hours, rest) = (seconds / 3600, seconds % 3600);
    format!("{}h {:02}m {:02}s", hours, rest / 60, rest % 60)
}
