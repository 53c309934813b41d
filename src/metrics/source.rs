use std::path::Path;

use sysinfo::{Disks, Networks, System};

use super::SampleError;

/// CPU and memory figures read in one go
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuMemory {
    pub cpu_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
}

impl CpuMemory {
    pub fn memory_percent(&self) -> f32 {
        if self.memory_total_bytes == 0 {
            return 0.0;
        }
        (self.memory_used_bytes as f64 / self.memory_total_bytes as f64 * 100.0) as f32
    }
}

/// Where the sampler gets its readings from
pub trait SystemSource {
    /// Global CPU usage since the previous call, plus current memory usage
    fn cpu_memory(&mut self) -> Result<CpuMemory, SampleError>;

    /// Cumulative bytes sent and received over all interfaces
    fn network_totals(&mut self) -> Result<u64, SampleError>;

    /// Usage percent of the filesystem holding `path`
    fn disk_usage(&mut self, path: &Path) -> Result<f32, SampleError>;
}

/// [`SystemSource`] backed by `sysinfo`
pub struct SysinfoSource {
    system: System,
    networks: Networks,
    disks: Disks,
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut system = System::new();
        // Primes the CPU counters so the next reading is a real delta
        system.refresh_cpu_usage();
        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
        }
    }
}

impl SystemSource for SysinfoSource {
    fn cpu_memory(&mut self) -> Result<CpuMemory, SampleError> {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let cpu_percent = self.system.global_cpu_usage();
        if !cpu_percent.is_finite() {
            return Err(SampleError::InvalidReading {
                metric: "cpu",
                value: cpu_percent as f64,
            });
        }
        let memory_total_bytes = self.system.total_memory();
        if memory_total_bytes == 0 {
            return Err(SampleError::Unavailable("memory information"));
        }

        Ok(CpuMemory {
            cpu_percent: cpu_percent.clamp(0.0, 100.0),
            memory_used_bytes: self.system.used_memory(),
            memory_total_bytes,
        })
    }

    fn network_totals(&mut self) -> Result<u64, SampleError> {
        self.networks.refresh(true);
        let interfaces = self.networks.list();
        if interfaces.is_empty() {
            return Err(SampleError::Unavailable("network interfaces"));
        }
        Ok(interfaces
            .values()
            .map(|data| data.total_received() + data.total_transmitted())
            .sum())
    }

    fn disk_usage(&mut self, path: &Path) -> Result<f32, SampleError> {
        self.disks.refresh(true);
        let disk = self
            .disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| SampleError::NoFilesystem(path.display().to_string()))?;

        let total = disk.total_space();
        if total == 0 {
            return Err(SampleError::Unavailable("disk size"));
        }
        let used = total.saturating_sub(disk.available_space());
        Ok((used as f64 / total as f64 * 100.0) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_percent_of_zero_total_is_zero() {
        let reading = CpuMemory {
            cpu_percent: 0.0,
            memory_used_bytes: 10,
            memory_total_bytes: 0,
        };
        assert_eq!(reading.memory_percent(), 0.0);
    }

    #[test]
    fn memory_percent_is_used_over_total() {
        let reading = CpuMemory {
            cpu_percent: 0.0,
            memory_used_bytes: 1 << 30,
            memory_total_bytes: 4 << 30,
        };
        assert_eq!(reading.memory_percent(), 25.0);
    }

    #[test]
    fn sysinfo_readings_are_finite() {
        let mut source = SysinfoSource::new();
        if let Ok(reading) = source.cpu_memory() {
            assert!(reading.cpu_percent.is_finite());
            assert!((0.0..=100.0).contains(&reading.memory_percent()));
        }
    }
}
