//! system memory usage.

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

/// bytes per gigabyte, as the dashboard reports them.
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// a snapshot of memory and swap usage.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryReading {
    pub total_gb: f64,
    /// memory that is not available for new allocations.
    pub used_gb: f64,
    pub used_percent: u8,
    pub swap_total_gb: f64,
    pub swap_used_gb: f64,
}

/// reads memory usage from the operating system.
pub struct MemoryProbe {
    system: System,
}

// === impl MemoryProbe ===

impl MemoryProbe {
    pub fn new() -> Self {
        let refresh = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
        Self {
            system: System::new_with_specifics(refresh),
        }
    }

    pub fn read(&mut self) -> MemoryReading {
        let Self { system } = self;

        system.refresh_memory_specifics(MemoryRefreshKind::everything());
        MemoryReading::from_bytes(
            system.total_memory(),
            system.available_memory(),
            system.total_swap(),
            system.used_swap(),
        )
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

// === impl MemoryReading ===

impl MemoryReading {
    /// swap smaller than this is reported as inactive.
    const SWAP_ACTIVE_GB: f64 = 0.1;

    pub fn from_bytes(total: u64, available: u64, swap_total: u64, swap_used: u64) -> Self {
        let used = total.saturating_sub(available);
        let used_percent = if total == 0 {
            0
        } else {
            (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0) as u8
        };

        Self {
            total_gb: tenths(total as f64 / GB),
            used_gb: tenths(used as f64 / GB),
            used_percent,
            swap_total_gb: tenths(swap_total as f64 / GB),
            swap_used_gb: tenths(swap_used as f64 / GB),
        }
    }

    pub fn swap_active(&self) -> bool {
        self.swap_total_gb >= Self::SWAP_ACTIVE_GB
    }
}

fn tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
