//! Host telemetry provider seam. The sampler only ever sees this trait; the
//! real implementation reads sysinfo and gfxinfo, tests substitute scripted
//! providers.

use once_cell::sync::OnceCell;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("cpu query failed: {0}")]
    Cpu(String),
    #[error("memory query failed: {0}")]
    Memory(String),
    #[error("graphics query failed: {0}")]
    Graphics(String),
}

#[derive(Debug, Clone)]
pub struct MemoryStats {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct GraphicsController {
    pub name: String,
    pub vram_bytes: u64,
    /// None when the controller exposes no utilization counter.
    pub utilization: Option<u8>,
}

pub trait TelemetryProvider: Send {
    fn cpu_load(&mut self) -> Result<f64, ProviderError>;
    fn memory(&mut self) -> Result<MemoryStats, ProviderError>;
    fn graphics(&mut self) -> Result<Vec<GraphicsController>, ProviderError>;
}

fn gpu_enabled() -> bool {
    static ON: OnceCell<bool> = OnceCell::new();
    *ON.get_or_init(|| {
        std::env::var("TELEDECK_GPU")
            .map(|v| v != "0")
            .unwrap_or(true)
    })
}

/// Live provider backed by a persistent `sysinfo::System` so CPU usage
/// deltas accumulate between ticks.
pub struct SysinfoProvider {
    sys: System,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let refresh = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());
        let mut sys = System::new_with_specifics(refresh);
        // Prime the counters; the first tick's delta is measured from here.
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self { sys }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryProvider for SysinfoProvider {
    fn cpu_load(&mut self) -> Result<f64, ProviderError> {
        self.sys.refresh_cpu_usage();
        Ok(self.sys.global_cpu_usage() as f64)
    }

    fn memory(&mut self) -> Result<MemoryStats, ProviderError> {
        self.sys.refresh_memory();
        let total_bytes = self.sys.total_memory();
        if total_bytes == 0 {
            return Err(ProviderError::Memory("total memory reported as zero".into()));
        }
        let used_bytes = total_bytes.saturating_sub(self.sys.available_memory());
        Ok(MemoryStats {
            used_bytes,
            total_bytes,
        })
    }

    fn graphics(&mut self) -> Result<Vec<GraphicsController>, ProviderError> {
        if !gpu_enabled() {
            return Ok(Vec::new());
        }
        match gfxinfo::active_gpu() {
            Ok(gpu) => {
                let info = gpu.info();
                Ok(vec![GraphicsController {
                    name: gpu.model().to_string(),
                    vram_bytes: info.total_vram(),
                    utilization: Some((info.load_pct() as u32).min(100) as u8),
                }])
            }
            Err(err) => {
                // Hosts without a supported controller land here; the
                // sampler falls back to the placeholder record.
                debug!(event = "gpu_probe_failed", error = %err);
                Ok(Vec::new())
            }
        }
    }
}
