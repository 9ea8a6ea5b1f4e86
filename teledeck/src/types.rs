//! Types that mirror the hub's JSON wire schema.

use serde::Deserialize;
use serde_json::Value;

/// Every frame the hub emits is one of these two envelopes; dispatch on the
/// `type` field. Anything else fails to parse and is discarded upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    #[serde(rename = "HARDWARE_TELEMETRY")]
    HardwareTelemetry {
        data: TelemetrySnapshot,
        #[serde(default)]
        timestamp: Option<String>,
    },
    #[serde(rename = "AGENT_UPDATE")]
    AgentUpdate { data: Value },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySnapshot {
    pub cpu: CpuSample,
    pub memory: MemorySample,
    pub gpu: GpuSample,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuSample {
    #[serde(rename = "usagePercent")]
    pub usage_percent: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemorySample {
    // one-decimal GB strings, exactly as the hub renders them
    #[serde(rename = "usedGB")]
    pub used_gb: String,
    #[serde(rename = "totalGB")]
    pub total_gb: String,
    #[serde(rename = "usagePercent")]
    pub usage_percent: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GpuSample {
    pub name: String,
    /// None when the hub could not observe utilization.
    #[serde(rename = "usagePercent")]
    pub usage_percent: Option<u8>,
    #[serde(rename = "vramTotalGB")]
    pub vram_total_gb: String,
}
