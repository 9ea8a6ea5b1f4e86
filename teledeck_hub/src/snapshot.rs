//! Wire frames sent to viewers. Everything the hub emits is one of two
//! envelope shapes, so a viewer dispatches on the `type` field alone.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Frame {
    #[serde(rename = "HARDWARE_TELEMETRY")]
    HardwareTelemetry {
        data: TelemetrySnapshot,
        timestamp: String,
    },
    #[serde(rename = "AGENT_UPDATE")]
    AgentUpdate { data: Value },
}

impl Frame {
    /// Envelope a snapshot, stamped with the production time.
    pub fn telemetry(snapshot: TelemetrySnapshot) -> Self {
        Frame::HardwareTelemetry {
            data: snapshot,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Envelope an opaque agent payload. The hub never looks inside.
    pub fn agent_update(payload: Value) -> Self {
        Frame::AgentUpdate { data: payload }
    }
}

/// One immutable sample of host telemetry, produced once per tick and
/// forwarded verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub cpu: CpuSample,
    pub memory: MemorySample,
    pub gpu: GpuSample,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuSample {
    #[serde(rename = "usagePercent")]
    pub usage_percent: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemorySample {
    // raw byte counts feed the derived fields; only the GB strings and the
    // percentage go on the wire
    #[serde(skip)]
    pub used_bytes: u64,
    #[serde(skip)]
    pub total_bytes: u64,
    #[serde(rename = "usedGB")]
    pub used_gb: String,
    #[serde(rename = "totalGB")]
    pub total_gb: String,
    #[serde(rename = "usagePercent")]
    pub usage_percent: u8,
}

impl MemorySample {
    pub fn from_bytes(used_bytes: u64, total_bytes: u64) -> Self {
        let usage_percent = if total_bytes == 0 {
            0
        } else {
            round_pct(used_bytes as f64 / total_bytes as f64 * 100.0)
        };
        Self {
            used_bytes,
            total_bytes,
            used_gb: gb_string(used_bytes),
            total_gb: gb_string(total_bytes),
            usage_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GpuSample {
    pub name: String,
    // None when the controller does not report utilization; never fabricated
    #[serde(rename = "usagePercent")]
    pub usage_percent: Option<u8>,
    #[serde(rename = "vramTotalGB")]
    pub vram_total_gb: String,
}

/// Round to the nearest whole percent, clamped to 0..=100.
pub fn round_pct(v: f64) -> u8 {
    v.round().clamp(0.0, 100.0) as u8
}

/// Binary-GB rendering with one decimal, e.g. `"15.6"`.
pub fn gb_string(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}
