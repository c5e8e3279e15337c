//! Wire and domain types for workstation telemetry
//!
//! `Raw*` types mirror the backend JSON exactly. The domain types are rebuilt
//! from scratch by the preprocessor on every poll.

use serde::Deserialize;

// ============================================================================
// Wire types (backend JSON)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawGroup {
    pub name: String,
    pub workstations: Vec<RawWorkstation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawWorkstation {
    pub name: String,
    pub cpu: String,
    pub motherboard: String,
    #[serde(default)]
    pub notes: String,
    pub owner: String,
    /// Nanoseconds since the Unix epoch
    pub last_seen: u64,
    pub gpus: Vec<RawGpu>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawGpu {
    pub uuid: String,
    pub gpu_name: String,
    pub gpu_brand: String,
    pub driver_ver: String,
    pub memory_total: f64,
    pub memory_util: f64,
    pub gpu_util: f64,
    pub memory_used: f64,
    pub fan_speed: f64,
    pub gpu_temp: f64,
    pub memory_temp: f64,
    pub graphics_voltage: f64,
    pub power_draw: f64,
    pub graphics_clock: f64,
    pub max_graphics_clock: f64,
    pub memory_clock: f64,
    pub max_memory_clock: f64,
    pub in_use: bool,
    #[serde(default)]
    pub user: Option<String>,
}

// ============================================================================
// Domain types
// ============================================================================

/// Administrative collection of workstations
#[derive(Debug, Clone, PartialEq)]
pub struct WorkstationGroup {
    pub name: String,
    /// Free workstations first, then busy ones
    pub workstations: Vec<Workstation>,
}

impl WorkstationGroup {
    pub fn free_count(&self) -> usize {
        self.workstations.iter().filter(|w| w.free).count()
    }

    pub fn gpu_count(&self) -> usize {
        self.workstations.iter().map(|w| w.gpus.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workstation {
    pub name: String,
    pub cpu: String,
    pub motherboard: String,
    pub notes: String,
    pub owner: String,
    pub last_seen_seconds: f64,
    /// Ordered by uuid
    pub gpus: Vec<GpuSample>,
    /// No GPU reports `in_use`
    pub free: bool,
}

/// Snapshot of one GPU at `last_seen`
#[derive(Debug, Clone, PartialEq)]
pub struct GpuSample {
    pub uuid: String,
    pub name: String,
    pub brand: String,
    pub driver_version: String,
    pub memory_total_mb: f64,
    pub memory_util_percent: f64,
    pub gpu_util_percent: f64,
    pub memory_used_mb: f64,
    pub fan_speed_percent: f64,
    pub temp_c: f64,
    pub memory_temp_c: f64,
    pub voltage_mv: f64,
    pub power_draw_w: f64,
    pub clock_mhz: f64,
    pub max_clock_mhz: f64,
    pub memory_clock_mhz: f64,
    pub max_memory_clock_mhz: f64,
    pub in_use: bool,
    pub user: Option<String>,
}

impl From<RawGpu> for GpuSample {
    fn from(raw: RawGpu) -> Self {
        Self {
            uuid: raw.uuid,
            name: raw.gpu_name,
            brand: raw.gpu_brand,
            driver_version: raw.driver_ver,
            memory_total_mb: raw.memory_total,
            memory_util_percent: raw.memory_util,
            gpu_util_percent: raw.gpu_util,
            memory_used_mb: raw.memory_used,
            fan_speed_percent: raw.fan_speed,
            temp_c: raw.gpu_temp,
            memory_temp_c: raw.memory_temp,
            voltage_mv: raw.graphics_voltage,
            power_draw_w: raw.power_draw,
            clock_mhz: raw.graphics_clock,
            max_clock_mhz: raw.max_graphics_clock,
            memory_clock_mhz: raw.memory_clock,
            max_memory_clock_mhz: raw.max_memory_clock,
            in_use: raw.in_use,
            user: raw.user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPU_JSON: &str = r#"{
        "uuid": "GPU-1",
        "gpu_name": "RTX 4090",
        "gpu_brand": "GeForce",
        "driver_ver": "550.54",
        "memory_total": 24564,
        "memory_util": 12,
        "gpu_util": 97,
        "memory_used": 20110,
        "fan_speed": 61,
        "gpu_temp": 71,
        "memory_temp": 0,
        "graphics_voltage": 1050,
        "power_draw": 402.5,
        "graphics_clock": 2730,
        "max_graphics_clock": 3120,
        "memory_clock": 10501,
        "max_memory_clock": 10501,
        "in_use": true,
        "user": "alice"
    }"#;

    #[test]
    fn test_decode_gpu_and_convert() {
        let raw: RawGpu = serde_json::from_str(GPU_JSON).unwrap();
        let gpu = GpuSample::from(raw);
        assert_eq!(gpu.name, "RTX 4090");
        assert_eq!(gpu.gpu_util_percent, 97.0);
        assert_eq!(gpu.power_draw_w, 402.5);
        assert_eq!(gpu.user.as_deref(), Some("alice"));
        assert!(gpu.in_use);
    }

    #[test]
    fn test_null_user_and_missing_notes_accepted() {
        let gpu = GPU_JSON.replace(r#""user": "alice""#, r#""user": null"#);
        let msg = format!(
            r#"{{"name": "ws1", "cpu": "x", "motherboard": "y", "owner": "z",
                "last_seen": 1700000000000000000, "gpus": [{gpu}]}}"#
        );
        let ws: RawWorkstation = serde_json::from_str(&msg).unwrap();
        assert_eq!(ws.notes, "");
        assert_eq!(ws.gpus[0].user, None);
    }

    #[test]
    fn test_missing_field_rejected() {
        let msg = r#"{"name": "ws1", "cpu": "x", "gpus": []}"#;
        assert!(serde_json::from_str::<RawWorkstation>(msg).is_err());
    }
}
