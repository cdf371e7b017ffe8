use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

/// Where embedding inference runs. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    Cpu,
    Cuda,
}

impl ComputeDevice {
    /// Explicit choice wins; otherwise use the accelerator when one is visible.
    pub fn select(explicit: Option<ComputeDevice>) -> Self {
        if let Some(device) = explicit {
            return device;
        }
        let visible_devices = env::var("CUDA_VISIBLE_DEVICES").ok();
        if accelerator_present(
            Path::new("/proc/driver/nvidia/version").exists(),
            visible_devices.as_deref(),
        ) {
            ComputeDevice::Cuda
        } else {
            ComputeDevice::Cpu
        }
    }
}

fn accelerator_present(driver_loaded: bool, visible_devices: Option<&str>) -> bool {
    match visible_devices.map(str::trim) {
        // An empty or "-1" mask hides every GPU.
        Some("") | Some("-1") => false,
        Some(_) => true,
        None => driver_loaded,
    }
}

impl FromStr for ComputeDevice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(ComputeDevice::Cpu),
            "cuda" | "gpu" => Ok(ComputeDevice::Cuda),
            other => Err(format!("unknown compute device '{}', expected cpu or cuda", other)),
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cpu => f.write_str("cpu"),
            ComputeDevice::Cuda => f.write_str("cuda"),
        }
    }
}
