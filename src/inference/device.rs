//! Compute device selection for locally served models.

use crate::error::{KosumError, Result};
use std::path::Path;
use tracing::debug;

/// Present when the NVIDIA kernel driver is loaded.
const NVIDIA_DRIVER_PATH: &str = "/proc/driver/nvidia/version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda(usize),
    Cpu,
}

impl Device {
    /// Probe the host once: CUDA device 0 when a driver is present and not
    /// hidden by `CUDA_VISIBLE_DEVICES`, else CPU.
    pub fn detect() -> Self {
        Self::detect_with(
            Path::new(NVIDIA_DRIVER_PATH),
            std::env::var("CUDA_VISIBLE_DEVICES").ok().as_deref(),
        )
    }

    fn detect_with(driver_path: &Path, visible_devices: Option<&str>) -> Self {
        if let Some(visible) = visible_devices {
            let visible = visible.trim();
            if visible.is_empty() || visible == "-1" {
                debug!("CUDA_VISIBLE_DEVICES hides all GPUs");
                return Device::Cpu;
            }
        }

        if driver_path.exists() {
            Device::Cuda(0)
        } else {
            Device::Cpu
        }
    }

    /// Parse a configured preference. `auto` yields `None`.
    pub fn from_preference(preference: &str) -> Result<Option<Self>> {
        let preference = preference.trim().to_lowercase();
        match preference.as_str() {
            "auto" | "" => Ok(None),
            "cpu" => Ok(Some(Device::Cpu)),
            "cuda" | "gpu" => Ok(Some(Device::Cuda(0))),
            other => other
                .strip_prefix("cuda:")
                .and_then(|id| id.parse().ok())
                .map(|id| Some(Device::Cuda(id)))
                .ok_or_else(|| {
                    KosumError::Config(format!(
                        "Unknown device: {}. Use 'auto', 'cpu', 'cuda' or 'cuda:N'",
                        other
                    ))
                }),
        }
    }

    /// The configured device, or the probed one for `auto`.
    pub fn select(preference: &str) -> Result<Self> {
        Ok(Self::from_preference(preference)?.unwrap_or_else(Self::detect))
    }

    /// Device ordinal as inference servers expect it: `-1` means CPU.
    pub fn pipeline_index(&self) -> i64 {
        match self {
            Device::Cuda(id) => *id as i64,
            Device::Cpu => -1,
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cuda(id) => write!(f, "cuda:{}", id),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_without_driver_is_cpu() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nvidia-version");
        assert_eq!(Device::detect_with(&missing, None), Device::Cpu);
    }

    #[test]
    fn test_detect_with_driver_is_cuda() {
        let dir = tempfile::tempdir().unwrap();
        let driver = dir.path().join("nvidia-version");
        std::fs::write(&driver, "NVRM version: 550.54").unwrap();

        assert_eq!(Device::detect_with(&driver, None), Device::Cuda(0));
        assert_eq!(Device::detect_with(&driver, Some("0,1")), Device::Cuda(0));
    }

    #[test]
    fn test_detect_respects_hidden_devices() {
        let dir = tempfile::tempdir().unwrap();
        let driver = dir.path().join("nvidia-version");
        std::fs::write(&driver, "NVRM version: 550.54").unwrap();

        assert_eq!(Device::detect_with(&driver, Some("")), Device::Cpu);
        assert_eq!(Device::detect_with(&driver, Some("-1")), Device::Cpu);
    }

    #[test]
    fn test_preference_parsing() {
        assert_eq!(Device::from_preference("auto").unwrap(), None);
        assert_eq!(Device::from_preference("CPU").unwrap(), Some(Device::Cpu));
        assert_eq!(Device::from_preference("cuda").unwrap(), Some(Device::Cuda(0)));
        assert_eq!(Device::from_preference("cuda:2").unwrap(), Some(Device::Cuda(2)));
        assert!(Device::from_preference("cuda:x").is_err());
        assert!(Device::from_preference("metal").is_err());
    }

    #[test]
    fn test_pipeline_index() {
        assert_eq!(Device::Cuda(0).pipeline_index(), 0);
        assert_eq!(Device::Cuda(3).pipeline_index(), 3);
        assert_eq!(Device::Cpu.pipeline_index(), -1);
        assert!(Device::Cuda(0).is_accelerated());
        assert!(!Device::Cpu.is_accelerated());
    }
}
