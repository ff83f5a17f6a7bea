//! PIR motion sensor input via the Linux sysfs GPIO interface.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::config::SensorConfig;

const GPIO_ROOT: &str = "/sys/class/gpio";

pub trait MotionSensor {
    fn motion_detected(&mut self) -> Result<bool, String>;
}

pub struct GpioSensor {
    value_path: PathBuf,
    active_low: bool,
}

impl GpioSensor {
    /// Open the sensor described by `config`.
    ///
    /// With an explicit `value_path` the file is used as-is. Otherwise the pin
    /// is exported and configured as an input first.
    pub fn open(config: &SensorConfig) -> Result<Self, String> {
        let value_path = match &config.value_path {
            Some(path) => path.clone(),
            None => export_input(Path::new(GPIO_ROOT), config.pin)?,
        };
        if !value_path.exists() {
            return Err(format!("sensor {}: not found", value_path.display()));
        }

        info!("Motion sensor on {}", value_path.display());
        Ok(GpioSensor {
            value_path,
            active_low: config.active_low,
        })
    }
}

impl MotionSensor for GpioSensor {
    fn motion_detected(&mut self) -> Result<bool, String> {
        let raw = fs::read_to_string(&self.value_path).map_err(|e| format!("read {}: {e}", self.value_path.display()))?;
        let high = match raw.trim() {
            "1" => true,
            "0" => false,
            other => return Err(format!("read {}: unexpected value {other:?}", self.value_path.display())),
        };
        Ok(high != self.active_low)
    }
}

/// Export `pin` under `root` if needed, set it to input, return its value file.
fn export_input(root: &Path, pin: u32) -> Result<PathBuf, String> {
    let pin_dir = root.join(format!("gpio{pin}"));
    if !pin_dir.exists() {
        debug!("Exporting GPIO {pin}");
        fs::write(root.join("export"), pin.to_string()).map_err(|e| format!("export gpio{pin}: {e}"))?;
        // udev needs a moment to fix up permissions on the new node
        std::thread::sleep(Duration::from_millis(100));
    }
    fs::write(pin_dir.join("direction"), "in").map_err(|e| format!("direction gpio{pin}: {e}"))?;
    Ok(pin_dir.join("value"))
}

#[cfg(test)]
pub(crate) mod fake {
    use super::MotionSensor;
    use std::collections::VecDeque;

    /// Replays scripted readings, then reports no motion.
    pub struct ScriptedSensor {
        readings: VecDeque<Result<bool, String>>,
    }

    impl ScriptedSensor {
        pub fn new<I: IntoIterator<Item = Result<bool, String>>>(readings: I) -> Self {
            ScriptedSensor { readings: readings.into_iter().collect() }
        }
    }

    impl MotionSensor for ScriptedSensor {
        fn motion_detected(&mut self) -> Result<bool, String> {
            self.readings.pop_front().unwrap_or(Ok(false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor_at(path: &Path, active_low: bool) -> GpioSensor {
        let config = SensorConfig {
            pin: 4,
            value_path: Some(path.to_path_buf()),
            active_low,
        };
        GpioSensor::open(&config).unwrap()
    }

    #[test]
    fn reads_value_file() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().join("value");
        fs::write(&value, "0\n").unwrap();
        let mut sensor = sensor_at(&value, false);

        assert!(!sensor.motion_detected().unwrap());
        fs::write(&value, "1\n").unwrap();
        assert!(sensor.motion_detected().unwrap());
    }

    #[test]
    fn active_low_inverts() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().join("value");
        fs::write(&value, "0").unwrap();
        let mut sensor = sensor_at(&value, true);
        assert!(sensor.motion_detected().unwrap());
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().join("value");
        fs::write(&value, "x").unwrap();
        let mut sensor = sensor_at(&value, false);
        assert!(sensor.motion_detected().is_err());
    }

    #[test]
    fn missing_value_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = SensorConfig {
            pin: 4,
            value_path: Some(dir.path().join("value")),
            active_low: false,
        };
        assert!(GpioSensor::open(&config).is_err());
    }

    #[test]
    fn export_configures_existing_pin() {
        let root = tempfile::tempdir().unwrap();
        let pin_dir = root.path().join("gpio17");
        fs::create_dir(&pin_dir).unwrap();

        let value = export_input(root.path(), 17).unwrap();

        assert_eq!(value, pin_dir.join("value"));
        assert_eq!(fs::read_to_string(pin_dir.join("direction")).unwrap(), "in");
        assert!(!root.path().join("export").exists());
    }
}
