mod cli;
mod file;

pub use cli::{Cli, Command};

use std::path::PathBuf;

use wacdec::decode::UsbInput;
use wacdec::error::{Error, Result};
use wacdec::input::event::{INPUT_EVENT_SIZE_32, INPUT_EVENT_SIZE_64};
use wacdec::model::{parse_coord_answer, MarkerMode, ModelDescriptor, SERIAL_MODELS};

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub device: PathBuf,
    pub marker: Option<MarkerMode>,
    pub coords: Option<String>,
    pub max_pressure: Option<i32>,
    pub tilt: Option<bool>,
    pub input: UsbInput,
    pub event_size: usize,
    pub uinput: bool,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        let tilt = if cli.tilt {
            Some(true)
        } else if cli.no_tilt {
            Some(false)
        } else {
            file_config.tilt
        };

        Self {
            model: cli
                .model
                .clone()
                .or(file_config.model)
                .unwrap_or_else(|| SERIAL_MODELS[0].key.into()),
            device: cli.device.clone().unwrap_or(file_config.device),
            marker: cli.marker.or(file_config.marker),
            coords: cli.coords.clone().or(file_config.coords),
            max_pressure: cli.max_pressure.or(file_config.max_pressure),
            tilt,
            input: if cli.reports || file_config.reports {
                UsbInput::Reports
            } else {
                UsbInput::Events
            },
            event_size: if cli.compat32 || file_config.compat32 {
                INPUT_EVENT_SIZE_32
            } else {
                INPUT_EVENT_SIZE_64
            },
            uinput: cli.uinput || file_config.uinput,
        }
    }

    /// The catalogue entry for `model` with the configured overrides applied.
    pub fn descriptor(&self) -> Result<ModelDescriptor> {
        let mut model = ModelDescriptor::find(&self.model)
            .ok_or_else(|| Error::UnknownModel(self.model.clone()))?;

        if let Some(coords) = &self.coords {
            let (max_x, max_y) = parse_coords(coords)
                .ok_or_else(|| Error::Config(format!("bad coordinate answer '{}'", coords)))?;
            model = model.with_ranges(max_x, max_y);
        }
        if let Some(max) = self.max_pressure {
            model = model.with_max_pressure(max);
        }
        if let Some(tilt) = self.tilt {
            model = model.with_tilt(tilt);
        }
        if let Some(marker) = self.marker {
            model = model.with_marker(marker);
        }
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_pressure {
            if max <= 0 {
                return Err(Error::Config(format!("max_pressure must be positive, got {}", max)));
            }
        }
        Ok(())
    }
}

/// Accepts the raw `~C` answer or just `<x>,<y>`.
fn parse_coords(coords: &str) -> Option<(u32, u32)> {
    let coords = coords.trim();
    if coords.starts_with("~C") {
        parse_coord_answer(coords)
    } else {
        parse_coord_answer(&format!("~C{}", coords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> Config {
        Config {
            model: model.into(),
            device: PathBuf::from("/dev/ttyS0"),
            marker: None,
            coords: None,
            max_pressure: None,
            tilt: None,
            input: UsbInput::Events,
            event_size: INPUT_EVENT_SIZE_64,
            uinput: false,
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut cfg = config("serial-protocol4");
        cfg.max_pressure = Some(511);
        cfg.tilt = Some(true);
        let model = cfg.descriptor().unwrap();
        assert_eq!(model.max_pressure, 511);
        assert!(model.tilt_enabled);
        assert_eq!(model.frame_len(), 9);
    }

    #[test]
    fn test_coordinate_override() {
        let mut cfg = config("serial-intuos");
        cfg.coords = Some("~C30480,31680\r".into());
        let model = cfg.descriptor().unwrap();
        assert_eq!((model.max_x, model.max_y), (30480, 31680));

        cfg.coords = Some("20320,16240".into());
        assert_eq!(cfg.descriptor().unwrap().max_x, 20320);

        cfg.coords = Some("wide".into());
        assert!(matches!(cfg.descriptor(), Err(Error::Config(_))));
    }

    #[test]
    fn test_model_from_answer() {
        let model = config("~#XD-1212-R00 V1.0-5").descriptor().unwrap();
        assert_eq!(model.key, "serial-intuos2");
    }

    #[test]
    fn test_unknown_model() {
        let err = config("bogus").descriptor().unwrap_err();
        assert!(matches!(err, Error::UnknownModel(name) if name == "bogus"));
    }

    #[test]
    fn test_rejects_bad_pressure() {
        let mut cfg = config("serial-intuos");
        cfg.max_pressure = Some(0);
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }
}
