//! Runtime configuration: JSON file plus command-line overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::sync::RecreatePolicy;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_BITMAP_WIDTH: u32 = 160;
pub const DEFAULT_BITMAP_HEIGHT: u32 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "pixelgrid".to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            resizable: true,
        }
    }
}

/// Logical grid size. Zero on an axis means "same as the window".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitmapConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for BitmapConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BITMAP_WIDTH,
            height: DEFAULT_BITMAP_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Use the parallel conversion pipeline
    pub multithreading: bool,
    /// Worker count for the parallel pipeline, None = available parallelism
    pub workers: Option<usize>,
    pub recreate: RecreatePolicy,
    pub format: PixelFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            multithreading: true,
            workers: None,
            recreate: RecreatePolicy::default(),
            format: PixelFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub bitmap: BitmapConfig,
    pub render: RenderConfig,
}

impl Config {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ============================================================================
// Command line
// ============================================================================

pub const USAGE: &str = "\
Usage: pixelgrid [OPTIONS]

Options:
  --config PATH, -c PATH    Load settings from a JSON file (applied first)
  --width W, -w W           Window width (default: 640)
  --height H, -h H          Window height (default: 480)
  --resolution WxH, -r WxH  Window size, e.g. 1920x1080
  --bitmap WxH, -b WxH      Logical grid size (default: 160x120, 0 = window)
  --no-vsync                Disable VSync for uncapped framerate
  --single-thread           Use the sequential conversion pipeline
  --workers N               Worker threads for the parallel pipeline
  --recreate POLICY         every-frame | on-change
  --format FORMAT           rgba32 | rgba8888 | argb8888
  --help                    Show this help message";

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T> {
    let value = value.ok_or_else(|| Error::Config(format!("{} needs a value", flag)))?;
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", flag, value)))
}

/// Parse `WxH`
fn parse_dims(flag: &str, value: Option<&String>) -> Result<(u32, u32)> {
    let text: String = parse_value(flag, value)?;
    let invalid = || Error::Config(format!("{} expects WxH, got {:?}", flag, text));
    let (w, h) = text.split_once('x').ok_or_else(invalid)?;
    match (w.parse(), h.parse()) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(invalid()),
    }
}

/// Parse the serde name of an enum value, e.g. `on-change`
fn parse_named<T: serde::de::DeserializeOwned>(flag: &str, value: Option<&String>) -> Result<T> {
    let text: String = parse_value(flag, value)?;
    serde_json::from_value(serde_json::Value::String(text.clone()))
        .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", flag, text)))
}

/// Parse command-line arguments (without the program name).
///
/// `--config` is loaded first wherever it appears; every other flag
/// overrides the loaded values.
pub fn parse_args(args: &[String]) -> Result<Command> {
    let mut config = match args.iter().position(|a| a == "--config" || a == "-c") {
        Some(i) => {
            let path: String = parse_value("--config", args.get(i + 1))?;
            Config::load(path)?
        },
        None => Config::default(),
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--help" => return Ok(Command::Help),
            "--no-vsync" => config.window.vsync = false,
            "--single-thread" => config.render.multithreading = false,
            "--config" | "-c" => i += 1,
            "--width" | "-w" => {
                config.window.width = parse_value(flag, value)?;
                i += 1;
            },
            "--height" | "-h" => {
                config.window.height = parse_value(flag, value)?;
                i += 1;
            },
            "--resolution" | "-r" => {
                (config.window.width, config.window.height) = parse_dims(flag, value)?;
                i += 1;
            },
            "--bitmap" | "-b" => {
                (config.bitmap.width, config.bitmap.height) = parse_dims(flag, value)?;
                i += 1;
            },
            "--workers" => {
                config.render.workers = Some(parse_value(flag, value)?);
                i += 1;
            },
            "--recreate" => {
                config.render.recreate = parse_named(flag, value)?;
                i += 1;
            },
            "--format" => {
                config.render.format = parse_named(flag, value)?;
                i += 1;
            },
            other => return Err(Error::Config(format!("unknown option {:?}", other))),
        }
        i += 1;
    }

    if config.window.width == 0 || config.window.height == 0 {
        return Err(Error::Config("window size must be positive".to_string()));
    }
    Ok(Command::Run(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(list: &[&str]) -> Config {
        match parse_args(&args(list)).unwrap() {
            Command::Run(config) => config,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = run(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.render.recreate, RecreatePolicy::EveryFrame);
        assert!(config.render.multithreading);
    }

    #[test]
    fn test_overrides() {
        let config = run(&[
            "-r",
            "1920x1080",
            "--bitmap",
            "320x180",
            "--no-vsync",
            "--single-thread",
            "--workers",
            "6",
            "--recreate",
            "on-change",
            "--format",
            "argb8888",
        ]);
        assert_eq!((config.window.width, config.window.height), (1920, 1080));
        assert_eq!((config.bitmap.width, config.bitmap.height), (320, 180));
        assert!(!config.window.vsync);
        assert!(!config.render.multithreading);
        assert_eq!(config.render.workers, Some(6));
        assert_eq!(config.render.recreate, RecreatePolicy::OnChange);
        assert_eq!(config.render.format, PixelFormat::Argb8888);
    }

    #[test]
    fn test_help() {
        assert_eq!(parse_args(&args(&["-w", "10", "--help"])).unwrap(), Command::Help);
    }

    #[test]
    fn test_bad_values() {
        for bad in [
            &["--width"][..],
            &["--width", "wide"],
            &["-r", "1920"],
            &["-r", "axb"],
            &["--recreate", "sometimes"],
            &["--bogus"],
            &["-w", "0"],
        ] {
            assert!(
                matches!(parse_args(&args(bad)), Err(Error::Config(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "bitmap": { "width": 64 }, "render": { "recreate": "on-change" } }"#)
                .unwrap();
        assert_eq!(config.bitmap.width, 64);
        assert_eq!(config.bitmap.height, DEFAULT_BITMAP_HEIGHT);
        assert_eq!(config.render.recreate, RecreatePolicy::OnChange);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_file_then_flags() {
        let path = std::env::temp_dir().join(format!("pixelgrid-config-{}.json", std::process::id()));
        let mut saved = Config::default();
        saved.window.width = 800;
        saved.render.workers = Some(3);
        saved.save(&path).unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let config = run(&["--workers", "5", "--config", &path_arg]);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.render.workers, Some(5));
        assert_eq!(Config::load(&path).unwrap(), saved);

        let _ = fs::remove_file(path);
    }
}
