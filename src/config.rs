use crate::driver::DriverTuning;
use crate::generator::GeneratorTuning;
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser, Debug, Default)]
#[command(name = "psychograph")]
#[command(about = "Animated psychographic display for the terminal", long_about = None)]
pub(crate) struct Args {
    /// frames per second cap
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// seed for the random source (random when omitted)
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// draw everything in plain white
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// hide the green measurement lines
    #[arg(long, default_value_t = false)]
    pub(crate) no_grid: bool,

    /// hide the crosshair grid
    #[arg(long, default_value_t = false)]
    pub(crate) no_crosshairs: bool,

    /// settings file to read instead of the per-user one
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// leave N rows unused at the bottom (the status line sits above them)
    #[arg(long, default_value_t = 0)]
    pub(crate) margin_rows: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Tuning {
    pub(crate) generator: GeneratorTuning,
    pub(crate) driver: DriverTuning,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) seed: Option<u64>,
    /// Multiplier applied to the wall-clock frame delta (ms) before it reaches the driver.
    pub(crate) delta_scale: f64,
    pub(crate) show_grid: bool,
    pub(crate) show_crosshairs: bool,
    pub(crate) tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            seed: None,
            delta_scale: 2.0,
            show_grid: true,
            show_crosshairs: true,
            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    pub(crate) fn apply_args(&mut self, args: &Args) {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
        if args.no_color {
            self.enable_color = false;
        }
        if args.no_grid {
            self.show_grid = false;
        }
        if args.no_crosshairs {
            self.show_crosshairs = false;
        }
        if !self.delta_scale.is_finite() || self.delta_scale < 0.0 {
            self.delta_scale = Settings::default().delta_scale;
        }
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "psychograph", "Psychograph")
        .context("could not resolve project directories")?;
    let data = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&data).ok();
    Ok(Paths {
        settings_path: proj.config_dir().join("settings.json"),
        log_path: data.join("psychograph.log"),
    })
}

/// Reads settings, falling back to defaults when the file is absent or unreadable.
pub(crate) fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => parse_settings(&s).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "ignoring malformed settings file");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

fn parse_settings(s: &str) -> Result<Settings> {
    serde_json::from_str::<Settings>(s).context("parsing settings json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let s = parse_settings(r#"{ "fps_cap": 60, "tuning": { "generator": { "exterior_jump_chance": 0.0 } } }"#)
            .unwrap();
        assert_eq!(s.fps_cap, 60);
        assert!(s.enable_color);
        assert_eq!(s.tuning.generator.exterior_jump_chance, 0.0);
        assert_eq!(
            s.tuning.generator.branch_jump_chance,
            GeneratorTuning::default().branch_jump_chance
        );
        assert_eq!(s.tuning.driver, DriverTuning::default());
    }

    #[test]
    fn malformed_file_falls_back() {
        assert!(parse_settings("{ fps_cap: ").is_err());
        let dir = std::env::temp_dir().join(format!("psychograph-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_default() {
        let path = Path::new("/definitely/not/here/settings.json");
        assert_eq!(load_settings(path), Settings::default());
    }

    #[test]
    fn flags_override_settings() {
        let args = Args::parse_from(["psychograph", "--fps", "45", "--seed", "7", "--no-grid"]);
        let mut s = Settings::default();
        s.apply_args(&args);
        assert_eq!(s.fps_cap, 45);
        assert_eq!(s.seed, Some(7));
        assert!(!s.show_grid);
        assert!(s.show_crosshairs);
    }
}
