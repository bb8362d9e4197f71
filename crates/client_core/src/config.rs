use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "mods4versus.toml";
pub const DEFAULT_HINTS_PATH: &str = "tips.json";

/// Timings and resource paths for one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub update_check_delay: Duration,
    pub install_restart_delay: Duration,
    pub progress_tick: Duration,
    pub hint_rotation: Duration,
    pub overlay_close_hold: Duration,
    pub hints_path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            update_check_delay: Duration::from_millis(2000),
            install_restart_delay: Duration::from_millis(1500),
            progress_tick: Duration::from_millis(300),
            hint_rotation: Duration::from_millis(4000),
            overlay_close_hold: Duration::from_millis(200),
            hints_path: PathBuf::from(DEFAULT_HINTS_PATH),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    update_check_delay_ms: Option<u64>,
    install_restart_delay_ms: Option<u64>,
    progress_tick_ms: Option<u64>,
    hint_rotation_ms: Option<u64>,
    overlay_close_hold_ms: Option<u64>,
    hints_path: Option<PathBuf>,
}

/// Defaults, then `mods4versus.toml` in the working directory, then
/// `APP__*` environment variables.
pub fn load_settings() -> SessionSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> SessionSettings {
    let mut settings = SessionSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unparseable settings file");
            }
        }
    }

    if let Some(v) = parse_env(&env_lookup, "APP__UPDATE_CHECK_DELAY_MS") {
        settings.update_check_delay = Duration::from_millis(v);
    }
    if let Some(v) = parse_env(&env_lookup, "APP__INSTALL_RESTART_DELAY_MS") {
        settings.install_restart_delay = Duration::from_millis(v);
    }
    if let Some(v) = parse_env(&env_lookup, "APP__PROGRESS_TICK_MS") {
        settings.progress_tick = Duration::from_millis(v);
    }
    if let Some(v) = parse_env(&env_lookup, "APP__HINT_ROTATION_MS") {
        settings.hint_rotation = Duration::from_millis(v);
    }
    if let Some(v) = parse_env(&env_lookup, "APP__OVERLAY_CLOSE_HOLD_MS") {
        settings.overlay_close_hold = Duration::from_millis(v);
    }
    if let Some(v) = env_lookup("APP__HINTS_PATH") {
        settings.hints_path = PathBuf::from(v);
    }

    settings
}

fn apply_file_settings(settings: &mut SessionSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.update_check_delay_ms {
        settings.update_check_delay = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.install_restart_delay_ms {
        settings.install_restart_delay = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.progress_tick_ms {
        settings.progress_tick = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.hint_rotation_ms {
        settings.hint_rotation = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.overlay_close_hold_ms {
        settings.overlay_close_hold = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.hints_path {
        settings.hints_path = v;
    }
}

fn parse_env<T: FromStr>(env_lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env_lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
