// ============================================================================
// SETTINGS — persisted preferences in a plain `key=value` file
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::log_warn;
use crate::pipelines::PipelineId;
use crate::scheduler::DEFAULT_RENDER_DELAY;

const FILE_NAME: &str = "shaderfx_settings.cfg";

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// "high performance", "low power" or an empty string for the default.
    pub preferred_gpu: String,
    /// Pipeline selected at startup.
    pub default_pipeline: PipelineId,
    /// Coalescing window for renders requested by slider edits.
    pub render_delay_ms: u64,
    /// Share of the central area given to the original-image view.
    pub left_panel_fraction: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            preferred_gpu: String::new(),
            default_pipeline: PipelineId::DEFAULT,
            render_delay_ms: DEFAULT_RENDER_DELAY.as_millis() as u64,
            left_panel_fraction: 0.5,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/shaderfx/shaderfx_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\ShaderFX\shaderfx_settings.cfg
    /// On macOS:   ~/Library/Application Support/ShaderFX/shaderfx_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("ShaderFX").join(FILE_NAME));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("ShaderFX")
                    .join(FILE_NAME),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("shaderfx").join(FILE_NAME))
        }
    }

    /// Load from disk; a missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::parse(&content)
    }

    /// Parse `key=value` lines.  Unknown keys and bad values keep defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let (key, val) = (key.trim(), val.trim());
            match key {
                "preferred_gpu" => s.preferred_gpu = val.to_string(),
                "default_pipeline" => match val.parse() {
                    Ok(id) => s.default_pipeline = id,
                    Err(e) => {
                        log_warn!("settings: {}", e);
                    }
                },
                "render_delay_ms" => {
                    if let Ok(ms) = val.parse::<u64>() {
                        s.render_delay_ms = ms.min(1000);
                    }
                }
                "left_panel_fraction" => {
                    if let Ok(f) = val.parse::<f32>()
                        && f.is_finite()
                    {
                        s.left_panel_fraction = f.clamp(0.1, 0.9);
                    }
                }
                _ => {}
            }
        }
        s
    }

    pub fn serialize(&self) -> String {
        format!(
            "preferred_gpu={}\ndefault_pipeline={}\nrender_delay_ms={}\nleft_panel_fraction={}\n",
            self.preferred_gpu, self.default_pipeline, self.render_delay_ms, self.left_panel_fraction
        )
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&path, self.serialize()) {
            log_warn!("settings: could not write {}: {}", path.display(), e);
        }
    }

    pub fn render_delay(&self) -> Duration {
        Duration::from_millis(self.render_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_known_keys() {
        let s = AppSettings::parse(
            "preferred_gpu = low power\ndefault_pipeline=ryuukishi\nrender_delay_ms=40\nleft_panel_fraction=0.3\n",
        );
        assert_eq!(s.preferred_gpu, "low power");
        assert_eq!(s.default_pipeline, PipelineId::Ryuukishi);
        assert_eq!(s.render_delay(), Duration::from_millis(40));
        assert!((s.left_panel_fraction - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        let s = AppSettings::parse("default_pipeline=nope\nrender_delay_ms=-3\nleft_panel_fraction=NaN\nmystery=1\ngarbage");
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn values_are_clamped() {
        let s = AppSettings::parse("render_delay_ms=99999\nleft_panel_fraction=5");
        assert_eq!(s.render_delay_ms, 1000);
        assert!((s.left_panel_fraction - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn serialize_parses_back() {
        let s = AppSettings {
            preferred_gpu: "discrete".into(),
            default_pipeline: PipelineId::Painterly,
            render_delay_ms: 25,
            left_panel_fraction: 0.4,
        };
        assert_eq!(AppSettings::parse(&s.serialize()), s);
    }
}
