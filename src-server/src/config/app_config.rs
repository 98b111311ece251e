//! Runtime application configuration loaded from settings + environment.

use std::path::PathBuf;
use std::time::Duration;

use qr_engine::{DEFAULT_SIZE, EcLevel, HexColor};

use super::manager::SettingsManager;
use crate::controller::{ControllerConfig, DebounceDelays, ReadinessConfig};
use crate::services::status::StatusPresentation;

/// Which kind of drawable the renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Paintable raster, ready as soon as it is inserted.
    #[default]
    Surface,
    /// PNG image node that has to finish decoding first.
    Image,
}

impl RenderMode {
    pub fn from_str_setting(value: &str) -> Self {
        match value {
            "image" => RenderMode::Image,
            _ => RenderMode::Surface,
        }
    }
}

/// Runtime configuration populated from the settings manager.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub default_size: u32,
    pub default_ec_level: EcLevel,
    pub dark_color: HexColor,
    pub light_color: HexColor,
    pub cooldown_seconds: u32,
    pub download_filename: String,
    /// `None` means `<data dir>/downloads`.
    pub output_dir: Option<PathBuf>,
    pub render_mode: RenderMode,
    pub status_presentation: StatusPresentation,
    pub ready_poll_interval: Duration,
    pub ready_poll_attempts: u32,
    pub decode_timeout: Duration,
    pub debounce_color: Duration,
    pub debounce_size: Duration,
    pub debounce_ec_level: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8080,
            default_size: DEFAULT_SIZE,
            default_ec_level: EcLevel::H,
            dark_color: HexColor::BLACK,
            light_color: HexColor::WHITE,
            cooldown_seconds: 3,
            download_filename: "qr-code.png".into(),
            output_dir: None,
            render_mode: RenderMode::Surface,
            status_presentation: StatusPresentation::Inline,
            ready_poll_interval: Duration::from_millis(50),
            ready_poll_attempts: 40,
            decode_timeout: Duration::from_millis(2000),
            debounce_color: Duration::from_millis(80),
            debounce_size: Duration::from_millis(80),
            debounce_ec_level: Duration::ZERO,
        }
    }
}

impl AppConfig {
    /// Load configuration from the settings manager.
    pub fn load(sm: &SettingsManager) -> Result<Self, anyhow::Error> {
        let g = |key: &str| -> String { sm.get_setting(key).unwrap_or_default() };
        let d = Self::default();

        Ok(Self {
            server_port: parse_or(&g("SERVER_PORT"), d.server_port),
            default_size: parse_or(&g("QR_DEFAULT_SIZE"), d.default_size),
            default_ec_level: EcLevel::from_str_setting(&g("QR_DEFAULT_EC_LEVEL")),
            dark_color: HexColor::parse(&g("QR_DARK_COLOR")).unwrap_or(d.dark_color),
            light_color: HexColor::parse(&g("QR_LIGHT_COLOR")).unwrap_or(d.light_color),
            cooldown_seconds: parse_or(&g("QR_COOLDOWN_SECONDS"), d.cooldown_seconds),
            download_filename: {
                let name = g("QR_DOWNLOAD_FILENAME");
                if name.is_empty() {
                    d.download_filename
                } else {
                    name
                }
            },
            output_dir: {
                let dir = g("QR_OUTPUT_DIR");
                if dir.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(dir))
                }
            },
            render_mode: RenderMode::from_str_setting(&g("QR_RENDER_MODE")),
            status_presentation: StatusPresentation::from_str_setting(&g("STATUS_PRESENTATION")),
            ready_poll_interval: parse_millis(&g("READY_POLL_INTERVAL_MS"), d.ready_poll_interval),
            ready_poll_attempts: parse_or(&g("READY_POLL_ATTEMPTS"), d.ready_poll_attempts),
            decode_timeout: parse_millis(&g("DECODE_TIMEOUT_MS"), d.decode_timeout),
            debounce_color: parse_millis(&g("DEBOUNCE_COLOR_MS"), d.debounce_color),
            debounce_size: parse_millis(&g("DEBOUNCE_SIZE_MS"), d.debounce_size),
            debounce_ec_level: parse_millis(&g("DEBOUNCE_EC_LEVEL_MS"), d.debounce_ec_level),
        })
    }

    /// The slice of configuration the controller owns.
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            cooldown_seconds: self.cooldown_seconds,
            download_filename: self.download_filename.clone(),
            readiness: ReadinessConfig {
                poll_interval: self.ready_poll_interval,
                poll_attempts: self.ready_poll_attempts,
                decode_timeout: self.decode_timeout,
            },
            debounce: DebounceDelays {
                color: self.debounce_color,
                size: self.debounce_size,
                ec_level: self.debounce_ec_level,
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(s: &str, default: T) -> T {
    if s.is_empty() {
        return default;
    }
    s.parse().unwrap_or(default)
}

fn parse_millis(s: &str, default: Duration) -> Duration {
    if s.is_empty() {
        return default;
    }
    s.parse().map(Duration::from_millis).unwrap_or(default)
}
