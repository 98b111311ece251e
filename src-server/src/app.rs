use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, SettingsManager};
use crate::controller::{GenerateOptions, QrController};
use crate::render::renderer_for;
use crate::services::{FileSaver, StatusBoard, StatusReporter};

/// Application shared state accessible from axum handlers and the binary.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Application configuration as loaded at startup
    config: AppConfig,
    /// Resolved settings, including defaults
    settings: SettingsManager,
    controller: QrController,
    status: StatusBoard,
    /// Data directory path
    data_dir: PathBuf,
    /// Cancelled to stop the HTTP server
    shutdown: CancellationToken,
}

impl SharedState {
    /// Wire the controller and its collaborators from loaded config.
    pub fn new(settings: SettingsManager, config: AppConfig, data_dir: PathBuf) -> Self {
        let status = StatusBoard::new(config.status_presentation);
        let output_dir = config
            .output_dir
            .clone()
            .unwrap_or_else(|| data_dir.join("downloads"));

        let controller = QrController::new(
            config.controller_config(),
            renderer_for(config.render_mode),
            Arc::new(FileSaver::new(output_dir)),
            Arc::new(status.clone()) as Arc<dyn StatusReporter>,
        );

        Self {
            inner: Arc::new(SharedStateInner {
                config,
                settings,
                controller,
                status,
                data_dir,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn server_port(&self) -> u16 {
        self.inner.config.server_port
    }

    pub fn controller(&self) -> &QrController {
        &self.inner.controller
    }

    pub fn status(&self) -> &StatusBoard {
        &self.inner.status
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.inner.settings
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Generation options from the configured defaults.
    pub fn default_options(&self) -> GenerateOptions {
        let config = self.config();
        GenerateOptions {
            dark: config.dark_color,
            light: config.light_color,
            size: config.default_size,
            ec_level: config.default_ec_level,
        }
    }

    /// Stop the server and every controller task.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.controller.shutdown();
    }
}
