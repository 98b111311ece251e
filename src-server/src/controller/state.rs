//! Controller lifecycle states and the download cooldown counter.

use serde::Serialize;

const DOWNLOAD_LABEL: &str = "Download";

/// Externally visible controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    Generating,
    Ready,
    Downloading,
    CoolingDown,
}

/// Render lifecycle, tracked independently of the cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Generating,
    Ready,
    Downloading,
}

impl Phase {
    /// Combine with the cooldown into the state users see.
    pub(crate) fn with_cooldown(self, cooldown: &CooldownState) -> ControllerState {
        match self {
            Phase::Downloading => ControllerState::Downloading,
            _ if cooldown.active => ControllerState::CoolingDown,
            Phase::Idle => ControllerState::Idle,
            Phase::Generating => ControllerState::Generating,
            Phase::Ready => ControllerState::Ready,
        }
    }
}

/// Download cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CooldownState {
    pub active: bool,
    pub remaining_seconds: u32,
}

impl CooldownState {
    /// Start counting down from `seconds`. Zero leaves the cooldown inactive.
    pub fn start(&mut self, seconds: u32) {
        self.active = seconds > 0;
        self.remaining_seconds = seconds;
    }

    /// One second elapsed. Returns `true` once the cooldown is over.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return true;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.active = false;
        }
        !self.active
    }

    /// Label for the download button.
    pub fn label(&self) -> String {
        if self.active {
            format!("{DOWNLOAD_LABEL} ({})", self.remaining_seconds)
        } else {
            DOWNLOAD_LABEL.to_string()
        }
    }
}

/// Point-in-time view of the controller for the user surface.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub state: ControllerState,
    pub download_enabled: bool,
    pub download_label: String,
    pub cooldown: CooldownState,
    pub generation: u64,
    /// Kind of the displayed drawable, if any.
    pub drawable: Option<&'static str>,
}
