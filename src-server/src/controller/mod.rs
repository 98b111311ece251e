//! Generate → ready → download → cooldown orchestration.
//!
//! One [`QrController`] owns the display container, the readiness watcher,
//! the debounce timer and the cooldown countdown. Background work runs on
//! Tokio tasks tied to the controller's shutdown token; the state mutex is
//! never held across an `.await`.

mod debounce;
mod error;
pub mod readiness;
mod state;

#[cfg(test)]
mod tests;

pub use debounce::{DebounceDelays, Debouncer, InputTrigger};
pub use error::ControlError;
pub use readiness::{ReadinessConfig, ReadinessError};
pub use state::{ControllerSnapshot, ControllerState, CooldownState};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use qr_engine::{
    ContrastGate, DEFAULT_SIZE, EcLevel, HexColor, MAX_SIZE, MIN_SIZE, RenderRequest,
};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::render::{DisplayContainer, Drawable, Renderer};
use crate::services::{SavedFile, Saver, Status, StatusReporter};
use state::Phase;

const MSG_GENERATING: &str = "Generating…";
const MSG_EMPTY_INPUT: &str = "Enter a URL then click Generate.";
const MSG_LOW_CONTRAST: &str = "Colors too similar. Increase contrast or make foreground darker.";
const MSG_READY: &str = "QR ready. You can download it.";
const MSG_NOTHING_TO_DOWNLOAD: &str = "No QR code to download yet.";
const MSG_DOWNLOADED: &str = "Downloaded. Cooldown active…";
const MSG_READY_AGAIN: &str = "Ready to download again.";

const TICK: Duration = Duration::from_secs(1);

/// Controller tuning.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub cooldown_seconds: u32,
    pub download_filename: String,
    pub readiness: ReadinessConfig,
    pub debounce: DebounceDelays,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 3,
            download_filename: "qr-code.png".into(),
            readiness: ReadinessConfig::default(),
            debounce: DebounceDelays::default(),
        }
    }
}

/// Per-generation rendering options.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub dark: HexColor,
    pub light: HexColor,
    pub size: u32,
    pub ec_level: EcLevel,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            dark: HexColor::BLACK,
            light: HexColor::WHITE,
            size: DEFAULT_SIZE,
            ec_level: EcLevel::H,
        }
    }
}

impl GenerateOptions {
    /// Build options from form values, falling back to `defaults` for missing ones.
    pub fn from_form(
        defaults: &GenerateOptions,
        dark: Option<&str>,
        light: Option<&str>,
        size: Option<u32>,
        ec_level: Option<&str>,
    ) -> Result<Self, ControlError> {
        let color = |value: Option<&str>, fallback: HexColor| match value {
            Some(v) => HexColor::parse(v).map_err(ControlError::InvalidColor),
            None => Ok(fallback),
        };

        Ok(Self {
            dark: color(dark, defaults.dark)?,
            light: color(light, defaults.light)?,
            size: check_size(size.unwrap_or(defaults.size))?,
            ec_level: ec_level.map_or(defaults.ec_level, EcLevel::from_str_setting),
        })
    }
}

fn check_size(size: u32) -> Result<u32, ControlError> {
    if (MIN_SIZE..=MAX_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(ControlError::InvalidSize { size })
    }
}

#[derive(Debug, Default)]
struct ControlState {
    phase: Phase,
    cooldown: CooldownState,
    readiness: Option<CancellationToken>,
    countdown: Option<JoinHandle<()>>,
    debounce: Debouncer,
}

impl ControlState {
    fn cancel_readiness(&mut self) {
        if let Some(token) = self.readiness.take() {
            token.cancel();
        }
    }
}

struct Inner {
    config: ControllerConfig,
    gate: ContrastGate,
    renderer: Arc<dyn Renderer>,
    saver: Arc<dyn Saver>,
    reporter: Arc<dyn StatusReporter>,
    display: DisplayContainer,
    shutdown: CancellationToken,
    state: Mutex<ControlState>,
}

/// Owns the QR render / download lifecycle. Cheap to clone.
///
/// Operations that start background work (`generate`, `download`,
/// `schedule_regenerate`) must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct QrController {
    inner: Arc<Inner>,
}

impl QrController {
    pub fn new(
        config: ControllerConfig,
        renderer: Arc<dyn Renderer>,
        saver: Arc<dyn Saver>,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                gate: ContrastGate::new(),
                renderer,
                saver,
                reporter,
                display: DisplayContainer::new(),
                shutdown: CancellationToken::new(),
                state: Mutex::new(ControlState::default()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn contrast_gate(&self) -> &ContrastGate {
        &self.inner.gate
    }

    /// Validate input and start a new generation.
    ///
    /// Blank text clears the display; an out-of-range size or colours that
    /// fail the contrast gate leave it untouched. None reaches the renderer.
    pub fn generate(&self, text: &str, options: &GenerateOptions) -> Result<(), ControlError> {
        let inner = &self.inner;
        let text = text.trim();

        if text.is_empty() {
            {
                let mut st = inner.lock_state();
                st.cancel_readiness();
                inner.display.clear();
                st.phase = Phase::Idle;
            }
            inner.report(Status::rejected(MSG_EMPTY_INPUT));
            return Err(ControlError::EmptyInput);
        }

        if let Err(e) = check_size(options.size) {
            inner.report(Status::rejected(format!(
                "Size must be between {MIN_SIZE} and {MAX_SIZE} pixels."
            )));
            return Err(e);
        }

        let contrast = inner.gate.check(options.dark, options.light);
        if !contrast.scannable {
            inner.report(Status::rejected(MSG_LOW_CONTRAST));
            return Err(ControlError::LowContrast {
                ratio: contrast.ratio,
            });
        }

        let request = RenderRequest {
            text: text.to_string(),
            width: options.size,
            height: options.size,
            dark: options.dark,
            light: options.light,
            ec_level: options.ec_level,
        };

        let target = {
            let mut st = inner.lock_state();
            st.cancel_readiness();
            st.phase = Phase::Generating;
            inner.display.clear()
        };
        let generation = target.generation();
        debug!(generation, size = options.size, ec_level = %options.ec_level, "Generating QR code");
        inner.report(Status::info(MSG_GENERATING));

        if let Err(e) = inner.renderer.render(target, &request) {
            {
                let mut st = inner.lock_state();
                if inner.display.generation() == generation {
                    st.phase = Phase::Idle;
                }
            }
            inner.report(Status::failed(format!("Could not render QR code: {e}")));
            return Err(e.into());
        }

        // Synchronous renderers are usually done already.
        if inner
            .display
            .current_for(generation)
            .is_some_and(|d| d.is_paintable())
        {
            inner.finish_readiness(generation, Ok(()));
            return Ok(());
        }

        let token = inner.shutdown.child_token();
        {
            let mut st = inner.lock_state();
            if inner.display.generation() != generation {
                return Ok(());
            }
            st.readiness = Some(token.clone());
        }
        tokio::spawn(watch_readiness(Arc::clone(inner), generation, token));
        Ok(())
    }

    /// Export the ready drawable and hand it to the saver, then start the cooldown.
    pub fn download(&self) -> Result<SavedFile, ControlError> {
        let inner = &self.inner;

        let (generation, drawable) = {
            let mut st = inner.lock_state();
            if st.cooldown.active {
                let remaining = st.cooldown.remaining_seconds;
                drop(st);
                inner.report(Status::info(format!(
                    "Please wait {remaining}s before downloading again."
                )));
                return Err(ControlError::CooldownActive { remaining });
            }

            let generation = inner.display.generation();
            let Some(drawable) = inner.display.current().filter(|_| st.phase == Phase::Ready) else {
                drop(st);
                inner.report(Status::rejected(MSG_NOTHING_TO_DOWNLOAD));
                return Err(ControlError::NotReady);
            };
            st.phase = Phase::Downloading;
            (generation, drawable)
        };

        let result = drawable
            .export_data_uri()
            .map_err(ControlError::Export)
            .and_then(|uri| {
                inner
                    .saver
                    .save(&uri, &inner.config.download_filename)
                    .map_err(ControlError::from)
            });

        let mut st = inner.lock_state();
        if st.phase == Phase::Downloading && inner.display.generation() == generation {
            st.phase = Phase::Ready;
        }

        match result {
            Ok(saved) => {
                let seconds = inner.config.cooldown_seconds;
                st.cooldown.start(seconds);
                if st.cooldown.active {
                    let handle = tokio::spawn(run_countdown(Arc::clone(inner)));
                    if let Some(old) = st.countdown.replace(handle) {
                        old.abort();
                    }
                }
                drop(st);

                info!(filename = %saved.filename, cooldown = seconds, "QR code downloaded");
                let message = if seconds > 0 {
                    MSG_DOWNLOADED
                } else {
                    "Downloaded."
                };
                inner.report(Status::info(message));
                Ok(saved)
            }
            Err(e) => {
                drop(st);
                inner.report(Status::failed(format!("Download failed: {e}")));
                Err(e)
            }
        }
    }

    /// Regenerate after the trigger's quiet period, coalescing rapid changes.
    ///
    /// Returns `false` (and drops any pending regeneration) when `text` is blank.
    pub fn schedule_regenerate(
        &self,
        trigger: InputTrigger,
        text: &str,
        options: GenerateOptions,
    ) -> bool {
        let mut st = self.inner.lock_state();
        if text.trim().is_empty() {
            st.debounce.cancel();
            return false;
        }

        let delay = self.inner.config.debounce.delay_for(trigger);
        let controller = self.clone();
        let text = text.to_string();
        debug!(?trigger, ?delay, "Scheduling debounced regeneration");
        st.debounce.schedule(delay, async move {
            if let Err(e) = controller.generate(&text, &options) {
                debug!("Debounced regeneration did not start: {e}");
            }
        });
        true
    }

    pub fn state(&self) -> ControllerState {
        let st = self.inner.lock_state();
        st.phase.with_cooldown(&st.cooldown)
    }

    pub fn cooldown(&self) -> CooldownState {
        self.inner.lock_state().cooldown
    }

    pub fn download_label(&self) -> String {
        self.inner.lock_state().cooldown.label()
    }

    pub fn download_enabled(&self) -> bool {
        let st = self.inner.lock_state();
        st.phase == Phase::Ready && !st.cooldown.active && self.inner.display.current().is_some()
    }

    /// The drawable currently shown, ready or not.
    pub fn current_drawable(&self) -> Option<Drawable> {
        self.inner.display.current()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let st = self.inner.lock_state();
        let drawable = self.inner.display.current();
        ControllerSnapshot {
            state: st.phase.with_cooldown(&st.cooldown),
            download_enabled: st.phase == Phase::Ready && !st.cooldown.active && drawable.is_some(),
            download_label: st.cooldown.label(),
            cooldown: st.cooldown,
            generation: self.inner.display.generation(),
            drawable: drawable.map(|d| d.kind()),
        }
    }

    /// Cancel every background task. The controller is unusable afterwards.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut st = self.inner.lock_state();
        st.debounce.cancel();
        st.cancel_readiness();
        if let Some(handle) = st.countdown.take() {
            handle.abort();
        }
        info!("QR controller shut down");
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ControlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, status: Status) {
        self.reporter.report(status);
    }

    /// Apply a readiness outcome, unless a newer generation has started.
    fn finish_readiness(&self, generation: u64, outcome: Result<(), ReadinessError>) {
        let status = {
            let mut st = self.lock_state();
            if self.display.generation() != generation {
                debug!(generation, "Ignoring readiness signal from superseded generation");
                return;
            }
            st.readiness = None;
            match outcome {
                Ok(()) => {
                    st.phase = Phase::Ready;
                    Status::ready(MSG_READY)
                }
                Err(e) => {
                    st.phase = Phase::Idle;
                    Status::failed(e.to_string())
                }
            }
        };
        self.report(status);
    }

    /// One countdown second. Returns `true` when the countdown should stop.
    fn tick_cooldown(&self) -> bool {
        {
            let mut st = self.lock_state();
            if !st.cooldown.tick() {
                return false;
            }
            st.countdown = None;
        }
        self.report(Status::info(MSG_READY_AGAIN));
        true
    }
}

async fn watch_readiness(inner: Arc<Inner>, generation: u64, token: CancellationToken) {
    let outcome = tokio::select! {
        _ = token.cancelled() => {
            debug!(generation, "Readiness detection cancelled");
            return;
        }
        result = readiness::wait_until_ready(
            &inner.display,
            generation,
            &inner.config.readiness,
        ) => result,
    };
    inner.finish_readiness(generation, outcome.map(|_| ()));
}

async fn run_countdown(inner: Arc<Inner>) {
    let shutdown = inner.shutdown.clone();
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => {}
        }
        if inner.tick_cooldown() {
            return;
        }
    }
}
