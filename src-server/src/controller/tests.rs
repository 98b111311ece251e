use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use qr_engine::{HexColor, RenderRequest};
use tokio::time::sleep;

use super::*;
use crate::render::{DisplayTarget, ImageNode, RenderError, SurfaceRenderer};
use crate::services::{SaveError, StatusKind};

// --- Test doubles ---

/// Surface renderer that counts calls.
#[derive(Default)]
struct CountingRenderer {
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl Renderer for CountingRenderer {
    fn render(&self, target: DisplayTarget, request: &RenderRequest) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(request.text.clone());
        SurfaceRenderer.render(target, request)
    }
}

impl CountingRenderer {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Renderer that inserts nothing; the test drives the targets.
#[derive(Default)]
struct ManualRenderer {
    targets: Mutex<Vec<DisplayTarget>>,
}

impl Renderer for ManualRenderer {
    fn render(&self, target: DisplayTarget, _request: &RenderRequest) -> Result<(), RenderError> {
        self.targets.lock().unwrap().push(target);
        Ok(())
    }
}

impl ManualRenderer {
    fn target(&self, index: usize) -> DisplayTarget {
        self.targets.lock().unwrap()[index].clone()
    }
}

#[derive(Default)]
struct MemorySaver {
    saved: Mutex<Vec<(String, String)>>,
}

impl Saver for MemorySaver {
    fn save(&self, data_uri: &str, filename: &str) -> Result<SavedFile, SaveError> {
        self.saved
            .lock()
            .unwrap()
            .push((data_uri.to_string(), filename.to_string()));
        Ok(SavedFile {
            filename: filename.to_string(),
            path: filename.into(),
            bytes: data_uri.len(),
        })
    }
}

impl MemorySaver {
    fn count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    fn last_uri(&self) -> String {
        self.saved.lock().unwrap().last().unwrap().0.clone()
    }
}

struct FailingSaver;

impl Saver for FailingSaver {
    fn save(&self, _data_uri: &str, filename: &str) -> Result<SavedFile, SaveError> {
        Err(SaveError::FileName(filename.to_string()))
    }
}

#[derive(Default)]
struct RecordingReporter {
    statuses: Mutex<Vec<Status>>,
}

impl StatusReporter for RecordingReporter {
    fn report(&self, status: Status) {
        self.statuses.lock().unwrap().push(status);
    }
}

impl RecordingReporter {
    fn last(&self) -> Status {
        self.statuses.lock().unwrap().last().cloned().unwrap()
    }
}

// --- Harness ---

struct Harness<R> {
    controller: QrController,
    renderer: Arc<R>,
    saver: Arc<MemorySaver>,
    reporter: Arc<RecordingReporter>,
}

fn test_config() -> ControllerConfig {
    ControllerConfig {
        readiness: ReadinessConfig {
            poll_interval: Duration::from_millis(10),
            poll_attempts: 20,
            decode_timeout: Duration::from_millis(500),
        },
        ..ControllerConfig::default()
    }
}

fn harness<R: Renderer + Default + 'static>(config: ControllerConfig) -> Harness<R> {
    let renderer = Arc::new(R::default());
    let saver = Arc::new(MemorySaver::default());
    let reporter = Arc::new(RecordingReporter::default());
    let controller = QrController::new(
        config,
        Arc::clone(&renderer) as Arc<dyn Renderer>,
        Arc::clone(&saver) as Arc<dyn Saver>,
        Arc::clone(&reporter) as Arc<dyn StatusReporter>,
    );
    Harness {
        controller,
        renderer,
        saver,
        reporter,
    }
}

fn opts() -> GenerateOptions {
    GenerateOptions {
        size: 128,
        ..GenerateOptions::default()
    }
}

/// Let spawned tasks run without crossing any meaningful timer.
async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

// --- Validation ---

#[tokio::test(start_paused = true)]
async fn empty_input_never_reaches_renderer() {
    let h = harness::<CountingRenderer>(test_config());

    for text in ["", "   ", "\n\t"] {
        let err = h.controller.generate(text, &opts()).unwrap_err();
        assert!(matches!(err, ControlError::EmptyInput));
    }

    assert_eq!(h.renderer.calls(), 0);
    assert_eq!(h.controller.state(), ControllerState::Idle);
    let last = h.reporter.last();
    assert_eq!(last.kind, StatusKind::Rejected);
    assert_eq!(last.message, MSG_EMPTY_INPUT);
}

#[tokio::test(start_paused = true)]
async fn empty_input_clears_previous_code() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();
    assert!(h.controller.current_drawable().is_some());

    h.controller.generate("  ", &opts()).unwrap_err();
    assert!(h.controller.current_drawable().is_none());
    assert!(!h.controller.download_enabled());
}

#[tokio::test(start_paused = true)]
async fn low_contrast_never_reaches_renderer() {
    let h = harness::<CountingRenderer>(test_config());

    let inverted = GenerateOptions {
        dark: HexColor::WHITE,
        light: HexColor::BLACK,
        ..opts()
    };
    let err = h.controller.generate("hello", &inverted).unwrap_err();
    assert!(matches!(err, ControlError::LowContrast { ratio } if (ratio - 21.0).abs() < 1e-9));

    let greys = GenerateOptions {
        dark: HexColor::parse("#777777").unwrap(),
        light: HexColor::parse("#888888").unwrap(),
        ..opts()
    };
    assert!(matches!(
        h.controller.generate("hello", &greys),
        Err(ControlError::LowContrast { .. })
    ));

    assert_eq!(h.renderer.calls(), 0);
    assert_eq!(h.reporter.last().message, MSG_LOW_CONTRAST);
}

#[tokio::test(start_paused = true)]
async fn low_contrast_keeps_existing_code() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("keep me", &opts()).unwrap();

    let bad = GenerateOptions {
        dark: HexColor::WHITE,
        ..opts()
    };
    h.controller.generate("replace me", &bad).unwrap_err();

    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(h.controller.download_enabled());
}

#[tokio::test(start_paused = true)]
async fn text_is_trimmed_before_rendering() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("  https://example.com \n", &opts()).unwrap();
    assert_eq!(h.renderer.texts.lock().unwrap().as_slice(), ["https://example.com"]);
}

#[tokio::test(start_paused = true)]
async fn render_failure_returns_to_idle() {
    let h = harness::<CountingRenderer>(test_config());
    let err = h.controller.generate(&"x".repeat(8000), &opts()).unwrap_err();
    assert!(matches!(err, ControlError::Render(_)));
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.reporter.last().kind, StatusKind::Failed);
}

// --- Readiness ---

#[tokio::test(start_paused = true)]
async fn surface_is_ready_immediately() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();

    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(h.controller.download_enabled());
    assert_eq!(h.reporter.last().message, MSG_READY);
}

#[tokio::test(start_paused = true)]
async fn image_becomes_ready_after_decode() {
    let h = harness::<ManualRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();
    assert_eq!(h.controller.state(), ControllerState::Generating);

    let (node, signal) = ImageNode::pending("data:image/png;base64,AAAA");
    assert!(h.renderer.target(0).insert(Drawable::Image(node)));
    settle().await;
    assert_eq!(h.controller.state(), ControllerState::Generating);
    assert!(!h.controller.download_enabled());

    signal.loaded(128, 128);
    settle().await;
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(h.controller.download_enabled());
}

#[tokio::test(start_paused = true)]
async fn download_refused_while_decoding() {
    let h = harness::<ManualRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();

    let (node, _signal) = ImageNode::pending("data:image/png;base64,AAAA");
    h.renderer.target(0).insert(Drawable::Image(node));
    settle().await;

    assert!(matches!(h.controller.download(), Err(ControlError::NotReady)));
    assert_eq!(h.saver.count(), 0);
    assert_eq!(h.reporter.last().message, MSG_NOTHING_TO_DOWNLOAD);
}

#[tokio::test(start_paused = true)]
async fn readiness_gives_up_when_nothing_appears() {
    let h = harness::<ManualRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();

    // 20 attempts at 10ms
    sleep(Duration::from_millis(250)).await;
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.reporter.last().kind, StatusKind::Failed);
}

#[tokio::test(start_paused = true)]
async fn decode_failure_returns_to_idle() {
    let h = harness::<ManualRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();

    let (node, signal) = ImageNode::pending("data:image/png;base64,AAAA");
    h.renderer.target(0).insert(Drawable::Image(node));
    signal.failed("corrupt");
    settle().await;

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert!(h.reporter.last().message.contains("corrupt"));
}

#[tokio::test(start_paused = true)]
async fn superseded_generation_never_enables_download() {
    let h = harness::<ManualRenderer>(test_config());

    h.controller.generate("first", &opts()).unwrap();
    let (first_node, first_signal) = ImageNode::pending("data:image/png;base64,Rmlyc3Q=");
    assert!(h.renderer.target(0).insert(Drawable::Image(first_node)));
    settle().await;

    h.controller.generate("second", &opts()).unwrap();
    let (second_node, second_signal) = ImageNode::pending("data:image/png;base64,U2Vjb25k");
    assert!(h.renderer.target(1).insert(Drawable::Image(second_node)));

    // The first code finishes decoding late: nothing happens.
    first_signal.loaded(128, 128);
    settle().await;
    assert_eq!(h.controller.state(), ControllerState::Generating);
    assert!(matches!(h.controller.download(), Err(ControlError::NotReady)));

    second_signal.loaded(128, 128);
    settle().await;
    assert_eq!(h.controller.state(), ControllerState::Ready);

    h.controller.download().unwrap();
    assert_eq!(h.saver.last_uri(), "data:image/png;base64,U2Vjb25k");
}

#[tokio::test(start_paused = true)]
async fn late_insert_from_old_generation_is_dropped() {
    let h = harness::<ManualRenderer>(test_config());

    h.controller.generate("first", &opts()).unwrap();
    h.controller.generate("second", &opts()).unwrap();

    let img = qr_engine::render_qr(&RenderRequest::square("first", 64)).unwrap();
    assert!(!h.renderer.target(0).insert(Drawable::Surface(Arc::new(img))));
    settle().await;

    assert!(h.controller.current_drawable().is_none());
    assert_eq!(h.controller.state(), ControllerState::Generating);
}

// --- Download & cooldown ---

#[tokio::test(start_paused = true)]
async fn download_without_code_is_not_ready() {
    let h = harness::<CountingRenderer>(test_config());
    assert!(matches!(h.controller.download(), Err(ControlError::NotReady)));
    assert_eq!(h.saver.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn cooldown_blocks_then_releases_downloads() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("https://example.com", &opts()).unwrap();

    let saved = h.controller.download().unwrap();
    assert_eq!(saved.filename, "qr-code.png");
    assert_eq!(h.saver.count(), 1);
    assert!(h.saver.last_uri().starts_with("data:image/png;base64,"));
    assert_eq!(h.controller.state(), ControllerState::CoolingDown);
    assert_eq!(h.controller.download_label(), "Download (3)");
    assert!(!h.controller.download_enabled());

    assert!(matches!(
        h.controller.download(),
        Err(ControlError::CooldownActive { remaining: 3 })
    ));

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.controller.download_label(), "Download (2)");

    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.cooldown().remaining_seconds, 1);
    assert!(matches!(
        h.controller.download(),
        Err(ControlError::CooldownActive { remaining: 1 })
    ));
    assert_eq!(h.saver.count(), 1);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert_eq!(h.controller.download_label(), "Download");
    assert_eq!(h.reporter.last().message, MSG_READY_AGAIN);

    h.controller.download().unwrap();
    assert_eq!(h.saver.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn repeated_surface_downloads_are_identical() {
    let h = harness::<CountingRenderer>(ControllerConfig {
        cooldown_seconds: 0,
        ..test_config()
    });
    h.controller.generate("same input", &opts()).unwrap();

    h.controller.download().unwrap();
    let first = h.saver.last_uri();
    h.controller.download().unwrap();
    assert_eq!(h.saver.last_uri(), first);
    assert_eq!(h.controller.state(), ControllerState::Ready);
}

#[tokio::test(start_paused = true)]
async fn generate_allowed_during_cooldown() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("one", &opts()).unwrap();
    h.controller.download().unwrap();

    h.controller.generate("two", &opts()).unwrap();
    assert_eq!(h.renderer.calls(), 2);
    assert_eq!(h.controller.state(), ControllerState::CoolingDown);
    assert!(matches!(
        h.controller.download(),
        Err(ControlError::CooldownActive { .. })
    ));

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(h.controller.state(), ControllerState::Ready);
}

#[tokio::test(start_paused = true)]
async fn cooldown_ends_idle_when_display_cleared() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("one", &opts()).unwrap();
    h.controller.download().unwrap();
    h.controller.generate("", &opts()).unwrap_err();

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert!(!h.controller.download_enabled());
}

#[tokio::test(start_paused = true)]
async fn failed_save_does_not_start_cooldown() {
    let renderer: Arc<dyn Renderer> = Arc::new(SurfaceRenderer);
    let reporter = Arc::new(RecordingReporter::default());
    let controller = QrController::new(
        test_config(),
        renderer,
        Arc::new(FailingSaver),
        Arc::clone(&reporter) as Arc<dyn StatusReporter>,
    );
    controller.generate("hello", &opts()).unwrap();

    assert!(matches!(controller.download(), Err(ControlError::Save(_))));
    assert_eq!(controller.state(), ControllerState::Ready);
    assert!(!controller.cooldown().active);
    assert_eq!(reporter.last().kind, StatusKind::Failed);
}

#[tokio::test(start_paused = true)]
async fn custom_filename_is_used() {
    let h = harness::<CountingRenderer>(ControllerConfig {
        download_filename: "MKs QR Code.png".into(),
        ..test_config()
    });
    h.controller.generate("hello", &opts()).unwrap();
    assert_eq!(h.controller.download().unwrap().filename, "MKs QR Code.png");
}

// --- Debounced regeneration ---

#[tokio::test(start_paused = true)]
async fn rapid_color_changes_render_once() {
    let h = harness::<CountingRenderer>(test_config());

    for shade in ["#101010", "#202020", "#303030", "#404040"] {
        let options = GenerateOptions {
            dark: HexColor::parse(shade).unwrap(),
            ..opts()
        };
        assert!(h.controller.schedule_regenerate(InputTrigger::Color, "hello", options));
        sleep(Duration::from_millis(30)).await;
    }
    assert_eq!(h.renderer.calls(), 0);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(h.renderer.calls(), 1);
    assert_eq!(h.controller.state(), ControllerState::Ready);
}

#[tokio::test(start_paused = true)]
async fn ec_level_change_regenerates_without_delay() {
    let h = harness::<CountingRenderer>(test_config());
    let options = GenerateOptions {
        ec_level: EcLevel::L,
        ..opts()
    };
    assert!(h.controller.schedule_regenerate(InputTrigger::EcLevel, "hello", options));
    assert_eq!(h.renderer.calls(), 0);

    settle().await;
    assert_eq!(h.renderer.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn blank_text_cancels_pending_regeneration() {
    let h = harness::<CountingRenderer>(test_config());
    assert!(h.controller.schedule_regenerate(InputTrigger::Size, "hello", opts()));
    assert!(!h.controller.schedule_regenerate(InputTrigger::Size, "  ", opts()));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(h.renderer.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_background_work() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("hello", &opts()).unwrap();
    h.controller.download().unwrap();
    h.controller.schedule_regenerate(InputTrigger::Color, "hello", opts());

    h.controller.shutdown();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(h.renderer.calls(), 1);
    assert_eq!(h.controller.cooldown().remaining_seconds, 3);
}

// --- Snapshot & options ---

#[tokio::test(start_paused = true)]
async fn snapshot_reflects_state() {
    let h = harness::<CountingRenderer>(test_config());
    let before = h.controller.snapshot();
    assert_eq!(before.state, ControllerState::Idle);
    assert_eq!(before.drawable, None);
    assert!(!before.download_enabled);

    h.controller.generate("hello", &opts()).unwrap();
    let after = h.controller.snapshot();
    assert_eq!(after.state, ControllerState::Ready);
    assert_eq!(after.drawable, Some("surface"));
    assert!(after.download_enabled);
    assert_eq!(after.download_label, "Download");
    assert_eq!(after.generation, before.generation + 1);
}

#[test]
fn options_from_form_fall_back_to_defaults() {
    let defaults = GenerateOptions::default();
    let options =
        GenerateOptions::from_form(&defaults, Some("#123"), None, Some(256), Some("q")).unwrap();
    assert_eq!(options.dark, HexColor::new(0x11, 0x22, 0x33));
    assert_eq!(options.light, HexColor::WHITE);
    assert_eq!(options.size, 256);
    assert_eq!(options.ec_level, EcLevel::Q);

    let err = GenerateOptions::from_form(&defaults, None, Some("nope"), None, None).unwrap_err();
    assert!(matches!(err, ControlError::InvalidColor(_)));
    assert_eq!(err.kind(), "invalid_color");
}

// --- Real image renderer ---

#[tokio::test]
async fn image_renderer_round_trip() {
    let saver = Arc::new(MemorySaver::default());
    let controller = QrController::new(
        ControllerConfig::default(),
        Arc::new(crate::render::ImageRenderer),
        Arc::clone(&saver) as Arc<dyn Saver>,
        Arc::new(RecordingReporter::default()),
    );
    controller.generate("https://example.com", &opts()).unwrap();

    for _ in 0..200 {
        if controller.state() == ControllerState::Ready {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(controller.state(), ControllerState::Ready);
    assert_eq!(controller.current_drawable().map(|d| d.kind()), Some("image"));

    controller.download().unwrap();
    let uri = qr_engine::decode_data_uri(&saver.last_uri()).unwrap();
    assert_eq!(uri.mime, "image/png");
    assert!(image::load_from_memory(&uri.bytes).is_ok());
    controller.shutdown();
}

// --- Size bounds ---

#[tokio::test(start_paused = true)]
async fn out_of_range_size_never_reaches_renderer() {
    let h = harness::<CountingRenderer>(test_config());
    h.controller.generate("keep me", &opts()).unwrap();

    for size in [0, MIN_SIZE - 1, MAX_SIZE + 1, 70_000, u32::MAX] {
        let options = GenerateOptions { size, ..opts() };
        let err = h.controller.generate("hello", &options).unwrap_err();
        assert!(matches!(err, ControlError::InvalidSize { size: s } if s == size));
        assert_eq!(err.kind(), "invalid_size");
    }

    assert_eq!(h.renderer.calls(), 1);
    assert_eq!(h.controller.state(), ControllerState::Ready);
    assert!(h.controller.download_enabled());
    assert_eq!(h.reporter.last().kind, StatusKind::Rejected);
}

#[tokio::test(start_paused = true)]
async fn size_bounds_are_inclusive() {
    let h = harness::<CountingRenderer>(test_config());
    for size in [MIN_SIZE, MAX_SIZE] {
        let options = GenerateOptions { size, ..opts() };
        h.controller.generate("hello", &options).unwrap();
        assert_eq!(h.controller.state(), ControllerState::Ready);
    }
    assert_eq!(h.renderer.calls(), 2);
}

#[test]
fn options_from_form_rejects_out_of_range_size() {
    let defaults = GenerateOptions::default();
    for size in [0, 1_000_000] {
        let err = GenerateOptions::from_form(&defaults, None, None, Some(size), None).unwrap_err();
        assert!(matches!(err, ControlError::InvalidSize { .. }));
    }

    let smallest = GenerateOptions::from_form(&defaults, None, None, Some(MIN_SIZE), None).unwrap();
    assert_eq!(smallest.size, MIN_SIZE);
}
