//! User-facing status line with WebSocket-style broadcast.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// What kind of message the status region is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Ready,
    /// Input was refused by validation (empty text, low contrast, ...).
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
        }
    }

    pub fn ready(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Ready,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Rejected,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Failed,
            message: message.into(),
        }
    }
}

/// Sink for status messages emitted by the controller.
pub trait StatusReporter: Send + Sync {
    fn report(&self, status: Status);
}

/// How rejected input is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPresentation {
    /// Shown in the status line like any other message.
    #[default]
    Inline,
    /// Flagged for a blocking alert.
    Alert,
}

impl StatusPresentation {
    pub fn from_str_setting(value: &str) -> Self {
        match value {
            "alert" => StatusPresentation::Alert,
            _ => StatusPresentation::Inline,
        }
    }
}

/// A status as presented to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    #[serde(flatten)]
    pub status: Status,
    pub alert: bool,
}

struct BoardInner {
    presentation: StatusPresentation,
    current: RwLock<StatusView>,
    tx: broadcast::Sender<String>,
}

/// Keeps the latest status and broadcasts every change as JSON.
#[derive(Clone)]
pub struct StatusBoard {
    inner: Arc<BoardInner>,
}

impl StatusBoard {
    pub fn new(presentation: StatusPresentation) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(BoardInner {
                presentation,
                current: RwLock::new(StatusView {
                    status: Status::info("Enter a URL and click Generate to start."),
                    alert: false,
                }),
                tx,
            }),
        }
    }

    pub fn presentation(&self) -> StatusPresentation {
        self.inner.presentation
    }

    pub fn current(&self) -> StatusView {
        match self.inner.current.read() {
            Ok(view) => view.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.tx.subscribe()
    }
}

impl StatusReporter for StatusBoard {
    fn report(&self, status: Status) {
        let alert = status.kind == StatusKind::Rejected
            && self.inner.presentation == StatusPresentation::Alert;
        match status.kind {
            StatusKind::Rejected | StatusKind::Failed => {
                tracing::warn!(kind = ?status.kind, alert, "{}", status.message)
            }
            _ => tracing::debug!(kind = ?status.kind, "{}", status.message),
        }

        let view = StatusView { status, alert };
        let msg = serde_json::json!({ "type": "status", "data": &view });
        match self.inner.current.write() {
            Ok(mut current) => *current = view,
            Err(poisoned) => *poisoned.into_inner() = view,
        }
        // No subscribers is fine.
        let _ = self.inner.tx.send(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_welcome_message() {
        let board = StatusBoard::new(StatusPresentation::Inline);
        let view = board.current();
        assert_eq!(view.status.kind, StatusKind::Info);
        assert!(!view.alert);
    }

    #[test]
    fn inline_presentation_never_alerts() {
        let board = StatusBoard::new(StatusPresentation::Inline);
        board.report(Status::rejected("Enter a URL then click Generate."));
        let view = board.current();
        assert_eq!(view.status.message, "Enter a URL then click Generate.");
        assert!(!view.alert);
    }

    #[test]
    fn alert_presentation_flags_rejections_only() {
        let board = StatusBoard::new(StatusPresentation::Alert);
        board.report(Status::rejected("Colors too similar."));
        assert!(board.current().alert);

        board.report(Status::ready("QR ready. You can download it."));
        assert!(!board.current().alert);

        board.report(Status::failed("boom"));
        assert!(!board.current().alert);
    }

    #[test]
    fn report_broadcasts_json() {
        let board = StatusBoard::new(StatusPresentation::Inline);
        let mut rx = board.subscribe();
        board.report(Status::info("Generating…"));

        let msg: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(msg["type"], "status");
        assert_eq!(msg["data"]["kind"], "info");
        assert_eq!(msg["data"]["message"], "Generating…");
        assert_eq!(msg["data"]["alert"], false);
    }

    #[test]
    fn presentation_setting_parsing() {
        assert_eq!(StatusPresentation::from_str_setting("alert"), StatusPresentation::Alert);
        assert_eq!(StatusPresentation::from_str_setting("whatever"), StatusPresentation::Inline);
    }
}
