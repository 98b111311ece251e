//! Waiting for the renderer's output to become exportable.

use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::render::{DecodeState, DisplayContainer, Drawable};

/// Bounds for readiness detection.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub poll_interval: Duration,
    pub poll_attempts: u32,
    pub decode_timeout: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            poll_attempts: 40,
            decode_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadinessError {
    #[error("Renderer produced no output after {0} checks")]
    NoDrawable(u32),

    #[error("Image did not finish decoding within {0:?}")]
    DecodeTimeout(Duration),

    #[error("Image failed to decode: {0}")]
    DecodeFailed(String),
}

/// Call `check` until it yields a value, at most `attempts` times.
pub async fn poll_until<T, F>(interval: Duration, attempts: u32, mut check: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(value) = check() {
            return Some(value);
        }
        if attempt < attempts {
            sleep(interval).await;
        }
    }
    None
}

/// Wait for `generation`'s drawable to appear and, for images, to decode.
pub async fn wait_until_ready(
    display: &DisplayContainer,
    generation: u64,
    config: &ReadinessConfig,
) -> Result<Drawable, ReadinessError> {
    let drawable = poll_until(config.poll_interval, config.poll_attempts, || {
        display.current_for(generation)
    })
    .await
    .ok_or(ReadinessError::NoDrawable(config.poll_attempts.max(1)))?;

    let Drawable::Image(node) = &drawable else {
        return Ok(drawable);
    };

    match timeout(config.decode_timeout, node.decoded()).await {
        Ok(DecodeState::Loaded { .. }) => Ok(drawable),
        Ok(DecodeState::Failed(reason)) => Err(ReadinessError::DecodeFailed(reason)),
        Ok(DecodeState::Pending) => {
            Err(ReadinessError::DecodeFailed("decode never settled".into()))
        }
        Err(_) => Err(ReadinessError::DecodeTimeout(config.decode_timeout)),
    }
}
