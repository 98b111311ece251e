//! Scannability check for a dark / light colour pair.
//!
//! Uses WCAG relative luminance and contrast ratio, plus a polarity rule:
//! the foreground (dark module) colour must be the darker of the two,
//! since most readers expect dark-on-light symbols.

use serde::Serialize;

use crate::HexColor;
use crate::Result;

/// Minimum contrast ratio for a pair to count as scannable.
pub const MIN_CONTRAST_RATIO: f64 = 4.5;

/// Outcome of a contrast check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContrastResult {
    pub scannable: bool,
    /// Always `>= 1.0`.
    pub ratio: f64,
    pub foreground_luminance: f64,
    pub background_luminance: f64,
}

/// Decides whether a foreground / background pair will likely scan.
#[derive(Debug, Clone, Copy)]
pub struct ContrastGate {
    min_ratio: f64,
}

impl Default for ContrastGate {
    fn default() -> Self {
        Self {
            min_ratio: MIN_CONTRAST_RATIO,
        }
    }
}

impl ContrastGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_ratio(&self) -> f64 {
        self.min_ratio
    }

    /// Full check, including the measured ratio and luminances.
    pub fn check(&self, foreground: HexColor, background: HexColor) -> ContrastResult {
        let foreground_luminance = relative_luminance(foreground);
        let background_luminance = relative_luminance(background);
        let ratio = ratio_of(foreground_luminance, background_luminance);

        ContrastResult {
            scannable: ratio >= self.min_ratio && foreground_luminance < background_luminance,
            ratio,
            foreground_luminance,
            background_luminance,
        }
    }

    pub fn is_scannable(&self, foreground: HexColor, background: HexColor) -> bool {
        self.check(foreground, background).scannable
    }

    /// Same as [`check`](Self::check) but parses both colours first.
    pub fn check_hex(&self, foreground: &str, background: &str) -> Result<ContrastResult> {
        Ok(self.check(HexColor::parse(foreground)?, HexColor::parse(background)?))
    }
}

/// WCAG relative luminance in `[0, 1]`.
pub fn relative_luminance(color: HexColor) -> f64 {
    let [r, g, b] = color.channels().map(linearize);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Contrast ratio between two colours, in `[1, 21]`.
pub fn contrast_ratio(a: HexColor, b: HexColor) -> f64 {
    ratio_of(relative_luminance(a), relative_luminance(b))
}

fn linearize(c: f64) -> f64 {
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn ratio_of(l1: f64, l2: f64) -> f64 {
    let (hi, lo) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (hi + 0.05) / (lo + 0.05)
}
