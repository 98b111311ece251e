//! Placing a rendered symbol onto a canvas of an exact size.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Fit `symbol` onto a `width x height` canvas filled with `background`.
///
/// A symbol that already fits is centred without resampling. A larger one is
/// downscaled with nearest-neighbour filtering, preserving aspect ratio, so
/// module edges stay hard.
pub fn fit_to_canvas(
    symbol: &RgbaImage,
    width: u32,
    height: u32,
    background: Rgba<u8>,
) -> RgbaImage {
    let (orig_w, orig_h) = symbol.dimensions();

    if orig_w == width && orig_h == height {
        debug!(width, height, "Symbol already at canvas size, skipping fit");
        return symbol.clone();
    }

    let mut canvas = RgbaImage::from_pixel(width, height, background);

    let placed = if orig_w > width || orig_h > height {
        let ratio = f64::min(
            f64::from(width) / f64::from(orig_w),
            f64::from(height) / f64::from(orig_h),
        );
        let new_w = ((f64::from(orig_w) * ratio).round() as u32).clamp(1, width);
        let new_h = ((f64::from(orig_h) * ratio).round() as u32).clamp(1, height);

        debug!(orig_w, orig_h, new_w, new_h, "Downscaling symbol to fit canvas");
        imageops::resize(symbol, new_w, new_h, FilterType::Nearest)
    } else {
        symbol.clone()
    };

    let x = (width - placed.width()) / 2;
    let y = (height - placed.height()) / 2;
    imageops::replace(&mut canvas, &placed, i64::from(x), i64::from(y));

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, BLACK)
    }

    #[test]
    fn same_size_is_returned_unchanged() {
        let result = fit_to_canvas(&solid(100, 100), 100, 100, WHITE);
        assert_eq!(result.dimensions(), (100, 100));
        assert!(result.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn smaller_symbol_is_centred() {
        let result = fit_to_canvas(&solid(10, 10), 20, 20, WHITE);
        assert_eq!(result.dimensions(), (20, 20));
        assert_eq!(*result.get_pixel(0, 0), WHITE);
        assert_eq!(*result.get_pixel(4, 4), WHITE);
        assert_eq!(*result.get_pixel(5, 5), BLACK);
        assert_eq!(*result.get_pixel(14, 14), BLACK);
        assert_eq!(*result.get_pixel(15, 15), WHITE);
    }

    #[test]
    fn larger_symbol_is_downscaled() {
        let result = fit_to_canvas(&solid(40, 40), 10, 10, WHITE);
        assert_eq!(result.dimensions(), (10, 10));
        assert!(result.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn downscale_preserves_aspect_on_wide_canvas() {
        let result = fit_to_canvas(&solid(40, 40), 30, 10, WHITE);
        assert_eq!(result.dimensions(), (30, 10));
        // 10x10 symbol centred horizontally
        assert_eq!(*result.get_pixel(0, 5), WHITE);
        assert_eq!(*result.get_pixel(15, 5), BLACK);
    }

    #[test]
    fn fit_never_produces_empty_symbol() {
        let result = fit_to_canvas(&solid(1000, 1), 10, 10, WHITE);
        assert_eq!(result.dimensions(), (10, 10));
        assert!(result.pixels().any(|p| *p == BLACK));
    }
}
