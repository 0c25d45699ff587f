//! Luminance-preserving hair recolor.
//!
//! Each masked pixel is pulled toward the target color scaled by the
//! pixel's own brightness, so shading and highlights survive the recolor.

use crate::color::Rgb;
use crate::mask::HairMask;
use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Mask alpha (as a 0–1 fraction) at or below which a pixel is left untouched.
pub const ALPHA_CUTOFF: f32 = 0.1;
/// Mid-gray reference for the brightness ratio.
pub const MID_GRAY: f32 = 128.0;
/// Upper bound on blend strength; a fully opaque mask pixel still keeps 30% of the source.
pub const MAX_BLEND: f32 = 0.7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    #[error("mask is {mask_width}x{mask_height} but image is {image_width}x{image_height}")]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },
}

/// Recolor the masked region of `image` toward `target`.
///
/// Returns a new buffer. The source alpha channel is carried over as is.
pub fn apply_color(image: &RgbaImage, mask: &HairMask, target: Rgb) -> Result<RgbaImage, CompositeError> {
    let (iw, ih) = image.dimensions();
    let (mw, mh) = mask.dimensions();
    if (iw, ih) != (mw, mh) {
        return Err(CompositeError::DimensionMismatch {
            image_width: iw,
            image_height: ih,
            mask_width: mw,
            mask_height: mh,
        });
    }

    let mut out = image.clone();
    let mut touched = 0usize;
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let alpha = mask.alpha_at(x, y) as f32 / 255.0;
        if alpha <= ALPHA_CUTOFF {
            continue;
        }
        *pixel = blend_pixel(*pixel, alpha, target);
        touched += 1;
    }

    tracing::debug!(target_color = %target, pixels = touched, "applied hair color");
    Ok(out)
}

fn blend_pixel(src: Rgba<u8>, alpha: f32, target: Rgb) -> Rgba<u8> {
    let [r, g, b, a] = src.0;
    let luminance = (r as f32 + g as f32 + b as f32) / 3.0;
    let ratio = luminance / MID_GRAY;
    let strength = alpha * MAX_BLEND;

    let channel = |source: u8, target: u8| -> u8 {
        let candidate = (target as f32 * ratio).min(255.0);
        let mixed = source as f32 * (1.0 - strength) + candidate * strength;
        mixed.round().clamp(0.0, 255.0) as u8
    };

    Rgba([channel(r, target.r), channel(g, target.g), channel(b, target.b), a])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 37 % 256) as u8, (y * 53 % 256) as u8, ((x + y) * 11 % 256) as u8, 200])
        })
    }

    #[test]
    fn test_empty_mask_leaves_image_identical() {
        let img = gradient(32, 24);
        let out = apply_color(&img, &HairMask::new(32, 24), Rgb::new(255, 0, 0)).unwrap();
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_low_alpha_pixels_untouched() {
        let img = gradient(16, 16);
        let mut mask = HairMask::new(16, 16);
        // 25/255 ≈ 0.098, below the cutoff
        for y in 0..16 {
            for x in 0..8 {
                mask.set_alpha(x, y, 25);
            }
            for x in 8..16 {
                mask.set_alpha(x, y, 255);
            }
        }
        let out = apply_color(&img, &mask, Rgb::new(10, 200, 30)).unwrap();
        for y in 0..16 {
            for x in 0..8 {
                assert_eq!(out.get_pixel(x, y), img.get_pixel(x, y), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_full_alpha_blend_value() {
        // L = 128 → ratio 1, candidate = target; strength 0.7
        let img = RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
        let mut mask = HairMask::new(1, 1);
        mask.set_alpha(0, 0, 255);
        let out = apply_color(&img, &mask, Rgb::new(228, 28, 128)).unwrap();
        // 128·0.3 + 228·0.7 = 198, 128·0.3 + 28·0.7 = 58
        assert_eq!(out.get_pixel(0, 0).0, [198, 58, 128, 255]);
    }

    #[test]
    fn test_channels_bounded_at_extremes() {
        let img = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgba([255, 255, 255, 255]) } else { Rgba([0, 0, 0, 255]) }
        });
        let mut mask = HairMask::new(2, 1);
        mask.set_alpha(0, 0, 255);
        mask.set_alpha(1, 0, 255);
        let out = apply_color(&img, &mask, Rgb::new(255, 255, 255)).unwrap();
        // White: ratio ≈ 1.99, candidate clamps to 255.
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
        // Black: ratio 0, candidate 0.
        assert_eq!(out.get_pixel(1, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_blend_stays_between_source_and_scaled_target() {
        let steps: Vec<u8> = (0..=5).map(|i| i * 51).collect();
        let mut sources = Vec::new();
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    sources.push([r, g, b]);
                }
            }
        }
        let img = RgbaImage::from_fn(sources.len() as u32, 1, |x, _| {
            let [r, g, b] = sources[x as usize];
            Rgba([r, g, b, 255])
        });

        for alpha in [128u8, 255] {
            let mut mask = HairMask::new(img.width(), 1);
            for x in 0..img.width() {
                mask.set_alpha(x, 0, alpha);
            }
            for target in &sources {
                let out = apply_color(&img, &mask, Rgb::new(target[0], target[1], target[2])).unwrap();
                for (x, src) in sources.iter().enumerate() {
                    let ratio = src.iter().map(|&c| c as f32).sum::<f32>() / 3.0 / MID_GRAY;
                    let px = out.get_pixel(x as u32, 0).0;
                    for c in 0..3 {
                        let candidate = (target[c] as f32 * ratio).min(255.0);
                        let lo = (src[c] as f32).min(candidate).floor();
                        let hi = (src[c] as f32).max(candidate).ceil();
                        let v = px[c] as f32;
                        assert!(
                            v >= lo && v <= hi,
                            "src {src:?} target {target:?} alpha {alpha}: channel {c} = {v} outside [{lo}, {hi}]"
                        );
                    }
                    assert_eq!(px[3], 255);
                }
            }
        }
    }

    #[test]
    fn test_source_alpha_preserved() {
        let img = gradient(4, 4);
        let mut mask = HairMask::new(4, 4);
        mask.set_alpha(1, 1, 255);
        let out = apply_color(&img, &mask, Rgb::new(90, 60, 30)).unwrap();
        assert!(out.pixels().all(|p| p[3] == 200));
        assert_ne!(out.get_pixel(1, 1), img.get_pixel(1, 1));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = apply_color(&gradient(4, 4), &HairMask::new(4, 5), Rgb::new(0, 0, 0)).unwrap_err();
        assert!(matches!(err, CompositeError::DimensionMismatch { mask_height: 5, .. }));
    }
}
