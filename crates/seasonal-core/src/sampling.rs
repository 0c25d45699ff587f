//! Sample hair, eye, skin and lip colors from a portrait.
//!
//! Sampling radii scale with the face so that small and large portraits
//! average over comparable facial areas.

use crate::classifier::ColorSample;
use crate::color::Rgb;
use crate::landmarks::{
    FaceGeometry, FaceLandmarks, InvalidLandmarksError, LEFT_IRIS, LIP_CENTER, NOSE_TIP, RIGHT_IRIS,
};
use image::RgbaImage;

// Base radius ≈ 1.5% of face size, clamped to [2, 15] px.
const BASE_RADIUS_FRACTION: f32 = 0.015;
const BASE_RADIUS_MIN: f32 = 2.0;
const BASE_RADIUS_MAX: f32 = 15.0;

// Per-feature radius multipliers.
const SKIN_RADIUS_SCALE: f32 = 1.5;
const EYE_RADIUS_SCALE: f32 = 0.5;
const HAIR_RADIUS_SCALE: f32 = 2.0;

/// Hair is sampled this fraction of the face height above the forehead.
const HAIR_OFFSET_FRACTION: f32 = 0.25;
/// Keep the hair sample away from the top edge.
const HAIR_MIN_Y: f32 = 5.0;

/// Pixel positions and radii used for one [`ColorSample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoints {
    pub skin: (f32, f32, u32),
    pub left_eye: (f32, f32, u32),
    pub right_eye: (f32, f32, u32),
    pub lip: (f32, f32, u32),
    pub hair: (f32, f32, u32),
}

/// Average color of the in-bounds pixels in `[x−r, x+r) × [y−r, y+r)`.
///
/// Returns `None` if the square lies entirely outside the image.
pub fn average_color(image: &RgbaImage, x: f32, y: f32, radius: u32) -> Option<Rgb> {
    let (w, h) = image.dimensions();
    let r = radius.max(1) as i64;
    let cx = x.round() as i64;
    let cy = y.round() as i64;

    let x0 = (cx - r).max(0);
    let y0 = (cy - r).max(0);
    let x1 = (cx + r).min(w as i64);
    let y1 = (cy + r).min(h as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let (mut sr, mut sg, mut sb, mut n) = (0u64, 0u64, 0u64, 0u64);
    for py in y0..y1 {
        for px in x0..x1 {
            let p = image.get_pixel(px as u32, py as u32);
            sr += p[0] as u64;
            sg += p[1] as u64;
            sb += p[2] as u64;
            n += 1;
        }
    }

    let avg = |sum: u64| ((sum as f64 / n as f64).round() as u64).min(255) as u8;
    Some(Rgb::new(avg(sr), avg(sg), avg(sb)))
}

/// Compute where each feature is sampled.
pub fn sample_points(
    landmarks: &FaceLandmarks,
    width: u32,
    height: u32,
) -> Result<SamplePoints, InvalidLandmarksError> {
    let geometry = FaceGeometry::from_landmarks(landmarks, width, height)?;
    let base = (geometry.face_size() * BASE_RADIUS_FRACTION)
        .round()
        .clamp(BASE_RADIUS_MIN, BASE_RADIUS_MAX);

    let at = |index: usize, radius: f32| -> Result<(f32, f32, u32), InvalidLandmarksError> {
        let (x, y) = landmarks.require(index)?.to_pixel(width, height);
        Ok((x, y, radius.round().max(1.0) as u32))
    };

    let hair_x = geometry.forehead.0;
    let hair_y = (geometry.forehead.1 - geometry.face_height * HAIR_OFFSET_FRACTION).max(HAIR_MIN_Y);

    Ok(SamplePoints {
        skin: at(NOSE_TIP, base * SKIN_RADIUS_SCALE)?,
        left_eye: at(LEFT_IRIS, base * EYE_RADIUS_SCALE)?,
        right_eye: at(RIGHT_IRIS, base * EYE_RADIUS_SCALE)?,
        lip: at(LIP_CENTER, base)?,
        hair: (hair_x, hair_y, (base * HAIR_RADIUS_SCALE).round() as u32),
    })
}

/// Sample the four classifier colors from an image.
pub fn sample_colors(
    image: &RgbaImage,
    landmarks: &FaceLandmarks,
) -> Result<ColorSample, InvalidLandmarksError> {
    let (w, h) = image.dimensions();
    let points = sample_points(landmarks, w, h)?;

    let take = |(x, y, r): (f32, f32, u32)| average_color(image, x, y, r).unwrap_or(Rgb::new(0, 0, 0));

    let left = take(points.left_eye);
    let right = take(points.right_eye);
    let mean = |a: u8, b: u8| ((a as u16 + b as u16 + 1) / 2) as u8;
    let eye = Rgb::new(mean(left.r, right.r), mean(left.g, right.g), mean(left.b, right.b));

    let sample = ColorSample {
        hair: take(points.hair),
        eye,
        skin: take(points.skin),
        lip: take(points.lip),
    };

    tracing::debug!(
        hair = %sample.hair,
        eye = %sample.eye,
        skin = %sample.skin,
        lip = %sample.lip,
        "sampled facial colors"
    );

    Ok(sample)
}
