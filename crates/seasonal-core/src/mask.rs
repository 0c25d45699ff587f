//! Hair region estimation.
//!
//! Two estimators share one entry point, [`estimate_hair_mask`]:
//!
//! - **Geometric**: an ellipse over the crown, with everything below a
//!   Bézier hairline carved away.
//! - **Color+geometry**: pixels inside the same bounding region whose HSL
//!   is close to the sampled hair color, weighted by a radial falloff.
//!
//! Neither is real segmentation; both are cheap approximations driven by
//! face-mesh landmarks.

use crate::color::{hue_distance, rgb_to_hsl, Hsl, Rgb};
use crate::config::{MaskConfig, MaskStrategy, RegionBounds, SimilarityThresholds};
use crate::landmarks::{FaceGeometry, FaceLandmarks, InvalidLandmarksError};
use crate::morphology;
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Segments used to flatten the hairline curve.
const BEZIER_SEGMENTS: usize = 32;

/// Per-pixel hair confidence, 0–255, same size as the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HairMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl HairMask {
    /// An empty (all-zero) mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, alpha: vec![0; width as usize * height as usize] }
    }

    /// Wrap an alpha plane. Returns `None` if the length does not match.
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Option<Self> {
        (alpha.len() == width as usize * height as usize).then_some(Self { width, height, alpha })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn alpha(&self) -> &[u8] {
        &self.alpha
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha[y as usize * self.width as usize + x as usize]
    }

    pub fn set_alpha(&mut self, x: u32, y: u32, value: u8) {
        let w = self.width as usize;
        self.alpha[y as usize * w + x as usize] = value;
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.alpha.iter().filter(|&&a| a > 0).count()
    }

    /// Alpha plane as a grayscale image, for inspection.
    pub fn to_luma_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| Luma([self.alpha_at(x, y)]))
    }

    /// White RGB with the mask as alpha.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| Rgba([255, 255, 255, self.alpha_at(x, y)]))
    }
}

/// Axis-aligned hair bounding region in pixels, clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HairRegion {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl HairRegion {
    pub fn new(geometry: &FaceGeometry, bounds: RegionBounds, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let forehead_y = geometry.forehead.1;
        Self {
            left: (geometry.left_temple.0 - geometry.face_width * bounds.beyond_temples).max(0.0),
            right: (geometry.right_temple.0 + geometry.face_width * bounds.beyond_temples).min(w),
            top: (forehead_y - geometry.face_height * bounds.above_forehead).max(0.0),
            bottom: (forehead_y + geometry.face_height * bounds.below_forehead).min(h),
        }
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    /// Integer pixel span covered by the region, clipped to the image.
    fn pixel_span(&self, width: u32, height: u32) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
        let xs = self.left.max(0.0).ceil() as u32..((self.right.floor() as i64 + 1).clamp(0, width as i64) as u32);
        let ys = self.top.max(0.0).ceil() as u32..((self.bottom.floor() as i64 + 1).clamp(0, height as i64) as u32);
        (xs, ys)
    }
}

/// Estimate the hair mask for `image`, smoothing it if configured.
/// Only the color+geometry mask is smoothed.
///
/// Fails on degenerate landmark geometry instead of producing a NaN- or
/// zero-bounded mask.
pub fn estimate_hair_mask(
    image: &RgbaImage,
    landmarks: &FaceLandmarks,
    reference_hair: Rgb,
    config: &MaskConfig,
) -> Result<HairMask, InvalidLandmarksError> {
    let (width, height) = image.dimensions();
    let geometry = FaceGeometry::from_landmarks(landmarks, width, height)?;
    let region = HairRegion::new(&geometry, config.region_bounds(), width, height);

    let raw = match config.strategy {
        MaskStrategy::Geometric => geometric_mask(&geometry, &region, width, height, config),
        MaskStrategy::ColorGeometry => color_mask(image, &geometry, &region, reference_hair, &config.thresholds),
    };

    let mask = if config.smooths() {
        morphology::dilate_iterations(&raw, config.smoothing.radius, config.smoothing.iterations)
    } else {
        raw
    };

    tracing::debug!(
        strategy = ?config.strategy,
        region = ?region,
        coverage = mask.coverage(),
        "hair mask estimated"
    );

    Ok(mask)
}

/// Ellipse inscribed in the region, minus the area under the hairline.
fn geometric_mask(
    geometry: &FaceGeometry,
    region: &HairRegion,
    width: u32,
    height: u32,
    config: &MaskConfig,
) -> HairMask {
    let mut mask = HairMask::new(width, height);

    let (cx, cy) = region.center();
    let rx = (region.right - region.left) / 2.0;
    let ry = (region.bottom - region.top) / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return mask;
    }

    let carve = hairline_polygon(geometry, region, height, config);

    for y in 0..height {
        let py = y as f32 + 0.5;
        let dy = (py - cy) / ry;
        if dy.abs() > 1.0 {
            continue;
        }
        for x in 0..width {
            let px = x as f32 + 0.5;
            let dx = (px - cx) / rx;
            if dx * dx + dy * dy <= 1.0 && !point_in_polygon(px, py, &carve) {
                mask.set_alpha(x, y, 255);
            }
        }
    }

    mask
}

/// Closed outline following the forehead hairline down to the image bottom.
fn hairline_polygon(
    geometry: &FaceGeometry,
    region: &HairRegion,
    height: u32,
    config: &MaskConfig,
) -> Vec<(f32, f32)> {
    let side = geometry.face_width * config.region_bounds().beyond_temples;
    let lift = config.hairline_lift_px;

    let start = (geometry.left_temple.0 - side, region.bottom);
    let c1 = (geometry.left_forehead.0, geometry.left_forehead.1 - lift);
    let c2 = (geometry.right_forehead.0, geometry.right_forehead.1 - lift);
    let end = (geometry.right_temple.0 + side, region.bottom);

    let mut polygon = Vec::with_capacity(BEZIER_SEGMENTS + 3);
    for i in 0..=BEZIER_SEGMENTS {
        let t = i as f32 / BEZIER_SEGMENTS as f32;
        polygon.push(cubic_bezier(start, c1, c2, end, t));
    }
    polygon.push((end.0, height as f32));
    polygon.push((region.left, height as f32));
    polygon
}

fn cubic_bezier(p0: (f32, f32), p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), t: f32) -> (f32, f32) {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

/// Even-odd point-in-polygon test.
fn point_in_polygon(x: f32, y: f32, polygon: &[(f32, f32)]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for i in 0..polygon.len() {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Pixels in the region resembling the reference hair color, with alpha
/// decaying away from the region center.
fn color_mask(
    image: &RgbaImage,
    geometry: &FaceGeometry,
    region: &HairRegion,
    reference_hair: Rgb,
    thresholds: &SimilarityThresholds,
) -> HairMask {
    let (width, height) = image.dimensions();
    let mut mask = HairMask::new(width, height);

    let reference = rgb_to_hsl(reference_hair);
    let (cx, cy) = region.center();
    let falloff = ((geometry.face_width / 2.0).powi(2) + geometry.face_height.powi(2)).sqrt();

    let (xs, ys) = region.pixel_span(width, height);
    for y in ys {
        for x in xs.clone() {
            let p = image.get_pixel(x, y);
            let hsl = rgb_to_hsl(Rgb::new(p[0], p[1], p[2]));
            if !is_hair_like(&hsl, &reference, thresholds) {
                continue;
            }
            let dist = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let strength = (1.0 - dist / falloff).max(0.0);
            mask.set_alpha(x, y, (strength * 255.0).round() as u8);
        }
    }

    mask
}

fn is_hair_like(pixel: &Hsl, reference: &Hsl, t: &SimilarityThresholds) -> bool {
    let hue_diff = if t.circular_hue {
        hue_distance(pixel.h, reference.h)
    } else {
        (pixel.h - reference.h).abs()
    };
    let similar = hue_diff < t.hue
        && (pixel.s - reference.s).abs() < t.saturation
        && (pixel.l - reference.l).abs() < t.lightness;
    similar && pixel.l < t.max_lightness
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{synthetic_face, LandmarkPoint};

    const HAIR: Rgba<u8> = Rgba([50, 35, 25, 255]);
    const SKIN: Rgba<u8> = Rgba([225, 180, 150, 255]);
    const WALL: Rgba<u8> = Rgba([240, 240, 245, 255]);

    /// 200×200 portrait of the synthetic face: hair cap above y = 85
    /// spanning the head, skin face below, pale background elsewhere.
    fn portrait() -> RgbaImage {
        RgbaImage::from_fn(200, 200, |x, y| {
            let head = (40..160).contains(&x);
            if head && y < 85 && y >= 10 {
                HAIR
            } else if (70..130).contains(&x) && y >= 85 && y < 165 {
                SKIN
            } else {
                WALL
            }
        })
    }

    fn unsmoothed() -> MaskConfig {
        let mut c = MaskConfig::default();
        c.smoothing.enabled = false;
        c
    }

    #[test]
    fn test_region_is_clamped() {
        let g = FaceGeometry::from_landmarks(&synthetic_face(), 200, 200).unwrap();
        let r = HairRegion::new(&g, RegionBounds::PRECISE, 200, 200);
        // forehead y 80, face height 80 → top 0 (clamped), bottom 88
        assert_eq!(r.top, 0.0);
        assert!((r.bottom - 88.0).abs() < 1e-3);
        // temples 70 / 130, face width 60 → 46 / 154
        assert!((r.left - 46.0).abs() < 1e-3);
        assert!((r.right - 154.0).abs() < 1e-3);
        assert_eq!(r.center(), (100.0, 44.0));
    }

    #[test]
    fn test_color_mask_selects_hair_only() {
        let img = portrait();
        let mask = estimate_hair_mask(&img, &synthetic_face(), Rgb::new(50, 35, 25), &unsmoothed()).unwrap();
        assert!(mask.coverage() > 0);
        for y in 0..200 {
            for x in 0..200 {
                if mask.alpha_at(x, y) > 0 {
                    assert_eq!(*img.get_pixel(x, y), HAIR, "non-hair pixel ({x},{y}) masked");
                }
            }
        }
        // Skin and the pale wall are excluded.
        assert_eq!(mask.alpha_at(100, 120), 0);
        assert_eq!(mask.alpha_at(5, 5), 0);
    }

    #[test]
    fn test_color_mask_radial_falloff() {
        let img = RgbaImage::from_pixel(200, 200, HAIR);
        let mask = estimate_hair_mask(&img, &synthetic_face(), Rgb::new(50, 35, 25), &unsmoothed()).unwrap();
        // Region center is (100, 44); confidence decays with distance.
        let center = mask.alpha_at(100, 44);
        let edge = mask.alpha_at(47, 1);
        assert!(center > 250, "center = {center}");
        assert!(edge < center, "edge {edge} >= center {center}");
        // Outside the region nothing is selected.
        assert_eq!(mask.alpha_at(100, 150), 0);
        assert_eq!(mask.alpha_at(10, 40), 0);
    }

    #[test]
    fn test_color_mask_rejects_bright_pixels() {
        // Pale pixels matching a pale reference are still rejected (l ≥ 70).
        let img = RgbaImage::from_pixel(200, 200, WALL);
        let mask = estimate_hair_mask(&img, &synthetic_face(), Rgb::new(240, 240, 245), &unsmoothed()).unwrap();
        assert_eq!(mask.coverage(), 0);
    }

    #[test]
    fn test_looser_thresholds_never_shrink_mask() {
        let img = RgbaImage::from_fn(200, 200, |x, y| {
            // Gradient of browns and grays
            Rgba([(x % 120) as u8 + 20, (y % 90) as u8 + 15, ((x + y) % 70) as u8 + 10, 255])
        });
        let reference = Rgb::new(70, 50, 40);
        let mut tight = unsmoothed();
        tight.thresholds = SimilarityThresholds { hue: 15.0, saturation: 15.0, lightness: 10.0, max_lightness: 70.0, circular_hue: false };
        let mut loose = tight;
        loose.thresholds.hue = 45.0;
        loose.thresholds.saturation = 50.0;
        loose.thresholds.lightness = 35.0;

        for smoothing in [false, true] {
            tight.smoothing.enabled = smoothing;
            loose.smoothing.enabled = smoothing;
            let a = estimate_hair_mask(&img, &synthetic_face(), reference, &tight).unwrap();
            let b = estimate_hair_mask(&img, &synthetic_face(), reference, &loose).unwrap();
            assert!(a.coverage() > 0);
            for (i, (&ta, &lb)) in a.alpha().iter().zip(b.alpha()).enumerate() {
                assert!(ta == 0 || lb > 0, "pixel {i} dropped when loosening thresholds");
            }
            assert!(b.coverage() >= a.coverage());
        }
    }

    #[test]
    fn test_geometric_mask_covers_crown_not_face() {
        let img = portrait();
        let mask = estimate_hair_mask(&img, &synthetic_face(), Rgb::new(0, 0, 0), &MaskConfig::geometric()).unwrap();
        // Crown above the forehead lift is inside the ellipse.
        assert_eq!(mask.alpha_at(100, 40), 255);
        // Below the hairline is carved away.
        assert_eq!(mask.alpha_at(100, 82), 0);
        // Face and outside-region pixels untouched.
        assert_eq!(mask.alpha_at(100, 130), 0);
        assert_eq!(mask.alpha_at(5, 40), 0);
        // Binary mask.
        assert!(mask.alpha().iter().all(|&a| a == 0 || a == 255));
    }

    #[test]
    fn test_geometric_strategy_from_toml_matches_preset() {
        let img = portrait();
        let from_toml = crate::config::PipelineConfig::from_toml_str("[mask]\nstrategy = \"geometric\"\n").unwrap();
        let a = estimate_hair_mask(&img, &synthetic_face(), Rgb::new(0, 0, 0), &from_toml.mask).unwrap();
        let b = estimate_hair_mask(&img, &synthetic_face(), Rgb::new(0, 0, 0), &MaskConfig::geometric()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.alpha_at(100, 82), 0);
    }

    #[test]
    fn test_hue_difference_does_not_wrap_by_default() {
        // Red-brown at ~5° against magenta-red at ~355°.
        let reference = rgb_to_hsl(Rgb::new(90, 40, 35));
        let pixel = rgb_to_hsl(Rgb::new(90, 35, 40));
        assert!(reference.h < 10.0 && pixel.h > 350.0);

        let linear = SimilarityThresholds::default();
        assert!(!is_hair_like(&pixel, &reference, &linear));

        let circular = SimilarityThresholds { circular_hue: true, ..linear };
        assert!(is_hair_like(&pixel, &reference, &circular));
    }

    #[test]
    fn test_invalid_landmarks_error() {
        let img = portrait();
        let collapsed = FaceLandmarks::new(vec![LandmarkPoint::new(0.5, 0.5); 478]);
        for config in [MaskConfig::default(), MaskConfig::geometric()] {
            let err = estimate_hair_mask(&img, &collapsed, Rgb::new(50, 35, 25), &config).unwrap_err();
            assert!(matches!(err, InvalidLandmarksError::DegenerateFace { .. }));
        }
    }

    #[test]
    fn test_point_in_polygon_square() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(point_in_polygon(5.0, 5.0, &square));
        assert!(!point_in_polygon(15.0, 5.0, &square));
        assert!(!point_in_polygon(5.0, -1.0, &square));
    }

    #[test]
    fn test_bezier_endpoints() {
        let p = cubic_bezier((0.0, 0.0), (1.0, 5.0), (2.0, 5.0), (3.0, 0.0), 0.0);
        assert_eq!(p, (0.0, 0.0));
        let p = cubic_bezier((0.0, 0.0), (1.0, 5.0), (2.0, 5.0), (3.0, 0.0), 1.0);
        assert!((p.0 - 3.0).abs() < 1e-5 && p.1.abs() < 1e-5);
    }

    #[test]
    fn test_mask_from_alpha_length_check() {
        assert!(HairMask::from_alpha(2, 2, vec![0; 4]).is_some());
        assert!(HairMask::from_alpha(2, 2, vec![0; 3]).is_none());
    }
}
