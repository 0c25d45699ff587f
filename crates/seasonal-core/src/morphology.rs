//! Grayscale dilation of a mask's alpha plane.
//!
//! Closes pinholes and softens the jagged boundary left by the per-pixel
//! color test. The square max filter is applied separably (rows, then
//! columns), which is equivalent to the full (2k+1)² window.

use crate::mask::HairMask;

pub const DEFAULT_ITERATIONS: u32 = 3;
pub const DEFAULT_RADIUS: u32 = 3;

/// Three passes of a 7×7 max filter.
pub fn smooth(mask: &HairMask) -> HairMask {
    dilate_iterations(mask, DEFAULT_RADIUS, DEFAULT_ITERATIONS)
}

/// Repeated [`dilate`]. Zero iterations returns a copy.
pub fn dilate_iterations(mask: &HairMask, radius: u32, iterations: u32) -> HairMask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, radius);
    }
    out
}

/// One max-filter pass over a (2·radius+1)² window, clipped at the border.
pub fn dilate(mask: &HairMask, radius: u32) -> HairMask {
    let (w, h) = mask.dimensions();
    let (w, h) = (w as usize, h as usize);
    if radius == 0 || w == 0 || h == 0 {
        return mask.clone();
    }
    let r = radius as usize;
    let src = mask.alpha();

    let mut horizontal = vec![0u8; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(r);
            let hi = (x + r).min(w - 1);
            horizontal[y * w + x] = row[lo..=hi].iter().copied().max().unwrap_or(0);
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let lo = y.saturating_sub(r);
        let hi = (y + r).min(h - 1);
        for x in 0..w {
            out[y * w + x] = (lo..=hi).map(|yy| horizontal[yy * w + x]).max().unwrap_or(0);
        }
    }

    // Dimensions are unchanged, so the length always matches.
    HairMask::from_alpha(w as u32, h as u32, out).unwrap_or_else(|| mask.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_dot(w: u32, h: u32, x: u32, y: u32, value: u8) -> HairMask {
        let mut m = HairMask::new(w, h);
        m.set_alpha(x, y, value);
        m
    }

    #[test]
    fn test_dilate_grows_square() {
        let m = dilate(&single_dot(21, 21, 10, 10, 200), 3);
        assert_eq!(m.coverage(), 49);
        assert_eq!(m.alpha_at(7, 7), 200);
        assert_eq!(m.alpha_at(13, 13), 200);
        assert_eq!(m.alpha_at(6, 10), 0);
        assert_eq!(m.alpha_at(10, 14), 0);
    }

    #[test]
    fn test_smooth_three_iterations() {
        // 3 passes of radius 3 → radius 9 → 19×19 square
        let m = smooth(&single_dot(41, 41, 20, 20, 255));
        assert_eq!(m.coverage(), 19 * 19);
        assert_eq!(m.alpha_at(11, 11), 255);
        assert_eq!(m.alpha_at(10, 20), 0);
    }

    #[test]
    fn test_dilate_takes_maximum() {
        let mut m = HairMask::new(9, 1);
        m.set_alpha(2, 0, 100);
        m.set_alpha(4, 0, 180);
        let d = dilate(&m, 1);
        assert_eq!(d.alpha(), &[0, 100, 100, 180, 180, 180, 0, 0, 0]);
    }

    #[test]
    fn test_dilate_clips_at_border() {
        let m = dilate(&single_dot(5, 5, 0, 0, 255), 3);
        assert_eq!(m.coverage(), 16);
        assert_eq!(m.alpha_at(3, 3), 255);
        assert_eq!(m.alpha_at(4, 0), 0);
    }

    #[test]
    fn test_dilate_does_not_mutate_input() {
        let m = single_dot(7, 7, 3, 3, 50);
        let before = m.clone();
        let _ = smooth(&m);
        assert_eq!(m, before);
    }

    #[test]
    fn test_dilate_is_monotone() {
        let small = single_dot(15, 15, 7, 7, 90);
        let mut big = small.clone();
        big.set_alpha(2, 2, 90);
        let (a, b) = (smooth(&small), smooth(&big));
        assert!(a.alpha().iter().zip(b.alpha()).all(|(x, y)| x <= y));
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let m = single_dot(5, 5, 2, 2, 77);
        assert_eq!(dilate(&m, 0), m);
        assert_eq!(dilate_iterations(&m, 3, 0), m);
    }
}
