use image::{Rgb, RgbImage};

use crate::analysis::error::{QualityError, QualityIssue};
use crate::analysis::metrics::RunningStats;

pub const MIN_MEAN_BRIGHTNESS: f64 = 35.0;
pub const MIN_LUMA_VARIANCE: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityStats {
    pub mean_brightness: f64,
    pub variance: f64,
}

/// ITU-R 601 luma, rounded to the nearest 8-bit value.
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let weighted = u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114;
    ((weighted + 500) / 1000) as u8
}

pub fn luma_stats(image: &RgbImage) -> QualityStats {
    let mut stats = RunningStats::default();
    for pixel in image.pixels() {
        stats.push(f64::from(luma(pixel)));
    }
    QualityStats {
        mean_brightness: stats.mean(),
        variance: stats.variance(),
    }
}

pub fn check_quality(image: &RgbImage) -> Result<QualityStats, QualityError> {
    let stats = luma_stats(image);

    let issue = if stats.mean_brightness < MIN_MEAN_BRIGHTNESS {
        Some(QualityIssue::TooDark)
    } else if stats.variance < MIN_LUMA_VARIANCE {
        Some(QualityIssue::TooFlat)
    } else {
        None
    };

    match issue {
        Some(issue) => Err(QualityError {
            issue,
            mean_brightness: stats.mean_brightness,
            variance: stats.variance,
        }),
        None => Ok(stats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32, dark: u8, light: u8) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let value = if (x + y) % 2 == 0 { dark } else { light };
            Rgb([value, value, value])
        })
    }

    #[test]
    fn luma_matches_bt601_weights() {
        assert_eq!(luma(&Rgb([0, 0, 0])), 0);
        assert_eq!(luma(&Rgb([255, 255, 255])), 255);
        assert_eq!(luma(&Rgb([255, 0, 0])), 76);
        assert_eq!(luma(&Rgb([0, 255, 0])), 150);
        assert_eq!(luma(&Rgb([0, 0, 255])), 29);
    }

    #[test]
    fn rejects_black_frame_as_too_dark() {
        let image = RgbImage::new(100, 100);
        let err = check_quality(&image).unwrap_err();
        assert_eq!(err.issue, QualityIssue::TooDark);
        assert_eq!(err.mean_brightness, 0.0);
        assert_eq!(err.variance, 0.0);
    }

    #[test]
    fn dark_frame_fails_even_with_high_variance() {
        // mean 32.5, variance 1056.25
        let image = checkerboard(64, 64, 0, 65);
        let err = check_quality(&image).unwrap_err();
        assert_eq!(err.issue, QualityIssue::TooDark);
        assert!(err.variance > MIN_LUMA_VARIANCE);
    }

    #[test]
    fn flat_bright_frame_fails_as_too_flat() {
        let image = RgbImage::from_pixel(80, 60, Rgb([200, 200, 200]));
        let err = check_quality(&image).unwrap_err();
        assert_eq!(err.issue, QualityIssue::TooFlat);
        assert_eq!(err.mean_brightness, 200.0);
    }

    #[test]
    fn low_contrast_texture_is_still_too_flat() {
        // values 120/140: variance 100
        let image = checkerboard(32, 32, 120, 140);
        let err = check_quality(&image).unwrap_err();
        assert_eq!(err.issue, QualityIssue::TooFlat);
        assert!((err.variance - 100.0).abs() < 1e-9);
    }

    #[test]
    fn accepts_bright_textured_frame() {
        let image = checkerboard(40, 40, 60, 200);
        let stats = check_quality(&image).unwrap();
        assert!((stats.mean_brightness - 130.0).abs() < 1e-9);
        assert!((stats.variance - 4900.0).abs() < 1e-9);
    }
}
