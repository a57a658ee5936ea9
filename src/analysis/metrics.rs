use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::analysis::quality::luma;

/// Hue band (0-180 scale) treated as "red", wrapping around zero.
const RED_HUE_LOW: u8 = 10;
const RED_HUE_HIGH: u8 = 170;
/// HSV value above which a pixel counts as a specular highlight.
const SHINE_VALUE_THRESHOLD: u8 = 220;

/// Pixel-statistic proxies sent to the model and returned with the payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinMetrics {
    pub texture_laplacian_var: f64,
    pub redness_proxy: f64,
    pub oil_proxy: f64,
    pub luma_contrast: f64,
}

/// Single-pass accumulator for population mean and variance.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningStats {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl RunningStats {
    pub(crate) fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    pub(crate) fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count as f64 - mean * mean).max(0.0)
    }

    pub(crate) fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hsv {
    h: u8,
    s: u8,
    v: u8,
}

/// 8-bit HSV: hue in [0, 180), saturation and value in [0, 255].
fn rgb_to_hsv(pixel: &Rgb<u8>) -> Hsv {
    let [r, g, b] = pixel.0.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;

    let s = if v == 0 {
        0
    } else {
        (255.0 * f64::from(delta) / f64::from(v)).round() as u8
    };

    let h = if delta == 0 {
        0
    } else {
        let delta = f64::from(delta);
        let mut degrees = if v == r {
            60.0 * f64::from(g - b) / delta
        } else if v == g {
            120.0 + 60.0 * f64::from(b - r) / delta
        } else {
            240.0 + 60.0 * f64::from(r - g) / delta
        };
        if degrees < 0.0 {
            degrees += 360.0;
        }
        let half = (degrees / 2.0).round() as u32;
        (half % 180) as u8
    };

    Hsv { h, s, v: v as u8 }
}

fn reflect_101(index: i64, len: i64) -> i64 {
    if len == 1 {
        0
    } else if index < 0 {
        -index
    } else if index >= len {
        2 * len - index - 2
    } else {
        index
    }
}

/// Variance of the 4-neighbour Laplacian over every pixel, borders reflected.
fn laplacian_variance(gray: &[u8], width: u32, height: u32) -> f64 {
    let (w, h) = (i64::from(width), i64::from(height));
    let at = |x: i64, y: i64| -> f64 {
        let index = reflect_101(y, h) * w + reflect_101(x, w);
        f64::from(gray[index as usize])
    };

    let mut stats = RunningStats::default();
    for y in 0..h {
        for x in 0..w {
            let response =
                at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y);
            stats.push(response);
        }
    }
    stats.variance()
}

pub fn compute_metrics(image: &RgbImage) -> SkinMetrics {
    let (width, height) = image.dimensions();
    let gray: Vec<u8> = image.pixels().map(luma).collect();
    let texture_laplacian_var = if gray.is_empty() {
        0.0
    } else {
        laplacian_variance(&gray, width, height)
    };

    let mut saturation_all = RunningStats::default();
    let mut saturation_red = RunningStats::default();
    let mut value = RunningStats::default();
    let mut shiny_pixels = 0u64;

    for pixel in image.pixels() {
        let hsv = rgb_to_hsv(pixel);
        let saturation = f64::from(hsv.s);
        saturation_all.push(saturation);
        if hsv.h < RED_HUE_LOW || hsv.h > RED_HUE_HIGH {
            saturation_red.push(saturation);
        }
        value.push(f64::from(hsv.v));
        if hsv.v > SHINE_VALUE_THRESHOLD {
            shiny_pixels += 1;
        }
    }

    let redness_proxy = if saturation_red.count() > 0 {
        saturation_red.mean()
    } else {
        saturation_all.mean()
    };
    let oil_proxy = if value.count() > 0 {
        shiny_pixels as f64 / value.count() as f64
    } else {
        0.0
    };

    SkinMetrics {
        texture_laplacian_var,
        redness_proxy,
        oil_proxy,
        luma_contrast: value.std_dev(),
    }
}
