//! Zero-mean normalized cross-correlation over intensity images.
//!
//! Window sums and sums of squares come from integral images; the sliding dot
//! product is accumulated row by row in integers. Every term of the score is an
//! exact integer, so bright or low-contrast content does not lose the variance
//! to cancellation and flat regions stay exactly flat.

use super::types::PixelPoint;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};

type IntegralTable = ImageBuffer<Luma<u64>, Vec<u64>>;

/// Correlation score for every offset where the template fits entirely inside the image
#[derive(Debug, Clone)]
pub struct ScoreMap {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl ScoreMap {
    /// Number of valid horizontal offsets
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of valid vertical offsets
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn score(&self, x: u32, y: u32) -> f32 {
        self.scores[(y as usize) * (self.width as usize) + x as usize]
    }

    /// All offsets in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (PixelPoint, f32)> + '_ {
        let width = self.width as usize;
        self.scores.iter().enumerate().map(move |(i, &score)| {
            (
                PixelPoint::new((i % width) as u32, (i / width) as u32),
                score,
            )
        })
    }

    /// Highest score. Ties resolve to the smallest x, then the smallest y.
    pub fn best(&self) -> Option<(PixelPoint, f32)> {
        self.iter().fold(None, |best, (point, score)| match best {
            None => Some((point, score)),
            Some((best_point, best_score)) => {
                let wins = score > best_score
                    || (score == best_score
                        && (point.x, point.y) < (best_point.x, best_point.y));
                if wins {
                    Some((point, score))
                } else {
                    best
                }
            }
        })
    }

    /// Offsets scoring at or above `floor`
    pub fn at_or_above(&self, floor: f32) -> Vec<(PixelPoint, f32)> {
        self.iter().filter(|&(_, score)| score >= floor).collect()
    }
}

/// Sum over the `width` x `height` window at (x, y) using a (w+1)x(h+1) integral table
fn window_sum(table: &IntegralTable, x: u32, y: u32, width: u32, height: u32) -> u64 {
    let at = |px: u32, py: u32| table.get_pixel(px, py)[0];
    // (A + D) >= (B + C) for any non-negative integral image
    (at(x + width, y + height) + at(x, y)) - (at(x + width, y) + at(x, y + height))
}

/// Sum of products of `template` with the window whose top-left is (x, y)
fn window_dot(image: &[u8], image_width: usize, template: &[u8], template_width: usize, x: usize, y: usize) -> u64 {
    template
        .chunks_exact(template_width)
        .enumerate()
        .map(|(row, template_row)| {
            let start = (y + row) * image_width + x;
            let image_row = &image[start..start + template_width];
            image_row
                .iter()
                .zip(template_row)
                .map(|(&a, &b)| a as u64 * b as u64)
                .sum::<u64>()
        })
        .sum()
}

/// n * sum(v^2) - sum(v)^2, which is n^2 times the population variance
fn scaled_variance(n: u128, sum: u64, sum_sq: u64) -> u128 {
    let sum = sum as u128;
    (n * sum_sq as u128).saturating_sub(sum * sum)
}

/// Score every valid offset of `template` over `image`.
///
/// Returns `None` when the template is empty or larger than the image in
/// either dimension. Scores are clamped to `[0, 1]`: anti-correlation counts
/// as no match. A flat (zero variance) template matches a flat window of the
/// same intensity with 1.0 and anything else with 0.0.
pub fn correlate(image: &GrayImage, template: &GrayImage) -> Option<ScoreMap> {
    let (tw, th) = template.dimensions();
    let (iw, ih) = image.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return None;
    }

    let n = tw as u128 * th as u128;
    let (template_sum, template_sum_sq) = template.pixels().fold((0u64, 0u64), |(s, sq), p| {
        let v = p[0] as u64;
        (s + v, sq + v * v)
    });
    let template_var = scaled_variance(n, template_sum, template_sum_sq);

    let sums: IntegralTable = integral_image::<_, u64>(image);
    let squares: IntegralTable = integral_squared_image::<_, u64>(image);

    let width = iw - tw + 1;
    let height = ih - th + 1;
    let mut scores = Vec::with_capacity(width as usize * height as usize);

    for y in 0..height {
        for x in 0..width {
            let window_sum_value = window_sum(&sums, x, y, tw, th);
            let window_var = scaled_variance(n, window_sum_value, window_sum(&squares, x, y, tw, th));

            let score = match (template_var, window_var) {
                (0, 0) => {
                    if window_sum_value == template_sum {
                        1.0
                    } else {
                        0.0
                    }
                }
                (0, _) | (_, 0) => 0.0,
                _ => {
                    let dot = window_dot(
                        image.as_raw(),
                        iw as usize,
                        template.as_raw(),
                        tw as usize,
                        x as usize,
                        y as usize,
                    );
                    let numerator = n as i128 * dot as i128 - window_sum_value as i128 * template_sum as i128;
                    let denominator = (window_var as f64).sqrt() * (template_var as f64).sqrt();
                    (numerator as f64 / denominator).clamp(0.0, 1.0) as f32
                }
            };
            scores.push(score);
        }
    }

    Some(ScoreMap {
        width,
        height,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed;
            h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
            Luma([(h >> 24) as u8])
        })
    }

    #[test]
    fn test_exact_copy_scores_one() {
        let image = noise(40, 30, 7);
        let template = image::imageops::crop_imm(&image, 12, 9, 8, 6).to_image();

        let map = correlate(&image, &template).expect("template fits");
        assert_eq!(map.width(), 33);
        assert_eq!(map.height(), 25);

        let (best, score) = map.best().expect("non-empty map");
        assert_eq!(best, PixelPoint::new(12, 9));
        assert!(score > 0.999, "score was {score}");
    }

    #[test]
    fn test_low_contrast_copy_on_bright_background_scores_one() {
        let template = GrayImage::from_fn(48, 48, |x, y| Luma([230 + ((x * 7 + y * 13) % 12) as u8]));
        let mut image = GrayImage::from_pixel(200, 160, Luma([235]));
        image::imageops::replace(&mut image, &template, 60, 40);

        let map = correlate(&image, &template).expect("template fits");
        let (best, score) = map.best().expect("non-empty map");
        assert_eq!(best, PixelPoint::new(60, 40));
        assert!(score > 0.9999, "score was {score}");
    }

    #[test]
    fn test_brightness_offset_still_matches() {
        let image = noise(30, 30, 3);
        let template = GrayImage::from_fn(6, 6, |x, y| {
            let v = image.get_pixel(10 + x, 4 + y)[0];
            Luma([v / 2 + 20])
        });

        let map = correlate(&image, &template).expect("template fits");
        let (best, score) = map.best().expect("non-empty map");
        assert_eq!(best, PixelPoint::new(10, 4));
        assert!(score > 0.99, "score was {score}");
    }

    #[test]
    fn test_template_larger_than_image_is_rejected() {
        let image = noise(10, 10, 1);
        assert!(correlate(&image, &noise(11, 4, 1)).is_none());
        assert!(correlate(&image, &noise(4, 11, 1)).is_none());
        assert!(correlate(&image, &GrayImage::new(0, 0)).is_none());
    }

    #[test]
    fn test_template_same_size_as_image_has_single_offset() {
        let image = noise(12, 9, 5);
        let map = correlate(&image, &image).expect("template fits");
        assert_eq!((map.width(), map.height()), (1, 1));
        assert!(map.score(0, 0) > 0.999);
    }

    #[test]
    fn test_flat_template_only_matches_equal_flat_window() {
        let mut image = GrayImage::from_pixel(20, 20, Luma([90]));
        for y in 0..20 {
            for x in 10..20 {
                image.put_pixel(x, y, Luma([200]));
            }
        }
        let template = GrayImage::from_pixel(4, 4, Luma([200]));

        let map = correlate(&image, &template).expect("template fits");
        assert_eq!(map.score(12, 3), 1.0);
        assert_eq!(map.score(0, 0), 0.0);
        // straddles the edge, so the window is not flat
        assert_eq!(map.score(8, 0), 0.0);
    }

    #[test]
    fn test_scores_are_clamped_to_unit_range() {
        let image = noise(25, 25, 11);
        let inverted = GrayImage::from_fn(5, 5, |x, y| Luma([255 - image.get_pixel(3 + x, 3 + y)[0]]));

        let map = correlate(&image, &inverted).expect("template fits");
        assert_eq!(map.score(3, 3), 0.0);
        assert!(map.iter().all(|(_, s)| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_best_prefers_smallest_x_then_y_on_ties() {
        let template = noise(3, 3, 9);
        let mut image = GrayImage::from_pixel(20, 20, Luma([0]));
        image::imageops::replace(&mut image, &template, 10, 2);
        image::imageops::replace(&mut image, &template, 4, 12);
        image::imageops::replace(&mut image, &template, 4, 15);

        let map = correlate(&image, &template).expect("template fits");
        let (best, _) = map.best().expect("non-empty map");
        assert_eq!(best, PixelPoint::new(4, 12));
    }
}
