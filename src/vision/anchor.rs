//! Single- and multi-instance template location on intensity images

use super::correlation::correlate;
use super::types::AnchorMatch;
use image::GrayImage;

/// Best placement of `template` in `image`, if it reaches `min_confidence`.
///
/// Ties go to the smallest x, then the smallest y. A template larger than the
/// image never matches.
pub fn locate(image: &GrayImage, template: &GrayImage, min_confidence: f32) -> Option<AnchorMatch> {
    let map = correlate(image, template)?;
    let (position, confidence) = map.best()?;
    (confidence >= min_confidence).then_some(AnchorMatch {
        position,
        confidence,
    })
}

/// Every offset scoring at or above `min_confidence`, strongest first.
///
/// Adjacent offsets around one real instance are all reported; callers that
/// want one hit per object run overlap suppression afterwards.
pub fn locate_all(image: &GrayImage, template: &GrayImage, min_confidence: f32) -> Vec<AnchorMatch> {
    let Some(map) = correlate(image, template) else {
        return Vec::new();
    };

    let mut matches: Vec<AnchorMatch> = map
        .at_or_above(min_confidence)
        .into_iter()
        .map(|(position, confidence)| AnchorMatch {
            position,
            confidence,
        })
        .collect();

    matches.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(a.position.x.cmp(&b.position.x))
            .then(a.position.y.cmp(&b.position.y))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::types::PixelPoint;
    use image::Luma;

    fn checker(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 37 + y * 91 + x * y * 13) % 251) as u8])
        })
    }

    #[test]
    fn test_locate_finds_embedded_template() {
        let template = checker(10, 7);
        let mut image = GrayImage::from_pixel(64, 48, Luma([30]));
        image::imageops::replace(&mut image, &template, 21, 33);

        let found = locate(&image, &template, 0.8).expect("template should be found");
        assert_eq!(found.position, PixelPoint::new(21, 33));
        assert!(found.confidence > 0.99);
    }

    #[test]
    fn test_locate_low_contrast_template_on_bright_background() {
        let template = GrayImage::from_fn(48, 48, |x, y| Luma([230 + ((x * 5 + y * 11) % 12) as u8]));
        let mut image = GrayImage::from_pixel(160, 120, Luma([235]));
        image::imageops::replace(&mut image, &template, 60, 40);

        let found = locate(&image, &template, 0.99).expect("exact copy reaches the floor");
        assert_eq!(found.position, PixelPoint::new(60, 40));
        assert!(found.confidence > 0.9999, "confidence was {}", found.confidence);
    }

    #[test]
    fn test_locate_below_floor_is_none() {
        let template = checker(10, 7);
        let image = GrayImage::from_pixel(64, 48, Luma([30]));
        assert!(locate(&image, &template, 0.8).is_none());
    }

    #[test]
    fn test_locate_oversized_template_is_none() {
        let image = checker(8, 8);
        let template = checker(9, 9);
        assert!(locate(&image, &template, 0.0).is_none());
        assert!(locate_all(&image, &template, 0.0).is_empty());
    }

    #[test]
    fn test_locate_all_reports_each_instance_sorted() {
        let template = checker(6, 6);
        let mut image = GrayImage::from_pixel(50, 50, Luma([120]));
        image::imageops::replace(&mut image, &template, 30, 5);
        image::imageops::replace(&mut image, &template, 5, 30);

        let found = locate_all(&image, &template, 0.95);
        let positions: Vec<PixelPoint> = found.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![PixelPoint::new(5, 30), PixelPoint::new(30, 5)]);
        assert!(found.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }
}
