//! Debug overlays: detection boxes drawn on a copy of a frame

use super::types::{MatchCandidate, PixelRect};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

pub const PLAYER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const MONSTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const OTHER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const MINIMAP_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

pub fn category_color(category: &str) -> Rgb<u8> {
    match category {
        "player" => PLAYER_COLOR,
        "monster" => MONSTER_COLOR,
        _ => OTHER_COLOR,
    }
}

fn outline(image: &mut RgbImage, bounds: PixelRect, color: Rgb<u8>) {
    if bounds.is_empty() {
        return;
    }
    let rect = Rect::at(bounds.x as i32, bounds.y as i32).of_size(bounds.width, bounds.height);
    draw_hollow_rect_mut(image, rect, color);
}

/// Copy of `image` with one category-coloured box per match and, optionally, the minimap outline
pub fn draw_matches(image: &RgbImage, matches: &[MatchCandidate], minimap: Option<PixelRect>) -> RgbImage {
    let mut annotated = image.clone();
    if let Some(rect) = minimap {
        outline(&mut annotated, rect, MINIMAP_COLOR);
    }
    for candidate in matches {
        outline(&mut annotated, candidate.bounds, category_color(&candidate.category));
    }
    annotated
}
