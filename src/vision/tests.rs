//! Scenario tests for the full frame pipeline: calibration, tracking and matching on synthetic screens

use crate::automation::{AnchorSet, CalibrationConfig, CycleOutcome, MinimapCalibrator};
use crate::capture::{Frame, ScreenPoint};
use crate::vision::{
    MatchConfig, PixelPoint, PixelRect, TemplateLibrary, TemplateMatcher, draw_matches, locate, locate_all,
    to_screen,
};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::PathBuf;

/// Deterministic noise; distinct seeds give uncorrelated patterns
fn pattern(width: u32, height: u32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(2_246_822_519);
        h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
        let v = (h >> 24) as u8;
        Rgb([v, v.wrapping_add(40), v ^ 0x5a])
    })
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("minimap-autoplay-scenario-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

struct Screen {
    frame: Frame,
    top_left: RgbImage,
    bottom_right: RgbImage,
    player: RgbImage,
    /// Two 16x16 monster templates cut from one 18x17 patch, so they overlap by design
    slime: RgbImage,
    slime_shifted: RgbImage,
    bat: RgbImage,
    coin: RgbImage,
}

/// 1000x800 screen: anchors at (50,50) and (400,300), player at (200,150),
/// monsters at (100,100), (102,101) and (300,250), a coin item at (600,500)
fn screen() -> Screen {
    let top_left = pattern(20, 20, 1);
    let bottom_right = pattern(20, 20, 2);
    let player = pattern(8, 8, 3);
    let patch = pattern(18, 17, 4);
    let slime = image::imageops::crop_imm(&patch, 0, 0, 16, 16).to_image();
    let slime_shifted = image::imageops::crop_imm(&patch, 2, 1, 16, 16).to_image();
    let bat = pattern(16, 16, 5);
    let coin = pattern(12, 12, 6);

    let mut image = RgbImage::from_pixel(1000, 800, Rgb([25, 25, 25]));
    image::imageops::replace(&mut image, &top_left, 50, 50);
    image::imageops::replace(&mut image, &bottom_right, 400, 300);
    image::imageops::replace(&mut image, &player, 200, 150);
    image::imageops::replace(&mut image, &patch, 100, 100);
    image::imageops::replace(&mut image, &bat, 300, 250);
    image::imageops::replace(&mut image, &coin, 600, 500);

    Screen {
        frame: Frame::new(image, ScreenPoint::new(0, 0)),
        top_left,
        bottom_right,
        player,
        slime,
        slime_shifted,
        bat,
        coin,
    }
}

fn library_for(screen: &Screen, tag: &str) -> (TemplateLibrary, PathBuf) {
    let dir = temp_dir(tag);
    let mut library = TemplateLibrary::new(&dir);
    library.save(&screen.slime, "slime", "monster", 0.8).expect("save slime");
    library
        .save(&screen.slime_shifted, "slime_shifted", "monster", 0.8)
        .expect("save slime_shifted");
    library.save(&screen.bat, "bat", "monster", 0.8).expect("save bat");
    library.save(&screen.coin, "coin", "item", 0.8).expect("save coin");
    (library, dir)
}

#[test]
fn test_locate_exact_subregion() {
    let screen = screen();
    let intensity = screen.frame.intensity();
    let template = image::imageops::grayscale(&screen.bat);

    let found = locate(&intensity, &template, 0.99).expect("bat is on screen");
    assert_eq!(found.position, PixelPoint::new(300, 250));
    assert!(found.confidence > 0.999);
}

#[test]
fn test_template_larger_than_frame_is_not_found() {
    let frame = image::imageops::grayscale(&pattern(10, 10, 9));
    let template = image::imageops::grayscale(&pattern(12, 8, 9));
    assert!(locate(&frame, &template, 0.0).is_none());
    assert!(locate_all(&frame, &template, 0.0).is_empty());
}

#[test]
fn test_end_to_end_calibration_and_matching() {
    let screen = screen();

    let anchors = AnchorSet::from_rgb(&screen.top_left, &screen.bottom_right, &screen.player).expect("anchors");
    let mut calibrator = MinimapCalibrator::new(CalibrationConfig::default(), anchors);
    let outcome = calibrator.process(&screen.frame, 1);
    assert!(matches!(outcome, CycleOutcome::Tracking { player_found: true, .. }));

    let rect = calibrator.calibration().expect("calibrated").rect;
    assert_eq!((rect.x, rect.y), (59, 55));
    assert_eq!((rect.right(), rect.bottom()), (391, 291));

    let (library, dir) = library_for(&screen, "e2e");
    let matcher = TemplateMatcher::new(MatchConfig::default().with_categories(["monster"]));
    let monsters = matcher.match_all(&library, Some(&screen.frame));

    assert_eq!(monsters.len(), 2, "{monsters:#?}");
    assert!(monsters.iter().all(|m| m.category == "monster" && m.confidence >= 0.8));
    assert!(monsters[0].confidence >= monsters[1].confidence);

    let slime = monsters
        .iter()
        .find(|m| m.name.starts_with("slime"))
        .expect("one slime survives suppression");
    assert!(slime.bounds == PixelRect::new(100, 100, 16, 16) || slime.bounds == PixelRect::new(102, 101, 16, 16));
    let bat = monsters.iter().find(|m| m.name == "bat").expect("bat found");
    assert_eq!(bat.bounds, PixelRect::new(300, 250, 16, 16));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_match_all_without_filter_keeps_other_categories() {
    let screen = screen();
    let (library, dir) = library_for(&screen, "all");
    let matcher = TemplateMatcher::default();

    let all = matcher.match_all(&library, Some(&screen.frame));
    assert_eq!(all.len(), 3);
    let coin = all.iter().find(|m| m.category == "item").expect("coin found");
    assert_eq!(coin.bounds, PixelRect::new(600, 500, 12, 12));

    let items = matcher.match_categories(&library, Some(&screen.frame), Some(&["item".to_string()][..]));
    assert_eq!(items.len(), 1);

    assert!(matcher.match_all(&library, None).is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_candidate_cap_per_template() {
    let screen = screen();
    let (library, dir) = library_for(&screen, "cap");
    let config = MatchConfig {
        max_candidates_per_template: Some(0),
        ..MatchConfig::default()
    };
    assert!(TemplateMatcher::new(config).match_all(&library, Some(&screen.frame)).is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_player_position_maps_back_to_screen() {
    let screen = screen();
    let anchors = AnchorSet::from_rgb(&screen.top_left, &screen.bottom_right, &screen.player).expect("anchors");
    let mut calibrator = MinimapCalibrator::new(CalibrationConfig::default(), anchors);
    calibrator.process(&screen.frame, 1);

    let rect = calibrator.calibration().expect("calibrated").rect;
    let player = calibrator.player().expect("player found");
    let click = to_screen(player.position, rect, screen.frame.placement()).expect("inside minimap");
    assert_eq!(click, ScreenPoint::new(204, 154));
}

#[test]
fn test_overlay_marks_detections() {
    let screen = screen();
    let (library, dir) = library_for(&screen, "overlay");
    let matches = TemplateMatcher::default().match_all(&library, Some(&screen.frame));

    let annotated = draw_matches(screen.frame.image(), &matches, None);
    assert_eq!(*annotated.get_pixel(300, 250), Rgb([255, 0, 0]));
    assert_eq!(*annotated.get_pixel(600, 500), Rgb([255, 0, 255]));
    let _ = fs::remove_dir_all(&dir);
}
