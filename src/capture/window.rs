//! Game window lookup helpers

use super::types::{ScreenRect, WindowLocator};

/// Window titles tried in order when looking for the game
pub const DEFAULT_WINDOW_TITLES: &[&str] = &["MapleStory", "Maple Story", "MapleLand", "Maple Land"];

/// Screen area assumed when no game window can be found
pub const FALLBACK_SCREEN: ScreenRect = ScreenRect {
    x: 0,
    y: 0,
    width: 1440,
    height: 900,
};

/// Case-insensitive exact title comparison against the candidates, returning the candidate's rank
pub fn title_rank(title: &str, candidates: &[String]) -> Option<usize> {
    let title = title.trim();
    candidates
        .iter()
        .position(|candidate| candidate.trim().eq_ignore_ascii_case(title))
}

/// Pick the window whose title matches the earliest candidate
pub fn best_window<T>(
    windows: impl IntoIterator<Item = (String, T)>,
    candidates: &[String],
) -> Option<T> {
    windows
        .into_iter()
        .filter_map(|(title, window)| title_rank(&title, candidates).map(|rank| (rank, window)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, window)| window)
}

/// Window locator that always reports the same bounds (or none)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedWindow(pub Option<ScreenRect>);

impl WindowLocator for FixedWindow {
    fn find_game_window(&mut self) -> Option<ScreenRect> {
        self.0
    }
}
