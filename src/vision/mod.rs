//! Template correlation, minimap geometry and the template library
//!
//! Everything here is synchronous and free of I/O except [`library`], which
//! reads and writes the template directory.

pub mod anchor;
pub mod config;
pub mod coords;
pub mod correlation;
pub mod error;
pub mod library;
pub mod matcher;
pub mod overlay;
pub mod suppression;
pub mod types;

#[cfg(test)]
mod tests;

pub use anchor::{locate, locate_all};
pub use config::{DEFAULT_CATEGORY, DEFAULT_THRESHOLD, MatchConfig, create_monster_config};
pub use coords::{RelativePoint, to_absolute, to_minimap_relative, to_normalized, to_screen};
pub use error::{CoordinateError, LibraryError, LibraryResult};
pub use library::{Template, TemplateLibrary, TemplateMetadata};
pub use matcher::TemplateMatcher;
pub use overlay::draw_matches;
pub use suppression::suppress_overlaps;
pub use types::{AnchorMatch, MatchCandidate, NormalizedPoint, PixelPoint, PixelRect};
