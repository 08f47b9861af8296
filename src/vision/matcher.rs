//! Multi-template, multi-instance matching against whole frames

use super::anchor::locate_all;
use super::config::{MatchConfig, category_allowed};
use super::library::{Template, TemplateLibrary};
use super::suppression::suppress_overlaps;
use super::types::{MatchCandidate, PixelRect};
use crate::capture::Frame;
use image::GrayImage;
use log::debug;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct TemplateMatcher {
    config: MatchConfig,
}

impl TemplateMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: MatchConfig) {
        self.config = config;
    }

    /// Replace only the category filter
    pub fn set_categories(&mut self, categories: Option<Vec<String>>) {
        self.config.categories = categories;
    }

    /// Match the library against `frame` using the configured category filter.
    ///
    /// No frame, an empty library or no hits all yield an empty list.
    pub fn match_all(&self, library: &TemplateLibrary, frame: Option<&Frame>) -> Vec<MatchCandidate> {
        self.match_categories(library, frame, self.config.categories.as_deref())
    }

    /// Match with an explicit category filter (`None` = every category).
    ///
    /// Results are above each template's own threshold, overlap-suppressed per
    /// category and sorted strongest first.
    pub fn match_categories(
        &self,
        library: &TemplateLibrary,
        frame: Option<&Frame>,
        categories: Option<&[String]>,
    ) -> Vec<MatchCandidate> {
        let Some(frame) = frame else {
            return Vec::new();
        };

        let start = Instant::now();
        let intensity = frame.intensity();
        let mut raw = Vec::new();
        let mut evaluated = 0usize;

        for template in library
            .templates()
            .filter(|t| category_allowed(categories, t.category()))
        {
            evaluated += 1;
            raw.extend(self.match_template(&intensity, template));
        }

        let raw_count = raw.len();
        let matches = suppress_overlaps(raw, self.config.suppression_threshold);
        debug!(
            "🔍 {} templates, {} raw hits, {} after suppression in {:?}",
            evaluated,
            raw_count,
            matches.len(),
            start.elapsed()
        );
        matches
    }

    fn match_template(&self, intensity: &GrayImage, template: &Template) -> Vec<MatchCandidate> {
        let hits = locate_all(intensity, template.intensity(), template.threshold());
        let limit = self.config.max_candidates_per_template.unwrap_or(usize::MAX);

        hits.into_iter()
            .take(limit)
            .map(|hit| MatchCandidate {
                name: template.name().to_string(),
                category: template.category().to_string(),
                bounds: PixelRect::new(
                    hit.position.x,
                    hit.position.y,
                    template.width(),
                    template.height(),
                ),
                confidence: hit.confidence,
            })
            .collect()
    }
}
