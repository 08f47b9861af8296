//! Template library: named template images with per-template matching parameters.
//!
//! Each template is stored as `<name>.png` plus an optional `<name>.json` sidecar
//! holding its metadata. The in-memory cache is keyed by name, so a name can
//! only ever map to one template.

use super::config::{DEFAULT_CATEGORY, DEFAULT_THRESHOLD};
use super::error::{LibraryError, LibraryResult};
use image::{GrayImage, ImageFormat, RgbImage};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const IMAGE_EXTENSION: &str = "png";
const METADATA_EXTENSION: &str = "json";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn valid_threshold(threshold: f32) -> bool {
    threshold.is_finite() && threshold > 0.0 && threshold <= 1.0
}

/// Sidecar record for one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    /// The file stem is authoritative; a differing value in the sidecar is replaced on load
    #[serde(default)]
    pub name: String,
    #[serde(alias = "type", default = "default_category")]
    pub category: String,
    /// Creation time, seconds since the Unix epoch
    #[serde(default)]
    pub created: f64,
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl TemplateMetadata {
    /// Dimensions formatted as `WxH`
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// A loaded template. The intensity image is derived once, at load time.
#[derive(Debug, Clone)]
pub struct Template {
    metadata: TemplateMetadata,
    image: RgbImage,
    intensity: GrayImage,
}

impl Template {
    fn new(mut metadata: TemplateMetadata, image: RgbImage) -> Self {
        metadata.width = image.width();
        metadata.height = image.height();
        let intensity = image::imageops::grayscale(&image);
        Self {
            metadata,
            image,
            intensity,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn category(&self) -> &str {
        &self.metadata.category
    }

    pub fn threshold(&self) -> f32 {
        self.metadata.confidence_threshold
    }

    pub fn metadata(&self) -> &TemplateMetadata {
        &self.metadata
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn intensity(&self) -> &GrayImage {
        &self.intensity
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// In-memory template cache backed by a directory
#[derive(Debug, Default)]
pub struct TemplateLibrary {
    directory: PathBuf,
    templates: BTreeMap<String, Template>,
}

impl TemplateLibrary {
    /// Empty library rooted at `directory`. Nothing is read until [`Self::load_all`].
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            templates: BTreeMap::new(),
        }
    }

    /// Create a library and load everything in `directory`
    pub fn open(directory: impl Into<PathBuf>) -> LibraryResult<Self> {
        let mut library = Self::new(directory);
        library.reload()?;
        Ok(library)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Re-read the current directory
    pub fn reload(&mut self) -> LibraryResult<usize> {
        let directory = self.directory.clone();
        self.load_all(directory)
    }

    /// Replace the cache with every template found in `directory`.
    ///
    /// The directory is created if missing. Files that cannot be read are
    /// skipped with a warning; only a failure to list the directory itself is
    /// an error, and in that case the previous cache is kept.
    pub fn load_all(&mut self, directory: impl Into<PathBuf>) -> LibraryResult<usize> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|e| LibraryError::io(&directory, e))?;
        let entries = fs::read_dir(&directory).map_err(|e| LibraryError::io(&directory, e))?;

        let mut templates = BTreeMap::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("⚠️ Skipping unreadable entry in {:?}: {}", directory, e);
                    continue;
                }
            };
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
            if !is_image || !path.is_file() {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                warn!("⚠️ Skipping template with non UTF-8 name: {:?}", path);
                continue;
            };
            if validate_name(&name).is_err() {
                debug!("Skipping {:?}: not a template name", path);
                continue;
            }

            match read_template(&path, &name) {
                Ok(template) => {
                    debug!(
                        "📄 Loaded template '{}' ({}, {}, threshold {:.2})",
                        name,
                        template.category(),
                        template.metadata.size(),
                        template.threshold()
                    );
                    templates.insert(name, template);
                }
                Err(e) => warn!("⚠️ Skipping template {:?}: {}", path, e),
            }
        }

        self.directory = directory;
        self.templates = templates;
        info!(
            "📚 Loaded {} templates from {:?}",
            self.templates.len(),
            self.directory
        );
        Ok(self.templates.len())
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Templates in name order
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    /// Metadata for all templates in `category` (or all), newest first
    pub fn list(&self, category: Option<&str>) -> Vec<TemplateMetadata> {
        let mut list: Vec<TemplateMetadata> = self
            .templates
            .values()
            .filter(|t| category.is_none_or(|c| t.category() == c))
            .map(|t| t.metadata.clone())
            .collect();
        list.sort_by(|a, b| b.created.total_cmp(&a.created).then_with(|| a.name.cmp(&b.name)));
        list
    }

    /// Persist a template and add it to the cache, replacing any template of the same name.
    ///
    /// The image is written before the sidecar, each through a temporary file
    /// and a rename, and any previous sidecar is removed before the new image
    /// replaces the old one. If the sidecar write fails the image stays behind
    /// and will load with default metadata; the cache is only touched once both
    /// writes succeed.
    pub fn save(
        &mut self,
        image: &RgbImage,
        name: &str,
        category: &str,
        threshold: f32,
    ) -> LibraryResult<()> {
        validate_name(name)?;
        if !valid_threshold(threshold) {
            return Err(LibraryError::InvalidThreshold { threshold });
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(LibraryError::EmptyImage);
        }

        fs::create_dir_all(&self.directory).map_err(|e| LibraryError::io(&self.directory, e))?;

        let metadata = TemplateMetadata {
            name: name.to_string(),
            category: category.to_string(),
            created: unix_seconds(SystemTime::now()),
            confidence_threshold: threshold,
            width: image.width(),
            height: image.height(),
        };

        let image_path = self.image_path(name);
        let metadata_path = self.metadata_path(name);
        let image_tmp = self.temp_path(name, IMAGE_EXTENSION);
        image
            .save_with_format(&image_tmp, ImageFormat::Png)
            .map_err(|e| LibraryError::image(&image_tmp, e))?;
        // an old sidecar must never end up describing the new image
        if let Err(e) = remove_if_present(&metadata_path) {
            let _ = fs::remove_file(&image_tmp);
            return Err(e);
        }
        fs::rename(&image_tmp, &image_path).map_err(|e| LibraryError::io(&image_path, e))?;

        let metadata_tmp = self.temp_path(name, METADATA_EXTENSION);
        let json = serde_json::to_string_pretty(&metadata).map_err(|e| LibraryError::Metadata {
            path: metadata_path.clone(),
            source: e,
        })?;
        fs::write(&metadata_tmp, json).map_err(|e| LibraryError::io(&metadata_tmp, e))?;
        fs::rename(&metadata_tmp, &metadata_path).map_err(|e| LibraryError::io(&metadata_path, e))?;

        info!("💾 Saved template '{}' ({}, {})", name, category, metadata.size());
        self.templates
            .insert(name.to_string(), Template::new(metadata, image.clone()));
        Ok(())
    }

    /// Remove a template from disk and from the cache
    pub fn delete(&mut self, name: &str) -> LibraryResult<()> {
        validate_name(name)?;
        let image_path = self.image_path(name);
        let metadata_path = self.metadata_path(name);

        if !self.templates.contains_key(name) && !image_path.exists() && !metadata_path.exists() {
            return Err(LibraryError::NotFound {
                name: name.to_string(),
            });
        }

        remove_if_present(&image_path)?;
        remove_if_present(&metadata_path)?;
        self.templates.remove(name);
        info!("🗑️ Deleted template '{}'", name);
        Ok(())
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{IMAGE_EXTENSION}"))
    }

    fn metadata_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.{METADATA_EXTENSION}"))
    }

    /// Hidden, with a `.tmp` extension, so an interrupted write is never loaded
    fn temp_path(&self, name: &str, extension: &str) -> PathBuf {
        self.directory.join(format!(".{name}.{extension}.tmp"))
    }
}

fn remove_if_present(path: &Path) -> LibraryResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LibraryError::io(path, e)),
    }
}

/// Names are used as file stems, so they must not escape the library directory
fn validate_name(name: &str) -> LibraryResult<()> {
    let invalid = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if invalid {
        Err(LibraryError::InvalidName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn read_template(image_path: &Path, name: &str) -> LibraryResult<Template> {
    let image = image::open(image_path)
        .map_err(|e| LibraryError::image(image_path, e))?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(LibraryError::EmptyImage);
    }

    let metadata_path = image_path.with_extension(METADATA_EXTENSION);
    let mut metadata = if metadata_path.is_file() {
        let json = fs::read_to_string(&metadata_path).map_err(|e| LibraryError::io(&metadata_path, e))?;
        serde_json::from_str::<TemplateMetadata>(&json).map_err(|e| LibraryError::Metadata {
            path: metadata_path.clone(),
            source: e,
        })?
    } else {
        debug!("No metadata for '{}', using defaults", name);
        let created = fs::metadata(image_path)
            .and_then(|m| m.modified())
            .map(unix_seconds)
            .unwrap_or(0.0);
        TemplateMetadata {
            name: name.to_string(),
            category: default_category(),
            created,
            confidence_threshold: DEFAULT_THRESHOLD,
            width: 0,
            height: 0,
        }
    };

    metadata.name = name.to_string();
    if !valid_threshold(metadata.confidence_threshold) {
        warn!(
            "⚠️ Template '{}' has invalid threshold {}, using {}",
            name, metadata.confidence_threshold, DEFAULT_THRESHOLD
        );
        metadata.confidence_threshold = DEFAULT_THRESHOLD;
    }

    Ok(Template::new(metadata, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "minimap-autoplay-library-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 11) as u8, 90]))
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = temp_dir("round-trip");
        let mut library = TemplateLibrary::new(&dir);
        library
            .save(&sample(16, 12), "slime", "monster", 0.75)
            .expect("save should succeed");

        let mut reloaded = TemplateLibrary::new(&dir);
        assert_eq!(reloaded.load_all(&dir).expect("load"), 1);
        let slime = reloaded.get("slime").expect("slime is cached");
        assert_eq!((slime.width(), slime.height()), (16, 12));
        assert_eq!(slime.threshold(), 0.75);
        assert_eq!(slime.category(), "monster");
        assert_eq!(slime.metadata().size(), "16x12");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_orphan_image_loads_with_defaults_and_junk_is_skipped() {
        let dir = temp_dir("orphans");
        fs::create_dir_all(&dir).expect("create dir");
        sample(8, 8).save(dir.join("coin.png")).expect("write png");
        fs::write(dir.join("broken.png"), b"not a png").expect("write junk");
        fs::write(dir.join("notes.txt"), b"hello").expect("write txt");
        sample(8, 8).save(dir.join("bad_meta.png")).expect("write png");
        fs::write(dir.join("bad_meta.json"), b"{ nope").expect("write json");

        let mut library = TemplateLibrary::new(&dir);
        assert_eq!(library.load_all(&dir).expect("load"), 1);
        let coin = library.get("coin").expect("orphan image loads");
        assert_eq!(coin.category(), DEFAULT_CATEGORY);
        assert_eq!(coin.threshold(), DEFAULT_THRESHOLD);
        assert!(library.get("broken").is_none());
        assert!(library.get("bad_meta").is_none());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_legacy_type_key_and_bad_threshold() {
        let dir = temp_dir("legacy");
        fs::create_dir_all(&dir).expect("create dir");
        sample(6, 6).save(dir.join("hero.png")).expect("write png");
        fs::write(
            dir.join("hero.json"),
            r#"{"name": "other", "type": "player", "created": 12.5, "confidence_threshold": 3.0}"#,
        )
        .expect("write json");

        let library = TemplateLibrary::open(&dir).expect("open");
        let hero = library.get("hero").expect("hero loads");
        assert_eq!(hero.name(), "hero");
        assert_eq!(hero.category(), "player");
        assert_eq!(hero.threshold(), DEFAULT_THRESHOLD);
        assert_eq!(hero.metadata().created, 12.5);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_is_newest_first_and_filtered() {
        let dir = temp_dir("list");
        fs::create_dir_all(&dir).expect("create dir");
        for (name, category, created) in [("a", "monster", 10.0), ("b", "item", 30.0), ("c", "monster", 20.0)] {
            sample(4, 4).save(dir.join(format!("{name}.png"))).expect("write png");
            let meta = format!(r#"{{"category": "{category}", "created": {created}}}"#);
            fs::write(dir.join(format!("{name}.json")), meta).expect("write json");
        }

        let library = TemplateLibrary::open(&dir).expect("open");
        let names: Vec<String> = library.list(None).into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
        let monsters: Vec<String> = library.list(Some("monster")).into_iter().map(|m| m.name).collect();
        assert_eq!(monsters, vec!["c", "a"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_save_replaces_and_delete_removes_files() {
        let dir = temp_dir("delete");
        let mut library = TemplateLibrary::new(&dir);
        library.save(&sample(4, 4), "slime", "monster", 0.8).expect("save");
        library.save(&sample(5, 5), "slime", "monster", 0.9).expect("save again");
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("slime").map(Template::width), Some(5));

        library.delete("slime").expect("delete");
        assert!(library.get("slime").is_none());
        assert!(!dir.join("slime.png").exists());
        assert!(!dir.join("slime.json").exists());
        assert!(matches!(library.delete("slime"), Err(LibraryError::NotFound { .. })));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_sidecar_write_leaves_orphan_with_defaults() {
        let dir = temp_dir("sidecar-failure");
        let mut library = TemplateLibrary::new(&dir);
        library.save(&sample(4, 4), "slime", "monster", 0.8).expect("first save");

        // a directory squatting on the sidecar temp path makes the second write fail
        fs::create_dir_all(dir.join(".slime.json.tmp")).expect("create blocker");
        let result = library.save(&sample(6, 6), "slime", "item", 0.9);
        assert!(matches!(result, Err(LibraryError::Io { .. })));

        // cache untouched, stale sidecar gone
        let cached = library.get("slime").expect("old template still cached");
        assert_eq!((cached.width(), cached.category()), (4, "monster"));
        assert!(dir.join("slime.png").exists());
        assert!(!dir.join("slime.json").exists());

        let reloaded = TemplateLibrary::open(&dir).expect("open");
        let slime = reloaded.get("slime").expect("orphan image loads");
        assert_eq!(slime.width(), 6);
        assert_eq!(slime.category(), DEFAULT_CATEGORY);
        assert_eq!(slime.threshold(), DEFAULT_THRESHOLD);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_input_is_rejected_without_touching_cache() {
        let dir = temp_dir("invalid");
        let mut library = TemplateLibrary::new(&dir);
        assert!(matches!(
            library.save(&sample(4, 4), "../escape", "monster", 0.8),
            Err(LibraryError::InvalidName { .. })
        ));
        assert!(matches!(
            library.save(&sample(4, 4), "ok", "monster", 0.0),
            Err(LibraryError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            library.save(&RgbImage::new(0, 0), "ok", "monster", 0.5),
            Err(LibraryError::EmptyImage)
        ));
        assert!(library.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
