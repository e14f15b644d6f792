//! Font registry
//!
//! Discovers font faces through fontdb and hands out shared
//! [`FontAsset`]s. Assets are cached by path through weak handles:
//! repeated lookups of a path reuse the live instance, and an asset is
//! freed once no element holds it.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use super::asset::{font_name, FontAsset};

/// Font discovery result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    /// Font file path
    pub path: PathBuf,
    /// Font name (file stem)
    pub name: String,
}

impl FontEntry {
    pub fn new(path: PathBuf) -> Self {
        let name = font_name(&path);
        Self { path, name }
    }
}

/// Path-keyed font cache plus font discovery.
///
/// Owned by the render thread; not shared across threads.
pub struct FontRegistry {
    database: fontdb::Database,
    directories: Vec<PathBuf>,
    default_font: Option<PathBuf>,
    cache: HashMap<PathBuf, Weak<FontAsset>>,
}

impl FontRegistry {
    /// Index the faces under `directories`, plus the platform font
    /// directories when `system_fonts` is set
    pub fn new(directories: Vec<PathBuf>, system_fonts: bool) -> Self {
        let mut database = fontdb::Database::new();
        if system_fonts {
            database.load_system_fonts();
        }
        for dir in &directories {
            database.load_fonts_dir(dir);
        }
        debug!("Font database: {} faces", database.len());

        Self {
            database,
            directories,
            default_font: None,
            cache: HashMap::new(),
        }
    }

    /// Every font file with at least one parsable face, sorted by name
    pub fn available_fonts(&self) -> Vec<FontEntry> {
        let mut fonts: Vec<FontEntry> = self
            .database
            .faces()
            .filter_map(|face| match &face.source {
                fontdb::Source::File(path) => Some(FontEntry::new(path.clone())),
                _ => None,
            })
            .collect();
        fonts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        // Collections list one file per face
        fonts.dedup_by(|a, b| a.path == b.path);
        fonts
    }

    /// Pick the default font.
    ///
    /// `preferred` may be a path or a font name; empty or unmatched
    /// falls back to the first font found.
    pub fn setup_default(&mut self, preferred: &str) -> Option<&Path> {
        let preferred = preferred.trim();
        let mut chosen = None;

        if !preferred.is_empty() {
            let as_path = Path::new(preferred);
            if as_path.is_file() {
                chosen = Some(as_path.to_path_buf());
            } else {
                chosen = self
                    .available_fonts()
                    .into_iter()
                    .find(|f| f.name.eq_ignore_ascii_case(preferred))
                    .map(|f| f.path);
                if chosen.is_none() {
                    warn!("Default font '{}' not found, using first available", preferred);
                }
            }
        }

        if chosen.is_none() {
            chosen = self.available_fonts().into_iter().next().map(|f| f.path);
        }

        match &chosen {
            Some(path) => info!("Default font: {}", path.display()),
            None => warn!("No fonts found (directories: {:?})", self.directories),
        }
        self.default_font = chosen;
        self.default_font.as_deref()
    }

    pub fn default_font(&self) -> Option<&Path> {
        self.default_font.as_deref()
    }

    /// Shared asset for `path`.
    ///
    /// Empty or missing paths resolve to the default font; with no
    /// default the result is an empty asset that renders nothing.
    pub fn get(&mut self, path: Option<&Path>) -> Arc<FontAsset> {
        let requested = path.filter(|p| !p.as_os_str().is_empty() && p.exists());
        let resolved = match requested.or(self.default_font.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => {
                warn!("No usable font for {:?}", path);
                return Arc::new(FontAsset::empty(path.unwrap_or(Path::new(""))));
            }
        };

        if let Some(asset) = self.cache.get(&resolved).and_then(Weak::upgrade) {
            debug!("Font cache hit: {}", resolved.display());
            return asset;
        }

        // Expired or never loaded
        let asset = Arc::new(FontAsset::open(&resolved));
        self.cache.insert(resolved, Arc::downgrade(&asset));
        asset
    }

    /// Whether a live asset for `path` is cached
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache
            .get(path)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Drop cache entries whose assets have been freed
    pub fn prune(&mut self) {
        self.cache.retain(|_, weak| weak.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_font_path;

    /// Two real fonts (one nested, upper-case extension) and two files
    /// fontdb must skip
    fn temp_font_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tzbanner_fonts_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::copy(test_font_path(), dir.join("Beta.ttf")).unwrap();
        std::fs::copy(test_font_path(), dir.join("nested").join("Alpha.OTF")).unwrap();
        std::fs::write(dir.join("Broken.ttf"), b"junk").unwrap();
        std::fs::write(dir.join("readme.txt"), b"not a font").unwrap();
        dir
    }

    fn registry(dir: &Path) -> FontRegistry {
        FontRegistry::new(vec![dir.to_path_buf()], false)
    }

    #[test]
    fn test_available_fonts_sorted_and_filtered() {
        let dir = temp_font_dir("list");
        let names: Vec<String> = registry(&dir).available_fonts().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_setup_default() {
        let dir = temp_font_dir("default");
        let mut registry = registry(&dir);

        assert_eq!(registry.setup_default("beta"), Some(dir.join("Beta.ttf").as_path()));
        assert_eq!(
            registry.setup_default("Missing"),
            Some(dir.join("nested").join("Alpha.OTF").as_path())
        );
        assert_eq!(registry.setup_default(""), Some(dir.join("nested").join("Alpha.OTF").as_path()));

        // A path wins even outside the indexed directories
        let fixture = test_font_path();
        assert_eq!(
            registry.setup_default(&fixture.to_string_lossy()),
            Some(fixture.as_path())
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_cache_reuses_live_assets() {
        let dir = temp_font_dir("cache");
        let path = dir.join("Beta.ttf");
        let mut registry = registry(&dir);

        let first = registry.get(Some(&path));
        let second = registry.get(Some(&path));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_usable());
        assert!(registry.is_cached(&path));

        drop(first);
        drop(second);
        assert!(!registry.is_cached(&path));

        let third = registry.get(Some(&path));
        assert!(registry.is_cached(&path));
        assert_eq!(third.path(), path.as_path());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_missing_path_uses_default() {
        let dir = temp_font_dir("fallback");
        let mut registry = registry(&dir);
        registry.setup_default("Beta");

        let asset = registry.get(Some(Path::new("/nonexistent/Gone.ttf")));
        assert_eq!(asset.path(), dir.join("Beta.ttf").as_path());
        let asset = registry.get(None);
        assert_eq!(asset.path(), dir.join("Beta.ttf").as_path());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_no_fonts_at_all() {
        let mut registry = FontRegistry::new(vec![PathBuf::from("/nonexistent/fonts")], false);
        assert!(registry.available_fonts().is_empty());
        assert_eq!(registry.setup_default(""), None);
        let asset = registry.get(None);
        assert!(!asset.is_usable());
    }

    #[test]
    fn test_prune() {
        let dir = temp_font_dir("prune");
        let path = dir.join("Beta.ttf");
        let mut registry = registry(&dir);
        drop(registry.get(Some(&path)));
        assert_eq!(registry.cache.len(), 1);
        registry.prune();
        assert!(registry.cache.is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }
}
