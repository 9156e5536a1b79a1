//! Local scrapbook notes store.
//!
//! The scrapbook is a directory with one note file per vendor and an
//! optional screenshot directory next to it:
//!
//! ```text
//! scrapbook/
//!   Acme.md          <- file stem matches the vendor name
//!   Acme/
//!     pricing.png    <- attached to the synthesis model call
//!   Globex.md
//! ```
//!
//! Matching is case-insensitive and tolerates partial matches in either
//! direction ("Acme" matches "Acme Corp.md"). Missing directories or files
//! produce an empty bundle, never an error.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};
use vendorwatch_shared::{ImageData, NotesBundle};

use crate::NotesStore;

/// Note file extensions considered part of the scrapbook.
const NOTE_EXTENSIONS: &[&str] = &["md", "txt"];

/// Scrapbook reader rooted at a local directory.
pub struct LocalNotesStore {
    root: PathBuf,
}

impl LocalNotesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl NotesStore for LocalNotesStore {
    async fn read_notes(&self, vendor_name: &str) -> NotesBundle {
        let Some((stem, note_path)) = find_note_file(&self.root, vendor_name) else {
            debug!(vendor = vendor_name, root = %self.root.display(), "no scrapbook note found");
            return NotesBundle::default();
        };

        let text = match tokio::fs::read_to_string(&note_path).await {
            Ok(content) if !content.trim().is_empty() => {
                format!("=== Scrapbook: {stem} ===\n{content}")
            }
            Ok(_) => String::new(),
            Err(e) => {
                warn!(path = %note_path.display(), error = %e, "failed to read scrapbook note");
                String::new()
            }
        };

        let images = read_images(&self.root.join(&stem)).await;

        NotesBundle { text, images }
    }
}

/// Find the note file whose stem matches the vendor name.
fn find_note_file(root: &Path, vendor_name: &str) -> Option<(String, PathBuf)> {
    let entries = std::fs::read_dir(root).ok()?;
    let vendor_lower = vendor_name.to_lowercase();

    let mut candidates: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let ext = path.extension()?.to_str()?.to_lowercase();
            if !NOTE_EXTENSIONS.contains(&ext.as_str()) {
                return None;
            }
            let stem = path.file_stem()?.to_str()?.to_string();
            let stem_lower = stem.to_lowercase();
            if stem_lower.contains(&vendor_lower) || vendor_lower.contains(&stem_lower) {
                Some((stem, path))
            } else {
                None
            }
        })
        .collect();

    // Deterministic pick when multiple files match
    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    candidates.into_iter().next()
}

/// Read and encode every screenshot in the vendor's image directory.
async fn read_images(dir: &Path) -> Vec<ImageData> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| media_type_for(path).is_some())
        .collect();
    paths.sort();

    let mut images = Vec::new();
    for path in paths {
        let media_type = media_type_for(&path).unwrap_or_default();
        match tokio::fs::read(&path).await {
            Ok(bytes) => images.push(ImageData {
                media_type,
                data: BASE64.encode(bytes),
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read scrapbook image");
            }
        }
    }
    images
}

/// MIME type by file extension; `None` for non-image files.
fn media_type_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let media_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(media_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_scrapbook() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vw_notes_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create scrapbook dir");
        dir
    }

    #[tokio::test]
    async fn reads_text_and_images() {
        let root = temp_scrapbook();
        std::fs::write(root.join("Acme.md"), "Saw new dashboard at their booth.").unwrap();
        std::fs::create_dir_all(root.join("Acme")).unwrap();
        std::fs::write(root.join("Acme").join("pricing.png"), [0x89, 0x50, 0x4e]).unwrap();
        std::fs::write(root.join("Acme").join("readme.txt"), "not an image").unwrap();

        let store = LocalNotesStore::new(&root);
        let bundle = store.read_notes("Acme").await;

        assert!(bundle.text.contains("=== Scrapbook: Acme ==="));
        assert!(bundle.text.contains("new dashboard"));
        assert_eq!(bundle.images.len(), 1);
        assert_eq!(bundle.images[0].media_type, "image/png");
        assert_eq!(bundle.images[0].data, BASE64.encode([0x89u8, 0x50, 0x4e]));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn matching_is_case_insensitive_and_partial() {
        let root = temp_scrapbook();
        std::fs::write(root.join("acme corp.md"), "notes").unwrap();

        let store = LocalNotesStore::new(&root);
        let bundle = store.read_notes("Acme Corp").await;
        assert!(bundle.text.contains("notes"));

        // Partial in the other direction: vendor name contains the stem
        let bundle = store.read_notes("ACME CORP INTERNATIONAL").await;
        assert!(bundle.text.contains("notes"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn missing_vendor_or_root_is_empty() {
        let root = temp_scrapbook();
        let store = LocalNotesStore::new(&root);
        assert!(store.read_notes("Ghost").await.is_empty());

        let store = LocalNotesStore::new(root.join("does-not-exist"));
        assert!(store.read_notes("Acme").await.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn blank_note_file_is_empty_bundle() {
        let root = temp_scrapbook();
        std::fs::write(root.join("Acme.md"), "   \n").unwrap();

        let store = LocalNotesStore::new(&root);
        assert!(store.read_notes("Acme").await.is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }
}
