use crate::annotations::chromosome_class::ChromosomeClass;
use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("chromosome pool directory does not exist: {path}")]
    MissingPoolDir { path: PathBuf },
    #[error("chromosome image not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to load chromosome image {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Lookup of pre-rendered reference chromosome crops, keyed by class and by
/// which copy of the homologous pair is being drawn.
///
/// Lookups are synchronous; a failed lookup is the non-fatal, per-detection
/// error case of the layout engine.
pub trait ChromosomePool {
    fn fetch(&self, class: ChromosomeClass, parity: u32) -> Result<RgbImage, PoolError>;
}

/// A pool backed by a directory of PNG crops.
///
/// Autosomes and "x" have two variant images named `{label}.{parity}.png`
/// with parity 0 or 1; "y" has the single `y.png`, so its parity argument is
/// ignored.
pub struct DirectoryPool {
    root: PathBuf,
}

impl DirectoryPool {
    pub fn new(root: &Path) -> Result<Self, PoolError> {
        if !root.is_dir() {
            return Err(PoolError::MissingPoolDir {
                path: root.to_path_buf(),
            });
        }
        let png_count = WalkDir::new(root)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .count();
        if png_count == 0 {
            warn!(path = %root.display(), "chromosome pool directory contains no PNG images");
        } else {
            debug!(path = %root.display(), png_count, "chromosome pool ready");
        }
        Ok(DirectoryPool {
            root: root.to_path_buf(),
        })
    }

    fn image_path(&self, class: ChromosomeClass, parity: u32) -> PathBuf {
        if class.is_y() {
            self.root.join(format!("{}.png", class.label()))
        } else {
            self.root.join(format!("{}.{}.png", class.label(), parity))
        }
    }
}

impl ChromosomePool for DirectoryPool {
    fn fetch(&self, class: ChromosomeClass, parity: u32) -> Result<RgbImage, PoolError> {
        let path = self.image_path(class, parity);
        if !path.exists() {
            return Err(PoolError::NotFound { path });
        }
        match image::open(&path) {
            Ok(img) => Ok(img.into_rgb8()),
            Err(source) => Err(PoolError::Unreadable { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> DirectoryPool {
        // Constructed directly so the path tests need no directory on disk.
        DirectoryPool {
            root: PathBuf::from("/pool"),
        }
    }

    #[test]
    fn autosomes_use_parity_variants() {
        let class = ChromosomeClass::from_label("7").unwrap();
        assert_eq!(pool().image_path(class, 0), PathBuf::from("/pool/7.0.png"));
        assert_eq!(pool().image_path(class, 1), PathBuf::from("/pool/7.1.png"));
    }

    #[test]
    fn x_uses_parity_variants() {
        let class = ChromosomeClass::from_label("x").unwrap();
        assert_eq!(pool().image_path(class, 1), PathBuf::from("/pool/x.1.png"));
    }

    #[test]
    fn y_has_a_single_variant() {
        let class = ChromosomeClass::from_label("y").unwrap();
        assert_eq!(pool().image_path(class, 0), PathBuf::from("/pool/y.png"));
        assert_eq!(pool().image_path(class, 1), PathBuf::from("/pool/y.png"));
    }

    #[test]
    fn missing_pool_dir_is_an_error() {
        let result = DirectoryPool::new(Path::new("/definitely/not/a/real/dir"));
        assert!(matches!(result, Err(PoolError::MissingPoolDir { .. })));
    }

    #[test]
    fn missing_image_is_not_found() {
        let result = pool().fetch(ChromosomeClass::from_label("3").unwrap(), 0);
        assert!(matches!(result, Err(PoolError::NotFound { .. })));
    }
}
