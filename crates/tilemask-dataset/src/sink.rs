//! Destinations for finished training pairs.
//!
//! [`DirectorySink`] writes the on-disk dataset layout: every pair is stored
//! as two PNG files with the same name, the RGB tile under `image/` and the
//! grayscale mask under `mask/`.

use image::{GrayImage, ImageFormat, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tilemask_core::error::{Result, TilemaskError};
use tilemask_core::models::TilePair;
use tilemask_core::ports::PairSink;

/// Writes pairs to `{root}/image/` and `{root}/mask/`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("image")
    }

    pub fn mask_dir(&self) -> PathBuf {
        self.root.join("mask")
    }
}

impl PairSink for DirectorySink {
    fn prepare(&self) -> Result<()> {
        for dir in [self.image_dir(), self.mask_dir()] {
            fs::create_dir_all(&dir).map_err(|e| TilemaskError::Persist {
                path: dir.clone(),
                reason: format!("cannot create directory: {}", e),
            })?;
        }
        Ok(())
    }

    /// Both PNGs are encoded before anything touches the disk. If the mask
    /// cannot be written the image file is removed again, so a failed pair
    /// never leaves a lone file behind.
    fn persist(&self, pair: &TilePair) -> Result<()> {
        let image = RgbImage::from_raw(
            pair.image.width(),
            pair.image.height(),
            pair.image.pixels().to_vec(),
        )
        .ok_or_else(|| TilemaskError::Image(format!("{}: bad RGB buffer", pair.file_name)))?;
        let size = pair.mask.size();
        let mask = GrayImage::from_raw(size, size, pair.mask.as_bytes().to_vec())
            .ok_or_else(|| TilemaskError::Image(format!("{}: bad mask buffer", pair.file_name)))?;

        let image_png = encode_png(&pair.file_name, |out| image.write_to(out, ImageFormat::Png))?;
        let mask_png = encode_png(&pair.file_name, |out| mask.write_to(out, ImageFormat::Png))?;

        let image_path = self.image_dir().join(&pair.file_name);
        let mask_path = self.mask_dir().join(&pair.file_name);
        write_file(&image_path, &image_png)?;
        if let Err(e) = write_file(&mask_path, &mask_png) {
            let _ = fs::remove_file(&image_path);
            return Err(e);
        }

        Ok(())
    }
}

fn encode_png<F>(file_name: &str, encode: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut Cursor<&mut Vec<u8>>) -> image::ImageResult<()>,
{
    let mut buf = Vec::new();
    encode(&mut Cursor::new(&mut buf))
        .map_err(|e| TilemaskError::Image(format!("{}: {}", file_name, e)))?;
    Ok(buf)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| TilemaskError::Persist {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// In-memory sink for tests and dry runs
#[derive(Debug, Default)]
pub struct MemorySink {
    pairs: RwLock<Vec<TilePair>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored pairs, in persist order
    pub fn pairs(&self) -> Vec<TilePair> {
        self.pairs.read().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.pairs
            .read()
            .map(|p| p.iter().map(|pair| pair.file_name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pairs.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PairSink for MemorySink {
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn persist(&self, pair: &TilePair) -> Result<()> {
        let mut pairs = self.pairs.write().map_err(|_| TilemaskError::Persist {
            path: PathBuf::from(&pair.file_name),
            reason: "memory sink lock poisoned".to_string(),
        })?;
        pairs.push(pair.clone());
        Ok(())
    }
}
