//! Preview cache persisted as `img.cache`.
//!
//! Maps each cropped filename to a base64-encoded PNG scaled to
//! [`PREVIEW_WIDTH`](crate::PREVIEW_WIDTH). Entries are only ever added; an
//! existing key is never re-derived even if its crop changed on disk. Delete
//! the cache file to rebuild every preview.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, warn};

use crate::decode::{is_card_image, read_image, scale_to_width, FilterType};
use crate::encode::encode_png;
use crate::error::{ProxyError, Result};
use crate::PREVIEW_WIDTH;

#[derive(Debug, Clone, Default)]
pub struct PreviewCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PreviewCache {
    /// Load the cache at `path`, starting empty if the file does not exist.
    ///
    /// A file that exists but is not a JSON object of strings is a
    /// persistence error; it is never silently discarded.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| ProxyError::persistence(&path, format!("corrupt cache: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    /// Generate previews for crops in `crop_dir` that have none yet, then save.
    ///
    /// Subdirectories (bleed variants) are ignored. Undecodable files are
    /// logged and skipped. Returns the number of previews generated.
    pub fn refresh(&mut self, crop_dir: &Path) -> Result<usize> {
        let mut names = Vec::new();
        for entry in fs::read_dir(crop_dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_card_image(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !self.entries.contains_key(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut generated = 0;
        for name in names {
            match render_preview(&crop_dir.join(&name)) {
                Ok(encoded) => {
                    debug!("generated preview for {name}");
                    self.entries.insert(name, encoded);
                    generated += 1;
                }
                Err(err) => warn!("no preview for {name}: {err}"),
            }
        }

        if generated > 0 {
            info!("generated {generated} previews");
        }
        self.save()?;
        Ok(generated)
    }

    /// Base64 PNG preview for a cropped filename.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Decoded PNG bytes of a preview.
    pub fn png_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.get(name).and_then(|encoded| STANDARD.decode(encoded).ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Write the full mapping atomically.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| ProxyError::persistence(&self.path, e))?;
        write_file_atomically(&self.path, json.as_bytes())
    }
}

fn render_preview(path: &Path) -> Result<String> {
    let raster = read_image(path).map_err(|source| ProxyError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let preview = scale_to_width(&raster, PREVIEW_WIDTH, FilterType::Bilinear).map_err(
        |source| ProxyError::Input {
            path: path.to_path_buf(),
            source,
        },
    )?;
    let png = encode_png(&preview).map_err(|source| ProxyError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(STANDARD.encode(png))
}

/// Replace `path` with `bytes` via a temporary file in the same directory.
pub(crate) fn write_file_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| ProxyError::persistence(path, e))?;
    temp.write_all(bytes)
        .map_err(|e| ProxyError::persistence(path, e))?;
    temp.persist(path)
        .map_err(|e| ProxyError::persistence(path, e))?;
    Ok(())
}
