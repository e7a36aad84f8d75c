//! On-disk layout of a proxyprint workspace.
//!
//! ```text
//! <root>/
//!   config.toml        process configuration
//!   vibrance.CUBE      color table, read when vibrance is on
//!   print.json         project
//!   img.cache          preview cache
//!   images/            source scans
//!   images/crop/       borderless crops
//!   images/crop/1p5/   crops with a 1.5mm bleed, one directory per bleed
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::lut::ColorLut3d;
use crate::units::BleedEdge;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn crop_dir(&self) -> PathBuf {
        self.image_dir().join("crop")
    }

    /// Directory holding the crops for a bleed margin.
    pub fn variant_dir(&self, bleed: BleedEdge) -> PathBuf {
        match bleed.dir_name() {
            Some(segment) => self.crop_dir().join(segment),
            None => self.crop_dir(),
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join("img.cache")
    }

    pub fn project_path(&self) -> PathBuf {
        self.root.join("print.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn lut_path(&self) -> PathBuf {
        self.root.join("vibrance.CUBE")
    }

    /// Create the image directories and a starter config if missing.
    ///
    /// Returns true when a config file was written.
    pub fn init(&self) -> Result<bool> {
        fs::create_dir_all(self.crop_dir())?;
        let config = self.config_path();
        if config.exists() {
            return Ok(false);
        }
        fs::write(&config, Config::default_toml())
            .map_err(|e| ProxyError::persistence(&config, e))?;
        info!("wrote {}", config.display());
        Ok(true)
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load(&self.config_path())
    }

    /// Load the color table when `config` asks for it.
    pub fn load_lut(&self, config: &Config) -> Result<Option<ColorLut3d>> {
        if !config.vibrance_bump {
            return Ok(None);
        }
        let path = self.lut_path();
        ColorLut3d::load(&path)
            .map(Some)
            .map_err(|source| ProxyError::Lut { path, source })
    }

    /// Filenames of the borderless crops, sorted.
    pub fn cropped_names(&self) -> Result<Vec<String>> {
        let dir = self.crop_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() || !crate::decode::is_card_image(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
