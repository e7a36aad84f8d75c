//! DPI-inferring border cropper.
//!
//! Card scans arrive at unknown resolution. Because every card shares one
//! physical size, the pixel dimensions reveal the DPI: the printed border is
//! 0.12in wide on each edge, so `c = round(0.12 × min(w / 2.72, h / 3.70))`
//! is both the number of pixels to trim per edge and `0.12 × dpi`.
//!
//! ## Pipeline
//! 1. Infer `c` and `dpi` from the source dimensions
//! 2. Reduce `c` by the bleed margin (if any) converted to pixels
//! 3. Trim once
//! 4. Downsample to the DPI ceiling and unsharp-mask, if exceeded
//! 5. Apply the color table, if enabled
//!
//! The order is fixed; moving the resample before the trim changes output
//! pixel counts.
//!
//! ## Incremental runs
//! An output file that already exists is a cache hit and is never rebuilt.
//! Delete outputs to force recomputation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::decode::{is_card_image, read_image, scale_by, FilterType, Raster};
use crate::encode::write_image;
use crate::error::{ProxyError, Result};
use crate::lut::{apply_color_lut, ColorLut3d};
use crate::transform::{trim_edges, unsharp_mask, UnsharpMask};
use crate::units::BleedEdge;
use crate::{CardSize, BORDER_MARGIN_IN};

/// Process-wide settings shared by every crop.
#[derive(Debug, Clone, Copy)]
pub struct CropSettings<'a> {
    /// Resolution ceiling; sources above it are downsampled.
    pub max_dpi: u32,
    /// Color table applied last, when vibrance correction is on.
    pub color_lut: Option<&'a ColorLut3d>,
}

/// Crop amounts derived from a source's dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    /// Inferred resolution of the source.
    pub dpi: f64,
    /// Pixels per edge that make up the printed border.
    pub border_px: u32,
    /// Pixels per edge actually removed, after keeping any bleed.
    pub trim_px: u32,
}

/// Pixels per edge occupied by the printed border of a `width × height` scan.
pub fn infer_border_pixels(width: u32, height: u32) -> u32 {
    let bordered = CardSize::BORDERED;
    let per_inch = (width as f64 / bordered.width_in).min(height as f64 / bordered.height_in);
    (BORDER_MARGIN_IN * per_inch).round() as u32
}

/// Work out DPI and trim for a source of the given size.
pub fn plan_crop(width: u32, height: u32, bleed: BleedEdge) -> CropPlan {
    let border_px = infer_border_pixels(width, height);
    let dpi = border_px as f64 / BORDER_MARGIN_IN;

    let trim_px = if bleed.is_none() {
        border_px
    } else {
        let bleed_px = bleed.inches() * dpi;
        (border_px as f64 - bleed_px).round().max(0.0) as u32
    };

    CropPlan {
        dpi,
        border_px,
        trim_px,
    }
}

/// Run the full normalization pipeline on an in-memory source.
///
/// # Errors
///
/// Returns [`ProxyError::Geometry`] when the trim would consume the image.
pub fn normalize(
    source: &Raster,
    bleed: BleedEdge,
    settings: &CropSettings<'_>,
) -> Result<(Raster, CropPlan)> {
    let plan = plan_crop(source.width, source.height, bleed);

    let mut cropped = trim_edges(source, plan.trim_px).map_err(|_| {
        ProxyError::Geometry(format!(
            "cannot trim {} px per edge from a {}x{} image",
            plan.trim_px, source.width, source.height
        ))
    })?;

    let max_dpi = f64::from(settings.max_dpi);
    if plan.dpi > max_dpi {
        let resized = scale_by(&cropped, max_dpi / plan.dpi, FilterType::Cubic).map_err(|e| {
            ProxyError::Geometry(format!("cannot resample to {} DPI: {e}", settings.max_dpi))
        })?;
        info!(
            "exceeds maximum DPI {}, resizing to {}x{}",
            settings.max_dpi, resized.width, resized.height
        );
        cropped = unsharp_mask(&resized, UnsharpMask::AFTER_DOWNSAMPLE);
    }

    if let Some(lut) = settings.color_lut {
        apply_color_lut(&mut cropped.pixels, lut);
    }

    Ok((cropped, plan))
}

/// Read `source_path` and normalize it.
pub fn normalize_file(
    source_path: &Path,
    bleed: BleedEdge,
    settings: &CropSettings<'_>,
) -> Result<Raster> {
    let source = read_image(source_path).map_err(|source| ProxyError::Input {
        path: source_path.to_path_buf(),
        source,
    })?;
    let (cropped, plan) = normalize(&source, bleed, settings)?;
    info!(
        "{} - DPI calculated: {:.1}, cropping {} pixels around frame",
        source_path.display(),
        plan.dpi,
        plan.trim_px
    );
    Ok(cropped)
}

/// The two crop variants produced for each source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropStage {
    /// Trimmed exactly to the borderless card, stored in the crop directory.
    Borderless,
    /// Trimmed to the card plus a bleed margin, stored in a subdirectory.
    ///
    /// Requires the borderless output of the same source to exist.
    Bleed(BleedEdge),
}

impl CropStage {
    /// Stage for a bleed setting; a zero bleed is the borderless stage.
    pub fn for_bleed(bleed: BleedEdge) -> Self {
        if bleed.is_none() {
            CropStage::Borderless
        } else {
            CropStage::Bleed(bleed)
        }
    }

    /// Bleed margin this stage keeps.
    pub fn bleed(self) -> BleedEdge {
        match self {
            CropStage::Borderless => BleedEdge::NONE,
            CropStage::Bleed(bleed) => bleed,
        }
    }

    /// Directory this stage writes into.
    pub fn output_dir(self, crop_dir: &Path) -> PathBuf {
        match self.bleed().dir_name() {
            Some(segment) => crop_dir.join(segment),
            None => crop_dir.to_path_buf(),
        }
    }
}

/// Outcome of one crop stage over a source directory.
#[derive(Debug, Default)]
pub struct CropReport {
    /// Outputs written by this run.
    pub written: Vec<PathBuf>,
    /// Sources whose output already existed.
    pub skipped: usize,
    /// Bleed sources left alone because their borderless crop is missing.
    pub blocked: Vec<PathBuf>,
    /// Sources that failed, with the reason.
    pub failed: Vec<(PathBuf, ProxyError)>,
}

impl CropReport {
    /// Fold another stage's report into this one.
    pub fn merge(&mut self, other: CropReport) {
        self.written.extend(other.written);
        self.skipped += other.skipped;
        self.blocked.extend(other.blocked);
        self.failed.extend(other.failed);
    }
}

/// Batch cropper over a source directory.
pub struct Cropper<'a> {
    source_dir: PathBuf,
    crop_dir: PathBuf,
    settings: CropSettings<'a>,
}

impl<'a> Cropper<'a> {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        crop_dir: impl Into<PathBuf>,
        settings: CropSettings<'a>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            crop_dir: crop_dir.into(),
            settings,
        }
    }

    /// Run the borderless stage, then the bleed stage when `bleed` is non-zero.
    pub fn run(&self, bleed: BleedEdge) -> Result<CropReport> {
        let mut report = self.run_stage(CropStage::Borderless)?;
        if let stage @ CropStage::Bleed(_) = CropStage::for_bleed(bleed) {
            report.merge(self.run_stage(stage)?);
        }
        Ok(report)
    }

    /// Crop every source that lacks an output for `stage`.
    ///
    /// Per-file failures are collected in the report; only directory-level
    /// IO errors abort the batch.
    pub fn run_stage(&self, stage: CropStage) -> Result<CropReport> {
        let out_dir = stage.output_dir(&self.crop_dir);
        fs::create_dir_all(&out_dir)?;

        let mut report = CropReport::default();
        for source in self.source_files()? {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = out_dir.join(name);
            if target.exists() {
                debug!("{} already cropped, skipping", target.display());
                report.skipped += 1;
                continue;
            }
            if matches!(stage, CropStage::Bleed(_)) && !self.crop_dir.join(name).exists() {
                warn!(
                    "{} has no borderless crop, skipping bleed variant",
                    source.display()
                );
                report.blocked.push(source);
                continue;
            }

            match self.crop_one(&source, &target, stage.bleed()) {
                Ok(()) => report.written.push(target),
                Err(err) => {
                    warn!("{}: {err}", source.display());
                    report.failed.push((source, err));
                }
            }
        }
        Ok(report)
    }

    fn crop_one(&self, source: &Path, target: &Path, bleed: BleedEdge) -> Result<()> {
        let cropped = normalize_file(source, bleed, &self.settings)?;
        write_atomically(&cropped, target)
    }

    /// Supported image files directly inside the source directory, sorted.
    fn source_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.source_dir)? {
            let path = entry?.path();
            if path.is_file() && is_card_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Encode into a temporary file beside `target`, then move it into place.
///
/// A crash mid-write never leaves a partial image that a later run would
/// mistake for a finished crop.
fn write_atomically(raster: &Raster, target: &Path) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let suffix = target
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    let temp = tempfile::Builder::new()
        .prefix(".crop-")
        .suffix(&suffix)
        .tempfile_in(dir)?;
    write_image(raster, temp.path()).map_err(|source| ProxyError::Encode {
        path: target.to_path_buf(),
        source,
    })?;
    temp.persist(target)
        .map_err(|e| ProxyError::persistence(target, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::ColorLut3d;

    const NO_CEILING: CropSettings<'static> = CropSettings {
        max_dpi: 10_000,
        color_lut: None,
    };

    /// A bordered card scanned at `dpi`, black border around a gray face.
    fn scan(dpi: f64) -> Raster {
        let width = (CardSize::BORDERED.width_in * dpi).round() as u32;
        let height = (CardSize::BORDERED.height_in * dpi).round() as u32;
        let border = (BORDER_MARGIN_IN * dpi).round() as u32;
        let mut raster = Raster::filled(width, height, [0, 0, 0]);
        for y in border..height - border {
            for x in border..width - border {
                let idx = ((y * width + x) * 3) as usize;
                raster.pixels[idx..idx + 3].copy_from_slice(&[128, 128, 128]);
            }
        }
        raster
    }

    #[test]
    fn test_infer_border_pixels_300dpi() {
        assert_eq!(infer_border_pixels(816, 1110), 36);
    }

    #[test]
    fn test_infer_border_uses_limiting_axis() {
        // Extra height does not change the estimate
        assert_eq!(infer_border_pixels(816, 1500), 36);
        // Extra width neither
        assert_eq!(infer_border_pixels(1200, 1110), 36);
    }

    #[test]
    fn test_plan_borderless() {
        let plan = plan_crop(816, 1110, BleedEdge::NONE);
        assert_eq!(plan.border_px, 36);
        assert_eq!(plan.trim_px, 36);
        assert!((plan.dpi - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_plan_with_bleed_keeps_margin() {
        // 1.5mm at 300 DPI is 17.7 px, so 18 px of border remain trimmed
        let plan = plan_crop(816, 1110, BleedEdge::from_mm(1.5));
        assert_eq!(plan.border_px, 36);
        assert_eq!(plan.trim_px, 18);
    }

    #[test]
    fn test_plan_at_cap_trims_nothing() {
        let plan = plan_crop(816, 1110, BleedEdge::parse("5").unwrap());
        assert_eq!(plan.trim_px, 0);
    }

    #[test]
    fn test_normalize_borderless_size() {
        let (out, _) = normalize(&scan(100.0), BleedEdge::NONE, &NO_CEILING).unwrap();
        assert_eq!(out.dimensions(), (248, 346));
        // Border is entirely gone
        assert_eq!(out.pixel(0, 0), [128, 128, 128]);
        assert_eq!(out.pixel(247, 345), [128, 128, 128]);
    }

    #[test]
    fn test_normalize_bleed_keeps_border_pixels() {
        let (out, plan) = normalize(&scan(100.0), BleedEdge::from_mm(1.5), &NO_CEILING).unwrap();
        // 1.5mm at 100 DPI = 5.9 px, trim = round(12 - 5.9) = 6
        assert_eq!(plan.trim_px, 6);
        assert_eq!(out.dimensions(), (260, 358));
        assert_eq!(out.pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_normalize_downsamples_above_ceiling() {
        let settings = CropSettings {
            max_dpi: 150,
            color_lut: None,
        };
        let (out, plan) = normalize(&scan(300.0), BleedEdge::NONE, &settings).unwrap();
        assert!((plan.dpi - 300.0).abs() < 1e-6);
        assert_eq!(out.dimensions(), (372, 519));
    }

    #[test]
    fn test_normalize_at_ceiling_does_not_resample() {
        let settings = CropSettings {
            max_dpi: 300,
            color_lut: None,
        };
        let (out, _) = normalize(&scan(300.0), BleedEdge::NONE, &settings).unwrap();
        assert_eq!(out.dimensions(), (744, 1038));
    }

    #[test]
    fn test_normalize_applies_color_table() {
        let swap = ColorLut3d::from_rows(vec![
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
        ])
        .unwrap();
        let settings = CropSettings {
            max_dpi: 10_000,
            color_lut: Some(&swap),
        };
        let source = Raster::filled(272, 370, [255, 0, 0]);
        let (out, _) = normalize(&source, BleedEdge::NONE, &settings).unwrap();
        assert_eq!(out.pixel(10, 10), [0, 0, 255]);
    }

    #[test]
    fn test_normalize_bleed_then_ceiling_then_color_table() {
        let flat = ColorLut3d::from_rows(vec![[0.2, 0.4, 0.6]; 8]).unwrap();
        let settings = CropSettings {
            max_dpi: 150,
            color_lut: Some(&flat),
        };
        let (out, plan) = normalize(&scan(300.0), BleedEdge::from_mm(1.5), &settings).unwrap();
        // 816x1110 trimmed by 18 per edge is 780x1074, halved to 150 DPI
        assert_eq!(plan.trim_px, 18);
        assert_eq!(out.dimensions(), (390, 537));
        // Sharpening runs before the table, so nothing survives it
        assert!(out.pixels.chunks_exact(3).all(|px| px == [51, 102, 153]));
    }

    #[test]
    fn test_normalize_tiny_axis_trims_nothing() {
        // The short axis limits the estimate, so slivers keep every pixel
        let source = Raster::filled(4000, 2, [0, 0, 0]);
        let plan = plan_crop(4000, 2, BleedEdge::NONE);
        assert_eq!(plan.trim_px, 0);
        assert!(normalize(&source, BleedEdge::NONE, &NO_CEILING).is_ok());

        let tall_thin = Raster::filled(3, 4000, [0, 0, 0]);
        assert!(normalize(&tall_thin, BleedEdge::NONE, &NO_CEILING).is_ok());
    }

    #[test]
    fn test_crop_stage_dirs() {
        let crop = Path::new("/cards/crop");
        assert_eq!(CropStage::Borderless.output_dir(crop), crop);
        assert_eq!(
            CropStage::for_bleed(BleedEdge::from_mm(1.5)).output_dir(crop),
            crop.join("1p5")
        );
        assert_eq!(CropStage::for_bleed(BleedEdge::NONE), CropStage::Borderless);
    }

    fn write_png(path: &Path, raster: &Raster) {
        std::fs::write(path, crate::encode::encode_png(raster).unwrap()).unwrap();
    }

    #[test]
    fn test_batch_tolerates_bad_files_and_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let crop = images.join("crop");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("good.png"), &scan(100.0));
        std::fs::write(images.join("broken.png"), b"not an image").unwrap();
        std::fs::write(images.join("notes.txt"), b"ignored").unwrap();

        let cropper = Cropper::new(&images, &crop, NO_CEILING);
        let first = cropper.run(BleedEdge::NONE).unwrap();
        assert_eq!(first.written, vec![crop.join("good.png")]);
        assert_eq!(first.failed.len(), 1);
        assert!(matches!(first.failed[0].1, ProxyError::Input { .. }));

        let out = image::open(crop.join("good.png")).unwrap();
        assert_eq!((out.width(), out.height()), (248, 346));

        let second = cropper.run(BleedEdge::NONE).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.skipped, 1);
    }

    #[test]
    fn test_bleed_stage_writes_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let crop = images.join("crop");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("card.png"), &scan(100.0));

        let cropper = Cropper::new(&images, &crop, NO_CEILING);
        let report = cropper.run(BleedEdge::from_mm(1.5)).unwrap();
        assert_eq!(
            report.written,
            vec![crop.join("card.png"), crop.join("1p5").join("card.png")]
        );

        let bleed = image::open(crop.join("1p5").join("card.png")).unwrap();
        assert_eq!((bleed.width(), bleed.height()), (260, 358));
    }

    #[test]
    fn test_bleed_stage_requires_borderless_output() {
        let root = tempfile::tempdir().unwrap();
        let images = root.path().join("images");
        let crop = images.join("crop");
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("card.png"), &scan(100.0));

        let cropper = Cropper::new(&images, &crop, NO_CEILING);
        let report = cropper
            .run_stage(CropStage::Bleed(BleedEdge::from_mm(1.0)))
            .unwrap();
        assert!(report.written.is_empty());
        assert_eq!(report.blocked, vec![images.join("card.png")]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_inferred_dpi_tracks_true_dpi(dpi in 100.0f64..1200.0) {
            let width = (CardSize::BORDERED.width_in * dpi).round() as u32;
            let height = (CardSize::BORDERED.height_in * dpi).round() as u32;
            let plan = plan_crop(width, height, BleedEdge::NONE);
            // Rounding c to whole pixels moves the estimate by at most 0.5 / 0.12,
            // rounding the scan dimensions adds a little more
            prop_assert!((plan.dpi - dpi).abs() <= 0.5 / BORDER_MARGIN_IN + 0.5);
        }

        #[test]
        fn prop_trim_decreases_with_bleed(
            dpi in 100.0f64..1200.0,
            a in 0.0f64..3.05,
            b in 0.0f64..3.05,
        ) {
            let width = (CardSize::BORDERED.width_in * dpi).round() as u32;
            let height = (CardSize::BORDERED.height_in * dpi).round() as u32;
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            let trim_small = plan_crop(width, height, BleedEdge::from_mm(small)).trim_px;
            let trim_large = plan_crop(width, height, BleedEdge::from_mm(large)).trim_px;
            prop_assert!(trim_large <= trim_small);

            let at_cap = plan_crop(width, height, BleedEdge::from_mm(f64::MAX)).trim_px;
            prop_assert_eq!(at_cap, 0);
        }
    }
}
