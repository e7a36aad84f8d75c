//! Document emission.
//!
//! Layout pages are replayed onto a [`PageCanvas`]. The PDF canvas builds
//! the whole document in memory and only touches the target path on
//! [`PdfCanvas::finalize`], by persisting a temporary file from the same
//! directory. A failed render leaves any previous PDF untouched.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::decode::read_image;
use crate::encode::{encode_jpeg, DOCUMENT_JPEG_QUALITY};
use crate::error::{ProxyError, Result};
use crate::layout::{LineSegment, Page};

/// Drawing surface in points, origin bottom-left.
pub trait PageCanvas {
    /// Draw the image at `path` stretched to the rectangle.
    fn draw_image(&mut self, path: &Path, x: f64, y: f64, width: f64, height: f64) -> Result<()>;

    /// Stroke one dashed line.
    fn draw_line(&mut self, segment: &LineSegment) -> Result<()>;

    /// Close the current page and start a new one.
    fn new_page(&mut self) -> Result<()>;
}

/// Replay `pages` in order, resolving placements against `image_dir`.
///
/// The canvas starts on an open page, so zero pages still leave one empty
/// page behind.
pub fn emit_pages<C: PageCanvas + ?Sized>(
    pages: &[Page],
    image_dir: &Path,
    canvas: &mut C,
) -> Result<()> {
    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            canvas.new_page()?;
        }
        for placement in &page.placements {
            canvas.draw_image(
                &image_dir.join(&placement.image),
                placement.x,
                placement.y,
                placement.width,
                placement.height,
            )?;
        }
        for mark in &page.marks {
            for segment in mark.segments() {
                canvas.draw_line(&segment)?;
            }
        }
        debug!(
            "emitted page {} with {} cards",
            index + 1,
            page.placements.len()
        );
    }
    Ok(())
}

/// Lay `pages` into a new PDF at `target`.
pub fn write_pdf(
    pages: &[Page],
    image_dir: &Path,
    target: &Path,
    page_width: f64,
    page_height: f64,
) -> Result<PathBuf> {
    let mut canvas = PdfCanvas::open(target, page_width, page_height);
    emit_pages(pages, image_dir, &mut canvas)?;
    canvas.finalize()
}

// ============================================================================
// PDF Canvas
// ============================================================================

/// [`PageCanvas`] that writes a PDF with `lopdf`.
///
/// Images are re-encoded as JPEG and embedded once per distinct path, then
/// referenced from every page that shows them.
pub struct PdfCanvas {
    target: PathBuf,
    doc: Document,
    pages_id: ObjectId,
    page_width: f64,
    page_height: f64,
    page_ids: Vec<ObjectId>,
    operations: Vec<Operation>,
    page_xobjects: BTreeMap<String, ObjectId>,
    embedded: HashMap<PathBuf, (String, ObjectId)>,
}

impl PdfCanvas {
    /// Start a document of `page_width × page_height` point pages.
    pub fn open(target: impl Into<PathBuf>, page_width: f64, page_height: f64) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            target: target.into(),
            doc,
            pages_id,
            page_width,
            page_height,
            page_ids: Vec::new(),
            operations: Vec::new(),
            page_xobjects: BTreeMap::new(),
            embedded: HashMap::new(),
        }
    }

    fn embed(&mut self, path: &Path) -> Result<(String, ObjectId)> {
        if let Some(found) = self.embedded.get(path) {
            return Ok(found.clone());
        }

        let raster = read_image(path).map_err(|source| ProxyError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        let jpeg = encode_jpeg(&raster, DOCUMENT_JPEG_QUALITY).map_err(|source| {
            ProxyError::Encode {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(i64::from(raster.width)));
        dict.set("Height", Object::Integer(i64::from(raster.height)));
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

        let id = self.doc.add_object(Stream::new(dict, jpeg));
        let name = format!("Im{}", self.embedded.len() + 1);
        self.embedded
            .insert(path.to_path_buf(), (name.clone(), id));
        Ok((name, id))
    }

    /// Turn the buffered operations into a page object.
    fn flush_page(&mut self) -> Result<()> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        let bytes = content
            .encode()
            .map_err(|e| ProxyError::persistence(&self.target, e))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), bytes));

        let mut xobjects = Dictionary::new();
        for (name, id) in std::mem::take(&mut self.page_xobjects) {
            xobjects.set(name, Object::Reference(id));
        }
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                real(self.page_width),
                real(self.page_height),
            ]),
        );
        page.set("Contents", Object::Reference(content_id));
        page.set("Resources", Object::Dictionary(resources));
        self.page_ids.push(self.doc.add_object(page));
        Ok(())
    }

    /// Close the last page, write the file, and move it over the target.
    pub fn finalize(mut self) -> Result<PathBuf> {
        self.flush_page()?;

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set(
            "Kids",
            Object::Array(self.page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        pages.set("Count", Object::Integer(self.page_ids.len() as i64));
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let target = self.target.clone();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| ProxyError::persistence(&target, e))?;
        self.doc
            .save_to(&mut temp)
            .map_err(|e| ProxyError::persistence(&target, e))?;
        temp.persist(&target)
            .map_err(|e| ProxyError::persistence(&target, e))?;

        info!(
            "wrote {} ({} pages)",
            target.display(),
            self.page_ids.len()
        );
        Ok(target)
    }
}

impl PageCanvas for PdfCanvas {
    fn draw_image(&mut self, path: &Path, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let (name, id) = self.embed(path)?;
        self.page_xobjects.insert(name.clone(), id);
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(width),
                    real(0.0),
                    real(0.0),
                    real(height),
                    real(x),
                    real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn draw_line(&mut self, segment: &LineSegment) -> Result<()> {
        let [r, g, b] = segment.color.rgb();
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("RG", vec![real(r), real(g), real(b)]),
            Operation::new("w", vec![real(segment.width)]),
            Operation::new(
                "d",
                vec![
                    Object::Array(segment.dash.iter().map(|&d| real(d)).collect()),
                    real(segment.phase),
                ],
            ),
            Operation::new("m", vec![real(segment.x0), real(segment.y0)]),
            Operation::new("l", vec![real(segment.x1), real(segment.y1)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn new_page(&mut self) -> Result<()> {
        self.flush_page()
    }
}

#[inline]
fn real(value: f64) -> Object {
    Object::Real(value as _)
}
