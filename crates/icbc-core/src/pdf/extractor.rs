//! Positioned text extraction using pdf-extract, with lopdf for document structure.

use std::cell::OnceCell;
use std::panic::{self, AssertUnwindSafe};

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};
use tracing::{debug, trace, warn};

use super::layout::{Glyph, PageLayout};
use super::{PdfProcessor, Rect, Result};
use crate::error::PdfError;

/// Ascent and descent as fractions of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// PDF content extractor using lopdf and pdf-extract.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    layouts: OnceCell<std::result::Result<Vec<PageLayout>, String>>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            layouts: OnceCell::new(),
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    /// Layouts of every page, collected in one pass over the document.
    fn layouts(&self) -> Result<&[PageLayout]> {
        self.layouts
            .get_or_init(|| collect_layouts(&self.raw_data))
            .as_deref()
            .map_err(|e| PdfError::Parse(e.clone()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let (doc, decrypted) = open_document(data)?;
        debug!("Loaded PDF with {} pages", doc.get_pages().len());

        // pdf-extract reads a plain copy of a decrypted document
        self.raw_data = if decrypted {
            let mut plain = doc.clone();
            plain.trailer.remove(b"Encrypt");
            let mut buffer = Vec::new();
            plain
                .save_to(&mut buffer)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            buffer
        } else {
            data.to_vec()
        };
        self.document = Some(doc);
        self.layouts = OnceCell::new();
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn page_layout(&self, page: u32) -> Result<PageLayout> {
        let doc = self.document()?;
        let page_id = *doc.get_pages().get(&page).ok_or(PdfError::InvalidPage(page))?;

        match self.layouts()?.iter().find(|layout| layout.number == page) {
            Some(layout) => Ok(layout.clone()),
            None => {
                let media_box = page_box(doc, page_id);
                Ok(PageLayout::new(page, media_box.width(), media_box.height()))
            }
        }
    }
}

/// Run pdf-extract over the whole document.
fn collect_layouts(data: &[u8]) -> std::result::Result<Vec<PageLayout>, String> {
    let doc = pdf_extract::Document::load_mem(data).map_err(|e| e.to_string())?;
    let mut collector = LayoutCollector::default();

    // pdf-extract panics on some malformed fonts and content streams
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::output_doc(&doc, &mut collector)));
    match outcome {
        Ok(Ok(())) => {
            trace!("Collected text for {} pages", collector.pages.len());
            Ok(collector.pages)
        }
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => {
            warn!("Text extraction aborted on a malformed page");
            Err("text extraction failed".to_string())
        }
    }
}

/// Receives characters from pdf-extract and records them as glyphs.
#[derive(Default)]
struct LayoutCollector {
    pages: Vec<PageLayout>,
    current: Option<PageLayout>,
    left: f64,
    top: f64,
}

impl OutputDev for LayoutCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.left = media_box.llx.min(media_box.urx);
        self.top = media_box.ury.max(media_box.lly);
        let width = (media_box.urx - media_box.llx).abs() as f32;
        let height = (media_box.ury - media_box.lly).abs() as f32;
        self.current = Some(PageLayout::new(page_num, width, height));
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        if let Some(page) = self.current.take() {
            trace!("Page {}: {} glyphs", page.number, page.glyphs.len());
            self.pages.push(page);
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        let Some(page) = self.current.as_mut() else {
            return Ok(());
        };

        let size = (font_size * trm.m21.hypot(trm.m22)) as f32;
        let advance = (width * font_size * trm.m11.hypot(trm.m12)) as f32;
        let x = (trm.m31 - self.left) as f32;
        let baseline = (self.top - trm.m32) as f32;

        // Ligatures arrive as several characters sharing one advance
        let count = char.chars().count().max(1) as f32;
        let step = advance / count;
        for (i, ch) in char.chars().enumerate() {
            let x0 = x + step * i as f32;
            page.glyphs.push(Glyph {
                ch,
                bbox: Rect::new(x0, baseline - size * ASCENT, x0 + step, baseline + size * DESCENT),
                baseline,
                size,
            });
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }
}

/// Parse a document, decrypting PDFs protected only by an empty user password.
pub(crate) fn load_document(data: &[u8]) -> Result<Document> {
    open_document(data).map(|(doc, _)| doc)
}

/// Like [`load_document`], also reporting whether the file was decrypted.
fn open_document(data: &[u8]) -> Result<(Document, bool)> {
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    if !doc.is_encrypted() {
        return Ok((doc, false));
    }
    if doc.decrypt("").is_err() {
        return Err(PdfError::Encrypted);
    }
    debug!("Decrypted PDF with empty password");
    Ok((doc, true))
}

/// Get resources dictionary for a page, handling inheritance.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    match inherited_attribute(doc, page_id, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Page MediaBox converted to a [`Rect`] in PDF user space (bottom-left origin).
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> Rect {
    let values: Option<Vec<f32>> = match inherited_attribute(doc, page_id, b"MediaBox") {
        Some(Object::Array(items)) => items
            .iter()
            .map(|o| doc.dereference(o).ok().and_then(|(_, o)| number(o)))
            .collect(),
        _ => None,
    };

    match values.as_deref() {
        Some([x0, y0, x1, y1]) => Rect::new(x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)),
        // US Letter
        _ => Rect::new(0.0, 0.0, 612.0, 792.0),
    }
}

/// Walk the page tree upward until `key` is found, dereferencing the value.
fn inherited_attribute(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(node_id);
    let mut depth = 0;
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            if let Ok((_, resolved)) = doc.dereference(value) {
                return Some(resolved.clone());
            }
        }
        current = match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => Some(*parent_id),
            _ => None,
        };
        depth += 1;
        if depth > 64 {
            break;
        }
    }
    None
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
