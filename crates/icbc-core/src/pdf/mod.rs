//! PDF processing module: positioned text extraction and page editing.

mod editor;
mod extractor;
mod layout;

pub use editor::{PdfEditor, StampFont, TextAlign, TextBox};
pub use extractor::PdfExtractor;
pub use layout::{Glyph, PageLayout, TextLine};

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Axis-aligned rectangle in page points with a top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Check if a point lies inside the rectangle (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Add a per-edge offset `(dx0, dy0, dx1, dy1)`.
    pub fn offset(&self, delta: (f32, f32, f32, f32)) -> Rect {
        Rect::new(
            self.x0 + delta.0,
            self.y0 + delta.1,
            self.x1 + delta.2,
            self.y1 + delta.3,
        )
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }
}

/// Trait for PDF text sources.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Positioned text of a page (1-indexed).
    fn page_layout(&self, page: u32) -> Result<PageLayout>;

    /// Plain text of a page (1-indexed), one visual line per text line.
    fn extract_page_text(&self, page: u32) -> Result<String> {
        Ok(self.page_layout(page)?.text())
    }
}
