//! Page editing with lopdf: stamped text boxes and page selection.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, trace};

use super::extractor::{load_document, page_box, page_resources};
use super::{Rect, Result};
use crate::error::PdfError;

/// Line pitch as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Baseline of the first line below the box top, as a multiple of the font size.
const FIRST_BASELINE: f32 = 0.8;

/// Allowed overflow, in points, before text is considered not to fit.
const FIT_TOLERANCE: f32 = 0.01;

/// Standard fonts used for stamp text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StampFont {
    /// Courier.
    Mono,
    /// Courier-Bold.
    MonoBold,
    /// Helvetica.
    Helvetica,
}

impl StampFont {
    fn resource_name(&self) -> &'static str {
        match self {
            StampFont::Mono => "IcbcStampMono",
            StampFont::MonoBold => "IcbcStampMonoBold",
            StampFont::Helvetica => "IcbcStampHelv",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            StampFont::Mono => "Courier",
            StampFont::MonoBold => "Courier-Bold",
            StampFont::Helvetica => "Helvetica",
        }
    }

    /// Advance width of a character in 1/1000 of the font size.
    pub fn char_width(&self, ch: char) -> f32 {
        match self {
            StampFont::Mono | StampFont::MonoBold => 600.0,
            StampFont::Helvetica => match ch {
                '0'..='9' => 556.0,
                ' ' | ':' | ',' | '.' | '/' | 'i' | 'j' | 'l' | 't' | 'f' | 'I' => 278.0,
                'M' | 'W' | 'm' | 'w' => 833.0,
                'A'..='Z' => 667.0,
                _ => 556.0,
            },
        }
    }

    /// Rendered width of `text` at `size` points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|ch| self.char_width(ch)).sum::<f32>() / 1000.0 * size
    }

    fn dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

/// Horizontal alignment inside a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Text placed inside a rectangle on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Zero-based page index.
    pub page: u32,
    /// Target rectangle, top-left origin.
    pub rect: Rect,
    /// Text; `\n` separates lines.
    pub text: String,
    pub font: StampFont,
    /// Font size in points.
    pub size: f32,
    pub align: TextAlign,
}

impl TextBox {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// True when every line fits the width and all lines fit the height.
    pub fn fits(&self) -> bool {
        let line_count = self.lines().count() as f32;
        let widest = self
            .lines()
            .map(|line| self.font.text_width(line, self.size))
            .fold(0.0f32, f32::max);

        self.size > 0.0
            && widest <= self.rect.width() + FIT_TOLERANCE
            && line_count * self.size * LINE_HEIGHT <= self.rect.height() + FIT_TOLERANCE
    }

    /// Text operations in PDF user space for a page with the given MediaBox.
    fn operations(&self, media_box: &Rect) -> Vec<Operation> {
        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(self.font.resource_name().as_bytes().to_vec()),
                    Object::Real(self.size),
                ],
            ),
        ];

        for (i, line) in self.lines().enumerate() {
            let width = self.font.text_width(line, self.size);
            let left = match self.align {
                TextAlign::Left => self.rect.x0,
                TextAlign::Center => self.rect.x0 + (self.rect.width() - width) / 2.0,
                TextAlign::Right => self.rect.x1 - width,
            };
            let baseline = self.rect.y0 + self.size * (FIRST_BASELINE + LINE_HEIGHT * i as f32);

            let x = media_box.x0 + left;
            let y = media_box.y1 - baseline;
            ops.push(Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ));
            let encoded: Vec<u8> = line.chars().map(win_ansi_byte).collect();
            ops.push(Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]));
        }

        ops.push(Operation::new("ET", vec![]));
        ops
    }
}

/// In-memory PDF document being stamped.
pub struct PdfEditor {
    doc: Document,
}

impl PdfEditor {
    /// Load a PDF from bytes, decrypting empty-password documents.
    pub fn load(data: &[u8]) -> Result<Self> {
        let doc = load_document(data)?;
        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .get(&(index + 1))
            .copied()
            .ok_or(PdfError::InvalidPage(index))
    }

    /// Draw every box on its page. Existing page content is wrapped in `q`/`Q`
    /// so its graphics state cannot leak into the stamp.
    pub fn insert_text_boxes(&mut self, boxes: &[TextBox]) -> Result<()> {
        let mut by_page: BTreeMap<u32, Vec<&TextBox>> = BTreeMap::new();
        for text_box in boxes {
            by_page.entry(text_box.page).or_default().push(text_box);
        }

        for (index, page_boxes) in by_page {
            let page_id = self.page_id(index)?;
            let media_box = page_box(&self.doc, page_id);

            let mut fonts: Vec<StampFont> = page_boxes.iter().map(|b| b.font).collect();
            fonts.sort();
            fonts.dedup();
            self.ensure_fonts(page_id, &fonts)?;

            let operations: Vec<Operation> = page_boxes
                .iter()
                .flat_map(|b| b.operations(&media_box))
                .collect();
            self.append_content(page_id, operations)?;

            trace!("Stamped {} boxes on page {}", page_boxes.len(), index);
        }

        Ok(())
    }

    /// Add the stamp fonts to the page's own resource dictionary.
    fn ensure_fonts(&mut self, page_id: ObjectId, fonts: &[StampFont]) -> Result<()> {
        let mut resources = page_resources(&self.doc, page_id).unwrap_or_default();

        let mut font_dict = match resources.get(b"Font") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_dict)
                .cloned()
                .unwrap_or_default(),
            _ => Dictionary::new(),
        };
        for font in fonts {
            if !font_dict.has(font.resource_name().as_bytes()) {
                font_dict.set(font.resource_name(), Object::Dictionary(font.dictionary()));
            }
        }
        resources.set("Font", Object::Dictionary(font_dict));

        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    fn append_content(&mut self, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
        let stamp = Content { operations }
            .encode()
            .map_err(|e| PdfError::Edit(e.to_string()))?;

        let mut tail = b"\nQ\n".to_vec();
        tail.extend(stamp);

        let head_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let tail_id = self.doc.add_object(Stream::new(Dictionary::new(), tail));

        let existing = match self.page_dict_mut(page_id)?.get(b"Contents") {
            Ok(obj) => obj.clone(),
            Err(_) => Object::Array(vec![]),
        };
        let mut contents = match existing {
            Object::Reference(id) => match self.doc.get_object(id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(id)],
            },
            Object::Array(items) => items,
            _ => vec![],
        };
        contents.insert(0, Object::Reference(head_id));
        contents.push(Object::Reference(tail_id));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| PdfError::Edit(e.to_string()))
    }

    /// Keep only the pages at the given zero-based indices.
    pub fn retain_pages(&mut self, keep: &[u32]) -> Result<()> {
        let remove: Vec<u32> = self
            .doc
            .get_pages()
            .keys()
            .copied()
            .filter(|number| !keep.contains(&(number - 1)))
            .collect();

        if remove.len() as u32 == self.page_count() {
            return Err(PdfError::NoPages);
        }
        if !remove.is_empty() {
            debug!("Removing {} pages", remove.len());
            self.doc.delete_pages(&remove);
            self.doc.prune_objects();
        }
        Ok(())
    }

    /// Serialize the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| PdfError::Save(e.to_string()))?;
        Ok(buffer)
    }

    /// Write the document to `path`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| PdfError::Save(format!("{}: {}", path.display(), e)))
    }
}

/// Encode a character for a WinAnsiEncoding font, `?` when it has no code.
fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        c if (c as u32) < 0x100 => c as u8,
        _ => b'?',
    }
}
