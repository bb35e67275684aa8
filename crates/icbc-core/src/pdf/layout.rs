//! Positioned page text: glyphs grouped into visual lines.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Rect;

/// Fraction of the font size two baselines may differ by and still share a row.
const BASELINE_TOLERANCE: f32 = 0.5;

/// Horizontal gap, in font sizes, rendered as a space.
const SPACE_GAP: f32 = 0.2;

/// Horizontal gap, in font sizes, that splits a row into separate lines.
const COLUMN_GAP: f32 = 3.0;

/// A single decoded character with its page position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Decoded character.
    pub ch: char,
    /// Glyph box, top-left origin.
    pub bbox: Rect,
    /// Baseline y, top-left origin.
    pub baseline: f32,
    /// Effective font size in points.
    pub size: f32,
}

impl Glyph {
    /// Center point of the glyph box.
    pub fn center(&self) -> (f32, f32) {
        (
            (self.bbox.x0 + self.bbox.x1) / 2.0,
            (self.bbox.y0 + self.bbox.y1) / 2.0,
        )
    }
}

/// A run of glyphs on one baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Line text with inter-word gaps rendered as spaces.
    pub text: String,
    /// Union of the glyph boxes.
    pub bbox: Rect,
}

/// All text on one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page number (1-indexed).
    pub number: u32,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// Glyphs in content-stream order.
    pub glyphs: Vec<Glyph>,
}

impl PageLayout {
    /// Create an empty page.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            glyphs: Vec::new(),
        }
    }

    /// Visual lines, top to bottom and left to right.
    pub fn lines(&self) -> Vec<TextLine> {
        group_lines(self.glyphs.iter())
    }

    /// Full page text, one visual line per text line.
    pub fn text(&self) -> String {
        join_lines(&self.lines())
    }

    /// Text of the glyphs whose center falls inside `rect`.
    pub fn clip_text(&self, rect: &Rect) -> String {
        let clipped = self.glyphs.iter().filter(|g| {
            let (x, y) = g.center();
            rect.contains(x, y)
        });
        join_lines(&group_lines(clipped))
    }

    /// Lines matching `pattern`.
    pub fn find_lines(&self, pattern: &Regex) -> Vec<TextLine> {
        self.lines()
            .into_iter()
            .filter(|line| pattern.is_match(&line.text))
            .collect()
    }

    /// True when the page holds no visible text.
    pub fn is_blank(&self) -> bool {
        self.glyphs.iter().all(|g| g.ch.is_whitespace())
    }
}

fn join_lines(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group glyphs into rows by baseline, then split rows on wide gaps.
fn group_lines<'a>(glyphs: impl Iterator<Item = &'a Glyph>) -> Vec<TextLine> {
    let mut sorted: Vec<&Glyph> = glyphs.collect();
    sorted.sort_by(|a, b| {
        a.baseline
            .partial_cmp(&b.baseline)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rows: Vec<Vec<&Glyph>> = Vec::new();
    let mut row_baseline = f32::NEG_INFINITY;
    for glyph in sorted {
        let tolerance = glyph.size.max(1.0) * BASELINE_TOLERANCE;
        match rows.last_mut() {
            Some(row) if (glyph.baseline - row_baseline).abs() <= tolerance => row.push(glyph),
            _ => {
                row_baseline = glyph.baseline;
                rows.push(vec![glyph]);
            }
        }
    }

    let mut lines = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| {
            a.bbox
                .x0
                .partial_cmp(&b.bbox.x0)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut current: Option<TextLine> = None;
        let mut last_x1 = f32::NEG_INFINITY;
        for glyph in row {
            let size = glyph.size.max(1.0);
            let gap = glyph.bbox.x0 - last_x1;

            match current.as_mut() {
                Some(line) if gap <= size * COLUMN_GAP => {
                    if gap > size * SPACE_GAP && !line.text.ends_with(' ') && !glyph.ch.is_whitespace() {
                        line.text.push(' ');
                    }
                    line.text.push(glyph.ch);
                    line.bbox = line.bbox.union(&glyph.bbox);
                    last_x1 = last_x1.max(glyph.bbox.x1);
                }
                _ => {
                    push_line(&mut lines, current.take());
                    current = Some(TextLine {
                        text: glyph.ch.to_string(),
                        bbox: glyph.bbox,
                    });
                    last_x1 = glyph.bbox.x1;
                }
            }
        }
        push_line(&mut lines, current);
    }

    lines
}

fn push_line(lines: &mut Vec<TextLine>, line: Option<TextLine>) {
    if let Some(mut line) = line {
        let trimmed = line.text.trim();
        if !trimmed.is_empty() {
            line.text = trimmed.to_string();
            lines.push(line);
        }
    }
}
