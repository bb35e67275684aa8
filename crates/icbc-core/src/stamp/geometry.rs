//! Where stamp text goes relative to the markers printed on the form.

use chrono::{NaiveDateTime, Timelike};

use crate::models::StampMarks;
use crate::pdf::{StampFont, TextAlign, TextBox};

/// Agency box relative to the "NOT VALID UNLESS STAMPED BY" line.
pub const VALIDATION_BOX_OFFSET: (f32, f32, f32, f32) = (-4.25, 23.77, 1.58, 58.95);
/// Date box relative to the agency box.
pub const DATE_BOX_OFFSET: (f32, f32, f32, f32) = (0.0, 13.0, 0.0, 0.0);
/// Time box relative to the "TIME OF VALIDATION" line.
pub const TIME_BOX_OFFSET: (f32, f32, f32, f32) = (0.0, 10.35, 0.0, 40.0);
/// Extra vertical shift of the time box for morning times.
pub const TIME_AM_SHIFT: f32 = -0.6;
/// Extra vertical shift of the time box for afternoon times.
pub const TIME_PM_SHIFT: f32 = 21.2;
/// Three-line agency-name box relative to the agency box.
pub const AGENCY_NAME_BOX_OFFSET: (f32, f32, f32, f32) = (3.0, 7.0, -3.0, 0.0);

const STAMP_FONT_SIZE: f32 = 9.0;
const TIME_FONT_SIZE: f32 = 6.0;
const AGENCY_NAME_SCALE: f32 = 60.0;

pub const DATE_FORMAT: &str = "%b %d, %Y";
pub const TIME_FORMAT: &str = "%I:%M";

/// Text to print in a stamp.
#[derive(Debug, Clone)]
pub struct StampText<'a> {
    pub agency_number: &'a str,
    /// Printed above the agency number when set and non-empty.
    pub agency_name: Option<&'a str>,
    /// Moment printed as the validation date and time.
    pub moment: NaiveDateTime,
}

/// All text boxes for one document.
pub fn stamp_boxes(marks: &StampMarks, text: &StampText<'_>) -> Vec<TextBox> {
    let mut boxes = Vec::new();
    let date = text.moment.format(DATE_FORMAT).to_string();

    for mark in &marks.validation_marks {
        let agency_rect = mark.bbox.offset(VALIDATION_BOX_OFFSET);

        match text.agency_name.filter(|name| !name.is_empty()) {
            Some(name) => {
                let size = STAMP_FONT_SIZE * agency_rect.width().min(agency_rect.height()) / AGENCY_NAME_SCALE;
                boxes.push(TextBox {
                    page: mark.page,
                    rect: agency_rect.offset(AGENCY_NAME_BOX_OFFSET),
                    text: format!("{}\n{}\n{}", name, text.agency_number, date),
                    font: StampFont::Mono,
                    size,
                    align: TextAlign::Center,
                });
            }
            None => {
                boxes.push(TextBox {
                    page: mark.page,
                    rect: agency_rect,
                    text: text.agency_number.to_string(),
                    font: StampFont::MonoBold,
                    size: STAMP_FONT_SIZE,
                    align: TextAlign::Center,
                });
                boxes.push(TextBox {
                    page: mark.page,
                    rect: agency_rect.offset(DATE_BOX_OFFSET),
                    text: date.clone(),
                    font: StampFont::Mono,
                    size: STAMP_FONT_SIZE,
                    align: TextAlign::Center,
                });
            }
        }
    }

    let shift = if text.moment.hour() < 12 { TIME_AM_SHIFT } else { TIME_PM_SHIFT };
    let time = text.moment.format(TIME_FORMAT).to_string();
    for mark in &marks.time_marks {
        let (dx0, dy0, dx1, dy1) = TIME_BOX_OFFSET;
        boxes.push(TextBox {
            page: mark.page,
            rect: mark.bbox.offset((dx0, dy0 + shift, dx1, dy1)),
            text: time.clone(),
            font: StampFont::Helvetica,
            size: TIME_FONT_SIZE,
            align: TextAlign::Right,
        });
    }

    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageMark;
    use crate::pdf::Rect;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn marks() -> StampMarks {
        StampMarks {
            agency_number: "X1234".to_string(),
            customer_copy_pages: vec![],
            validation_marks: vec![PageMark {
                page: 0,
                bbox: Rect::new(400.0, 600.0, 530.0, 608.0),
            }],
            time_marks: vec![PageMark {
                page: 1,
                bbox: Rect::new(400.0, 700.0, 480.0, 708.0),
            }],
        }
    }

    fn close(a: Rect, b: Rect) -> bool {
        [(a.x0, b.x0), (a.y0, b.y0), (a.x1, b.x1), (a.y1, b.y1)]
            .iter()
            .all(|(p, q)| (p - q).abs() < 1e-3)
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(hour, 30, 0).unwrap()
    }

    #[test]
    fn test_plain_stamp_boxes() {
        let text = StampText {
            agency_number: "X1234",
            agency_name: None,
            moment: at(9),
        };
        let boxes = stamp_boxes(&marks(), &text);

        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0].text, "X1234");
        assert_eq!(boxes[0].font, StampFont::MonoBold);
        assert!(close(boxes[0].rect, Rect::new(395.75, 623.77, 531.58, 666.95)));
        assert_eq!(boxes[1].text, "Jan 15, 2024");
        assert!(close(boxes[1].rect, Rect::new(395.75, 636.77, 531.58, 666.95)));
        assert_eq!(boxes[2].text, "09:30");
        assert_eq!(boxes[2].page, 1);
        assert_eq!(boxes[2].align, TextAlign::Right);
        assert!(boxes.iter().all(TextBox::fits));
    }

    #[test]
    fn test_afternoon_shifts_time_box() {
        let text = StampText {
            agency_number: "X1234",
            agency_name: None,
            moment: at(15),
        };
        let morning = stamp_boxes(&marks(), &StampText { moment: at(9), ..text.clone() });
        let afternoon = stamp_boxes(&marks(), &text);

        assert_eq!(afternoon[2].text, "03:30");
        let delta = afternoon[2].rect.y0 - morning[2].rect.y0;
        assert!((delta - (TIME_PM_SHIFT - TIME_AM_SHIFT)).abs() < 1e-3);
    }

    #[test]
    fn test_agency_name_box() {
        let text = StampText {
            agency_number: "X1234",
            agency_name: Some("Acme Insurance"),
            moment: at(9),
        };
        let boxes = stamp_boxes(&marks(), &text);

        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].text, "Acme Insurance\nX1234\nJan 15, 2024");
        // 9 * min(135.83, 43.18) / 60
        assert!((boxes[0].size - 6.477).abs() < 0.01);
        assert!(boxes[0].fits());

        let long = StampText {
            agency_name: Some("An Agency Name Far Too Long To Fit In The Stamp Box"),
            ..text
        };
        assert!(!stamp_boxes(&marks(), &long)[0].fits());
    }

    #[test]
    fn test_empty_agency_name_uses_plain_stamp() {
        let text = StampText {
            agency_number: "X1234",
            agency_name: Some(""),
            moment: at(9),
        };
        assert_eq!(stamp_boxes(&marks(), &text).len(), 3);
    }
}
