//! Builds small transaction-form PDFs for the integration tests.
#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// One run of text: left edge, baseline from the top of the page, size, text.
pub struct Text {
    pub x: f32,
    pub top: f32,
    pub size: f32,
    pub text: String,
}

pub fn text(x: f32, top: f32, size: f32, text: impl Into<String>) -> Text {
    Text {
        x,
        top,
        size,
        text: text.into(),
    }
}

const PAGE_HEIGHT: f32 = 792.0;

fn text_operations(runs: &[Text]) -> Vec<Operation> {
    runs.iter()
        .flat_map(|run| {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Real(run.size)]),
                Operation::new("Td", vec![Object::Real(run.x), Object::Real(PAGE_HEIGHT - run.top)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(run.text.as_bytes().to_vec(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]
        })
        .collect()
}

/// A letter-size PDF with one page per entry, text set in Courier.
pub fn pdf(pages: &[Vec<Text>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ("FirstChar", Object::Integer(32)),
        ("LastChar", Object::Integer(126)),
        ("Widths", Object::Array(vec![Object::Integer(600); 95])),
    ]));
    let fonts = Dictionary::from_iter(vec![("F1", Object::Reference(font_id))]);
    let resources = Dictionary::from_iter(vec![("Font", Object::Dictionary(fonts))]);

    let kids: Vec<Object> = pages
        .iter()
        .map(|runs| {
            let content = Content {
                operations: text_operations(runs),
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Dictionary(resources.clone())),
            ]));
            Object::Reference(page_id)
        })
        .collect();

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Fields printed on the first page of a form.
pub struct Form<'a> {
    pub timestamp: &'a str,
    pub plate: Option<&'a str>,
    pub owner: Option<&'a str>,
    pub producer: Option<&'a str>,
    pub transaction_type: &'a str,
}

impl Default for Form<'_> {
    fn default() -> Self {
        Self {
            timestamp: "20240115093000",
            plate: Some("ABC123"),
            owner: None,
            producer: None,
            transaction_type: "NEW",
        }
    }
}

/// First-page runs for `form`; the timestamp sits inside the header region
/// and the producer code inside the footer region.
pub fn form_page(form: &Form<'_>) -> Vec<Text> {
    let mut runs = vec![text(410.0, 80.0, 6.0, format!("Transaction Timestamp {}", form.timestamp))];
    if let Some(plate) = form.plate {
        runs.push(text(40.0, 150.0, 10.0, format!("Licence Plate Number {}", plate)));
    }
    if let Some(owner) = form.owner {
        runs.push(text(40.0, 200.0, 10.0, "Owner"));
        runs.push(text(40.0, 215.0, 10.0, owner));
    }
    runs.push(text(40.0, 250.0, 10.0, format!("Transaction Type {}", form.transaction_type)));
    if let Some(producer) = form.producer {
        runs.push(text(200.0, 768.0, 6.0, format!("-{}-", producer)));
    }
    runs
}

/// Write a one-page form to `path` with the given modification time.
pub fn write_form(path: &Path, form: &Form<'_>, modified: SystemTime) -> PathBuf {
    write_with_mtime(path, &pdf(&[form_page(form)]), modified)
}

pub fn write_with_mtime(path: &Path, data: &[u8], modified: SystemTime) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
    File::options().write(true).open(path).unwrap().set_modified(modified).unwrap();
    path.to_path_buf()
}

/// `hours` before now.
pub fn hours_ago(hours: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(hours * 3600)
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
