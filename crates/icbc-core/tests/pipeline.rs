mod common;

use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{file_names, hours_ago, pdf, text, write_form, write_with_mtime, Form};
use icbc_core::filing::archive::modified_date;
use icbc_core::filing::ARCHIVE_DIR;
use icbc_core::models::{FilerConfig, PageRegions};
use icbc_core::run_filing;
use icbc_core::scan::read_timestamp;

struct Dirs {
    _tmp: TempDir,
    input: std::path::PathBuf,
    output: std::path::PathBuf,
}

fn dirs() -> Dirs {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("Downloads");
    let output = tmp.path().join("Filed");
    fs::create_dir(&input).unwrap();
    fs::create_dir(&output).unwrap();
    Dirs { _tmp: tmp, input, output }
}

#[test]
fn test_files_plate_only_form_into_root() {
    let d = dirs();
    write_form(&d.input.join("scan001.pdf"), &Form::default(), hours_ago(1));

    let run = run_filing(&FilerConfig::default(), &d.input, &d.output, |_, _| {});

    assert_eq!(run.scan.classified.len(), 1);
    assert_eq!(run.copy.copied, vec![d.output.join("ABC123.pdf")]);
    assert_eq!(file_names(&d.output), vec!["ABC123.pdf"]);
    assert!(run.archived.is_none());
    assert!(run.reincrement.is_none());
}

#[test]
fn test_second_run_finds_nothing_new() {
    let d = dirs();
    write_form(&d.input.join("scan001.pdf"), &Form::default(), hours_ago(1));
    let config = FilerConfig::default();

    run_filing(&config, &d.input, &d.output, |_, _| {});
    let second = run_filing(&config, &d.input, &d.output, |_, _| {});

    assert!(second.copy.copied.is_empty());
    assert_eq!(second.copy.duplicates.len(), 1);
    assert_eq!(file_names(&d.output), vec!["ABC123.pdf"]);
}

#[test]
fn test_composite_name_with_insured() {
    let d = dirs();
    let form = Form {
        owner: Some("DOE JANE"),
        ..Default::default()
    };
    write_form(&d.input.join("scan001.pdf"), &form, hours_ago(1));

    let mut config = FilerConfig::default();
    run_filing(&config, &d.input, &d.output, |_, _| {});
    assert_eq!(file_names(&d.output), vec!["Jane Doe - ABC123.pdf"]);

    let other = dirs();
    write_form(&other.input.join("scan001.pdf"), &form, hours_ago(1));
    config.filing.use_alt_naming = false;
    run_filing(&config, &other.input, &other.output, |_, _| {});
    assert_eq!(file_names(&other.output), vec!["ABC123.pdf"]);
}

#[test]
fn test_only_transaction_forms_are_filed() {
    let d = dirs();
    write_form(&d.input.join("form.pdf"), &Form::default(), hours_ago(1));

    let mut plan = common::form_page(&Form {
        timestamp: "20240201120000",
        plate: Some("PLN999"),
        ..Default::default()
    });
    plan.push(text(430.0, 46.0, 6.0, "Payment Plan Agreement"));
    write_with_mtime(&d.input.join("plan.pdf"), &pdf(&[plan]), hours_ago(2));

    write_with_mtime(
        &d.input.join("letter.pdf"),
        &pdf(&[vec![text(40.0, 100.0, 10.0, "Hello world")]]),
        hours_ago(3),
    );
    write_with_mtime(&d.input.join("broken.pdf"), b"not a pdf", hours_ago(4));

    let run = run_filing(&FilerConfig::default(), &d.input, &d.output, |_, _| {});

    assert_eq!(run.scan.total(), 4);
    assert_eq!(run.scan.classified.len(), 1);
    assert_eq!(run.scan.payment_plans, vec![d.input.join("plan.pdf")]);
    assert_eq!(run.scan.non_matching, vec![d.input.join("letter.pdf")]);
    assert_eq!(run.scan.unreadable, vec![d.input.join("broken.pdf")]);
    assert_eq!(file_names(&d.output), vec!["ABC123.pdf"]);
}

#[test]
fn test_same_name_different_transactions_are_numbered_oldest_first() {
    let d = dirs();
    write_form(
        &d.input.join("older.pdf"),
        &Form {
            timestamp: "20240115093000",
            ..Default::default()
        },
        hours_ago(3),
    );
    write_form(
        &d.input.join("newer.pdf"),
        &Form {
            timestamp: "20240116100000",
            ..Default::default()
        },
        hours_ago(1),
    );

    run_filing(&FilerConfig::default(), &d.input, &d.output, |_, _| {});

    assert_eq!(file_names(&d.output), vec!["ABC123 (1).pdf", "ABC123.pdf"]);
    let regions = PageRegions::default();
    assert_eq!(
        read_timestamp(&d.output.join("ABC123.pdf"), &regions).as_deref(),
        Some("20240115093000")
    );
    assert_eq!(
        read_timestamp(&d.output.join("ABC123 (1).pdf"), &regions).as_deref(),
        Some("20240116100000")
    );
}

#[test]
fn test_copy_keeps_source_modified_date() {
    let d = dirs();
    let source = write_form(&d.input.join("scan001.pdf"), &Form::default(), hours_ago(30));

    run_filing(&FilerConfig::default(), &d.input, &d.output, |_, _| {});

    assert_eq!(
        modified_date(&d.output.join("ABC123.pdf")).unwrap(),
        modified_date(&source).unwrap()
    );
}

#[test]
fn test_producer_mapping_routes_to_subfolder() {
    let d = dirs();
    fs::create_dir(d.output.join("Jane Files")).unwrap();
    let form = Form {
        producer: Some("jd"),
        ..Default::default()
    };
    write_form(&d.input.join("scan001.pdf"), &form, hours_ago(1));

    let mut config = FilerConfig::default();
    config.producer_mapping.insert("JD".to_string(), "Jane Files".to_string());
    let run = run_filing(&config, &d.input, &d.output, |_, _| {});

    assert!(run.missing_folders.is_empty());
    assert_eq!(run.scan.classified[0].producer_code.as_deref(), Some("JD"));
    assert_eq!(file_names(&d.output.join("Jane Files")), vec!["ABC123.pdf"]);
    assert!(file_names(&d.output).is_empty());
}

#[test]
fn test_root_copy_is_refiled_next_to_its_namesakes() {
    let d = dirs();
    let client = d.output.join("Doe Family");
    fs::create_dir(&client).unwrap();
    fs::write(client.join("Jane Doe - OLD111.pdf"), b"earlier policy").unwrap();

    let form = Form {
        owner: Some("DOE JANE"),
        ..Default::default()
    };
    write_form(&d.input.join("scan001.pdf"), &form, hours_ago(1));

    let run = run_filing(&FilerConfig::default(), &d.input, &d.output, |_, _| {});

    let refile = run.refile.unwrap();
    assert_eq!(refile.moved.len(), 1);
    assert_eq!(refile.moved[0].to, client.join("Jane Doe - ABC123.pdf"));
    assert!(file_names(&d.output).is_empty());
    assert_eq!(
        file_names(&client),
        vec!["Jane Doe - ABC123.pdf", "Jane Doe - OLD111.pdf"]
    );
}

#[test]
fn test_old_files_are_archived_and_empty_folders_removed() {
    let d = dirs();
    write_form(&d.input.join("scan001.pdf"), &Form::default(), hours_ago(1));

    let stale = d.output.join("Smith").join("OLD777.pdf");
    let three_years = Duration::from_secs(3 * 366 * 24 * 3600);
    write_with_mtime(&stale, b"old", std::time::SystemTime::now() - three_years);
    let year = chrono::Datelike::year(&modified_date(&stale).unwrap());

    let run = run_filing(&FilerConfig::default(), &d.input, &d.output, |_, _| {});

    let archived = run.archived.unwrap();
    let expected = d
        .output
        .join(ARCHIVE_DIR)
        .join(year.to_string())
        .join("Smith")
        .join("OLD777.pdf");
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].to, expected);
    assert!(expected.is_file());

    let reincrement = run.reincrement.unwrap();
    assert_eq!(reincrement.removed_dirs, vec![d.output.join("Smith")]);
    assert_eq!(file_names(&d.output), vec!["ABC123.pdf"]);
}

#[test]
fn test_archiving_disabled() {
    let d = dirs();
    let stale = d.output.join("OLD777.pdf");
    write_with_mtime(&stale, b"old", std::time::SystemTime::now() - Duration::from_secs(3 * 366 * 24 * 3600));

    let mut config = FilerConfig::default();
    config.filing.archive_enabled = false;
    let run = run_filing(&config, &d.input, &d.output, |_, _| {});

    assert!(run.archived.is_none());
    assert!(stale.is_file());
}
