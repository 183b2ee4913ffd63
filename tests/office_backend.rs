#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use predicates::prelude::*;

use common::{cli, read_document_xml, write_docx};
use pdf_docx_convert::{Converter, Error, Office};

/// Mimics `soffice --headless --convert-to pdf --outdir DIR INPUT`.
const WRITES_STEM_PDF: &str = r#"#!/bin/sh
outdir="$5"
name=$(basename "$6")
printf '%%PDF-1.4 fake\n' > "$outdir/${name%.*}.pdf"
"#;

const FAILS: &str = r#"#!/bin/sh
echo "Error: source file could not be loaded" >&2
exit 3
"#;

const WRITES_NOTHING: &str = "#!/bin/sh\nexit 0\n";

fn fake_office(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("fake-office");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn docx2pdf(office: &Path, input: &Path, output: &Path) -> Assert {
    cli()
        .arg("docx2pdf")
        .arg(input)
        .arg(output)
        .args(["--backend", "office", "--office-bin"])
        .arg(office)
        .assert()
}

#[test]
fn generated_pdf_is_moved_to_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let office = fake_office(dir.path(), WRITES_STEM_PDF);
    let input = dir.path().join("report.docx");
    write_docx(&input, &["body"]);
    let out_dir = dir.path().join("out/nested");
    let output = out_dir.join("final.pdf");

    docx2pdf(&office, &input, &output)
        .success()
        .stdout(predicate::str::diff("SUCCESS\n"));
    assert!(output.exists());
    assert!(!out_dir.join("report.pdf").exists());
}

#[test]
fn matching_name_is_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let office = fake_office(dir.path(), WRITES_STEM_PDF);
    let input = dir.path().join("report.docx");
    write_docx(&input, &["body"]);
    let output = dir.path().join("out/report.pdf");

    docx2pdf(&office, &input, &output).success();
    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF-1.4 fake"));
}

#[test]
fn existing_output_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let office = fake_office(dir.path(), WRITES_STEM_PDF);
    let input = dir.path().join("report.docx");
    write_docx(&input, &["body"]);
    let output = dir.path().join("final.pdf");
    std::fs::write(&output, b"old").unwrap();

    docx2pdf(&office, &input, &output).success();
    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
}

#[test]
fn non_zero_exit_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let office = fake_office(dir.path(), FAILS);
    let input = dir.path().join("report.docx");
    write_docx(&input, &["body"]);
    let output = dir.path().join("out/final.pdf");

    docx2pdf(&office, &input, &output).code(1).stdout(
        predicate::str::starts_with("ERROR: LibreOffice conversion failed")
            .and(predicate::str::contains("source file could not be loaded")),
    );
    assert!(!output.exists());
}

#[test]
fn missing_office_binary_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("report.docx");
    write_docx(&input, &["body"]);
    let output = dir.path().join("final.pdf");

    docx2pdf(&dir.path().join("no-such-office"), &input, &output)
        .code(1)
        .stdout(predicate::str::starts_with("ERROR: LibreOffice conversion failed"));
}

#[test]
fn silent_success_without_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let office = fake_office(dir.path(), WRITES_NOTHING);
    let input = dir.path().join("report.docx");
    write_docx(&input, &["body"]);
    let output = dir.path().join("final.pdf");

    docx2pdf(&office, &input, &output)
        .code(1)
        .stdout(predicate::str::diff("ERROR: Expected output PDF was not created\n"));
}

#[test]
fn office_backend_creates_directory_for_pdf_to_docx() {
    let dir = tempfile::tempdir().unwrap();
    let docx = dir.path().join("source.docx");
    let pdf = dir.path().join("source.pdf");
    write_docx(&docx, &["Office backend"]);
    pdf_docx_convert::convert_docx_to_pdf(&docx, &pdf).unwrap();

    let converter = Office {
        binary: dir.path().join("unused"),
    };
    let output = dir.path().join("a/b/c/result.docx");
    converter.pdf_to_docx(&pdf, &output).unwrap();
    assert!(read_document_xml(&output).contains("Office"));
}

#[test]
fn library_api_returns_missing_output_error() {
    let dir = tempfile::tempdir().unwrap();
    let converter = Office {
        binary: fake_office(dir.path(), WRITES_NOTHING),
    };
    let input = dir.path().join("x.docx");
    write_docx(&input, &["x"]);
    let err = converter
        .docx_to_pdf(&input, &dir.path().join("x.pdf"))
        .unwrap_err();
    assert!(matches!(err, Error::MissingOutput));
}

/// Leaves a marker next to itself so a test can tell whether it ran.
const RECORDS_CALL: &str = r#"#!/bin/sh
touch "$(dirname "$0")/called"
"#;

#[test]
fn input_without_stem_is_rejected_before_office_runs() {
    let dir = tempfile::tempdir().unwrap();
    let office = fake_office(dir.path(), RECORDS_CALL);
    let converter = Office { binary: office };

    let err = converter
        .docx_to_pdf(Path::new(".."), &dir.path().join("out/x.pdf"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocx(_)));
    assert!(!dir.path().join("called").exists());
}
