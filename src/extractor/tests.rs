use super::*;
use std::fs;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("should write test file");
    path
}

#[test]
fn supported_file_detection() {
    assert!(is_supported_file(Path::new("policies.csv")));
    assert!(is_supported_file(Path::new("order.PDF")));
    assert!(is_supported_file(Path::new("data.json")));
    assert!(is_supported_file(Path::new("notes.txt")));

    assert!(!is_supported_file(Path::new("report.docx")));
    assert!(!is_supported_file(Path::new("archive.tar.gz")));
    assert!(!is_supported_file(Path::new("no_extension")));
}

#[test]
fn txt_extraction_returns_raw_contents() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "policy.txt", "Emissions standards for vehicles.\n");

    assert_eq!(extract_file(&path), "Emissions standards for vehicles.\n");
}

#[test]
fn json_extraction_pretty_prints() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "data.json", r#"{"policy":"Clean Air","year":2024}"#);

    let text = extract_file(&path);
    assert!(text.contains("\"policy\": \"Clean Air\""));
    assert!(text.contains("\"year\": 2024"));
    // Pretty printing spreads the object across lines
    assert!(text.lines().count() > 1);
}

#[test]
fn csv_extraction_renders_named_fields_per_record() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(
        &dir,
        "policies.csv",
        "Policy_Name,Policy_ID,Description,Status,Effective_Date\n\
         Clean Air Act,CAA-1970,Air quality regulation,Active,1970-12-31\n\
         Water Act,WA-1972,,Active,1972-10-18\n",
    );

    let text = extract_file(&path);

    assert!(text.contains("Policy: Clean Air Act"));
    assert!(text.contains("Policy ID: CAA-1970"));
    assert!(text.contains("Description: Air quality regulation"));
    assert!(text.contains("Status: Active"));
    assert!(text.contains("Effective Date: 1970-12-31"));

    // Missing description falls back to the placeholder
    assert!(text.contains("Description: No description provided."));

    // Two records produce exactly one separator between blocks
    assert_eq!(text.matches(POLICY_SEPARATOR).count(), 1);
}

#[test]
fn csv_extraction_handles_missing_columns() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(
        &dir,
        "partial.csv",
        "Policy_Name,Status\nClean Air Act,Active\n",
    );

    let text = extract_file(&path);

    assert!(text.contains("Policy: Clean Air Act"));
    assert!(text.contains("Status: Active"));
    assert!(text.contains("Policy ID: N/A"));
    assert!(text.contains("Effective Date: N/A"));
}

#[test]
fn unsupported_extension_yields_empty() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "report.docx", "binary-ish contents");

    assert_eq!(extract_file(&path), "");
}

#[test]
fn unreadable_file_yields_empty() {
    let path = Path::new("/nonexistent/policy.txt");
    assert_eq!(extract_file(path), "");
}

#[test]
fn malformed_pdf_yields_empty() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "broken.pdf", "this is not a pdf");

    assert_eq!(extract_file(&path), "");
}

#[test]
fn malformed_json_yields_empty() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = write_file(&dir, "broken.json", "{not valid json");

    assert_eq!(extract_file(&path), "");
}
