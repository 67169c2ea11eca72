use std::fs;
use tempfile::TempDir;

use lectern_core::error::Error;
use lectern_extract::extract::{extract_text, list_ingestable_files, SourceArtifact};

/// Builds a one-page PDF containing "Hello World!" entirely in memory.
fn minimal_pdf_bytes() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello World!")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize pdf");
    bytes
}

#[test]
fn plain_text_is_decoded_verbatim() {
    let artifact = SourceArtifact::new("notes.txt", None, b"line one\nline two".to_vec());
    let text = extract_text(&artifact).expect("extract");
    assert_eq!(text, "line one\nline two");
}

#[test]
fn invalid_utf8_degrades_to_lossy() {
    let artifact = SourceArtifact::new("raw.txt", None, vec![0xff, 0xfe, b'h', b'i']);
    let text = extract_text(&artifact).expect("extract");
    assert!(text.contains("hi"));
    assert!(text.contains('\u{FFFD}'), "invalid bytes become replacements");
}

#[test]
fn pdf_garbage_is_an_extraction_error() {
    let artifact = SourceArtifact::new(
        "broken.pdf",
        Some("application/pdf".to_string()),
        b"this is not a pdf".to_vec(),
    );
    let err = extract_text(&artifact).expect_err("garbage must not parse");
    match err {
        Error::Extraction { artifact, .. } => assert_eq!(artifact, "broken.pdf"),
        other => panic!("expected Extraction, got {other:?}"),
    }
}

#[test]
fn mime_hint_alone_selects_the_pdf_path() {
    // Name without .pdf, but declared type says pdf: bytes must go through
    // the PDF parser and fail there, not decode as text.
    let artifact = SourceArtifact::new(
        "no-extension",
        Some("application/pdf".to_string()),
        b"plain words".to_vec(),
    );
    assert!(matches!(
        extract_text(&artifact),
        Err(Error::Extraction { .. })
    ));
}

#[test]
fn valid_pdf_yields_page_text() {
    let artifact = SourceArtifact::new("hello.pdf", None, minimal_pdf_bytes());
    let text = extract_text(&artifact).expect("extract pdf");
    assert!(text.contains("Hello"), "got: {text:?}");
}

#[test]
fn from_file_carries_name_and_mime() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("doc.md");
    fs::write(&path, "# heading").expect("write");

    let artifact = SourceArtifact::from_file(&path).expect("load");
    assert_eq!(artifact.name, "doc.md");
    assert_eq!(artifact.mime.as_deref(), Some("text/markdown"));
    assert_eq!(artifact.bytes, b"# heading");
}

#[test]
fn listing_filters_by_extension_and_sorts() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path();
    fs::create_dir(dir.join("sub")).expect("mkdir");
    fs::write(dir.join("b.txt"), "b").expect("write");
    fs::write(dir.join("a.md"), "a").expect("write");
    fs::write(dir.join("skip.rs"), "no").expect("write");
    fs::write(dir.join("sub").join("c.PDF"), "c").expect("write");

    let exts = vec!["txt".to_string(), "md".to_string(), "pdf".to_string()];
    let files = list_ingestable_files(dir, &exts);
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .map(|n| n.expect("utf8 name"))
        .collect();
    assert_eq!(names, vec!["a.md", "b.txt", "c.PDF"]);
}
