//! Page Document Tests
//!
//! Package-level checks on DOCX files assembled from page images.

use sopdok_ooxml::{assemble_pages, OoxmlArchive, PageDocxWriter, Relationships};

/// Signature plus IHDR chunk; enough for dimension sniffing
fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

#[test]
fn test_one_image_and_drawing_per_page() {
    let bytes = assemble_pages(vec![png(1588, 2246); 3], Some("SOP-007")).unwrap();
    let archive = OoxmlArchive::from_bytes(&bytes).unwrap();

    for n in 1..=3 {
        assert!(archive.contains(&format!("word/media/page{}.png", n)));
    }
    assert!(!archive.contains("word/media/page4.png"));

    let doc = archive.get_string("word/document.xml").unwrap();
    assert_eq!(doc.matches("<w:drawing>").count(), 3);
    assert_eq!(doc.matches("w:type=\"page\"").count(), 2);
}

#[test]
fn test_relationships_point_at_media() {
    let mut writer = PageDocxWriter::new();
    writer.add_page_png(png(800, 1130)).unwrap();
    writer.add_page_png(png(800, 1130)).unwrap();
    let archive = writer.build().unwrap();

    let rels =
        Relationships::parse(archive.get("word/_rels/document.xml.rels").unwrap()).unwrap();
    assert_eq!(rels.image_ids(), vec!["rId1", "rId2"]);
    assert_eq!(rels.get("rId2"), Some("media/page2.png"));

    let package = Relationships::parse(archive.get("_rels/.rels").unwrap()).unwrap();
    assert_eq!(package.get("rId1"), Some("word/document.xml"));
}

#[test]
fn test_page_images_are_stored_verbatim() {
    let first = png(10, 20);
    let bytes = assemble_pages(vec![first.clone()], None).unwrap();
    let archive = OoxmlArchive::from_bytes(&bytes).unwrap();
    assert_eq!(archive.get("word/media/page1.png"), Some(first.as_slice()));
}

#[test]
fn test_output_is_reproducible() {
    let pages = vec![png(100, 141), png(100, 141)];
    let a = assemble_pages(pages.clone(), Some("Same")).unwrap();
    let b = assemble_pages(pages, Some("Same")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_write_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.docx");

    let mut writer = PageDocxWriter::new().with_title("File test");
    writer.add_page_png(png(50, 70)).unwrap();
    let archive = writer.build().unwrap();
    archive
        .write_to(std::fs::File::create(&path).unwrap())
        .unwrap();

    let reopened = OoxmlArchive::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
    assert!(reopened.contains("[Content_Types].xml"));
    assert!(reopened
        .get_string("docProps/core.xml")
        .unwrap()
        .contains("File test"));
}
