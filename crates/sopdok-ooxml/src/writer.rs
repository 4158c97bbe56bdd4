//! Page-image DOCX writer
//!
//! Builds a Word package in which every page is a single full-page picture.
//! The section has A4 size and zero margins, and pages are separated by
//! explicit page breaks so Word paginates exactly like the source.

use tracing::debug;

use crate::archive::OoxmlArchive;
use crate::error::{OoxmlError, Result};
use crate::image::{twips_to_emu, PageImage};
use crate::relationships::{
    escape_xml, Relationships, TYPE_CORE_PROPERTIES, TYPE_IMAGE, TYPE_OFFICE_DOCUMENT,
};

/// Page size and margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSetup {
    pub width_twips: u32,
    pub height_twips: u32,
    pub margin_twips: u32,
}

impl PageSetup {
    /// A4 portrait, no margins
    pub fn a4() -> Self {
        Self {
            width_twips: 11906,
            height_twips: 16838,
            margin_twips: 0,
        }
    }

    /// Printable box in EMUs
    pub fn content_extent_emu(&self) -> (i64, i64) {
        let w = self.width_twips.saturating_sub(2 * self.margin_twips);
        let h = self.height_twips.saturating_sub(2 * self.margin_twips);
        (twips_to_emu(w), twips_to_emu(h))
    }
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::a4()
    }
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

/// Collects page images and writes them out as a DOCX package
#[derive(Debug, Clone, Default)]
pub struct PageDocxWriter {
    title: Option<String>,
    setup: PageSetup,
    pages: Vec<PageImage>,
}

impl PageDocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document title stored in the core properties
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_page_setup(mut self, setup: PageSetup) -> Self {
        self.setup = setup;
        self
    }

    /// Append one page rendered as PNG
    pub fn add_page_png(&mut self, png: Vec<u8>) -> Result<()> {
        let page = PageImage::from_png(png)?;
        debug!(
            page = self.pages.len() + 1,
            width = page.width_px,
            height = page.height_px,
            "adding page image"
        );
        self.pages.push(page);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Assemble the package
    pub fn build(&self) -> Result<OoxmlArchive> {
        if self.pages.is_empty() {
            return Err(OoxmlError::EmptyDocument);
        }

        let mut archive = OoxmlArchive::new();
        archive.set_string("[Content_Types].xml", CONTENT_TYPES_XML);

        let mut package_rels = Relationships::new();
        package_rels.add("word/document.xml", TYPE_OFFICE_DOCUMENT);
        package_rels.add("docProps/core.xml", TYPE_CORE_PROPERTIES);
        archive.set_string("_rels/.rels", package_rels.to_xml());

        archive.set_string("docProps/core.xml", self.core_xml());

        let mut document_rels = Relationships::new();
        let mut rel_ids = Vec::with_capacity(self.pages.len());
        for (i, page) in self.pages.iter().enumerate() {
            let target = format!("media/page{}.png", i + 1);
            archive.set(format!("word/{}", target), page.data.clone());
            rel_ids.push(document_rels.add(target, TYPE_IMAGE));
        }
        archive.set_string("word/_rels/document.xml.rels", document_rels.to_xml());
        archive.set_string("word/document.xml", self.document_xml(&rel_ids));

        Ok(archive)
    }

    /// Assemble and serialize the package
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.build()?.to_bytes()
    }

    fn core_xml(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Document");
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>sopdok</dc:creator>
</cp:coreProperties>"#,
            escape_xml(title)
        )
    }

    fn document_xml(&self, rel_ids: &[String]) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<w:document "#);
        xml.push_str(r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#);
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
        );
        xml.push_str(
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
        );
        xml.push_str(r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#);
        xml.push_str(r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#);
        xml.push('\n');
        xml.push_str("<w:body>\n");

        let (max_cx, max_cy) = self.setup.content_extent_emu();
        for (i, (page, rel_id)) in self.pages.iter().zip(rel_ids).enumerate() {
            let (cx, cy) = page.fit_within(max_cx, max_cy);
            push_page_paragraph(&mut xml, i + 1, rel_id, cx, cy, i > 0);
        }

        self.push_section(&mut xml);
        xml.push_str("</w:body>\n");
        xml.push_str("</w:document>");
        xml
    }

    fn push_section(&self, xml: &mut String) {
        let m = self.setup.margin_twips;
        xml.push_str("<w:sectPr>\n");
        xml.push_str(&format!(
            "  <w:pgSz w:w=\"{}\" w:h=\"{}\"/>\n",
            self.setup.width_twips, self.setup.height_twips
        ));
        xml.push_str(&format!(
            "  <w:pgMar w:top=\"{m}\" w:right=\"{m}\" w:bottom=\"{m}\" w:left=\"{m}\" w:header=\"0\" w:footer=\"0\" w:gutter=\"0\"/>\n"
        ));
        xml.push_str("</w:sectPr>\n");
    }
}

/// One paragraph holding a page picture, preceded by a page break for all
/// pages after the first
fn push_page_paragraph(
    xml: &mut String,
    page_no: usize,
    rel_id: &str,
    cx: i64,
    cy: i64,
    break_before: bool,
) {
    xml.push_str("<w:p>\n");
    xml.push_str("  <w:pPr><w:spacing w:before=\"0\" w:after=\"0\" w:line=\"240\" w:lineRule=\"auto\"/></w:pPr>\n");
    xml.push_str("  <w:r>\n");
    if break_before {
        xml.push_str("    <w:br w:type=\"page\"/>\n");
    }
    xml.push_str("    <w:drawing>\n");
    xml.push_str(&format!(
        r#"      <wp:inline distT="0" distB="0" distL="0" distR="0">
        <wp:extent cx="{cx}" cy="{cy}"/>
        <wp:docPr id="{page_no}" name="Page {page_no}"/>
        <a:graphic>
          <a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">
            <pic:pic>
              <pic:nvPicPr>
                <pic:cNvPr id="{page_no}" name="page{page_no}.png"/>
                <pic:cNvPicPr/>
              </pic:nvPicPr>
              <pic:blipFill>
                <a:blip r:embed="{rel_id}"/>
                <a:stretch><a:fillRect/></a:stretch>
              </pic:blipFill>
              <pic:spPr>
                <a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>
                <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
              </pic:spPr>
            </pic:pic>
          </a:graphicData>
        </a:graphic>
      </wp:inline>
"#
    ));
    xml.push_str("    </w:drawing>\n");
    xml.push_str("  </w:r>\n");
    xml.push_str("</w:p>\n");
}

/// Build a DOCX from page PNGs in one call
pub fn assemble_pages(pages: Vec<Vec<u8>>, title: Option<&str>) -> Result<Vec<u8>> {
    let mut writer = PageDocxWriter::new();
    if let Some(title) = title {
        writer = writer.with_title(title);
    }
    for png in pages {
        writer.add_page_png(png)?;
    }
    writer.to_bytes()
}
