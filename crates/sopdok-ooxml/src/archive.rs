//! In-memory OOXML package
//!
//! A DOCX file is a ZIP archive of XML parts and media. Parts are kept in
//! memory keyed by path and written out in sorted order with a fixed
//! timestamp, so identical inputs produce identical bytes.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use crate::error::{OoxmlError, Result};

/// Represents an unpacked OOXML package
#[derive(Debug, Default, Clone)]
pub struct OoxmlArchive {
    /// All parts in the package, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl OoxmlArchive {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        Ok(Self { files })
    }

    /// Read a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Get a part's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a part's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get the main document part
    pub fn document_xml(&self) -> Result<&[u8]> {
        self.get("word/document.xml")
            .ok_or_else(|| OoxmlError::MissingFile("word/document.xml".to_string()))
    }

    /// Check if a part exists
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// All part paths, sorted
    pub fn file_list(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(|s| s.as_str()).collect();
        paths.sort_unstable();
        paths
    }

    /// Set or update a part
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a part from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Write the package to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for path in self.file_list() {
            zip.start_file(path, options)?;
            zip.write_all(&self.files[path])?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Serialize the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_operations() {
        let mut archive = OoxmlArchive::new();
        archive.set_string("word/document.xml", "<w:document/>");
        archive.set("word/media/page1.png", vec![1, 2, 3]);

        assert!(archive.contains("word/document.xml"));
        assert_eq!(archive.document_xml().unwrap(), b"<w:document/>");
        assert_eq!(
            archive.file_list(),
            vec!["word/document.xml", "word/media/page1.png"]
        );
    }

    #[test]
    fn test_missing_document_part() {
        let archive = OoxmlArchive::new();
        assert!(matches!(
            archive.document_xml(),
            Err(OoxmlError::MissingFile(_))
        ));
    }

    #[test]
    fn test_bytes_are_deterministic() {
        let mut a = OoxmlArchive::new();
        a.set_string("b.xml", "<b/>");
        a.set_string("a.xml", "<a/>");

        let mut b = OoxmlArchive::new();
        b.set_string("a.xml", "<a/>");
        b.set_string("b.xml", "<b/>");

        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
    }

    #[test]
    fn test_reads_back_written_package() {
        let mut archive = OoxmlArchive::new();
        archive.set_string("[Content_Types].xml", "<Types/>");
        let bytes = archive.to_bytes().unwrap();

        let reopened = OoxmlArchive::from_bytes(&bytes).unwrap();
        assert_eq!(
            reopened.get_string("[Content_Types].xml").as_deref(),
            Some("<Types/>")
        );
    }
}
