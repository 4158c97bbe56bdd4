//! Package relationships (`_rels/*.rels`)
//!
//! A part's relationships give every referenced part an id (`rId1`,
//! `rId2`, ...). The writer only ever appends, so the set is a plain list
//! kept in id order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};

/// Namespace of `.rels` parts
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Main document part
pub const TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Core document properties
pub const TYPE_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

/// Embedded picture
pub const TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Relationships of one part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

fn id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId")?.parse().ok()
}

fn attr_value(start: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    start
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a `.rels` part
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(xml)
            .map_err(|e| OoxmlError::InvalidPart(format!("relationships are not UTF-8: {}", e)))?;
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    let (Some(id), Some(target)) = (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                    else {
                        continue;
                    };
                    rels.entries.push(Relationship {
                        id,
                        rel_type: attr_value(&e, b"Type").unwrap_or_default(),
                        target,
                    });
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(rels)
    }

    /// Append a relationship, returning its new id
    pub fn add(&mut self, target: impl Into<String>, rel_type: impl Into<String>) -> String {
        let next = self
            .entries
            .iter()
            .filter_map(|r| id_number(&r.id))
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.into(),
            target: target.into(),
        });
        id
    }

    /// Target of a relationship id
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.target.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Ids of image relationships
    pub fn image_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|r| r.rel_type == TYPE_IMAGE)
            .map(|r| r.id.as_str())
            .collect()
    }

    /// Serialize as a `.rels` part
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Relationships xmlns=\"{}\">\n",
            RELATIONSHIPS_NS
        );
        for rel in &self.entries {
            xml.push_str(&format!(
                "  <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>\n",
                escape_xml(&rel.id),
                escape_xml(&rel.rel_type),
                escape_xml(&rel.target)
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// Escape text for XML content and attribute values
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
