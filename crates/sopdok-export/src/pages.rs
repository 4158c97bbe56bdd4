//! Page extraction
//!
//! A paginated document marks every page with a `div` carrying the page
//! class. Extraction returns the outer markup of each page, in order.
//!
//! Two strategies sit behind [`extract_pages`]:
//!
//! 1. **Structural**: an XML event parse that understands HTML void
//!    elements. Any unbalanced or mismatched tag makes it give up.
//! 2. **Tag scan**: finds each page opening tag and walks `<div` / `</div>`
//!    tags counting depth until the page closes.
//!
//! The scan only runs when the structural pass found nothing. When neither
//! finds a page the whole document is treated as a single page.

use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::Serialize;
use sopdok_layout::constants::{PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
use tracing::{debug, warn};

/// Class that marks a page container
pub const DEFAULT_PAGE_CLASS: &str = "sop-page";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Which strategy produced the pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionStrategy {
    Structural,
    TagScan,
    /// No page markers; the full document is one page
    WholeDocument,
}

impl ExtractionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::TagScan => "tag-scan",
            Self::WholeDocument => "whole-document",
        }
    }
}

/// Extraction result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPages {
    pub pages: Vec<String>,
    pub strategy: ExtractionStrategy,
}

impl ExtractedPages {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Split a document into page fragments
pub fn extract_pages(html: &str, page_class: &str) -> ExtractedPages {
    let pages = structural_pages(html, page_class);
    if !pages.is_empty() {
        debug!(pages = pages.len(), "pages extracted structurally");
        return ExtractedPages {
            pages,
            strategy: ExtractionStrategy::Structural,
        };
    }

    let pages = scan_pages(html, page_class);
    if !pages.is_empty() {
        warn!(
            pages = pages.len(),
            "structural page extraction found nothing, used tag scan"
        );
        return ExtractedPages {
            pages,
            strategy: ExtractionStrategy::TagScan,
        };
    }

    warn!("no page containers found, exporting the document as one page");
    ExtractedPages {
        pages: vec![body_content(html).to_string()],
        strategy: ExtractionStrategy::WholeDocument,
    }
}

fn has_class(start: &BytesStart<'_>, class: &str) -> bool {
    start
        .attributes()
        .filter_map(|a| a.ok())
        .filter(|a| a.key.as_ref().eq_ignore_ascii_case(b"class"))
        .any(|a| {
            String::from_utf8_lossy(&a.value)
                .split_whitespace()
                .any(|c| c == class)
        })
}

/// Structural extraction. Returns no pages when the markup cannot be
/// parsed as balanced (X)HTML.
pub fn structural_pages(html: &str, page_class: &str) -> Vec<String> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.trim_text(false);

    let mut stack: Vec<String> = Vec::new();
    let mut pages = Vec::new();
    // Stack depth and byte offset of the open page
    let mut open_page: Option<(usize, usize)> = None;

    loop {
        // Events are not trimmed, so this is the `<` of the next tag.
        let tag_start = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "structural parse failed");
                return Vec::new();
            }
        };
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).to_lowercase();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                if open_page.is_none() && name == "div" && has_class(&start, page_class) {
                    open_page = Some((stack.len(), tag_start));
                }
                stack.push(name);
            }
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).to_lowercase();
                if open_page.is_none() && name == "div" && has_class(&start, page_class) {
                    pages.push(html[tag_start..end].to_string());
                }
            }
            Event::End(close) => {
                let name = String::from_utf8_lossy(close.local_name().as_ref()).to_lowercase();
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }
                if stack.pop().as_deref() != Some(name.as_str()) {
                    debug!(tag = %name, "mismatched closing tag");
                    return Vec::new();
                }
                if let Some((depth, page_start)) = open_page {
                    if stack.len() == depth {
                        pages.push(html[page_start..end].to_string());
                        open_page = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() || open_page.is_some() {
        debug!(unclosed = stack.len(), "document ended with open elements");
        return Vec::new();
    }
    pages
}

fn div_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<div\b([^>]*)>").unwrap())
}

fn div_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<(/?)div\b[^>]*?(/?)>").unwrap())
}

fn class_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
    })
}

fn head_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<head\b[^>]*>(.*?)</head\s*>").unwrap())
}

fn body_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").unwrap())
}

fn attrs_have_class(attrs: &str, class: &str) -> bool {
    class_attr_re().captures_iter(attrs).any(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .is_some_and(|m| m.as_str().split_whitespace().any(|c| c == class))
    })
}

/// Tag-depth scan over `div` tags
///
/// Only `div` nesting is tracked. A self-closing `<div/>` does not open a
/// level. A page whose closing tag never arrives is dropped and scanning
/// stops.
pub fn scan_pages(html: &str, page_class: &str) -> Vec<String> {
    let mut pages = Vec::new();
    let mut cursor = 0;

    while cursor < html.len() {
        let Some(open) = div_open_re().captures_at(html, cursor) else {
            break;
        };
        let (Some(tag), Some(attrs)) = (open.get(0), open.get(1)) else {
            break;
        };
        if !attrs_have_class(attrs.as_str(), page_class) || attrs.as_str().ends_with('/') {
            cursor = tag.end();
            continue;
        }

        let mut depth = 1usize;
        let mut close_end = None;
        for caps in div_tag_re().captures_iter(&html[tag.end()..]) {
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let self_closing = caps.get(2).is_some_and(|m| !m.as_str().is_empty());
            if closing {
                depth -= 1;
                if depth == 0 {
                    close_end = caps.get(0).map(|m| tag.end() + m.end());
                    break;
                }
            } else if !self_closing {
                depth += 1;
            }
        }

        match close_end {
            Some(end) => {
                pages.push(html[tag.start()..end].to_string());
                cursor = end;
            }
            None => {
                warn!(
                    offset = tag.start(),
                    "page container never closes, dropping it"
                );
                break;
            }
        }
    }
    pages
}

/// Inner markup of `<head>`, or empty when there is none
pub fn head_content(html: &str) -> &str {
    head_re()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// Inner markup of `<body>`, or the input when there is no body tag
pub fn body_content(html: &str) -> &str {
    body_re()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map_or(html, |m| m.as_str())
}

/// Pixel size of a page rendered at `scale`
pub fn scaled_viewport(scale: u32) -> (u32, u32) {
    let scale = scale.max(1) as f64;
    (
        (PAGE_WIDTH_PX * scale).round() as u32,
        (PAGE_HEIGHT_PX * scale).round() as u32,
    )
}

/// Standalone document for rendering one page
///
/// The viewport is the scaled page size and the page is enlarged with a
/// CSS transform, since the renderer has no device-scale option. The
/// source document's head is carried over so page styles apply.
pub fn page_shell(head: &str, fragment: &str, scale: u32) -> String {
    let (width, height) = scaled_viewport(scale);
    let scale = scale.max(1);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
{head}
<style>
html, body {{ margin: 0; padding: 0; width: {width}px; height: {height}px; overflow: hidden; background: #ffffff; }}
.sopdok-export-scale {{ width: {page_w}px; height: {page_h}px; transform: scale({scale}); transform-origin: top left; }}
.sopdok-export-scale > * {{ margin: 0 !important; box-shadow: none !important; }}
</style>
</head>
<body>
<div class="sopdok-export-scale">{fragment}</div>
</body>
</html>"#,
        page_w = PAGE_WIDTH_PX,
        page_h = PAGE_HEIGHT_PX,
    )
}

/// Standalone document for the whole body when it has no page containers
///
/// Same width and scaling as [`page_shell`], but nothing is clipped: the
/// scaled content overflows into the scroll area, which a full-page
/// capture includes.
pub fn document_shell(head: &str, body: &str, scale: u32) -> String {
    let (width, height) = scaled_viewport(scale);
    let scale = scale.max(1);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
{head}
<style>
html, body {{ margin: 0; padding: 0; width: {width}px; min-height: {height}px; background: #ffffff; }}
.sopdok-export-scale {{ width: {page_w}px; transform: scale({scale}); transform-origin: top left; }}
</style>
</head>
<body>
<div class="sopdok-export-scale">{body}</div>
</body>
</html>"#,
        page_w = PAGE_WIDTH_PX,
    )
}
