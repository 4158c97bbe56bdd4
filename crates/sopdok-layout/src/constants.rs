//! Page geometry and footer metrics
//!
//! All values are CSS pixels at 96 DPI in unscaled layout space. The
//! on-screen zoom factor never feeds into these numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A4 page width in CSS pixels (210mm at 96 DPI)
pub const PAGE_WIDTH_PX: f64 = 794.0;

/// A4 page height in CSS pixels (297mm at 96 DPI)
pub const PAGE_HEIGHT_PX: f64 = 1123.0;

/// A4 width in millimetres
pub const PAGE_WIDTH_MM: f64 = 210.0;

/// A4 height in millimetres
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// A4 width in inches, as expected by print engines
pub const PAGE_WIDTH_IN: f64 = 8.27;

/// A4 height in inches, as expected by print engines
pub const PAGE_HEIGHT_IN: f64 = 11.69;

/// Padding above the first block of every page
pub const PAGE_PADDING_TOP: f64 = 48.0;

/// Padding between the footer and the bottom page edge
pub const PAGE_PADDING_BOTTOM: f64 = 48.0;

/// Left and right page padding
pub const PAGE_PADDING_X: f64 = 56.0;

/// Vertical gap kept free between the last block and the footer
pub const BLOCK_MARGIN: f64 = 16.0;

/// Footer inner padding (top)
pub const FOOTER_PADDING_TOP: f64 = 8.0;

/// Footer inner padding (bottom)
pub const FOOTER_PADDING_BOTTOM: f64 = 8.0;

/// Horizontal offset of a `top` dropdown relative to the trigger's text
pub const DROPDOWN_TEXT_OFFSET: f64 = 8.0;

/// Panel size assumed before a floating panel has rendered once
pub const DEFAULT_PANEL_WIDTH: f64 = 220.0;

/// Panel height assumed before a floating panel has rendered once
pub const DEFAULT_PANEL_HEIGHT: f64 = 250.0;

/// Resolution multiplier used when rasterizing pages for export
pub const EXPORT_SCALE: u32 = 2;

/// Footer presentation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FooterVariant {
    /// Page number only
    Tiny,
    /// Document id, version and page number
    #[default]
    Small,
    /// Author / reviewer / approver signature grid
    Signature,
    /// Reserved space for a footer that is still being configured
    Placeholder,
}

impl FooterVariant {
    /// Content height used when the footer element is not mounted yet
    pub fn fallback_content_height(&self) -> f64 {
        match self {
            Self::Tiny => 24.0,
            Self::Small => 40.0,
            Self::Signature => 112.0,
            Self::Placeholder => 64.0,
        }
    }

    /// Full fallback height including footer padding
    pub fn fallback_height(&self) -> f64 {
        self.fallback_content_height() + FOOTER_PADDING_TOP + FOOTER_PADDING_BOTTOM
    }

    /// Stable lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Signature => "signature",
            Self::Placeholder => "placeholder",
        }
    }

    /// All variants
    pub fn all() -> &'static [FooterVariant] {
        &[Self::Tiny, Self::Small, Self::Signature, Self::Placeholder]
    }
}

impl fmt::Display for FooterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FooterVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "small" => Ok(Self::Small),
            "signature" => Ok(Self::Signature),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(format!("Unknown footer variant: {}", other)),
        }
    }
}

/// Page geometry used by the page-break calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page height
    pub height: f64,
    /// Padding above content
    pub padding_top: f64,
    /// Padding below the footer
    pub padding_bottom: f64,
    /// Gap reserved between content and footer
    pub block_margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 portrait geometry
    pub fn a4() -> Self {
        Self {
            height: PAGE_HEIGHT_PX,
            padding_top: PAGE_PADDING_TOP,
            padding_bottom: PAGE_PADDING_BOTTOM,
            block_margin: BLOCK_MARGIN,
        }
    }

    /// Space at the bottom of a page that content must not enter
    pub fn protected_area(&self, footer_height: f64) -> f64 {
        self.padding_bottom + footer_height + self.block_margin
    }

    /// Height available to content (top padding included in the running total)
    pub fn available_height(&self, footer_height: f64) -> f64 {
        self.height - self.protected_area(footer_height)
    }
}
