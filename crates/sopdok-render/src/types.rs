//! Render option types
//!
//! Each option set knows how to express itself as the named form fields the
//! rendering service expects.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Settle delay applied before capture unless overridden
pub const DEFAULT_WAIT_DELAY: Duration = Duration::from_millis(1000);

/// Paper size in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl PaperSize {
    /// ISO A4 portrait
    pub fn a4() -> Self {
        Self {
            width_in: 8.27,
            height_in: 11.69,
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::a4()
    }
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    /// No margins at all; page layout is owned by the document
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Options for HTML → PDF conversion
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub paper: PaperSize,
    pub margins: Margins,
    /// Print CSS backgrounds and images
    pub print_background: bool,
    /// Use `@media print` rules instead of screen
    pub emulate_print_media: bool,
    /// Time given to fonts and async content before capture
    pub wait_delay: Duration,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::a4()
    }
}

impl PdfOptions {
    /// A4, zero margins, backgrounds on, print media
    pub fn a4() -> Self {
        Self {
            paper: PaperSize::a4(),
            margins: Margins::zero(),
            print_background: true,
            emulate_print_media: true,
            wait_delay: DEFAULT_WAIT_DELAY,
        }
    }

    pub fn with_wait_delay(mut self, delay: Duration) -> Self {
        self.wait_delay = delay;
        self
    }

    /// Multipart form fields for the conversion route
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("paperWidth", self.paper.width_in.to_string()),
            ("paperHeight", self.paper.height_in.to_string()),
            ("marginTop", self.margins.top.to_string()),
            ("marginBottom", self.margins.bottom.to_string()),
            ("marginLeft", self.margins.left.to_string()),
            ("marginRight", self.margins.right.to_string()),
            ("printBackground", self.print_background.to_string()),
        ];
        if self.emulate_print_media {
            fields.push(("emulatedMediaType", "print".to_string()));
        }
        fields.push(("waitDelay", format_delay(self.wait_delay)));
        fields
    }
}

/// Raster output format for screenshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Value of the `format` form field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(RenderError::InvalidOptions(format!(
                "unsupported image format: {}",
                other
            ))),
        }
    }
}

/// Options for HTML → image capture
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotOptions {
    /// Viewport width in device pixels
    pub width: u32,
    /// Viewport height in device pixels
    pub height: u32,
    pub format: ImageFormat,
    /// Clip the capture to the viewport instead of the full scroll height
    pub clip: bool,
    pub emulate_print_media: bool,
    pub wait_delay: Duration,
}

impl ScreenshotOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: ImageFormat::Png,
            clip: true,
            emulate_print_media: true,
            wait_delay: DEFAULT_WAIT_DELAY,
        }
    }

    /// Capture the full scroll height of the document
    pub fn full_page(width: u32, height: u32) -> Self {
        Self::new(width, height).with_clip(false)
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_wait_delay(mut self, delay: Duration) -> Self {
        self.wait_delay = delay;
        self
    }

    /// Reject sizes the service cannot capture
    pub fn validate(&self) -> crate::Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidOptions(format!(
                "screenshot viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Multipart form fields for the screenshot route
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("format", self.format.name().to_string()),
            ("clip", self.clip.to_string()),
        ];
        if self.emulate_print_media {
            fields.push(("emulatedMediaType", "print".to_string()));
        }
        fields.push(("waitDelay", format_delay(self.wait_delay)));
        fields
    }
}

/// Go-style duration string understood by the service
fn format_delay(delay: Duration) -> String {
    format!("{}ms", delay.as_millis())
}
