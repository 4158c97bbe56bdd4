//! Editor-scoped UI contexts
//!
//! Zoom and header title live on an [`EditorContext`] owned by whichever
//! editor view creates it. Dropping the view drops its context.

use serde::{Deserialize, Serialize};

use crate::constants::FooterVariant;
use crate::schedule::{LayoutInvalidation, PageBreakScheduler};

/// Smallest display scale
pub const MIN_ZOOM: f64 = 0.5;

/// Largest display scale
pub const MAX_ZOOM: f64 = 2.0;

/// Increment used by zoom in/out
pub const ZOOM_STEP: f64 = 0.1;

/// On-screen display scale
///
/// Applies to rendering only. Layout measurements are taken in unscaled
/// space, so converting with [`ZoomContext::to_layout`] is required before
/// feeding screen distances into layout math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomContext {
    scale: f64,
}

impl Default for ZoomContext {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl ZoomContext {
    pub fn new(scale: f64) -> Self {
        let mut zoom = Self::default();
        zoom.set(scale);
        zoom
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the scale, clamped to the supported range. Returns whether it changed.
    pub fn set(&mut self, scale: f64) -> bool {
        let clamped = if scale.is_finite() {
            round_step(scale.clamp(MIN_ZOOM, MAX_ZOOM))
        } else {
            1.0
        };
        let changed = (clamped - self.scale).abs() > f64::EPSILON;
        self.scale = clamped;
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set(self.scale + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set(self.scale - ZOOM_STEP)
    }

    pub fn reset(&mut self) -> bool {
        self.set(1.0)
    }

    /// Layout pixels to screen pixels
    pub fn to_screen(&self, layout_px: f64) -> f64 {
        layout_px * self.scale
    }

    /// Screen pixels to layout pixels
    pub fn to_layout(&self, screen_px: f64) -> f64 {
        screen_px / self.scale
    }

    /// Scale as a whole percentage, for display
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

// Keeps repeated steps from drifting (0.1 + 0.2 != 0.3)
fn round_step(scale: f64) -> f64 {
    (scale * 100.0).round() / 100.0
}

/// Title shown in the document header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderContext {
    pub title: String,
}

impl HeaderContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Title, or a placeholder when unset
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            "Untitled"
        } else {
            title
        }
    }
}

/// State shared by one mounted editor view
#[derive(Debug, Clone, Default)]
pub struct EditorContext {
    pub zoom: ZoomContext,
    pub header: HeaderContext,
    pub pagination: PageBreakScheduler,
}

impl EditorContext {
    pub fn new(title: impl Into<String>, footer: FooterVariant) -> Self {
        let mut ctx = Self {
            header: HeaderContext::new(title),
            ..Self::default()
        };
        ctx.pagination
            .invalidate(LayoutInvalidation::FooterChanged(footer), std::time::Instant::now());
        ctx
    }

    /// Change zoom. Never reschedules pagination.
    pub fn set_zoom(&mut self, scale: f64) -> bool {
        let changed = self.zoom.set(scale);
        if changed {
            self.pagination
                .invalidate(LayoutInvalidation::ZoomChanged, std::time::Instant::now());
        }
        changed
    }
}
