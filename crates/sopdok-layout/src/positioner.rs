//! Collision-aware placement of floating panels (dropdowns, menus)
//!
//! Placements for `bottom`, `top` and `right` are offsets relative to the
//! trigger element (the panel is positioned inside the trigger's box).
//! `left` placements are absolute document coordinates and therefore
//! include the viewport scroll offsets.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PANEL_HEIGHT, DEFAULT_PANEL_WIDTH, DROPDOWN_TEXT_OFFSET};
use crate::schedule::FrameThrottle;

/// Axis-aligned box in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Distance from the viewport's top edge, in px
    pub top: f64,
    /// Distance from the viewport's left edge, in px
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Box from its top-left corner and size; note `left` comes first
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// X coordinate of the right edge
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Y coordinate of the bottom edge
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Width and height of a rendered panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Measured width in px
    pub width: f64,
    /// Measured height in px
    pub height: f64,
}

impl Size {
    /// Size from measured width and height
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Estimate used before the panel has rendered once
    pub fn default_panel() -> Self {
        Self::new(DEFAULT_PANEL_WIDTH, DEFAULT_PANEL_HEIGHT)
    }
}

/// Visible window and its scroll offsets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Inner window width in px
    pub width: f64,
    /// Inner window height in px
    pub height: f64,
    /// Horizontal document scroll; only `left` placements use it
    #[serde(default)]
    pub scroll_x: f64,
    /// Vertical document scroll; only `left` placements use it
    #[serde(default)]
    pub scroll_y: f64,
}

impl Viewport {
    /// Unscrolled viewport of the given size
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Same viewport scrolled to the given offsets
    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }
}

/// Side of the trigger a panel opens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Bottom,
    Top,
    Left,
    Right,
}

/// Reference frame of a placement's offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateSpace {
    /// Offsets from the trigger's own box
    TriggerRelative,
    /// Document coordinates (viewport position plus scroll)
    ViewportAbsolute,
}

/// Computed panel position, expressed like CSS inset properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Inset values in px; `None` leaves the property unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    /// Side actually used after flipping
    pub side: Side,
    /// Frame the insets are measured in
    pub space: CoordinateSpace,
}

impl Placement {
    fn relative(side: Side) -> Self {
        Self {
            top: None,
            left: None,
            right: None,
            bottom: None,
            side,
            space: CoordinateSpace::TriggerRelative,
        }
    }
}

/// Everything needed to place one panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRequest {
    /// Trigger bounds in viewport coordinates
    pub trigger: Rect,
    /// Preferred side before any flip
    pub side: Side,
    /// Gap between trigger and panel, in px
    pub offset: f64,
    pub viewport: Viewport,
    /// Measured panel size; `None` before first render
    pub panel: Option<Size>,
}

impl PositionRequest {
    fn panel_size(&self) -> Size {
        match self.panel {
            Some(size) if size.width > 0.0 && size.height > 0.0 => size,
            _ => Size::default_panel(),
        }
    }
}

/// Compute a placement that keeps the panel on screen where possible
pub fn compute_placement(req: &PositionRequest) -> Placement {
    let panel = req.panel_size();
    match req.side {
        Side::Bottom => place_bottom(req, panel),
        Side::Top => place_top(req, panel),
        Side::Right => place_right(req, panel),
        Side::Left => place_left(req, panel),
    }
}

fn place_bottom(req: &PositionRequest, panel: Size) -> Placement {
    let trigger = req.trigger;
    let vp = req.viewport;
    let mut placement = Placement::relative(Side::Bottom);

    let below_overflows = trigger.bottom() + req.offset + panel.height > vp.height;
    let fits_above = trigger.top - req.offset - panel.height >= 0.0;

    if !below_overflows {
        placement.top = Some(trigger.height + req.offset);
    } else if fits_above {
        placement.bottom = Some(trigger.height + req.offset);
        placement.side = Side::Top;
    } else {
        placement.top = Some(clamp_relative(trigger.top, panel.height, vp.height));
    }

    if trigger.left + panel.width > vp.width {
        placement.right = Some(0.0);
    } else {
        placement.left = Some(0.0);
    }
    placement
}

fn place_top(req: &PositionRequest, panel: Size) -> Placement {
    let trigger = req.trigger;
    let mut placement = Placement::relative(Side::Top);
    placement.bottom = Some(trigger.height + req.offset);

    if trigger.left + DROPDOWN_TEXT_OFFSET + panel.width > req.viewport.width {
        placement.right = Some(0.0);
    } else {
        placement.left = Some(DROPDOWN_TEXT_OFFSET);
    }
    placement
}

fn place_right(req: &PositionRequest, panel: Size) -> Placement {
    let trigger = req.trigger;
    let vp = req.viewport;
    let mut placement = Placement::relative(Side::Right);

    let right_overflows = trigger.right() + req.offset + panel.width > vp.width;
    let fits_left = trigger.left - req.offset - panel.width >= 0.0;

    if !right_overflows {
        placement.left = Some(trigger.width + req.offset);
    } else if fits_left {
        placement.right = Some(trigger.width + req.offset);
        placement.side = Side::Left;
    } else {
        placement.left = Some(clamp_relative(trigger.left, panel.width, vp.width));
    }

    if trigger.top + panel.height > vp.height {
        placement.top = Some(clamp_relative(trigger.top, panel.height, vp.height));
    } else {
        placement.top = Some(0.0);
    }
    placement
}

fn place_left(req: &PositionRequest, panel: Size) -> Placement {
    let trigger = req.trigger;
    let vp = req.viewport;

    let left_x = trigger.left - req.offset - panel.width;
    let right_x = trigger.right() + req.offset;

    let (x, side) = if left_x >= 0.0 {
        (left_x, Side::Left)
    } else if right_x + panel.width <= vp.width {
        (right_x, Side::Right)
    } else {
        (left_x.min(vp.width - panel.width).max(0.0), Side::Left)
    };

    let y = if trigger.top + panel.height > vp.height {
        (vp.height - panel.height).max(0.0)
    } else {
        trigger.top.max(0.0)
    };

    Placement {
        top: Some(vp.scroll_y + y),
        left: Some(vp.scroll_x + x),
        right: None,
        bottom: None,
        side,
        space: CoordinateSpace::ViewportAbsolute,
    }
}

/// Offset (relative to a trigger edge at `start`) that pulls a panel of
/// `extent` back inside `[0, limit]`, preferring the far edge.
fn clamp_relative(start: f64, extent: f64, limit: f64) -> f64 {
    (limit - extent - start).max(-start)
}

/// Stateful positioner for one floating panel
///
/// Recomputes on open and on scroll/resize, at most once per frame.
#[derive(Debug, Clone)]
pub struct DropdownPositioner {
    side: Side,
    offset: f64,
    open: bool,
    throttle: FrameThrottle,
    placement: Option<Placement>,
}

impl DropdownPositioner {
    /// Closed positioner for a panel preferring `side`
    pub fn new(side: Side, offset: f64) -> Self {
        Self {
            side,
            offset,
            open: false,
            throttle: FrameThrottle::new(),
            placement: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the panel and queue a placement
    pub fn open(&mut self) {
        self.open = true;
        self.throttle.request();
    }

    /// Close the panel, dropping any queued placement
    pub fn close(&mut self) {
        self.open = false;
        self.throttle.cancel();
        self.placement = None;
    }

    /// Scroll or resize while open queues one recompute for the next frame
    pub fn on_scroll(&mut self) {
        if self.open {
            self.throttle.request();
        }
    }

    pub fn on_resize(&mut self) {
        if self.open {
            self.throttle.request();
        }
    }

    /// Frame callback. Returns a fresh placement when one was due and the
    /// trigger could be measured.
    pub fn on_frame(
        &mut self,
        trigger: Option<Rect>,
        viewport: Viewport,
        panel: Option<Size>,
    ) -> Option<Placement> {
        if !self.open || !self.throttle.on_frame() {
            return None;
        }
        let trigger = trigger?;
        let placement = compute_placement(&PositionRequest {
            trigger,
            side: self.side,
            offset: self.offset,
            viewport,
            panel,
        });
        self.placement = Some(placement);
        Some(placement)
    }

    /// Most recent placement
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }
}
