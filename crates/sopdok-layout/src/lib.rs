//! # sopdok-layout
//!
//! Layout decisions for paginated A4 SOP documents.
//!
//! Everything here is host-agnostic: measurements come in through the
//! [`LayoutProbe`] trait and recomputation is driven explicitly by the host
//! (`invalidate` when something changed, `poll` / `on_frame` from its timer
//! or frame callback).
//!
//! ## Components
//!
//! - [`PageBreakCalculator`]: which blocks start a new page
//! - [`compute_placement`] / [`DropdownPositioner`]: floating panel placement
//! - [`HeightEqualizer`]: two-column height equalization
//! - [`EditorContext`]: zoom and header state for one editor view
//!
//! ## Example
//!
//! ```
//! use sopdok_layout::{FooterVariant, MeasuredLayout, PageBreakCalculator};
//!
//! let layout = MeasuredLayout::new()
//!     .with_footer(56.0)
//!     .with_block("intro", 600.0, 16.0)
//!     .with_block("table", 500.0, 16.0);
//!
//! let calc = PageBreakCalculator::new(FooterVariant::Small);
//! let breaks = calc.calculate(&layout.block_ids(), &layout);
//! assert!(breaks.starts_new_page(&"table".into()));
//! ```

pub mod block;
pub mod constants;
pub mod context;
pub mod equalize;
pub mod page_break;
pub mod positioner;
pub mod schedule;

pub use block::{BlockId, BlockMetrics, LayoutProbe, MeasuredBlock, MeasuredLayout};
pub use constants::{FooterVariant, PageGeometry, EXPORT_SCALE, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
pub use context::{EditorContext, HeaderContext, ZoomContext};
pub use equalize::{should_equalize, EqualizeDecision, EqualizeThresholds, HeightEqualizer};
pub use page_break::{BreakMap, PageBreakCalculator, PaginationReport};
pub use positioner::{
    compute_placement, CoordinateSpace, DropdownPositioner, Placement, PositionRequest, Rect,
    Side, Size, Viewport,
};
pub use schedule::{
    Debouncer, FrameThrottle, LayoutInvalidation, PageBreakScheduler, PageBreakUpdate,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
