//! Recompute scheduling
//!
//! Layout reads are expensive in the host, so recomputation is coalesced:
//! page breaks run on a trailing debounce, positional and height decisions
//! run at most once per rendered frame. The host calls `invalidate` /
//! `request` when something layout-affecting happens and `poll` /
//! `on_frame` from its timer or frame callback.

use std::time::{Duration, Instant};

use crate::block::{BlockId, LayoutProbe};
use crate::constants::FooterVariant;
use crate::page_break::{BreakMap, PageBreakCalculator};

/// Default trailing delay for page-break recomputation
pub const PAGE_BREAK_DEBOUNCE: Duration = Duration::from_millis(150);

/// Trailing-edge debouncer driven by caller-supplied timestamps
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register an invalidation; pushes the deadline out
    pub fn invalidate(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Whether work is waiting
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the quiet period has elapsed
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Consume a due invalidation
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Drop pending work
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Coalesces requests to at most one run per frame
#[derive(Debug, Clone, Default)]
pub struct FrameThrottle {
    dirty: bool,
}

impl FrameThrottle {
    /// Create an idle throttle
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a run on the next frame
    pub fn request(&mut self) {
        self.dirty = true;
    }

    /// Whether a run is queued
    pub fn is_pending(&self) -> bool {
        self.dirty
    }

    /// Frame callback; true when the caller should run now
    pub fn on_frame(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drop a queued run
    pub fn cancel(&mut self) {
        self.dirty = false;
    }
}

/// Layout-affecting events reported by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutInvalidation {
    /// Blocks were inserted, removed, reordered or edited
    ContentChanged,
    /// A block changed size without a content edit
    BlockResized,
    /// An image finished loading
    ImageLoaded,
    /// The footer variant was switched
    FooterChanged(FooterVariant),
    /// The page container was resized
    ContainerResized,
    /// The on-screen zoom changed
    ZoomChanged,
}

impl LayoutInvalidation {
    /// Whether the event can move page breaks
    ///
    /// Zoom is a display transform over unscaled layout, so it never does.
    pub fn affects_pagination(&self) -> bool {
        !matches!(self, Self::ZoomChanged)
    }
}

/// Result of a scheduled pagination pass
#[derive(Debug, Clone, PartialEq)]
pub struct PageBreakUpdate {
    /// Fresh break map
    pub breaks: BreakMap,
    /// Whether it differs from the previous pass
    pub changed: bool,
}

/// Debounced page-break recomputation
#[derive(Debug, Clone)]
pub struct PageBreakScheduler {
    calculator: PageBreakCalculator,
    debouncer: Debouncer,
    last: Option<BreakMap>,
    passes: u64,
}

impl Default for PageBreakScheduler {
    fn default() -> Self {
        Self::new(PageBreakCalculator::default())
    }
}

impl PageBreakScheduler {
    /// Scheduler with the default 150ms debounce
    pub fn new(calculator: PageBreakCalculator) -> Self {
        Self::with_delay(calculator, PAGE_BREAK_DEBOUNCE)
    }

    /// Scheduler with a custom debounce
    pub fn with_delay(calculator: PageBreakCalculator, delay: Duration) -> Self {
        Self {
            calculator,
            debouncer: Debouncer::new(delay),
            last: None,
            passes: 0,
        }
    }

    /// Report a layout-affecting event; returns whether a pass was scheduled
    pub fn invalidate(&mut self, event: LayoutInvalidation, now: Instant) -> bool {
        if let LayoutInvalidation::FooterChanged(variant) = event {
            self.calculator.set_footer(variant);
        }
        if !event.affects_pagination() {
            return false;
        }
        self.debouncer.invalidate(now);
        true
    }

    /// Run the pass if the debounce window has closed
    pub fn poll<P: LayoutProbe + ?Sized>(
        &mut self,
        now: Instant,
        blocks: &[BlockId],
        probe: &P,
    ) -> Option<PageBreakUpdate> {
        if !self.debouncer.take_due(now) {
            return None;
        }
        Some(self.run(blocks, probe))
    }

    /// Run a pass immediately, dropping any pending debounce
    pub fn flush<P: LayoutProbe + ?Sized>(
        &mut self,
        blocks: &[BlockId],
        probe: &P,
    ) -> PageBreakUpdate {
        self.debouncer.cancel();
        self.run(blocks, probe)
    }

    fn run<P: LayoutProbe + ?Sized>(&mut self, blocks: &[BlockId], probe: &P) -> PageBreakUpdate {
        let breaks = self.calculator.calculate(blocks, probe);
        let changed = self.last.as_ref() != Some(&breaks);
        self.last = Some(breaks.clone());
        self.passes += 1;
        PageBreakUpdate { breaks, changed }
    }

    /// Whether a pass is waiting for its debounce window
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Break map from the most recent pass
    pub fn last(&self) -> Option<&BreakMap> {
        self.last.as_ref()
    }

    /// Number of passes run so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Calculator in use
    pub fn calculator(&self) -> &PageBreakCalculator {
        &self.calculator
    }
}
