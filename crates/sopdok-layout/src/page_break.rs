//! # Page Break Calculator
//!
//! Decides which blocks start a new A4 page. Heights are read from the
//! live layout through a [`LayoutProbe`] on every pass; nothing about a
//! block's size is cached between passes.
//!
//! ```text
//! ┌──────────────── page ────────────────┐
//! │ padding_top                          │  currentHeight starts here
//! │ block  (height + margin_bottom)      │
//! │ block                                │
//! │ ...                                  │  <= availableHeight
//! │ block_margin ─┐                      │
//! │ footer        ├─ protected area      │
//! │ padding_bottom┘                      │
//! └──────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use serde::Serialize;

use crate::block::{BlockId, LayoutProbe};
use crate::constants::{FooterVariant, PageGeometry};

/// Blocks that start a new page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BreakMap {
    breaks: Vec<BlockId>,
    #[serde(skip)]
    lookup: HashSet<BlockId>,
}

impl BreakMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    fn mark(&mut self, id: BlockId) {
        if self.lookup.insert(id.clone()) {
            self.breaks.push(id);
        }
    }

    /// Whether the given block begins a new page
    pub fn starts_new_page(&self, id: &BlockId) -> bool {
        self.lookup.contains(id)
    }

    /// Number of breaks (pages - 1)
    pub fn len(&self) -> usize {
        self.breaks.len()
    }

    /// True when everything fits on the first page
    pub fn is_empty(&self) -> bool {
        self.breaks.is_empty()
    }

    /// Break ids in document order
    pub fn iter(&self) -> impl Iterator<Item = &BlockId> {
        self.breaks.iter()
    }

    /// Group a block sequence into pages according to this map
    pub fn paginate(&self, blocks: &[BlockId]) -> Vec<Vec<BlockId>> {
        let mut pages: Vec<Vec<BlockId>> = Vec::new();
        for id in blocks {
            match pages.last_mut() {
                Some(page) if !(self.starts_new_page(id) && !page.is_empty()) => {
                    page.push(id.clone())
                }
                _ => pages.push(vec![id.clone()]),
            }
        }
        pages
    }
}

/// Diagnostics from a single calculation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationReport {
    /// Footer height used for the pass
    pub footer_height: f64,
    /// Whether the footer height came from the live layout
    pub footer_measured: bool,
    /// Height available to content on every page
    pub available_height: f64,
    /// Resulting breaks
    pub breaks: BreakMap,
    /// Blocks skipped because they could not be measured
    pub skipped: Vec<BlockId>,
    /// Blocks taller than a page, left to overflow
    pub oversized: Vec<BlockId>,
}

/// Page-break calculator for a page geometry and footer variant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBreakCalculator {
    geometry: PageGeometry,
    footer: FooterVariant,
}

impl Default for PageBreakCalculator {
    fn default() -> Self {
        Self::new(FooterVariant::default())
    }
}

impl PageBreakCalculator {
    /// Calculator for A4 pages with the given footer variant
    pub fn new(footer: FooterVariant) -> Self {
        Self::with_geometry(PageGeometry::a4(), footer)
    }

    /// Calculator with custom geometry
    pub fn with_geometry(geometry: PageGeometry, footer: FooterVariant) -> Self {
        Self { geometry, footer }
    }

    /// Active footer variant
    pub fn footer(&self) -> FooterVariant {
        self.footer
    }

    /// Switch the active footer variant
    pub fn set_footer(&mut self, footer: FooterVariant) {
        self.footer = footer;
    }

    /// Page geometry
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Footer height for this pass: measured if mounted, table otherwise
    pub fn footer_height<P: LayoutProbe + ?Sized>(&self, probe: &P) -> (f64, bool) {
        match probe.footer_height() {
            Some(height) if height > 0.0 => (height, true),
            _ => (self.footer.fallback_height(), false),
        }
    }

    /// Compute the break map
    pub fn calculate<P: LayoutProbe + ?Sized>(&self, blocks: &[BlockId], probe: &P) -> BreakMap {
        self.calculate_report(blocks, probe).breaks
    }

    /// Compute the break map along with pass diagnostics
    pub fn calculate_report<P: LayoutProbe + ?Sized>(
        &self,
        blocks: &[BlockId],
        probe: &P,
    ) -> PaginationReport {
        let (footer_height, footer_measured) = self.footer_height(probe);
        let available_height = self.geometry.available_height(footer_height);

        let mut report = PaginationReport {
            footer_height,
            footer_measured,
            available_height,
            breaks: BreakMap::new(),
            skipped: Vec::new(),
            oversized: Vec::new(),
        };

        if !probe.container_ready() {
            log::debug!("page container not mounted, skipping pagination pass");
            report.skipped = blocks.to_vec();
            return report;
        }

        let mut current_height = self.geometry.padding_top;
        let mut blocks_on_page = 0usize;

        for id in blocks {
            let Some(metrics) = probe.block_metrics(id) else {
                log::debug!("block {} not measurable yet, skipping", id);
                report.skipped.push(id.clone());
                continue;
            };

            let block_height = metrics.outer_height();
            if self.geometry.padding_top + block_height > available_height {
                report.oversized.push(id.clone());
            }

            if blocks_on_page > 0 && current_height + block_height > available_height {
                report.breaks.mark(id.clone());
                current_height = self.geometry.padding_top + block_height;
                blocks_on_page = 1;
            } else {
                current_height += block_height;
                blocks_on_page += 1;
            }
        }

        log::debug!(
            "pagination pass: {} blocks, {} breaks, footer {}px ({}), available {}px",
            blocks.len(),
            report.breaks.len(),
            footer_height,
            if footer_measured { "measured" } else { "fallback" },
            available_height
        );

        report
    }
}
