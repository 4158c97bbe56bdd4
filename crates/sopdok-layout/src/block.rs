//! Block identifiers and measurement sources

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a content block in document order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Create a block id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Rendered size of one block, read from the live layout
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetrics {
    /// Border-box height
    pub height: f64,
    /// Computed bottom margin
    #[serde(default)]
    pub margin_bottom: f64,
}

impl BlockMetrics {
    /// Create metrics for a block
    pub fn new(height: f64, margin_bottom: f64) -> Self {
        Self {
            height,
            margin_bottom,
        }
    }

    /// Vertical space the block occupies in the flow
    pub fn outer_height(&self) -> f64 {
        self.height + self.margin_bottom
    }
}

/// Source of live layout measurements
///
/// The host UI implements this over its rendered tree. Every method may
/// report "not available" while the tree is still settling; callers treat
/// that as a reason to skip, never to fail.
pub trait LayoutProbe {
    /// Whether the page container is mounted and measurable
    fn container_ready(&self) -> bool {
        true
    }

    /// Height of the rendered footer element, if mounted
    fn footer_height(&self) -> Option<f64>;

    /// Metrics of a block, if it is rendered
    fn block_metrics(&self, id: &BlockId) -> Option<BlockMetrics>;
}

/// One entry of a measurement snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuredBlock {
    /// Block id
    pub id: BlockId,
    /// Height, absent while the block has not rendered
    #[serde(default)]
    pub height: Option<f64>,
    /// Bottom margin
    #[serde(default)]
    pub margin_bottom: f64,
}

/// A frozen set of measurements
///
/// Used wherever the layout has been captured once (tests, the CLI, and
/// hosts that batch their DOM reads before computing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeasuredLayout {
    /// Whether the container was mounted when the snapshot was taken
    #[serde(default = "default_true")]
    pub container_ready: bool,
    /// Measured footer height
    pub footer_height: Option<f64>,
    /// Blocks in document order
    pub blocks: Vec<MeasuredBlock>,
    #[serde(skip)]
    index: HashMap<BlockId, usize>,
}

fn default_true() -> bool {
    true
}

impl MeasuredLayout {
    /// Create an empty snapshot with a mounted container
    pub fn new() -> Self {
        Self {
            container_ready: true,
            ..Self::default()
        }
    }

    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut layout: Self = serde_json::from_str(json)?;
        layout.reindex();
        Ok(layout)
    }

    /// Set the measured footer height
    pub fn with_footer(mut self, height: f64) -> Self {
        self.footer_height = Some(height);
        self
    }

    /// Append a measured block
    pub fn with_block(mut self, id: impl Into<BlockId>, height: f64, margin_bottom: f64) -> Self {
        self.push(MeasuredBlock {
            id: id.into(),
            height: Some(height),
            margin_bottom,
        });
        self
    }

    /// Append a block that has not rendered yet
    pub fn with_unmeasured(mut self, id: impl Into<BlockId>) -> Self {
        self.push(MeasuredBlock {
            id: id.into(),
            height: None,
            margin_bottom: 0.0,
        });
        self
    }

    /// Append a block entry
    pub fn push(&mut self, block: MeasuredBlock) {
        self.index.insert(block.id.clone(), self.blocks.len());
        self.blocks.push(block);
    }

    /// Block ids in document order
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id.clone()).collect()
    }

    fn reindex(&mut self) {
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id.clone(), i))
            .collect();
    }
}

impl LayoutProbe for MeasuredLayout {
    fn container_ready(&self) -> bool {
        self.container_ready
    }

    fn footer_height(&self) -> Option<f64> {
        self.footer_height
    }

    fn block_metrics(&self, id: &BlockId) -> Option<BlockMetrics> {
        let block = &self.blocks[*self.index.get(id)?];
        block
            .height
            .map(|height| BlockMetrics::new(height, block.margin_bottom))
    }
}
