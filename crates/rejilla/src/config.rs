//! Grid configuration: normalization, validation, and defaults.
//!
//! A harness is configured either from a bare identifying string (address
//! only, every timeout defaulted) or from a structured [`GridConfig`] with
//! column metadata and renderer overrides. Configuration is immutable once a
//! harness is attached; defaults are merged at construction and two harness
//! instances can never interfere through shared mutable state.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::result::{RejillaError, RejillaResult};

/// Default timeout for structural readiness (30 seconds)
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for row loading (10 seconds)
pub const DEFAULT_ROW_LOAD_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for a cell entering edit mode (5 seconds)
pub const DEFAULT_CELL_EDIT_TIMEOUT_MS: u64 = 5_000;

/// Default settle time after a programmatic scroll (50ms)
pub const DEFAULT_SCROLL_TIMEOUT_MS: u64 = 50;

/// A caller-supplied function turning raw cell text into a normalized value.
pub type ValueExtractor = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Column pinning position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pinned {
    /// Not pinned
    #[default]
    None,
    /// Pinned to the left edge
    Left,
    /// Pinned to the right edge
    Right,
}

/// Timeout bounds for the synchronization engine, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Timeouts {
    /// Structural readiness (root + header present, loading overlay gone)
    pub ready_ms: u64,
    /// Row data arrival (waits, retrying assertions, block loads)
    pub row_load_ms: u64,
    /// Cell entering edit mode
    pub cell_edit_ms: u64,
    /// Settle time after a programmatic scroll step
    pub scroll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ready_ms: DEFAULT_READY_TIMEOUT_MS,
            row_load_ms: DEFAULT_ROW_LOAD_TIMEOUT_MS,
            cell_edit_ms: DEFAULT_CELL_EDIT_TIMEOUT_MS,
            scroll_ms: DEFAULT_SCROLL_TIMEOUT_MS,
        }
    }
}

impl Timeouts {
    /// Create defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the readiness timeout
    #[must_use]
    pub const fn with_ready(mut self, ms: u64) -> Self {
        self.ready_ms = ms;
        self
    }

    /// Set the row-load timeout
    #[must_use]
    pub const fn with_row_load(mut self, ms: u64) -> Self {
        self.row_load_ms = ms;
        self
    }

    /// Set the cell-edit timeout
    #[must_use]
    pub const fn with_cell_edit(mut self, ms: u64) -> Self {
        self.cell_edit_ms = ms;
        self
    }

    /// Set the scroll settle time
    #[must_use]
    pub const fn with_scroll(mut self, ms: u64) -> Self {
        self.scroll_ms = ms;
        self
    }
}

/// Declared metadata for one column
#[derive(Clone)]
pub struct ColumnConfig {
    /// Column identifier as carried by the widget's `col-id` attribute
    pub column_id: String,
    /// Human-readable header name, for diagnostics
    pub display_name: Option<String>,
    /// Pinning position
    pub pinned: Pinned,
    /// Free-form column type tag ("number", "date", ...)
    pub column_type: Option<String>,
    /// Explicit value extractor; highest priority in the renderer chain
    pub value_extractor: Option<ValueExtractor>,
}

impl fmt::Debug for ColumnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnConfig")
            .field("column_id", &self.column_id)
            .field("display_name", &self.display_name)
            .field("pinned", &self.pinned)
            .field("column_type", &self.column_type)
            .field("value_extractor", &self.value_extractor.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl ColumnConfig {
    /// Create column metadata with just an id
    #[must_use]
    pub fn new(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            display_name: None,
            pinned: Pinned::None,
            column_type: None,
            value_extractor: None,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the pinning position
    #[must_use]
    pub const fn with_pinned(mut self, pinned: Pinned) -> Self {
        self.pinned = pinned;
        self
    }

    /// Set the column type tag
    #[must_use]
    pub fn with_type(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = Some(column_type.into());
        self
    }

    /// Set an explicit value extractor
    #[must_use]
    pub fn with_value_extractor(
        mut self,
        extractor: impl Fn(&str) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.value_extractor = Some(Arc::new(extractor));
        self
    }
}

/// Explicit renderer configuration for one column: a sub-element address
/// inside the cell, plus an optional extraction function over its text.
#[derive(Clone)]
pub struct CellRenderer {
    /// Selector of the sub-element carrying the value, relative to the cell
    pub selector: String,
    /// Optional transform over the sub-element's raw text
    pub extractor: Option<ValueExtractor>,
}

impl fmt::Debug for CellRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRenderer")
            .field("selector", &self.selector)
            .field("extractor", &self.extractor.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl CellRenderer {
    /// Renderer reading the normalized text of a sub-element
    #[must_use]
    pub fn text_of(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            extractor: None,
        }
    }

    /// Renderer applying a transform to the sub-element's raw text
    #[must_use]
    pub fn extracting(
        selector: impl Into<String>,
        extractor: impl Fn(&str) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            selector: selector.into(),
            extractor: Some(Arc::new(extractor)),
        }
    }
}

/// Configuration identifying one grid instance.
///
/// Construct from a bare address string (`GridConfig::from("orders-grid")`)
/// for an all-defaults configuration, or build up a structured one with the
/// `with_*` methods. Validation happens when the harness attaches.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Address used to resolve the grid root: a structural selector, or a
    /// stable test-identifier attribute value
    pub address: String,
    /// Declared column metadata (optional; columns are discovered from the
    /// DOM when absent)
    pub columns: Vec<ColumnConfig>,
    /// Per-column renderer overrides keyed by column id
    pub cell_renderers: HashMap<String, CellRenderer>,
    /// Timeout bounds
    pub timeouts: Timeouts,
}

impl From<&str> for GridConfig {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for GridConfig {
    fn from(address: String) -> Self {
        Self::new(address)
    }
}

impl GridConfig {
    /// Create a configuration with default timeouts and no column metadata
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            columns: Vec::new(),
            cell_renderers: HashMap::new(),
            timeouts: Timeouts::default(),
        }
    }

    /// Declare a column
    #[must_use]
    pub fn with_column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare a renderer override for a column
    #[must_use]
    pub fn with_cell_renderer(
        mut self,
        column_id: impl Into<String>,
        renderer: CellRenderer,
    ) -> Self {
        let _ = self.cell_renderers.insert(column_id.into(), renderer);
        self
    }

    /// Replace the timeout bounds
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Look up declared metadata for a column
    #[must_use]
    pub fn column(&self, column_id: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    /// Validate the configuration, failing fast on malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`RejillaError::Configuration`] when the address is empty, a
    /// declared column id is empty, or two columns share an id.
    pub fn validate(&self) -> RejillaResult<()> {
        if self.address.trim().is_empty() {
            return Err(RejillaError::config("missing address"));
        }
        let mut seen = std::collections::HashSet::new();
        for column in &self.columns {
            if column.column_id.trim().is_empty() {
                return Err(RejillaError::config("invalid column id"));
            }
            if !seen.insert(column.column_id.as_str()) {
                return Err(RejillaError::config(format!(
                    "duplicate column id: {}",
                    column.column_id
                )));
            }
        }
        Ok(())
    }
}
