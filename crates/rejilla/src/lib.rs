//! Rejilla: a browser test harness for virtualized enterprise data grids.
//!
//! A virtualized grid only materializes a window of rows in the document at
//! any time, rows are addressable by several incompatible identity schemes,
//! and a failed lookup needs to say more than "not found". Rejilla
//! reconciles the three: lazy locators that resolve at call time, a row
//! matcher sum type with a fast path for structural identities and a slow
//! path for data-derived ones, and closest-match diagnostics on assertion
//! failures.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     REJILLA Architecture                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Assertions ── State ── Waits          (caller-facing surface)    │
//! │       │           │       │                                       │
//! │  Row Matching ── Cell Extraction       (fast/slow path split)     │
//! │       │           │                                               │
//! │  Locator Context ── Address Layer      (lazy handles, selectors)  │
//! │       │                                                           │
//! │  PageDriver trait ──► MockPage | CdpPage (chromiumoxide)          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rejilla::{GridHarness, RowMatcher};
//!
//! let grid = GridHarness::attach(page, "orders-grid").await?;
//! grid.wait_for_ready().await?;
//! grid.expect_row_contains([("status", "Active"), ("owner", "alice")]).await?;
//! grid.expect_sorted_by("amount", rejilla::SortDirection::Ascending).await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Address layer: structural selectors and attribute names for grid
/// landmarks. Public so tests and custom extensions can build the same
/// addresses the engine queries.
pub mod address;

mod assertion;
mod config;
mod driver;
mod enterprise;
mod extract;
mod harness;
mod locator;
mod matcher;
mod result;
mod state;
mod wait;

#[cfg(feature = "browser")]
mod browser;

pub use assertion::RowCountExpectation;
pub use config::{
    CellRenderer, ColumnConfig, GridConfig, Pinned, Timeouts, ValueExtractor,
    DEFAULT_CELL_EDIT_TIMEOUT_MS, DEFAULT_READY_TIMEOUT_MS, DEFAULT_ROW_LOAD_TIMEOUT_MS,
    DEFAULT_SCROLL_TIMEOUT_MS,
};
pub use driver::{BoundingBox, MockElement, MockPage, PageDriver, Point};
pub use enterprise::keyboard::NavKey;
pub use enterprise::MAX_TOGGLE_ALL_ITERATIONS;
pub use extract::normalize_text;
pub use harness::GridHarness;
pub use locator::{ElementLocator, GridContext};
pub use matcher::{
    canonical, closest_match, matches_cell_values, values_match, ClosestMatch, FieldMismatch,
    RowData, RowMatcher, RowPredicate,
};
pub use result::{RejillaError, RejillaResult};
pub use state::{GridState, SortDirection, SortEntry};
pub use wait::POLL_INTERVAL_MS;

#[cfg(feature = "browser")]
pub use browser::CdpPage;

/// Re-export of `serde_json::Value`, the carrier for cell values.
pub use serde_json::Value;
