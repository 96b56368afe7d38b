//! Row matching engine: resolve a [`RowMatcher`] into zero-or-one visible row.
//!
//! Matchers split into two families. *Direct* matchers (aria position, stable
//! id, viewport index) resolve through a single structural query: one
//! round-trip, independent of row count. *Derived* matchers (cell values,
//! predicate) must first materialize [`RowData`] for every currently visible
//! row, bounded by the virtualization window rather than the dataset.
//!
//! Matching never throws on absence: `None` means "not in the viewport right
//! now", and the wait/assertion layers decide whether that is an error.
//! Because virtualization makes "not found" frequently a near-miss, failed
//! cell-value lookups can be rescored into a closest-match diagnostic naming
//! the best candidate and its mismatched fields.

use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::address;
use crate::extract::{self, normalize_text};
use crate::locator::GridContext;
use crate::result::RejillaResult;

/// Caller-supplied row predicate for derived matching
pub type RowPredicate = Arc<dyn Fn(&RowData) -> bool + Send + Sync>;

/// Point-in-time reading of one visible row.
///
/// Created fresh on every read and never cached across calls; the grid is a
/// moving target under virtualization.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RowData {
    /// Zero-based position within the viewport
    pub viewport_index: u32,
    /// One-based ARIA position (header rows included)
    pub aria_position: u32,
    /// Stable id from the widget's row model, when assigned
    pub stable_id: Option<String>,
    /// Normalized cell values keyed by column id
    pub cells: BTreeMap<String, Value>,
    /// Whether this is a group row
    pub is_group_row: bool,
    /// Expansion state, when the row is expandable
    pub is_expanded: Option<bool>,
    /// Tree/group nesting depth, when reported
    pub group_level: Option<u32>,
}

impl RowData {
    /// Cell value for a column, `Null` when the column was not read
    #[must_use]
    pub fn cell(&self, column_id: &str) -> &Value {
        self.cells.get(column_id).unwrap_or(&Value::Null)
    }
}

/// A row-selection criterion: exactly one discriminant.
///
/// The first three variants are direct (structural address, no data reads);
/// the last two are derived (require materializing every visible row first).
#[derive(Clone)]
pub enum RowMatcher {
    /// One-based ARIA position
    AriaPosition(u32),
    /// Stable row id
    StableId(String),
    /// Zero-based viewport index
    ViewportIndex(u32),
    /// Every listed column must match the row's normalized value
    CellValues(BTreeMap<String, Value>),
    /// Arbitrary predicate over the materialized row
    Predicate(RowPredicate),
}

impl fmt::Debug for RowMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for RowMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AriaPosition(n) => write!(f, "aria position {n}"),
            Self::StableId(id) => write!(f, "stable id {id:?}"),
            Self::ViewportIndex(n) => write!(f, "viewport index {n}"),
            Self::CellValues(map) => {
                write!(f, "cell values {{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Predicate(_) => write!(f, "predicate"),
        }
    }
}

impl RowMatcher {
    /// Match by one-based ARIA position
    #[must_use]
    pub const fn aria_position(position: u32) -> Self {
        Self::AriaPosition(position)
    }

    /// Match by stable row id
    #[must_use]
    pub fn stable_id(id: impl Into<String>) -> Self {
        Self::StableId(id.into())
    }

    /// Match by zero-based viewport index
    #[must_use]
    pub const fn viewport_index(index: u32) -> Self {
        Self::ViewportIndex(index)
    }

    /// Match by expected cell values
    #[must_use]
    pub fn cell_values<K, V, I>(expected: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::CellValues(
            expected
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Match by predicate over the materialized row
    #[must_use]
    pub fn predicate(f: impl Fn(&RowData) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Whether this matcher resolves via a single structural address
    #[must_use]
    pub const fn is_direct(&self) -> bool {
        matches!(
            self,
            Self::AriaPosition(_) | Self::StableId(_) | Self::ViewportIndex(_)
        )
    }
}

// =============================================================================
// VALUE NORMALIZATION
// =============================================================================

/// Canonical comparison form of a cell value: case-insensitive, whitespace
/// collapsed, with `null` and the empty string mutually equal.
#[must_use]
pub fn canonical(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => normalize_text(s).to_lowercase(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Whether two cell values are equal under normalization
#[must_use]
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    canonical(expected) == canonical(actual)
}

/// Whether every key in `expected` normalizes equal to the row's
/// corresponding cell; keys absent from `expected` are ignored.
#[must_use]
pub fn matches_cell_values(row: &RowData, expected: &BTreeMap<String, Value>) -> bool {
    expected
        .iter()
        .all(|(column, value)| values_match(value, row.cell(column)))
}

// =============================================================================
// CLOSEST-MATCH DIAGNOSTICS
// =============================================================================

/// One mismatched field in a closest-match diagnostic
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FieldMismatch {
    /// Column id
    pub field: String,
    /// Expected value
    pub expected: Value,
    /// Actual value read from the candidate row
    pub actual: Value,
}

/// The visible row scoring highest on a partial-field-match count.
///
/// Produced only for failure diagnostics and discarded after formatting.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClosestMatch {
    /// The best-scoring candidate row
    pub candidate: RowData,
    /// How many expected fields matched
    pub matched_fields: usize,
    /// How many fields were expected in total
    pub total_fields: usize,
    /// The fields that did not match
    pub mismatches: Vec<FieldMismatch>,
}

impl ClosestMatch {
    /// Render the diagnostic for an error message
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = format!(
            "Closest match: viewport row {} ({}/{} fields matched)",
            self.candidate.viewport_index, self.matched_fields, self.total_fields
        );
        for m in &self.mismatches {
            out.push_str(&format!(
                "\n  {}: expected {}, actual {}",
                m.field, m.expected, m.actual
            ));
        }
        out
    }
}

/// Score every scanned row against the full expected map and return the best
/// candidate, ties broken by first-seen.
#[must_use]
pub fn closest_match(
    rows: &[RowData],
    expected: &BTreeMap<String, Value>,
) -> Option<ClosestMatch> {
    let mut best: Option<(usize, &RowData)> = None;
    for row in rows {
        let score = expected
            .iter()
            .filter(|(column, value)| values_match(value, row.cell(column)))
            .count();
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, row));
        }
    }
    best.map(|(score, row)| ClosestMatch {
        candidate: row.clone(),
        matched_fields: score,
        total_fields: expected.len(),
        mismatches: expected
            .iter()
            .filter(|(column, value)| !values_match(value, row.cell(column)))
            .map(|(column, value)| FieldMismatch {
                field: column.clone(),
                expected: value.clone(),
                actual: row.cell(column).clone(),
            })
            .collect(),
    })
}

// =============================================================================
// MATCHING ENGINE
// =============================================================================

/// Materialize the row at `nth` within a row-collection selector.
///
/// Returns `None` when the element is gone or carries no viewport index;
/// both happen mid-virtualization and are not errors.
pub(crate) async fn materialize_from(
    ctx: &GridContext,
    rows_selector: &str,
    nth: usize,
) -> RejillaResult<Option<RowData>> {
    let page = ctx.page();
    let Some(index_attr) = page
        .attribute(rows_selector, nth, address::ATTR_ROW_INDEX)
        .await?
    else {
        return Ok(None);
    };
    let Ok(viewport_index) = index_attr.trim().parse::<u32>() else {
        return Ok(None);
    };

    let aria_position = page
        .attribute(rows_selector, nth, address::ATTR_ARIA_ROW_INDEX)
        .await?
        .and_then(|v| v.trim().parse().ok())
        // Header band occupies ARIA row 1; first body row reports 2.
        .unwrap_or(viewport_index + 2);
    let stable_id = page
        .attribute(rows_selector, nth, address::ATTR_ROW_ID)
        .await?;
    let class = page
        .attribute(rows_selector, nth, "class")
        .await?
        .unwrap_or_default();
    let is_expanded = page
        .attribute(rows_selector, nth, address::ATTR_ARIA_EXPANDED)
        .await?
        .map(|v| v == "true");
    let group_level = page
        .attribute(rows_selector, nth, address::ATTR_ARIA_LEVEL)
        .await?
        .and_then(|v| v.trim().parse().ok());

    // Column ids: declared metadata when present, DOM discovery otherwise.
    let column_ids: Vec<String> = if ctx.config().columns.is_empty() {
        let cells_selector = address::row_cells(ctx.root(), viewport_index);
        let cell_count = page.count(&cells_selector).await?;
        let mut ids = Vec::with_capacity(cell_count);
        for i in 0..cell_count {
            if let Some(id) = page.attribute(&cells_selector, i, address::ATTR_COL_ID).await? {
                ids.push(id);
            }
        }
        ids
    } else {
        ctx.config()
            .columns
            .iter()
            .map(|c| c.column_id.clone())
            .collect()
    };

    // Cell reads are independent; fan out within the row.
    let reads = column_ids.iter().map(|id| {
        let selector = address::cell(ctx.root(), viewport_index, id);
        async move { (id.clone(), extract::cell_value(ctx, &selector, id).await) }
    });
    let mut cells = BTreeMap::new();
    for (id, value) in join_all(reads).await {
        let _ = cells.insert(id, value?);
    }

    Ok(Some(RowData {
        viewport_index,
        aria_position,
        stable_id,
        cells,
        is_group_row: class.split_whitespace().any(|c| c == "ag-row-group"),
        is_expanded,
        group_level,
    }))
}

/// Materialize every currently visible row, in visible DOM order.
pub(crate) async fn visible_rows(ctx: &GridContext) -> RejillaResult<Vec<RowData>> {
    let rows_selector = address::rows(ctx.root());
    let count = ctx.page().count(&rows_selector).await?;
    let mut rows = Vec::with_capacity(count);
    for nth in 0..count {
        if let Some(row) = materialize_from(ctx, &rows_selector, nth).await? {
            rows.push(row);
        }
    }
    tracing::trace!(scanned = rows.len(), "materialized visible rows");
    Ok(rows)
}

/// Resolve a matcher into at most one visible row.
///
/// Direct matchers cost one structural query; derived matchers scan the
/// virtualization window. First match wins, in visible order.
pub(crate) async fn find_row(
    ctx: &GridContext,
    matcher: &RowMatcher,
) -> RejillaResult<Option<RowData>> {
    match matcher {
        RowMatcher::AriaPosition(n) => {
            direct(ctx, address::row_by_aria_position(ctx.root(), *n)).await
        }
        RowMatcher::StableId(id) => direct(ctx, address::row_by_stable_id(ctx.root(), id)).await,
        RowMatcher::ViewportIndex(n) => {
            direct(ctx, address::row_by_viewport_index(ctx.root(), *n)).await
        }
        RowMatcher::CellValues(expected) => Ok(visible_rows(ctx)
            .await?
            .into_iter()
            .find(|row| matches_cell_values(row, expected))),
        RowMatcher::Predicate(predicate) => Ok(visible_rows(ctx)
            .await?
            .into_iter()
            .find(|row| predicate(row))),
    }
}

async fn direct(ctx: &GridContext, selector: String) -> RejillaResult<Option<RowData>> {
    if ctx.page().count(&selector).await? == 0 {
        return Ok(None);
    }
    materialize_from(ctx, &selector, 0).await
}
