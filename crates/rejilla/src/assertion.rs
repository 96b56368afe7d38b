//! Assertion layer: match/derive → compare → pass or throw.
//!
//! This is the only layer (together with the waits) permitted to throw on
//! absence. Failures always say what was searched for (the formatted
//! matcher), how many candidates were scanned, and, for cell-value lookups,
//! the closest candidate with its mismatched fields, so a human can tell
//! "wrong locator" from "data not yet arrived" from "off-by-one in identity
//! scheme".

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::address;
use crate::locator::GridContext;
use crate::matcher::{self, closest_match, matches_cell_values, RowData, RowMatcher};
use crate::result::{RejillaError, RejillaResult};
use crate::state::{self, SortDirection};
use crate::wait::{self, overlay_visible, OverlayKind};

/// Expected row count: exact, or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCountExpectation {
    /// Exactly this many rows
    Exactly(usize),
    /// Within inclusive bounds; open ends are unconstrained
    Between {
        /// Inclusive lower bound
        min: Option<usize>,
        /// Inclusive upper bound
        max: Option<usize>,
    },
}

impl From<usize> for RowCountExpectation {
    fn from(n: usize) -> Self {
        Self::Exactly(n)
    }
}

impl RowCountExpectation {
    /// At least `min` rows
    #[must_use]
    pub const fn at_least(min: usize) -> Self {
        Self::Between {
            min: Some(min),
            max: None,
        }
    }

    /// At most `max` rows
    #[must_use]
    pub const fn at_most(max: usize) -> Self {
        Self::Between {
            min: None,
            max: Some(max),
        }
    }

    /// Between `min` and `max`, inclusive
    #[must_use]
    pub const fn between(min: usize, max: usize) -> Self {
        Self::Between {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether a count satisfies the expectation
    #[must_use]
    pub fn matches(&self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == *n,
            Self::Between { min, max } => {
                min.map_or(true, |m| count >= m) && max.map_or(true, |m| count <= m)
            }
        }
    }
}

impl fmt::Display for RowCountExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::Between {
                min: Some(a),
                max: Some(b),
            } => write!(f, "between {a} and {b}"),
            Self::Between {
                min: Some(a),
                max: None,
            } => write!(f, "at least {a}"),
            Self::Between {
                min: None,
                max: Some(b),
            } => write!(f, "at most {b}"),
            Self::Between {
                min: None,
                max: None,
            } => write!(f, "any count"),
        }
    }
}

/// Assert the visible row count matches an exact count or range.
pub(crate) async fn expect_row_count(
    ctx: &GridContext,
    expectation: RowCountExpectation,
) -> RejillaResult<()> {
    let count = ctx.page().count(&address::rows(ctx.root())).await?;
    if expectation.matches(count) {
        Ok(())
    } else {
        Err(RejillaError::assertion(format!(
            "Expected {expectation} visible rows, found {count}"
        )))
    }
}

/// Assert a row matching the expected cell values is (or becomes) visible,
/// retrying the slow-path scan until the row-load timeout elapses.
///
/// Returns the matched row on success. On final failure the error carries the
/// scanned-row count and the closest-match diagnostic.
pub(crate) async fn expect_row_contains(
    ctx: &GridContext,
    expected: BTreeMap<String, Value>,
) -> RejillaResult<RowData> {
    let timeout_ms = ctx.config().timeouts.row_load_ms;
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let matcher = RowMatcher::CellValues(expected.clone());
    loop {
        let rows = matcher::visible_rows(ctx).await?;
        if let Some(row) = rows.iter().find(|r| matches_cell_values(r, &expected)) {
            return Ok(row.clone());
        }
        if Instant::now() >= deadline {
            let mut diagnostic = format!("Scanned {} visible rows", rows.len());
            if let Some(closest) = closest_match(&rows, &expected) {
                diagnostic.push('\n');
                diagnostic.push_str(&closest.describe());
            }
            return Err(RejillaError::Timeout {
                ms: timeout_ms,
                condition: format!("row matching {matcher}"),
                diagnostic: Some(diagnostic),
            });
        }
        tokio::time::sleep(Duration::from_millis(wait::POLL_INTERVAL_MS)).await;
    }
}

/// Logical inverse of [`expect_row_contains`]: poll until no visible row
/// matches, or the timeout elapses.
pub(crate) async fn expect_row_not_contains(
    ctx: &GridContext,
    expected: BTreeMap<String, Value>,
) -> RejillaResult<()> {
    let timeout_ms = ctx.config().timeouts.row_load_ms;
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let matcher = RowMatcher::CellValues(expected.clone());
    loop {
        let rows = matcher::visible_rows(ctx).await?;
        let matched = rows.iter().find(|r| matches_cell_values(r, &expected));
        match matched {
            None => return Ok(()),
            Some(row) if Instant::now() >= deadline => {
                return Err(RejillaError::Timeout {
                    ms: timeout_ms,
                    condition: format!("no row matching {matcher}"),
                    diagnostic: Some(format!(
                        "Viewport row {} still matches ({} rows scanned)",
                        row.viewport_index,
                        rows.len()
                    )),
                });
            }
            Some(_) => tokio::time::sleep(Duration::from_millis(wait::POLL_INTERVAL_MS)).await,
        }
    }
}

/// Assert a specific cell's normalized value.
pub(crate) async fn expect_cell_value(
    ctx: &GridContext,
    row_matcher: &RowMatcher,
    column_id: &str,
    expected: &Value,
) -> RejillaResult<()> {
    let Some(row) = matcher::find_row(ctx, row_matcher).await? else {
        let scanned = ctx.page().count(&address::rows(ctx.root())).await?;
        return Err(RejillaError::assertion(format!(
            "Row not found: {row_matcher} ({scanned} visible rows scanned)"
        )));
    };
    let actual = row.cell(column_id);
    if matcher::values_match(expected, actual) {
        Ok(())
    } else {
        Err(RejillaError::assertion(format!(
            "Expected cell {column_id} of row ({row_matcher}) to be {expected}, actual {actual}"
        )))
    }
}

/// Assert the grid is sorted by a column in a direction.
pub(crate) async fn expect_sorted_by(
    ctx: &GridContext,
    column_id: &str,
    direction: SortDirection,
) -> RejillaResult<()> {
    let entries = state::sorted_by(ctx).await?;
    match entries.iter().find(|e| e.column_id == column_id) {
        Some(entry) if entry.direction == direction => Ok(()),
        Some(entry) => Err(RejillaError::assertion(format!(
            "Expected column {column_id} sorted {direction}, actual {}",
            entry.direction
        ))),
        None => {
            let sorted: Vec<String> = entries
                .iter()
                .map(|e| format!("{} {}", e.column_id, e.direction))
                .collect();
            Err(RejillaError::assertion(format!(
                "Column {column_id} is not sorted (current sort order: [{}])",
                sorted.join(", ")
            )))
        }
    }
}

/// Assert the grid shows no rows.
pub(crate) async fn expect_empty(ctx: &GridContext) -> RejillaResult<()> {
    let count = ctx.page().count(&address::rows(ctx.root())).await?;
    if count == 0 {
        Ok(())
    } else {
        Err(RejillaError::assertion(format!(
            "Expected an empty grid, found {count} visible rows"
        )))
    }
}

/// Assert a row is selected.
pub(crate) async fn expect_row_selected(
    ctx: &GridContext,
    row_matcher: &RowMatcher,
) -> RejillaResult<()> {
    let Some(row) = matcher::find_row(ctx, row_matcher).await? else {
        return Err(RejillaError::assertion(format!(
            "Row not found: {row_matcher}"
        )));
    };
    let selector = address::row_by_viewport_index(ctx.root(), row.viewport_index);
    let selected = ctx
        .page()
        .attribute(&selector, 0, address::ATTR_ARIA_SELECTED)
        .await?;
    if selected.as_deref() == Some("true") {
        Ok(())
    } else {
        Err(RejillaError::assertion(format!(
            "Expected row ({row_matcher}) to be selected"
        )))
    }
}

/// Assert the "no rows" overlay is visible.
pub(crate) async fn expect_no_rows_overlay(ctx: &GridContext) -> RejillaResult<()> {
    if overlay_visible(ctx, OverlayKind::NoRows).await {
        Ok(())
    } else {
        Err(RejillaError::assertion(
            "Expected the no-rows overlay to be visible",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, Timeouts};
    use crate::driver::{MockElement, MockPage};
    use std::sync::Arc;

    const ROOT: &str = "#g";

    async fn ctx(page: Arc<MockPage>) -> GridContext {
        let config =
            GridConfig::from(ROOT).with_timeouts(Timeouts::new().with_row_load(300));
        GridContext::resolve(page, config).await.unwrap()
    }

    fn seed_row(page: &MockPage, index: u32, cells: &[(&str, &str)]) {
        let el = MockElement::new("").with_attr("row-index", index.to_string());
        page.insert(address::rows(ROOT), el.clone());
        page.insert(address::row_by_viewport_index(ROOT, index), el);
        for (col, text) in cells {
            page.insert(
                address::row_cells(ROOT, index),
                MockElement::new(*text).with_attr("col-id", *col),
            );
            page.insert(address::cell(ROOT, index, col), MockElement::new(*text));
        }
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
            .collect()
    }

    mod row_count_tests {
        use super::*;

        #[test]
        fn test_expectation_matching() {
            assert!(RowCountExpectation::Exactly(3).matches(3));
            assert!(!RowCountExpectation::Exactly(3).matches(4));
            assert!(RowCountExpectation::at_least(2).matches(2));
            assert!(!RowCountExpectation::at_least(2).matches(1));
            assert!(RowCountExpectation::between(2, 4).matches(4));
            assert!(!RowCountExpectation::between(2, 4).matches(5));
        }

        #[tokio::test]
        async fn test_exact_count_pass_and_fail() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[]);
            seed_row(&page, 1, &[]);
            let ctx = ctx(Arc::clone(&page)).await;
            expect_row_count(&ctx, 2.into()).await.unwrap();
            let err = expect_row_count(&ctx, 3.into()).await.unwrap_err();
            assert!(matches!(err, RejillaError::Assertion { .. }));
            assert!(err.to_string().contains("exactly 3"));
            assert!(err.to_string().contains("found 2"));
        }

        #[tokio::test]
        async fn test_range_count() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[]);
            seed_row(&page, 1, &[]);
            let ctx = ctx(Arc::clone(&page)).await;
            expect_row_count(&ctx, RowCountExpectation::between(1, 5))
                .await
                .unwrap();
            assert!(expect_row_count(&ctx, RowCountExpectation::at_least(3))
                .await
                .is_err());
        }
    }

    mod row_contains_tests {
        use super::*;

        #[tokio::test]
        async fn test_contains_matches_case_insensitively() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[("status", "Active")]);
            let ctx = ctx(Arc::clone(&page)).await;
            expect_row_contains(&ctx, values(&[("status", "Active")]))
                .await
                .unwrap();
            let row = expect_row_contains(&ctx, values(&[("status", "active")]))
                .await
                .unwrap();
            assert_eq!(row.viewport_index, 0);
        }

        #[tokio::test]
        async fn test_contains_failure_carries_closest_match() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[("status", "Active")]);
            let ctx = ctx(Arc::clone(&page)).await;
            let err = expect_row_contains(&ctx, values(&[("status", "Closed")]))
                .await
                .unwrap_err();
            let RejillaError::Timeout {
                diagnostic: Some(diag),
                condition,
                ..
            } = err
            else {
                panic!("expected timeout with diagnostic");
            };
            assert!(condition.contains("status"));
            assert!(diag.contains("Scanned 1 visible rows"));
            assert!(diag.contains("status"));
            assert!(diag.contains("\"Closed\""));
            assert!(diag.contains("\"Active\""));
        }

        #[tokio::test]
        async fn test_contains_observes_late_arrival() {
            let page = Arc::new(MockPage::new());
            let ctx = ctx(Arc::clone(&page)).await;
            let loader = {
                let page = Arc::clone(&page);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    seed_row(&page, 0, &[("status", "Active")]);
                })
            };
            expect_row_contains(&ctx, values(&[("status", "Active")]))
                .await
                .unwrap();
            loader.await.unwrap();
        }

        #[tokio::test]
        async fn test_not_contains_pass_and_timeout() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[("status", "Active")]);
            let ctx = ctx(Arc::clone(&page)).await;
            expect_row_not_contains(&ctx, values(&[("status", "Closed")]))
                .await
                .unwrap();
            let err = expect_row_not_contains(&ctx, values(&[("status", "Active")]))
                .await
                .unwrap_err();
            assert!(matches!(err, RejillaError::Timeout { .. }));
            assert!(err.to_string().contains("still matches"));
        }
    }

    mod cell_value_tests {
        use super::*;

        #[tokio::test]
        async fn test_cell_value_pass_and_mismatch() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[("amount", "42")]);
            let ctx = ctx(Arc::clone(&page)).await;
            expect_cell_value(
                &ctx,
                &RowMatcher::viewport_index(0),
                "amount",
                &Value::String("42".into()),
            )
            .await
            .unwrap();
            let err = expect_cell_value(
                &ctx,
                &RowMatcher::viewport_index(0),
                "amount",
                &Value::String("43".into()),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, RejillaError::Assertion { .. }));
            assert!(err.to_string().contains("amount"));
        }

        #[tokio::test]
        async fn test_cell_value_row_absent_reports_scan_count() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[("amount", "42")]);
            let ctx = ctx(Arc::clone(&page)).await;
            let err = expect_cell_value(
                &ctx,
                &RowMatcher::viewport_index(9),
                "amount",
                &Value::String("42".into()),
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("Row not found"));
            assert!(err.to_string().contains("1 visible rows scanned"));
        }
    }

    mod sorted_and_overlay_tests {
        use super::*;

        #[tokio::test]
        async fn test_sorted_by_pass_and_direction_mismatch() {
            let page = Arc::new(MockPage::new());
            page.insert(
                address::header_cells(ROOT),
                MockElement::new("Amount")
                    .with_attr("col-id", "amount")
                    .with_attr("aria-sort", "ascending"),
            );
            let ctx = ctx(Arc::clone(&page)).await;
            expect_sorted_by(&ctx, "amount", SortDirection::Ascending)
                .await
                .unwrap();
            let err = expect_sorted_by(&ctx, "amount", SortDirection::Descending)
                .await
                .unwrap_err();
            assert!(matches!(err, RejillaError::Assertion { .. }));
            assert!(err.to_string().contains("actual asc"));
        }

        #[tokio::test]
        async fn test_sorted_by_unsorted_column() {
            let page = Arc::new(MockPage::new());
            let ctx = ctx(Arc::clone(&page)).await;
            let err = expect_sorted_by(&ctx, "amount", SortDirection::Ascending)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("is not sorted"));
        }

        #[tokio::test]
        async fn test_empty_grid_with_overlay() {
            let page = Arc::new(MockPage::new());
            let overlay = address::no_rows_overlay(ROOT);
            page.insert(address::overlay_active(&overlay), MockElement::new(""));
            let ctx = ctx(Arc::clone(&page)).await;
            expect_empty(&ctx).await.unwrap();
            expect_no_rows_overlay(&ctx).await.unwrap();
        }

        #[tokio::test]
        async fn test_empty_fails_with_rows() {
            let page = Arc::new(MockPage::new());
            seed_row(&page, 0, &[]);
            let ctx = ctx(Arc::clone(&page)).await;
            assert!(expect_empty(&ctx).await.is_err());
            assert!(expect_no_rows_overlay(&ctx).await.is_err());
        }

        #[tokio::test]
        async fn test_row_selected() {
            let page = Arc::new(MockPage::new());
            let el = MockElement::new("")
                .with_attr("row-index", "0")
                .with_attr("aria-selected", "true");
            page.insert(address::rows(ROOT), el.clone());
            page.insert(address::row_by_viewport_index(ROOT, 0), el);
            let ctx = ctx(Arc::clone(&page)).await;
            expect_row_selected(&ctx, &RowMatcher::viewport_index(0))
                .await
                .unwrap();
            seed_row(&page, 1, &[]);
            assert!(expect_row_selected(&ctx, &RowMatcher::viewport_index(1))
                .await
                .is_err());
        }
    }
}
