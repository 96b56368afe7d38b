//! The caller-facing harness: one object per grid instance.
//!
//! [`GridHarness::attach`] normalizes the configuration, resolves the grid
//! root, and returns the surface test authors work against: locator
//! accessors, waits, assertions, actions, and data reads. Enterprise
//! extensions (grouping, master/detail, server-side loading, range
//! selection, keyboard) add further methods from the `enterprise` modules.
//!
//! Harness instances are independent; two instances never share mutable
//! state, even against the same page.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::address;
use crate::assertion::{self, RowCountExpectation};
use crate::config::GridConfig;
use crate::driver::PageDriver;
use crate::extract;
use crate::locator::{ElementLocator, GridContext};
use crate::matcher::{self, RowData, RowMatcher};
use crate::result::{RejillaError, RejillaResult};
use crate::state::{GridState, SortDirection};
use crate::wait;

/// Scroll step, in pixels, while hunting for a virtualized row
const SCROLL_STEP_PX: f64 = 600.0;

/// Header click cycle length when driving toward a sort direction
const SORT_CYCLE_CLICKS: u32 = 3;

/// Test harness bound to one grid instance.
#[derive(Debug, Clone)]
pub struct GridHarness {
    ctx: GridContext,
}

impl GridHarness {
    /// Attach to a grid: validate configuration, resolve the root.
    ///
    /// # Errors
    ///
    /// Returns [`RejillaError::Configuration`] on malformed configuration.
    pub async fn attach(
        page: Arc<dyn PageDriver>,
        config: impl Into<GridConfig>,
    ) -> RejillaResult<Self> {
        let ctx = GridContext::resolve(page, config.into()).await?;
        debug!(root = %ctx.root(), "attached grid harness");
        Ok(Self { ctx })
    }

    /// The underlying locator context
    #[must_use]
    pub fn context(&self) -> &GridContext {
        &self.ctx
    }

    pub(crate) fn ctx(&self) -> &GridContext {
        &self.ctx
    }

    /// Resolve a matcher, failing with a scan-count diagnostic when absent.
    pub(crate) async fn require_row(&self, row_matcher: &RowMatcher) -> RejillaResult<RowData> {
        match matcher::find_row(&self.ctx, row_matcher).await? {
            Some(row) => Ok(row),
            None => {
                let scanned = self
                    .ctx
                    .page()
                    .count(&address::rows(self.ctx.root()))
                    .await?;
                Err(RejillaError::assertion(format!(
                    "Row not found: {row_matcher} ({scanned} visible rows scanned)"
                )))
            }
        }
    }

    // =========================================================================
    // Locator accessors
    // =========================================================================

    /// Handle on the grid root
    #[must_use]
    pub fn grid(&self) -> ElementLocator {
        self.ctx.grid()
    }

    /// Handle on a header cell
    #[must_use]
    pub fn header_cell(&self, column_id: &str) -> ElementLocator {
        self.ctx.header_cell(column_id)
    }

    /// Handle on a column's floating-filter input
    #[must_use]
    pub fn filter_input(&self, column_id: &str) -> ElementLocator {
        self.ctx.filter_input(column_id)
    }

    /// Resolve a matcher into a lazy row handle
    pub async fn row(&self, row_matcher: &RowMatcher) -> RejillaResult<Option<ElementLocator>> {
        Ok(matcher::find_row(&self.ctx, row_matcher).await?.map(|row| {
            self.ctx
                .locator(address::row_by_viewport_index(self.ctx.root(), row.viewport_index))
        }))
    }

    /// Resolve a matcher into a lazy cell handle
    pub async fn cell(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
    ) -> RejillaResult<Option<ElementLocator>> {
        Ok(matcher::find_row(&self.ctx, row_matcher)
            .await?
            .map(|row| self.ctx.cell_at(row.viewport_index, column_id)))
    }

    // =========================================================================
    // Waits
    // =========================================================================

    /// Wait until the grid is structurally ready
    pub async fn wait_for_ready(&self) -> RejillaResult<()> {
        wait::wait_for_ready(&self.ctx).await
    }

    /// Wait until the loading overlay, if any, is gone
    pub async fn wait_for_data_loaded(&self) -> RejillaResult<()> {
        wait::wait_for_data_loaded(&self.ctx).await
    }

    /// Wait until exactly `expected` rows are visible
    pub async fn wait_for_row_count(&self, expected: usize) -> RejillaResult<()> {
        wait::wait_for_row_count(&self.ctx, expected).await
    }

    /// Wait until a matcher resolves, returning the row
    pub async fn wait_for_row(&self, row_matcher: &RowMatcher) -> RejillaResult<RowData> {
        wait::wait_for_row(&self.ctx, row_matcher).await
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Assert the visible row count (exact or range)
    pub async fn expect_row_count(
        &self,
        expectation: impl Into<RowCountExpectation>,
    ) -> RejillaResult<()> {
        assertion::expect_row_count(&self.ctx, expectation.into()).await
    }

    /// Assert a row with these cell values is (or becomes) visible
    pub async fn expect_row_contains<K, V, I>(&self, expected: I) -> RejillaResult<RowData>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let expected: BTreeMap<String, Value> = expected
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        assertion::expect_row_contains(&self.ctx, expected).await
    }

    /// Assert no row with these cell values remains visible
    pub async fn expect_row_not_contains<K, V, I>(&self, expected: I) -> RejillaResult<()>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let expected: BTreeMap<String, Value> = expected
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        assertion::expect_row_not_contains(&self.ctx, expected).await
    }

    /// Assert a specific cell's normalized value
    pub async fn expect_cell_value(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
        expected: impl Into<Value>,
    ) -> RejillaResult<()> {
        assertion::expect_cell_value(&self.ctx, row_matcher, column_id, &expected.into()).await
    }

    /// Assert the grid is sorted by a column in a direction
    pub async fn expect_sorted_by(
        &self,
        column_id: &str,
        direction: SortDirection,
    ) -> RejillaResult<()> {
        assertion::expect_sorted_by(&self.ctx, column_id, direction).await
    }

    /// Assert the grid shows no rows
    pub async fn expect_empty(&self) -> RejillaResult<()> {
        assertion::expect_empty(&self.ctx).await
    }

    /// Assert a row is selected
    pub async fn expect_row_selected(&self, row_matcher: &RowMatcher) -> RejillaResult<()> {
        assertion::expect_row_selected(&self.ctx, row_matcher).await
    }

    /// Assert the "no rows" overlay is visible
    pub async fn expect_no_rows_overlay(&self) -> RejillaResult<()> {
        assertion::expect_no_rows_overlay(&self.ctx).await
    }

    // =========================================================================
    // Data reads
    // =========================================================================

    /// Normalized value of one cell; the row must be visible
    pub async fn cell_value(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
    ) -> RejillaResult<Value> {
        let row = self.require_row(row_matcher).await?;
        Ok(row.cell(column_id).clone())
    }

    /// Materialize one row, `None` when absent from the viewport
    pub async fn row_data(&self, row_matcher: &RowMatcher) -> RejillaResult<Option<RowData>> {
        matcher::find_row(&self.ctx, row_matcher).await
    }

    /// Materialize every currently visible row
    pub async fn visible_row_data(&self) -> RejillaResult<Vec<RowData>> {
        matcher::visible_rows(&self.ctx).await
    }

    /// Compute the state snapshot
    pub async fn state(&self) -> RejillaResult<GridState> {
        crate::state::grid_state(&self.ctx).await
    }

    /// Stable ids of the currently selected rows
    pub async fn selected_row_ids(&self) -> RejillaResult<Vec<String>> {
        let selector = address::selected_rows(self.ctx.root());
        let count = self.ctx.page().count(&selector).await?;
        let mut ids = Vec::new();
        for nth in 0..count {
            if let Some(id) = self
                .ctx
                .page()
                .attribute(&selector, nth, address::ATTR_ROW_ID)
                .await?
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Click a cell
    pub async fn click_cell(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
    ) -> RejillaResult<()> {
        let row = self.require_row(row_matcher).await?;
        self.ctx.cell_at(row.viewport_index, column_id).click().await
    }

    /// Edit a cell: enter edit mode, replace the value, commit with Enter.
    pub async fn edit_cell(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
        value: &str,
    ) -> RejillaResult<()> {
        let row = self.require_row(row_matcher).await?;
        let cell = self.ctx.cell_at(row.viewport_index, column_id);
        cell.click().await?;
        cell.double_click().await?;
        wait::wait_for_cell_editor(&self.ctx, row.viewport_index, column_id).await?;
        let editor = self.ctx.locator(address::cell_editor_input(
            self.ctx.root(),
            row.viewport_index,
            column_id,
        ));
        editor.fill(value).await?;
        self.ctx.page().press_key("Enter").await
    }

    /// Click the header until the column reports the desired sort direction.
    ///
    /// Grids cycle none → asc → desc on header clicks, so at most one full
    /// cycle of clicks is attempted.
    pub async fn sort_by_column(
        &self,
        column_id: &str,
        direction: SortDirection,
    ) -> RejillaResult<()> {
        let header = address::header_cell(self.ctx.root(), column_id);
        for _ in 0..SORT_CYCLE_CLICKS {
            let current = self
                .ctx
                .page()
                .attribute(&header, 0, address::ATTR_ARIA_SORT)
                .await?
                .as_deref()
                .and_then(SortDirection::from_aria);
            if current == Some(direction) {
                return Ok(());
            }
            self.ctx.page().click(&header, 0).await?;
            tokio::time::sleep(Duration::from_millis(self.ctx.config().timeouts.scroll_ms))
                .await;
        }
        let current = self
            .ctx
            .page()
            .attribute(&header, 0, address::ATTR_ARIA_SORT)
            .await?;
        if current.as_deref().and_then(SortDirection::from_aria) == Some(direction) {
            Ok(())
        } else {
            Err(RejillaError::assertion(format!(
                "Could not reach sort {direction} on column {column_id} \
                 after {SORT_CYCLE_CLICKS} header clicks"
            )))
        }
    }

    /// Fill a column's floating-filter input
    pub async fn filter_column(&self, column_id: &str, text: &str) -> RejillaResult<()> {
        self.filter_input(column_id).fill(text).await
    }

    /// Select a row; a no-op when it is already selected.
    pub async fn select_row(&self, row_matcher: &RowMatcher) -> RejillaResult<()> {
        self.set_row_selection(row_matcher, true).await
    }

    /// Deselect a row; a no-op when it is not selected.
    pub async fn deselect_row(&self, row_matcher: &RowMatcher) -> RejillaResult<()> {
        self.set_row_selection(row_matcher, false).await
    }

    async fn set_row_selection(
        &self,
        row_matcher: &RowMatcher,
        selected: bool,
    ) -> RejillaResult<()> {
        let row = self.require_row(row_matcher).await?;
        let row_selector = address::row_by_viewport_index(self.ctx.root(), row.viewport_index);
        let currently = self
            .ctx
            .page()
            .attribute(&row_selector, 0, address::ATTR_ARIA_SELECTED)
            .await?
            .as_deref()
            == Some("true");
        if currently == selected {
            return Ok(());
        }
        let checkbox = address::selection_checkbox(self.ctx.root(), row.viewport_index);
        if self.ctx.page().count(&checkbox).await? > 0 {
            self.ctx.page().click(&checkbox, 0).await
        } else {
            self.ctx.page().click(&row_selector, 0).await
        }
    }

    /// Scroll until the row at a viewport index materializes, then bring it
    /// into view. Virtualized rows cannot be scrolled to with a plain
    /// scroll-into-view while they are absent from the document.
    pub async fn scroll_to_row(&self, viewport_index: u32) -> RejillaResult<()> {
        let row_selector = address::row_by_viewport_index(self.ctx.root(), viewport_index);
        let viewport = format!("{} {}", self.ctx.root(), address::BODY_VIEWPORT);
        let timeout_ms = self.ctx.config().timeouts.row_load_ms;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.ctx.page().count(&row_selector).await? > 0 {
                return self.ctx.page().scroll_into_view(&row_selector, 0).await;
            }
            if Instant::now() >= deadline {
                return Err(RejillaError::timeout(
                    timeout_ms,
                    format!("row at viewport index {viewport_index} to materialize"),
                ));
            }
            self.ctx
                .page()
                .scroll_by(&viewport, 0.0, SCROLL_STEP_PX)
                .await?;
            tokio::time::sleep(Duration::from_millis(self.ctx.config().timeouts.scroll_ms))
                .await;
        }
    }

    /// Read one cell's normalized value directly by viewport position,
    /// bypassing row materialization.
    pub async fn cell_value_at(
        &self,
        viewport_index: u32,
        column_id: &str,
    ) -> RejillaResult<Value> {
        let selector = address::cell(self.ctx.root(), viewport_index, column_id);
        extract::cell_value(&self.ctx, &selector, column_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::driver::{MockElement, MockPage};

    const ROOT: &str = "#g";

    async fn harness(page: Arc<MockPage>) -> GridHarness {
        let config = GridConfig::from(ROOT).with_timeouts(
            Timeouts::new()
                .with_ready(300)
                .with_row_load(300)
                .with_cell_edit(300)
                .with_scroll(5),
        );
        GridHarness::attach(page, config).await.unwrap()
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

    #[tokio::test]
    async fn test_click_cell_targets_the_resolved_cell() {
        let page = Arc::new(MockPage::new());
        seed_row(&page, 0, &[("status", "Active")]);
        let h = harness(Arc::clone(&page)).await;
        h.click_cell(&RowMatcher::viewport_index(0), "status")
            .await
            .unwrap();
        assert_eq!(page.clicks(), vec![address::cell(ROOT, 0, "status")]);
    }

    #[tokio::test]
    async fn test_click_cell_missing_row_is_an_assertion_error() {
        let page = Arc::new(MockPage::new());
        let h = harness(Arc::clone(&page)).await;
        let err = h
            .click_cell(&RowMatcher::viewport_index(3), "status")
            .await
            .unwrap_err();
        assert!(matches!(err, RejillaError::Assertion { .. }));
        assert!(err.to_string().contains("0 visible rows scanned"));
    }

    #[tokio::test]
    async fn test_edit_cell_flow() {
        let page = Arc::new(MockPage::new());
        seed_row(&page, 0, &[("amount", "10")]);
        // The editor appears as soon as edit mode is entered.
        page.insert(address::cell_editing(ROOT, 0, "amount"), MockElement::new(""));
        page.insert(
            address::cell_editor_input(ROOT, 0, "amount"),
            MockElement::new(""),
        );
        let h = harness(Arc::clone(&page)).await;
        h.edit_cell(&RowMatcher::viewport_index(0), "amount", "42")
            .await
            .unwrap();
        assert_eq!(
            page.fills(),
            vec![(address::cell_editor_input(ROOT, 0, "amount"), "42".to_string())]
        );
        assert_eq!(page.keys(), vec!["Enter"]);
        assert_eq!(page.double_clicks(), vec![address::cell(ROOT, 0, "amount")]);
    }

    #[tokio::test]
    async fn test_sort_by_column_noop_when_already_sorted() {
        let page = Arc::new(MockPage::new());
        page.insert(
            address::header_cell(ROOT, "amount"),
            MockElement::new("Amount").with_attr("aria-sort", "ascending"),
        );
        let h = harness(Arc::clone(&page)).await;
        h.sort_by_column("amount", SortDirection::Ascending)
            .await
            .unwrap();
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_sort_by_column_gives_up_after_cycle() {
        let page = Arc::new(MockPage::new());
        page.insert(
            address::header_cell(ROOT, "amount"),
            MockElement::new("Amount"),
        );
        let h = harness(Arc::clone(&page)).await;
        let err = h
            .sort_by_column("amount", SortDirection::Descending)
            .await
            .unwrap_err();
        assert!(matches!(err, RejillaError::Assertion { .. }));
        assert_eq!(page.clicks().len(), 3);
    }

    #[tokio::test]
    async fn test_select_row_is_idempotent() {
        let page = Arc::new(MockPage::new());
        let el = MockElement::new("")
            .with_attr("row-index", "0")
            .with_attr("aria-selected", "true");
        page.insert(address::rows(ROOT), el.clone());
        page.insert(address::row_by_viewport_index(ROOT, 0), el);
        let h = harness(Arc::clone(&page)).await;
        h.select_row(&RowMatcher::viewport_index(0)).await.unwrap();
        assert!(page.clicks().is_empty());
        // Deselect does click (via row; no checkbox present).
        h.deselect_row(&RowMatcher::viewport_index(0)).await.unwrap();
        assert_eq!(page.clicks().len(), 1);
    }

    #[tokio::test]
    async fn test_select_row_prefers_checkbox() {
        let page = Arc::new(MockPage::new());
        seed_row(&page, 0, &[]);
        page.insert(address::selection_checkbox(ROOT, 0), MockElement::new(""));
        let h = harness(Arc::clone(&page)).await;
        h.select_row(&RowMatcher::viewport_index(0)).await.unwrap();
        assert_eq!(page.clicks(), vec![address::selection_checkbox(ROOT, 0)]);
    }

    #[tokio::test]
    async fn test_selected_row_ids() {
        let page = Arc::new(MockPage::new());
        page.insert(
            address::selected_rows(ROOT),
            MockElement::new("").with_attr("row-id", "ord-1"),
        );
        page.insert(
            address::selected_rows(ROOT),
            MockElement::new("").with_attr("row-id", "ord-7"),
        );
        let h = harness(Arc::clone(&page)).await;
        assert_eq!(h.selected_row_ids().await.unwrap(), vec!["ord-1", "ord-7"]);
    }

    #[tokio::test]
    async fn test_scroll_to_row_steps_until_present() {
        let page = Arc::new(MockPage::new());
        let h = harness(Arc::clone(&page)).await;
        let loader = {
            let page = Arc::clone(&page);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                seed_row(&page, 40, &[]);
            })
        };
        h.scroll_to_row(40).await.unwrap();
        assert!(!page.scrolls().is_empty());
        loader.await.unwrap();
    }

    #[tokio::test]
    async fn test_scroll_to_row_times_out() {
        let page = Arc::new(MockPage::new());
        let h = harness(Arc::clone(&page)).await;
        let err = h.scroll_to_row(40).await.unwrap_err();
        assert!(matches!(err, RejillaError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_filter_column_fills_input() {
        let page = Arc::new(MockPage::new());
        page.insert(address::filter_input(ROOT, "status"), MockElement::new(""));
        let h = harness(Arc::clone(&page)).await;
        h.filter_column("status", "act").await.unwrap();
        assert_eq!(
            page.fills(),
            vec![(address::filter_input(ROOT, "status"), "act".to_string())]
        );
    }
}
