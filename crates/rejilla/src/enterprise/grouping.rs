//! Group/tree expand-collapse, including column groups.
//!
//! Row expansion state machine: `collapsed → expanded`, transitioned by
//! invoking the row's toggle control. Both directions are idempotent: a
//! second expand of an already-expanded row is a no-op, not a re-toggle.
//!
//! Expand-all is necessarily a loop: expanding a parent can reveal new
//! collapsed children, so the worklist is re-queried after every click. The
//! loop is bounded by [`super::MAX_TOGGLE_ALL_ITERATIONS`]; exhausting the
//! bound raises [`RejillaError::IterationCap`] instead of stopping silently.

use std::time::Duration;
use tracing::debug;

use super::MAX_TOGGLE_ALL_ITERATIONS;
use crate::address;
use crate::harness::GridHarness;
use crate::matcher::RowMatcher;
use crate::result::{RejillaError, RejillaResult};

impl GridHarness {
    /// Expand a group/tree/master row; no-op when already expanded.
    pub async fn expand_row(&self, row_matcher: &RowMatcher) -> RejillaResult<()> {
        self.toggle_row(row_matcher, true).await
    }

    /// Collapse a group/tree/master row; no-op when already collapsed.
    pub async fn collapse_row(&self, row_matcher: &RowMatcher) -> RejillaResult<()> {
        self.toggle_row(row_matcher, false).await
    }

    async fn toggle_row(&self, row_matcher: &RowMatcher, expand: bool) -> RejillaResult<()> {
        let row = self.require_row(row_matcher).await?;
        if row.is_expanded == Some(expand) {
            return Ok(());
        }
        let ctx = self.ctx();
        let toggle = if expand {
            address::row_contracted_toggle(ctx.root(), row.viewport_index)
        } else {
            address::row_expanded_toggle(ctx.root(), row.viewport_index)
        };
        if ctx.page().count(&toggle).await? == 0 {
            return Err(RejillaError::assertion(format!(
                "Row ({row_matcher}) has no {} toggle",
                if expand { "expand" } else { "collapse" }
            )));
        }
        ctx.page().click(&toggle, 0).await
    }

    /// Expand every group row, repeatedly expanding the first still-collapsed
    /// toggle until none remain.
    ///
    /// # Errors
    ///
    /// [`RejillaError::IterationCap`] when the bounded loop does not converge.
    pub async fn expand_all(&self) -> RejillaResult<()> {
        self.toggle_all(true).await
    }

    /// Collapse every expanded group row.
    pub async fn collapse_all(&self) -> RejillaResult<()> {
        self.toggle_all(false).await
    }

    async fn toggle_all(&self, expand: bool) -> RejillaResult<()> {
        let ctx = self.ctx();
        let worklist = if expand {
            address::contracted_toggles(ctx.root())
        } else {
            address::expanded_toggles(ctx.root())
        };
        let settle = Duration::from_millis(ctx.config().timeouts.scroll_ms);
        for iteration in 0..MAX_TOGGLE_ALL_ITERATIONS {
            if ctx.page().count(&worklist).await? == 0 {
                debug!(iteration, expand, "toggle-all converged");
                return Ok(());
            }
            ctx.page().click(&worklist, 0).await?;
            tokio::time::sleep(settle).await;
        }
        Err(RejillaError::IterationCap {
            operation: if expand { "expand-all" } else { "collapse-all" }.to_string(),
            iterations: MAX_TOGGLE_ALL_ITERATIONS,
        })
    }

    /// Expand a header column group; no-op when already expanded.
    pub async fn expand_column_group(&self, group_id: &str) -> RejillaResult<()> {
        self.toggle_column_group(group_id, true).await
    }

    /// Collapse a header column group; no-op when already collapsed.
    pub async fn collapse_column_group(&self, group_id: &str) -> RejillaResult<()> {
        self.toggle_column_group(group_id, false).await
    }

    async fn toggle_column_group(&self, group_id: &str, expand: bool) -> RejillaResult<()> {
        let ctx = self.ctx();
        let group = address::header_group_cell(ctx.root(), group_id);
        if ctx.page().count(&group).await? == 0 {
            return Err(RejillaError::assertion(format!(
                "Header column group not found: {group_id}"
            )));
        }
        let expanded = ctx
            .page()
            .attribute(&group, 0, address::ATTR_ARIA_EXPANDED)
            .await?
            .as_deref()
            == Some("true");
        if expanded == expand {
            return Ok(());
        }
        ctx.page().click(&group, 0).await
    }
}
