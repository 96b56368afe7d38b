//! Server-side row model: block loading.
//!
//! Under the server-side row model the widget fetches rows in blocks,
//! rendering placeholder rows while a block is in flight. "Wait for block
//! load" captures a baseline of loaded (non-placeholder) rows, then polls
//! until new loaded rows appear or the last placeholder disappears.

use std::time::Duration;

use crate::address;
use crate::harness::GridHarness;
use crate::result::RejillaResult;
use crate::wait;

/// Scroll step used to trigger the next block fetch
const BLOCK_SCROLL_STEP_PX: f64 = 800.0;

impl GridHarness {
    /// Number of loaded (non-placeholder) rows currently in the viewport.
    pub async fn loaded_row_count(&self) -> RejillaResult<usize> {
        let ctx = self.ctx();
        let total = ctx.page().count(&address::rows(ctx.root())).await?;
        let placeholders = ctx.page().count(&address::loading_rows(ctx.root())).await?;
        Ok(total.saturating_sub(placeholders))
    }

    /// Wait until a row block finishes loading after a scroll/refresh
    /// trigger: the loaded-row count grows past `baseline`, or (when
    /// placeholder rows were showing when the wait began) the last
    /// placeholder disappears.
    pub async fn wait_for_block_load(&self, baseline: usize) -> RejillaResult<()> {
        let ctx = self.ctx();
        let placeholders = address::loading_rows(ctx.root());
        let had_placeholders = ctx.page().count(&placeholders).await? > 0;
        wait::poll_until(
            ctx.config().timeouts.row_load_ms,
            "server-side row block loaded",
            || {
                let placeholders = placeholders.clone();
                async move {
                    let loaded = self.loaded_row_count().await?;
                    if loaded > baseline {
                        return Ok(true);
                    }
                    Ok(had_placeholders
                        && loaded > 0
                        && ctx.page().count(&placeholders).await? == 0)
                }
            },
        )
        .await
    }

    /// Scroll the body viewport one block step and wait for the resulting
    /// block load.
    pub async fn load_next_block(&self) -> RejillaResult<()> {
        let baseline = self.loaded_row_count().await?;
        let ctx = self.ctx();
        let viewport = format!("{} {}", ctx.root(), address::BODY_VIEWPORT);
        ctx.page()
            .scroll_by(&viewport, 0.0, BLOCK_SCROLL_STEP_PX)
            .await?;
        tokio::time::sleep(Duration::from_millis(ctx.config().timeouts.scroll_ms)).await;
        self.wait_for_block_load(baseline).await
    }
}
