//! Synchronization engine: timeout-bounded polling against grid conditions.
//!
//! Every wait is a polling loop with a hard deadline; none retry
//! indefinitely. Expiry raises [`RejillaError::Timeout`] carrying the elapsed
//! bound and a description of the condition that never held. Overlay
//! visibility uses a two-tier heuristic: prefer the overlay's explicit
//! "active" form when the widget uses one, fall back to raw visibility of the
//! overlay element, and swallow transient visibility-check errors as "not
//! visible" (overlays can be mid-transition).

use std::future::Future;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::address;
use crate::locator::GridContext;
use crate::matcher::{self, RowData, RowMatcher};
use crate::result::{RejillaError, RejillaResult};

/// Polling interval for all wait loops
pub const POLL_INTERVAL_MS: u64 = 75;

/// Poll `check` until it reports true or the deadline passes.
///
/// The condition is evaluated at least once even with a zero timeout.
pub(crate) async fn poll_until<F, Fut>(
    timeout_ms: u64,
    condition: &str,
    mut check: F,
) -> RejillaResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RejillaResult<bool>>,
{
    let started = Instant::now();
    let deadline = started + Duration::from_millis(timeout_ms);
    loop {
        if check().await? {
            trace!(condition, elapsed_ms = started.elapsed().as_millis() as u64, "condition held");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(RejillaError::timeout(timeout_ms, condition));
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Poll `probe` until it yields a value or the deadline passes.
pub(crate) async fn poll_for<T, F, Fut>(
    timeout_ms: u64,
    condition: &str,
    mut probe: F,
) -> RejillaResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = RejillaResult<Option<T>>>,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(RejillaError::timeout(timeout_ms, condition));
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Which overlay to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverlayKind {
    /// Loading indicator
    Loading,
    /// "No rows to show"
    NoRows,
}

/// Two-tier overlay visibility check; errors are swallowed as "not visible".
pub(crate) async fn overlay_visible(ctx: &GridContext, kind: OverlayKind) -> bool {
    let overlay = match kind {
        OverlayKind::Loading => address::loading_overlay(ctx.root()),
        OverlayKind::NoRows => address::no_rows_overlay(ctx.root()),
    };
    let active = address::overlay_active(&overlay);
    if matches!(ctx.page().count(&active).await, Ok(n) if n > 0) {
        return true;
    }
    match ctx.page().count(&overlay).await {
        Ok(n) if n > 0 => ctx.page().is_visible(&overlay, 0).await.unwrap_or(false),
        _ => false,
    }
}

/// Wait until the grid is structurally ready: root and header present and
/// visible, loading overlay absent.
pub(crate) async fn wait_for_ready(ctx: &GridContext) -> RejillaResult<()> {
    let header = format!("{} {}", ctx.root(), address::HEADER);
    poll_until(
        ctx.config().timeouts.ready_ms,
        "grid structurally ready",
        || {
            let header = header.clone();
            async move {
                let page = ctx.page();
                if page.count(ctx.root()).await? == 0 || !page.is_visible(ctx.root(), 0).await? {
                    return Ok(false);
                }
                if page.count(&header).await? == 0 {
                    return Ok(false);
                }
                Ok(!overlay_visible(ctx, OverlayKind::Loading).await)
            }
        },
    )
    .await
}

/// Wait until the loading overlay, if any, is gone.
pub(crate) async fn wait_for_data_loaded(ctx: &GridContext) -> RejillaResult<()> {
    poll_until(ctx.config().timeouts.row_load_ms, "data loaded", || async move {
        Ok(!overlay_visible(ctx, OverlayKind::Loading).await)
    })
    .await
}

/// Wait until exactly `expected` rows are visible.
pub(crate) async fn wait_for_row_count(ctx: &GridContext, expected: usize) -> RejillaResult<()> {
    let rows = address::rows(ctx.root());
    let condition = format!("row count == {expected}");
    poll_until(ctx.config().timeouts.row_load_ms, &condition, || {
        let rows = rows.clone();
        async move { Ok(ctx.page().count(&rows).await? == expected) }
    })
    .await
}

/// Wait until a matcher resolves, returning the matched row.
pub(crate) async fn wait_for_row(
    ctx: &GridContext,
    row_matcher: &RowMatcher,
) -> RejillaResult<RowData> {
    let condition = format!("row matching {row_matcher}");
    poll_for(ctx.config().timeouts.row_load_ms, &condition, || async move {
        matcher::find_row(ctx, row_matcher).await
    })
    .await
}

/// Wait until the "no rows" overlay is visible.
pub(crate) async fn wait_for_no_rows_overlay(ctx: &GridContext) -> RejillaResult<()> {
    poll_until(
        ctx.config().timeouts.row_load_ms,
        "no-rows overlay visible",
        || async move { Ok(overlay_visible(ctx, OverlayKind::NoRows).await) },
    )
    .await
}

/// Wait until a cell enters edit mode (its editing marker or editor input
/// appears).
pub(crate) async fn wait_for_cell_editor(
    ctx: &GridContext,
    viewport_index: u32,
    column_id: &str,
) -> RejillaResult<()> {
    let editing = address::cell_editing(ctx.root(), viewport_index, column_id);
    let editor_input = address::cell_editor_input(ctx.root(), viewport_index, column_id);
    let condition = format!("cell {column_id}@{viewport_index} in edit mode");
    poll_until(ctx.config().timeouts.cell_edit_ms, &condition, || {
        let (editing, editor_input) = (editing.clone(), editor_input.clone());
        async move {
            let page = ctx.page();
            Ok(page.count(&editing).await? > 0 || page.count(&editor_input).await? > 0)
        }
    })
    .await
}
