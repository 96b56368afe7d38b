//! State extraction: a point-in-time snapshot of grid state.
//!
//! No single authoritative source exists for most of these figures, so the
//! extraction is layered. `total_rows` tries the paging panel's "… of N"
//! text, then a status-bar row-count pattern, then falls back to counting
//! visible rows, a known undercount under virtualization that is reported
//! as-is rather than silently corrected.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

use crate::address;
use crate::locator::GridContext;
use crate::result::{RejillaError, RejillaResult};
use crate::wait::{overlay_visible, OverlayKind};

/// Sort direction as reported by header sort indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    Ascending,
    /// Descending
    Descending,
}

impl SortDirection {
    /// Parse the header cell's sort-indicator attribute value
    #[must_use]
    pub fn from_aria(value: &str) -> Option<Self> {
        match value {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = RejillaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(RejillaError::config(format!(
                "invalid sort direction: {other}"
            ))),
        }
    }
}

/// One entry in the grid's sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEntry {
    /// Column id
    pub column_id: String,
    /// Direction
    pub direction: SortDirection,
}

/// Point-in-time grid state; computed on demand, never persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridState {
    /// Best-effort total row count (see module docs for the heuristic chain)
    pub total_rows: u64,
    /// Rows currently materialized in the viewport
    pub visible_rows: usize,
    /// Currently selected rows within the viewport
    pub selected_rows: usize,
    /// Whether the loading overlay is active
    pub is_loading: bool,
    /// Current sort order, header scan order
    pub sorted_by: Vec<SortEntry>,
}

fn paging_total_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bof\s+([0-9][0-9,]*)").expect("valid pattern"))
}

fn status_bar_rows_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b([0-9][0-9,]*)\s+rows?\b").expect("valid pattern"))
}

fn parse_grouped_number(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

/// Best-effort total row count.
pub(crate) async fn total_rows(ctx: &GridContext) -> RejillaResult<u64> {
    let page = ctx.page();

    if let Some(text) = page.text(&address::paging_panel(ctx.root()), 0).await? {
        if let Some(total) = paging_total_pattern()
            .captures(&text)
            .and_then(|c| parse_grouped_number(&c[1]))
        {
            return Ok(total);
        }
    }

    if let Some(text) = page.text(&address::status_bar(ctx.root()), 0).await? {
        if let Some(total) = status_bar_rows_pattern()
            .captures(&text)
            .and_then(|c| parse_grouped_number(&c[1]))
        {
            return Ok(total);
        }
    }

    // Last resort: visible rows only. Undercounts under virtualization.
    let visible = page.count(&address::rows(ctx.root())).await?;
    debug!(visible, "no paging panel or status bar; using visible-row count as total");
    Ok(visible as u64)
}

/// Current sort order, derived from header sort-indicator attributes.
pub(crate) async fn sorted_by(ctx: &GridContext) -> RejillaResult<Vec<SortEntry>> {
    let page = ctx.page();
    let headers = address::header_cells(ctx.root());
    let count = page.count(&headers).await?;
    let mut entries = Vec::new();
    for nth in 0..count {
        let Some(direction) = page
            .attribute(&headers, nth, address::ATTR_ARIA_SORT)
            .await?
            .as_deref()
            .and_then(SortDirection::from_aria)
        else {
            continue;
        };
        if let Some(column_id) = page.attribute(&headers, nth, address::ATTR_COL_ID).await? {
            entries.push(SortEntry {
                column_id,
                direction,
            });
        }
    }
    Ok(entries)
}

/// Compute the full state snapshot.
pub(crate) async fn grid_state(ctx: &GridContext) -> RejillaResult<GridState> {
    let page = ctx.page();
    let visible = page.count(&address::rows(ctx.root())).await?;
    let selected = page.count(&address::selected_rows(ctx.root())).await?;
    Ok(GridState {
        total_rows: total_rows(ctx).await?,
        visible_rows: visible,
        selected_rows: selected,
        is_loading: overlay_visible(ctx, OverlayKind::Loading).await,
        sorted_by: sorted_by(ctx).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::driver::{MockElement, MockPage};
    use std::sync::Arc;

    const ROOT: &str = "#g";

    async fn ctx(page: Arc<MockPage>) -> GridContext {
        GridContext::resolve(page, GridConfig::from(ROOT)).await.unwrap()
    }

    #[tokio::test]
    async fn test_total_from_paging_panel() {
        let page = Arc::new(MockPage::new());
        page.insert(
            address::paging_panel(ROOT),
            MockElement::new("1 to 20 of 5,432"),
        );
        let ctx = ctx(Arc::clone(&page)).await;
        assert_eq!(total_rows(&ctx).await.unwrap(), 5432);
    }

    #[tokio::test]
    async fn test_total_from_status_bar_when_no_paging() {
        let page = Arc::new(MockPage::new());
        page.insert(address::status_bar(ROOT), MockElement::new("Rows: 311 rows"));
        let ctx = ctx(Arc::clone(&page)).await;
        assert_eq!(total_rows(&ctx).await.unwrap(), 311);
    }

    #[tokio::test]
    async fn test_total_falls_back_to_visible_count() {
        let page = Arc::new(MockPage::new());
        for i in 0..3 {
            page.insert(
                address::rows(ROOT),
                MockElement::new("").with_attr("row-index", i.to_string()),
            );
        }
        let ctx = ctx(Arc::clone(&page)).await;
        assert_eq!(total_rows(&ctx).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_paging_panel_without_pattern_falls_through() {
        let page = Arc::new(MockPage::new());
        page.insert(address::paging_panel(ROOT), MockElement::new("Page 1"));
        page.insert(address::status_bar(ROOT), MockElement::new("42 rows"));
        let ctx = ctx(Arc::clone(&page)).await;
        assert_eq!(total_rows(&ctx).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_sorted_by_scans_header_indicators() {
        let page = Arc::new(MockPage::new());
        let headers = address::header_cells(ROOT);
        page.insert(
            headers.clone(),
            MockElement::new("Amount")
                .with_attr("col-id", "amount")
                .with_attr("aria-sort", "ascending"),
        );
        page.insert(
            headers.clone(),
            MockElement::new("Status").with_attr("col-id", "status"),
        );
        page.insert(
            headers,
            MockElement::new("Owner")
                .with_attr("col-id", "owner")
                .with_attr("aria-sort", "descending"),
        );
        let ctx = ctx(Arc::clone(&page)).await;
        let entries = sorted_by(&ctx).await.unwrap();
        assert_eq!(
            entries,
            vec![
                SortEntry {
                    column_id: "amount".to_string(),
                    direction: SortDirection::Ascending
                },
                SortEntry {
                    column_id: "owner".to_string(),
                    direction: SortDirection::Descending
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_grid_state_snapshot() {
        let page = Arc::new(MockPage::new());
        for i in 0..2 {
            page.insert(
                address::rows(ROOT),
                MockElement::new("").with_attr("row-index", i.to_string()),
            );
        }
        page.insert(address::selected_rows(ROOT), MockElement::new(""));
        let ctx = ctx(Arc::clone(&page)).await;
        let state = grid_state(&ctx).await.unwrap();
        assert_eq!(state.visible_rows, 2);
        assert_eq!(state.selected_rows, 1);
        assert_eq!(state.total_rows, 2);
        assert!(!state.is_loading);
        assert!(state.sorted_by.is_empty());
    }

    mod direction_tests {
        use super::*;

        #[test]
        fn test_from_str_accepts_both_spellings() {
            assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
            assert_eq!(
                "DESCENDING".parse::<SortDirection>().unwrap(),
                SortDirection::Descending
            );
            assert!("sideways".parse::<SortDirection>().is_err());
        }

        #[test]
        fn test_from_aria() {
            assert_eq!(SortDirection::from_aria("ascending"), Some(SortDirection::Ascending));
            assert_eq!(SortDirection::from_aria("none"), None);
        }
    }
}
