//! Master/detail: nested grids hosted inside detail regions.
//!
//! Expanding a master row makes a sibling detail region appear; the region
//! hosts a full grid root of its own. A detail grid is therefore just a new
//! harness whose address is scoped beneath the detail region. Nesting to
//! arbitrary depth is plain recursion, with no depth limit baked into the
//! data model.

use std::sync::Arc;

use crate::address;
use crate::config::GridConfig;
use crate::harness::GridHarness;
use crate::matcher::RowMatcher;
use crate::result::RejillaResult;
use crate::wait;

impl GridHarness {
    /// Expand a master row (if needed), wait for its detail region, and
    /// return a harness scoped to the nested grid.
    ///
    /// `config` supplies the nested grid's column metadata and timeouts; its
    /// address is replaced by the detail region's scoped root.
    pub async fn detail_grid(
        &self,
        row_matcher: &RowMatcher,
        config: impl Into<GridConfig>,
    ) -> RejillaResult<GridHarness> {
        let row = self.require_row(row_matcher).await?;
        self.expand_row(row_matcher).await?;

        let ctx = self.ctx();
        let region = address::detail_region(ctx.root(), row.viewport_index);
        let condition = format!("detail region for row {}", row.viewport_index);
        wait::poll_until(ctx.config().timeouts.row_load_ms, &condition, || {
            let region = region.clone();
            async move { Ok(ctx.page().count(&region).await? > 0) }
        })
        .await?;

        let mut detail_config = config.into();
        detail_config.address = address::detail_grid_root(ctx.root(), row.viewport_index);
        GridHarness::attach(Arc::clone(ctx.page()), detail_config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::driver::{MockElement, MockPage};

    const ROOT: &str = "#g";

    async fn harness(page: Arc<MockPage>) -> GridHarness {
        let config = GridConfig::from(ROOT)
            .with_timeouts(Timeouts::new().with_row_load(200).with_scroll(1));
        GridHarness::attach(page, config).await.unwrap()
    }

    fn seed_master(page: &MockPage, index: u32, expanded: bool) {
        let el = MockElement::new("")
            .with_attr("row-index", index.to_string())
            .with_attr("aria-expanded", expanded.to_string());
        page.insert(address::rows(ROOT), el.clone());
        page.insert(address::row_by_viewport_index(ROOT, index), el);
        page.insert(address::row_contracted_toggle(ROOT, index), MockElement::new(""));
    }

    #[tokio::test]
    async fn test_detail_grid_scopes_beneath_the_region() {
        let page = Arc::new(MockPage::new());
        seed_master(&page, 0, true);
        page.insert(address::detail_region(ROOT, 0), MockElement::new(""));
        let detail_root = address::detail_grid_root(ROOT, 0);
        page.insert(detail_root.clone(), MockElement::new(""));
        let h = harness(Arc::clone(&page)).await;

        let detail = h
            .detail_grid(&RowMatcher::viewport_index(0), GridConfig::new("ignored"))
            .await
            .unwrap();
        assert_eq!(detail.context().root(), detail_root);
        // Already expanded: no toggle clicks were needed.
        assert!(page.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_detail_grid_expands_collapsed_master() {
        let page = Arc::new(MockPage::new());
        seed_master(&page, 2, false);
        page.insert(address::detail_region(ROOT, 2), MockElement::new(""));
        let h = harness(Arc::clone(&page)).await;
        let detail = h
            .detail_grid(&RowMatcher::viewport_index(2), GridConfig::new("x"))
            .await
            .unwrap();
        assert_eq!(page.clicks(), vec![address::row_contracted_toggle(ROOT, 2)]);
        assert_eq!(detail.context().root(), address::detail_grid_root(ROOT, 2));
    }

    #[tokio::test]
    async fn test_nested_detail_recursion() {
        let page = Arc::new(MockPage::new());
        seed_master(&page, 0, true);
        page.insert(address::detail_region(ROOT, 0), MockElement::new(""));
        let level1_root = address::detail_grid_root(ROOT, 0);
        // The nested grid has its own master row and detail region.
        let el = MockElement::new("")
            .with_attr("row-index", "0")
            .with_attr("aria-expanded", "true");
        page.insert(address::rows(&level1_root), el.clone());
        page.insert(address::row_by_viewport_index(&level1_root, 0), el);
        page.insert(address::detail_region(&level1_root, 0), MockElement::new(""));
        let level2_root = address::detail_grid_root(&level1_root, 0);

        let h = harness(Arc::clone(&page)).await;
        let level1 = h
            .detail_grid(&RowMatcher::viewport_index(0), GridConfig::new("x"))
            .await
            .unwrap();
        let level2 = level1
            .detail_grid(&RowMatcher::viewport_index(0), GridConfig::new("x"))
            .await
            .unwrap();
        assert_eq!(level2.context().root(), level2_root);
    }

    #[tokio::test]
    async fn test_detail_region_never_appearing_times_out() {
        let page = Arc::new(MockPage::new());
        seed_master(&page, 0, true);
        let h = harness(Arc::clone(&page)).await;
        let err = h
            .detail_grid(&RowMatcher::viewport_index(0), GridConfig::new("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("detail region"));
    }
}
