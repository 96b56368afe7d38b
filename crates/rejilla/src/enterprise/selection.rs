//! Range selection: rectangular cell ranges, fill-handle drags.
//!
//! A range is selected by simulating pointer-down at the start cell's
//! midpoint, dragging across intermediate points, and releasing at the end
//! cell's midpoint. Fill-handle operations extend a selection by N rows or
//! columns with the same drag primitive, anchored at the fill-handle
//! sub-element.

use crate::address;
use crate::harness::GridHarness;
use crate::matcher::RowMatcher;
use crate::result::{RejillaError, RejillaResult};

/// Intermediate pointer moves per drag
const DRAG_STEPS: u32 = 8;

impl GridHarness {
    /// Select a rectangular cell range by dragging from one cell's midpoint
    /// to another's.
    pub async fn select_cell_range(
        &self,
        from: (&RowMatcher, &str),
        to: (&RowMatcher, &str),
    ) -> RejillaResult<()> {
        let start = self.cell_midpoint(from.0, from.1).await?;
        let end = self.cell_midpoint(to.0, to.1).await?;
        self.ctx().page().drag(start, end, DRAG_STEPS).await
    }

    async fn cell_midpoint(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
    ) -> RejillaResult<crate::Point> {
        let row = self.require_row(row_matcher).await?;
        let selector = address::cell(self.ctx().root(), row.viewport_index, column_id);
        let bbox = self
            .ctx()
            .page()
            .bounding_box(&selector, 0)
            .await?
            .ok_or_else(|| {
                RejillaError::Input {
                    message: format!(
                        "cell {column_id} of row ({row_matcher}) has no bounding box; \
                         is it rendered?"
                    ),
                }
            })?;
        Ok(bbox.center())
    }

    /// Drag the fill handle down by `rows` rows and right by `cols` columns
    /// (negative values drag up/left), extending the current selection.
    pub async fn drag_fill_handle(&self, rows: i32, cols: i32) -> RejillaResult<()> {
        let ctx = self.ctx();
        let handle = address::fill_handle(ctx.root());
        let handle_box = ctx
            .page()
            .bounding_box(&handle, 0)
            .await?
            .ok_or_else(|| RejillaError::Input {
                message: "fill handle not present; is a range selected?".to_string(),
            })?;

        // Geometry comes from the first rendered row and header cell.
        let row_box = ctx
            .page()
            .bounding_box(&address::rows(ctx.root()), 0)
            .await?
            .ok_or_else(|| RejillaError::Input {
                message: "fill-handle drag needs at least one rendered row".to_string(),
            })?;
        let header_box = ctx
            .page()
            .bounding_box(&address::header_cells(ctx.root()), 0)
            .await?
            .ok_or_else(|| RejillaError::Input {
                message: "fill-handle drag needs a rendered header cell".to_string(),
            })?;

        let start = handle_box.center();
        let end = crate::Point::new(
            start.x + f64::from(cols) * header_box.width,
            start.y + f64::from(rows) * row_box.height,
        );
        ctx.page().drag(start, end, DRAG_STEPS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::driver::{BoundingBox, MockElement, MockPage};
    use std::sync::Arc;

    const ROOT: &str = "#g";

    async fn harness(page: Arc<MockPage>) -> GridHarness {
        GridHarness::attach(page, GridConfig::from(ROOT)).await.unwrap()
    }

    fn seed_cell(page: &MockPage, index: u32, col: &str, bbox: BoundingBox) {
        let el = MockElement::new("").with_attr("row-index", index.to_string());
        page.insert(address::rows(ROOT), el.clone().with_bbox(BoundingBox::new(
            0.0,
            40.0 * f64::from(index),
            400.0,
            40.0,
        )));
        page.insert(address::row_by_viewport_index(ROOT, index), el);
        page.insert(
            address::cell(ROOT, index, col),
            MockElement::new("").with_bbox(bbox),
        );
    }

    #[tokio::test]
    async fn test_range_drag_uses_cell_midpoints() {
        let page = Arc::new(MockPage::new());
        seed_cell(&page, 0, "a", BoundingBox::new(0.0, 0.0, 100.0, 40.0));
        seed_cell(&page, 2, "b", BoundingBox::new(100.0, 80.0, 100.0, 40.0));
        let h = harness(Arc::clone(&page)).await;
        h.select_cell_range(
            (&RowMatcher::viewport_index(0), "a"),
            (&RowMatcher::viewport_index(2), "b"),
        )
        .await
        .unwrap();
        let drags = page.drags();
        assert_eq!(drags.len(), 1);
        let (from, to, steps) = drags[0];
        assert!((from.x - 50.0).abs() < f64::EPSILON);
        assert!((from.y - 20.0).abs() < f64::EPSILON);
        assert!((to.x - 150.0).abs() < f64::EPSILON);
        assert!((to.y - 100.0).abs() < f64::EPSILON);
        assert_eq!(steps, DRAG_STEPS);
    }

    #[tokio::test]
    async fn test_range_drag_requires_rendered_cells() {
        let page = Arc::new(MockPage::new());
        seed_cell(&page, 0, "a", BoundingBox::new(0.0, 0.0, 100.0, 40.0));
        // Row 2 exists but its cell has no bounding box.
        let el = MockElement::new("").with_attr("row-index", "2");
        page.insert(address::rows(ROOT), el.clone());
        page.insert(address::row_by_viewport_index(ROOT, 2), el);
        page.insert(address::cell(ROOT, 2, "b"), MockElement::new(""));
        let h = harness(Arc::clone(&page)).await;
        let err = h
            .select_cell_range(
                (&RowMatcher::viewport_index(0), "a"),
                (&RowMatcher::viewport_index(2), "b"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RejillaError::Input { .. }));
    }

    #[tokio::test]
    async fn test_fill_handle_drag_geometry() {
        let page = Arc::new(MockPage::new());
        seed_cell(&page, 0, "a", BoundingBox::new(0.0, 0.0, 100.0, 40.0));
        page.insert(
            address::header_cells(ROOT),
            MockElement::new("A").with_bbox(BoundingBox::new(0.0, 0.0, 120.0, 30.0)),
        );
        page.insert(
            address::fill_handle(ROOT),
            MockElement::new("").with_bbox(BoundingBox::new(98.0, 38.0, 4.0, 4.0)),
        );
        let h = harness(Arc::clone(&page)).await;
        h.drag_fill_handle(3, 0).await.unwrap();
        let (from, to, _) = page.drags()[0];
        // 3 rows down at 40px row height.
        assert!((to.y - (from.y + 120.0)).abs() < f64::EPSILON);
        assert!((to.x - from.x).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_fill_handle_absent_is_an_input_error() {
        let page = Arc::new(MockPage::new());
        let h = harness(Arc::clone(&page)).await;
        let err = h.drag_fill_handle(1, 0).await.unwrap_err();
        assert!(matches!(err, RejillaError::Input { .. }));
        assert!(err.to_string().contains("fill handle"));
    }
}
