//! Locator context: a normalized configuration bound to a live page.
//!
//! The context resolves the grid root once, then hands out lazy
//! [`ElementLocator`] handles. A handle is a selector plus a match index;
//! nothing is cached across calls, which is what keeps reads correct while
//! the widget virtualizes rows in and out of the document.

use std::sync::Arc;

use crate::address;
use crate::config::GridConfig;
use crate::driver::{BoundingBox, PageDriver};
use crate::result::RejillaResult;

/// A lazy element handle: how to find the element, not the element itself.
#[derive(Clone)]
pub struct ElementLocator {
    page: Arc<dyn PageDriver>,
    selector: String,
    nth: usize,
}

impl std::fmt::Debug for ElementLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementLocator")
            .field("selector", &self.selector)
            .field("nth", &self.nth)
            .finish_non_exhaustive()
    }
}

impl ElementLocator {
    pub(crate) fn new(page: Arc<dyn PageDriver>, selector: impl Into<String>) -> Self {
        Self {
            page,
            selector: selector.into(),
            nth: 0,
        }
    }

    /// The selector this handle resolves at call time
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Re-target the handle at the nth match of its selector
    #[must_use]
    pub const fn item(mut self, nth: usize) -> Self {
        self.nth = nth;
        self
    }

    /// Number of elements currently matching
    pub async fn count(&self) -> RejillaResult<usize> {
        self.page.count(&self.selector).await
    }

    /// Text content, `None` if absent
    pub async fn text(&self) -> RejillaResult<Option<String>> {
        self.page.text(&self.selector, self.nth).await
    }

    /// Attribute value, `None` if the element or attribute is absent
    pub async fn attribute(&self, name: &str) -> RejillaResult<Option<String>> {
        self.page.attribute(&self.selector, self.nth, name).await
    }

    /// Whether the element exists and is visible
    pub async fn is_visible(&self) -> RejillaResult<bool> {
        self.page.is_visible(&self.selector, self.nth).await
    }

    /// Bounding box, `None` if absent or unrendered
    pub async fn bounding_box(&self) -> RejillaResult<Option<BoundingBox>> {
        self.page.bounding_box(&self.selector, self.nth).await
    }

    /// Click the element
    pub async fn click(&self) -> RejillaResult<()> {
        self.page.click(&self.selector, self.nth).await
    }

    /// Double-click the element
    pub async fn double_click(&self) -> RejillaResult<()> {
        self.page.double_click(&self.selector, self.nth).await
    }

    /// Clear and fill with text
    pub async fn fill(&self, text: &str) -> RejillaResult<()> {
        self.page.fill(&self.selector, self.nth, text).await
    }

    /// Scroll into view
    pub async fn scroll_into_view(&self) -> RejillaResult<()> {
        self.page.scroll_into_view(&self.selector, self.nth).await
    }
}

/// A normalized configuration bound to a live page handle.
///
/// Cheap to clone; all higher components (matching, extraction, waits, state,
/// assertions, enterprise extensions) consume this context rather than
/// talking to the page directly.
#[derive(Clone)]
pub struct GridContext {
    page: Arc<dyn PageDriver>,
    config: Arc<GridConfig>,
    root: String,
}

impl std::fmt::Debug for GridContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridContext")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GridContext {
    /// Validate the configuration and resolve the grid root.
    ///
    /// Resolution: a structural address is taken literally; anything else is
    /// tried as a stable test-identifier attribute value, falling back to the
    /// literal string when no attribute match exists on the page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RejillaError::Configuration`] for malformed config,
    /// or a page error if the root probe fails.
    pub(crate) async fn resolve(
        page: Arc<dyn PageDriver>,
        config: GridConfig,
    ) -> RejillaResult<Self> {
        config.validate()?;
        let root = if address::is_structural(&config.address) {
            config.address.clone()
        } else {
            let by_test_id = address::by_test_id(&config.address);
            if page.count(&by_test_id).await? > 0 {
                by_test_id
            } else {
                tracing::debug!(
                    address = %config.address,
                    "no test-id match; treating address as a literal selector"
                );
                config.address.clone()
            }
        };
        Ok(Self {
            page,
            config: Arc::new(config),
            root,
        })
    }

    /// The bound page handle
    #[must_use]
    pub fn page(&self) -> &Arc<dyn PageDriver> {
        &self.page
    }

    /// The normalized configuration
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// The resolved root selector
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Handle on an arbitrary selector
    #[must_use]
    pub fn locator(&self, selector: impl Into<String>) -> ElementLocator {
        ElementLocator::new(Arc::clone(&self.page), selector)
    }

    /// Handle on the grid root
    #[must_use]
    pub fn grid(&self) -> ElementLocator {
        self.locator(self.root.clone())
    }

    /// Handle on all body rows, in visible order
    #[must_use]
    pub fn rows(&self) -> ElementLocator {
        self.locator(address::rows(&self.root))
    }

    /// Handle on a header cell
    #[must_use]
    pub fn header_cell(&self, column_id: &str) -> ElementLocator {
        self.locator(address::header_cell(&self.root, column_id))
    }

    /// Handle on a column's floating-filter input
    #[must_use]
    pub fn filter_input(&self, column_id: &str) -> ElementLocator {
        self.locator(address::filter_input(&self.root, column_id))
    }

    /// Handle on a cell by viewport index and column id
    #[must_use]
    pub fn cell_at(&self, viewport_index: u32, column_id: &str) -> ElementLocator {
        self.locator(address::cell(&self.root, viewport_index, column_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockElement, MockPage};

    fn page_with_testid_root() -> Arc<MockPage> {
        let page = Arc::new(MockPage::new());
        page.insert("[data-testid=\"orders\"]", MockElement::new(""));
        page
    }

    #[tokio::test]
    async fn test_structural_address_taken_literally() {
        let page = Arc::new(MockPage::new());
        let ctx = GridContext::resolve(page, GridConfig::from("#orders-grid"))
            .await
            .unwrap();
        assert_eq!(ctx.root(), "#orders-grid");
    }

    #[tokio::test]
    async fn test_plain_address_resolves_via_test_id() {
        let page = page_with_testid_root();
        let ctx = GridContext::resolve(page, GridConfig::from("orders"))
            .await
            .unwrap();
        assert_eq!(ctx.root(), "[data-testid=\"orders\"]");
    }

    #[tokio::test]
    async fn test_plain_address_falls_back_to_literal() {
        let page = Arc::new(MockPage::new());
        let ctx = GridContext::resolve(page, GridConfig::from("orders"))
            .await
            .unwrap();
        assert_eq!(ctx.root(), "orders");
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_any_page_probe() {
        let page = Arc::new(MockPage::new());
        let err = GridContext::resolve(page, GridConfig::from(""))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing address"));
    }

    #[tokio::test]
    async fn test_locators_are_lazy() {
        let page = page_with_testid_root();
        let ctx = GridContext::resolve(Arc::clone(&page), GridConfig::from("orders"))
            .await
            .unwrap();
        let rows = ctx.rows();
        assert_eq!(rows.count().await.unwrap(), 0);
        // Element appears after the handle was created; the handle sees it.
        page.insert(address::rows(ctx.root()), MockElement::new("r0"));
        assert_eq!(rows.count().await.unwrap(), 1);
    }
}
