//! The narrow page interface the harness consumes.
//!
//! Rejilla never owns browser lifecycle, navigation, or network interception;
//! it drives an already-open page through [`PageDriver`], an abstract trait
//! over element reads and input simulation. Handles are lazy by construction:
//! every operation takes a selector (plus an index into its match list) and
//! resolves it at call time, because a virtualized grid continuously adds and
//! removes row elements.
//!
//! # Implementations
//!
//! - [`MockPage`]: in-memory element store, always compiled, drives the
//!   unit and property tests
//! - `CdpPage`: chromiumoxide-backed, behind the `browser` feature

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::RejillaResult;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box of an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point, the anchor for pointer simulation
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Abstract driver over the underlying browser-automation layer.
///
/// Every method addresses elements by `(selector, nth)`: the selector is
/// evaluated fresh on each call and `nth` indexes into its match list in DOM
/// order. Read methods return `None`/`false` for absent elements rather than
/// erroring; only transport-level failures produce `Err`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Number of elements currently matching a selector
    async fn count(&self, selector: &str) -> RejillaResult<usize>;

    /// Text content of the nth match, `None` if absent
    async fn text(&self, selector: &str, nth: usize) -> RejillaResult<Option<String>>;

    /// Attribute value of the nth match, `None` if the element or the
    /// attribute is absent
    async fn attribute(
        &self,
        selector: &str,
        nth: usize,
        name: &str,
    ) -> RejillaResult<Option<String>>;

    /// Whether the nth match exists and is visible
    async fn is_visible(&self, selector: &str, nth: usize) -> RejillaResult<bool>;

    /// Bounding box of the nth match, `None` if absent or unrendered
    async fn bounding_box(&self, selector: &str, nth: usize)
        -> RejillaResult<Option<BoundingBox>>;

    /// Click the nth match
    async fn click(&self, selector: &str, nth: usize) -> RejillaResult<()>;

    /// Double-click the nth match
    async fn double_click(&self, selector: &str, nth: usize) -> RejillaResult<()>;

    /// Clear and fill the nth match with text
    async fn fill(&self, selector: &str, nth: usize, text: &str) -> RejillaResult<()>;

    /// Press a key (or `Modifier+key` chord) at the current focus
    async fn press_key(&self, key: &str) -> RejillaResult<()>;

    /// Pointer-down at `from`, move in `steps` increments, pointer-up at `to`
    async fn drag(&self, from: Point, to: Point, steps: u32) -> RejillaResult<()>;

    /// Scroll the nth match into view
    async fn scroll_into_view(&self, selector: &str, nth: usize) -> RejillaResult<()>;

    /// Scroll the first match by a pixel delta
    async fn scroll_by(&self, selector: &str, dx: f64, dy: f64) -> RejillaResult<()>;
}

// ============================================================================
// Mock implementation
// ============================================================================

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// One element in the [`MockPage`] store
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    /// Text content
    pub text: String,
    /// Attribute map
    pub attrs: HashMap<String, String>,
    /// Visibility flag
    pub visible: bool,
    /// Bounding box, if positioned
    pub bbox: Option<BoundingBox>,
}

impl MockElement {
    /// Create a visible element with text content
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attrs: HashMap::new(),
            visible: true,
            bbox: None,
        }
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attrs.insert(name.into(), value.into());
        self
    }

    /// Mark hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Position the element
    #[must_use]
    pub const fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

#[derive(Debug, Default)]
struct MockPageState {
    elements: HashMap<String, Vec<MockElement>>,
    clicks: Vec<String>,
    double_clicks: Vec<String>,
    fills: Vec<(String, String)>,
    keys: Vec<String>,
    drags: Vec<(Point, Point, u32)>,
    scrolls: Vec<(String, f64, f64)>,
}

/// In-memory [`PageDriver`] for unit testing without a browser.
///
/// Elements are stored under exact selector strings; tests build keys with
/// the same address-layer functions the engine uses, so lookups line up
/// without a CSS engine. Input operations are recorded for verification.
#[derive(Debug, Default)]
pub struct MockPage {
    state: Mutex<MockPageState>,
}

impl MockPage {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockPageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an element under a selector key
    pub fn insert(&self, selector: impl Into<String>, element: MockElement) {
        self.lock()
            .elements
            .entry(selector.into())
            .or_default()
            .push(element);
    }

    /// Replace all elements under a selector key
    pub fn set(&self, selector: impl Into<String>, elements: Vec<MockElement>) {
        let _ = self.lock().elements.insert(selector.into(), elements);
    }

    /// Remove every element under a selector key
    pub fn remove(&self, selector: &str) {
        let _ = self.lock().elements.remove(selector);
    }

    /// Mutate the nth element under a selector key, if present
    pub fn update<F: FnOnce(&mut MockElement)>(&self, selector: &str, nth: usize, f: F) {
        if let Some(el) = self
            .lock()
            .elements
            .get_mut(selector)
            .and_then(|v| v.get_mut(nth))
        {
            f(el);
        }
    }

    /// Selectors clicked so far, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    /// Selectors double-clicked so far, in order
    #[must_use]
    pub fn double_clicks(&self) -> Vec<String> {
        self.lock().double_clicks.clone()
    }

    /// `(selector, text)` fills so far, in order
    #[must_use]
    pub fn fills(&self) -> Vec<(String, String)> {
        self.lock().fills.clone()
    }

    /// Keys pressed so far, in order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys.clone()
    }

    /// Drags performed so far, in order
    #[must_use]
    pub fn drags(&self) -> Vec<(Point, Point, u32)> {
        self.lock().drags.clone()
    }

    /// `(selector, dx, dy)` scrolls so far, in order
    #[must_use]
    pub fn scrolls(&self) -> Vec<(String, f64, f64)> {
        self.lock().scrolls.clone()
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn count(&self, selector: &str) -> RejillaResult<usize> {
        Ok(self.lock().elements.get(selector).map_or(0, Vec::len))
    }

    async fn text(&self, selector: &str, nth: usize) -> RejillaResult<Option<String>> {
        Ok(self
            .lock()
            .elements
            .get(selector)
            .and_then(|v| v.get(nth))
            .map(|el| el.text.clone()))
    }

    async fn attribute(
        &self,
        selector: &str,
        nth: usize,
        name: &str,
    ) -> RejillaResult<Option<String>> {
        Ok(self
            .lock()
            .elements
            .get(selector)
            .and_then(|v| v.get(nth))
            .and_then(|el| el.attrs.get(name).cloned()))
    }

    async fn is_visible(&self, selector: &str, nth: usize) -> RejillaResult<bool> {
        Ok(self
            .lock()
            .elements
            .get(selector)
            .and_then(|v| v.get(nth))
            .is_some_and(|el| el.visible))
    }

    async fn bounding_box(
        &self,
        selector: &str,
        nth: usize,
    ) -> RejillaResult<Option<BoundingBox>> {
        Ok(self
            .lock()
            .elements
            .get(selector)
            .and_then(|v| v.get(nth))
            .and_then(|el| el.bbox))
    }

    async fn click(&self, selector: &str, _nth: usize) -> RejillaResult<()> {
        self.lock().clicks.push(selector.to_string());
        Ok(())
    }

    async fn double_click(&self, selector: &str, _nth: usize) -> RejillaResult<()> {
        self.lock().double_clicks.push(selector.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, _nth: usize, text: &str) -> RejillaResult<()> {
        self.lock()
            .fills
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> RejillaResult<()> {
        self.lock().keys.push(key.to_string());
        Ok(())
    }

    async fn drag(&self, from: Point, to: Point, steps: u32) -> RejillaResult<()> {
        self.lock().drags.push((from, to, steps));
        Ok(())
    }

    async fn scroll_into_view(&self, _selector: &str, _nth: usize) -> RejillaResult<()> {
        Ok(())
    }

    async fn scroll_by(&self, selector: &str, dx: f64, dy: f64) -> RejillaResult<()> {
        self.lock().scrolls.push((selector.to_string(), dx, dy));
        Ok(())
    }
}
