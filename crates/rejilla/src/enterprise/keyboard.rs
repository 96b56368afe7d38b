//! Keyboard-driven navigation, editing, and clipboard operations.
//!
//! Focus moves by dispatching directional/paging key events at the currently
//! focused cell; edit-mode entry/exit and clipboard operations are keyboard
//! events too, not pointer events; that is how the widget itself listens.

use crate::harness::GridHarness;
use crate::matcher::RowMatcher;
use crate::result::RejillaResult;

/// Directional and paging navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    /// One cell up
    Up,
    /// One cell down
    Down,
    /// One cell left
    Left,
    /// One cell right
    Right,
    /// One page up
    PageUp,
    /// One page down
    PageDown,
    /// First cell in the row
    Home,
    /// Last cell in the row
    End,
    /// Next cell (wrapping)
    Tab,
}

impl NavKey {
    /// The key event name to dispatch
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Up => "ArrowUp",
            Self::Down => "ArrowDown",
            Self::Left => "ArrowLeft",
            Self::Right => "ArrowRight",
            Self::PageUp => "PageUp",
            Self::PageDown => "PageDown",
            Self::Home => "Home",
            Self::End => "End",
            Self::Tab => "Tab",
        }
    }
}

impl GridHarness {
    /// Focus a cell by clicking it
    pub async fn focus_cell(
        &self,
        row_matcher: &RowMatcher,
        column_id: &str,
    ) -> RejillaResult<()> {
        self.click_cell(row_matcher, column_id).await
    }

    /// Move focus with a navigation key
    pub async fn navigate(&self, key: NavKey) -> RejillaResult<()> {
        self.ctx().page().press_key(key.key()).await
    }

    /// Enter edit mode on the focused cell
    pub async fn begin_edit(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Enter").await
    }

    /// Commit the open editor
    pub async fn commit_edit(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Enter").await
    }

    /// Cancel the open editor, discarding the pending value
    pub async fn cancel_edit(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Escape").await
    }

    /// Copy the focused cell or range
    pub async fn copy(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Control+c").await
    }

    /// Cut the focused cell or range
    pub async fn cut(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Control+x").await
    }

    /// Paste at the focused cell
    pub async fn paste(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Control+v").await
    }

    /// Undo the last cell edit
    pub async fn undo(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Control+z").await
    }

    /// Redo the last undone cell edit
    pub async fn redo(&self) -> RejillaResult<()> {
        self.ctx().page().press_key("Control+y").await
    }
}
