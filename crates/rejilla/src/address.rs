//! Address layer: structural selectors and attribute names for grid landmarks.
//!
//! Everything here is pure and stateless. The rest of the crate never writes
//! a raw selector string for a grid landmark; it goes through this module so
//! the widget's DOM contract lives in exactly one place.
//!
//! The addresses target the common enterprise data-grid DOM shape: a root
//! wrapper, a header band, three row containers (pinned-left, center,
//! pinned-right), per-row `row-index`/`row-id` attributes, per-cell `col-id`
//! attributes, and overlay wrappers that are deactivated with a `hidden`
//! class rather than removed from the document.

// =============================================================================
// STRUCTURAL SELECTORS
// =============================================================================

/// Grid root wrapper
pub const GRID_ROOT: &str = ".ag-root-wrapper";

/// Header band
pub const HEADER: &str = ".ag-header";

/// A single header cell
pub const HEADER_CELL: &str = ".ag-header-cell";

/// A header group cell (column grouping)
pub const HEADER_GROUP_CELL: &str = ".ag-header-group-cell";

/// Scrollable body viewport
pub const BODY_VIEWPORT: &str = ".ag-body-viewport";

/// Center (unpinned) row container; the canonical source for row enumeration.
/// Pinned containers repeat every row element, so counting across all three
/// would triple-count.
pub const CENTER_ROWS: &str = ".ag-center-cols-container";

/// A body row
pub const ROW: &str = ".ag-row";

/// A body cell
pub const CELL: &str = ".ag-cell";

/// Loading overlay wrapper
pub const LOADING_OVERLAY: &str = ".ag-overlay-loading-wrapper";

/// "No rows" overlay wrapper
pub const NO_ROWS_OVERLAY: &str = ".ag-overlay-no-rows-wrapper";

/// Class toggled on overlay wrappers (and group toggles) when inactive
pub const HIDDEN_CLASS: &str = "ag-hidden";

/// Paging panel (bottom bar with "1 to 20 of 5,000")
pub const PAGING_PANEL: &str = ".ag-paging-panel";

/// Status bar (optional widget panel carrying row counts)
pub const STATUS_BAR: &str = ".ag-status-bar";

/// Collapsed group/tree/master toggle control
pub const GROUP_CONTRACTED: &str = ".ag-group-contracted";

/// Expanded group/tree/master toggle control
pub const GROUP_EXPANDED: &str = ".ag-group-expanded";

/// Detail region hosting a nested grid under an expanded master row
pub const DETAILS_ROW: &str = ".ag-details-row";

/// Placeholder row rendered while a server-side block is loading
pub const ROW_LOADING: &str = ".ag-row-loading";

/// Range-selection fill handle
pub const FILL_HANDLE: &str = ".ag-fill-handle";

/// Row selection checkbox wrapper
pub const SELECTION_CHECKBOX: &str = ".ag-selection-checkbox";

/// Class present on a cell while its inline editor is open
pub const CELL_EDITING_CLASS: &str = "ag-cell-inline-editing";

/// Floating filter cell under the header
pub const FLOATING_FILTER: &str = ".ag-floating-filter";

// =============================================================================
// RENDERER PROBE SELECTORS (fixed heuristic order, see extraction engine)
// =============================================================================

/// Checkbox renderer probe
pub const RENDER_CHECKBOX: &str = "input[type=\"checkbox\"]";

/// Link renderer probe
pub const RENDER_LINK: &str = "a";

/// Editable input renderer probe
pub const RENDER_INPUT: &str = "input:not([type=\"checkbox\"])";

/// Select/dropdown renderer probe
pub const RENDER_SELECT: &str = "select";

/// Badge/tag/chip renderer probe
pub const RENDER_BADGE: &str = ".badge, .tag, .chip";

/// Button renderer probe
pub const RENDER_BUTTON: &str = "button";

// =============================================================================
// ATTRIBUTE NAMES
// =============================================================================

/// Zero-based viewport position of a row element
pub const ATTR_ROW_INDEX: &str = "row-index";

/// Stable row identifier assigned by the widget's row model
pub const ATTR_ROW_ID: &str = "row-id";

/// Column identifier on cells and header cells
pub const ATTR_COL_ID: &str = "col-id";

/// One-based ARIA row position (includes header rows)
pub const ATTR_ARIA_ROW_INDEX: &str = "aria-rowindex";

/// Sort indicator on header cells: "ascending" | "descending" | "none"
pub const ATTR_ARIA_SORT: &str = "aria-sort";

/// Selection state on rows
pub const ATTR_ARIA_SELECTED: &str = "aria-selected";

/// Expansion state on group/master rows and header group cells
pub const ATTR_ARIA_EXPANDED: &str = "aria-expanded";

/// Nesting depth of a tree/group row (one-based)
pub const ATTR_ARIA_LEVEL: &str = "aria-level";

/// Stable test-identifier attribute used for root resolution
pub const TEST_ID_ATTR: &str = "data-testid";

// =============================================================================
// SELECTOR BUILDERS
// =============================================================================

/// Escape a value for embedding inside a double-quoted CSS attribute selector.
#[must_use]
pub fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Selector matching elements carrying the stable test-identifier attribute.
#[must_use]
pub fn by_test_id(value: &str) -> String {
    format!("[{TEST_ID_ATTR}=\"{}\"]", css_escape(value))
}

/// Whether an address string is already a structural selector.
///
/// Anything starting with a structural-selector sigil is treated literally;
/// everything else is first tried as a test-identifier attribute value.
#[must_use]
pub fn is_structural(address: &str) -> bool {
    matches!(address.chars().next(), Some('.' | '#' | '[' | '*'))
        || address.contains(' ')
        || address.contains('>')
}

/// All body rows, in visible DOM order.
#[must_use]
pub fn rows(root: &str) -> String {
    format!("{root} {CENTER_ROWS} {ROW}")
}

/// Body row by zero-based viewport index.
#[must_use]
pub fn row_by_viewport_index(root: &str, index: u32) -> String {
    format!("{root} {CENTER_ROWS} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"]")
}

/// Body row by one-based ARIA position.
#[must_use]
pub fn row_by_aria_position(root: &str, position: u32) -> String {
    format!("{root} {CENTER_ROWS} {ROW}[{ATTR_ARIA_ROW_INDEX}=\"{position}\"]")
}

/// Body row by stable id.
#[must_use]
pub fn row_by_stable_id(root: &str, id: &str) -> String {
    format!(
        "{root} {CENTER_ROWS} {ROW}[{ATTR_ROW_ID}=\"{}\"]",
        css_escape(id)
    )
}

/// All cells of the row at a viewport index, across every container (pinned
/// cells live outside the center container).
#[must_use]
pub fn row_cells(root: &str, index: u32) -> String {
    format!("{root} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"] {CELL}")
}

/// One cell, by viewport index and column id.
#[must_use]
pub fn cell(root: &str, index: u32, column_id: &str) -> String {
    format!(
        "{root} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"] {CELL}[{ATTR_COL_ID}=\"{}\"]",
        css_escape(column_id)
    )
}

/// The cell while its inline editor is open.
#[must_use]
pub fn cell_editing(root: &str, index: u32, column_id: &str) -> String {
    format!(
        "{root} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"] {CELL}[{ATTR_COL_ID}=\"{}\"].{CELL_EDITING_CLASS}",
        css_escape(column_id)
    )
}

/// The editor input inside a cell in edit mode.
#[must_use]
pub fn cell_editor_input(root: &str, index: u32, column_id: &str) -> String {
    format!("{} input", cell(root, index, column_id))
}

/// Header cell by column id.
#[must_use]
pub fn header_cell(root: &str, column_id: &str) -> String {
    format!(
        "{root} {HEADER} {HEADER_CELL}[{ATTR_COL_ID}=\"{}\"]",
        css_escape(column_id)
    )
}

/// All header cells, in DOM order.
#[must_use]
pub fn header_cells(root: &str) -> String {
    format!("{root} {HEADER} {HEADER_CELL}")
}

/// Header group cell by group id.
#[must_use]
pub fn header_group_cell(root: &str, group_id: &str) -> String {
    format!(
        "{root} {HEADER} {HEADER_GROUP_CELL}[{ATTR_COL_ID}=\"{}\"]",
        css_escape(group_id)
    )
}

/// Floating-filter input for a column.
#[must_use]
pub fn filter_input(root: &str, column_id: &str) -> String {
    format!(
        "{root} {HEADER} {FLOATING_FILTER}[{ATTR_COL_ID}=\"{}\"] input",
        css_escape(column_id)
    )
}

/// Loading overlay wrapper scoped to a grid root.
#[must_use]
pub fn loading_overlay(root: &str) -> String {
    format!("{root} {LOADING_OVERLAY}")
}

/// "No rows" overlay wrapper scoped to a grid root.
#[must_use]
pub fn no_rows_overlay(root: &str) -> String {
    format!("{root} {NO_ROWS_OVERLAY}")
}

/// The "active" form of an overlay wrapper (not carrying the hidden class).
#[must_use]
pub fn overlay_active(overlay: &str) -> String {
    format!("{overlay}:not(.{HIDDEN_CLASS})")
}

/// Paging panel scoped to a grid root.
#[must_use]
pub fn paging_panel(root: &str) -> String {
    format!("{root} {PAGING_PANEL}")
}

/// Status bar scoped to a grid root.
#[must_use]
pub fn status_bar(root: &str) -> String {
    format!("{root} {STATUS_BAR}")
}

/// Collapse toggle of a specific row.
#[must_use]
pub fn row_contracted_toggle(root: &str, index: u32) -> String {
    format!("{root} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"] {GROUP_CONTRACTED}")
}

/// Expand toggle of a specific row.
#[must_use]
pub fn row_expanded_toggle(root: &str, index: u32) -> String {
    format!("{root} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"] {GROUP_EXPANDED}")
}

/// Every still-collapsed toggle in the grid (expand-all worklist).
#[must_use]
pub fn contracted_toggles(root: &str) -> String {
    format!("{root} {GROUP_CONTRACTED}:not(.{HIDDEN_CLASS})")
}

/// Every expanded toggle in the grid (collapse-all worklist).
#[must_use]
pub fn expanded_toggles(root: &str) -> String {
    format!("{root} {GROUP_EXPANDED}:not(.{HIDDEN_CLASS})")
}

/// Detail region rendered for the master row at `master_index`.
///
/// The widget renders the detail row at the viewport index directly after its
/// master row.
#[must_use]
pub fn detail_region(root: &str, master_index: u32) -> String {
    format!(
        "{root} {DETAILS_ROW}[{ATTR_ROW_INDEX}=\"{}\"]",
        master_index + 1
    )
}

/// Root of the nested grid hosted inside a detail region.
#[must_use]
pub fn detail_grid_root(root: &str, master_index: u32) -> String {
    format!("{} {GRID_ROOT}", detail_region(root, master_index))
}

/// Server-side loading placeholder rows.
#[must_use]
pub fn loading_rows(root: &str) -> String {
    format!("{root} {CENTER_ROWS} {ROW}{ROW_LOADING}")
}

/// Every currently selected body row.
#[must_use]
pub fn selected_rows(root: &str) -> String {
    format!("{root} {CENTER_ROWS} {ROW}[{ATTR_ARIA_SELECTED}=\"true\"]")
}

/// Selection checkbox of a specific row.
#[must_use]
pub fn selection_checkbox(root: &str, index: u32) -> String {
    format!("{root} {ROW}[{ATTR_ROW_INDEX}=\"{index}\"] {SELECTION_CHECKBOX}")
}

/// Fill handle scoped to a grid root.
#[must_use]
pub fn fill_handle(root: &str) -> String {
    format!("{root} {FILL_HANDLE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sigil_tests {
        use super::*;

        #[test]
        fn test_class_selector_is_structural() {
            assert!(is_structural(".ag-root-wrapper"));
        }

        #[test]
        fn test_id_selector_is_structural() {
            assert!(is_structural("#orders-grid"));
        }

        #[test]
        fn test_attribute_selector_is_structural() {
            assert!(is_structural("[data-grid='orders']"));
        }

        #[test]
        fn test_descendant_combinator_is_structural() {
            assert!(is_structural("div .grid"));
        }

        #[test]
        fn test_bare_identifier_is_not_structural() {
            assert!(!is_structural("orders-grid"));
        }
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_row_by_viewport_index() {
            let sel = row_by_viewport_index("#g", 4);
            assert_eq!(sel, "#g .ag-center-cols-container .ag-row[row-index=\"4\"]");
        }

        #[test]
        fn test_row_by_aria_position() {
            let sel = row_by_aria_position("#g", 3);
            assert!(sel.contains("aria-rowindex=\"3\""));
        }

        #[test]
        fn test_stable_id_is_escaped() {
            let sel = row_by_stable_id("#g", "he said \"hi\"");
            assert!(sel.contains("\\\"hi\\\""));
        }

        #[test]
        fn test_cell_selector_spans_pinned_containers() {
            let sel = cell("#g", 0, "amount");
            assert!(!sel.contains("center-cols"));
            assert!(sel.contains("col-id=\"amount\""));
        }

        #[test]
        fn test_overlay_active_excludes_hidden() {
            let sel = overlay_active(&loading_overlay("#g"));
            assert!(sel.ends_with(":not(.ag-hidden)"));
        }

        #[test]
        fn test_detail_region_follows_master() {
            let sel = detail_region("#g", 6);
            assert!(sel.contains("row-index=\"7\""));
        }

        #[test]
        fn test_by_test_id() {
            assert_eq!(by_test_id("orders"), "[data-testid=\"orders\"]");
        }
    }
}
