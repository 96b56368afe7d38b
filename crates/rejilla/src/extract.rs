//! Cell value extraction: an ordered chain of renderer strategies.
//!
//! Resolution order for a cell, first hit wins:
//!
//! 1. an explicit per-column extractor function from the configuration
//! 2. an explicit per-column renderer configuration (sub-element address
//!    plus optional extraction function)
//! 3. built-in renderer heuristics, probed in a fixed order: checkbox →
//!    link → editable input → select → badge/tag/chip → button
//! 4. the cell's plain normalized text content
//!
//! The ordered-fallback design lets most cells work with zero configuration
//! while still supporting fully custom renderers, modeled as a list of
//! `(probe, extract)` pairs evaluated strictly in priority order rather than
//! a renderer type hierarchy.

use serde_json::Value;

use crate::address;
use crate::locator::GridContext;
use crate::result::RejillaResult;

/// Collapse internal whitespace runs to a single space and trim the ends.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read the normalized value of one cell.
///
/// `cell_selector` must uniquely address the cell (viewport index + column
/// id); absence of the cell yields `Value::Null`, never an error.
pub(crate) async fn cell_value(
    ctx: &GridContext,
    cell_selector: &str,
    column_id: &str,
) -> RejillaResult<Value> {
    let page = ctx.page();

    // 1. Explicit per-column extractor.
    if let Some(extractor) = ctx
        .config()
        .column(column_id)
        .and_then(|c| c.value_extractor.as_ref())
    {
        let raw = page.text(cell_selector, 0).await?.unwrap_or_default();
        return Ok(extractor(&raw));
    }

    // 2. Explicit renderer configuration.
    if let Some(renderer) = ctx.config().cell_renderers.get(column_id) {
        let sub = format!("{cell_selector} {}", renderer.selector);
        let raw = page.text(&sub, 0).await?.unwrap_or_default();
        return Ok(match &renderer.extractor {
            Some(extract) => extract(&raw),
            None => Value::String(normalize_text(&raw)),
        });
    }

    // 3. Built-in heuristics, fixed order, sub-element presence as trigger.
    let checkbox = format!("{cell_selector} {}", address::RENDER_CHECKBOX);
    if page.count(&checkbox).await? > 0 {
        let checked = matches!(
            page.attribute(&checkbox, 0, "aria-checked").await?.as_deref(),
            Some("true")
        ) || page.attribute(&checkbox, 0, "checked").await?.is_some();
        return Ok(Value::Bool(checked));
    }

    for probe in [address::RENDER_LINK, address::RENDER_INPUT] {
        let sub = format!("{cell_selector} {probe}");
        if page.count(&sub).await? > 0 {
            // Inputs carry their value in the value attribute, links in text.
            if probe == address::RENDER_INPUT {
                let value = page.attribute(&sub, 0, "value").await?.unwrap_or_default();
                return Ok(Value::String(normalize_text(&value)));
            }
            let raw = page.text(&sub, 0).await?.unwrap_or_default();
            return Ok(Value::String(normalize_text(&raw)));
        }
    }

    let select = format!("{cell_selector} {}", address::RENDER_SELECT);
    if page.count(&select).await? > 0 {
        let value = page.attribute(&select, 0, "value").await?.unwrap_or_default();
        return Ok(Value::String(normalize_text(&value)));
    }

    for probe in [address::RENDER_BADGE, address::RENDER_BUTTON] {
        let sub = format!("{cell_selector} {probe}");
        if page.count(&sub).await? > 0 {
            let raw = page.text(&sub, 0).await?.unwrap_or_default();
            return Ok(Value::String(normalize_text(&raw)));
        }
    }

    // 4. Plain text fallback.
    match page.text(cell_selector, 0).await? {
        Some(raw) => Ok(Value::String(normalize_text(&raw))),
        None => Ok(Value::Null),
    }
}
