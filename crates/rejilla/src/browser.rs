//! Chromiumoxide-backed [`PageDriver`] (feature `browser`).
//!
//! Rejilla does not launch or navigate browsers; the caller hands over an
//! already-open `chromiumoxide::Page` and keeps owning its lifecycle. Reads
//! go through `Runtime.evaluate`; pointer and keyboard simulation go through
//! the `Input` domain so the widget receives the same events a user would
//! produce.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::page::Page as CdpInner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::driver::{BoundingBox, PageDriver, Point};
use crate::result::{RejillaError, RejillaResult};

/// CDP modifier bits: Alt=1, Ctrl=2, Meta=4, Shift=8
fn modifier_bit(name: &str) -> Option<i64> {
    match name {
        "Alt" => Some(1),
        "Control" | "Ctrl" => Some(2),
        "Meta" | "Command" => Some(4),
        "Shift" => Some(8),
        _ => None,
    }
}

/// A live page driven over the Chrome DevTools Protocol.
#[derive(Debug, Clone)]
pub struct CdpPage {
    inner: Arc<Mutex<CdpInner>>,
}

impl CdpPage {
    /// Wrap an already-open chromiumoxide page.
    #[must_use]
    pub fn new(page: CdpInner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(page)),
        }
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, expr: &str) -> RejillaResult<T> {
        let page = self.inner.lock().await;
        let result = page
            .evaluate(expr)
            .await
            .map_err(|e| RejillaError::page(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| RejillaError::page(e.to_string()))
    }

    async fn element_center(&self, selector: &str, nth: usize) -> RejillaResult<Point> {
        let bbox = self.bounding_box(selector, nth).await?.ok_or_else(|| {
            RejillaError::Input {
                message: format!("no rendered element for {selector:?} at index {nth}"),
            }
        })?;
        Ok(bbox.center())
    }

    async fn mouse_event(
        &self,
        kind: DispatchMouseEventType,
        point: Point,
        click_count: i64,
    ) -> RejillaResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(point.x)
            .y(point.y)
            .button(MouseButton::Left)
            .click_count(click_count)
            .build()
            .map_err(|e| RejillaError::Input { message: e })?;
        let page = self.inner.lock().await;
        page.execute(params)
            .await
            .map_err(|e| RejillaError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn click_at(&self, point: Point, click_count: i64) -> RejillaResult<()> {
        for _ in 0..click_count {
            self.mouse_event(DispatchMouseEventType::MousePressed, point, click_count)
                .await?;
            self.mouse_event(DispatchMouseEventType::MouseReleased, point, click_count)
                .await?;
        }
        Ok(())
    }

    async fn key_event(
        &self,
        kind: DispatchKeyEventType,
        key: &str,
        modifiers: i64,
    ) -> RejillaResult<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .modifiers(modifiers)
            .build()
            .map_err(|e| RejillaError::Input { message: e })?;
        let page = self.inner.lock().await;
        page.execute(params)
            .await
            .map_err(|e| RejillaError::Input {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn count(&self, selector: &str) -> RejillaResult<usize> {
        self.eval(&format!(
            "document.querySelectorAll({selector:?}).length"
        ))
        .await
    }

    async fn text(&self, selector: &str, nth: usize) -> RejillaResult<Option<String>> {
        self.eval(&format!(
            "[...document.querySelectorAll({selector:?})][{nth}]?.textContent ?? null"
        ))
        .await
    }

    async fn attribute(
        &self,
        selector: &str,
        nth: usize,
        name: &str,
    ) -> RejillaResult<Option<String>> {
        self.eval(&format!(
            "[...document.querySelectorAll({selector:?})][{nth}]?.getAttribute({name:?}) ?? null"
        ))
        .await
    }

    async fn is_visible(&self, selector: &str, nth: usize) -> RejillaResult<bool> {
        self.eval(&format!(
            "(() => {{ \
               const el = [...document.querySelectorAll({selector:?})][{nth}]; \
               if (!el) return false; \
               const r = el.getBoundingClientRect(); \
               return r.width > 0 && r.height > 0 \
                 && getComputedStyle(el).visibility !== 'hidden'; \
             }})()"
        ))
        .await
    }

    async fn bounding_box(
        &self,
        selector: &str,
        nth: usize,
    ) -> RejillaResult<Option<BoundingBox>> {
        self.eval(&format!(
            "(() => {{ \
               const el = [...document.querySelectorAll({selector:?})][{nth}]; \
               if (!el) return null; \
               const r = el.getBoundingClientRect(); \
               return {{ x: r.x, y: r.y, width: r.width, height: r.height }}; \
             }})()"
        ))
        .await
    }

    async fn click(&self, selector: &str, nth: usize) -> RejillaResult<()> {
        let center = self.element_center(selector, nth).await?;
        self.click_at(center, 1).await
    }

    async fn double_click(&self, selector: &str, nth: usize) -> RejillaResult<()> {
        let center = self.element_center(selector, nth).await?;
        self.click_at(center, 2).await
    }

    async fn fill(&self, selector: &str, nth: usize, text: &str) -> RejillaResult<()> {
        // Focus, clear, set, and fire an input event so framework bindings see
        // the change.
        let ok: bool = self
            .eval(&format!(
                "(() => {{ \
                   const el = [...document.querySelectorAll({selector:?})][{nth}]; \
                   if (!el) return false; \
                   el.focus(); \
                   el.value = {text:?}; \
                   el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                   el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                   return true; \
                 }})()"
            ))
            .await?;
        if ok {
            Ok(())
        } else {
            Err(RejillaError::Input {
                message: format!("no element to fill for {selector:?} at index {nth}"),
            })
        }
    }

    async fn press_key(&self, key: &str) -> RejillaResult<()> {
        let mut modifiers = 0;
        let mut base = key;
        while let Some((prefix, rest)) = base.split_once('+') {
            match modifier_bit(prefix) {
                Some(bit) => {
                    modifiers |= bit;
                    base = rest;
                }
                None => break,
            }
        }
        self.key_event(DispatchKeyEventType::KeyDown, base, modifiers)
            .await?;
        self.key_event(DispatchKeyEventType::KeyUp, base, modifiers)
            .await
    }

    async fn drag(&self, from: Point, to: Point, steps: u32) -> RejillaResult<()> {
        self.mouse_event(DispatchMouseEventType::MousePressed, from, 1)
            .await?;
        let steps = steps.max(1);
        for i in 1..=steps {
            let progress = f64::from(i) / f64::from(steps);
            let point = Point::new(
                from.x + (to.x - from.x) * progress,
                from.y + (to.y - from.y) * progress,
            );
            self.mouse_event(DispatchMouseEventType::MouseMoved, point, 0)
                .await?;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.mouse_event(DispatchMouseEventType::MouseReleased, to, 1)
            .await
    }

    async fn scroll_into_view(&self, selector: &str, nth: usize) -> RejillaResult<()> {
        let ok: bool = self
            .eval(&format!(
                "(() => {{ \
                   const el = [...document.querySelectorAll({selector:?})][{nth}]; \
                   if (!el) return false; \
                   el.scrollIntoView({{ block: 'center' }}); \
                   return true; \
                 }})()"
            ))
            .await?;
        if ok {
            Ok(())
        } else {
            Err(RejillaError::page(format!(
                "no element to scroll for {selector:?} at index {nth}"
            )))
        }
    }

    async fn scroll_by(&self, selector: &str, dx: f64, dy: f64) -> RejillaResult<()> {
        let _: bool = self
            .eval(&format!(
                "(() => {{ \
                   const el = document.querySelector({selector:?}); \
                   if (!el) return false; \
                   el.scrollBy({dx}, {dy}); \
                   return true; \
                 }})()"
            ))
            .await?;
        Ok(())
    }
}
