//! Video site: hint on the search box
//!
//! The hint is a fixed pseudo-element on the search container, so nothing is
//! inserted into the page besides one stylesheet. The container carries the
//! shortcut in a data attribute and its anchor point in two custom
//! properties that follow scroll and resize.

use std::collections::HashMap;

use kbhint_dom::{Document, DomResult, EventKind, EventTarget, ListenerId, NodeId, Page};
use kbhint_engine::overlay::ensure_stylesheet;
use kbhint_engine::position::{place_fixed_inline_end, px};
use kbhint_engine::{HintDescriptor, HintPosition, SiteContext, SiteError, SiteModule};

pub const HOST: &str = "www.youtube.com";
pub const SEARCH_INPUT: &str = "search-input";

const STYLE_ID: &str = "shh-yt-styles";
const HINT_CLASS: &str = "shh-yt-search-hint";
const HINT_ATTR: &str = "data-shh-hint";
const FOCUSED_ATTR: &str = "data-shh-focused";
const LEFT_VAR: &str = "--shh-left";
const TOP_VAR: &str = "--shh-top";

const PRIMARY_SELECTOR: &str = "input.ytSearchboxComponentInput.yt-searchbox-input[name=\"search_query\"]";

/// Tried in order after the primary selector
const FALLBACK_SELECTORS: &[&str] = &[
    "ytd-searchbox input#search",
    "ytd-searchbox input[name=\"search_query\"]",
    "ytd-searchbox input[aria-label=\"Search\"]",
    "input#search",
    "input[name=\"search_query\"]",
    "input[aria-label=\"Search\"]",
    "input[type=\"text\"][role=\"combobox\"]",
];

const STYLE_CSS: &str = ".shh-yt-search-hint::after {
  content: attr(data-shh-hint);
  position: fixed;
  left: var(--shh-left, 0px);
  top: var(--shh-top, 0px);
  transform: translate(-100%, -50%);
  background: rgba(0, 0, 0, 0.8);
  color: #cccccc;
  padding: 3px 8px;
  border-radius: 6px;
  font-size: 12px;
  line-height: 1.4;
  font-weight: 600;
  white-space: nowrap;
  pointer-events: none;
  z-index: 1000;
  transition: opacity 0.12s ease;
}
.shh-yt-search-hint[data-shh-focused=\"1\"]::after {
  opacity: 0 !important;
  visibility: hidden !important;
  display: none !important;
}";

/// Listeners installed for one marked container
#[derive(Debug)]
struct Binding {
    input: NodeId,
    listeners: Vec<ListenerId>,
}

#[derive(Debug)]
pub struct YouTubeSite {
    hints: Vec<HintDescriptor>,
    /// Keyed by container
    bindings: HashMap<NodeId, Binding>,
}

impl YouTubeSite {
    pub fn new() -> Self {
        Self {
            hints: vec![
                HintDescriptor::new(SEARCH_INPUT, "Focus search", "/")
                    .with_selector(PRIMARY_SELECTOR)
                    .with_position(HintPosition::PseudoElement),
            ],
            bindings: HashMap::new(),
        }
    }

    /// Containers currently marked by this module
    pub fn bound_containers(&self) -> Vec<NodeId> {
        self.bindings.keys().copied().collect()
    }

    fn show(&mut self, cx: &mut SiteContext<'_>, shortcut: &str) -> Result<(), SiteError> {
        let Some(input) = find_search_input(&cx.page.document)? else {
            tracing::debug!("search input not found");
            return self.clear(cx.page);
        };
        let container = find_container(&cx.page.document, input)?;
        let inset = cx.config.inline_end_inset_px;

        let bound = self.bindings.get(&container).is_some_and(|b| b.input == input);
        if !bound {
            // Input or container was replaced: start over
            self.clear(cx.page)?;
        }

        // The host may re-render the container or drop our stylesheet
        ensure_stylesheet(&mut cx.page.document, STYLE_ID, STYLE_CSS)?;
        let focused = cx.page.window.active_element == Some(input);
        let tree = cx.page.tree_mut();
        tree.add_class(container, HINT_CLASS)?;
        tree.set_attribute(container, HINT_ATTR, shortcut)?;
        if focused {
            tree.set_attribute(container, FOCUSED_ATTR, "1")?;
        } else {
            tree.remove_attribute(container, FOCUSED_ATTR)?;
        }
        update_position(cx.page, container, inset)?;

        if bound {
            return Ok(());
        }
        let listeners = bind_listeners(cx.page, input, container, inset);
        self.bindings.insert(container, Binding { input, listeners });
        tracing::debug!("search hint bound to {:?}", container);
        Ok(())
    }

    /// Unmark every container and drop its listeners
    fn clear(&mut self, page: &mut Page) -> Result<(), SiteError> {
        for (_, binding) in self.bindings.drain() {
            for id in binding.listeners {
                page.remove_event_listener(id);
            }
        }
        for el in page.document.query_selector_all(&format!(".{}", HINT_CLASS))? {
            let tree = page.tree_mut();
            tree.remove_class(el, HINT_CLASS)?;
            tree.remove_attribute(el, HINT_ATTR)?;
            tree.remove_attribute(el, FOCUSED_ATTR)?;
            tree.remove_style(el, LEFT_VAR)?;
            tree.remove_style(el, TOP_VAR)?;
        }
        Ok(())
    }
}

impl Default for YouTubeSite {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteModule for YouTubeSite {
    fn hostname(&self) -> &str {
        HOST
    }

    fn list_hints(&self) -> &[HintDescriptor] {
        &self.hints
    }

    fn apply(&mut self, cx: &mut SiteContext<'_>, hint_id: &str, enabled: bool) -> Result<(), SiteError> {
        let hint = self
            .hint(hint_id)
            .ok_or_else(|| SiteError::UnknownHint(hint_id.to_string()))?;
        if hint_id != SEARCH_INPUT {
            // Any other declared hint is a plain overlay
            let Some(selector) = hint.selector.clone() else {
                return Ok(());
            };
            let hint = hint.clone();
            if enabled {
                cx.render_hint(&hint, &selector);
            } else {
                cx.overlays.remove_for_selector(cx.page, &selector);
            }
            return Ok(());
        }

        let shortcut = hint.shortcut.clone();
        if enabled {
            self.show(cx, &shortcut)
        } else {
            self.clear(cx.page)
        }
    }

    fn remove_all(&mut self, cx: &mut SiteContext<'_>) {
        cx.overlays.remove_all(cx.page);
        if let Err(e) = self.clear(cx.page) {
            tracing::warn!("failed to clear search hint: {}", e);
        }
    }

    fn relevance_selector(&self) -> Option<&str> {
        Some("ytd-searchbox, input#search, input[name=\"search_query\"], header")
    }
}

fn find_search_input(doc: &Document) -> Result<Option<NodeId>, SiteError> {
    for selector in std::iter::once(&PRIMARY_SELECTOR).chain(FALLBACK_SELECTORS) {
        if let Some(el) = doc.query_selector(selector)? {
            return Ok(Some(el));
        }
    }
    Ok(None)
}

/// The `ytd-searchbox` host, else the input's parent, else the input
fn find_container(doc: &Document, input: NodeId) -> Result<NodeId, SiteError> {
    if let Some(host) = doc.closest(input, "ytd-searchbox")? {
        return Ok(host);
    }
    if let Some(host) = doc.query_selector("ytd-searchbox")? {
        return Ok(host);
    }
    Ok(doc.tree().parent_element(input).unwrap_or(input))
}

fn update_position(page: &mut Page, container: NodeId, inset: f64) -> DomResult<()> {
    let rect = page.document.bounding_client_rect(container);
    let (left, top) = place_fixed_inline_end(rect, inset);
    let tree = page.tree_mut();
    tree.set_style(container, LEFT_VAR, &px(left))?;
    tree.set_style(container, TOP_VAR, &px(top))
}

fn bind_listeners(page: &mut Page, input: NodeId, container: NodeId, inset: f64) -> Vec<ListenerId> {
    let on_focus = page.add_event_listener(EventTarget::Node(input), EventKind::Focus, move |page, _| {
        if let Err(e) = page.tree_mut().set_attribute(container, FOCUSED_ATTR, "1") {
            tracing::debug!("focus mark failed: {}", e);
        }
    });
    let on_blur = page.add_event_listener(EventTarget::Node(input), EventKind::Blur, move |page, _| {
        if page.window.active_element == Some(input) {
            return;
        }
        if let Err(e) = page.tree_mut().remove_attribute(container, FOCUSED_ATTR) {
            tracing::debug!("blur unmark failed: {}", e);
        }
    });

    let mut ids = vec![on_focus, on_blur];
    for kind in [EventKind::Scroll, EventKind::Resize] {
        ids.push(page.add_event_listener(EventTarget::Window, kind, move |page, _| {
            if let Err(e) = update_position(page, container, inset) {
                tracing::trace!("search hint reposition skipped: {}", e);
            }
        }));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhint_dom::DOMRect;
    use kbhint_engine::{EngineConfig, OverlayStore};

    fn page_with_searchbox() -> (Page, NodeId, NodeId) {
        let mut page = Page::new("https://www.youtube.com/");
        let body = page.document.body();
        let tree = page.tree_mut();
        let searchbox = tree.create_element("ytd-searchbox");
        let form = tree.create_element("form");
        let input = tree.create_element("input");
        tree.set_attribute(input, "name", "search_query").unwrap();
        tree.append_child(body, searchbox).unwrap();
        tree.append_child(searchbox, form).unwrap();
        tree.append_child(form, input).unwrap();
        page.document
            .set_layout_rect(searchbox, DOMRect::from_xywh(400.0, 8.0, 600.0, 40.0))
            .unwrap();
        (page, searchbox, input)
    }

    #[test]
    fn test_finds_container_through_fallbacks() {
        let (page, searchbox, input) = page_with_searchbox();
        assert_eq!(find_search_input(&page.document).unwrap(), Some(input));
        assert_eq!(find_container(&page.document, input).unwrap(), searchbox);
    }

    #[test]
    fn test_container_falls_back_to_parent() {
        let mut page = Page::new("https://www.youtube.com/");
        let body = page.document.body();
        let tree = page.tree_mut();
        let wrap = tree.create_element("div");
        let input = tree.create_element("input");
        tree.set_attribute(input, "id", "search").unwrap();
        tree.append_child(body, wrap).unwrap();
        tree.append_child(wrap, input).unwrap();
        assert_eq!(find_container(&page.document, input).unwrap(), wrap);
    }

    #[test]
    fn test_show_is_idempotent() {
        let (mut page, searchbox, _) = page_with_searchbox();
        let mut overlays = OverlayStore::new();
        let config = EngineConfig::default();
        let mut site = YouTubeSite::new();
        let mut cx = SiteContext {
            page: &mut page,
            overlays: &mut overlays,
            config: &config,
        };

        site.apply(&mut cx, SEARCH_INPUT, true).unwrap();
        let listeners = cx.page.listener_count();
        site.apply(&mut cx, SEARCH_INPUT, true).unwrap();

        assert_eq!(cx.page.listener_count(), listeners);
        assert_eq!(listeners, 4);
        assert_eq!(site.bound_containers(), vec![searchbox]);
        assert_eq!(cx.page.tree().style(searchbox, LEFT_VAR), Some("988px"));
        assert_eq!(cx.page.tree().style(searchbox, TOP_VAR), Some("28px"));
    }
}
