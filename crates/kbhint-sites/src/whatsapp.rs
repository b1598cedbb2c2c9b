//! Messenger site: header search badge and sidebar placeholder hint
//!
//! Both hints are placed by hand instead of through the generic overlay
//! store. The badge is a real element inside the header search button's
//! wrapper; the sidebar hint is a pseudo-element driven by a class and a
//! data attribute.

use kbhint_dom::{Document, NodeId};
use kbhint_engine::overlay::ensure_stylesheet;
use kbhint_engine::{HintDescriptor, SiteContext, SiteError, SiteModule};

pub const HOST: &str = "web.whatsapp.com";
pub const SEARCH_CONVERSATIONS: &str = "search-conversations";
pub const SEARCH_CURRENT_CHAT: &str = "search-current-chat";

const STYLE_ID: &str = "shh-wa-styles";
const BADGE_CLASS: &str = "shh-wa-inline-hint";
const BADGE_ABOVE: &str = "shh-wa-inline-hint--above";
const BADGE_BELOW: &str = "shh-wa-inline-hint--below";
const BADGE_ID_ATTR: &str = "data-shh-id";
const LABEL_CLASS: &str = "shh-wa-label";
const LABEL_ATTR: &str = "data-shh-hint";

const SEARCH_ICON: &str = "span[data-icon=\"search-refreshed\"]";
const SEARCH_BUTTON: &str = "header button[aria-label^=\"Search\"], header button[title^=\"Search\"], \
     button[aria-label^=\"Search\"], button[title^=\"Search\"]";
const SIDEBAR_PLACEHOLDER: &str = "Search or start a new chat";

/// Badges closer than this to the viewport top are pushed down
const MIN_TOP: f64 = 2.0;

const STYLE_CSS: &str = ".shh-wa-inline-hint {
  position: absolute;
  left: 50%;
  transform: translateX(-50%);
  background: rgba(0, 0, 0, 0.70);
  color: #fff;
  padding: 2px 6px;
  border-radius: 4px;
  font-size: 11px;
  line-height: 1.3;
  font-weight: 600;
  white-space: nowrap;
  pointer-events: none;
  z-index: 2147483000;
}
.shh-wa-inline-hint--above { bottom: calc(100% + 4px); top: auto; }
.shh-wa-inline-hint--below { top: calc(100% + 4px); bottom: auto; }
.shh-wa-label { position: relative !important; }
.shh-wa-label::after {
  content: attr(data-shh-hint);
  position: absolute;
  right: 8px;
  top: 50%;
  transform: translateY(-50%);
  background: rgba(0, 0, 0, 0.65);
  color: #fff;
  padding: 2px 6px;
  border-radius: 4px;
  font-size: 11px;
  line-height: 1.4;
  font-weight: 600;
  white-space: nowrap;
  pointer-events: none;
}";

#[derive(Debug, Clone)]
pub struct WhatsAppSite {
    hints: Vec<HintDescriptor>,
}

impl WhatsAppSite {
    pub fn new() -> Self {
        Self {
            hints: vec![
                HintDescriptor::new(SEARCH_CONVERSATIONS, "Search conversations", "Ctrl + Alt + /"),
                HintDescriptor::new(SEARCH_CURRENT_CHAT, "Search in current chat", "Ctrl + Shift + F"),
            ],
        }
    }
}

impl Default for WhatsAppSite {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteModule for WhatsAppSite {
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
        let doc = &mut cx.page.document;
        match hint_id {
            SEARCH_CONVERSATIONS => set_sidebar_placeholder(doc, &hint.shortcut, enabled),
            SEARCH_CURRENT_CHAT => upsert_header_badge(doc, &hint.shortcut, enabled),
            _ => Ok(()),
        }
    }

    fn remove_all(&mut self, cx: &mut SiteContext<'_>) {
        let doc = &mut cx.page.document;
        if let Err(e) = remove_badges(doc, &format!(".{}", BADGE_CLASS)) {
            tracing::warn!("failed to remove header badges: {}", e);
        }
        if let Err(e) = set_sidebar_placeholder(doc, "", false) {
            tracing::warn!("failed to clear sidebar hint: {}", e);
        }
    }
}

fn badge_selector() -> String {
    let id = format!("[{}=\"{}\"]", BADGE_ID_ATTR, SEARCH_CURRENT_CHAT);
    format!(".{BADGE_CLASS}{id}, .shh-wa-hint{id}")
}

fn remove_badges(doc: &mut Document, selector: &str) -> Result<(), SiteError> {
    let matches = doc.query_selector_all(selector)?;
    destroy_live(doc, matches)
}

/// Destroy each node still alive; a nested match dies with its ancestor
fn destroy_live(doc: &mut Document, nodes: impl IntoIterator<Item = NodeId>) -> Result<(), SiteError> {
    let tree = doc.tree_mut();
    for node in nodes {
        if tree.is_alive(node) {
            tree.destroy(node)?;
        }
    }
    Ok(())
}

/// Header search button: via its icon, else by label or title
fn find_search_button(doc: &Document) -> Result<Option<NodeId>, SiteError> {
    if let Some(icon) = doc.query_selector(SEARCH_ICON)? {
        if let Some(button) = doc.closest(icon, "button")? {
            return Ok(Some(button));
        }
    }
    Ok(doc.query_selector(SEARCH_BUTTON)?)
}

/// Keep exactly one badge, inside the search button's wrapper
fn upsert_header_badge(doc: &mut Document, shortcut: &str, enabled: bool) -> Result<(), SiteError> {
    let selector = badge_selector();
    if !enabled {
        return remove_badges(doc, &selector);
    }

    let Some(button) = find_search_button(doc)? else {
        tracing::trace!("header search button not found");
        return Ok(());
    };
    let wrapper = doc.tree().parent_element(button).unwrap_or(button);
    ensure_stylesheet(doc, STYLE_ID, STYLE_CSS)?;

    if doc.computed_style(wrapper, "position") == "static" {
        doc.tree_mut().set_style(wrapper, "position", "relative")?;
    }
    if doc.computed_style(wrapper, "overflow") != "visible" {
        doc.tree_mut().set_style(wrapper, "overflow", "visible")?;
    }

    let (inside, outside): (Vec<NodeId>, Vec<NodeId>) = doc
        .query_selector_all(&selector)?
        .into_iter()
        .partition(|&n| doc.tree().contains(wrapper, n));
    destroy_live(doc, outside.into_iter().chain(inside.iter().skip(1).copied()))?;

    let tree = doc.tree_mut();
    let badge = match inside.first() {
        Some(&existing) => {
            if !tree.has_class(existing, BADGE_CLASS) {
                tree.set_attribute(existing, "class", BADGE_CLASS)?;
            }
            tree.set_text_content(existing, shortcut)?;
            existing
        }
        None => {
            let node = tree.create_element("div");
            tree.set_attribute(node, "class", BADGE_CLASS)?;
            tree.set_attribute(node, BADGE_ID_ATTR, SEARCH_CURRENT_CHAT)?;
            tree.set_text_content(node, shortcut)?;
            tree.append_child(wrapper, node)?;
            tracing::debug!("header search badge created");
            node
        }
    };

    tree.remove_class(badge, BADGE_BELOW)?;
    tree.add_class(badge, BADGE_ABOVE)?;
    tree.remove_style(badge, "bottom")?;

    // A badge the host has not laid out yet has nothing to measure
    let rect = doc.bounding_client_rect(badge);
    if rect.has_area() && rect.top() < MIN_TOP {
        let delta = (MIN_TOP - rect.top()).ceil();
        doc.tree_mut()
            .set_style(badge, "bottom", &format!("calc(100% + 4px - {}px)", delta))?;
    }
    Ok(())
}

fn is_visible(doc: &Document, el: NodeId) -> bool {
    doc.bounding_client_rect(el).has_area()
        && doc.computed_style(el, "visibility") != "hidden"
        && doc.computed_style(el, "display") != "none"
}

/// Mark the first visible sidebar placeholder, clearing any previous mark
fn set_sidebar_placeholder(doc: &mut Document, shortcut: &str, enabled: bool) -> Result<(), SiteError> {
    for el in doc.query_selector_all(&format!(".{}", LABEL_CLASS))? {
        let tree = doc.tree_mut();
        tree.remove_class(el, LABEL_CLASS)?;
        tree.remove_attribute(el, LABEL_ATTR)?;
    }
    if !enabled {
        return Ok(());
    }

    let candidates: Vec<NodeId> = doc
        .query_selector_all("div")?
        .into_iter()
        .filter(|&el| doc.tree().text_content(el).trim() == SIDEBAR_PLACEHOLDER)
        .collect();
    let target = candidates
        .iter()
        .copied()
        .find(|&el| is_visible(doc, el))
        .or_else(|| candidates.first().copied());

    let Some(target) = target else {
        return Ok(());
    };
    ensure_stylesheet(doc, STYLE_ID, STYLE_CSS)?;
    let tree = doc.tree_mut();
    tree.add_class(target, LABEL_CLASS)?;
    tree.set_attribute(target, LABEL_ATTR, shortcut)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhint_dom::Page;

    #[test]
    fn test_button_found_by_icon_then_label() {
        let mut page = Page::new("https://web.whatsapp.com/");
        let body = page.document.body();
        let tree = page.tree_mut();
        let button = tree.create_element("button");
        tree.set_attribute(button, "title", "Search messages").unwrap();
        tree.append_child(body, button).unwrap();
        assert_eq!(find_search_button(&page.document).unwrap(), Some(button));

        let tree = page.tree_mut();
        let other = tree.create_element("button");
        let icon = tree.create_element("span");
        tree.set_attribute(icon, "data-icon", "search-refreshed").unwrap();
        tree.append_child(other, icon).unwrap();
        tree.append_child(body, other).unwrap();
        assert_eq!(find_search_button(&page.document).unwrap(), Some(other));
    }

    #[test]
    fn test_nested_badges_removed_once() {
        let mut page = Page::new("https://web.whatsapp.com/");
        let body = page.document.body();
        let tree = page.tree_mut();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        for node in [outer, inner] {
            tree.set_attribute(node, "class", BADGE_CLASS).unwrap();
            tree.set_attribute(node, BADGE_ID_ATTR, SEARCH_CURRENT_CHAT).unwrap();
        }
        tree.append_child(body, outer).unwrap();
        tree.append_child(outer, inner).unwrap();

        upsert_header_badge(&mut page.document, "Ctrl + Shift + F", false).unwrap();
        assert!(!page.tree().is_alive(outer));
        assert!(!page.tree().is_alive(inner));
    }

    #[test]
    fn test_badge_selector() {
        assert_eq!(
            badge_selector(),
            ".shh-wa-inline-hint[data-shh-id=\"search-current-chat\"], \
             .shh-wa-hint[data-shh-id=\"search-current-chat\"]"
        );
    }
}
