//! Simulated host pages
//!
//! Each scene builds a static DOM and lays it out the way the real site
//! roughly does at 1280x720.

use kbhint_dom::{DOMRect, DomResult, NodeId, Page, ReadyState};

/// A page plus the element the session focuses
pub struct Scene {
    pub page: Page,
    pub focus_target: NodeId,
}

fn el(page: &mut Page, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> DomResult<NodeId> {
    let tree = page.tree_mut();
    let node = tree.create_element(tag);
    for (name, value) in attrs {
        tree.set_attribute(node, name, value)?;
    }
    tree.append_child(parent, node)?;
    Ok(node)
}

fn text(page: &mut Page, parent: NodeId, content: &str) -> DomResult<()> {
    let tree = page.tree_mut();
    let node = tree.create_text(content);
    tree.append_child(parent, node)?;
    Ok(())
}

pub fn youtube() -> DomResult<Scene> {
    let mut page = Page::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    let body = page.document.body();
    page.tree_mut().set_style(body, "background-color", "#0f0f0f")?;

    let masthead = el(&mut page, body, "header", &[("id", "masthead")])?;
    let searchbox = el(&mut page, masthead, "ytd-searchbox", &[("id", "search")])?;
    let form = el(&mut page, searchbox, "form", &[])?;
    let input = el(
        &mut page,
        form,
        "input",
        &[
            ("class", "ytSearchboxComponentInput yt-searchbox-input"),
            ("name", "search_query"),
            ("aria-label", "Search"),
        ],
    )?;
    page.document
        .set_layout_rect(searchbox, DOMRect::from_xywh(400.0, 8.0, 540.0, 40.0))?;
    page.document.set_layout_rect(input, DOMRect::from_xywh(416.0, 8.0, 480.0, 40.0))?;

    let player = el(&mut page, body, "div", &[("id", "player")])?;
    page.document.set_layout_rect(player, DOMRect::from_xywh(24.0, 80.0, 854.0, 480.0))?;

    page.document.set_ready_state(ReadyState::Loading);
    Ok(Scene {
        page,
        focus_target: input,
    })
}

pub fn whatsapp() -> DomResult<Scene> {
    let mut page = Page::new("https://web.whatsapp.com/");
    let body = page.document.body();
    page.tree_mut().set_style(body, "background-color", "rgb(17, 27, 33)")?;

    let side = el(&mut page, body, "div", &[("id", "side")])?;
    let search = el(&mut page, side, "div", &[("contenteditable", "true"), ("role", "textbox")])?;
    let placeholder = el(&mut page, side, "div", &[("class", "lexical-placeholder")])?;
    text(&mut page, placeholder, "Search or start a new chat")?;
    page.document.set_layout_rect(search, DOMRect::from_xywh(12.0, 108.0, 380.0, 36.0))?;
    page.document
        .set_layout_rect(placeholder, DOMRect::from_xywh(64.0, 116.0, 220.0, 20.0))?;

    let main = el(&mut page, body, "div", &[("id", "main")])?;
    let header = el(&mut page, main, "header", &[])?;
    let wrapper = el(&mut page, header, "div", &[])?;
    let button = el(&mut page, wrapper, "button", &[("aria-label", "Search…"), ("title", "Search…")])?;
    el(&mut page, button, "span", &[("data-icon", "search-refreshed")])?;
    page.document.set_layout_rect(header, DOMRect::from_xywh(420.0, 0.0, 860.0, 60.0))?;
    page.document.set_layout_rect(button, DOMRect::from_xywh(1180.0, 10.0, 40.0, 40.0))?;

    page.document.set_ready_state(ReadyState::Loading);
    Ok(Scene {
        page,
        focus_target: search,
    })
}
