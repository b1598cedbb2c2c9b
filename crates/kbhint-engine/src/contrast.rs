//! Context-aware overlay styling
//!
//! Finds the background actually painted behind an anchor and picks the
//! palette that reads on it.

use kbhint_css::{choose_palette, relative_luminance, Color, OverlayPalette};
use kbhint_dom::{Document, DomResult, DomTree, NodeId, Window};

use crate::EngineConfig;

const LIGHT_FALLBACK: &str = "rgb(255,255,255)";

/// First painted `background-color` among the element and its ancestors,
/// looking at most `background_search_depth` elements up
pub fn effective_background(doc: &Document, window: &Window, element: NodeId, config: &EngineConfig) -> String {
    let tree = doc.tree();
    let chain = std::iter::successors(Some(element), |&n| tree.parent_element(n))
        .filter(|&n| tree.is_element(n))
        .take(config.background_search_depth);

    for node in chain {
        let bg = doc.computed_style(node, "background-color");
        if !Color::is_transparent_value(&bg) {
            return bg;
        }
    }

    if window.prefers_dark {
        config.prefer_dark_fallback.clone()
    } else {
        LIGHT_FALLBACK.to_string()
    }
}

/// Palette for the background behind `element`
pub fn palette_for(doc: &Document, window: &Window, element: NodeId, config: &EngineConfig) -> OverlayPalette {
    let bg = effective_background(doc, window, element, config);
    let luminance = relative_luminance(Color::parse_or_white(&bg));
    tracing::trace!("background {} has luminance {:.3}", bg, luminance);
    choose_palette(luminance)
}

/// Write the palette onto an overlay node's inline style
pub fn apply_palette(tree: &mut DomTree, overlay: NodeId, palette: &OverlayPalette) -> DomResult<()> {
    for (property, value) in palette.declarations() {
        tree.set_style(overlay, property, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhint_css::PaletteKind;

    fn nested(depth: usize) -> (Document, Vec<NodeId>) {
        let mut doc = Document::new("https://example.com/");
        let mut parent = doc.body();
        let mut chain = Vec::new();
        for _ in 0..depth {
            let div = doc.tree_mut().create_element("div");
            doc.tree_mut().append_child(parent, div).unwrap();
            chain.push(div);
            parent = div;
        }
        (doc, chain)
    }

    #[test]
    fn test_nearest_painted_ancestor_wins() {
        let (mut doc, chain) = nested(3);
        doc.tree_mut().set_style(chain[0], "background-color", "rgb(0, 0, 0)").unwrap();
        doc.tree_mut().set_style(chain[1], "background-color", "rgba(0, 0, 0, 0)").unwrap();
        let config = EngineConfig::default();
        let bg = effective_background(&doc, &Window::default(), chain[2], &config);
        assert_eq!(bg, "rgb(0, 0, 0)");
        assert_eq!(palette_for(&doc, &Window::default(), chain[2], &config).kind, PaletteKind::Light);
    }

    #[test]
    fn test_depth_limit_includes_self() {
        let (mut doc, chain) = nested(7);
        doc.tree_mut().set_style(chain[0], "background-color", "rgb(0, 0, 0)").unwrap();
        let config = EngineConfig::default();

        // chain[6] sees chain[6..=1]: six elements, the painted one is the seventh
        let bg = effective_background(&doc, &Window::default(), chain[6], &config);
        assert_eq!(bg, "rgb(255,255,255)");
        let bg = effective_background(&doc, &Window::default(), chain[5], &config);
        assert_eq!(bg, "rgb(0, 0, 0)");
    }

    #[test]
    fn test_dark_preference_fallback() {
        let (doc, chain) = nested(1);
        let window = Window {
            prefers_dark: true,
            ..Window::default()
        };
        let config = EngineConfig::default();
        assert_eq!(effective_background(&doc, &window, chain[0], &config), "rgb(24,24,24)");
        assert_eq!(palette_for(&doc, &window, chain[0], &config).kind, PaletteKind::Light);
        assert_eq!(palette_for(&doc, &Window::default(), chain[0], &config).kind, PaletteKind::Dark);
    }

    #[test]
    fn test_apply_palette_sets_inline_style() {
        let (mut doc, chain) = nested(1);
        apply_palette(doc.tree_mut(), chain[0], &OverlayPalette::DARK).unwrap();
        assert_eq!(doc.tree().style(chain[0], "background"), Some("rgba(0, 0, 0, 0.65)"));
        assert_eq!(doc.tree().style(chain[0], "box-shadow"), Some("0 1px 2px rgba(0,0,0,0.25)"));
    }
}
