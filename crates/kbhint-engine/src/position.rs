//! Overlay placement
//!
//! Anchor rects are viewport-relative; overlays are absolutely positioned
//! in page coordinates, so the scroll offset is added back in.

use kbhint_dom::{DOMRect, DomResult, DomTree, NodeId, ScrollOffset};

use crate::{EngineConfig, HintPosition};

/// Computed page coordinates for an overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    pub transform: &'static str,
}

impl Placement {
    /// Write `top`, `left`, `transform` and reveal the node
    pub fn apply(&self, tree: &mut DomTree, overlay: NodeId) -> DomResult<()> {
        tree.set_style(overlay, "top", &px(self.top))?;
        tree.set_style(overlay, "left", &px(self.left))?;
        tree.set_style(overlay, "transform", self.transform)?;
        tree.set_style(overlay, "visibility", "visible")
    }
}

/// CSS pixel length
pub fn px(value: f64) -> String {
    format!("{}px", value)
}

/// Place an overlay below its anchor.
///
/// `PseudoElement` hints are drawn by their site module; a generic overlay
/// asked for one falls back to centered placement.
pub fn place(rect: DOMRect, scroll: ScrollOffset, position: HintPosition, config: &EngineConfig) -> Placement {
    let top = scroll.y + rect.bottom() + config.overlay_gap_px;
    match position {
        HintPosition::BelowLeft => Placement {
            top,
            left: scroll.x + rect.left() + config.edge_inset_px,
            transform: "none",
        },
        HintPosition::BelowRight => Placement {
            top,
            left: scroll.x + rect.right() - config.edge_inset_px,
            transform: "translateX(-100%)",
        },
        HintPosition::BelowCenter | HintPosition::PseudoElement => Placement {
            top,
            left: scroll.x + rect.left() + rect.width / 2.0,
            transform: "translateX(-50%)",
        },
    }
}

/// Viewport coordinates `(left, top)` for a fixed hint at the inline end of
/// a box, vertically centered
pub fn place_fixed_inline_end(rect: DOMRect, inset: f64) -> (f64, f64) {
    (rect.right() - inset, rect.top() + rect.height / 2.0)
}
