//! Window state
//!
//! Scroll offsets, viewport size, color scheme preference, page visibility
//! and the focused element.

use crate::NodeId;

/// Page visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden,
}

impl VisibilityState {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }
}

/// `(scrollX, scrollY)`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Browser window
#[derive(Debug, Clone)]
pub struct Window {
    pub scroll: ScrollOffset,
    pub inner_width: f64,
    pub inner_height: f64,
    /// `prefers-color-scheme: dark`
    pub prefers_dark: bool,
    pub visibility: VisibilityState,
    pub active_element: Option<NodeId>,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            scroll: ScrollOffset::default(),
            inner_width: 1280.0,
            inner_height: 720.0,
            prefers_dark: false,
            visibility: VisibilityState::Visible,
            active_element: None,
        }
    }
}

impl Window {
    pub fn new(inner_width: f64, inner_height: f64) -> Self {
        Self {
            inner_width,
            inner_height,
            ..Default::default()
        }
    }

    pub fn scroll_x(&self) -> f64 {
        self.scroll.x
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll.y
    }

    /// Scroll offsets never go negative
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll = ScrollOffset {
            x: x.max(0.0),
            y: y.max(0.0),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_clamped() {
        let mut window = Window::new(800.0, 600.0);
        window.scroll_to(-5.0, 120.0);
        assert_eq!(window.scroll_x(), 0.0);
        assert_eq!(window.scroll_y(), 120.0);
        assert_eq!(window.visibility.as_str(), "visible");
    }
}
