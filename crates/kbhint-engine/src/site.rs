//! Site modules
//!
//! A site module owns everything hostname-specific: which hints exist and how
//! to show or hide each one. The engine only ever calls the trait methods.

use std::collections::HashMap;
use std::fmt;

use kbhint_dom::{DomError, Page, SelectorError};

use crate::{EngineConfig, HintDescriptor, OverlayStore};

/// Errors from applying a single hint
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("unknown hint {0:?}")]
    UnknownHint(String),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// What a module gets to work with during a pass
pub struct SiteContext<'a> {
    pub page: &'a mut Page,
    pub overlays: &'a mut OverlayStore,
    pub config: &'a EngineConfig,
}

impl SiteContext<'_> {
    /// Render the hint's shortcut over every match of its selector
    pub fn render_hint(&mut self, hint: &HintDescriptor, selector: &str) -> usize {
        self.overlays
            .render_for_selector(self.page, selector, &hint.shortcut, hint.position, None, self.config)
    }
}

/// Per-hostname hint strategy
pub trait SiteModule {
    /// Exact `location.hostname` this module serves
    fn hostname(&self) -> &str;

    /// Declared hints, in apply order
    fn list_hints(&self) -> &[HintDescriptor];

    /// Show or hide one hint. Must be idempotent.
    fn apply(&mut self, cx: &mut SiteContext<'_>, hint_id: &str, enabled: bool) -> Result<(), SiteError>;

    /// Remove everything the module ever added to the page
    fn remove_all(&mut self, cx: &mut SiteContext<'_>);

    /// Overrides the default relevance allow-list for the mutation watcher
    fn relevance_selector(&self) -> Option<&str> {
        None
    }

    fn hint(&self, hint_id: &str) -> Option<&HintDescriptor> {
        self.list_hints().iter().find(|h| h.id == hint_id)
    }
}

/// Hostname to module lookup, built once at startup
#[derive(Default)]
pub struct SiteRegistry {
    modules: HashMap<String, Box<dyn SiteModule>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any previous one for the same hostname
    pub fn register(&mut self, module: Box<dyn SiteModule>) -> Option<Box<dyn SiteModule>> {
        let hostname = module.hostname().to_string();
        self.modules.insert(hostname, module)
    }

    pub fn with(mut self, module: impl SiteModule + 'static) -> Self {
        self.register(Box::new(module));
        self
    }

    pub fn get(&self, hostname: &str) -> Option<&dyn SiteModule> {
        self.modules.get(hostname).map(|m| m.as_ref())
    }

    pub fn get_mut(&mut self, hostname: &str) -> Option<&mut Box<dyn SiteModule>> {
        self.modules.get_mut(hostname)
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.modules.contains_key(hostname)
    }

    /// Registered hostnames, sorted
    pub fn hostnames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteRegistry").field("hostnames", &self.hostnames()).finish()
    }
}

/// A module described entirely by selector-bearing hint descriptors.
///
/// Enabled hints render a generic overlay on every selector match; disabled
/// hints remove overlays whose anchors match. Hints without a selector are
/// accepted and do nothing.
#[derive(Debug, Clone)]
pub struct DeclarativeSite {
    hostname: String,
    hints: Vec<HintDescriptor>,
    relevance: Option<String>,
}

impl DeclarativeSite {
    pub fn new(hostname: impl Into<String>, hints: Vec<HintDescriptor>) -> Self {
        Self {
            hostname: hostname.into(),
            hints,
            relevance: None,
        }
    }

    pub fn with_relevance_selector(mut self, selector: impl Into<String>) -> Self {
        self.relevance = Some(selector.into());
        self
    }
}

impl SiteModule for DeclarativeSite {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn list_hints(&self) -> &[HintDescriptor] {
        &self.hints
    }

    fn apply(&mut self, cx: &mut SiteContext<'_>, hint_id: &str, enabled: bool) -> Result<(), SiteError> {
        let hint = self
            .hint(hint_id)
            .ok_or_else(|| SiteError::UnknownHint(hint_id.to_string()))?;
        let Some(selector) = hint.selector.as_deref() else {
            return Ok(());
        };
        if enabled {
            let rendered = cx.render_hint(hint, selector);
            tracing::debug!("hint {} rendered on {} element(s)", hint_id, rendered);
        } else {
            cx.overlays.remove_for_selector(cx.page, selector);
        }
        Ok(())
    }

    fn remove_all(&mut self, cx: &mut SiteContext<'_>) {
        cx.overlays.remove_all(cx.page);
    }

    fn relevance_selector(&self) -> Option<&str> {
        self.relevance.as_deref()
    }
}
