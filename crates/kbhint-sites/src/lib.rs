//! kbhint site modules
//!
//! Hostname-specific hint strategies plugged into the engine's
//! [`SiteRegistry`].

mod whatsapp;
mod youtube;

pub use whatsapp::WhatsAppSite;
pub use youtube::YouTubeSite;

use kbhint_engine::SiteRegistry;

/// Registry with every built-in module
pub fn default_registry() -> SiteRegistry {
    SiteRegistry::new().with(YouTubeSite::new()).with(WhatsAppSite::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert_eq!(registry.hostnames(), vec!["web.whatsapp.com", "www.youtube.com"]);
        assert_eq!(registry.get("www.youtube.com").unwrap().list_hints().len(), 1);
        assert_eq!(registry.get("web.whatsapp.com").unwrap().list_hints().len(), 2);
    }
}
