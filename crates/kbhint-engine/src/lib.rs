//! kbhint Engine
//!
//! Keeps keyboard-shortcut hint overlays attached to host-page elements while
//! the page mutates, scrolls and navigates. Re-application is throttled, all
//! work runs on a single-threaded virtual-time task queue, and the engine's
//! own DOM writes never feed back into its mutation watcher.

pub mod config;
pub mod contrast;
pub mod hint;
pub mod message;
pub mod overlay;
pub mod position;
pub mod queue;
pub mod runtime;
pub mod scheduler;
pub mod settings;
pub mod site;
pub mod watcher;

pub use config::{ConfigError, EngineConfig};
pub use hint::{HintDescriptor, HintPosition};
pub use message::{Message, MessageError, Response};
pub use overlay::{OverlayEntry, OverlayStore, RepositionReport};
pub use position::Placement;
pub use queue::{Millis, TaskQueue};
pub use runtime::{HintRuntime, RuntimeStats};
pub use scheduler::{ApplyScheduler, ScheduleDecision};
pub use settings::{JsonFileStore, MemoryStore, SettingsStore, SiteHints, StoreError};
pub use site::{DeclarativeSite, SiteContext, SiteError, SiteModule, SiteRegistry};
pub use watcher::MutationWatcher;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
