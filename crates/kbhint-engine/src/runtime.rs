//! Hint runtime
//!
//! Drives one page: owns the site registry, settings store, overlay store,
//! watcher and scheduler, and runs everything off a virtual-time task queue.
//!
//! Mutation records and settings changes are delivered at checkpoints between
//! tasks. Work the engine does on the page (apply passes, repositioning,
//! message handling, module listeners) runs under a guard; the records it
//! produces are discarded when the guarded section ends, so the engine never
//! reacts to its own writes.

use kbhint_dom::{Event, EventKind, EventTarget, NodeId, Page, ReadyState, VisibilityState};

use crate::settings::{SiteHints, SITE_HINTS_KEY};
use crate::{
    ApplyScheduler, EngineConfig, Message, MessageError, Millis, MutationWatcher, OverlayStore, Response,
    ScheduleDecision, SettingsStore, SiteContext, SiteRegistry, TaskQueue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    /// Bootstrap retry: ask the scheduler for a pass
    RequestApply,
    /// The scheduler's pending pass
    RunApply,
    /// Animation frame: restyle and re-place every overlay
    Reposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    WaitingForDom,
    Running,
}

/// Counters for tests and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Apply passes run against a site module
    pub passes: u32,
    pub last_pass_at: Option<Millis>,
    pub reposition_frames: u32,
    /// Re-apply signals dropped because a pass was already pending
    pub signals_coalesced: u32,
    /// Mutation records produced by the engine itself and discarded
    pub mutations_absorbed: u32,
}

pub struct HintRuntime<S: SettingsStore> {
    page: Page,
    registry: SiteRegistry,
    store: S,
    config: EngineConfig,
    overlays: OverlayStore,
    watcher: MutationWatcher,
    scheduler: ApplyScheduler,
    queue: TaskQueue<Task>,
    lifecycle: Lifecycle,
    frame_pending: bool,
    in_pass: bool,
    stats: RuntimeStats,
}

impl<S: SettingsStore> HintRuntime<S> {
    pub fn new(page: Page, registry: SiteRegistry, store: S, config: EngineConfig) -> Self {
        let relevance = registry
            .get(page.hostname())
            .and_then(|m| m.relevance_selector())
            .unwrap_or(config.relevance_selector.as_str())
            .to_string();

        Self {
            watcher: MutationWatcher::new(&relevance),
            scheduler: ApplyScheduler::new(config.min_apply_interval_ms),
            queue: TaskQueue::new(config.frame_interval_ms),
            overlays: OverlayStore::new(),
            lifecycle: Lifecycle::Idle,
            frame_pending: false,
            in_pass: false,
            stats: RuntimeStats::default(),
            page,
            registry,
            store,
            config,
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Boot now, or once DOMContentLoaded fires if the document is loading
    pub fn start(&mut self) {
        if self.lifecycle != Lifecycle::Idle {
            return;
        }
        if self.page.document.ready_state() == ReadyState::Loading {
            tracing::debug!("document still loading; waiting for DOMContentLoaded");
            self.lifecycle = Lifecycle::WaitingForDom;
            return;
        }
        self.boot();
    }

    fn boot(&mut self) {
        self.lifecycle = Lifecycle::Running;
        tracing::info!("kbhint starting on {:?}", self.page.hostname());

        let now = self.now();
        self.scheduler.record_direct_pass(now);
        self.guarded(|rt| rt.run_pass());

        self.watcher.bind(&mut self.page.document);
        for &delay in &self.config.bootstrap_delays_ms {
            self.queue.schedule_after(delay, Task::RequestApply);
        }
    }

    /// Remove everything, cancel pending work and stop observing
    pub fn teardown(&mut self) {
        let hostname = self.page.hostname().to_string();
        self.guarded(|rt| {
            if let Some(module) = rt.registry.get_mut(&hostname) {
                let mut cx = SiteContext {
                    page: &mut rt.page,
                    overlays: &mut rt.overlays,
                    config: &rt.config,
                };
                module.remove_all(&mut cx);
            }
            rt.overlays.remove_all(&mut rt.page);
        });

        self.queue.clear();
        self.scheduler.reset();
        self.frame_pending = false;
        self.watcher.unbind(&mut self.page.document);
        self.lifecycle = Lifecycle::Idle;
        tracing::info!("kbhint torn down on {:?}", hostname);
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Deliver a page event: page listeners first, then the engine's reactions
    pub fn dispatch(&mut self, kind: EventKind, target: EventTarget) {
        let event = Event::new(kind, target);
        self.guarded(|rt| {
            rt.page.dispatch(event);
        });
        self.react(event);
    }

    fn react(&mut self, event: Event) {
        if event.kind == EventKind::DomContentLoaded {
            if self.lifecycle == Lifecycle::WaitingForDom {
                if self.page.document.ready_state() == ReadyState::Loading {
                    self.page.document.set_ready_state(ReadyState::Interactive);
                }
                self.boot();
            }
            return;
        }
        if !self.is_running() {
            return;
        }
        match event.kind {
            EventKind::VisibilityChange => {
                if !self.page.window.visibility.is_hidden() {
                    self.request_reposition();
                    self.request_apply();
                }
            }
            EventKind::PopState | EventKind::HashChange => self.request_apply(),
            EventKind::Scroll | EventKind::Resize => self.request_reposition(),
            EventKind::Focus | EventKind::Blur | EventKind::DomContentLoaded => {}
        }
    }

    /// Host finished parsing: mark the document interactive and fire
    /// DOMContentLoaded
    pub fn finish_loading(&mut self) {
        self.page.document.set_ready_state(ReadyState::Interactive);
        self.dispatch(EventKind::DomContentLoaded, EventTarget::Document);
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.page.window.scroll_to(x, y);
        self.dispatch(EventKind::Scroll, EventTarget::Window);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.page.window.inner_width = width;
        self.page.window.inner_height = height;
        self.dispatch(EventKind::Resize, EventTarget::Window);
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.page.window.visibility = if hidden {
            VisibilityState::Hidden
        } else {
            VisibilityState::Visible
        };
        self.dispatch(EventKind::VisibilityChange, EventTarget::Document);
    }

    /// SPA navigation through `location.hash`
    pub fn push_hash(&mut self, hash: &str) {
        self.page.document.set_hash(hash);
        self.dispatch(EventKind::HashChange, EventTarget::Window);
    }

    /// History navigation to `url`
    pub fn pop_state(&mut self, url: &str) {
        self.page.document.set_url(url);
        self.dispatch(EventKind::PopState, EventTarget::Window);
    }

    pub fn focus(&mut self, element: Option<NodeId>) {
        self.guarded(|rt| rt.page.focus(element));
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    pub fn now(&self) -> Millis {
        self.queue.now()
    }

    pub fn advance_by(&mut self, delta: Millis) {
        let target = self.now().saturating_add(delta);
        self.advance_to(target);
    }

    /// Run every task due up to `target`, checkpointing between tasks
    pub fn advance_to(&mut self, target: Millis) {
        loop {
            self.checkpoint();
            if let Some((_, task)) = self.queue.pop_due(target) {
                self.run_task(task);
                continue;
            }
            if self.queue.now() >= target {
                break;
            }
            self.queue.advance_clock(target);
        }
    }

    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::RequestApply => self.request_apply(),
            Task::RunApply => {
                let now = self.now();
                self.scheduler.complete(now);
                self.guarded(|rt| rt.run_pass());
            }
            Task::Reposition => {
                self.frame_pending = false;
                let report = self.guarded(|rt| rt.overlays.reposition_all(&mut rt.page, &rt.config));
                self.stats.reposition_frames += 1;
                tracing::trace!("reposition frame at {}: {:?}", self.now(), report);
            }
        }
    }

    fn checkpoint(&mut self) {
        self.deliver_mutations();
        self.deliver_settings_changes();
    }

    fn deliver_mutations(&mut self) {
        if self.in_pass {
            return;
        }
        let records = self.page.tree_mut().take_records();
        if records.is_empty() || !self.is_running() {
            return;
        }
        if self.watcher.scan(self.page.tree(), &records) {
            self.request_apply();
        }
    }

    fn deliver_settings_changes(&mut self) {
        let changes = self.store.take_changes();
        if self.is_running() && changes.iter().any(|k| k == SITE_HINTS_KEY) {
            tracing::debug!("site hint settings changed");
            self.request_apply();
        }
    }

    fn request_apply(&mut self) {
        match self.scheduler.request(self.now()) {
            ScheduleDecision::Coalesced => self.stats.signals_coalesced += 1,
            ScheduleDecision::Scheduled { delay } => {
                tracing::debug!("apply pass scheduled in {}ms", delay);
                self.queue.schedule_after(delay, Task::RunApply);
            }
        }
    }

    fn request_reposition(&mut self) {
        if self.frame_pending {
            return;
        }
        self.frame_pending = true;
        self.queue.request_frame(Task::Reposition);
    }

    /// Run engine work whose DOM writes must not reach the watcher
    fn guarded<R>(&mut self, work: impl FnOnce(&mut Self) -> R) -> R {
        // Host records queued before this point are still owed to the watcher
        self.deliver_mutations();

        self.in_pass = true;
        let out = work(self);
        let absorbed = self.page.tree_mut().take_records().len();
        self.in_pass = false;

        self.stats.mutations_absorbed += absorbed as u32;
        if self.overlays.take_reposition_request() {
            self.request_reposition();
        }
        out
    }

    /// Apply every declared hint of the page's module, in declaration order
    fn run_pass(&mut self) {
        let hostname = self.page.hostname().to_string();
        let Some(module) = self.registry.get_mut(&hostname) else {
            tracing::debug!("no site module for {:?}", hostname);
            return;
        };

        let toggles = SiteHints::load(&self.store, &hostname);
        let hints = module.list_hints().to_vec();
        let mut cx = SiteContext {
            page: &mut self.page,
            overlays: &mut self.overlays,
            config: &self.config,
        };

        let mut failed = 0;
        for hint in &hints {
            let enabled = toggles.enabled(hint);
            if let Err(e) = module.apply(&mut cx, &hint.id, enabled) {
                failed += 1;
                tracing::warn!("hint {:?} on {:?} failed: {}", hint.id, hostname, e);
            }
        }

        // Boxes of nodes the host destroyed since the last pass
        self.page.document.prune_layout();

        let now = self.queue.now();
        self.stats.passes += 1;
        self.stats.last_pass_at = Some(now);
        tracing::debug!(
            "apply pass at {}ms: {} hint(s), {} failed",
            now,
            hints.len(),
            failed
        );
    }

    // ---------------------------------------------------------------------
    // Messages
    // ---------------------------------------------------------------------

    /// Handle a popup message; `None` means no response is sent
    pub fn handle_message(&mut self, message: Message) -> Option<Response> {
        if !self.is_running() {
            return None;
        }
        match message {
            Message::UpdateHint {
                hostname,
                hint_id,
                enabled,
            } => {
                if hostname != self.page.hostname() {
                    tracing::trace!("ignoring updateHint for {:?}", hostname);
                    return None;
                }
                let outcome = self.guarded(|rt| {
                    let module = rt.registry.get_mut(&hostname)?;
                    let mut cx = SiteContext {
                        page: &mut rt.page,
                        overlays: &mut rt.overlays,
                        config: &rt.config,
                    };
                    Some(module.apply(&mut cx, &hint_id, enabled))
                });
                match outcome {
                    Some(Ok(())) => Some(Response::SUCCESS),
                    Some(Err(e)) => {
                        tracing::warn!("updateHint {:?} failed: {}", hint_id, e);
                        None
                    }
                    None => None,
                }
            }
        }
    }

    pub fn handle_message_json(&mut self, json: &str) -> Result<Option<Response>, MessageError> {
        let message = Message::from_json(json)?;
        Ok(self.handle_message(message))
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Host-side access for simulating page changes
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }
}
