//! Bridge session state machine
//!
//! [`BridgeSession`] is the single owner of [`BridgeStatus`]. It is purely
//! synchronous: the async runtime in [`crate::bridge`] feeds it attach
//! results, inbound events, timer expiries and disconnects, each tagged with
//! the generation that was current when the async work started.
//!
//! The generation advances whenever a session attempt ends (teardown, or any
//! transition into `Error`) and when a new bootstrap starts. A completion
//! carrying an older generation is ignored.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use gameshell_core::events::{command, event};
use gameshell_core::prelude::*;
use gameshell_core::{BridgeFault, BridgeStatus, InboundEvent, Payload};
use gameshell_engine::{handshake, EngineCommand, EngineSender, RenderMode};

use crate::queue::CommandQueue;

/// How an awaited bootstrap ended
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    Ready,
    Failed(BridgeFault),
    TornDown,
}

impl BootstrapOutcome {
    pub fn into_result(self) -> Result<()> {
        match self {
            BootstrapOutcome::Ready => Ok(()),
            BootstrapOutcome::Failed(fault) => Err(Error::Bridge(fault)),
            BootstrapOutcome::TornDown => Err(Error::TornDown),
        }
    }
}

/// Result of [`BridgeSession::begin_bootstrap`]
#[derive(Debug)]
pub enum BootstrapStart {
    /// A new attach must be started for `generation`
    Started {
        generation: u64,
        waiter: oneshot::Receiver<BootstrapOutcome>,
    },
    /// An attach is already in flight; wait for its outcome
    Joined(oneshot::Receiver<BootstrapOutcome>),
    AlreadyReady,
}

/// Whether the engine view currently shows the engine surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPresence {
    /// No view has ever bound (headless use); dispatch is not gated
    #[default]
    Unbound,
    Mounted,
    Unmounted,
}

/// What happened to a command handed to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Written to the engine channel
    Sent,
    /// Buffered until the engine can take it
    Queued { id: u64 },
    /// Not needed (scene already active, nothing to pause)
    Skipped,
    /// Refused while the session is in `Error`
    Rejected,
}

/// Point-in-time view of a session, published to observers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeSnapshot {
    pub generation: u64,
    pub status: BridgeStatus,
    pub scene: Option<String>,
    pub paused: bool,
    pub queued: usize,
    pub last_message: Option<InboundEvent>,
    pub last_error: Option<BridgeFault>,
}

#[derive(Debug)]
pub struct BridgeSession {
    generation: u64,
    status: BridgeStatus,
    default_scene: String,
    render_mode: RenderMode,
    /// Scene the in-flight bootstrap asked for
    booting_scene: Option<String>,
    active_scene: Option<String>,
    paused: bool,
    view: ViewPresence,
    queue: CommandQueue,
    last_message: Option<InboundEvent>,
    last_error: Option<BridgeFault>,
    sender: Option<EngineSender>,
    waiters: Vec<oneshot::Sender<BootstrapOutcome>>,
}

impl BridgeSession {
    pub fn new(
        default_scene: impl Into<String>,
        render_mode: RenderMode,
        queue_capacity: usize,
        command_ttl: Duration,
    ) -> Self {
        Self {
            generation: 0,
            status: BridgeStatus::Idle,
            default_scene: default_scene.into(),
            render_mode,
            booting_scene: None,
            active_scene: None,
            paused: false,
            view: ViewPresence::Unbound,
            queue: CommandQueue::new(queue_capacity, command_ttl),
            last_message: None,
            last_error: None,
            sender: None,
            waiters: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    pub fn default_scene(&self) -> &str {
        &self.default_scene
    }

    pub fn set_default_scene(&mut self, scene: impl Into<String>) {
        self.default_scene = scene.into();
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.active_scene.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn view(&self) -> ViewPresence {
        self.view
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn last_message(&self) -> Option<&InboundEvent> {
        self.last_message.as_ref()
    }

    pub fn last_error(&self) -> Option<&BridgeFault> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            generation: self.generation,
            status: self.status,
            scene: self.active_scene.clone(),
            paused: self.paused,
            queued: self.queue.len(),
            last_message: self.last_message.clone(),
            last_error: self.last_error.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Start (or join) a bootstrap. `None` uses the default scene.
    pub fn begin_bootstrap(&mut self, scene: Option<&str>) -> BootstrapStart {
        match self.status {
            BridgeStatus::Ready => return BootstrapStart::AlreadyReady,
            BridgeStatus::Booting => {
                let (tx, rx) = oneshot::channel();
                self.waiters.push(tx);
                return BootstrapStart::Joined(rx);
            }
            BridgeStatus::Idle | BridgeStatus::Error => {}
        }

        let scene = scene.unwrap_or(&self.default_scene).to_string();
        self.generation += 1;
        self.sender = None;
        self.last_error = None;
        self.paused = false;
        self.booting_scene = Some(scene.clone());
        self.set_status(BridgeStatus::Booting);
        info!(
            "Bootstrapping engine session {} with scene {} ({} queued)",
            self.generation,
            scene,
            self.queue.len()
        );

        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        BootstrapStart::Started {
            generation: self.generation,
            waiter: rx,
        }
    }

    /// Attach completed. Sends the handshake directly, ahead of the queue.
    ///
    /// Returns false when the attach is stale; the caller drops the channel.
    pub fn on_attached(&mut self, generation: u64, sender: EngineSender) -> bool {
        if generation != self.generation || self.status != BridgeStatus::Booting {
            debug!("Discarding stale attach for session {}", generation);
            return false;
        }

        let scene = self
            .booting_scene
            .clone()
            .unwrap_or_else(|| self.default_scene.clone());
        for frame in handshake(&scene, self.render_mode) {
            if sender.send_command(&frame).is_err() {
                self.fail_bootstrap(BridgeFault::ChannelDisconnected);
                return false;
            }
        }

        debug!("Engine attached for session {}, awaiting READY", generation);
        self.sender = Some(sender);
        true
    }

    pub fn on_attach_failed(&mut self, generation: u64, error: Error) {
        if generation != self.generation || self.status != BridgeStatus::Booting {
            return;
        }
        let fault = error
            .bridge_fault()
            .cloned()
            .unwrap_or_else(|| BridgeFault::EngineUnavailable {
                reason: error.to_string(),
            });
        self.fail_bootstrap(fault);
    }

    pub fn on_boot_deadline(&mut self, generation: u64, timeout: Duration) {
        if generation != self.generation || self.status != BridgeStatus::Booting {
            return;
        }
        self.fail_bootstrap(BridgeFault::BootstrapTimeout { timeout });
    }

    // ─────────────────────────────────────────────────────────
    // Inbound
    // ─────────────────────────────────────────────────────────

    /// Apply an inbound event. Returns false if it belongs to a stale session.
    pub fn on_event(&mut self, generation: u64, event: InboundEvent) -> bool {
        if generation != self.generation {
            trace!("Ignoring {} from stale session {}", event.name, generation);
            return false;
        }

        trace!("<- engine: {}", event.name);
        match event.name.as_str() {
            event::READY => self.on_ready(&event),
            event::SCENE_READY => {
                if let Some(scene) = event.str_field("sceneName") {
                    self.active_scene = Some(scene.to_string());
                }
            }
            event::ERROR => {
                let message = ["message", "error", "reason"]
                    .iter()
                    .find_map(|key| event.str_field(key))
                    .unwrap_or("unspecified engine error")
                    .to_string();
                let fault = BridgeFault::EngineReported { message };
                match self.status {
                    BridgeStatus::Booting => self.fail_bootstrap(fault),
                    BridgeStatus::Ready => self.enter_error(fault),
                    _ => {}
                }
            }
            _ => {}
        }

        self.last_message = Some(event);
        true
    }

    fn on_ready(&mut self, event: &InboundEvent) {
        if self.status != BridgeStatus::Booting {
            debug!("Duplicate READY while {}", self.status);
            return;
        }

        self.active_scene = event
            .str_field("sceneName")
            .map(str::to_string)
            .or_else(|| self.booting_scene.take());
        self.booting_scene = None;
        self.set_status(BridgeStatus::Ready);
        self.resolve_waiters(BootstrapOutcome::Ready);
        self.flush();
    }

    /// The inbound stream ended
    pub fn on_disconnected(&mut self, generation: u64) {
        if generation != self.generation {
            return;
        }
        match self.status {
            BridgeStatus::Booting => self.fail_bootstrap(BridgeFault::ChannelDisconnected),
            BridgeStatus::Ready => self.enter_error(BridgeFault::ChannelDisconnected),
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────

    /// Forward a command now if the engine can take it, otherwise queue it.
    pub fn send_command(&mut self, name: &str, payload: Option<Payload>) -> Dispatch {
        match self.status {
            BridgeStatus::Error => {
                warn!("Rejecting {} while the bridge is in error", name);
                return Dispatch::Rejected;
            }
            BridgeStatus::Ready if self.can_dispatch() && self.queue.is_empty() => {
                match self.transmit(name, payload.as_ref()) {
                    Ok(()) => return Dispatch::Sent,
                    Err(_) => {
                        let id = self.enqueue(name, payload);
                        self.on_disconnected(self.generation);
                        return Dispatch::Queued { id };
                    }
                }
            }
            _ => {}
        }

        let id = self.enqueue(name, payload);
        Dispatch::Queued { id }
    }

    pub fn send(&mut self, command: EngineCommand) -> Dispatch {
        let (name, args) = command.into_parts();
        self.send_command(&name, args)
    }

    /// Ask for `scene`. Unless `force` is set, a request for the scene that
    /// is already active while ready is skipped.
    pub fn request_scene(&mut self, scene: &str, force: bool) -> Dispatch {
        if !force && self.status.is_ready() && self.active_scene.as_deref() == Some(scene) {
            debug!("Scene {} already active", scene);
            return Dispatch::Skipped;
        }
        self.send(EngineCommand::RequestScene {
            scene: scene.to_string(),
        })
    }

    pub fn pause(&mut self) -> Dispatch {
        if !matches!(self.status, BridgeStatus::Booting | BridgeStatus::Ready) {
            return Dispatch::Skipped;
        }
        let dispatch = self.send(EngineCommand::Pause);
        self.paused = true;
        dispatch
    }

    pub fn resume(&mut self) -> Dispatch {
        if !matches!(self.status, BridgeStatus::Booting | BridgeStatus::Ready) {
            return Dispatch::Skipped;
        }
        let dispatch = self.send(EngineCommand::Resume);
        self.paused = false;
        dispatch
    }

    /// Dispatch queued commands in FIFO order.
    ///
    /// Stale entries are dropped (see [`crate::queue`]). If the channel fails
    /// partway, the unsent entries go back to the head of the queue.
    pub fn flush(&mut self) -> usize {
        if !self.status.is_ready() || !self.can_dispatch() || self.queue.is_empty() {
            return 0;
        }

        let now = Instant::now();
        let batch = self.queue.take_batch(now);
        for entry in &batch.stale {
            let fault = BridgeFault::StaleCommandDropped {
                name: entry.name.clone(),
                age: entry.age(now),
            };
            debug!("{}", fault);
        }

        let mut sent = 0;
        let mut pending = batch.fresh.into_iter();
        while let Some(entry) = pending.next() {
            if self.transmit(&entry.name, entry.payload.as_ref()).is_err() {
                let rest: Vec<_> = std::iter::once(entry).chain(pending).collect();
                warn!(
                    "Engine channel failed mid-flush, {} commands returned to queue",
                    rest.len()
                );
                self.queue.restore_front(rest);
                self.on_disconnected(self.generation);
                return sent;
            }
            sent += 1;
        }

        if sent > 0 {
            debug!("Flushed {} queued commands", sent);
        }
        sent
    }

    // ─────────────────────────────────────────────────────────
    // View gating
    // ─────────────────────────────────────────────────────────

    pub fn view_mounted(&mut self) -> usize {
        self.view = ViewPresence::Mounted;
        self.flush()
    }

    pub fn view_unmounted(&mut self) {
        self.view = ViewPresence::Unmounted;
    }

    // ─────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────

    /// End the session: back to `Idle` with an empty queue.
    ///
    /// In-flight bootstraps resolve with [`BootstrapOutcome::TornDown`].
    pub fn teardown(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send_command(&EngineCommand::Teardown);
        }

        let dropped = self.queue.clear();
        self.generation += 1;
        self.booting_scene = None;
        self.active_scene = None;
        self.paused = false;
        self.last_message = None;
        self.last_error = None;
        self.set_status(BridgeStatus::Idle);
        self.resolve_waiters(BootstrapOutcome::TornDown);

        if dropped > 0 {
            debug!("Teardown discarded {} queued commands", dropped);
        }
    }

    // ─────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────

    fn can_dispatch(&self) -> bool {
        self.sender.is_some() && self.view != ViewPresence::Unmounted
    }

    fn transmit(&mut self, name: &str, payload: Option<&Payload>) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::ChannelClosed)?;
        sender.send(name, payload)?;

        if name == command::REQUEST_SCENE {
            if let Some(Value::String(scene)) = payload.and_then(|p| p.get("sceneName")) {
                self.active_scene = Some(scene.clone());
            }
        }
        Ok(())
    }

    fn enqueue(&mut self, name: &str, payload: Option<Payload>) -> u64 {
        let enqueued = self.queue.push(name, payload, Instant::now());
        if let Some(dropped) = enqueued.dropped {
            let fault = BridgeFault::QueueOverflow {
                dropped: dropped.name,
            };
            warn!("{}", fault);
            self.last_error = Some(fault);
        }
        trace!("Queued {} as #{}", name, enqueued.id);
        enqueued.id
    }

    fn fail_bootstrap(&mut self, fault: BridgeFault) {
        self.booting_scene = None;
        self.resolve_waiters(BootstrapOutcome::Failed(fault.clone()));
        self.enter_error(fault);
    }

    fn enter_error(&mut self, fault: BridgeFault) {
        warn!("Engine bridge error: {}", fault);
        self.generation += 1;
        self.sender = None;
        self.last_error = Some(fault);
        self.set_status(BridgeStatus::Error);
    }

    fn set_status(&mut self, status: BridgeStatus) {
        if self.status != status {
            info!("Bridge status: {} -> {}", self.status, status);
            self.status = status;
        }
    }

    fn resolve_waiters(&mut self, outcome: BootstrapOutcome) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gameshell_engine::{EngineChannel, HostEndpoint};
    use serde_json::json;

    fn session() -> BridgeSession {
        BridgeSession::new(
            "PlaceholderScene",
            RenderMode::Texture,
            50,
            Duration::from_secs(30),
        )
    }

    fn attach(session: &mut BridgeSession) -> (u64, HostEndpoint) {
        let generation = match session.begin_bootstrap(Some("TrialsArena")) {
            BootstrapStart::Started { generation, .. } => generation,
            other => panic!("expected a new bootstrap, got {other:?}"),
        };
        let (channel, endpoint) = EngineChannel::pair();
        let (sender, _inbound) = channel.split();
        assert!(session.on_attached(generation, sender));
        (generation, endpoint)
    }

    fn commands(endpoint: &mut HostEndpoint) -> Vec<String> {
        let mut names = Vec::new();
        while let Ok(frame) = endpoint.commands.try_recv() {
            let value: Value = serde_json::from_str(&frame).unwrap();
            names.push(value["command"].as_str().unwrap().to_string());
        }
        names
    }

    fn ready(session: &mut BridgeSession, generation: u64) {
        let data = json!({ "sceneName": "TrialsArena" }).as_object().cloned();
        let event = InboundEvent::new("READY", data);
        assert!(session.on_event(generation, event));
    }

    #[test]
    fn test_bootstrap_then_ready() {
        let mut session = session();
        let (generation, mut endpoint) = attach(&mut session);
        assert_eq!(session.status(), BridgeStatus::Booting);
        assert_eq!(commands(&mut endpoint), vec!["SET_RENDER_MODE", "BOOTSTRAP"]);

        ready(&mut session, generation);
        assert_eq!(session.status(), BridgeStatus::Ready);
        assert_eq!(session.active_scene(), Some("TrialsArena"));
        assert!(commands(&mut endpoint).is_empty());
    }

    #[test]
    fn test_second_bootstrap_joins_and_ready_is_noop() {
        let mut session = session();
        let (generation, _endpoint) = attach(&mut session);
        assert!(matches!(session.begin_bootstrap(None), BootstrapStart::Joined(_)));

        ready(&mut session, generation);
        assert!(matches!(session.begin_bootstrap(None), BootstrapStart::AlreadyReady));
    }

    #[test]
    fn test_commands_queue_while_booting_and_flush_in_order() {
        let mut session = session();
        let (generation, mut endpoint) = attach(&mut session);
        commands(&mut endpoint);

        assert!(matches!(session.send_command("START_COMBAT", None), Dispatch::Queued { .. }));
        assert!(matches!(session.send_command("LOAD_MAP", None), Dispatch::Queued { .. }));
        assert_eq!(session.queue().len(), 2);

        ready(&mut session, generation);
        assert_eq!(commands(&mut endpoint), vec!["START_COMBAT", "LOAD_MAP"]);
        assert!(session.queue().is_empty());

        assert_eq!(session.send_command("SCAN_RESOURCES", None), Dispatch::Sent);
        assert_eq!(commands(&mut endpoint), vec!["SCAN_RESOURCES"]);
    }

    #[test]
    fn test_idle_commands_are_queued() {
        let mut session = session();
        assert!(matches!(session.send_command("START_COMBAT", None), Dispatch::Queued { .. }));
        assert_eq!(session.snapshot().queued, 1);
    }

    #[test]
    fn test_overflow_sets_last_error_once_per_drop() {
        let mut session = BridgeSession::new("S", RenderMode::Texture, 2, Duration::from_secs(30));
        session.send_command("C1", None);
        session.send_command("C2", None);
        assert!(session.last_error().is_none());

        session.send_command("C3", None);
        assert_eq!(
            session.last_error(),
            Some(&BridgeFault::QueueOverflow {
                dropped: "C1".into()
            })
        );
        assert_eq!(session.status(), BridgeStatus::Idle);
        let names: Vec<_> = session.queue().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["C2", "C3"]);
    }

    #[test]
    fn test_attach_failure_moves_to_error() {
        let mut session = session();
        let BootstrapStart::Started {
            generation,
            mut waiter,
        } = session.begin_bootstrap(None)
        else {
            panic!("expected start");
        };
        session.send_command("START_COMBAT", None);
        session.on_attach_failed(generation, Error::engine_unavailable("not embedded"));

        assert_eq!(session.status(), BridgeStatus::Error);
        assert_eq!(session.last_error().map(BridgeFault::code), Some("EngineUnavailable"));
        assert_eq!(session.queue().len(), 1);
        assert!(matches!(
            waiter.try_recv(),
            Ok(BootstrapOutcome::Failed(BridgeFault::EngineUnavailable { .. }))
        ));
    }

    #[test]
    fn test_error_rejects_commands_until_retry() {
        let mut session = session();
        let BootstrapStart::Started { generation, .. } = session.begin_bootstrap(None) else {
            panic!("expected start");
        };
        session.on_boot_deadline(generation, Duration::from_secs(10));
        assert_eq!(session.send_command("START_COMBAT", None), Dispatch::Rejected);

        assert!(matches!(session.begin_bootstrap(None), BootstrapStart::Started { .. }));
        assert_eq!(session.status(), BridgeStatus::Booting);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_deadline_after_ready_is_ignored() {
        let mut session = session();
        let (generation, _endpoint) = attach(&mut session);
        ready(&mut session, generation);

        session.on_boot_deadline(generation, Duration::from_secs(10));
        assert_eq!(session.status(), BridgeStatus::Ready);
    }

    #[test]
    fn test_engine_error_while_booting() {
        let mut session = session();
        let (generation, _endpoint) = attach(&mut session);
        let data = json!({ "message": "shader compile failed" }).as_object().cloned();
        let event = InboundEvent::new("ERROR", data);
        session.on_event(generation, event);

        assert_eq!(session.status(), BridgeStatus::Error);
        assert_eq!(
            session.last_error(),
            Some(&BridgeFault::EngineReported {
                message: "shader compile failed".into()
            })
        );
        assert_eq!(session.last_message().map(|m| m.name.as_str()), Some("ERROR"));
    }

    #[test]
    fn test_disconnect_while_ready() {
        let mut session = session();
        let (generation, endpoint) = attach(&mut session);
        ready(&mut session, generation);
        drop(endpoint);

        session.on_disconnected(generation);
        assert_eq!(session.status(), BridgeStatus::Error);
        assert_eq!(session.last_error(), Some(&BridgeFault::ChannelDisconnected));
    }

    #[test]
    fn test_direct_send_failure_requeues() {
        let mut session = session();
        let (generation, endpoint) = attach(&mut session);
        ready(&mut session, generation);
        drop(endpoint);

        assert!(matches!(session.send_command("START_COMBAT", None), Dispatch::Queued { .. }));
        assert_eq!(session.status(), BridgeStatus::Error);
        assert_eq!(session.queue().len(), 1);
    }

    #[test]
    fn test_disconnect_mid_flush_restores_queue_for_retry() {
        let mut session = session();
        session.send_command("A", None);
        session.send_command("B", None);

        let (generation, endpoint) = attach(&mut session);
        drop(endpoint);
        session.on_event(generation, InboundEvent::new("READY", None));

        assert_eq!(session.status(), BridgeStatus::Error);
        assert_eq!(session.last_error(), Some(&BridgeFault::ChannelDisconnected));
        let names: Vec<_> = session.queue().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let (generation, mut endpoint) = attach(&mut session);
        ready(&mut session, generation);
        assert_eq!(
            commands(&mut endpoint),
            vec!["SET_RENDER_MODE", "BOOTSTRAP", "A", "B"]
        );
        assert!(session.queue().is_empty());
        assert!(session.last_error().is_none());
    }

    #[test]
    fn test_stale_generation_events_ignored() {
        let mut session = session();
        let (generation, _endpoint) = attach(&mut session);
        session.teardown();

        assert!(!session.on_event(generation, InboundEvent::new("READY", None)));
        assert_eq!(session.status(), BridgeStatus::Idle);
        assert!(session.last_message().is_none());
    }

    #[test]
    fn test_teardown_resolves_waiters_and_clears() {
        let mut session = session();
        let BootstrapStart::Started { mut waiter, .. } = session.begin_bootstrap(None) else {
            panic!("expected start");
        };
        session.send_command("START_COMBAT", None);
        session.teardown();

        assert_eq!(waiter.try_recv(), Ok(BootstrapOutcome::TornDown));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, BridgeStatus::Idle);
        assert_eq!(snapshot.queued, 0);
        assert!(snapshot.last_message.is_none());
        assert!(snapshot.last_error.is_none());
    }

    #[test]
    fn test_teardown_sends_teardown_frame() {
        let mut session = session();
        let (generation, mut endpoint) = attach(&mut session);
        ready(&mut session, generation);
        commands(&mut endpoint);

        session.teardown();
        assert_eq!(commands(&mut endpoint), vec!["TEARDOWN"]);
    }

    #[test]
    fn test_request_scene_dedup() {
        let mut session = session();
        let (generation, mut endpoint) = attach(&mut session);
        ready(&mut session, generation);
        commands(&mut endpoint);

        assert_eq!(session.request_scene("TrialsArena", false), Dispatch::Skipped);
        assert_eq!(session.request_scene("TrialsArena", true), Dispatch::Sent);
        assert_eq!(session.request_scene("ExploreHub", false), Dispatch::Sent);
        assert_eq!(session.active_scene(), Some("ExploreHub"));
        assert_eq!(commands(&mut endpoint), vec!["REQUEST_SCENE", "REQUEST_SCENE"]);
    }

    #[test]
    fn test_scene_ready_updates_active_scene() {
        let mut session = session();
        let (generation, _endpoint) = attach(&mut session);
        ready(&mut session, generation);

        let data = json!({ "sceneName": "BlindBoxShowcase" }).as_object().cloned();
        let event = InboundEvent::new("SCENE_READY", data);
        session.on_event(generation, event);
        assert_eq!(session.active_scene(), Some("BlindBoxShowcase"));
    }

    #[test]
    fn test_pause_resume_flags() {
        let mut session = session();
        assert_eq!(session.pause(), Dispatch::Skipped);

        let (generation, mut endpoint) = attach(&mut session);
        ready(&mut session, generation);
        commands(&mut endpoint);

        assert_eq!(session.pause(), Dispatch::Sent);
        assert!(session.is_paused());
        assert_eq!(session.resume(), Dispatch::Sent);
        assert!(!session.is_paused());
        assert_eq!(commands(&mut endpoint), vec!["PAUSE", "RESUME"]);
    }

    #[test]
    fn test_unmounted_view_gates_dispatch() {
        let mut session = session();
        let (generation, mut endpoint) = attach(&mut session);
        ready(&mut session, generation);
        commands(&mut endpoint);

        session.view_unmounted();
        assert!(matches!(session.send_command("START_COMBAT", None), Dispatch::Queued { .. }));
        assert!(commands(&mut endpoint).is_empty());

        assert_eq!(session.view_mounted(), 1);
        assert_eq!(commands(&mut endpoint), vec!["START_COMBAT"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entries_skipped_on_flush() {
        let mut session = session();
        let (generation, mut endpoint) = attach(&mut session);
        commands(&mut endpoint);

        session.send_command("OLD", None);
        tokio::time::advance(Duration::from_secs(31)).await;
        session.send_command("NEW", None);

        ready(&mut session, generation);
        assert_eq!(commands(&mut endpoint), vec!["NEW"]);
        assert!(session.last_error().is_none());
    }
}
