//! Engine bridge runtime
//!
//! [`EngineBridge`] is the handle the application holds. It owns the
//! [`BridgeSession`], the [`LifecycleCoordinator`] and the
//! [`EffectsGovernor`] behind one lock, and runs the async side: attach,
//! bootstrap deadline, inbound frame pump, and focus grace timers. Spawned
//! tasks hold only a weak reference and carry the generation (or focus epoch)
//! they were started for.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{mpsc, watch};

use gameshell_core::prelude::*;
use gameshell_core::{BridgeFault, BridgeStatus, InboundEvent, Payload};
use gameshell_engine::{
    parse_engine_message, EffectsQuality, EngineCommand, EngineHost, EngineSender, RenderMode,
};

use crate::config::Settings;
use crate::lifecycle::{LifecycleAction, LifecycleCoordinator, ScreenEvent};
use crate::quality::EffectsGovernor;
use crate::session::{BootstrapStart, BridgeSession, BridgeSnapshot, Dispatch};
use crate::view::ViewObserver;

struct BridgeState {
    session: BridgeSession,
    coordinator: LifecycleCoordinator,
    governor: EffectsGovernor,
}

struct Shared<H> {
    host: Arc<H>,
    settings: Settings,
    state: Mutex<BridgeState>,
    snapshot_tx: watch::Sender<BridgeSnapshot>,
}

/// Cloneable handle to the engine bridge
pub struct EngineBridge<H> {
    shared: Arc<Shared<H>>,
}

impl<H> Clone for EngineBridge<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

/// Non-owning handle, held by views and background tasks
pub struct WeakBridge<H> {
    shared: Weak<Shared<H>>,
}

impl<H> Clone for WeakBridge<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<H> WeakBridge<H> {
    pub fn upgrade(&self) -> Option<EngineBridge<H>> {
        self.shared.upgrade().map(|shared| EngineBridge { shared })
    }
}

impl<H: EngineHost + Sync + 'static> EngineBridge<H> {
    pub fn new(host: H, settings: Settings) -> Self {
        let bridge = &settings.bridge;
        let session = BridgeSession::new(
            bridge.default_scene.clone(),
            bridge.render_mode,
            bridge.queue_capacity,
            bridge.command_ttl(),
        );
        let coordinator =
            LifecycleCoordinator::new(bridge.default_scene.clone(), bridge.focus_grace());
        let governor = EffectsGovernor::from_settings(&settings.quality);
        let (snapshot_tx, _) = watch::channel(session.snapshot());

        info!(
            "Engine bridge created (host: {}, scene: {})",
            host.name(),
            bridge.default_scene
        );

        Self {
            shared: Arc::new(Shared {
                host: Arc::new(host),
                settings,
                state: Mutex::new(BridgeState {
                    session,
                    coordinator,
                    governor,
                }),
                snapshot_tx,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.shared.settings
    }

    pub fn downgrade(&self) -> WeakBridge<H> {
        WeakBridge {
            shared: Arc::downgrade(&self.shared),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Attach to the engine and wait until it is ready.
    ///
    /// Concurrent calls share one attach and see the same outcome. Resolves
    /// with an error on attach failure, timeout, engine `ERROR`, disconnect,
    /// or [`Error::TornDown`] if the session is torn down first.
    pub async fn bootstrap(&self, scene: &str) -> Result<()> {
        let waiter = {
            let mut state = self.lock();
            let waiter = match self.start_bootstrap(&mut state, Some(scene)) {
                BootstrapStart::AlreadyReady => return Ok(()),
                BootstrapStart::Joined(waiter) => waiter,
                BootstrapStart::Started { waiter, .. } => waiter,
            };
            self.publish(&state);
            waiter
        };

        match waiter.await {
            Ok(outcome) => outcome.into_result(),
            Err(_) => Err(Error::TornDown),
        }
    }

    /// [`bootstrap`](Self::bootstrap) with the configured default scene
    pub async fn bootstrap_default(&self) -> Result<()> {
        let scene = self.lock().session.default_scene().to_string();
        self.bootstrap(&scene).await
    }

    fn start_bootstrap(&self, state: &mut BridgeState, scene: Option<&str>) -> BootstrapStart {
        let start = state.session.begin_bootstrap(scene);
        if let BootstrapStart::Started { generation, .. } = &start {
            state.governor.reset();
            self.spawn_attach(*generation);
        }
        start
    }

    fn spawn_attach(&self, generation: u64) {
        let timeout = self.shared.settings.bridge.bootstrap_timeout();

        let weak = self.downgrade();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(bridge) = weak.upgrade() {
                bridge.update(|state| state.session.on_boot_deadline(generation, timeout));
            }
        });

        let weak = self.downgrade();
        let host = self.shared.host.clone();
        tokio::spawn(async move {
            let attached = host.attach().await;
            let Some(bridge) = weak.upgrade() else {
                return;
            };
            match attached {
                Ok(channel) => {
                    let (sender, inbound) = channel.split();
                    if bridge.on_attached(generation, sender) {
                        bridge.spawn_pump(generation, inbound);
                    }
                }
                Err(e) => {
                    warn!("Engine attach failed via {}: {}", host.name(), e);
                    bridge.update(|state| state.session.on_attach_failed(generation, e));
                }
            }
        });
    }

    fn on_attached(&self, generation: u64, sender: EngineSender) -> bool {
        let mut state = self.lock();
        let attached = state.session.on_attached(generation, sender);
        self.publish(&state);
        attached
    }

    fn spawn_pump(&self, generation: u64, mut inbound: mpsc::UnboundedReceiver<String>) {
        let weak = self.downgrade();
        tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                let Some(bridge) = weak.upgrade() else {
                    return;
                };
                let Some(event) = parse_engine_message(&frame) else {
                    continue;
                };
                if !bridge.on_inbound(generation, event) {
                    debug!("Inbound pump for session {} retired", generation);
                    return;
                }
            }
            if let Some(bridge) = weak.upgrade() {
                bridge.update(|state| state.session.on_disconnected(generation));
            }
        });
    }

    fn on_inbound(&self, generation: u64, event: InboundEvent) -> bool {
        let mut state = self.lock();
        let current = state.session.generation() == generation;
        let tier = if current && self.shared.settings.quality.adaptive {
            state.governor.observe(&event)
        } else {
            None
        };

        if !state.session.on_event(generation, event) {
            return false;
        }
        if let Some(quality) = tier {
            info!("Adapting effects quality to {}", quality);
            state.session.send(EngineCommand::SetEffectsQuality(quality));
        }
        self.publish(&state);
        true
    }

    // ─────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────

    /// Send a command now, or queue it until the engine is ready
    pub fn send_command(&self, name: &str, payload: Option<Payload>) -> Dispatch {
        self.update(|state| state.session.send_command(name, payload))
    }

    pub fn send(&self, command: EngineCommand) -> Dispatch {
        self.update(|state| state.session.send(command))
    }

    /// Request a scene; a no-op if it is already active
    pub fn request_scene(&self, scene: &str) -> Dispatch {
        self.update(|state| state.session.request_scene(scene, false))
    }

    pub fn pause(&self) -> Dispatch {
        self.update(|state| state.session.pause())
    }

    pub fn resume(&self) -> Dispatch {
        self.update(|state| state.session.resume())
    }

    /// Invoke `method` on a named engine object
    pub fn post_message(&self, object: &str, method: &str, payload: &str) -> Dispatch {
        self.send(EngineCommand::PostMessage {
            object: object.to_string(),
            method: method.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn set_effects_quality(&self, quality: EffectsQuality) -> Dispatch {
        self.update(|state| {
            state.governor.set_current(quality);
            state.session.send(EngineCommand::SetEffectsQuality(quality))
        })
    }

    pub fn set_render_mode(&self, mode: RenderMode) -> Dispatch {
        self.send(EngineCommand::SetRenderMode(mode))
    }

    /// Change the scene used for bootstrap and focus resynchronization
    pub fn set_default_scene(&self, scene: &str) {
        self.update(|state| {
            state.session.set_default_scene(scene);
            state.coordinator.set_scene(scene);
        })
    }

    /// End the session synchronously. Pending bootstraps resolve `TornDown`.
    pub fn teardown(&self) {
        self.update(|state| {
            state.session.teardown();
            state.governor.reset();
        })
    }

    // ─────────────────────────────────────────────────────────
    // View and focus hooks
    // ─────────────────────────────────────────────────────────

    pub fn view_attached(&self) {
        self.update(|state| {
            state.session.view_mounted();
        })
    }

    pub fn view_detached(&self) {
        self.update(|state| state.session.view_unmounted())
    }

    /// Screen gained focus.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime: it may spawn the attach
    /// task.
    pub fn focus_gained(&self) {
        self.screen_event(ScreenEvent::FocusGained)
    }

    /// Screen lost focus: pause and arm the grace timer.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime: it spawns the grace timer.
    pub fn focus_lost(&self) {
        self.screen_event(ScreenEvent::FocusLost)
    }

    /// The hosting screen went away: tear down with no grace period.
    ///
    /// Spawns nothing, so it is safe to call outside a runtime.
    pub fn screen_unmounted(&self) {
        self.screen_event(ScreenEvent::Unmounted)
    }

    fn screen_event(&self, event: ScreenEvent) {
        let mut state = self.lock();
        let status = state.session.status();
        let paused = state.session.is_paused();
        let actions = state.coordinator.on_screen_event(event, status, paused);
        debug!("{:?} while {} -> {:?}", event, status, actions);
        for action in actions {
            self.apply(&mut state, action);
        }
        self.publish(&state);
    }

    fn apply(&self, state: &mut BridgeState, action: LifecycleAction) {
        match action {
            LifecycleAction::Bootstrap { scene } => {
                // Nobody awaits a focus-driven bootstrap; observers follow
                // the snapshot instead.
                let _ = self.start_bootstrap(state, Some(&scene));
            }
            LifecycleAction::RequestScene { scene } => {
                state.session.request_scene(&scene, true);
            }
            LifecycleAction::Resume => {
                state.session.resume();
            }
            LifecycleAction::Pause => {
                state.session.pause();
            }
            LifecycleAction::ArmGraceTimer { epoch, after } => self.spawn_grace_timer(epoch, after),
            LifecycleAction::Teardown => {
                state.session.teardown();
                state.governor.reset();
            }
        }
    }

    fn spawn_grace_timer(&self, epoch: u64, after: std::time::Duration) {
        let weak = self.downgrade();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let Some(bridge) = weak.upgrade() else {
                return;
            };
            let mut state = bridge.lock();
            if let Some(action) = state.coordinator.on_grace_expired(epoch) {
                info!("Focus grace period elapsed, tearing down engine session");
                bridge.apply(&mut state, action);
                bridge.publish(&state);
            }
        });
    }

    // ─────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────

    pub fn observe_status(&self) -> BridgeStatus {
        self.lock().session.status()
    }

    /// Most recent inbound event, regardless of status
    pub fn observe_last_message(&self) -> Option<InboundEvent> {
        self.lock().session.last_message().cloned()
    }

    pub fn last_error(&self) -> Option<BridgeFault> {
        self.lock().session.last_error().cloned()
    }

    pub fn snapshot(&self) -> BridgeSnapshot {
        self.lock().session.snapshot()
    }

    /// Receive a new snapshot on every observable change
    pub fn subscribe(&self) -> watch::Receiver<BridgeSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    // ─────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut BridgeState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.publish(&state);
        result
    }

    fn publish(&self, state: &BridgeState) {
        let snapshot = state.session.snapshot();
        self.shared.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl<H: EngineHost + Sync + 'static> ViewObserver for WeakBridge<H> {
    fn view_attached(&self) {
        if let Some(bridge) = self.upgrade() {
            bridge.view_attached();
        }
    }

    fn view_detached(&self) {
        if let Some(bridge) = self.upgrade() {
            bridge.view_detached();
        }
    }
}
