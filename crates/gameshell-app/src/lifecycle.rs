//! Screen focus → bridge lifecycle mapping
//!
//! [`LifecycleCoordinator`] turns screen focus transitions into bridge
//! actions. It decides, the bridge executes. Focus loss never tears down
//! immediately: it arms a grace timer tagged with the current focus epoch,
//! and an expiry only acts if no focus change happened since.

use std::time::Duration;

use gameshell_core::BridgeStatus;

/// Focus/visibility transition of the screen hosting the engine view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenEvent {
    FocusGained,
    FocusLost,
    Unmounted,
}

/// Bridge operation requested by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    Bootstrap { scene: String },
    /// Resynchronize the scene; sent even if it is already active
    RequestScene { scene: String },
    Resume,
    Pause,
    ArmGraceTimer { epoch: u64, after: Duration },
    Teardown,
}

#[derive(Debug)]
pub struct LifecycleCoordinator {
    scene: String,
    grace: Duration,
    focused: bool,
    epoch: u64,
}

impl LifecycleCoordinator {
    pub fn new(scene: impl Into<String>, grace: Duration) -> Self {
        Self {
            scene: scene.into(),
            grace,
            focused: false,
            epoch: 0,
        }
    }

    /// Scene bootstrapped or re-requested when focus returns
    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn set_scene(&mut self, scene: impl Into<String>) {
        self.scene = scene.into();
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Actions for a screen transition, given the bridge's current state
    pub fn on_screen_event(
        &mut self,
        event: ScreenEvent,
        status: BridgeStatus,
        paused: bool,
    ) -> Vec<LifecycleAction> {
        // Every transition invalidates armed grace timers.
        self.epoch += 1;

        match event {
            ScreenEvent::FocusGained => {
                self.focused = true;
                match status {
                    BridgeStatus::Idle => vec![LifecycleAction::Bootstrap {
                        scene: self.scene.clone(),
                    }],
                    BridgeStatus::Ready => {
                        let mut actions = Vec::with_capacity(2);
                        if paused {
                            actions.push(LifecycleAction::Resume);
                        }
                        actions.push(LifecycleAction::RequestScene {
                            scene: self.scene.clone(),
                        });
                        actions
                    }
                    BridgeStatus::Booting if paused => vec![LifecycleAction::Resume],
                    // A failed session waits for an explicit retry.
                    BridgeStatus::Booting | BridgeStatus::Error => Vec::new(),
                }
            }
            ScreenEvent::FocusLost => {
                self.focused = false;
                let arm = LifecycleAction::ArmGraceTimer {
                    epoch: self.epoch,
                    after: self.grace,
                };
                match status {
                    BridgeStatus::Booting | BridgeStatus::Ready => {
                        vec![LifecycleAction::Pause, arm]
                    }
                    BridgeStatus::Error => vec![arm],
                    BridgeStatus::Idle => Vec::new(),
                }
            }
            ScreenEvent::Unmounted => {
                self.focused = false;
                vec![LifecycleAction::Teardown]
            }
        }
    }

    /// A grace timer fired. Tears down only if nothing changed since it was armed.
    pub fn on_grace_expired(&mut self, epoch: u64) -> Option<LifecycleAction> {
        if epoch == self.epoch && !self.focused {
            Some(LifecycleAction::Teardown)
        } else {
            None
        }
    }
}
