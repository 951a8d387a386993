//! Test utilities for driving the bridge against a scripted engine
//!
//! [`ScriptedEngineHost`] hands every attached [`HostEndpoint`] to a
//! [`ScriptedEngineHandle`], so a test plays the engine side by hand:
//! reading the commands the bridge wrote and emitting events back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use gameshell_core::prelude::*;
use gameshell_core::OutboundMessage;

use crate::host::{EngineChannel, EngineHost, HostEndpoint};
use crate::protocol::{encode_event, parse_command_frame};

/// Default timeout for waiting on bridge activity
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Engine host whose engine side is driven by a test
#[derive(Debug, Clone)]
pub struct ScriptedEngineHost {
    attach_count: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<String>>>,
    attach_delay: Duration,
    endpoints: mpsc::UnboundedSender<HostEndpoint>,
}

/// Test-side controller for a [`ScriptedEngineHost`]
#[derive(Debug)]
pub struct ScriptedEngineHandle {
    attach_count: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<String>>>,
    endpoints: mpsc::UnboundedReceiver<HostEndpoint>,
    current: Option<HostEndpoint>,
}

impl ScriptedEngineHost {
    /// Creates a host that attaches immediately.
    ///
    /// # Returns
    /// The host to hand to the bridge and the handle the test keeps.
    pub fn new() -> (Self, ScriptedEngineHandle) {
        let attach_count = Arc::new(AtomicUsize::new(0));
        let failure = Arc::new(Mutex::new(None));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                attach_count: attach_count.clone(),
                failure: failure.clone(),
                attach_delay: Duration::ZERO,
                endpoints: tx,
            },
            ScriptedEngineHandle {
                attach_count,
                failure,
                endpoints: rx,
                current: None,
            },
        )
    }

    /// Fail every attach with `EngineUnavailable` until the handle allows it
    pub fn failing(self, reason: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(reason.into());
        self
    }

    /// Wait this long inside `attach` before returning the channel
    pub fn with_attach_delay(mut self, delay: Duration) -> Self {
        self.attach_delay = delay;
        self
    }
}

impl EngineHost for ScriptedEngineHost {
    async fn attach(&self) -> Result<EngineChannel> {
        self.attach_count.fetch_add(1, Ordering::SeqCst);
        if !self.attach_delay.is_zero() {
            tokio::time::sleep(self.attach_delay).await;
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(reason) = failure {
            return Err(Error::engine_unavailable(reason));
        }

        let (channel, endpoint) = EngineChannel::pair();
        self.endpoints
            .send(endpoint)
            .map_err(|_| Error::engine_unavailable("scripted engine handle dropped"))?;
        Ok(channel)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

impl ScriptedEngineHandle {
    /// Number of `attach` calls the bridge has made so far
    pub fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::SeqCst)
    }

    /// Make subsequent attaches fail with `EngineUnavailable`
    pub fn fail_attaches(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(reason.into());
    }

    /// Let subsequent attaches succeed again
    pub fn allow_attaches(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Waits for the next successful attach and makes it the current session.
    ///
    /// # Panics
    /// If no attach happens within [`DEFAULT_TIMEOUT`].
    pub async fn next_attach(&mut self) {
        let endpoint = tokio::time::timeout(DEFAULT_TIMEOUT, self.endpoints.recv())
            .await
            .expect("timed out waiting for the bridge to attach")
            .expect("scripted host dropped");
        self.current = Some(endpoint);
    }

    /// Receive the next command frame from the current session, attaching
    /// first if needed. Panics on timeout.
    pub async fn recv_command(&mut self) -> OutboundMessage {
        if self.current.is_none() {
            self.next_attach().await;
        }
        let endpoint = self.current.as_mut().expect("attached");
        let frame = tokio::time::timeout(DEFAULT_TIMEOUT, endpoint.commands.recv())
            .await
            .expect("timed out waiting for a command")
            .expect("bridge closed the channel");
        parse_command_frame(&frame).expect("bridge wrote a malformed frame")
    }

    /// Take a command frame if one is already waiting
    pub fn try_recv_command(&mut self) -> Option<OutboundMessage> {
        let frame = self.current.as_mut()?.commands.try_recv().ok()?;
        parse_command_frame(&frame)
    }

    /// Drain every command currently waiting
    pub fn drain_commands(&mut self) -> Vec<OutboundMessage> {
        std::iter::from_fn(|| self.try_recv_command()).collect()
    }

    /// Receive the two handshake frames and check them
    pub async fn expect_handshake(&mut self, scene: &str) {
        let render = self.recv_command().await;
        assert_eq!(render.command, "SET_RENDER_MODE");

        let boot = self.recv_command().await;
        assert_eq!(boot.command, "BOOTSTRAP");
        let args = boot.args.expect("BOOTSTRAP carries args");
        assert_eq!(args["sceneName"], scene);
    }

    /// Emit an event to the bridge. `data` of `Value::Null` sends no data.
    pub fn emit(&self, event: &str, data: Value) {
        let frame = match data {
            Value::Object(map) => encode_event(event, Some(&map)),
            Value::Null => encode_event(event, None),
            other => serde_json::json!({ "event": event, "data": other }).to_string(),
        };
        self.emit_raw(&frame);
    }

    /// Emit an arbitrary frame to the bridge
    pub fn emit_raw(&self, frame: &str) {
        let endpoint = self.current.as_ref().expect("no engine session attached");
        let _ = endpoint.events.send(frame.to_string());
    }

    /// Drop the engine side of the current session
    pub fn disconnect(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready};

    #[tokio::test]
    async fn test_scripted_attach_hands_endpoint_to_handle() {
        let (host, mut handle) = ScriptedEngineHost::new();
        let (sender, mut inbound) = host.attach().await.unwrap().split();
        assert_eq!(handle.attach_count(), 1);

        sender.send("START_COMBAT", None).unwrap();
        let cmd = handle.recv_command().await;
        assert_eq!(cmd.command, "START_COMBAT");

        handle.emit("READY", json!({ "sceneName": "TrialsArena" }));
        let frame = inbound.recv().await.unwrap();
        assert!(frame.contains("TrialsArena"));
    }

    #[tokio::test]
    async fn test_failing_host_toggles() {
        let (host, handle) = ScriptedEngineHost::new();
        let host = host.failing("not embedded");
        assert!(host.attach().await.is_err());

        handle.allow_attaches();
        assert!(host.attach().await.is_ok());
        assert_eq!(handle.attach_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_delay_holds_attach_pending() {
        let (host, handle) = ScriptedEngineHost::new();
        let host = host.with_attach_delay(Duration::from_millis(500));

        let mut attach = tokio_test::task::spawn(host.attach());
        assert_pending!(attach.poll());
        assert_eq!(handle.attach_count(), 1);

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(attach.is_woken());
        assert!(assert_ready!(attach.poll()).is_ok());
    }

    #[tokio::test]
    async fn test_drain_commands() {
        let (host, mut handle) = ScriptedEngineHost::new();
        let (sender, _inbound) = host.attach().await.unwrap().split();
        handle.next_attach().await;

        sender.send("PAUSE", None).unwrap();
        sender.send("RESUME", None).unwrap();
        let names: Vec<_> = handle
            .drain_commands()
            .into_iter()
            .map(|c| c.command)
            .collect();
        assert_eq!(names, vec!["PAUSE", "RESUME"]);
        assert!(handle.try_recv_command().is_none());
    }
}
