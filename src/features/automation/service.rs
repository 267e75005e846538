//! Automation control facade.
//!
//! Forwards start/stop/status/settings calls to the engine bridge and fans
//! engine events out to subscribers. Share one instance per engine
//! connection by wrapping it in an `Arc`.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;

use super::bridge::EngineBridge;
use super::events::{EngineEvent, EventName, RawEvent};
use super::status::ServiceStatus;
use crate::error::EngojeeError;
use crate::features::rules::Rule;

/// Callback invoked for each delivered event.
pub type EventHandler = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Identifies one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    event: EventName,
}

impl SubscriptionHandle {
    /// The event this handler listens to.
    #[must_use]
    pub const fn event(&self) -> EventName {
        self.event
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<EventName, Vec<(u64, EventHandler)>>,
}

/// Facade over one engine connection.
pub struct AutomationService<B> {
    bridge: B,
    registry: Mutex<Registry>,
}

impl<B: EngineBridge> AutomationService<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// The underlying bridge.
    pub const fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Send `rules` to the engine and ask it to start.
    ///
    /// An empty slice is forwarded as-is; refusing to start without rules
    /// is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStart` with the engine's message on failure.
    pub async fn start(&self, rules: &[Rule]) -> Result<(), EngojeeError> {
        let rules_json = serde_json::to_string(rules)
            .map_err(|e| EngojeeError::ServiceStart(format!("could not serialize rules: {e}")))?;

        tracing::debug!(rules = rules.len(), "requesting engine start");
        self.bridge
            .start_service(&rules_json)
            .await
            .map_err(|e| EngojeeError::ServiceStart(e.message))
    }

    /// Ask the engine to stop.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStop` with the engine's message on failure.
    pub async fn stop(&self) -> Result<(), EngojeeError> {
        tracing::debug!("requesting engine stop");
        self.bridge
            .stop_service()
            .await
            .map_err(|e| EngojeeError::ServiceStop(e.message))
    }

    /// Poll the engine's current state.
    ///
    /// # Errors
    ///
    /// Returns `BridgeCall` if the call fails. An unknown state reads as
    /// [`ServiceStatus::Stopped`].
    pub async fn get_status(&self) -> Result<ServiceStatus, EngojeeError> {
        let raw = self
            .bridge
            .get_status()
            .await
            .map_err(|e| EngojeeError::BridgeCall(e.message))?;
        Ok(ServiceStatus::from_engine(raw.trim()))
    }

    /// Ask the platform to show the settings screen where the engine's
    /// accessibility permission is granted.
    ///
    /// # Errors
    ///
    /// Returns `SettingsUnavailable` with the platform's message on failure.
    pub async fn open_platform_settings(&self) -> Result<(), EngojeeError> {
        self.bridge
            .open_accessibility_settings()
            .await
            .map_err(|e| EngojeeError::SettingsUnavailable(e.message))
    }

    /// Register `handler` for `event`. Several handlers may share a name.
    pub fn subscribe<F>(&self, event: EventName, handler: F) -> SubscriptionHandle
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .handlers
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));

        tracing::debug!(%event, id, "subscribed");
        SubscriptionHandle { id, event }
    }

    /// Remove one handler. Returns whether it was still registered.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut registry = self.registry();
        let Some(handlers) = registry.handlers.get_mut(&handle.event) else {
            return false;
        };

        let before = handlers.len();
        handlers.retain(|(id, _)| *id != handle.id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            registry.handlers.remove(&handle.event);
        }
        removed
    }

    /// Remove every handler. Safe to call when none are registered.
    pub fn unsubscribe_all(&self) {
        self.registry().handlers.clear();
    }

    /// Number of handlers registered for `event`.
    pub fn subscriber_count(&self, event: EventName) -> usize {
        self.registry().handlers.get(&event).map_or(0, Vec::len)
    }

    /// Deliver `event` to its handlers and return how many ran to completion.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe. A panicking handler is logged and skipped.
    pub fn dispatch(&self, event: &EngineEvent) -> usize {
        let handlers: Vec<EventHandler> = self
            .registry()
            .handlers
            .get(&event.name())
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        let mut delivered = 0;
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_ok() {
                delivered += 1;
            } else {
                tracing::error!(event = %event.name(), "event handler panicked");
            }
        }
        delivered
    }

    /// Decode and deliver one bridge emission.
    ///
    /// Unknown names are dropped. A known name with a malformed payload is
    /// delivered as an `error` event instead.
    pub fn dispatch_raw(&self, name: &str, payload: &Value) -> usize {
        let Ok(event_name) = name.parse::<EventName>() else {
            tracing::debug!(name, "ignoring unknown engine event");
            return 0;
        };

        match EngineEvent::from_payload(event_name, payload) {
            Ok(event) => self.dispatch(&event),
            Err(message) => {
                tracing::warn!(%message, "malformed engine event");
                self.dispatch(&EngineEvent::Error { message })
            }
        }
    }

    /// Drain a bridge event channel until its sender closes.
    ///
    /// Returns the number of emissions received.
    pub async fn pump(&self, mut events: mpsc::Receiver<RawEvent>) -> usize {
        let mut received = 0;
        while let Some(raw) = events.recv().await {
            received += 1;
            self.dispatch_raw(&raw.name, &raw.payload);
        }
        tracing::debug!(received, "engine event stream closed");
        received
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::features::automation::bridge::{BridgeError, MockEngineBridge};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&EngineEvent) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &EngineEvent| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn rule(id: &str) -> Rule {
        Rule {
            id: id.to_string(),
            name: "Crypto".to_string(),
            keywords: "btc,eth".to_string(),
            replies: "gm\nwagmi".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_start_forwards_serialized_rules() {
        let rules = vec![rule("1")];
        let expected = serde_json::to_string(&rules).unwrap();

        let mut bridge = MockEngineBridge::new();
        bridge
            .expect_start_service()
            .withf(move |json: &str| json == expected)
            .times(1)
            .returning(|_| Ok(()));

        AutomationService::new(bridge).start(&rules).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_forwards_empty_rule_set() {
        let mut bridge = MockEngineBridge::new();
        bridge
            .expect_start_service()
            .withf(|json: &str| json == "[]")
            .times(1)
            .returning(|_| Ok(()));

        AutomationService::new(bridge).start(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_failure_keeps_engine_message() {
        let mut bridge = MockEngineBridge::new();
        bridge
            .expect_start_service()
            .returning(|_| Err(BridgeError::new("Accessibility service not enabled")));

        let err = AutomationService::new(bridge)
            .start(&[rule("1")])
            .await
            .unwrap_err();
        assert!(
            matches!(err, EngojeeError::ServiceStart(ref m) if m == "Accessibility service not enabled")
        );
    }

    #[tokio::test]
    async fn test_stop_and_settings_errors() {
        let mut bridge = MockEngineBridge::new();
        bridge
            .expect_stop_service()
            .returning(|| Err(BridgeError::new("not running")));
        bridge
            .expect_open_accessibility_settings()
            .returning(|| Err(BridgeError::new("no activity")));

        let service = AutomationService::new(bridge);
        assert!(matches!(
            service.stop().await,
            Err(EngojeeError::ServiceStop(_))
        ));
        assert!(matches!(
            service.open_platform_settings().await,
            Err(EngojeeError::SettingsUnavailable(ref m)) if m == "no activity"
        ));
    }

    #[tokio::test]
    async fn test_get_status() {
        let mut bridge = MockEngineBridge::new();
        let mut replies = vec!["bogus".to_string(), "connected".to_string()];
        bridge
            .expect_get_status()
            .times(2)
            .returning(move || Ok(replies.pop().unwrap_or_default()));

        let service = AutomationService::new(bridge);
        assert_eq!(service.get_status().await.unwrap(), ServiceStatus::Connected);
        assert_eq!(service.get_status().await.unwrap(), ServiceStatus::Stopped);
    }

    #[tokio::test]
    async fn test_get_status_bridge_failure() {
        let mut bridge = MockEngineBridge::new();
        bridge
            .expect_get_status()
            .returning(|| Err(BridgeError::new("module missing")));

        let err = AutomationService::new(bridge).get_status().await.unwrap_err();
        assert!(matches!(err, EngojeeError::BridgeCall(ref m) if m == "module missing"));
    }

    #[test]
    fn test_error_event_reaches_one_handler_and_keeps_subscriptions() {
        let service = AutomationService::new(MockEngineBridge::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        service.subscribe(EventName::Error, move |event| {
            if let EngineEvent::Error { message } = event {
                sink.lock().unwrap().push(message.clone());
            }
        });
        let (liked, on_liked) = counter();
        service.subscribe(EventName::PostLiked, on_liked);

        let delivered =
            service.dispatch_raw("error", &json!({"message": "permission denied"}));

        assert_eq!(delivered, 1);
        assert_eq!(*received.lock().unwrap(), vec!["permission denied".to_string()]);
        assert_eq!(liked.load(Ordering::SeqCst), 0);
        assert_eq!(service.subscriber_count(EventName::Error), 1);
        assert_eq!(service.subscriber_count(EventName::PostLiked), 1);
    }

    #[test]
    fn test_multiple_handlers_and_unsubscribe() {
        let service = AutomationService::new(MockEngineBridge::new());
        let (first, on_first) = counter();
        let (second, on_second) = counter();

        let handle = service.subscribe(EventName::PostLiked, on_first);
        service.subscribe(EventName::PostLiked, on_second);

        assert_eq!(service.dispatch(&EngineEvent::PostLiked), 2);

        assert!(service.unsubscribe(handle));
        assert!(!service.unsubscribe(handle));
        assert_eq!(service.dispatch(&EngineEvent::PostLiked), 1);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_all_is_safe_when_empty() {
        let service = AutomationService::new(MockEngineBridge::new());
        service.unsubscribe_all();

        let (count, handler) = counter();
        service.subscribe(EventName::AutomationStarted, handler);
        service.unsubscribe_all();
        service.unsubscribe_all();

        assert_eq!(service.dispatch(&EngineEvent::AutomationStarted), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_and_malformed_events() {
        let service = AutomationService::new(MockEngineBridge::new());
        let (errors, on_error) = counter();
        service.subscribe(EventName::Error, on_error);

        assert_eq!(service.dispatch_raw("postShared", &Value::Null), 0);
        assert_eq!(service.dispatch_raw("commentPosted", &json!({})), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_handler_does_not_break_delivery() {
        let service = AutomationService::new(MockEngineBridge::new());
        service.subscribe(EventName::PostLiked, |_| panic!("handler bug"));
        let (count, handler) = counter();
        service.subscribe(EventName::PostLiked, handler);

        assert_eq!(service.dispatch(&EngineEvent::PostLiked), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(service.subscriber_count(EventName::PostLiked), 2);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let service = Arc::new(AutomationService::new(MockEngineBridge::new()));
        let slot: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&service);
        let inner_slot = Arc::clone(&slot);
        let handle = service.subscribe(EventName::AutomationStopped, move |_| {
            if let (Some(service), Some(handle)) = (weak.upgrade(), *inner_slot.lock().unwrap()) {
                service.unsubscribe(handle);
            }
        });
        *slot.lock().unwrap() = Some(handle);

        assert_eq!(service.dispatch(&EngineEvent::AutomationStopped), 1);
        assert_eq!(service.subscriber_count(EventName::AutomationStopped), 0);
    }

    #[tokio::test]
    async fn test_pump_delivers_until_closed() {
        let service = AutomationService::new(MockEngineBridge::new());
        let (posted, on_posted) = counter();
        service.subscribe(EventName::CommentPosted, on_posted);

        let (tx, rx) = mpsc::channel(4);
        let producer = tokio::spawn(async move {
            tx.send(RawEvent::new("commentPosted", json!({"reply": "gm"})))
                .await
                .unwrap();
            tx.send(RawEvent::new("unknown", Value::Null)).await.unwrap();
            tx.send(RawEvent::new("commentPosted", json!({"reply": "wagmi"})))
                .await
                .unwrap();
        });

        assert_eq!(service.pump(rx).await, 3);
        producer.await.unwrap();
        assert_eq!(posted.load(Ordering::SeqCst), 2);
    }
}
