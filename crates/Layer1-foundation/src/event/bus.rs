//! Event Bus - 타입 기반 발행/구독 라우터
//!
//! 동기 dispatch(`publish`)와 백그라운드 dispatch(`publish_async`)를 제공합니다.
//! 핸들러 실패(에러/panic)는 핸들러 단위로 격리되어 결과 마커로 기록됩니다.

use super::types::{Event, EventKind};
use crate::error::{panic_message, Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

// ============================================================================
// EventHandler Trait
// ============================================================================

/// 이벤트 핸들러 trait
///
/// 같은 `Arc` 인스턴스는 같은 핸들러로 취급됩니다 (구독 중복 판정 기준).
pub trait EventHandler: Send + Sync {
    /// 핸들러 이름 (진단/로그용)
    fn name(&self) -> &str;

    /// 이벤트 처리
    fn handle(&self, event: &dyn Event) -> Result<Value>;
}

/// 클로저 기반 핸들러
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&dyn Event) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, event: &dyn Event) -> Result<Value> {
        (self.func)(event)
    }
}

/// 클로저로 핸들러 생성
pub fn handler_fn<F>(name: impl Into<String>, func: F) -> Arc<dyn EventHandler>
where
    F: Fn(&dyn Event) -> Result<Value> + Send + Sync + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        func,
    })
}

fn same_handler(a: &Arc<dyn EventHandler>, b: &Arc<dyn EventHandler>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

// ============================================================================
// HandlerOutcome
// ============================================================================

/// 핸들러 하나의 dispatch 결과
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// 정상 완료 (핸들러 반환값)
    Completed { handler: String, value: Value },

    /// 실패 (에러 또는 panic)
    Failed { handler: String, error: String },
}

impl HandlerOutcome {
    /// 실패 마커인지 확인
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// 핸들러 이름
    pub fn handler(&self) -> &str {
        match self {
            Self::Completed { handler, .. } | Self::Failed { handler, .. } => handler,
        }
    }

    /// 반환값 (실패 시 None)
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Completed { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    /// `Result`로 변환 (실패는 `Error::Handler`)
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Completed { value, .. } => Ok(value),
            Self::Failed { handler, error } => Err(Error::handler(handler, error)),
        }
    }
}

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스 설정
#[derive(Debug, Clone, Default)]
pub struct EventBusConfig {
    /// 모든 전달을 trace 레벨로 로깅
    pub log_dispatch: bool,
}

/// 이벤트 버스
///
/// ## 사용법
///
/// ```ignore
/// use uniapp_foundation::event::{handler_fn, EventBus, SYSTEM_EVENT};
///
/// let bus = Arc::new(EventBus::new());
/// let handler = handler_fn("audit", |event| {
///     println!("{}", event.kind());
///     Ok(Value::Null)
/// });
///
/// bus.subscribe(&SYSTEM_EVENT, handler.clone());
/// let results = bus.publish(&ApplicationStarted::new("app", "1.0.0"));
/// bus.unsubscribe(&SYSTEM_EVENT, &handler);
/// ```
pub struct EventBus {
    /// 설정
    config: EventBusConfig,

    /// kind(주소 기준) → 핸들러 (등록 순서 유지)
    subscriptions: RwLock<HashMap<&'static EventKind, Vec<Arc<dyn EventHandler>>>>,

    /// 발행된 이벤트 수
    event_count: AtomicU64,
}

impl EventBus {
    /// 기본 설정으로 이벤트 버스 생성
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// 커스텀 설정으로 이벤트 버스 생성
    pub fn with_config(config: EventBusConfig) -> Self {
        debug!("Event bus initialized");
        Self {
            config,
            subscriptions: RwLock::new(HashMap::new()),
            event_count: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // 구독
    // ========================================================================

    /// 핸들러 구독 (같은 kind에 같은 핸들러 재구독은 no-op)
    pub fn subscribe(&self, kind: &'static EventKind, handler: Arc<dyn EventHandler>) {
        let mut subscriptions = self.subscriptions.write();
        let handlers = subscriptions.entry(kind).or_default();

        if handlers.iter().any(|h| same_handler(h, &handler)) {
            trace!(handler = handler.name(), kind = %kind, "Handler already subscribed");
            return;
        }

        debug!(handler = handler.name(), kind = %kind, "Subscribed handler");
        handlers.push(handler);
    }

    /// 구독 해제 (제거되었으면 true)
    pub fn unsubscribe(&self, kind: &'static EventKind, handler: &Arc<dyn EventHandler>) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let Some(handlers) = subscriptions.get_mut(kind) else {
            return false;
        };

        let before = handlers.len();
        handlers.retain(|h| !same_handler(h, handler));
        let removed = handlers.len() != before;

        if handlers.is_empty() {
            subscriptions.remove(kind);
        }

        if removed {
            debug!(handler = handler.name(), kind = %kind, "Unsubscribed handler");
        }

        removed
    }

    /// 모든 kind에서 핸들러 구독 해제 (제거된 등록 수 반환)
    pub fn unsubscribe_all(&self, handler: &Arc<dyn EventHandler>) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let mut count = 0;

        for handlers in subscriptions.values_mut() {
            let before = handlers.len();
            handlers.retain(|h| !same_handler(h, handler));
            count += before - handlers.len();
        }
        subscriptions.retain(|_, handlers| !handlers.is_empty());

        debug!(handler = handler.name(), count, "Unsubscribed handler from all kinds");
        count
    }

    // ========================================================================
    // 발행
    // ========================================================================

    /// 이벤트 동기 발행
    ///
    /// 호출자 스레드에서 정확한 kind의 핸들러, 그 다음 조상 kind의 핸들러
    /// (가까운 순) 를 실행합니다. 핸들러 실패는 `HandlerOutcome::Failed`로
    /// 기록되고 나머지 핸들러 실행은 계속됩니다.
    pub fn publish(&self, event: &dyn Event) -> Vec<HandlerOutcome> {
        let kind = event.kind();
        let event_count = self.event_count.fetch_add(1, Ordering::SeqCst);

        // 락을 잡은 채로 핸들러를 호출하지 않는다 (핸들러가 버스를 재진입할 수 있음)
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let subscriptions = self.subscriptions.read();
            kind.lineage()
                .filter_map(|k| subscriptions.get(k))
                .flatten()
                .cloned()
                .collect()
        };

        let mut results = Vec::with_capacity(handlers.len());

        for handler in &handlers {
            if self.config.log_dispatch {
                trace!(
                    event_id = %event.header().event_id,
                    kind = %kind,
                    handler = handler.name(),
                    "Delivering event #{}", event_count + 1
                );
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)));
            let result = match outcome {
                Ok(Ok(value)) => HandlerOutcome::Completed {
                    handler: handler.name().to_string(),
                    value,
                },
                Ok(Err(e)) => self.record_failure(event, handler.as_ref(), e.to_string()),
                Err(payload) => self.record_failure(
                    event,
                    handler.as_ref(),
                    format!("handler panicked: {}", panic_message(&*payload)),
                ),
            };
            results.push(result);
        }

        debug!("Published {} to {} handlers", kind, handlers.len());
        results
    }

    fn record_failure(
        &self,
        event: &dyn Event,
        handler: &dyn EventHandler,
        message: String,
    ) -> HandlerOutcome {
        let header = event.header();
        error!(
            handler = handler.name(),
            kind = %event.kind(),
            event_id = %header.event_id,
            source = %header.source,
            "Error in event handler: {}", message
        );
        HandlerOutcome::Failed {
            handler: handler.name().to_string(),
            error: message,
        }
    }

    /// 이벤트 백그라운드 발행
    ///
    /// 같은 동기 dispatch를 tokio blocking pool에서 실행합니다.
    /// 핸들러끼리는 병렬화되지 않고 발행자와만 분리됩니다.
    pub fn publish_async(
        self: &Arc<Self>,
        event: Arc<dyn Event>,
    ) -> Result<JoinHandle<Vec<HandlerOutcome>>> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoAsyncRuntime)?;
        let bus = Arc::clone(self);

        Ok(runtime.spawn_blocking(move || bus.publish(event.as_ref())))
    }

    // ========================================================================
    // 진단
    // ========================================================================

    /// kind 이름 → 구독 핸들러 이름 목록 (비어있는 kind 제외, 정렬됨)
    ///
    /// 이름이 같은 서로 다른 kind는 한 항목으로 합쳐서 보여줍니다.
    pub fn subscription_info(&self) -> BTreeMap<String, Vec<String>> {
        let subscriptions = self.subscriptions.read();
        let mut info: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (kind, handlers) in subscriptions.iter() {
            if handlers.is_empty() {
                continue;
            }
            info.entry(kind.name().to_string())
                .or_default()
                .extend(handlers.iter().map(|h| h.name().to_string()));
        }
        for names in info.values_mut() {
            names.sort();
            names.dedup();
        }
        info
    }

    /// 특정 kind의 구독 수
    pub fn subscriber_count(&self, kind: &EventKind) -> usize {
        self.subscriptions
            .read()
            .get(kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// 총 발행된 이벤트 수
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::types::{EventHeader, EVENT};
    use crate::impl_event;
    use std::sync::atomic::AtomicUsize;

    static BASE: EventKind = EventKind::child("BusTestBase", &EVENT);
    static DERIVED: EventKind = EventKind::child("BusTestDerived", &BASE);
    static SIBLING: EventKind = EventKind::child("BusTestSibling", &BASE);

    #[derive(Debug)]
    struct Derived {
        header: EventHeader,
    }
    impl_event!(Derived, DERIVED);

    #[derive(Debug)]
    struct Sibling {
        header: EventHeader,
    }
    impl_event!(Sibling, SIBLING);

    fn counting(name: &str) -> (Arc<dyn EventHandler>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handler = handler_fn(name, move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        });
        (handler, count)
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let bus = EventBus::new();
        let (handler, count) = counting("h");

        bus.subscribe(&DERIVED, handler.clone());
        bus.subscribe(&DERIVED, handler.clone());
        assert_eq!(bus.subscriber_count(&DERIVED), 1);

        bus.publish(&Derived { header: EventHeader::new("test") });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sibling_not_delivered() {
        let bus = EventBus::new();
        let (handler, count) = counting("derived_only");
        bus.subscribe(&DERIVED, handler);

        let results = bus.publish(&Sibling { header: EventHeader::new("test") });
        assert!(results.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registration_order_within_kind() {
        let bus = EventBus::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(
                &DERIVED,
                handler_fn(name, move |_| {
                    order.lock().push(name);
                    Ok(Value::Null)
                }),
            );
        }

        bus.publish(&Derived { header: EventHeader::new("test") });
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_handler_panic_is_isolated() {
        let bus = EventBus::new();
        let (after, count) = counting("after");
        bus.subscribe(&DERIVED, handler_fn("panicky", |_| panic!("boom")));
        bus.subscribe(&DERIVED, after);

        let results = bus.publish(&Derived { header: EventHeader::new("test") });

        assert_eq!(results.len(), 2);
        assert!(results[0].is_failed());
        assert!(matches!(&results[0], HandlerOutcome::Failed { error, .. } if error.contains("boom")));
        assert!(!results[1].is_failed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_outcome_into_result() {
        let bus = EventBus::new();
        bus.subscribe(
            &DERIVED,
            handler_fn("strict", |_| Err(Error::Config("missing key".into()))),
        );
        bus.subscribe(&DERIVED, handler_fn("ok", |_| Ok(serde_json::json!("done"))));

        let mut results = bus
            .publish(&Derived { header: EventHeader::new("test") })
            .into_iter();

        let err = results.next().unwrap().into_result().unwrap_err();
        assert!(matches!(&err, Error::Handler { handler, .. } if handler == "strict"));
        assert!(err.is_lifecycle());
        assert!(err.to_string().contains("missing key"));

        assert_eq!(results.next().unwrap().into_result().unwrap(), serde_json::json!("done"));
    }

    #[test]
    fn test_handler_return_values() {
        let bus = EventBus::new();
        bus.subscribe(&DERIVED, handler_fn("answer", |_| Ok(serde_json::json!(42))));

        let results = bus.publish(&Derived { header: EventHeader::new("test") });
        assert_eq!(results[0].value(), Some(&serde_json::json!(42)));
        assert_eq!(results[0].handler(), "answer");
        assert_eq!(bus.event_count(), 1);
    }

    #[test]
    fn test_unsubscribe_missing_returns_false() {
        let bus = EventBus::new();
        let (handler, _) = counting("h");
        assert!(!bus.unsubscribe(&DERIVED, &handler));
        assert_eq!(bus.unsubscribe_all(&handler), 0);
    }

    #[test]
    fn test_subscription_info() {
        let bus = EventBus::new();
        let (b, _) = counting("zeta");
        let (a, _) = counting("alpha");
        bus.subscribe(&BASE, b);
        bus.subscribe(&BASE, a.clone());

        let info = bus.subscription_info();
        assert_eq!(info["BusTestBase"], vec!["alpha".to_string(), "zeta".to_string()]);

        bus.unsubscribe(&BASE, &a);
        let info = bus.subscription_info();
        assert_eq!(info["BusTestBase"], vec!["zeta".to_string()]);
        assert!(!info.contains_key("BusTestDerived"));
    }

    #[tokio::test]
    async fn test_publish_async() {
        let bus = Arc::new(EventBus::new());
        let (handler, count) = counting("async");
        bus.subscribe(&BASE, handler);

        let event: Arc<dyn Event> = Arc::new(Derived { header: EventHeader::new("test") });
        let results = bus.publish_async(event).unwrap().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_async_without_runtime() {
        let bus = Arc::new(EventBus::new());
        let event: Arc<dyn Event> = Arc::new(Derived { header: EventHeader::new("test") });
        assert!(matches!(bus.publish_async(event), Err(Error::NoAsyncRuntime)));
    }
}
