//! 이벤트 버스 통합 테스트 - 계층 dispatch, 구독 해제, 핸들러 격리
//!
//! `cargo test -p uniapp-core --test event_dispatch`

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uniapp_core::plugin::{PluginDescriptor, PluginInitialized, PLUGIN_EVENT};
use uniapp_foundation::event::{EventHeader, EventKind, EVENT};
use uniapp_foundation::{handler_fn, impl_event, Error, Event, EventBus, EventHandler};

// ============================================================================
// 테스트용 이벤트 계층
// ============================================================================

static BASE: EventKind = EventKind::child("Base", &EVENT);
static DERIVED: EventKind = EventKind::child("Derived", &BASE);
static SIBLING: EventKind = EventKind::child("Sibling", &BASE);
static PINGED: EventKind = EventKind::child("Pinged", &EVENT);

mod timers {
    use super::*;

    pub static TICK: EventKind = EventKind::child("Tick", &EVENT);

    #[derive(Debug, Serialize)]
    pub struct Tick {
        pub header: EventHeader,
    }
    impl_event!(Tick, TICK);
}

mod metronome {
    use super::*;

    pub static TICK: EventKind = EventKind::child("Tick", &EVENT);
}

#[derive(Debug, Serialize)]
struct Derived {
    header: EventHeader,
}
impl_event!(Derived, DERIVED);

#[derive(Debug, Serialize)]
struct Sibling {
    header: EventHeader,
}
impl_event!(Sibling, SIBLING);

#[derive(Debug, Serialize)]
struct Pinged {
    header: EventHeader,
    count: u32,
}
impl_event!(Pinged, PINGED);

fn derived() -> Derived {
    Derived {
        header: EventHeader::new("test"),
    }
}

fn sibling() -> Sibling {
    Sibling {
        header: EventHeader::new("test"),
    }
}

/// 호출된 핸들러 이름을 기록하는 핸들러
fn recorder(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn EventHandler> {
    let log = Arc::clone(log);
    let label = name.to_string();
    handler_fn(name, move |_event| {
        log.lock().push(label.clone());
        Ok(Value::Null)
    })
}

#[test]
fn test_inheritance_dispatch() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.subscribe(&BASE, recorder("base", &log));
    bus.subscribe(&DERIVED, recorder("derived", &log));

    bus.publish(&derived());
    assert_eq!(*log.lock(), vec!["derived", "base"]);

    log.lock().clear();
    bus.publish(&sibling());
    // Sibling은 Base 구독자에게만 전달
    assert_eq!(*log.lock(), vec!["base"]);
}

#[test]
fn test_root_subscriber_sees_everything() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.subscribe(&EVENT, recorder("all", &log));

    bus.publish(&derived());
    bus.publish(&sibling());
    bus.publish(&PluginInitialized::new(&PluginDescriptor::new("calculator", "Calculator")));

    assert_eq!(log.lock().len(), 3);
}

#[test]
fn test_plugin_event_family() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.subscribe(&PLUGIN_EVENT, recorder("plugin", &log));

    bus.publish(&PluginInitialized::new(&PluginDescriptor::new("calculator", "Calculator")));
    bus.publish(&derived());

    assert_eq!(*log.lock(), vec!["plugin"]);
}

#[test]
fn test_unsubscribe_correctness() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let handler = recorder("h", &log);

    bus.subscribe(&DERIVED, Arc::clone(&handler));
    assert!(bus.unsubscribe(&DERIVED, &handler));
    bus.publish(&derived());
    assert!(log.lock().is_empty());
    assert!(!bus.unsubscribe(&DERIVED, &handler));

    bus.subscribe(&BASE, Arc::clone(&handler));
    bus.subscribe(&DERIVED, Arc::clone(&handler));
    bus.subscribe(&SIBLING, Arc::clone(&handler));
    // 같은 핸들러 중복 구독은 무시
    bus.subscribe(&SIBLING, Arc::clone(&handler));

    assert_eq!(bus.unsubscribe_all(&handler), 3);
    bus.publish(&derived());
    bus.publish(&sibling());
    assert!(log.lock().is_empty());
    assert_eq!(bus.unsubscribe_all(&handler), 0);
}

#[test]
fn test_handler_isolation() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.subscribe(
        &PINGED,
        handler_fn("raiser", |_| Err(Error::Internal("pong lost".into()))),
    );
    bus.subscribe(&PINGED, recorder("second", &log));

    let outcomes = bus.publish(&Pinged {
        header: EventHeader::new("test"),
        count: 1,
    });

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_failed());
    assert_eq!(outcomes[0].handler(), "raiser");
    assert!(!outcomes[1].is_failed());
    assert_eq!(*log.lock(), vec!["second"]);
}

#[test]
fn test_panicking_handler_is_isolated() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.subscribe(&PINGED, handler_fn("panicker", |_| panic!("handler bug")));
    bus.subscribe(&PINGED, recorder("survivor", &log));

    let outcomes = bus.publish(&Pinged {
        header: EventHeader::new("test"),
        count: 2,
    });

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_failed());
    assert_eq!(*log.lock(), vec!["survivor"]);
}

#[test]
fn test_handler_reads_payload() {
    let bus = EventBus::new();
    bus.subscribe(
        &PINGED,
        handler_fn("doubler", |event| {
            let ping = event
                .downcast_ref::<Pinged>()
                .ok_or_else(|| Error::Internal("unexpected event".into()))?;
            Ok(json!(ping.count * 2))
        }),
    );

    let outcomes = bus.publish(&Pinged {
        header: EventHeader::new("test"),
        count: 21,
    });
    assert_eq!(outcomes[0].value(), Some(&json!(42)));
}

#[tokio::test]
async fn test_publish_async() {
    let bus = Arc::new(EventBus::new());
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.subscribe(&BASE, recorder("base", &log));

    let event: Arc<dyn Event> = Arc::new(derived());
    let outcomes = bus
        .publish_async(event)
        .expect("runtime available")
        .await
        .expect("dispatch task joined");

    assert_eq!(outcomes.len(), 1);
    assert_eq!(*log.lock(), vec!["base"]);
}

#[test]
fn test_subscription_info() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.subscribe(&DERIVED, recorder("zeta", &log));
    bus.subscribe(&DERIVED, recorder("alpha", &log));
    bus.subscribe(&BASE, recorder("base", &log));

    let info = bus.subscription_info();
    assert_eq!(info["Derived"], vec!["alpha", "zeta"]);
    assert_eq!(info["Base"], vec!["base"]);
    assert!(!info.contains_key("Sibling"));
}

#[test]
fn test_same_named_kinds_stay_separate() {
    let bus = EventBus::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    bus.subscribe(&metronome::TICK, recorder("metronome", &log));
    bus.subscribe(&timers::TICK, recorder("timers", &log));

    let outcomes = bus.publish(&timers::Tick {
        header: EventHeader::new("test"),
    });

    assert_eq!(outcomes.len(), 1);
    assert_eq!(*log.lock(), vec!["timers"]);
    assert_eq!(bus.subscriber_count(&metronome::TICK), 1);
    assert_eq!(bus.subscriber_count(&timers::TICK), 1);
    assert_eq!(bus.subscription_info()["Tick"], vec!["metronome", "timers"]);
}
