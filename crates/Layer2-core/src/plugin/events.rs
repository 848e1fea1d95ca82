//! Plugin Events - 플러그인 라이프사이클 이벤트
//!
//! ```text
//! Event
//!  └─ PluginEvent
//!      ├─ PluginInitialized
//!      ├─ PluginShutdown
//!      └─ PluginError
//! ```

use super::descriptor::PluginDescriptor;
use serde::Serialize;
use uniapp_foundation::event::{EventHeader, EventKind, EVENT};
use uniapp_foundation::impl_event;

pub static PLUGIN_EVENT: EventKind = EventKind::child("PluginEvent", &EVENT);

pub static PLUGIN_INITIALIZED: EventKind = EventKind::child("PluginInitialized", &PLUGIN_EVENT);

pub static PLUGIN_SHUTDOWN: EventKind = EventKind::child("PluginShutdown", &PLUGIN_EVENT);

pub static PLUGIN_ERROR: EventKind = EventKind::child("PluginError", &PLUGIN_EVENT);

/// 이벤트 소스 이름 (`plugin.<id>`)
pub fn plugin_source(plugin_id: &str) -> String {
    format!("plugin.{}", plugin_id)
}

/// 플러그인 초기화 완료
#[derive(Debug, Clone, Serialize)]
pub struct PluginInitialized {
    pub header: EventHeader,
    pub plugin_id: String,
    pub plugin_name: String,
    pub plugin_version: String,
    pub descriptor: PluginDescriptor,
}

impl PluginInitialized {
    pub fn new(descriptor: &PluginDescriptor) -> Self {
        Self {
            header: EventHeader::new(plugin_source(&descriptor.id)),
            plugin_id: descriptor.id.clone(),
            plugin_name: descriptor.name.clone(),
            plugin_version: descriptor.version.clone(),
            descriptor: descriptor.clone(),
        }
    }
}

impl_event!(PluginInitialized, PLUGIN_INITIALIZED);

/// 플러그인 종료 완료
#[derive(Debug, Clone, Serialize)]
pub struct PluginShutdown {
    pub header: EventHeader,
    pub plugin_id: String,
    pub plugin_name: String,
}

impl PluginShutdown {
    pub fn new(descriptor: &PluginDescriptor) -> Self {
        Self {
            header: EventHeader::new(plugin_source(&descriptor.id)),
            plugin_id: descriptor.id.clone(),
            plugin_name: descriptor.name.clone(),
        }
    }
}

impl_event!(PluginShutdown, PLUGIN_SHUTDOWN);

/// 플러그인 초기화/종료 실패
#[derive(Debug, Clone, Serialize)]
pub struct PluginError {
    pub header: EventHeader,
    pub plugin_id: String,
    pub error_message: String,
}

impl PluginError {
    pub fn new(plugin_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        let plugin_id = plugin_id.into();
        Self {
            header: EventHeader::new(plugin_source(&plugin_id)),
            plugin_id,
            error_message: error_message.into(),
        }
    }
}

impl_event!(PluginError, PLUGIN_ERROR);

#[cfg(test)]
mod tests {
    use super::*;
    use uniapp_foundation::event::{Event, TypedEvent};

    #[test]
    fn test_hierarchy() {
        let names: Vec<_> = PLUGIN_ERROR.lineage().map(|k| k.name()).collect();
        assert_eq!(names, vec!["PluginError", "PluginEvent", "Event"]);
        assert!(PluginInitialized::event_kind().is_a(&PLUGIN_EVENT));
    }

    #[test]
    fn test_source() {
        let descriptor = PluginDescriptor::new("calculator", "Calculator").with_version("1.0.0");
        let event = PluginInitialized::new(&descriptor);

        assert_eq!(event.header().source, "plugin.calculator");
        assert_eq!(event.plugin_version, "1.0.0");

        let dyn_event: &dyn Event = &event;
        assert!(dyn_event.downcast_ref::<PluginInitialized>().is_some());
        assert!(dyn_event.downcast_ref::<PluginError>().is_none());
    }
}
