//! service::events
//!
//! Change notifications for subscribers.
//!
//! Every subscriber gets its own unbounded channel. Subscribers that drop
//! their receiver are pruned on the next emit. Events carry paths, branch
//! names and operation outcomes only, never credential material.

use std::path::PathBuf;
use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

use super::error::Operation;

/// Outcome of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub operation: Operation,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// A repository was opened, created, cloned or closed (`path: None`).
    RepositoryChanged { path: Option<PathBuf> },
    CurrentBranchChanged { branch: Option<String> },
    StatusChanged { has_changes: bool },
    CommitsChanged,
    OperationCompleted(OperationReport),
    AnalyticsReady,
    /// Cached state from an earlier handle generation is gone.
    Invalidated { generation: u64 },
}

#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<Sender<ServiceEvent>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> Receiver<ServiceEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: ServiceEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn report(&self, operation: Operation, success: bool, message: impl Into<String>) {
        self.emit(ServiceEvent::OperationCompleted(OperationReport {
            operation,
            success,
            message: message.into(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives() {
        let bus = EventBus::default();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.emit(ServiceEvent::CommitsChanged);

        assert_eq!(a.try_recv().unwrap(), ServiceEvent::CommitsChanged);
        assert_eq!(b.try_recv().unwrap(), ServiceEvent::CommitsChanged);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::default();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.report(Operation::Status, true, "ok");

        assert_eq!(bus.subscribers.lock().unwrap().len(), 1);
        assert!(matches!(
            kept.try_recv().unwrap(),
            ServiceEvent::OperationCompleted(OperationReport { success: true, .. })
        ));
    }

    #[test]
    fn serializes_with_event_tag() {
        let json = serde_json::to_value(ServiceEvent::StatusChanged { has_changes: true }).unwrap();
        assert_eq!(json["event"], "status_changed");
        assert_eq!(json["has_changes"], true);
    }
}
