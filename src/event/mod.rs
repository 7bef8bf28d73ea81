//! In-process events and the bus that fans them out to subscribers.

pub mod event_bus;

pub use event_bus::EventBus;

use crate::moderation::audit::Record;

/// Fired after a privileged action completed and produced an audit record.
#[derive(Clone, Debug)]
pub struct AuditRecordEvent {
    pub record: Record,
}
