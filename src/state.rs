use std::sync::Arc;

use crate::notify::Notifier;
use crate::registry::SubscriberRegistry;
use crate::scheduler::SchedulerHandle;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub registry: Arc<SubscriberRegistry>,
    pub notifier: Notifier,
    pub scheduler: SchedulerHandle,
}
