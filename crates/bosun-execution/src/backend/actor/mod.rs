mod core;
mod handler;

use std::sync::Arc;

use bosun_common::config::ConfigKeyValue;
use tokio::sync::mpsc;

use crate::backend::registry::ExecutorRegistry;
use crate::scheduler::TaskScheduler;
use crate::task::TaskDescription;

pub struct CoordinatorActor {
    scheduler: Arc<dyn TaskScheduler>,
    registry: ExecutorRegistry,
    /// Configuration snapshot forwarded to each executor on registration.
    properties: Vec<ConfigKeyValue>,
    /// The receiving half of the launch queue, handed to the launch pump
    /// when the coordinator starts.
    launch_queue: Option<mpsc::UnboundedReceiver<TaskDescription>>,
}

pub struct CoordinatorOptions {
    pub scheduler: Arc<dyn TaskScheduler>,
    pub registry: ExecutorRegistry,
    pub properties: Vec<ConfigKeyValue>,
    pub launch_queue: mpsc::UnboundedReceiver<TaskDescription>,
}
