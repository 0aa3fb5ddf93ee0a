use std::sync::Arc;

use tokio::sync::Mutex;

use cl_core::settings::SetupSettings;
use cl_core::setup::{SetupState, SetupStateMachine};

/// Shared setup context containing the state machine and dispatch lock.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `machine`.
/// - `dispatch_lock`: held for a whole dispatch so the step runs atomically.
/// - `machine`: held only briefly to read or commit.
pub struct SetupContext {
    machine: Mutex<SetupStateMachine>,
    dispatch_lock: Mutex<()>,
}

impl SetupContext {
    pub fn new(settings: SetupSettings) -> Self {
        Self {
            machine: Mutex::new(SetupStateMachine::new(settings)),
            dispatch_lock: Mutex::new(()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Current state. Does NOT acquire `dispatch_lock`, so it reflects the
    /// last committed step.
    pub async fn get_state(&self) -> SetupState {
        self.machine.lock().await.state().clone()
    }

    /// Working copy of the machine for one dispatch.
    pub async fn snapshot(&self) -> SetupStateMachine {
        self.machine.lock().await.clone()
    }

    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Replace the committed machine with the result of a dispatch.
    ///
    /// This should only be called after acquiring `dispatch_lock`.
    pub async fn commit(&self, machine: SetupStateMachine) {
        let mut guard = self.machine.lock().await;
        *guard = machine;
    }
}
