//! Ordered, exactly-once teardown registry
//!
//! Every resource the placement service or template cache acquires during a
//! world's lifetime registers exactly one action here. At teardown the
//! actions run in reverse registration order, so dependents unwind before
//! their dependencies. Draining twice yields nothing: teardown is
//! idempotent.

use super::service::{InstanceId, TimerId};

/// One teardown step, executed against the placement service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupAction {
    /// Cancel a scheduled timer before it can fire against a disposed
    /// instance
    CancelTimer(TimerId),
    /// Release one template reference held by an instance
    ReleaseTemplate { asset_id: String, instance: InstanceId },
    /// Dispose the instance's node and body
    DisposeInstance(InstanceId),
}

impl CleanupAction {
    fn instance(&self) -> Option<InstanceId> {
        match self {
            CleanupAction::CancelTimer(_) => None,
            CleanupAction::ReleaseTemplate { instance, .. } => Some(*instance),
            CleanupAction::DisposeInstance(id) => Some(*id),
        }
    }
}

/// Ordered list of teardown actions
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    actions: Vec<CleanupAction>,
    disposed: bool,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: CleanupAction) {
        if self.disposed {
            log::warn!("cleanup registration after teardown ignored: {action:?}");
            return;
        }
        self.actions.push(action);
    }

    /// Take every action, newest first. A second drain returns nothing.
    pub fn drain(&mut self) -> Vec<CleanupAction> {
        self.disposed = true;
        let mut actions = std::mem::take(&mut self.actions);
        actions.reverse();
        actions
    }

    /// Drop the actions belonging to an instance that was already retired
    /// through its own timer or a manual dispose
    pub fn forget_instance(&mut self, instance: InstanceId) {
        self.actions.retain(|a| a.instance() != Some(instance));
    }

    /// Drop a single timer action after the timer fired
    pub fn forget_timer(&mut self, timer: TimerId) {
        self.actions.retain(|a| *a != CleanupAction::CancelTimer(timer));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_reverses_and_empties() {
        let mut registry = CleanupRegistry::new();
        registry.register(CleanupAction::DisposeInstance(InstanceId(1)));
        registry.register(CleanupAction::CancelTimer(TimerId(2)));
        let actions = registry.drain();
        assert_eq!(
            actions,
            vec![
                CleanupAction::CancelTimer(TimerId(2)),
                CleanupAction::DisposeInstance(InstanceId(1)),
            ]
        );
        // Idempotent
        assert!(registry.drain().is_empty());
        assert!(registry.is_disposed());
    }

    #[test]
    fn test_forget_instance_removes_its_actions() {
        let mut registry = CleanupRegistry::new();
        registry.register(CleanupAction::DisposeInstance(InstanceId(1)));
        registry.register(CleanupAction::ReleaseTemplate {
            asset_id: "drone".to_string(),
            instance: InstanceId(1),
        });
        registry.register(CleanupAction::DisposeInstance(InstanceId(2)));
        registry.forget_instance(InstanceId(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_after_teardown_is_ignored() {
        let mut registry = CleanupRegistry::new();
        registry.drain();
        registry.register(CleanupAction::DisposeInstance(InstanceId(1)));
        assert!(registry.is_empty());
    }
}
