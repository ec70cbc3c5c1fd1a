//! Shutdown flag shared by a batch and its session workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{ContractError, SessionId};

/// Cooperative cancellation, checked between devices and before each commit
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every worker sharing this flag to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once a stop was requested
    pub fn check(&self, session: &SessionId) -> Result<(), ContractError> {
        if self.is_cancelled() {
            return Err(ContractError::Cancelled {
                session: session.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let worker = flag.clone();
        assert!(worker.check(&"S01".into()).is_ok());

        flag.cancel();
        assert!(worker.is_cancelled());
        let err = worker.check(&"S01".into()).unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }
}
