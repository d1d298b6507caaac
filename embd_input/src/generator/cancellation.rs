use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Checked by a generation between steps. Never interrupts an evaluation
/// that is already running.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token and the handle that cancels it.
    pub fn new() -> (Self, CancellationHandle) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let token = CancellationToken {
            cancelled: cancelled.clone(),
        };
        let handle = CancellationHandle {
            cancelled,
        };
        (token, handle)
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_cancels_token() {
        let (token, handle) = CancellationToken::new();
        let copy = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(copy.is_cancelled());
    }

    #[test]
    fn test_default_is_not_cancelled() {
        assert!(!CancellationToken::default().is_cancelled());
    }
}
