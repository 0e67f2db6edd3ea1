/// Cooperative cancellation for long sampling loops
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared stop flag with an optional deadline.
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Token that only stops when `cancel` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also stops once `budget` has elapsed from now.
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + budget),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn elapsed_deadline_cancels() {
        assert!(CancelToken::with_deadline(Duration::ZERO).is_cancelled());
        assert!(!CancelToken::with_deadline(Duration::from_secs(3600)).is_cancelled());
    }
}
