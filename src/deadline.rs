use std::time::Duration;
use tokio::time::Instant;

/// A single wall-clock budget shared by every invocation of a run.
///
/// It is armed once, before the first child is spawned, and never reset. Each invocation only
/// gets whatever is left of the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    budget: Option<Duration>,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Arms a deadline expiring `budget` from now.
    ///
    /// A budget reaching past what the clock can represent never expires.
    pub fn arm(budget: Duration) -> Self {
        Self {
            budget: Some(budget),
            expires_at: Instant::now().checked_add(budget),
        }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Self {
            budget: None,
            expires_at: None,
        }
    }

    /// `None` arms nothing, mirroring a disabled alarm.
    pub fn from_budget(budget: Option<Duration>) -> Self {
        match budget {
            Some(budget) => Self::arm(budget),
            None => Self::unbounded(),
        }
    }

    /// The budget this deadline was armed with.
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Time left before expiry. `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Resolves once the deadline expires. Pending forever when unbounded.
    pub async fn expired(&self) {
        match self.expires_at {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    }
}
