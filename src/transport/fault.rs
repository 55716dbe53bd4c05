//! Fault injection for exercising transport error paths.

use std::collections::HashSet;
use std::fmt::Debug;

/// Internal operations that a [`FailureStrategy`] can force to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// Process-wide runtime setup when a transport is constructed.
    Initialize,
    /// Percent-encoding of a query key or value.
    UrlEncode,
    /// Reading the status code once the exchange has finished.
    StatusCode,
}

/// Decides whether an internal operation should fail.
///
/// Injected through [`IpfsConfig`](crate::config::IpfsConfig); production code
/// uses [`NeverFail`].
pub trait FailureStrategy: Send + Sync + Debug {
    /// Returns true if `point` must fail.
    fn should_fail(&self, point: FailurePoint) -> bool;
}

/// The production strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverFail;

impl FailureStrategy for NeverFail {
    fn should_fail(&self, _point: FailurePoint) -> bool {
        false
    }
}

/// Fails at every listed point.
#[derive(Debug, Default, Clone)]
pub struct FailAt {
    points: HashSet<FailurePoint>,
}

impl FailAt {
    /// Creates a strategy failing at `points`.
    pub fn new(points: impl IntoIterator<Item = FailurePoint>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }
}

impl FailureStrategy for FailAt {
    fn should_fail(&self, point: FailurePoint) -> bool {
        self.points.contains(&point)
    }
}
