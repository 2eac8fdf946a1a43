//! Liveness checkers.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

/// A zero-argument async predicate. `true` means "alive".
pub type Checker = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Wrap an async closure as a [`Checker`].
pub fn checker<F, Fut>(check: F) -> Checker
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move || Box::pin(check()) as BoxFuture<'static, bool>)
}

/// Run every checker in order; stops at the first one that reports `false`.
///
/// Nothing is cached, each call evaluates the checkers afresh.
pub async fn all_alive(checkers: &[Checker]) -> bool {
    for check in checkers {
        if !check().await {
            return false;
        }
    }
    true
}
