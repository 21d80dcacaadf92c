// Panic isolation for request processing
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Drive `future` to completion, catching a panic raised while polling it.
///
/// # Example
/// ```text
/// match execute_guarded(async { panic!("boom") }).await {
///     PanicGuardResult::Panicked(msg) => assert_eq!(msg, "boom"),
///     PanicGuardResult::Success(_) => unreachable!(),
/// }
/// ```
pub async fn execute_guarded<F, T>(future: F) -> PanicGuardResult<T>
where
    F: std::future::Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(value) => PanicGuardResult::Success(value),
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(panic_msg = %panic_msg, "Request processing panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
