// Process-wide unique ids
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

/// Next id from a process-wide counter.
///
/// The counter starts at a random value and wraps around on overflow, so ids
/// are unique for the next 2^32 calls.
pub fn unique_id() -> u32 {
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::random()))
        .fetch_add(1, Ordering::Relaxed)
}
