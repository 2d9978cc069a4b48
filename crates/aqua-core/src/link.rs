//! Retry helper for link bring-up
//!
//! Association and address acquisition have no failure path on the
//! monitor: they are retried at a fixed interval until they succeed.

use core::fmt::Debug;

use embedded_hal_async::delay::DelayNs;
use log::{info, warn};

/// Pause between two link bring-up attempts.
pub const LINK_RETRY_MS: u32 = 1000;

/// Run `attempt` until it returns `Ok`, sleeping `backoff_ms` after each failure.
///
/// `attempt` receives the 1-based attempt number. `what` names the operation
/// in the log.
pub async fn retry_until_ok<T, E, D, F>(
    delay: &mut D,
    backoff_ms: u32,
    what: &str,
    mut attempt: F,
) -> T
where
    E: Debug,
    D: DelayNs,
    F: AsyncFnMut(u32) -> Result<T, E>,
{
    let mut n: u32 = 1;
    loop {
        match attempt(n).await {
            Ok(value) => {
                if n > 1 {
                    info!("{} succeeded after {} attempts", what, n);
                }
                return value;
            }
            Err(e) => {
                warn!("{} failed (attempt {}): {:?}", what, n, e);
                delay.delay_ms(backoff_ms).await;
                n = n.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingDelay;
    use alloc::vec::Vec;
    use embassy_futures::block_on;

    #[test]
    fn test_first_success_never_sleeps() {
        let mut delay = RecordingDelay::default();
        let value: u8 = block_on(retry_until_ok(&mut delay, LINK_RETRY_MS, "join", async |_| {
            Ok::<_, ()>(7)
        }));
        assert_eq!(value, 7);
        assert!(delay.calls_ms.is_empty());
    }

    #[test]
    fn test_retries_until_success() {
        let mut delay = RecordingDelay::default();
        let mut seen = Vec::new();
        let value = block_on(retry_until_ok(&mut delay, LINK_RETRY_MS, "dhcp", async |n| {
            seen.push(n);
            if n < 4 { Err("no lease") } else { Ok(n * 10) }
        }));

        assert_eq!(value, 40);
        assert_eq!(seen, [1, 2, 3, 4]);
        assert_eq!(delay.calls_ms, [LINK_RETRY_MS; 3]);
    }
}
