//! Single-shot deadline for one in-flight query

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default deadline for a streamed answer, measured from submission
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_millis(60_000);

/// A deadline that invokes a callback once unless cleared first
///
/// Dropping the watchdog clears it.
pub struct Watchdog {
    duration: Duration,
    cleared: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl Watchdog {
    /// Arm a new watchdog. `on_expire` runs at most once, on the runtime.
    pub fn start<F>(duration: Duration, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        debug!(duration_ms = duration.as_millis() as u64, "Watchdog::start: called");
        let cleared = CancellationToken::new();
        let fired = Arc::new(AtomicBool::new(false));

        let token = cleared.clone();
        let flag = fired.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Watchdog: cleared before expiry");
                }
                _ = tokio::time::sleep(duration) => {
                    if token.is_cancelled() || flag.swap(true, Ordering::SeqCst) {
                        return;
                    }
                    debug!(duration_ms = duration.as_millis() as u64, "Watchdog: expired");
                    on_expire();
                }
            }
        });

        Self {
            duration,
            cleared,
            fired,
        }
    }

    /// Disarm the watchdog. Safe to call any number of times.
    pub fn clear(&self) {
        if !self.cleared.is_cancelled() {
            debug!("Watchdog::clear: disarming");
            self.cleared.cancel();
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared.is_cancelled()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.cleared.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_deadline() {
        let (count, on_expire) = counter();
        let watchdog = Watchdog::start(Duration::from_secs(60), on_expire);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!watchdog.has_fired());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(watchdog.has_fired());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_prevents_expiry() {
        let (count, on_expire) = counter();
        let watchdog = Watchdog::start(Duration::from_secs(1), on_expire);

        watchdog.clear();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!watchdog.has_fired());
        assert!(watchdog.is_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_idempotent() {
        let (count, on_expire) = counter();
        let watchdog = Watchdog::start(Duration::from_millis(500), on_expire);

        watchdog.clear();
        watchdog.clear();
        tokio::time::sleep(Duration::from_secs(1)).await;
        watchdog.clear();

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_after_fire_is_noop() {
        let (count, on_expire) = counter();
        let watchdog = Watchdog::start(Duration::from_millis(100), on_expire);

        tokio::time::sleep(Duration::from_millis(200)).await;
        watchdog.clear();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(watchdog.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_disarms() {
        let (count, on_expire) = counter();
        drop(Watchdog::start(Duration::from_millis(100), on_expire));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_deadline() {
        assert_eq!(WATCHDOG_TIMEOUT, Duration::from_secs(60));
    }
}
