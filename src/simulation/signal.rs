use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// Change notification for a shared resource.
///
/// Waiters read the generation with `observe` *before* checking their
/// condition under the resource's own locks, then `wait` with that value.
/// Any `notify` that happened in between makes `wait` return at once, so a
/// change can never slip between the check and the wait. `wait` is bounded
/// by a timeout; callers always re-check after it returns.
#[derive(Debug, Default)]
pub struct Signal {
    generation: Mutex<u64>,
    changed: Condvar,
}

impl Signal {
    pub fn new() -> Signal {
        Signal::default()
    }

    pub fn observe(&self) -> u64 {
        *self.generation.lock()
    }

    pub fn notify(&self) {
        let mut generation = self.generation.lock();

        *generation = generation.wrapping_add(1);
        self.changed.notify_all();
    }

    /// Returns `true` when the generation moved past `observed`.
    pub fn wait(&self, observed: u64, timeout: Duration) -> bool {
        let mut generation = self.generation.lock();

        if *generation == observed {
            self.changed.wait_for(&mut generation, timeout);
        }

        *generation != observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn notify_before_wait_is_not_lost() {
        let signal = Signal::new();
        let observed = signal.observe();

        signal.notify();

        let started = Instant::now();
        assert!(signal.wait(observed, Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_times_out_without_change() {
        let signal = Signal::new();
        let observed = signal.observe();

        assert!(!signal.wait(observed, Duration::from_millis(10)));
    }

    #[test]
    fn notify_wakes_a_waiting_thread() {
        let signal = Arc::new(Signal::new());
        let observed = signal.observe();

        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait(observed, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(10));
        signal.notify();

        assert!(waiter.join().unwrap());
    }
}
