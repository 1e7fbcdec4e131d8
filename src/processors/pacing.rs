use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use rand::Rng;
use std::io::{self, BufRead};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Skipped,
}

/// A sleep that an operator can cut short.
pub struct CancellableWait {
    skip: Receiver<()>,
}

impl CancellableWait {
    pub fn new(skip: Receiver<()>) -> Self {
        Self { skip }
    }

    /// A wait nothing can interrupt.
    pub fn never() -> Self {
        Self::new(channel::never())
    }

    /// A wait plus the sender that skips it.
    pub fn channel() -> (Sender<()>, Self) {
        let (tx, rx) = channel::unbounded();
        (tx, Self::new(rx))
    }

    /// Skip signals come from Enter presses on stdin.
    pub fn from_stdin() -> Self {
        let (tx, wait) = Self::channel();
        let spawned = thread::Builder::new()
            .name("skip-reader".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    if line.is_err() || tx.send(()).is_err() {
                        break;
                    }
                }
            });

        match spawned {
            Ok(_) => wait,
            Err(e) => {
                tracing::warn!(error = %e, "stdin skip reader unavailable; waits cannot be skipped");
                Self::never()
            }
        }
    }

    /// Block for `duration` unless a skip signal arrives first. Signals sent
    /// before the wait started are discarded. A disconnected signal source no
    /// longer interrupts anything; the remainder is slept out.
    pub fn wait(&self, duration: Duration) -> WaitOutcome {
        while self.skip.try_recv().is_ok() {}

        if duration.is_zero() {
            return WaitOutcome::Elapsed;
        }

        let started = Instant::now();
        match self.skip.recv_timeout(duration) {
            Ok(()) => WaitOutcome::Skipped,
            Err(RecvTimeoutError::Timeout) => WaitOutcome::Elapsed,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(duration.saturating_sub(started.elapsed()));
                WaitOutcome::Elapsed
            }
        }
    }
}

/// Jittered delay window applied before each station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min: min.min(max),
            max,
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rng.random_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}
