use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{GlowGridError, Result};

/// How absolute time advances. Chosen once at startup and never switched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Time follows a monotonic clock, sampled once per frame.
    Realtime,
    /// Time only moves when a capture driver injects a timestamp.
    Export,
}

impl TimeMode {
    pub fn from_export_flag(export: bool) -> Self {
        if export {
            Self::Export
        } else {
            Self::Realtime
        }
    }
}

/// Monotonic clock anchored at the moment playback started.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    started: Instant,
}

impl PlaybackClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// Last published absolute time, shared between the time source and
/// whoever is allowed to write it.
#[derive(Debug, Clone, Default)]
pub struct SharedTime {
    value: Arc<Mutex<f64>>,
}

impl SharedTime {
    pub fn get(&self) -> Result<f64> {
        Ok(*self.lock()?)
    }

    pub fn set(&self, ms: f64) -> Result<()> {
        if !ms.is_finite() {
            return Err(GlowGridError::InvalidInput("time must be a finite number of milliseconds"));
        }
        *self.lock()? = ms;
        Ok(())
    }

    /// Whether both handles write the same published time.
    pub(crate) fn same_as(&self, other: &SharedTime) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    fn lock(&self) -> Result<MutexGuard<'_, f64>> {
        self.value
            .lock()
            .map_err(|_| GlowGridError::msg("published time has been poisoned"))
    }
}

#[derive(Debug, Clone)]
enum SourceKind {
    Realtime { clock: PlaybackClock },
    Export,
}

/// Supplies the absolute time that drives the intensity engine.
#[derive(Debug, Clone)]
pub struct TimeSource {
    kind: SourceKind,
    published: SharedTime,
}

impl TimeSource {
    pub fn new(mode: TimeMode) -> Self {
        let kind = match mode {
            TimeMode::Realtime => SourceKind::Realtime {
                clock: PlaybackClock::start(),
            },
            TimeMode::Export => SourceKind::Export,
        };

        Self {
            kind,
            published: SharedTime::default(),
        }
    }

    pub fn mode(&self) -> TimeMode {
        match self.kind {
            SourceKind::Realtime { .. } => TimeMode::Realtime,
            SourceKind::Export => TimeMode::Export,
        }
    }

    /// Most recently published absolute time in milliseconds.
    pub fn now_ms(&self) -> Result<f64> {
        self.published.get()
    }

    /// Samples the clock and publishes the elapsed time. Realtime only.
    pub fn publish_now(&self) -> Result<f64> {
        let SourceKind::Realtime { clock } = &self.kind else {
            return Err(GlowGridError::ModeMismatch {
                expected: TimeMode::Realtime,
            });
        };

        let t_abs = clock.elapsed_ms();
        self.published.set(t_abs)?;
        Ok(t_abs)
    }

    pub(crate) fn publishes_to(&self, time: &SharedTime) -> bool {
        self.published.same_as(time)
    }

    /// Write handle for injected time. Export only.
    pub fn export_handle(&self) -> Result<SharedTime> {
        match self.kind {
            SourceKind::Export => Ok(self.published.clone()),
            SourceKind::Realtime { .. } => Err(GlowGridError::ModeMismatch {
                expected: TimeMode::Export,
            }),
        }
    }
}

/// Stops a [`FrameLoop`] before its next frame.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cooperative realtime loop: one frame at a time, each sampling the clock,
/// publishing the time and running the frame callback before the next frame
/// is scheduled.
#[derive(Debug)]
pub struct FrameLoop {
    interval: Duration,
    cancel: CancelToken,
}

impl FrameLoop {
    pub fn new(fps: f64) -> Result<Self> {
        if !(fps > 0.0 && fps.is_finite()) {
            return Err(GlowGridError::InvalidInput("fps must be finite and positive"));
        }

        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / fps),
            cancel: CancelToken::new(),
        })
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs until cancelled and returns the number of frames produced.
    ///
    /// Deadlines advance by a fixed interval so sleep jitter does not
    /// accumulate; frames that are already late are dropped rather than
    /// queued.
    pub fn run<F>(&self, source: &TimeSource, mut on_frame: F) -> Result<u64>
    where
        F: FnMut(f64) -> Result<()>,
    {
        if source.mode() != TimeMode::Realtime {
            return Err(GlowGridError::ModeMismatch {
                expected: TimeMode::Realtime,
            });
        }

        let mut frames = 0;
        let mut deadline = Instant::now();

        while !self.cancel.is_cancelled() {
            let t_abs = source.publish_now()?;
            on_frame(t_abs)?;
            frames += 1;

            deadline += self.interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }

        tracing::debug!(frames, "frame loop cancelled");
        Ok(frames)
    }
}
