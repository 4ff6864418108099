//! Self-rescheduling frame loop.
//!
//! A [`FrameLoop`] asks its [`FrameClock`] for the next tick only after the
//! previous frame has completed, so frames never overlap. The loop ends when
//! the callback returns [`FrameControl::Stop`], the clock runs out, or a
//! [`StopHandle`] is triggered. Cancellation is only observed between frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Zero-based frame number.
    pub index: u64,
    /// Time since the first frame.
    pub time: Duration,
    /// Time since the previous frame (zero for the first).
    pub elapsed: Duration,
}

/// Source of frame ticks.
pub trait FrameClock {
    /// Wait for and return the next tick, or `None` when the clock is done.
    fn next_tick(&mut self) -> Option<FrameTick>;
}

/// Deterministic clock advancing by a fixed interval without sleeping.
#[derive(Debug, Clone)]
pub struct FixedRateClock {
    interval: Duration,
    index: u64,
    limit: Option<u64>,
}

impl FixedRateClock {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            index: 0,
            limit: None,
        }
    }

    /// Stop after `frames` ticks.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameClock for FixedRateClock {
    fn next_tick(&mut self) -> Option<FrameTick> {
        if self.limit.is_some_and(|limit| self.index >= limit) {
            return None;
        }
        let index = self.index;
        self.index += 1;
        Some(FrameTick {
            index,
            time: self.interval.saturating_mul(index.min(u32::MAX as u64) as u32),
            elapsed: if index == 0 { Duration::ZERO } else { self.interval },
        })
    }
}

/// Wall-clock pacing at a target frame rate.
///
/// Each deadline is one interval after the previous tick was delivered, so a
/// late frame only delays the next one and is never made up for.
#[derive(Debug, Clone)]
pub struct RealtimeClock {
    interval: Duration,
    start: Option<Instant>,
    last: Option<Instant>,
    deadline: Option<Instant>,
    index: u64,
}

impl RealtimeClock {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            start: None,
            last: None,
            deadline: None,
            index: 0,
        }
    }
}

impl FrameClock for RealtimeClock {
    fn next_tick(&mut self) -> Option<FrameTick> {
        if let Some(deadline) = self.deadline {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }

        let now = Instant::now();
        let start = *self.start.get_or_insert(now);
        let elapsed = self.last.map_or(Duration::ZERO, |last| now - last);
        self.last = Some(now);

        self.deadline = Some(now + self.interval);

        let index = self.index;
        self.index += 1;
        Some(FrameTick {
            index,
            time: now - start,
            elapsed,
        })
    }
}

/// What the loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Stop,
}

/// Cancels a running [`FrameLoop`] from another owner or thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives a frame callback from a clock.
pub struct FrameLoop<C> {
    clock: C,
    stop: StopHandle,
}

impl<C: FrameClock> FrameLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            stop: StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run frames until stopped, returning the number completed.
    ///
    /// An error from the callback ends the loop and is returned as is.
    pub fn run<F, E>(&mut self, mut frame: F) -> Result<u64, E>
    where
        F: FnMut(&FrameTick) -> Result<FrameControl, E>,
    {
        let mut completed = 0;
        while !self.stop.is_stopped() {
            let Some(tick) = self.clock.next_tick() else {
                break;
            };
            let control = frame(&tick)?;
            completed += 1;
            if control == FrameControl::Stop {
                break;
            }
        }
        log::debug!("Frame loop finished after {} frame(s)", completed);
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rate_ticks() {
        let mut clock = FixedRateClock::new(50).with_limit(3);
        let ticks: Vec<_> = std::iter::from_fn(|| clock.next_tick()).collect();

        assert_eq!(ticks.len(), 3);
        assert_eq!(ticks[0].elapsed, Duration::ZERO);
        assert_eq!(ticks[1].elapsed, Duration::from_millis(20));
        assert_eq!(ticks[2].time, Duration::from_millis(40));
    }

    #[test]
    fn test_loop_stops_on_callback() {
        let mut frame_loop = FrameLoop::new(FixedRateClock::new(60));
        let frames = frame_loop
            .run(|tick| {
                Ok::<_, ()>(if tick.index == 4 {
                    FrameControl::Stop
                } else {
                    FrameControl::Continue
                })
            })
            .unwrap();
        assert_eq!(frames, 5);
    }

    #[test]
    fn test_loop_ends_with_clock() {
        let mut frame_loop = FrameLoop::new(FixedRateClock::new(60).with_limit(7));
        let frames = frame_loop.run(|_| Ok::<_, ()>(FrameControl::Continue)).unwrap();
        assert_eq!(frames, 7);
    }

    #[test]
    fn test_stop_handle_cancels_between_frames() {
        let mut frame_loop = FrameLoop::new(FixedRateClock::new(60));
        let handle = frame_loop.stop_handle();
        let frames = frame_loop
            .run(|tick| {
                if tick.index == 2 {
                    handle.stop();
                }
                Ok::<_, ()>(FrameControl::Continue)
            })
            .unwrap();
        // The frame that requested the stop still completes.
        assert_eq!(frames, 3);
    }

    #[test]
    fn test_error_ends_loop() {
        let mut frame_loop = FrameLoop::new(FixedRateClock::new(60));
        let result = frame_loop.run(|tick| {
            if tick.index == 1 {
                Err("boom")
            } else {
                Ok(FrameControl::Continue)
            }
        });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_realtime_clock_paces_frames() {
        let mut clock = RealtimeClock::new(200);
        let first = clock.next_tick().unwrap();
        let second = clock.next_tick().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.elapsed, Duration::ZERO);
        assert!(second.elapsed >= Duration::from_millis(4));
    }
}
