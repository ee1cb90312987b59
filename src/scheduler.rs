//! Frame clocks for driving a conversion.
//!
//! A conversion advances one step per [`Conversion::tick`](crate::Conversion::tick).
//! A [`FrameClock`] paces those ticks the way an animation-frame callback
//! paces work on a UI thread.

use std::thread;
use std::time::{Duration, Instant};

/// Interval of a 60 Hz display refresh.
pub const ANIMATION_FRAME_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// Paces the ticks of a driving loop.
pub trait FrameClock {
    /// Block until the next tick is due.
    fn wait_next_frame(&mut self);
}

/// Ticks at a fixed interval. Time spent in the tick itself counts toward
/// the interval, so a slow tick is followed immediately by the next one.
#[derive(Debug, Clone)]
pub struct IntervalClock {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl IntervalClock {
    /// A clock with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// A clock ticking at display refresh rate.
    pub fn animation_frame() -> Self {
        Self::new(ANIMATION_FRAME_INTERVAL)
    }
}

impl FrameClock for IntervalClock {
    fn wait_next_frame(&mut self) {
        if let Some(last_tick) = self.last_tick {
            let elapsed = last_tick.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last_tick = Some(Instant::now());
    }
}

/// Ticks as fast as possible, only yielding the thread between ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateClock;

impl FrameClock for ImmediateClock {
    fn wait_next_frame(&mut self) {
        thread::yield_now();
    }
}
