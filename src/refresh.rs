use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::bridge::HeartRateBridge;
use crate::screen::Screen;

pub const REFRESH_PERIOD: Duration = Duration::from_millis(100);

/// Copies the bridge value onto the screen at a fixed period.
///
/// Never waits on BLE: a stalled session just leaves the value unchanged.
pub struct RefreshLoop {
    bridge: HeartRateBridge,
    period: Duration,
    next_tick: Option<Instant>,
}

impl RefreshLoop {
    pub fn new(bridge: HeartRateBridge, period: Duration) -> Self {
        RefreshLoop {
            bridge,
            period,
            next_tick: None,
        }
    }

    pub fn tick(&self, screen: &mut dyn Screen) {
        screen.set_value(self.bridge.get());
    }

    /// Ticks if a period has passed and returns how long until the next tick.
    /// Meant to be called from a UI frame callback.
    pub fn poll(&mut self, now: Instant, screen: &mut dyn Screen) -> Duration {
        let due = self.next_tick.map_or(true, |next| now >= next);
        if due {
            self.tick(screen);
            self.next_tick = Some(now + self.period);
        }
        self.next_tick
            .map_or(Duration::ZERO, |next| next.saturating_duration_since(now))
    }

    /// Drives the loop from a timer until cancelled, for hosts without a frame loop.
    pub async fn run<S: Screen>(self, mut screen: S, cancel: CancellationToken) -> S {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return screen,
                _ = ticker.tick() => self.tick(&mut screen),
            }
        }
    }
}
