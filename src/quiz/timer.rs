// src/quiz/timer.rs

use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining: u64 },
    Expired,
}

/// Renders seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// A one-second countdown running on its own task.
///
/// The countdown owns its task: [`Countdown::stop`] or dropping the value
/// aborts it, so a countdown never outlives the quiz view that started it.
/// Events go to the channel given at start; a closed channel also ends the
/// task.
pub struct Countdown {
    total: u64,
    remaining: watch::Receiver<u64>,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn start(total_seconds: u64, events: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let (remaining_tx, remaining) = watch::channel(total_seconds);

        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);
            // A suspended process catches up tick by tick instead of skipping.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            let mut left = total_seconds;
            while left > 0 {
                ticker.tick().await;
                left -= 1;
                remaining_tx.send_replace(left);
                if events.send(TimerEvent::Tick { remaining: left }).is_err() {
                    return;
                }
            }

            debug!(total_seconds, "countdown expired");
            let _ = events.send(TimerEvent::Expired);
        });

        Self {
            total: total_seconds,
            remaining,
            handle: Some(handle),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        *self.remaining.borrow()
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining())
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_then_expires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::start(3, tx);
        assert_eq!(countdown.display(), "00:03");

        assert_eq!(rx.recv().await, Some(TimerEvent::Tick { remaining: 2 }));
        assert_eq!(rx.recv().await, Some(TimerEvent::Tick { remaining: 1 }));
        assert_eq!(rx.recv().await, Some(TimerEvent::Tick { remaining: 0 }));
        assert_eq!(rx.recv().await, Some(TimerEvent::Expired));
        assert_eq!(rx.recv().await, None);
        assert_eq!(countdown.display(), "00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_one_second_apart() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let _countdown = Countdown::start(2, tx);

        rx.recv().await;
        assert_eq!(start.elapsed().as_secs(), 1);
        rx.recv().await;
        assert_eq!(start.elapsed().as_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_stops_the_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::start(60, tx);
        assert_eq!(rx.recv().await, Some(TimerEvent::Tick { remaining: 59 }));

        drop(countdown);
        // The aborted task drops its sender, so the channel closes instead of ticking on.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_expires_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _countdown = Countdown::start(0, tx);
        assert_eq!(rx.recv().await, Some(TimerEvent::Expired));
    }
}
