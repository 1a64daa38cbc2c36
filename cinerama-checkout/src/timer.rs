use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Countdown signal, one tick per second plus a single terminal expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining_secs: u64 },
    Expired,
}

/// Single-shot checkout countdown. One instance per checkout session;
/// arming again before stopping replaces the previous arm, so two timers
/// never run at once. Restart after expiry begins a fresh hold window.
pub struct CheckoutTimer {
    tx: mpsc::Sender<TimerEvent>,
    deadline: Option<Instant>,
    duration: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl CheckoutTimer {
    /// The receiver carries every tick and expiry of every arm of this
    /// timer instance
    pub fn new() -> (Self, mpsc::Receiver<TimerEvent>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Self {
                tx,
                deadline: None,
                duration: None,
                task: None,
            },
            rx,
        )
    }

    /// Arm a deadline `now + duration`, cancelling any previous arm
    pub fn start(&mut self, duration: Duration) {
        self.cancel_task();
        let deadline = Instant::now() + duration;
        self.deadline = Some(deadline);
        self.duration = Some(duration);

        let tx = self.tx.clone();
        self.task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    let _ = tx.send(TimerEvent::Expired).await;
                    break;
                }
                if tx
                    .send(TimerEvent::Tick {
                        remaining_secs: remaining.as_secs(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    /// Re-arm from now with the duration of the last `start`
    pub fn reset(&mut self) {
        match self.duration {
            Some(duration) => self.start(duration),
            None => tracing::warn!("reset called on a timer that was never started"),
        }
    }

    pub fn stop(&mut self) {
        self.cancel_task();
        self.deadline = None;
    }

    /// Remaining time of the current arm, zero when unarmed or lapsed
    pub fn remaining(&self) -> Duration {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CheckoutTimer {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

/// "MM:SS" label for countdown display
pub fn format_remaining(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}
