//! One-shot timer service and the repeating frame ticker.
//!
//! Both run on a caller-supplied clock (seconds since session start), so the
//! live loop can feed wall-clock time and the recorder can feed frame time.

/// Handle to one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Cancellable single-shot delayed events
pub trait TimerService<T> {
    /// Schedule `payload` to be released `delay_s` seconds from now
    fn schedule_once(&mut self, delay_s: f64, payload: T) -> TimerToken;

    /// Cancel a pending timer. Unknown, fired or already cancelled tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

#[derive(Debug)]
struct PendingTimer<T> {
    token: TimerToken,
    due_s: f64,
    payload: T,
}

/// Timer queue on a virtual clock
#[derive(Debug)]
pub struct TimerQueue<T> {
    now_s: f64,
    next_id: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now_s: 0.0,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Current clock (seconds)
    pub fn now(&self) -> f64 {
        self.now_s
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|p| p.token == token)
    }

    /// Earliest deadline, if anything is pending
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.iter().map(|p| p.due_s).reduce(f64::min)
    }

    /// Release the earliest timer due at or before `now_s`.
    ///
    /// The clock moves to that timer's deadline, so a timer scheduled from its
    /// handler is measured from when it was due rather than from `now_s`.
    /// Ties release in scheduling order.
    pub fn pop_due(&mut self, now_s: f64) -> Option<(TimerToken, T)> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_s <= now_s)
            .min_by(|(_, a), (_, b)| {
                a.due_s
                    .total_cmp(&b.due_s)
                    .then(a.token.0.cmp(&b.token.0))
            })
            .map(|(i, _)| i)?;

        let timer = self.pending.remove(position);
        self.now_s = self.now_s.max(timer.due_s);
        Some((timer.token, timer.payload))
    }

    /// Move the clock forward without releasing anything
    pub fn set_now(&mut self, now_s: f64) {
        self.now_s = self.now_s.max(now_s);
    }
}

impl<T> TimerService<T> for TimerQueue<T> {
    fn schedule_once(&mut self, delay_s: f64, payload: T) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            token,
            due_s: self.now_s + delay_s.max(0.0),
            payload,
        });
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|p| p.token != token);
    }
}

/// Repeating frame trigger with an explicit start/stop lifecycle
#[derive(Debug, Clone)]
pub struct FrameTicker {
    interval_s: f64,
    next_due_s: Option<f64>,
}

impl FrameTicker {
    pub fn new(interval_s: f64) -> Self {
        Self {
            interval_s: interval_s.max(f64::EPSILON),
            next_due_s: None,
        }
    }

    pub fn interval_s(&self) -> f64 {
        self.interval_s
    }

    /// Start ticking; the first frame is due immediately
    pub fn start(&mut self, now_s: f64) {
        self.next_due_s = Some(now_s);
    }

    pub fn stop(&mut self) {
        self.next_due_s = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due_s.is_some()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.next_due_s
    }

    /// Whether a frame is due at `now_s`. Frames missed while the caller was busy are skipped.
    pub fn poll(&mut self, now_s: f64) -> bool {
        let Some(due) = self.next_due_s else {
            return false;
        };
        if now_s < due {
            return false;
        }
        let missed = ((now_s - due) / self.interval_s).floor() + 1.0;
        let mut next = due + missed * self.interval_s;
        if next <= now_s {
            // Interval below the clock's resolution
            next = now_s + self.interval_s;
        }
        self.next_due_s = Some(next);
        true
    }
}
