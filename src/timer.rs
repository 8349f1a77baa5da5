use std::fmt;
use std::time::Duration;

type Callback = Box<dyn FnMut() + Send + Sync>;

/// Duration-gated flag polled once per frame against the simulation clock.
///
/// `start_time` doubles as the activity flag: `None` means inactive, which is
/// the only state a timer can be in after `deactivate()`.
pub struct CooldownTimer {
    duration: Duration,
    start_time: Option<Duration>,
    repeat: bool,
    callback: Option<Callback>,
}

impl CooldownTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            start_time: None,
            repeat: false,
            callback: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn with_callback(mut self, callback: impl FnMut() + Send + Sync + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Activates immediately at `now`, like constructing with autostart.
    pub fn autostart(mut self, now: Duration) -> Self {
        self.activate(now);
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start_time(&self) -> Option<Duration> {
        self.start_time
    }

    pub fn is_active(&self) -> bool {
        self.start_time.is_some()
    }

    pub fn activate(&mut self, now: Duration) {
        self.start_time = Some(now);
    }

    pub fn deactivate(&mut self, now: Duration) {
        self.start_time = None;
        if self.repeat {
            self.activate(now);
        }
    }

    /// Polls the timer. Returns `true` when an armed activation expired this
    /// call; the callback runs exactly then.
    ///
    /// An inactive timer measures from zero, so once `now >= duration` every
    /// poll runs `deactivate()` without firing. For a repeating timer that
    /// re-arms it.
    pub fn update(&mut self, now: Duration) -> bool {
        let start = self.start_time.unwrap_or_default();
        if now.saturating_sub(start) < self.duration {
            return false;
        }
        let armed = self.start_time.is_some();
        if armed {
            if let Some(callback) = self.callback.as_mut() {
                callback();
            }
        }
        self.deactivate(now);
        armed
    }
}

impl fmt::Debug for CooldownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CooldownTimer")
            .field("duration", &self.duration)
            .field("start_time", &self.start_time)
            .field("repeat", &self.repeat)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn counting_timer(duration: u64) -> (CooldownTimer, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let timer = CooldownTimer::from_millis(duration).with_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, hits)
    }

    #[test]
    fn activate_does_not_fire_synchronously() {
        let (mut timer, hits) = counting_timer(100);
        timer.activate(ms(500));
        assert!(timer.is_active());
        assert_eq!(timer.start_time(), Some(ms(500)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fires_once_when_duration_elapses() {
        let (mut timer, hits) = counting_timer(100);
        timer.activate(ms(1000));
        assert!(!timer.update(ms(1050)));
        assert!(!timer.update(ms(1099)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(timer.update(ms(1100)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!timer.is_active());
        assert_eq!(timer.start_time(), None);

        assert!(!timer.update(ms(1300)));
        assert!(!timer.update(ms(5000)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn activation_at_time_zero_still_fires() {
        let (mut timer, hits) = counting_timer(50);
        timer.activate(Duration::ZERO);
        assert!(timer.update(ms(50)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn never_started_timer_does_not_fire() {
        let (mut timer, hits) = counting_timer(100);
        assert!(!timer.update(ms(10_000)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn repeating_timer_rearms_from_firing_instant() {
        let (timer, hits) = counting_timer(100);
        let mut timer = timer.repeating();
        timer.activate(ms(0));
        // late poll: the next window starts at 130, not at the ideal 100
        assert!(timer.update(ms(130)));
        assert!(timer.is_active());
        assert_eq!(timer.start_time(), Some(ms(130)));
        assert!(!timer.update(ms(200)));
        assert!(timer.update(ms(230)));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn idle_repeating_timer_self_starts_without_firing() {
        let (timer, hits) = counting_timer(100);
        let mut timer = timer.repeating();
        assert!(!timer.update(ms(40)));
        assert!(!timer.is_active());
        assert!(!timer.update(ms(100)));
        assert!(timer.is_active());
        assert_eq!(timer.start_time(), Some(ms(100)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(timer.update(ms(200)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reactivation_restarts_window() {
        let mut timer = CooldownTimer::from_millis(300);
        timer.activate(ms(0));
        timer.activate(ms(250));
        assert!(!timer.update(ms(400)));
        assert!(timer.update(ms(550)));
    }

    #[test]
    fn autostart_activates_at_given_time() {
        let timer = CooldownTimer::from_millis(100).autostart(ms(42));
        assert_eq!(timer.start_time(), Some(ms(42)));
    }
}
