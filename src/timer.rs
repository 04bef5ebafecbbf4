use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How close a countdown is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency
{
    Normal,
    Warning,
    Critical,
}

impl Urgency
{
    /// At or below 30% of the total is critical, at or below 60% is a warning.
    pub fn for_remaining(remaining: u32, total: u32) -> Self
    {
        let remaining = remaining as u64 * 10;
        let total = total as u64;
        if total == 0 || remaining <= total * 3 {
            Urgency::Critical
        } else if remaining <= total * 6 {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

/// Snapshot of a countdown for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownDisplay
{
    pub remaining: u32,
    pub total: u32,
}

impl CountdownDisplay
{
    pub fn urgency(&self) -> Urgency
    {
        Urgency::for_remaining(self.remaining, self.total)
    }

    pub fn fraction(&self) -> f32
    {
        if self.total == 0 {
            return 0.0;
        }
        (self.remaining as f32 / self.total as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TimerEvent<T>
{
    Tick(CountdownDisplay),
    Expired(T),
}

struct Countdown<T>
{
    total: u32,
    remaining: i64,
    next_tick: Instant,
    on_timeout: T,
}

impl<T> Countdown<T>
{
    fn display(&self) -> CountdownDisplay
    {
        CountdownDisplay {
            remaining: self.remaining.max(0) as u32,
            total: self.total,
        }
    }
}

/// Cancellable once-per-second countdown driven by the caller's loop.
///
/// At most one countdown is owned at a time; starting a new one drops the
/// previous one together with its timeout payload, so a replaced countdown
/// can never expire.
pub struct RoundTimer<T>
{
    active: Option<Countdown<T>>,
}

impl<T> Default for RoundTimer<T>
{
    fn default() -> Self
    {
        Self { active: None }
    }
}

impl<T> RoundTimer<T>
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Starts a countdown of `seconds`, replacing any running one. Returns the
    /// initial display state.
    pub fn start(&mut self, seconds: u32, now: Instant, on_timeout: T) -> CountdownDisplay
    {
        let countdown = Countdown {
            total: seconds,
            remaining: seconds as i64,
            next_tick: now + TICK_INTERVAL,
            on_timeout,
        };
        let display = countdown.display();
        self.active = Some(countdown);
        display
    }

    /// Cancels the running countdown. Returns whether one was running.
    pub fn stop(&mut self) -> bool
    {
        self.active.take().is_some()
    }

    pub fn is_running(&self) -> bool
    {
        self.active.is_some()
    }

    pub fn display(&self) -> Option<CountdownDisplay>
    {
        self.active.as_ref().map(Countdown::display)
    }

    /// Applies every tick due at `now`. The timeout payload is yielded once,
    /// after the tick that brings the countdown to zero.
    pub fn advance(&mut self, now: Instant) -> Vec<TimerEvent<T>>
    {
        let mut events = Vec::new();
        while let Some(countdown) = self.active.as_mut() {
            if now < countdown.next_tick {
                break;
            }
            countdown.remaining -= 1;
            countdown.next_tick += TICK_INTERVAL;
            events.push(TimerEvent::Tick(countdown.display()));

            if countdown.remaining <= 0 {
                if let Some(expired) = self.active.take() {
                    events.push(TimerEvent::Expired(expired.on_timeout));
                }
            }
        }
        events
    }
}
