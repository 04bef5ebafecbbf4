//! Challenge content and the contract the round controller drives it through.
//!
//! A [`Challenge`] is registered once per tier. Each dispatch calls
//! [`Challenge::run`], which sets up one puzzle instance and returns it as an
//! [`ActiveChallenge`]. The controller then forwards key presses and frame
//! updates to that instance until it reports an outcome through
//! [`ChallengeContext::end_with`] or the round timer runs out.

mod common;
mod easy;
mod hard;
mod medium;

use crate::color::Rgb;
use crate::error::GameError;
use crate::registry::ChallengeRegistry;
use crate::tier::Tier;
use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::warn;

pub trait Challenge
{
    /// Unique within the tier the challenge is registered for.
    fn id(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>;
}

pub trait ActiveChallenge
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>);

    /// Called every loop iteration while the round is active.
    fn on_frame(&mut self, _ctx: &mut ChallengeContext<'_>) {}

    fn render(&self, surface: &mut Surface, now: Instant);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand
{
    /// Restart the round countdown with this many seconds.
    Start(u32),
    Stop,
}

/// What a challenge asked for during one callback.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ContextEffects
{
    pub timer_commands: Vec<TimerCommand>,
    pub outcome: Option<bool>,
}

/// Handed to a challenge for the duration of a single callback.
pub struct ChallengeContext<'a>
{
    pub tier: Tier,
    pub level: u32,
    pub time_limit: u32,
    pub now: Instant,
    rng: &'a mut StdRng,
    effects: ContextEffects,
}

impl<'a> ChallengeContext<'a>
{
    pub fn new(tier: Tier, level: u32, time_limit: u32, now: Instant, rng: &'a mut StdRng) -> Self
    {
        Self {
            tier,
            level,
            time_limit,
            now,
            rng,
            effects: ContextEffects::default(),
        }
    }

    pub fn rng(&mut self) -> &mut StdRng
    {
        &mut *self.rng
    }

    /// Restarts the countdown; `None` uses the tier's time limit. Expiry fails the round.
    pub fn start_timer(&mut self, seconds: Option<u32>)
    {
        let seconds = seconds.unwrap_or(self.time_limit);
        self.effects.timer_commands.push(TimerCommand::Start(seconds));
    }

    pub fn stop_timer(&mut self)
    {
        self.effects.timer_commands.push(TimerCommand::Stop);
    }

    /// Reports the outcome. Only the first report counts.
    pub fn end_with(&mut self, success: bool)
    {
        match self.effects.outcome {
            Some(first) => warn!(
                tier = %self.tier,
                level = self.level,
                first,
                ignored = success,
                "challenge reported its outcome twice"
            ),
            None => self.effects.outcome = Some(success),
        }
    }

    pub fn has_ended(&self) -> bool
    {
        self.effects.outcome.is_some()
    }

    pub fn into_effects(self) -> ContextEffects
    {
        self.effects
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span
{
    pub text: String,
    pub color: Option<Rgb>,
    pub background: Option<Rgb>,
}

impl Span
{
    pub fn plain(text: impl Into<String>) -> Self
    {
        Self {
            text: text.into(),
            color: None,
            background: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Rgb) -> Self
    {
        Self {
            text: text.into(),
            color: Some(color),
            background: None,
        }
    }

    /// A blank swatch filled with `color`.
    pub fn swatch(width: usize, color: Rgb) -> Self
    {
        Self {
            text: " ".repeat(width),
            color: None,
            background: Some(color),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line
{
    pub spans: Vec<Span>,
}

impl Line
{
    pub fn plain(text: impl Into<String>) -> Self
    {
        Self {
            spans: vec![Span::plain(text)],
        }
    }

    pub fn colored(text: impl Into<String>, color: Rgb) -> Self
    {
        Self {
            spans: vec![Span::colored(text, color)],
        }
    }

    pub fn push(&mut self, span: Span)
    {
        self.spans.push(span);
    }

    pub fn text(&self) -> String
    {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    pub fn width(&self) -> usize
    {
        self.spans.iter().map(|span| span.text.chars().count()).sum()
    }
}

/// Where a challenge draws itself: the prompt area and the answer options.
#[derive(Debug, Default)]
pub struct Surface
{
    pub display: Vec<Line>,
    pub options: Vec<Line>,
}

pub fn builtin_registry() -> Result<ChallengeRegistry, GameError>
{
    let mut registry = ChallengeRegistry::new();
    registry.register(Tier::Easy, Box::new(easy::StroopBasic))?;
    registry.register(Tier::Easy, Box::new(easy::MemoryShort))?;
    registry.register(Tier::Easy, Box::new(easy::SequenceSimple))?;
    registry.register(Tier::Medium, Box::new(medium::OddOneOut))?;
    registry.register(Tier::Medium, Box::new(medium::NumberOrder))?;
    registry.register(Tier::Medium, Box::new(medium::DualRule))?;
    registry.register(Tier::Hard, Box::new(hard::ReverseMemory))?;
    registry.register(Tier::Hard, Box::new(hard::DistractorReaction))?;
    registry.register(Tier::Hard, Box::new(hard::DualStroop))?;
    Ok(registry)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_registry_fills_every_tier()
    {
        let registry = builtin_registry().unwrap();
        for tier in Tier::ALL {
            assert_eq!(registry.len(tier), 3, "tier {tier}");
        }
    }

    #[test]
    fn test_end_with_keeps_first_outcome()
    {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = ChallengeContext::new(Tier::Easy, 1, 10, Instant::now(), &mut rng);
        ctx.end_with(true);
        ctx.end_with(false);
        assert!(ctx.has_ended());
        assert_eq!(ctx.into_effects().outcome, Some(true));
    }

    #[test]
    fn test_start_timer_defaults_to_time_limit()
    {
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = ChallengeContext::new(Tier::Medium, 2, 7, Instant::now(), &mut rng);
        ctx.start_timer(None);
        ctx.start_timer(Some(9));
        ctx.stop_timer();
        assert_eq!(
            ctx.into_effects().timer_commands,
            vec![TimerCommand::Start(7), TimerCommand::Start(9), TimerCommand::Stop]
        );
    }
}
