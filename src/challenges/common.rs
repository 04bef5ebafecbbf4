use super::{ActiveChallenge, ChallengeContext, Line, Span, Surface};
use crate::color::{GRAY, NamedColor};
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};

pub(super) const INSTRUCTION: crate::color::Rgb = GRAY;

pub(super) fn pick<T: Copy, R: Rng + ?Sized>(rng: &mut R, items: &[T]) -> T
{
    items[rng.gen_range(0..items.len())]
}

pub(super) fn random_sequence<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &[NamedColor],
    len: usize,
) -> Vec<NamedColor>
{
    (0..len).map(|_| pick(rng, palette)).collect()
}

/// Maps `1`-`9` to an option index when it is in range.
pub(super) fn option_index(key: KeyCode, count: usize) -> Option<usize>
{
    match key {
        KeyCode::Char(ch) => ch
            .to_digit(10)
            .filter(|digit| *digit >= 1)
            .map(|digit| digit as usize - 1)
            .filter(|index| *index < count),
        _ => None,
    }
}

pub(super) fn swatch_row(colors: &[NamedColor], width: usize) -> Line
{
    let mut line = Line::default();
    for (idx, color) in colors.iter().enumerate() {
        if idx > 0 {
            line.push(Span::plain(" "));
        }
        line.push(Span::swatch(width, color.rgb));
    }
    line
}

/// Plays a sequence back one item per `step`.
pub(super) struct Reveal
{
    started: Instant,
    step: Duration,
    len: usize,
    reported: bool,
}

impl Reveal
{
    pub(super) fn new(len: usize, step: Duration, now: Instant) -> Self
    {
        Self {
            started: now,
            step,
            len,
            reported: false,
        }
    }

    /// Index of the item on show, or `None` once playback is over.
    pub(super) fn current(&self, now: Instant) -> Option<usize>
    {
        let elapsed = now.saturating_duration_since(self.started);
        let index = (elapsed.as_millis() / self.step.as_millis().max(1)) as usize;
        (index < self.len).then_some(index)
    }

    pub(super) fn is_finished(&self, now: Instant) -> bool
    {
        self.current(now).is_none()
    }

    /// True exactly once, on the first call after playback ends.
    pub(super) fn poll_finished(&mut self, now: Instant) -> bool
    {
        if self.reported || !self.is_finished(now) {
            return false;
        }
        self.reported = true;
        true
    }
}

/// Watch a color sequence, then key it back in from a set of choices.
pub(super) struct SequenceRecall
{
    pub(super) sequence: Vec<NamedColor>,
    pub(super) target: Vec<NamedColor>,
    pub(super) choices: Vec<NamedColor>,
    pub(super) entered: Vec<NamedColor>,
    pub(super) reveal: Reveal,
    pub(super) extra_secs: u32,
    pub(super) watch_prompt: &'static str,
    pub(super) answer_prompt: &'static str,
}

impl ActiveChallenge for SequenceRecall
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        if !self.reveal.is_finished(ctx.now) {
            return;
        }
        let Some(index) = option_index(key, self.choices.len()) else {
            return;
        };
        self.entered.push(self.choices[index]);
        if self.entered.len() == self.target.len() {
            ctx.end_with(self.entered == self.target);
        }
    }

    fn on_frame(&mut self, ctx: &mut ChallengeContext<'_>)
    {
        if self.reveal.poll_finished(ctx.now) {
            let seconds = ctx.time_limit + self.extra_secs;
            ctx.start_timer(Some(seconds));
        }
    }

    fn render(&self, surface: &mut Surface, now: Instant)
    {
        match self.reveal.current(now) {
            Some(index) => {
                surface.display.push(Line::colored(self.watch_prompt, INSTRUCTION));
                surface.display.push(Line::default());
                surface
                    .display
                    .push(swatch_row(&self.sequence[index..=index], 8));
                surface
                    .display
                    .push(swatch_row(&self.sequence[index..=index], 8));
            }
            None => {
                surface.display.push(Line::colored(self.answer_prompt, INSTRUCTION));
                surface.display.push(Line::default());
                let mut progress = swatch_row(&self.entered, 4);
                let pending = self.target.len().saturating_sub(self.entered.len());
                for _ in 0..pending {
                    progress.push(Span::plain(" ____"));
                }
                surface.display.push(progress);

                for (idx, color) in self.choices.iter().enumerate() {
                    let mut line = Line::plain(format!("{}) ", idx + 1));
                    line.push(Span::swatch(4, color.rgb));
                    line.push(Span::colored(format!(" {}", color.name), color.rgb));
                    surface.options.push(line);
                }
            }
        }
    }
}
