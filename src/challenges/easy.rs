use super::common::{INSTRUCTION, Reveal, SequenceRecall, option_index, pick, random_sequence, swatch_row};
use super::{ActiveChallenge, Challenge, ChallengeContext, Line, Span, Surface};
use crate::color::{
    NamedColor, PALETTE_BLUE, PALETTE_GREEN, PALETTE_PINK, PALETTE_PURPLE, PALETTE_RED,
    PALETTE_YELLOW,
};
use crossterm::event::KeyCode;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};

const STROOP_COLORS: [NamedColor; 6] = [
    PALETTE_RED,
    PALETTE_BLUE,
    PALETTE_GREEN,
    PALETTE_YELLOW,
    PALETTE_PURPLE,
    PALETTE_PINK,
];
const STROOP_CONFLICT_CHANCE: f64 = 0.7;
const STROOP_OPTIONS: usize = 4;

const MEMORY_PALETTE: [NamedColor; 5] = [
    PALETTE_RED,
    PALETTE_BLUE,
    PALETTE_GREEN,
    PALETTE_YELLOW,
    PALETTE_PURPLE,
];
const MEMORY_LEN: usize = 4;
const MEMORY_STEP: Duration = Duration::from_millis(700);
const MEMORY_EXTRA_SECS: u32 = 2;

const SEQUENCE_STEP: Duration = Duration::from_millis(650);
const SEQUENCE_DISTRACTORS: usize = 2;

/// Pick the ink color of a color word.
pub struct StroopBasic;

struct StroopRound
{
    ink: NamedColor,
    word: NamedColor,
    options: Vec<NamedColor>,
}

impl Challenge for StroopBasic
{
    fn id(&self) -> &'static str
    {
        "stroop_basic"
    }

    fn title(&self) -> &'static str
    {
        "Pick the ink color, not the word"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let rng = ctx.rng();
        let ink = pick(rng, &STROOP_COLORS);
        let mut word = pick(rng, &STROOP_COLORS);
        if rng.gen_bool(STROOP_CONFLICT_CHANCE) {
            while word == ink {
                word = pick(rng, &STROOP_COLORS);
            }
        }

        let mut options = vec![ink];
        while options.len() < STROOP_OPTIONS {
            let candidate = pick(rng, &STROOP_COLORS);
            if !options.contains(&candidate) {
                options.push(candidate);
            }
        }
        options.shuffle(rng);

        Box::new(StroopRound { ink, word, options })
    }
}

impl ActiveChallenge for StroopRound
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        if let Some(index) = option_index(key, self.options.len()) {
            ctx.end_with(self.options[index] == self.ink);
        }
    }

    fn render(&self, surface: &mut Surface, _now: Instant)
    {
        surface
            .display
            .push(Line::colored("Which color is the ink?", INSTRUCTION));
        surface.display.push(Line::default());
        surface.display.push(Line::colored(self.word.name, self.ink.rgb));

        for (idx, color) in self.options.iter().enumerate() {
            let mut line = Line::plain(format!("{}) ", idx + 1));
            line.push(Span::colored(color.name, color.rgb));
            surface.options.push(line);
        }
    }
}

/// Watch four colors flash by, then repeat them.
pub struct MemoryShort;

impl Challenge for MemoryShort
{
    fn id(&self) -> &'static str
    {
        "memory_short"
    }

    fn title(&self) -> &'static str
    {
        "Repeat a short color sequence"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let now = ctx.now;
        ctx.stop_timer();
        let len = MEMORY_LEN + ctx.level.saturating_sub(1) as usize;
        let sequence = random_sequence(ctx.rng(), &MEMORY_PALETTE, len);
        Box::new(SequenceRecall {
            target: sequence.clone(),
            reveal: Reveal::new(sequence.len(), MEMORY_STEP, now),
            sequence,
            choices: MEMORY_PALETTE.to_vec(),
            entered: Vec::new(),
            extra_secs: MEMORY_EXTRA_SECS,
            watch_prompt: "Watch the color sequence:",
            answer_prompt: "Repeat the sequence:",
        })
    }
}

/// Watch three to five colors, then pick the matching sequence among three.
pub struct SequenceSimple;

struct SequenceChoice
{
    sequence: Vec<NamedColor>,
    options: Vec<Vec<NamedColor>>,
    reveal: Reveal,
}

impl Challenge for SequenceSimple
{
    fn id(&self) -> &'static str
    {
        "sequence_simple"
    }

    fn title(&self) -> &'static str
    {
        "Spot the sequence you just saw"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let now = ctx.now;
        ctx.stop_timer();
        let rng = ctx.rng();
        let len = rng.gen_range(3..=5);
        let sequence = random_sequence(rng, &MEMORY_PALETTE, len);

        let mut options = vec![sequence.clone()];
        for _ in 0..SEQUENCE_DISTRACTORS {
            options.push(variant_of(rng, &sequence));
        }
        options.shuffle(rng);

        Box::new(SequenceChoice {
            reveal: Reveal::new(sequence.len(), SEQUENCE_STEP, now),
            sequence,
            options,
        })
    }
}

/// Copy of `sequence` with one position swapped for a different color.
fn variant_of<R: Rng + ?Sized>(rng: &mut R, sequence: &[NamedColor]) -> Vec<NamedColor>
{
    let mut variant = sequence.to_vec();
    let index = rng.gen_range(0..variant.len());
    let mut replacement = pick(rng, &MEMORY_PALETTE);
    while replacement == variant[index] {
        replacement = pick(rng, &MEMORY_PALETTE);
    }
    variant[index] = replacement;
    variant
}

impl ActiveChallenge for SequenceChoice
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        if !self.reveal.is_finished(ctx.now) {
            return;
        }
        if let Some(index) = option_index(key, self.options.len()) {
            ctx.end_with(self.options[index] == self.sequence);
        }
    }

    fn on_frame(&mut self, ctx: &mut ChallengeContext<'_>)
    {
        if self.reveal.poll_finished(ctx.now) {
            ctx.start_timer(None);
        }
    }

    fn render(&self, surface: &mut Surface, now: Instant)
    {
        match self.reveal.current(now) {
            Some(index) => {
                surface
                    .display
                    .push(Line::colored("Memorize the sequence:", INSTRUCTION));
                surface.display.push(Line::default());
                surface
                    .display
                    .push(swatch_row(&self.sequence[index..=index], 6));
                surface
                    .display
                    .push(swatch_row(&self.sequence[index..=index], 6));
            }
            None => {
                surface
                    .display
                    .push(Line::colored("Which sequence did you see?", INSTRUCTION));
                for (idx, option) in self.options.iter().enumerate() {
                    let mut line = Line::plain(format!("{}) ", idx + 1));
                    line.spans.extend(swatch_row(option, 2).spans);
                    surface.options.push(line);
                }
            }
        }
    }
}
