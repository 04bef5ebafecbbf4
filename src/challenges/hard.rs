use super::common::{INSTRUCTION, Reveal, SequenceRecall, option_index, pick, random_sequence};
use super::{ActiveChallenge, Challenge, ChallengeContext, Line, Span, Surface};
use crate::color::{
    DIM, NamedColor, PALETTE_BLUE, PALETTE_GREEN, PALETTE_ORANGE, PALETTE_PURPLE, PALETTE_RED,
    PALETTE_YELLOW, Rgb, WHITE,
};
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};

const REVERSE_PALETTE: [NamedColor; 6] = [
    PALETTE_RED,
    PALETTE_BLUE,
    PALETTE_GREEN,
    PALETTE_YELLOW,
    PALETTE_PURPLE,
    PALETTE_ORANGE,
];
const REVERSE_LEN: usize = 5;
const REVERSE_STEP: Duration = Duration::from_millis(600);

const FIELD_WIDTH: usize = 40;
const FIELD_HEIGHT: usize = 9;
const DISTRACTOR_COUNT: usize = 30;
const DISTRACTOR_A: Rgb = Rgb::new(126, 34, 206);
const DISTRACTOR_B: Rgb = Rgb::new(30, 41, 59);
const TRIGGER_MIN_MS: u64 = 1000;
const TRIGGER_MAX_MS: u64 = 3000;

const STROOP_COLORS: [NamedColor; 4] = [PALETTE_RED, PALETTE_BLUE, PALETTE_GREEN, PALETTE_YELLOW];

/// Watch five colors, then repeat them back to front.
pub struct ReverseMemory;

impl Challenge for ReverseMemory
{
    fn id(&self) -> &'static str
    {
        "reverse_memory"
    }

    fn title(&self) -> &'static str
    {
        "Repeat a color sequence in reverse"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let now = ctx.now;
        ctx.stop_timer();
        let sequence = random_sequence(ctx.rng(), &REVERSE_PALETTE, REVERSE_LEN);
        let target: Vec<NamedColor> = sequence.iter().rev().copied().collect();

        let mut choices: Vec<NamedColor> = Vec::new();
        for color in &sequence {
            if !choices.contains(color) {
                choices.push(*color);
            }
        }

        Box::new(SequenceRecall {
            reveal: Reveal::new(sequence.len(), REVERSE_STEP, now),
            sequence,
            target,
            choices,
            entered: Vec::new(),
            extra_secs: 0,
            watch_prompt: "Watch the sequence, then enter it in reverse:",
            answer_prompt: "Enter the sequence in reverse order:",
        })
    }
}

/// Press space once the center turns white, ignoring the noise around it.
pub struct DistractorReaction;

struct ReactionRound
{
    dots: Vec<(usize, usize, Rgb)>,
    trigger_at: Instant,
}

impl Challenge for DistractorReaction
{
    fn id(&self) -> &'static str
    {
        "distractor_reaction"
    }

    fn title(&self) -> &'static str
    {
        "React when the center turns white"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let now = ctx.now;
        let rng = ctx.rng();
        let dots = (0..DISTRACTOR_COUNT)
            .map(|i| {
                let color = if i % 2 == 1 { DISTRACTOR_A } else { DISTRACTOR_B };
                (rng.gen_range(0..FIELD_WIDTH), rng.gen_range(0..FIELD_HEIGHT), color)
            })
            .collect();
        let delay = Duration::from_millis(rng.gen_range(TRIGGER_MIN_MS..=TRIGGER_MAX_MS));
        Box::new(ReactionRound {
            dots,
            trigger_at: now + delay,
        })
    }
}

impl ActiveChallenge for ReactionRound
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        if matches!(key, KeyCode::Char(' ') | KeyCode::Enter) {
            ctx.end_with(ctx.now >= self.trigger_at);
        }
    }

    fn render(&self, surface: &mut Surface, now: Instant)
    {
        surface.display.push(Line::colored(
            "Press SPACE as soon as the center turns WHITE.",
            INSTRUCTION,
        ));
        surface.display.push(Line::default());

        let mut field = vec![vec![None; FIELD_WIDTH]; FIELD_HEIGHT];
        for (x, y, color) in &self.dots {
            field[*y][*x] = Some(*color);
        }

        let target = if now >= self.trigger_at { WHITE } else { DIM };
        let center_row = FIELD_HEIGHT / 2;
        let center_col = FIELD_WIDTH / 2 - 3;
        for (row_idx, row) in field.iter().enumerate() {
            let mut line = Line::default();
            let mut col = 0;
            while col < FIELD_WIDTH {
                if row_idx.abs_diff(center_row) <= 1 && col == center_col {
                    line.push(Span::swatch(6, target));
                    col += 6;
                    continue;
                }
                match row[col] {
                    Some(color) => line.push(Span::colored("•", color)),
                    None => line.push(Span::plain(" ")),
                }
                col += 1;
            }
            surface.display.push(line);
        }
    }
}

/// Two color words side by side; pick the side whose word names its own ink.
pub struct DualStroop;

struct DualStroopRound
{
    sides: [(NamedColor, NamedColor); 2],
    congruent: usize,
}

impl Challenge for DualStroop
{
    fn id(&self) -> &'static str
    {
        "dual_stroop"
    }

    fn title(&self) -> &'static str
    {
        "Pick the side whose word matches its color"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let rng = ctx.rng();
        let congruent = rng.gen_range(0..2);

        let matching = pick(rng, &STROOP_COLORS);
        let clashing_ink = pick(rng, &STROOP_COLORS);
        let mut clashing_word = pick(rng, &STROOP_COLORS);
        while clashing_word == clashing_ink {
            clashing_word = pick(rng, &STROOP_COLORS);
        }

        let mut sides = [(clashing_ink, clashing_word); 2];
        sides[congruent] = (matching, matching);
        Box::new(DualStroopRound { sides, congruent })
    }
}

impl ActiveChallenge for DualStroopRound
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        let chosen = match key {
            KeyCode::Left => Some(0),
            KeyCode::Right => Some(1),
            other => option_index(other, 2),
        };
        if let Some(side) = chosen {
            ctx.end_with(side == self.congruent);
        }
    }

    fn render(&self, surface: &mut Surface, _now: Instant)
    {
        surface.display.push(Line::colored(
            "Which word is written in its own color?",
            INSTRUCTION,
        ));
        surface.display.push(Line::default());

        let mut line = Line::default();
        for (idx, (ink, word)) in self.sides.iter().enumerate() {
            if idx > 0 {
                line.push(Span::plain("          "));
            }
            line.push(Span::colored(word.name, ink.rgb));
        }
        surface.display.push(line);

        surface.options.push(Line::plain("1) LEFT  (or ←)"));
        surface.options.push(Line::plain("2) RIGHT (or →)"));
    }
}
