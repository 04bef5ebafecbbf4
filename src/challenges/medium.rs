use super::common::{INSTRUCTION, option_index, pick};
use super::{ActiveChallenge, Challenge, ChallengeContext, Line, Span, Surface};
use crate::color::{
    GREEN, NamedColor, PALETTE_BLUE, PALETTE_GREEN, PALETTE_RED, PALETTE_YELLOW, WHITE, hsl,
};
use crossterm::event::KeyCode;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Instant;

const GRID_COLUMNS: usize = 6;
const GRID_CELLS: usize = 24;
const ODD_HUE_SHIFT: f32 = 25.0;

const ORDER_MAX: u32 = 9;
const ORDER_COLUMNS: usize = 3;

const RULE_COLORS: [NamedColor; 4] = [PALETTE_RED, PALETTE_BLUE, PALETTE_GREEN, PALETTE_YELLOW];
const RULE_CONFLICT_CHANCE: f64 = 0.6;

/// Find the one cell whose hue is slightly off.
pub struct OddOneOut;

struct HueGrid
{
    base_hue: f32,
    special: usize,
}

impl Challenge for OddOneOut
{
    fn id(&self) -> &'static str
    {
        "odd_one_out"
    }

    fn title(&self) -> &'static str
    {
        "Find the cell with a different shade"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let rng = ctx.rng();
        Box::new(HueGrid {
            base_hue: rng.gen_range(0..360) as f32,
            special: rng.gen_range(0..GRID_CELLS),
        })
    }
}

fn cell_label(index: usize) -> char
{
    (b'a' + index as u8) as char
}

fn cell_index(key: KeyCode) -> Option<usize>
{
    match key {
        KeyCode::Char(ch) if ch.is_ascii_alphabetic() => {
            let index = (ch.to_ascii_lowercase() as u8 - b'a') as usize;
            (index < GRID_CELLS).then_some(index)
        }
        _ => None,
    }
}

impl HueGrid
{
    fn hue_of(&self, index: usize) -> f32
    {
        if index == self.special {
            (self.base_hue + ODD_HUE_SHIFT) % 360.0
        } else {
            self.base_hue
        }
    }
}

impl ActiveChallenge for HueGrid
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        if let Some(index) = cell_index(key) {
            ctx.end_with(index == self.special);
        }
    }

    fn render(&self, surface: &mut Surface, _now: Instant)
    {
        surface.display.push(Line::colored(
            "Press the letter of the cell with a different color.",
            INSTRUCTION,
        ));
        surface.display.push(Line::default());
        for row_start in (0..GRID_CELLS).step_by(GRID_COLUMNS) {
            let mut cells = Line::default();
            let mut labels = Line::default();
            for index in row_start..row_start + GRID_COLUMNS {
                cells.push(Span::swatch(4, hsl(self.hue_of(index), 0.7, 0.5)));
                cells.push(Span::plain(" "));
                labels.push(Span::plain(format!(" {}   ", cell_label(index))));
            }
            surface.display.push(cells);
            surface.display.push(labels);
        }
    }
}

/// Press 1 to 9 in ascending order, reading them off a shuffled grid.
pub struct NumberOrder;

struct OrderGrid
{
    numbers: Vec<u32>,
    expecting: u32,
}

impl Challenge for NumberOrder
{
    fn id(&self) -> &'static str
    {
        "number_order"
    }

    fn title(&self) -> &'static str
    {
        "Press the numbers in ascending order"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let mut numbers: Vec<u32> = (1..=ORDER_MAX).collect();
        numbers.shuffle(ctx.rng());
        Box::new(OrderGrid {
            numbers,
            expecting: 1,
        })
    }
}

impl ActiveChallenge for OrderGrid
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        let KeyCode::Char(ch) = key else {
            return;
        };
        let Some(number) = ch.to_digit(10).filter(|n| *n >= 1) else {
            return;
        };
        if number != self.expecting {
            ctx.end_with(false);
            return;
        }
        self.expecting += 1;
        if self.expecting > ORDER_MAX {
            ctx.end_with(true);
        }
    }

    fn render(&self, surface: &mut Surface, _now: Instant)
    {
        surface.display.push(Line::colored(
            format!("Press 1 to {ORDER_MAX} in order."),
            INSTRUCTION,
        ));
        surface.display.push(Line::default());
        for row in self.numbers.chunks(ORDER_COLUMNS) {
            let mut line = Line::default();
            for number in row {
                let text = format!(" [{number}] ");
                if *number < self.expecting {
                    line.push(Span::colored(text, GREEN));
                } else {
                    line.push(Span::colored(text, WHITE));
                }
            }
            surface.display.push(line);
        }
    }
}

/// Even rule number: pick the ink color. Odd: pick the written word.
pub struct DualRule;

struct RuleRound
{
    rule: u32,
    ink: NamedColor,
    word: NamedColor,
    options: Vec<NamedColor>,
}

impl Challenge for DualRule
{
    fn id(&self) -> &'static str
    {
        "dual_rule"
    }

    fn title(&self) -> &'static str
    {
        "Even picks the ink, odd picks the word"
    }

    fn run(&self, ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        let rng = ctx.rng();
        let rule = rng.gen_range(1..=9);
        let ink = pick(rng, &RULE_COLORS);
        let mut word = pick(rng, &RULE_COLORS);
        if rng.gen_bool(RULE_CONFLICT_CHANCE) {
            while word == ink {
                word = pick(rng, &RULE_COLORS);
            }
        }
        let mut options = RULE_COLORS.to_vec();
        options.shuffle(rng);
        Box::new(RuleRound {
            rule,
            ink,
            word,
            options,
        })
    }
}

impl RuleRound
{
    fn answer(&self) -> NamedColor
    {
        if self.rule % 2 == 0 { self.ink } else { self.word }
    }
}

impl ActiveChallenge for RuleRound
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        if let Some(index) = option_index(key, self.options.len()) {
            ctx.end_with(self.options[index] == self.answer());
        }
    }

    fn render(&self, surface: &mut Surface, _now: Instant)
    {
        let rule = if self.rule % 2 == 0 {
            "EVEN: pick the COLOR"
        } else {
            "ODD: pick the WORD"
        };
        surface
            .display
            .push(Line::colored(format!("Number {}: {rule}", self.rule), INSTRUCTION));
        surface.display.push(Line::default());
        surface.display.push(Line::colored(self.word.name, self.ink.rgb));

        for (idx, color) in self.options.iter().enumerate() {
            let mut line = Line::plain(format!("{}) ", idx + 1));
            line.push(Span::colored(color.name, color.rgb));
            surface.options.push(line);
        }
    }
}
