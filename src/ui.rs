use crate::challenges::{Line, Span, Surface};
use crate::color::{
    DIM, GRAY, GREEN, PURPLE, RED, Rgb, WHITE, YELLOW, ansi_background, ansi_color, lerp_color,
};
use crate::controller::{FailureCause, MAX_LEVELS, OutcomeSummary, RoundController, RoundResult, Scene};
use crate::store::ExperienceRecord;
use crate::tier::Tier;
use crate::timer::{CountdownDisplay, Urgency};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use rand::Rng;
use std::io::{self, Stdout, Write};
use std::time::Instant;

const BAR_WIDTH: usize = 20;
const XP_BAR_SPAN: u64 = 100;
const STAR_COUNT: usize = 100;
const STAR_FIELD_WIDTH: usize = 60;
const STAR_FIELD_HEIGHT: usize = 5;
const TWINKLE_MS: u128 = 2000;

const TIMER_NORMAL: Rgb = Rgb::new(126, 34, 206);
const TIMER_WARNING: Rgb = Rgb::new(234, 179, 8);
const TIMER_CRITICAL: Rgb = Rgb::new(239, 68, 68);

pub struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    pub fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    pub fn stdout(&mut self) -> &mut Stdout
    {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

struct Star
{
    x: usize,
    y: usize,
    phase_ms: u128,
}

/// Twinkling background for the tier menu.
pub struct Starfield
{
    stars: Vec<Star>,
    started: Instant,
}

impl Starfield
{
    pub fn new<R: Rng + ?Sized>(rng: &mut R, now: Instant) -> Self
    {
        let stars = (0..STAR_COUNT)
            .map(|_| Star {
                x: rng.gen_range(0..STAR_FIELD_WIDTH),
                y: rng.gen_range(0..STAR_FIELD_HEIGHT),
                phase_ms: rng.gen_range(0..TWINKLE_MS),
            })
            .collect();
        Self { stars, started: now }
    }

    fn lines(&self, now: Instant) -> Vec<Line>
    {
        let elapsed = now.saturating_duration_since(self.started).as_millis();
        let mut field: Vec<Vec<Option<Rgb>>> = vec![vec![None; STAR_FIELD_WIDTH]; STAR_FIELD_HEIGHT];
        for star in &self.stars {
            let pos = (elapsed + star.phase_ms) % TWINKLE_MS;
            let half = TWINKLE_MS / 2;
            let distance = if pos < half { pos } else { TWINKLE_MS - pos };
            let level = distance as f32 / half as f32;
            field[star.y][star.x] = Some(lerp_color(DIM, WHITE, level));
        }
        field
            .into_iter()
            .map(|row| {
                let mut line = Line::default();
                for cell in row {
                    match cell {
                        Some(color) => line.push(Span::colored("·", color)),
                        None => line.push(Span::plain(" ")),
                    }
                }
                line
            })
            .collect()
    }
}

/// Presentation state fed from controller events.
pub struct ViewState
{
    pub countdown: Option<CountdownDisplay>,
    pub outcome: Option<OutcomeSummary>,
    pub message: Option<String>,
    pub stars: Starfield,
}

pub fn urgency_color(urgency: Urgency) -> Rgb
{
    match urgency {
        Urgency::Normal => TIMER_NORMAL,
        Urgency::Warning => TIMER_WARNING,
        Urgency::Critical => TIMER_CRITICAL,
    }
}

fn bar(fraction: f32, width: usize, color: Rgb) -> Line
{
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    let mut line = Line::plain("[");
    line.push(Span::colored("█".repeat(filled), color));
    line.push(Span::colored("·".repeat(width - filled), DIM));
    line.push(Span::plain("]"));
    line
}

fn header(controller: &RoundController, totals: &ExperienceRecord) -> Vec<Line>
{
    let mut lines = Vec::new();
    let mut title = Line::colored("REFLEX ORION", PURPLE);
    title.push(Span::plain(format!("    XP: {}", totals.total())));
    lines.push(title);

    let mut xp = Line::colored("XP   ", GRAY);
    let progress = totals.total() % XP_BAR_SPAN;
    xp.spans
        .extend(bar(progress as f32 / XP_BAR_SPAN as f32, BAR_WIDTH, PURPLE).spans);
    xp.push(Span::plain(format!(" {progress}/{XP_BAR_SPAN}")));
    lines.push(xp);

    if let Some(round) = controller.round() {
        let mut stage = Line::colored(format!("{:<14}", round.tier.stage_name()), round.tier.stage_color());
        stage.push(Span::plain(format!("Level {}/{}  ", round.level, round.max_levels)));
        stage
            .spans
            .extend(bar(round.level as f32 / round.max_levels as f32, MAX_LEVELS as usize * 4, GREEN).spans);
        lines.push(stage);
    }
    lines.push(Line::default());
    lines
}

fn tier_menu(controller: &RoundController, totals: &ExperienceRecord, view: &ViewState, now: Instant) -> Vec<Line>
{
    let mut lines = view.stars.lines(now);
    lines.push(Line::default());
    lines.push(Line::plain("Choose a difficulty:"));
    lines.push(Line::default());

    for (idx, tier) in Tier::ALL.iter().enumerate() {
        let mut line = Line::plain(format!("  {}) ", idx + 1));
        line.push(Span::colored(
            format!("{:<8}{:<15}", tier.as_str().to_uppercase(), tier.stage_name()),
            tier.stage_color(),
        ));
        line.push(Span::plain(format!(
            "{:>3}s per challenge  {:>5} XP  ",
            tier.time_limit_secs(),
            totals.get(*tier)
        )));
        match tier.unlock_requirement() {
            Some(req) if !controller.is_unlocked(*tier) => line.push(Span::colored(
                format!(
                    "LOCKED: needs {} {} XP (have {})",
                    req.points,
                    req.tier.as_str().to_uppercase(),
                    totals.get(req.tier)
                ),
                GRAY,
            )),
            _ => line.push(Span::colored("unlocked", GREEN)),
        }
        lines.push(line);
    }

    lines.push(Line::default());
    lines.push(Line::colored("Controls: 1-3 choose a tier, q/ESC quit", GRAY));
    lines
}

fn round_screen(controller: &RoundController, view: &ViewState, now: Instant) -> Vec<Line>
{
    let mut lines = Vec::new();
    if let Some(countdown) = view.countdown {
        let color = urgency_color(countdown.urgency());
        let mut line = Line::plain("Time ");
        line.spans.extend(bar(countdown.fraction(), BAR_WIDTH, color).spans);
        line.push(Span::colored(format!(" {:>2}s", countdown.remaining), color));
        lines.push(line);
    }
    lines.push(Line::default());

    let mut surface = Surface::default();
    controller.render_challenge(&mut surface, now);
    lines.extend(surface.display);
    if !surface.options.is_empty() {
        lines.push(Line::default());
        lines.extend(surface.options);
    }

    lines.push(Line::default());
    lines.push(Line::colored("Controls: answer with the keys shown, ESC back to menu", GRAY));
    lines
}

fn result_screen(result: RoundResult, view: &ViewState, totals: &ExperienceRecord) -> Vec<Line>
{
    let mut lines = Vec::new();
    let total = view.outcome.map(|outcome| outcome.totals.total()).unwrap_or(totals.total());
    let earned = view.outcome.map(|outcome| outcome.points_earned).unwrap_or(0);
    match result {
        RoundResult::LevelCleared { next_level, .. } => {
            lines.push(Line::colored("CORRECT!", GREEN));
            lines.push(Line::default());
            lines.push(Line::plain(format!("+{earned} XP! Total: {total} XP")));
            lines.push(Line::plain(format!("Next up: level {next_level}/{MAX_LEVELS}")));
        }
        RoundResult::TierCompleted { tier } => {
            lines.push(Line::colored("COMPLETED!", PURPLE));
            lines.push(Line::default());
            lines.push(Line::plain(format!("Congratulations! You cleared {}.", tier.stage_name())));
            lines.push(Line::plain(format!("Total XP: {total}")));
            lines.push(Line::plain("Keep going to unlock new tiers!"));
        }
        RoundResult::Failed { cause, .. } => {
            let title = match cause {
                FailureCause::WrongAnswer => "MISSED!",
                FailureCause::TimedOut => "TIME'S UP!",
            };
            lines.push(Line::colored(title, RED));
            lines.push(Line::default());
            lines.push(Line::plain("Try again! A new challenge is on its way."));
        }
    }
    lines.push(Line::default());
    let next = match result {
        RoundResult::LevelCleared { .. } => "next challenge",
        RoundResult::TierCompleted { .. } => "play again",
        RoundResult::Failed { .. } => "retry",
    };
    lines.push(Line::colored(format!("Controls: ENTER/SPACE {next}, m/ESC menu, q quit"), GRAY));
    lines
}

/// Lines for the whole screen in the controller's current scene.
pub fn compose(controller: &RoundController, view: &ViewState, now: Instant) -> Vec<Line>
{
    let totals = controller.totals();
    let mut lines = header(controller, &totals);
    match controller.scene() {
        Scene::TierSelect => lines.extend(tier_menu(controller, &totals, view, now)),
        Scene::RoundActive => lines.extend(round_screen(controller, view, now)),
        Scene::RoundResult(result) => lines.extend(result_screen(result, view, &totals)),
    }
    if let Some(message) = &view.message {
        lines.push(Line::default());
        lines.push(Line::colored(message.clone(), YELLOW));
    }
    lines
}

pub fn draw(stdout: &mut Stdout, lines: &[Line]) -> io::Result<()>
{
    let rendered: Vec<String> = lines.iter().map(render_line).collect();
    let output = format!("{}\r\n", rendered.join("\r\n"));

    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()
}

pub fn render_line(line: &Line) -> String
{
    let mut out = String::with_capacity(line.width() + 16);
    let mut active: (Option<Rgb>, Option<Rgb>) = (None, None);
    for span in &line.spans {
        let style = (span.color, span.background);
        if style != active {
            out.push_str("\x1b[0m");
            if let Some(color) = span.color {
                out.push_str(&ansi_color(color));
            }
            if let Some(background) = span.background {
                out.push_str(&ansi_background(background));
            }
            active = style;
        }
        out.push_str(&span.text);
    }
    if active != (None, None) {
        out.push_str("\x1b[0m");
    }
    out
}
