use crate::controller::{GameEvent, RoundController, Scene};
use crate::tier::Tier;
use crate::ui::{self, Starfield, TerminalGuard, ViewState};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const TICK_MS: u64 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow
{
    Continue,
    Quit,
}

/// Runs the interactive game until the player quits from the menu.
pub fn run<R: Rng + ?Sized>(controller: &mut RoundController, start_tier: Option<Tier>, rng: &mut R) -> Result<()>
{
    let mut term = TerminalGuard::enter().context("failed to prepare the terminal")?;
    let started = Instant::now();
    let mut view = ViewState {
        countdown: None,
        outcome: None,
        message: None,
        stars: Starfield::new(rng, started),
    };

    if let Some(tier) = start_tier {
        choose(controller, &mut view, tier, started);
    }

    let tick = Duration::from_millis(TICK_MS);
    let mut last_tick = started.checked_sub(tick).unwrap_or(started);
    loop {
        let now = Instant::now();
        if poll_input(controller, &mut view, now)? == Flow::Quit {
            break;
        }

        controller.tick(now);
        observe(&mut view, controller.drain_events());

        if last_tick.elapsed() >= tick {
            let lines = ui::compose(controller, &view, now);
            ui::draw(term.stdout(), &lines).context("failed to draw the screen")?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    info!(totals = ?controller.totals(), "leaving game");
    Ok(())
}

fn poll_input(controller: &mut RoundController, view: &mut ViewState, now: Instant) -> Result<Flow>
{
    while event::poll(Duration::from_millis(0)).context("failed to poll input")? {
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read().context("failed to read input")?
        {
            if kind == KeyEventKind::Release {
                continue;
            }
            if handle_key(controller, view, code, modifiers, now) == Flow::Quit {
                return Ok(Flow::Quit);
            }
            observe(view, controller.drain_events());
        }
    }
    Ok(Flow::Continue)
}

fn handle_key(
    controller: &mut RoundController,
    view: &mut ViewState,
    code: KeyCode,
    modifiers: KeyModifiers,
    now: Instant,
) -> Flow
{
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Flow::Quit;
    }

    match controller.scene() {
        Scene::TierSelect => match code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char(ch) => {
                if let Some(tier) = ch
                    .to_digit(10)
                    .and_then(|digit| Tier::ALL.get((digit as usize).wrapping_sub(1)).copied())
                {
                    choose(controller, view, tier, now);
                }
            }
            _ => {}
        },
        Scene::RoundActive => match code {
            KeyCode::Esc => controller.return_to_menu(),
            _ => controller.handle_key(code, now),
        },
        Scene::RoundResult(_) => match code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Err(err) = controller.continue_run(now) {
                    view.message = Some(err.to_string());
                    controller.return_to_menu();
                }
            }
            KeyCode::Esc | KeyCode::Char('m') => controller.return_to_menu(),
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        },
    }
    Flow::Continue
}

fn choose(controller: &mut RoundController, view: &mut ViewState, tier: Tier, now: Instant)
{
    if let Err(err) = controller.choose(tier, now) {
        debug!(%tier, error = %err, "tier not playable");
        view.message = Some(err.to_string());
    }
}

fn observe(view: &mut ViewState, events: Vec<GameEvent>)
{
    for event in events {
        match event {
            GameEvent::TimerTick(display) => view.countdown = Some(display),
            GameEvent::TimerStopped => view.countdown = None,
            GameEvent::SceneChanged(Scene::TierSelect) => {
                view.countdown = None;
                view.outcome = None;
            }
            GameEvent::SceneChanged(Scene::RoundActive) => {
                view.message = None;
                view.outcome = None;
            }
            GameEvent::SceneChanged(Scene::RoundResult(_)) => {}
            GameEvent::Outcome(summary) => {
                info!(
                    result = ?summary.result,
                    success = summary.result.is_success(),
                    points = summary.points_earned,
                    total = summary.totals.total(),
                    "round finished"
                );
                view.outcome = Some(summary);
            }
        }
    }
}
