//! Round controller: progression, timeouts, unlocks and stale callbacks.

use super::*;
use crate::challenges::Challenge;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

type DispatchLog = Rc<RefCell<Vec<&'static str>>>;

/// Answers through keys: `y` succeeds, `n` fails, `d` reports twice,
/// `t` restarts the countdown with 20 seconds, `s` stops it.
struct Scripted
{
    id: &'static str,
    log: DispatchLog,
}

struct ScriptedRound;

impl Challenge for Scripted
{
    fn id(&self) -> &'static str
    {
        self.id
    }

    fn title(&self) -> &'static str
    {
        "scripted"
    }

    fn run(&self, _ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
    {
        self.log.borrow_mut().push(self.id);
        Box::new(ScriptedRound)
    }
}

impl ActiveChallenge for ScriptedRound
{
    fn on_key(&mut self, key: KeyCode, ctx: &mut ChallengeContext<'_>)
    {
        match key {
            KeyCode::Char('y') => ctx.end_with(true),
            KeyCode::Char('n') => ctx.end_with(false),
            KeyCode::Char('d') => {
                ctx.end_with(true);
                ctx.end_with(true);
            }
            KeyCode::Char('t') => ctx.start_timer(Some(20)),
            KeyCode::Char('s') => ctx.stop_timer(),
            _ => {}
        }
    }

    fn render(&self, surface: &mut Surface, _now: Instant)
    {
        surface.display.push(crate::challenges::Line::plain("scripted"));
    }
}

fn registry_with(tiers: &[Tier], ids: &[&'static str], log: &DispatchLog) -> ChallengeRegistry
{
    let mut registry = ChallengeRegistry::new();
    for tier in tiers {
        for id in ids {
            registry
                .register(
                    *tier,
                    Box::new(Scripted {
                        id: *id,
                        log: Rc::clone(log),
                    }),
                )
                .unwrap();
        }
    }
    registry
}

fn controller() -> (RoundController, DispatchLog)
{
    let log = DispatchLog::default();
    let registry = registry_with(&Tier::ALL, &["alpha", "beta"], &log);
    let controller = RoundController::new(
        ExperienceStore::in_memory(),
        registry,
        StdRng::seed_from_u64(42),
    );
    (controller, log)
}

fn level(controller: &RoundController) -> u32
{
    controller.round().map(|round| round.level).unwrap()
}

// -----------------------------------------------------------------------------
// Progression
// -----------------------------------------------------------------------------

#[test]
fn test_three_successes_complete_tier()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    assert_eq!(game.scene(), Scene::RoundActive);
    assert_eq!(level(&game), 1);

    game.end_with(true);
    assert_eq!(
        game.scene(),
        Scene::RoundResult(RoundResult::LevelCleared {
            tier: Tier::Easy,
            next_level: 2
        })
    );
    assert_eq!(level(&game), 2);
    assert_eq!(game.totals().easy, 10);

    game.continue_run(now).unwrap();
    game.end_with(true);
    assert_eq!(level(&game), 3);
    assert_eq!(game.totals().easy, 20);

    game.continue_run(now).unwrap();
    game.end_with(true);
    assert_eq!(
        game.scene(),
        Scene::RoundResult(RoundResult::TierCompleted { tier: Tier::Easy })
    );
    assert_eq!(level(&game), 1);
    assert_eq!(game.totals().easy, 30);
    assert_eq!(game.totals().total(), 30);
}

#[test]
fn test_failure_resets_level_without_points()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.end_with(true);
    game.continue_run(now).unwrap();
    assert_eq!(level(&game), 2);

    game.end_with(false);
    assert_eq!(
        game.scene(),
        Scene::RoundResult(RoundResult::Failed {
            tier: Tier::Easy,
            cause: FailureCause::WrongAnswer
        })
    );
    assert_eq!(level(&game), 1);
    assert_eq!(game.totals().easy, 10);

    game.continue_run(now).unwrap();
    assert_eq!(game.scene(), Scene::RoundActive);
    assert_eq!(level(&game), 1);
}

#[test]
fn test_keys_reach_running_challenge()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.handle_key(KeyCode::Char('x'), now);
    assert_eq!(game.scene(), Scene::RoundActive);

    game.handle_key(KeyCode::Char('y'), now);
    assert!(matches!(game.scene(), Scene::RoundResult(result) if result.is_success()));

    game.handle_key(KeyCode::Char('y'), now);
    assert_eq!(game.totals().easy, 10);
}

#[test]
fn test_outcome_event_reports_points_and_totals()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.drain_events();

    game.handle_key(KeyCode::Char('y'), now);
    let events = game.drain_events();
    let outcome = events
        .iter()
        .find_map(|event| match event {
            GameEvent::Outcome(summary) => Some(*summary),
            _ => None,
        })
        .unwrap();
    assert_eq!(outcome.points_earned, POINTS_PER_ROUND);
    assert_eq!(outcome.totals.total(), 10);
    assert!(events.iter().any(|event| matches!(event, GameEvent::SceneChanged(Scene::RoundResult(_)))));
}

#[test]
fn test_dispatch_records_last_challenge()
{
    let (mut game, log) = controller();
    let now = Instant::now();
    game.choose(Tier::Medium, now).unwrap_err();
    game.choose(Tier::Easy, now).unwrap();
    for _ in 0..5 {
        let last = *log.borrow().last().unwrap();
        assert_eq!(game.round().unwrap().last_challenge_id, Some(last));
        game.end_with(false);
        game.continue_run(now).unwrap();
    }
    assert_eq!(log.borrow().len(), 6);
}

// -----------------------------------------------------------------------------
// Timer wiring
// -----------------------------------------------------------------------------

#[test]
fn test_timeout_fails_round()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Hard, now).unwrap_err();
    game.choose(Tier::Easy, now).unwrap();
    game.end_with(true);
    game.continue_run(now).unwrap();

    game.tick(now + Duration::from_secs(9));
    assert_eq!(game.scene(), Scene::RoundActive);
    assert_eq!(game.countdown().map(|c| c.remaining), Some(1));

    game.tick(now + Duration::from_secs(10));
    assert_eq!(
        game.scene(),
        Scene::RoundResult(RoundResult::Failed {
            tier: Tier::Easy,
            cause: FailureCause::TimedOut
        })
    );
    assert_eq!(level(&game), 1);
    assert_eq!(game.totals().easy, 10);
    assert!(game.countdown().is_none());
}

#[test]
fn test_tick_events_count_down()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    let initial: Vec<_> = game
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            GameEvent::TimerTick(display) => Some(display.remaining),
            _ => None,
        })
        .collect();
    assert_eq!(initial, vec![10]);

    game.tick(now + Duration::from_secs(3));
    let ticks: Vec<_> = game
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            GameEvent::TimerTick(display) => Some(display.remaining),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![9, 8, 7]);
}

#[test]
fn test_finished_round_timer_never_fires()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.end_with(true);

    game.tick(now + Duration::from_secs(60));
    assert!(matches!(
        game.scene(),
        Scene::RoundResult(RoundResult::LevelCleared { .. })
    ));
    assert_eq!(level(&game), 2);
}

#[test]
fn test_challenge_can_extend_countdown()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.handle_key(KeyCode::Char('t'), now + Duration::from_secs(5));

    game.tick(now + Duration::from_secs(15));
    assert_eq!(game.scene(), Scene::RoundActive);
    game.tick(now + Duration::from_secs(25));
    assert!(matches!(
        game.scene(),
        Scene::RoundResult(RoundResult::Failed {
            cause: FailureCause::TimedOut,
            ..
        })
    ));
}

#[test]
fn test_challenge_can_hold_countdown()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Hard, now).unwrap_err();
    game.choose(Tier::Easy, now).unwrap();
    game.drain_events();

    game.handle_key(KeyCode::Char('s'), now);
    assert_eq!(game.drain_events(), vec![GameEvent::TimerStopped]);
    assert!(game.countdown().is_none());

    game.handle_key(KeyCode::Char('s'), now);
    assert!(game.drain_events().is_empty());

    game.tick(now + Duration::from_secs(60));
    assert_eq!(game.scene(), Scene::RoundActive);
}

#[test]
fn test_return_to_menu_cancels_round()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.return_to_menu();
    assert_eq!(game.scene(), Scene::TierSelect);
    assert!(game.round().is_none());
    assert!(game.countdown().is_none());

    game.drain_events();
    game.tick(now + Duration::from_secs(30));
    assert!(game.drain_events().is_empty());
    assert_eq!(game.scene(), Scene::TierSelect);
}

// -----------------------------------------------------------------------------
// Guards
// -----------------------------------------------------------------------------

#[test]
fn test_second_completion_is_ignored()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    game.choose(Tier::Easy, now).unwrap();
    game.handle_key(KeyCode::Char('d'), now);
    assert_eq!(game.totals().easy, 10);
    assert_eq!(level(&game), 2);

    game.end_with(true);
    game.end_with(false);
    assert_eq!(game.totals().easy, 10);
    assert_eq!(level(&game), 2);
}

#[test]
fn test_locked_tiers_rejected_until_threshold()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    let err = game.choose(Tier::Medium, now).unwrap_err();
    assert!(matches!(
        err,
        GameError::TierLocked {
            tier: Tier::Medium,
            gate: Tier::Easy,
            required: 150,
            have: 0
        }
    ));
    assert_eq!(game.scene(), Scene::TierSelect);

    game.store.award(Tier::Easy, 150).unwrap();
    assert!(game.is_unlocked(Tier::Medium));
    assert!(!game.is_unlocked(Tier::Hard));
    game.choose(Tier::Medium, now).unwrap();
    assert_eq!(game.round().unwrap().time_limit, 7);

    game.return_to_menu();
    game.store.award(Tier::Medium, 250).unwrap();
    game.choose(Tier::Hard, now).unwrap();
    assert_eq!(game.round().unwrap().time_limit, 5);
}

#[test]
fn test_empty_tier_returns_to_select()
{
    let log = DispatchLog::default();
    let registry = registry_with(&[Tier::Easy], &["alpha"], &log);
    let mut store = ExperienceStore::in_memory();
    store.award(Tier::Easy, 200).unwrap();
    let mut game = RoundController::new(store, registry, StdRng::seed_from_u64(1));

    let err = game.choose(Tier::Medium, Instant::now()).unwrap_err();
    assert!(matches!(err, GameError::NoChallengesAvailable(Tier::Medium)));
    assert_eq!(game.scene(), Scene::TierSelect);
    assert!(game.round().is_none());
}

#[test]
fn test_invalid_transitions_rejected()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    assert!(matches!(
        game.continue_run(now),
        Err(GameError::InvalidTransition { .. })
    ));

    game.choose(Tier::Easy, now).unwrap();
    assert!(matches!(
        game.choose(Tier::Easy, now),
        Err(GameError::InvalidTransition { .. })
    ));
    assert!(matches!(
        game.continue_run(now),
        Err(GameError::InvalidTransition { .. })
    ));
}

#[test]
fn test_render_only_while_active()
{
    let (mut game, _) = controller();
    let now = Instant::now();
    let mut surface = Surface::default();
    game.render_challenge(&mut surface, now);
    assert!(surface.display.is_empty());

    game.choose(Tier::Easy, now).unwrap();
    game.render_challenge(&mut surface, now);
    assert_eq!(surface.display.len(), 1);
}
