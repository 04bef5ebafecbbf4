//! Round progression: tier selection, challenge dispatch, timer lifecycle and
//! the success/failure bookkeeping that feeds the experience store.

use crate::challenges::{ActiveChallenge, ChallengeContext, ContextEffects, Surface, TimerCommand};
use crate::error::GameError;
use crate::registry::ChallengeRegistry;
use crate::store::{ExperienceRecord, ExperienceStore};
use crate::tier::Tier;
use crate::timer::{CountdownDisplay, RoundTimer, TimerEvent};
use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub const MAX_LEVELS: u32 = 3;
pub const POINTS_PER_ROUND: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause
{
    WrongAnswer,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult
{
    /// Level cleared; continuing plays `next_level`.
    LevelCleared { tier: Tier, next_level: u32 },
    /// Final level cleared; the run starts over at level 1.
    TierCompleted { tier: Tier },
    Failed { tier: Tier, cause: FailureCause },
}

impl RoundResult
{
    pub fn is_success(&self) -> bool
    {
        !matches!(self, RoundResult::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene
{
    TierSelect,
    RoundActive,
    RoundResult(RoundResult),
}

impl Scene
{
    fn describe(&self) -> &'static str
    {
        match self {
            Scene::TierSelect => "selecting a tier",
            Scene::RoundActive => "a round is running",
            Scene::RoundResult(_) => "showing a round result",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState
{
    pub tier: Tier,
    pub level: u32,
    pub max_levels: u32,
    pub time_limit: u32,
    pub last_challenge_id: Option<&'static str>,
}

impl RoundState
{
    fn new(tier: Tier) -> Self
    {
        Self {
            tier,
            level: 1,
            max_levels: MAX_LEVELS,
            time_limit: tier.time_limit_secs(),
            last_challenge_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSummary
{
    pub result: RoundResult,
    pub points_earned: u64,
    pub totals: ExperienceRecord,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent
{
    SceneChanged(Scene),
    TimerTick(CountdownDisplay),
    /// The running challenge paused the countdown.
    TimerStopped,
    Outcome(OutcomeSummary),
}

pub struct RoundController
{
    store: ExperienceStore,
    registry: ChallengeRegistry,
    timer: RoundTimer<u64>,
    rng: StdRng,
    scene: Scene,
    round: Option<RoundState>,
    active: Option<Box<dyn ActiveChallenge>>,
    generation: u64,
    events: Vec<GameEvent>,
}

impl RoundController
{
    pub fn new(store: ExperienceStore, registry: ChallengeRegistry, rng: StdRng) -> Self
    {
        Self {
            store,
            registry,
            timer: RoundTimer::new(),
            rng,
            scene: Scene::TierSelect,
            round: None,
            active: None,
            generation: 0,
            events: Vec::new(),
        }
    }

    pub fn scene(&self) -> Scene
    {
        self.scene
    }

    pub fn round(&self) -> Option<&RoundState>
    {
        self.round.as_ref()
    }

    pub fn totals(&self) -> ExperienceRecord
    {
        self.store.totals()
    }

    pub fn is_unlocked(&self, tier: Tier) -> bool
    {
        tier.is_unlocked(&self.store.totals())
    }

    pub fn countdown(&self) -> Option<CountdownDisplay>
    {
        self.timer.display()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent>
    {
        std::mem::take(&mut self.events)
    }

    /// Starts a run on `tier` at level 1.
    pub fn choose(&mut self, tier: Tier, now: Instant) -> Result<(), GameError>
    {
        if self.scene != Scene::TierSelect {
            return Err(self.invalid("choose a tier"));
        }
        let totals = self.store.totals();
        if let Some(req) = tier.unlock_requirement() {
            let have = totals.get(req.tier);
            if have < req.points {
                return Err(GameError::TierLocked {
                    tier,
                    gate: req.tier,
                    required: req.points,
                    have,
                });
            }
        }

        info!(%tier, "starting run");
        self.round = Some(RoundState::new(tier));
        self.dispatch(now)
    }

    /// Leaves a result screen: plays the next level, or retries from level 1.
    pub fn continue_run(&mut self, now: Instant) -> Result<(), GameError>
    {
        if !matches!(self.scene, Scene::RoundResult(_)) || self.round.is_none() {
            return Err(self.invalid("continue"));
        }
        self.dispatch(now)
    }

    /// Abandons whatever is running and goes back to tier selection.
    pub fn return_to_menu(&mut self)
    {
        if self.timer.stop() {
            debug!("stopped countdown on return to menu");
        }
        self.active = None;
        self.round = None;
        self.set_scene(Scene::TierSelect);
    }

    pub fn handle_key(&mut self, key: KeyCode, now: Instant)
    {
        if self.scene != Scene::RoundActive {
            return;
        }
        let Some(round) = self.round else {
            return;
        };
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let mut ctx = ChallengeContext::new(round.tier, round.level, round.time_limit, now, &mut self.rng);
        active.on_key(key, &mut ctx);
        let effects = ctx.into_effects();
        self.apply(effects, now);
    }

    /// Advances the countdown and lets the running challenge react to time passing.
    pub fn tick(&mut self, now: Instant)
    {
        for event in self.timer.advance(now) {
            match event {
                TimerEvent::Tick(display) => self.events.push(GameEvent::TimerTick(display)),
                TimerEvent::Expired(generation) => self.on_timeout(generation),
            }
        }

        if self.scene != Scene::RoundActive {
            return;
        }
        let Some(round) = self.round else {
            return;
        };
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let mut ctx = ChallengeContext::new(round.tier, round.level, round.time_limit, now, &mut self.rng);
        active.on_frame(&mut ctx);
        let effects = ctx.into_effects();
        self.apply(effects, now);
    }

    pub fn render_challenge(&self, surface: &mut Surface, now: Instant)
    {
        if let Some(active) = self.active.as_ref() {
            active.render(surface, now);
        }
    }

    /// Completion callback for the running challenge. Calls outside an
    /// active round are stale and ignored.
    pub fn end_with(&mut self, success: bool)
    {
        self.finish(success, FailureCause::WrongAnswer);
    }

    fn dispatch(&mut self, now: Instant) -> Result<(), GameError>
    {
        let Some(mut round) = self.round else {
            return Err(self.invalid("dispatch"));
        };

        let Some(challenge) =
            self.registry
                .pick_random(round.tier, round.last_challenge_id, &mut self.rng)
        else {
            warn!(tier = %round.tier, "no challenges registered, returning to tier select");
            self.return_to_menu();
            return Err(GameError::NoChallengesAvailable(round.tier));
        };

        self.generation += 1;
        round.last_challenge_id = Some(challenge.id());
        debug!(
            tier = %round.tier,
            level = round.level,
            challenge = challenge.id(),
            generation = self.generation,
            "dispatching challenge"
        );

        let display = self.timer.start(round.time_limit, now, self.generation);
        self.events.push(GameEvent::TimerTick(display));

        let mut ctx = ChallengeContext::new(round.tier, round.level, round.time_limit, now, &mut self.rng);
        let active = challenge.run(&mut ctx);
        let effects = ctx.into_effects();

        self.round = Some(round);
        self.active = Some(active);
        self.set_scene(Scene::RoundActive);
        self.apply(effects, now);
        Ok(())
    }

    fn apply(&mut self, effects: ContextEffects, now: Instant)
    {
        for command in effects.timer_commands {
            match command {
                TimerCommand::Start(seconds) => {
                    let display = self.timer.start(seconds, now, self.generation);
                    self.events.push(GameEvent::TimerTick(display));
                }
                TimerCommand::Stop => {
                    if self.timer.stop() {
                        self.events.push(GameEvent::TimerStopped);
                    }
                }
            }
        }
        if let Some(success) = effects.outcome {
            self.end_with(success);
        }
    }

    fn on_timeout(&mut self, generation: u64)
    {
        if generation != self.generation || self.scene != Scene::RoundActive {
            debug!(generation, current = self.generation, "discarding stale timeout");
            return;
        }
        info!("round timed out");
        self.finish(false, FailureCause::TimedOut);
    }

    fn finish(&mut self, success: bool, cause: FailureCause)
    {
        if self.scene != Scene::RoundActive {
            debug!(success, "ignoring completion outside an active round");
            return;
        }
        let Some(mut round) = self.round else {
            return;
        };

        self.timer.stop();
        self.active = None;

        let (result, points_earned) = if success {
            if let Err(err) = self.store.award(round.tier, POINTS_PER_ROUND) {
                error!(error = %err, "failed to persist experience award");
            }
            if round.level < round.max_levels {
                round.level += 1;
                let result = RoundResult::LevelCleared {
                    tier: round.tier,
                    next_level: round.level,
                };
                (result, POINTS_PER_ROUND)
            } else {
                info!(tier = %round.tier, "tier completed");
                round.level = 1;
                (RoundResult::TierCompleted { tier: round.tier }, POINTS_PER_ROUND)
            }
        } else {
            debug!(tier = %round.tier, level = round.level, ?cause, "round failed");
            round.level = 1;
            (RoundResult::Failed { tier: round.tier, cause }, 0)
        };

        self.round = Some(round);
        self.set_scene(Scene::RoundResult(result));
        self.events.push(GameEvent::Outcome(OutcomeSummary {
            result,
            points_earned,
            totals: self.store.totals(),
        }));
    }

    fn set_scene(&mut self, scene: Scene)
    {
        if self.scene != scene {
            debug!(from = ?self.scene, to = ?scene, "scene change");
        }
        self.scene = scene;
        self.events.push(GameEvent::SceneChanged(scene));
    }

    fn invalid(&self, action: &'static str) -> GameError
    {
        GameError::InvalidTransition {
            action,
            scene: self.scene.describe(),
        }
    }
}

#[cfg(test)]
mod tests;
