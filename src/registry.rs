use crate::challenges::Challenge;
use crate::error::GameError;
use crate::tier::Tier;
use rand::Rng;
use std::collections::HashMap;
use tracing::debug;

/// Draws made to avoid repeating the previous challenge before giving up.
pub const PICK_ATTEMPTS: usize = 10;

#[derive(Default)]
pub struct ChallengeRegistry
{
    pools: HashMap<Tier, Vec<Box<dyn Challenge>>>,
}

impl ChallengeRegistry
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn register(&mut self, tier: Tier, challenge: Box<dyn Challenge>) -> Result<(), GameError>
    {
        let id = challenge.id();
        let pool = self.pools.entry(tier).or_default();
        if pool.iter().any(|existing| existing.id() == id) {
            return Err(GameError::DuplicateId { tier, id });
        }
        debug!(%tier, id, "registered challenge");
        pool.push(challenge);
        Ok(())
    }

    pub fn challenges(&self, tier: Tier) -> &[Box<dyn Challenge>]
    {
        self.pools.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, tier: Tier) -> usize
    {
        self.challenges(tier).len()
    }

    /// Uniform draw that retries up to [`PICK_ATTEMPTS`] times while it lands
    /// on `exclude`. The last draw is returned even if it still collides.
    pub fn pick_random<R: Rng + ?Sized>(
        &self,
        tier: Tier,
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Option<&dyn Challenge>
    {
        let pool = self.challenges(tier);
        if pool.is_empty() {
            return None;
        }

        let mut pick = &pool[0];
        for _ in 0..PICK_ATTEMPTS {
            pick = &pool[rng.gen_range(0..pool.len())];
            if exclude != Some(pick.id()) {
                break;
            }
        }
        Some(pick.as_ref())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::challenges::{ActiveChallenge, ChallengeContext, Surface};
    use crossterm::event::KeyCode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Instant;

    struct Named(&'static str);

    struct Idle;

    impl ActiveChallenge for Idle
    {
        fn on_key(&mut self, _key: KeyCode, _ctx: &mut ChallengeContext<'_>) {}

        fn render(&self, _surface: &mut Surface, _now: Instant) {}
    }

    impl Challenge for Named
    {
        fn id(&self) -> &'static str
        {
            self.0
        }

        fn title(&self) -> &'static str
        {
            "test challenge"
        }

        fn run(&self, _ctx: &mut ChallengeContext<'_>) -> Box<dyn ActiveChallenge>
        {
            Box::new(Idle)
        }
    }

    #[test]
    fn test_duplicate_id_rejected_within_tier()
    {
        let mut registry = ChallengeRegistry::new();
        registry.register(Tier::Easy, Box::new(Named("a"))).unwrap();
        let err = registry.register(Tier::Easy, Box::new(Named("a"))).unwrap_err();
        assert!(matches!(err, GameError::DuplicateId { tier: Tier::Easy, id: "a" }));
        assert_eq!(registry.len(Tier::Easy), 1);
    }

    #[test]
    fn test_same_id_allowed_across_tiers()
    {
        let mut registry = ChallengeRegistry::new();
        registry.register(Tier::Easy, Box::new(Named("a"))).unwrap();
        registry.register(Tier::Hard, Box::new(Named("a"))).unwrap();
        assert_eq!(registry.len(Tier::Hard), 1);
    }

    #[test]
    fn test_registration_order_preserved()
    {
        let mut registry = ChallengeRegistry::new();
        for id in ["c", "a", "b"] {
            registry.register(Tier::Medium, Box::new(Named(id))).unwrap();
        }
        let ids: Vec<_> = registry.challenges(Tier::Medium).iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_pick_random_none_iff_empty()
    {
        let mut rng = StdRng::seed_from_u64(1);
        let mut registry = ChallengeRegistry::new();
        assert!(registry.pick_random(Tier::Easy, None, &mut rng).is_none());

        registry.register(Tier::Easy, Box::new(Named("a"))).unwrap();
        for _ in 0..100 {
            assert!(registry.pick_random(Tier::Easy, None, &mut rng).is_some());
            assert!(registry.pick_random(Tier::Easy, Some("a"), &mut rng).is_some());
        }
        assert!(registry.pick_random(Tier::Medium, None, &mut rng).is_none());
    }

    #[test]
    fn test_single_entry_returned_despite_exclusion()
    {
        let mut rng = StdRng::seed_from_u64(2);
        let mut registry = ChallengeRegistry::new();
        registry.register(Tier::Hard, Box::new(Named("only"))).unwrap();
        let pick = registry.pick_random(Tier::Hard, Some("only"), &mut rng).unwrap();
        assert_eq!(pick.id(), "only");
    }

    #[test]
    fn test_two_entries_exclusion_avoids_previous()
    {
        let mut rng = StdRng::seed_from_u64(3);
        let mut registry = ChallengeRegistry::new();
        registry.register(Tier::Easy, Box::new(Named("a"))).unwrap();
        registry.register(Tier::Easy, Box::new(Named("b"))).unwrap();

        let draws = 1000;
        let others = (0..draws)
            .filter(|_| registry.pick_random(Tier::Easy, Some("a"), &mut rng).unwrap().id() == "b")
            .count();
        // A miss needs ten straight collisions (p = 1/1024).
        assert!(others >= 990, "only {others} of {draws} draws avoided the excluded id");
    }

    #[test]
    fn test_unexcluded_draws_cover_pool()
    {
        let mut rng = StdRng::seed_from_u64(4);
        let mut registry = ChallengeRegistry::new();
        for id in ["a", "b", "c"] {
            registry.register(Tier::Easy, Box::new(Named(id))).unwrap();
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(registry.pick_random(Tier::Easy, None, &mut rng).unwrap().id());
        }
        assert_eq!(seen.len(), 3);
    }
}
