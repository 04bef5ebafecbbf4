mod backend;

pub use backend::{FileStore, KeyValueStore, MemoryStore};

use crate::error::GameError;
use crate::tier::Tier;
use serde::Serialize;
use tracing::{info, warn};

/// Per-tier experience totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExperienceRecord
{
    pub easy: u64,
    pub medium: u64,
    pub hard: u64,
}

impl ExperienceRecord
{
    pub fn get(&self, tier: Tier) -> u64
    {
        match tier {
            Tier::Easy => self.easy,
            Tier::Medium => self.medium,
            Tier::Hard => self.hard,
        }
    }

    pub fn total(&self) -> u64
    {
        self.easy + self.medium + self.hard
    }

    fn slot(&mut self, tier: Tier) -> &mut u64
    {
        match tier {
            Tier::Easy => &mut self.easy,
            Tier::Medium => &mut self.medium,
            Tier::Hard => &mut self.hard,
        }
    }
}

fn storage_key(tier: Tier) -> &'static str
{
    match tier {
        Tier::Easy => "reflex_xp_easy",
        Tier::Medium => "reflex_xp_medium",
        Tier::Hard => "reflex_xp_hard",
    }
}

/// Experience counters, loaded once and kept in step with the backend.
pub struct ExperienceStore
{
    backend: Box<dyn KeyValueStore>,
    record: ExperienceRecord,
}

impl ExperienceStore
{
    /// Loads every counter from `backend`. Unparsable counters count as zero;
    /// read failures are returned so a later award can't overwrite saved points.
    pub fn new(backend: impl KeyValueStore + 'static) -> Result<Self, GameError>
    {
        let backend: Box<dyn KeyValueStore> = Box::new(backend);
        let record = ExperienceRecord {
            easy: load(backend.as_ref(), Tier::Easy)?,
            medium: load(backend.as_ref(), Tier::Medium)?,
            hard: load(backend.as_ref(), Tier::Hard)?,
        };
        Ok(Self { backend, record })
    }

    pub fn in_memory() -> Self
    {
        Self {
            backend: Box::new(MemoryStore::default()),
            record: ExperienceRecord::default(),
        }
    }

    pub fn totals(&self) -> ExperienceRecord
    {
        self.record
    }

    pub fn award(&mut self, tier: Tier, amount: u64) -> Result<(), GameError>
    {
        let updated = self.record.get(tier).saturating_add(amount);
        self.backend.set(storage_key(tier), &updated.to_string())?;
        *self.record.slot(tier) = updated;
        info!(%tier, amount, total = updated, "awarded experience");
        Ok(())
    }

    pub fn reset_all(&mut self) -> Result<(), GameError>
    {
        for tier in Tier::ALL {
            self.backend.remove(storage_key(tier))?;
            *self.record.slot(tier) = 0;
        }
        info!("experience reset for all tiers");
        Ok(())
    }
}

fn load(backend: &dyn KeyValueStore, tier: Tier) -> Result<u64, GameError>
{
    let key = storage_key(tier);
    let Some(raw) = backend.get(key)? else {
        return Ok(0);
    };
    Ok(raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, raw = raw.as_str(), "ignoring unparsable experience counter");
        0
    }))
}
