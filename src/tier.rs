use crate::color::{GREEN, RED, Rgb, YELLOW};
use crate::store::ExperienceRecord;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const MEDIUM_UNLOCK_POINTS: u64 = 150;
pub const HARD_UNLOCK_POINTS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tier
{
    Easy,
    Medium,
    Hard,
}

/// Gate that must be met before a tier can be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockRequirement
{
    pub tier: Tier,
    pub points: u64,
}

impl Tier
{
    pub const ALL: [Tier; 3] = [Tier::Easy, Tier::Medium, Tier::Hard];

    pub fn as_str(self) -> &'static str
    {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }

    pub fn time_limit_secs(self) -> u32
    {
        match self {
            Tier::Easy => 10,
            Tier::Medium => 7,
            Tier::Hard => 5,
        }
    }

    pub fn stage_name(self) -> &'static str
    {
        match self {
            Tier::Easy => "NEBULA",
            Tier::Medium => "CONSTELLATION",
            Tier::Hard => "ORION",
        }
    }

    pub fn stage_color(self) -> Rgb
    {
        match self {
            Tier::Easy => GREEN,
            Tier::Medium => YELLOW,
            Tier::Hard => RED,
        }
    }

    pub fn unlock_requirement(self) -> Option<UnlockRequirement>
    {
        match self {
            Tier::Easy => None,
            Tier::Medium => Some(UnlockRequirement {
                tier: Tier::Easy,
                points: MEDIUM_UNLOCK_POINTS,
            }),
            Tier::Hard => Some(UnlockRequirement {
                tier: Tier::Medium,
                points: HARD_UNLOCK_POINTS,
            }),
        }
    }

    pub fn is_unlocked(self, record: &ExperienceRecord) -> bool
    {
        self.unlock_requirement()
            .is_none_or(|req| record.get(req.tier) >= req.points)
    }
}

impl fmt::Display for Tier
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier
{
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err>
    {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown tier '{value}' (expected easy, medium or hard)"))
    }
}
