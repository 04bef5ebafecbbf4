use crate::tier::Tier;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError
{
    #[error("challenge '{id}' is already registered for the {tier} tier")]
    DuplicateId { tier: Tier, id: &'static str },

    #[error("no challenges are registered for the {0} tier")]
    NoChallengesAvailable(Tier),

    #[error("the {tier} tier needs {required} {gate} points (have {have})")]
    TierLocked
    {
        tier: Tier,
        gate: Tier,
        required: u64,
        have: u64,
    },

    #[error("cannot {action} while {scene}")]
    InvalidTransition
    {
        action: &'static str,
        scene: &'static str,
    },

    #[error("failed to persist {path}: {source}")]
    Store
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
