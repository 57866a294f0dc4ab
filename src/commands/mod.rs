use pact_merge::config::ConfigError;
use pact_merge::formats::FormatError;
use pact_merge::scenario::ScenarioError;
use pact_merge::tabulator::AllocationError;

mod info;
mod simulate;

pub use info::info;
pub use simulate::simulate;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;
