//! Run settings: an optional JSON scenario file, overridden by CLI flags.

use crate::scenario::{DistrictFilter, MergeRequest, ScenarioError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUTS: &str = "Inputs/Senadores";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid scenario file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Missing pact code: {0}")]
    MissingPact(&'static str),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Scenario file as stored on disk, e.g.
///
/// ```json
/// { "inputs": "Inputs/Senadores", "pactA": "C", "pactB": "J", "districts": ["1", "7"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioFile {
    pub inputs: Option<PathBuf>,
    pub pact_a: Option<String>,
    pub pact_b: Option<String>,
    pub districts: Vec<String>,
    pub print_all: bool,
    pub json: Option<PathBuf>,
}

impl ScenarioFile {
    pub fn read(path: &Path) -> Result<ScenarioFile> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fills every field set in `overrides`; flags win over the file.
    pub fn overridden_by(self, overrides: ScenarioFile) -> ScenarioFile {
        ScenarioFile {
            inputs: overrides.inputs.or(self.inputs),
            pact_a: overrides.pact_a.or(self.pact_a),
            pact_b: overrides.pact_b.or(self.pact_b),
            districts: if overrides.districts.is_empty() {
                self.districts
            } else {
                overrides.districts
            },
            print_all: overrides.print_all || self.print_all,
            json: overrides.json.or(self.json),
        }
    }
}

/// Fully resolved settings for one `simulate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub inputs: PathBuf,
    pub request: MergeRequest,
    pub filter: DistrictFilter,
    pub print_all: bool,
    pub json: Option<PathBuf>,
}

impl SimulationConfig {
    pub fn resolve(settings: ScenarioFile) -> Result<SimulationConfig> {
        let pact_a = settings.pact_a.ok_or(ConfigError::MissingPact("--pact-a"))?;
        let pact_b = settings.pact_b.ok_or(ConfigError::MissingPact("--pact-b"))?;

        Ok(SimulationConfig {
            inputs: settings
                .inputs
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUTS)),
            request: MergeRequest::new(&pact_a, &pact_b)?,
            filter: DistrictFilter::only(settings.districts),
            print_all: settings.print_all,
            json: settings.json,
        })
    }
}
