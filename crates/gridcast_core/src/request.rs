use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Feature;

/// Per-sector model selection for a demand projection run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorConfiguration {
    pub sector: String,
    #[serde(default)]
    pub models: BTreeSet<String>,
    #[serde(default)]
    pub independent_variables: BTreeSet<String>,
    #[serde(default = "default_window_size")]
    pub window_size: u32,
}

fn default_window_size() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastConfig {
    pub scenario_name: String,
    pub target_year: i32,
    #[serde(default)]
    pub exclude_covid: bool,
    #[serde(default)]
    pub sectors: Vec<SectorConfiguration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMethod {
    #[default]
    BaseProfileScaling,
    StlDecomposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProfileConfig {
    pub profile_name: String,
    #[serde(default)]
    pub method: ProfileMethod,
    #[serde(default)]
    pub base_year: Option<i32>,
    pub start_year: i32,
    pub end_year: i32,
    pub demand_scenario: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectValidation {
    pub project_path: String,
}

/// A fully described long-running operation the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRequest {
    Forecast(ForecastConfig),
    LoadProfile(LoadProfileConfig),
    ValidateProject(ProjectValidation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid field(s): {}", .0.len(), join_errors(.0))]
pub struct ValidationError(pub Vec<FieldError>);

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Match rule for the duplicate-submission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunGuard {
    /// Any job whose name starts with this text.
    Prefix(String),
    /// Only a job with exactly this name.
    Name(String),
}

impl RunGuard {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            RunGuard::Prefix(prefix) => name.starts_with(prefix.as_str()),
            RunGuard::Name(expected) => name == expected,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            RunGuard::Prefix(text) | RunGuard::Name(text) => text,
        }
    }
}

const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2100;
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

impl JobRequest {
    pub fn feature(&self) -> Feature {
        match self {
            JobRequest::Forecast(_) => Feature::DemandProjection,
            JobRequest::LoadProfile(_) => Feature::LoadProfile,
            JobRequest::ValidateProject(_) => Feature::Project,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            JobRequest::Forecast(config) => {
                format!("{} - {}", self.feature().label(), config.scenario_name.trim())
            }
            JobRequest::LoadProfile(config) => {
                format!("{} - {}", self.feature().label(), config.profile_name.trim())
            }
            JobRequest::ValidateProject(config) => {
                format!("{} - {}", self.feature().label(), config.project_path.trim())
            }
        }
    }

    /// Which running jobs block this request.
    ///
    /// Forecasts and profile generation are limited to one per feature; project
    /// validation only blocks a second validation of the same path.
    pub fn run_guard(&self) -> RunGuard {
        match self {
            JobRequest::Forecast(_) | JobRequest::LoadProfile(_) => {
                RunGuard::Prefix(self.feature().label().to_string())
            }
            JobRequest::ValidateProject(_) => RunGuard::Name(self.display_name()),
        }
    }

    pub fn cancellable(&self) -> bool {
        !matches!(self, JobRequest::ValidateProject(_))
    }

    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            JobRequest::Forecast(config) => serde_json::to_value(config),
            JobRequest::LoadProfile(config) => serde_json::to_value(config),
            JobRequest::ValidateProject(config) => serde_json::to_value(config),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        match self {
            JobRequest::Forecast(config) => validate_forecast(config, &mut errors),
            JobRequest::LoadProfile(config) => validate_load_profile(config, &mut errors),
            JobRequest::ValidateProject(config) => {
                if config.project_path.trim().is_empty() {
                    errors.push(FieldError::new("projectPath", "project path is required"));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(errors))
        }
    }
}

fn validate_name(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "name is required"));
    } else if trimmed.contains(FORBIDDEN_NAME_CHARS) {
        errors.push(FieldError::new(
            field,
            "name must not contain path or wildcard characters",
        ));
    }
}

fn validate_year(field: &str, year: i32, errors: &mut Vec<FieldError>) {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        errors.push(FieldError::new(
            field,
            format!("year must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
}

fn validate_forecast(config: &ForecastConfig, errors: &mut Vec<FieldError>) {
    validate_name("scenarioName", &config.scenario_name, errors);
    validate_year("targetYear", config.target_year, errors);

    if config.sectors.is_empty() {
        errors.push(FieldError::new("sectors", "at least one sector is required"));
    }

    let mut seen = BTreeSet::new();
    for (index, sector) in config.sectors.iter().enumerate() {
        let prefix = format!("sectors[{index}]");
        let name = sector.sector.trim();
        if name.is_empty() {
            errors.push(FieldError::new(
                format!("{prefix}.sector"),
                "sector name is required",
            ));
        } else if !seen.insert(name.to_ascii_lowercase()) {
            errors.push(FieldError::new(
                format!("{prefix}.sector"),
                format!("sector '{name}' is configured twice"),
            ));
        }
        if sector.models.is_empty() {
            errors.push(FieldError::new(
                format!("{prefix}.models"),
                "select at least one model",
            ));
        }
        if sector.models.contains("MLR") && sector.independent_variables.is_empty() {
            errors.push(FieldError::new(
                format!("{prefix}.independentVariables"),
                "MLR needs at least one independent variable",
            ));
        }
        if sector.models.contains("WAM") && sector.window_size < 2 {
            errors.push(FieldError::new(
                format!("{prefix}.windowSize"),
                "WAM window size must be at least 2",
            ));
        }
    }
}

fn validate_load_profile(config: &LoadProfileConfig, errors: &mut Vec<FieldError>) {
    validate_name("profileName", &config.profile_name, errors);
    validate_year("startYear", config.start_year, errors);
    validate_year("endYear", config.end_year, errors);
    if config.start_year > config.end_year {
        errors.push(FieldError::new(
            "endYear",
            "end year must not be before start year",
        ));
    }
    if config.demand_scenario.trim().is_empty() {
        errors.push(FieldError::new(
            "demandScenario",
            "a demand scenario is required",
        ));
    }
    if config.method == ProfileMethod::BaseProfileScaling {
        match config.base_year {
            None => errors.push(FieldError::new(
                "baseYear",
                "base year is required for base profile scaling",
            )),
            Some(base) if base >= config.start_year => errors.push(FieldError::new(
                "baseYear",
                "base year must precede the start year",
            )),
            Some(_) => {}
        }
    }
}
