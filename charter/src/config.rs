use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

static GOVERNANCE_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_str = include_str!("../../contracts/schemas/governance.v1.schema.json");
    let schema_json: JsonValue = serde_json::from_str(schema_str)
        .expect("contracts/schemas/governance.v1.schema.json must be valid JSON");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_json)
        .expect("governance schema must compile")
});

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Governance charter not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read governance charter {path}: {message}")]
    Io { path: String, message: String },

    #[error("Governance charter is not valid YAML: {message}")]
    YamlParsingFailed { message: String },

    #[error("Governance charter failed validation")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Use cases may not be both approved and prohibited: {overlap:?}")]
    OverlappingUseCases { overlap: Vec<String> },

    #[error("Failed to deserialize governance charter: {message}")]
    DeserializationFailed { message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub json_pointer: String,
    pub message: String,
    pub schema_path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GovernanceConfig {
    pub usage: UsageConfig,
    pub risk_controls: RiskControls,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UsageConfig {
    pub approved: Vec<String>,
    pub prohibited: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RiskControls {
    pub confidence_threshold: f64,
    pub human_in_the_loop: bool,
}

/// Load and validate the governance charter from a YAML file.
///
/// The file is validated against the embedded governance.v1 schema before
/// deserialization; any failure here is fatal to service startup.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<GovernanceConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading governance charter from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_string_lossy().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string_lossy().to_string(),
        message: e.to_string(),
    })?;

    let yaml_value: YamlValue =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParsingFailed {
            message: e.to_string(),
        })?;

    let json_value =
        serde_json::to_value(&yaml_value).map_err(|e| ConfigError::YamlParsingFailed {
            message: e.to_string(),
        })?;

    validate_charter(&json_value)?;

    let config: GovernanceConfig =
        serde_json::from_value(json_value).map_err(|e| ConfigError::DeserializationFailed {
            message: e.to_string(),
        })?;

    check_disjoint_use_cases(&config)?;

    debug!(
        approved = config.usage.approved.len(),
        prohibited = config.usage.prohibited.len(),
        confidence_threshold = config.risk_controls.confidence_threshold,
        "Governance charter loaded"
    );

    Ok(config)
}

fn validate_charter(value: &JsonValue) -> Result<(), ConfigError> {
    if let Err(errors) = GOVERNANCE_SCHEMA.validate(value) {
        let validation_errors: Vec<ValidationError> = errors
            .map(|error| ValidationError {
                json_pointer: error.instance_path.to_string(),
                message: error.to_string(),
                schema_path: error.schema_path.to_string(),
            })
            .collect();

        return Err(ConfigError::ValidationFailed {
            errors: validation_errors,
        });
    }
    Ok(())
}

fn check_disjoint_use_cases(config: &GovernanceConfig) -> Result<(), ConfigError> {
    let mut overlap: Vec<String> = config
        .usage
        .approved
        .iter()
        .filter(|u| config.usage.prohibited.contains(u))
        .cloned()
        .collect();

    if overlap.is_empty() {
        Ok(())
    } else {
        overlap.sort();
        Err(ConfigError::OverlappingUseCases { overlap })
    }
}
