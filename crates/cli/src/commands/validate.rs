//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::BoundaryPolicy;
use pipeline::PipelineContext;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_inputs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sample_rate_hz: f64,
    feature_dimension: usize,
    device_count: usize,
    session_count: usize,
}

impl ValidationResult {
    fn invalid(config_path: String, error: String) -> Self {
        Self {
            valid: false,
            config_path,
            error: Some(error),
            missing_inputs: Vec::new(),
            warnings: Vec::new(),
            summary: None,
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        let error = format!("File not found: {}", args.config.display());
        return ValidationResult::invalid(config_path, error);
    }

    let context = match PipelineContext::load(&args.config) {
        Ok(context) => context,
        Err(e) => return ValidationResult::invalid(config_path, e.to_string()),
    };

    let missing_inputs = if args.check_inputs {
        collect_missing_inputs(&context)
    } else {
        Vec::new()
    };
    let blueprint = &context.blueprint;

    ValidationResult {
        valid: missing_inputs.is_empty(),
        config_path,
        error: None,
        missing_inputs,
        warnings: collect_warnings(&context),
        summary: Some(ConfigSummary {
            version: format!("{:?}", blueprint.version),
            sample_rate_hz: blueprint.general.sample_rate_hz,
            feature_dimension: context.layout.dimension(),
            device_count: blueprint.devices.len(),
            session_count: context.manifest.len(),
        }),
    }
}

fn collect_missing_inputs(context: &PipelineContext) -> Vec<String> {
    let mut missing = Vec::new();
    for entry in context.manifest.entries() {
        if !entry.frames_path.is_file() {
            missing.push(format!(
                "{}: frames {}",
                entry.id,
                entry.frames_path.display()
            ));
        }
        for input in &entry.inputs {
            if !input.raw_path.is_file() {
                missing.push(format!(
                    "{}: {} raw log {}",
                    entry.id,
                    input.device_id,
                    input.raw_path.display()
                ));
            }
        }
    }
    missing
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(context: &PipelineContext) -> Vec<String> {
    let mut warnings = Vec::new();

    if context.manifest.is_empty() {
        warnings.push("No sessions configured - batch commands will do nothing".to_string());
    }

    if context.blueprint.general.boundary_policy == BoundaryPolicy::Extrapolate {
        warnings.push(
            "general.boundary_policy = extrapolate - frames far outside a recording get unbounded values"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }

    if let Some(ref summary) = result.summary {
        println!("\n  Version: {}", summary.version);
        println!("  Sample rate: {} Hz", summary.sample_rate_hz);
        println!("  Feature dimension: {}", summary.feature_dimension);
        println!("  Devices: {}", summary.device_count);
        println!("  Sessions: {}", summary.session_count);
    }

    if !result.missing_inputs.is_empty() {
        println!("\n✗ Missing inputs:");
        for missing in &result.missing_inputs {
            println!("  - {}", missing);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n⚠ Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}
