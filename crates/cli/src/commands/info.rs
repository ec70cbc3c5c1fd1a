//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use pipeline::PipelineContext;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    general: GeneralInfo,
    devices: Vec<DeviceInfo>,
    feature_dimension: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    columns: Vec<String>,
    session_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sessions: Vec<SessionInfo>,
}

#[derive(Serialize)]
struct GeneralInfo {
    sample_rate_hz: f64,
    boundary_policy: String,
    duplicate_policy: String,
    timestamp_format: String,
    channel_order: String,
    sync_method: String,
    max_span_s: f64,
}

#[derive(Serialize)]
struct DeviceInfo {
    id: String,
    channels: Vec<String>,
}

#[derive(Serialize)]
struct SessionInfo {
    id: String,
    frames: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor: Option<f64>,
    raw_logs: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let context = PipelineContext::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&context, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&context, args);
    }

    Ok(())
}

fn build_config_info(context: &PipelineContext, args: &InfoArgs) -> ConfigInfo {
    let blueprint = &context.blueprint;
    let general = &blueprint.general;

    let devices = blueprint
        .devices
        .iter()
        .map(|d| DeviceInfo {
            id: d.id.to_string(),
            channels: d.channels.clone(),
        })
        .collect();

    let sessions = if args.sessions {
        context
            .manifest
            .entries()
            .iter()
            .map(|e| SessionInfo {
                id: e.id.to_string(),
                frames: e.frames_path.display().to_string(),
                anchor: e.anchor,
                raw_logs: e
                    .inputs
                    .iter()
                    .map(|i| i.raw_path.display().to_string())
                    .collect(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        general: GeneralInfo {
            sample_rate_hz: general.sample_rate_hz,
            boundary_policy: format!("{:?}", general.boundary_policy),
            duplicate_policy: format!("{:?}", general.duplicate_policy),
            timestamp_format: format!("{:?}", general.timestamp_format),
            channel_order: format!("{:?}", general.channel_order),
            sync_method: format!("{:?}", general.sync_method),
            max_span_s: general.max_span_s,
        },
        devices,
        feature_dimension: context.layout.dimension(),
        columns: if args.columns {
            context.layout.labels()
        } else {
            Vec::new()
        },
        session_count: context.manifest.len(),
        sessions,
    }
}

fn print_config_info(context: &PipelineContext, args: &InfoArgs) {
    let blueprint = &context.blueprint;
    let general = &blueprint.general;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  egosync Configuration                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  General");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Sample rate: {} Hz", general.sample_rate_hz);
    println!("   ├─ Boundary: {:?}", general.boundary_policy);
    println!("   ├─ Duplicates: {:?}", general.duplicate_policy);
    println!("   ├─ Timestamps: {:?}", general.timestamp_format);
    println!("   ├─ Sync method: {:?}", general.sync_method);
    println!("   └─ Max span: {} s", general.max_span_s);

    println!("\n📟 Devices ({})", blueprint.devices.len());
    for (i, device) in blueprint.devices.iter().enumerate() {
        let prefix = if i == blueprint.devices.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        println!(
            "   {} {} ({} channels: {})",
            prefix,
            device.id,
            device.channels.len(),
            device.channels.join(", ")
        );
    }

    println!(
        "\n🧮 Features: {} columns ({:?})",
        context.layout.dimension(),
        general.channel_order
    );
    if args.columns {
        for (i, label) in context.layout.labels().iter().enumerate() {
            println!("   {:>3}  {}", i, label);
        }
    }

    println!("\n🎬 Sessions ({})", context.manifest.len());
    if args.sessions {
        for entry in context.manifest.entries() {
            println!("   ├─ {}", entry.id);
            println!("   │   frames: {}", entry.frames_path.display());
            if let Some(anchor) = entry.anchor {
                println!("   │   anchor: {}", anchor);
            }
            for input in &entry.inputs {
                println!(
                    "   │   {}: {}",
                    input.device_id,
                    input.raw_path.display()
                );
            }
        }
    }

    println!();
}
