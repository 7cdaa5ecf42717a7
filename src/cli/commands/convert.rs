//! Convert command implementation

use crate::checkpoint::{SafeTensorsReader, SafeTensorsWriter};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_spec, ConvertArgs, ConvertSpec, OutputFormat};
use crate::convert::{ConversionPlan, Converter};
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Resolve settings from the config file and flags
pub fn resolve_spec(args: &ConvertArgs) -> Result<ConvertSpec> {
    let mut spec = match &args.config {
        Some(path) => load_spec(path)?,
        None => ConvertSpec::default(),
    };
    apply_overrides(&mut spec, args);
    Ok(spec)
}

/// Format a dry-run plan as a string
pub fn format_plan(plan: &ConversionPlan) -> String {
    let mut lines = vec![format!(
        "Dry run: {} variable(s) would be written, {} reshaped, {} excluded.",
        plan.variables.len(),
        plan.reshape_count(),
        plan.excluded.len()
    )];
    for planned in plan.variables.values() {
        let shape = match &planned.new_shape {
            Some(new_shape) => format!("{:?} -> {:?}", planned.shape, new_shape),
            None => format!("{:?}", planned.shape),
        };
        if planned.source == planned.target {
            lines.push(format!("  {}  {shape}", planned.target));
        } else {
            lines.push(format!("  {} --> {}  {shape}", planned.source, planned.target));
        }
    }
    for collision in &plan.collisions {
        lines.push(format!(
            "  ⚠ {} would be overwritten by {} at {}",
            collision.overwritten, collision.kept, collision.target
        ));
    }
    lines.join("\n")
}

/// Write the rename audit; a dry run records the plan instead of the summary.
fn write_audit<T: serde::Serialize>(path: &Path, audit: &T, level: LogLevel) -> Result<()> {
    let json = serde_json::to_string_pretty(audit)
        .map_err(|e| Error::io("serializing rename audit", e.into()))?;
    fs::write(path, json).map_err(|e| Error::io(format!("writing rename audit {}", path.display()), e))?;
    log(
        level,
        LogLevel::Verbose,
        &format!("Rename audit written to {}", path.display()),
    );
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::io("serializing summary", e.into()))
}

pub fn run_convert(args: ConvertArgs, level: LogLevel) -> Result<()> {
    let spec = resolve_spec(&args)?;
    let paths = spec.paths()?;
    let converter = Converter::new(spec.options());

    let reader = SafeTensorsReader::open(&paths.from)?;
    log(
        level,
        LogLevel::Verbose,
        &format!(
            "Source: {} ({} bytes), rule set {}",
            reader.path().display(),
            reader.size_bytes(),
            converter.rule_set()
        ),
    );

    if args.dry_run {
        let plan = converter.plan(&reader)?;
        if let Some(audit_path) = &args.audit_json {
            write_audit(audit_path, &plan, level)?;
        }
        let output = match args.format {
            OutputFormat::Text => format_plan(&plan),
            OutputFormat::Json => to_json(&plan)?,
        };
        log(level, LogLevel::Normal, &output);
        return Ok(());
    }

    let mut writer = SafeTensorsWriter::create(&paths.to);
    let summary = converter.run(&reader, &mut writer)?;

    if let Some(audit_path) = &args.audit_json {
        write_audit(audit_path, &summary, level)?;
    }

    let output = match args.format {
        OutputFormat::Text => summary.to_text(level == LogLevel::Verbose).trim_end().to_string(),
        OutputFormat::Json => to_json(&summary)?,
    };
    log(level, LogLevel::Normal, &output);
    log(
        level,
        LogLevel::Verbose,
        &format!("Destination: {}", writer.path().display()),
    );

    Ok(())
}
