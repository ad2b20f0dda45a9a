//! CLI command implementations
//!
//! Each command returns its response data; [`run_command`] wraps it in the
//! JSON envelope and writes it to stdout.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::config::KernelConfig;
use crate::holes::{HoleSource, IndexHoleSet, MemoryHoleSource};
use crate::observability::Logger;
use crate::planner::{normalize_literals, Expr};
use crate::uid::{Uid, UidBase, UidGenerator, UidVariant};

use super::args::{Command, HolesAction, HolesCheckArgs, UidAction};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
/// Stdout carries only the response envelope; log lines go to stderr.
pub fn run() -> CliResult<()> {
    Logger::set_stderr_only(true);
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::Uid {
            action:
                UidAction::New {
                    config,
                    timestamp,
                    extras,
                    content,
                },
        } => {
            let config = load_config(config.as_deref())?;
            uid_new(&config, &content, timestamp.as_deref(), &extras)?
        }
        Command::Uid {
            action: UidAction::Parse {
                max_extra_parts,
                uid,
            },
        } => uid_parse(&uid, max_extra_parts)?,
        Command::Holes {
            action: HolesAction::Check(args),
        } => {
            let config = load_config(Some(&args.config))?;
            holes_check(&config, &args)?
        }
        Command::Normalize { config } => {
            let config = load_config(Some(&config))?;
            normalize(&config, read_request()?)?
        }
    };
    write_response(data)
}

fn load_config(path: Option<&Path>) -> CliResult<KernelConfig> {
    let config = match path {
        Some(path) => KernelConfig::load(path)?,
        None => KernelConfig::default(),
    };
    config.apply_logging()?;
    Ok(config)
}

/// Generate one identifier with the configured encoding
pub fn uid_new(
    config: &KernelConfig,
    content: &str,
    timestamp: Option<&str>,
    extras: &[String],
) -> CliResult<Value> {
    let timestamp = timestamp
        .map(|ts| {
            DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| CliError::invalid_input(format!("Invalid timestamp '{}': {}", ts, e)))
        })
        .transpose()?;

    let generator = UidGenerator::from_config(config, None)?;
    let extras: Vec<&str> = extras.iter().map(String::as_str).collect();
    let uid = generator.generate(content.as_bytes(), timestamp, &extras)?;
    Ok(describe_uid(&uid))
}

/// Decode an identifier into its parts
pub fn uid_parse(input: &str, max_extra_parts: i32) -> CliResult<Value> {
    let uid = Uid::parse(input, max_extra_parts)?;
    Ok(describe_uid(&uid))
}

fn describe_uid(uid: &Uid) -> Value {
    let mut value = json!({
        "uid": uid.to_string(),
        "variant": match uid.variant() {
            UidVariant::HashBased => "hash",
            UidVariant::Snowflake => "snowflake",
        },
        "base": uid.base_uid(),
        "sharded_portion": uid.sharded_portion(),
        "extra": uid.extra(),
        "time_of_day": uid.time_of_day(),
    });
    if let UidBase::Snowflake(base) = uid.base() {
        value["machine_id"] = json!(base.machine_id());
        value["timestamp_millis"] = json!(base.timestamp_millis());
        value["counter"] = json!(base.counter());
    }
    value
}

/// Report holes affecting a lookup and whether the index is usable
pub fn holes_check(config: &KernelConfig, args: &HolesCheckArgs) -> CliResult<Value> {
    let path = args
        .holes
        .as_deref()
        .or(config.holes_file.as_deref())
        .ok_or_else(|| CliError::config_error("No holes file configured"))?;
    let holes = MemoryHoleSource::load(path)?.holes_for(&args.field)?;
    check_holes(&holes, args)
}

fn check_holes(holes: &IndexHoleSet, args: &HolesCheckArgs) -> CliResult<Value> {
    let hits: Vec<_> = match (&args.value, &args.lower, &args.upper) {
        (Some(value), _, _) => holes
            .holes_overlapping_value(&args.start, &args.end, value)
            .collect(),
        (None, Some(lower), Some(upper)) => holes
            .holes_overlapping_range(&args.start, &args.end, lower, upper)
            .collect(),
        _ => {
            return Err(CliError::invalid_input(
                "Either --value or both --lower and --upper are required",
            ))
        }
    };

    Ok(json!({
        "field": args.field,
        "usable": hits.is_empty(),
        "holes": hits,
    }))
}

/// Normalize the expression in `request` against the configured type registry
pub fn normalize(config: &KernelConfig, request: Value) -> CliResult<Value> {
    let expr: Arc<Expr> = serde_json::from_value(request)?;
    let registry = config.type_registry();
    let normalized = normalize_literals(registry.as_ref(), &expr)?;

    Ok(json!({
        "expression": &*normalized.expr,
        "rendered": normalized.expr.to_string(),
        "rewritten": normalized.rewritten,
    }))
}
