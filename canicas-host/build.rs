//! Build script for canicas-host
//!
//! Validates the embedded machine.toml at compile time, so a broken default
//! configuration never ships.

use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=machine.toml");
    println!("cargo:rerun-if-changed=build.rs");
    validate_config();
}

/// Validate machine.toml configuration at compile time
fn validate_config() {
    let config_path = Path::new("machine.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read machine.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in machine.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_calibration(&config, &mut errors);
    validate_runtime(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid values in machine.toml                           ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check an optional integer key lies in `min..=max`
fn check_range(
    table: &toml::Table,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::Integer(value)) if (min..=max).contains(value) => {}
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

fn validate_calibration(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(toml::Value::Table(calibration)) = config.get("calibration") else {
        return;
    };

    for key in ["steps_h", "steps_v"] {
        check_range(calibration, "calibration", key, 1, 100_000, errors);
    }
    check_range(calibration, "calibration", "fine_divisor", 1, 1000, errors);
    for key in ["servo_open", "servo_closed"] {
        check_range(calibration, "calibration", key, 0, 180, errors);
    }
    for key in ["transit_h_ms", "transit_v_ms", "dump_open_ms", "dump_close_ms"] {
        check_range(calibration, "calibration", key, 0, 600_000, errors);
    }
}

fn validate_runtime(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(toml::Value::Table(runtime)) = config.get("runtime") else {
        return;
    };
    check_range(runtime, "runtime", "poll_interval_ms", 1, 10_000, errors);
}
