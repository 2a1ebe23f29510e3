//! Build script for hexascroller-service
//!
//! Validates the embedded hexascroller.toml at compile time so a broken
//! default configuration never ships.

use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "hexascroller.toml";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    validate_config();
}

/// Validate hexascroller.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed={CONFIG_FILE}");

    let config_path = Path::new(CONFIG_FILE);
    if !config_path.exists() {
        fail(
            "hexascroller.toml not found",
            &[
                "The service embeds a default configuration file.".to_string(),
                "Create one in the hexascroller-service directory.".to_string(),
            ],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read hexascroller.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in hexascroller.toml",
            &e.to_string()
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_mqtt(&config, &mut errors);
    validate_panels(&config, &mut errors);
    validate_display(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in hexascroller.toml", &errors);
    }
}

/// Print a boxed error message and abort the build
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.chars().count() > 62 {
                format!("{}...", line.chars().take(59).collect::<String>())
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table<'a>(
    config: &'a toml::Value,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{name}] must be a table"));
            None
        }
        None => None,
    }
}

fn integer_in(
    section: &toml::Table,
    prefix: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    match section.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if range.contains(v) => {}
        Some(_) => errors.push(format!(
            "[{prefix}] {key} must be an integer in {}..={}",
            range.start(),
            range.end()
        )),
    }
}

fn validate_mqtt(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(mqtt) = table(config, "mqtt", errors) else {
        return;
    };
    if let Some(host) = mqtt.get("host") {
        if !matches!(host, toml::Value::String(h) if !h.is_empty()) {
            errors.push("[mqtt] host must be a non-empty string".to_string());
        }
    }
    integer_in(mqtt, "mqtt", "port", 1..=65535, errors);
    integer_in(mqtt, "mqtt", "keep_alive_s", 5..=3600, errors);
}

fn validate_panels(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(panels) = table(config, "panels", errors) else {
        return;
    };
    match panels.get("ports") {
        None => {}
        Some(toml::Value::Array(ports)) => {
            if ports.iter().any(|p| !p.is_str()) {
                errors.push("[panels] ports must be strings".to_string());
            }
        }
        Some(_) => errors.push("[panels] ports must be an array".to_string()),
    }
    integer_in(panels, "panels", "baud", 1200..=4_000_000, errors);
    integer_in(panels, "panels", "timeout_ms", 1..=10_000, errors);
}

fn validate_display(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(display) = table(config, "display", errors) else {
        return;
    };
    integer_in(display, "display", "duration_s", 1..=3600, errors);
    integer_in(display, "display", "active_tick_ms", 1..=10_000, errors);
    integer_in(display, "display", "idle_tick_ms", 1..=10_000, errors);
    match display.get("scroll_fraction") {
        None => {}
        Some(toml::Value::Float(f)) if *f > 0.0 && *f <= 1.0 => {}
        Some(_) => errors.push("[display] scroll_fraction must be in (0, 1]".to_string()),
    }
}
