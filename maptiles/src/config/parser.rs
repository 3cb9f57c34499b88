//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::defaults::MAX_CONNECT_RETRIES;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = non_empty(section.get("database")) {
            config.storage.database = expand_tilde(v);
        }
        if let Some(v) = section.get("busy_timeout_ms") {
            config.storage.busy_timeout = Duration::from_millis(parse_number(
                "storage",
                "busy_timeout_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            )?);
        }
        if let Some(v) = section.get("connect_retries") {
            let retries: u32 = parse_number(
                "storage",
                "connect_retries",
                v,
                "must be a non-negative integer",
            )?;
            if retries > MAX_CONNECT_RETRIES {
                return Err(invalid(
                    "storage",
                    "connect_retries",
                    v,
                    &format!("must be at most {}", MAX_CONNECT_RETRIES),
                ));
            }
            config.storage.connect_retries = retries;
        }
        if let Some(v) = section.get("retry_backoff_ms") {
            config.storage.retry_backoff = Duration::from_millis(parse_number(
                "storage",
                "retry_backoff_ms",
                v,
                "must be a non-negative integer (milliseconds)",
            )?);
        }
    }

    // [tasks] section
    if let Some(section) = ini.section(Some("tasks")) {
        if let Some(v) = non_empty(section.get("root_folder")) {
            config.tasks.root_folder = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("log_dir")) {
            config.tasks.log_dir = expand_tilde(v);
        }
        if let Some(v) = section.get("max_concurrent") {
            config.tasks.max_concurrent =
                parse_positive("tasks", "max_concurrent", v)?;
        }
        if let Some(v) = section.get("max_per_user") {
            config.tasks.max_per_user = parse_positive("tasks", "max_per_user", v)?;
        }
    }

    // [worker] section
    if let Some(section) = ini.section(Some("worker")) {
        if let Some(v) = section.get("program") {
            match non_empty(Some(v)) {
                Some(program) => config.worker.program = expand_tilde(program),
                None => {
                    return Err(invalid("worker", "program", v, "must not be empty"));
                }
            }
        }
        if let Some(v) = section.get("script") {
            // An empty value runs `program` directly
            config.worker.script = non_empty(Some(v)).map(expand_tilde);
        }
    }

    // [reconcile] section
    if let Some(section) = ini.section(Some("reconcile")) {
        if let Some(v) = section.get("stale_after_secs") {
            config.reconcile.stale_after =
                Duration::from_secs(parse_positive("reconcile", "stale_after_secs", v)?);
        }
        if let Some(v) = section.get("orphan_grace_secs") {
            config.reconcile.orphan_grace = Duration::from_secs(parse_number(
                "reconcile",
                "orphan_grace_secs",
                v,
                "must be a non-negative integer (seconds)",
            )?);
        }
        if let Some(v) = section.get("interval_secs") {
            config.reconcile.interval =
                Duration::from_secs(parse_positive("reconcile", "interval_secs", v)?);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_positive<T>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = parse_number(section, key, value, "must be a positive integer")?;
    if parsed <= T::default() {
        return Err(invalid(section, key, value, "must be a positive integer"));
    }
    Ok(parsed)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
