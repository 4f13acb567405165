//! Environment variable override support
//!
//! Variables with the `WARDEN_` prefix override loaded configuration values.

use tracing::warn;

use super::EngineConfig;

/// Prefix of recognised environment variables
pub const ENV_PREFIX: &str = "WARDEN_";

/// Environment variable overrides
pub struct EnvOverrides;

impl EnvOverrides {
    /// Apply overrides from the process environment
    pub fn apply(config: &mut EngineConfig) {
        Self::apply_from(config, std::env::vars());
    }

    /// Apply overrides from explicit `(name, value)` pairs
    ///
    /// Unknown names are ignored; unparsable values are logged and skipped.
    pub fn apply_from<I>(config: &mut EngineConfig, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match name {
                "PARSE_CACHE_CAPACITY" => match value.trim().parse::<usize>() {
                    Ok(capacity) => config.parse_cache_capacity = capacity,
                    Err(e) => warn!(%key, %value, error = %e, "Ignoring invalid override"),
                },
                "AUDIT_CAPACITY" => match value.trim().parse::<usize>() {
                    Ok(capacity) => config.audit_capacity = capacity,
                    Err(e) => warn!(%key, %value, error = %e, "Ignoring invalid override"),
                },
                "AUDIT" => match parse_bool(&value) {
                    Some(audit) => config.audit = audit,
                    None => warn!(%key, %value, "Ignoring invalid override"),
                },
                "ADHOC_ACTION_TYPE" => {
                    let value = value.trim();
                    if value.is_empty() {
                        warn!(%key, "Ignoring empty override");
                    } else {
                        config.adhoc_action_type = value.to_string();
                    }
                }
                "PERMISSION_HIERARCHY" => {
                    config.permission_hierarchy = value
                        .split(',')
                        .map(|level| level.trim().to_string())
                        .filter(|level| !level.is_empty())
                        .collect();
                }
                _ => {}
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = EngineConfig::default();
        EnvOverrides::apply_from(
            &mut config,
            vars(&[
                ("WARDEN_PARSE_CACHE_CAPACITY", "16"),
                ("WARDEN_AUDIT", "yes"),
                ("WARDEN_AUDIT_CAPACITY", "100"),
                ("WARDEN_ADHOC_ACTION_TYPE", "check"),
                ("WARDEN_PERMISSION_HIERARCHY", "Players, Builders,Wizards"),
                ("PATH", "/usr/bin"),
            ]),
        );
        assert_eq!(config.parse_cache_capacity, 16);
        assert!(config.audit);
        assert_eq!(config.audit_capacity, 100);
        assert_eq!(config.adhoc_action_type, "check");
        assert_eq!(config.permission_hierarchy, vec!["Players", "Builders", "Wizards"]);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let mut config = EngineConfig::default();
        EnvOverrides::apply_from(
            &mut config,
            vars(&[
                ("WARDEN_PARSE_CACHE_CAPACITY", "many"),
                ("WARDEN_AUDIT", "maybe"),
                ("WARDEN_AUDIT_CAPACITY", "-1"),
                ("WARDEN_ADHOC_ACTION_TYPE", "  "),
                ("WARDEN_UNKNOWN", "x"),
            ]),
        );
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
