use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    /// Validated `RUST_LOG` directives, or the default when unset or invalid.
    pub(crate) filter_directives: String,
    pub(crate) ansi: bool,
    /// Warnings captured during config parsing so they can be logged after tracing is initialized.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(component: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let component = component.trim().to_string();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let service_name = non_empty("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = non_empty("STAGE").unwrap_or_else(|| "unknown".to_string());

        let mut warnings = Vec::new();

        let filter_directives = match non_empty("RUST_LOG") {
            Some(raw) => match EnvFilter::try_new(&raw) {
                Ok(_) => raw,
                Err(err) => {
                    warnings.push(format!(
                        "RUST_LOG is invalid (value: {raw}); defaulting to {DEFAULT_FILTER} ({err})"
                    ));
                    DEFAULT_FILTER.to_string()
                }
            },
            None => DEFAULT_FILTER.to_string(),
        };

        let ansi = match non_empty("LOG_ANSI") {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warnings.push(format!("LOG_ANSI is invalid (value: {raw}); defaulting to true"));
                true
            }),
            None => true,
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            filter_directives,
            ansi,
            warnings,
        }
    }
}

fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup("backend", |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_use_component_as_service_name() {
        let config = config(&[]);
        assert_eq!(config.service_context.service_name, "backend");
        assert_eq!(config.service_context.environment, "unknown");
        assert_eq!(config.filter_directives, "info");
        assert!(config.ansi);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn invalid_rust_log_falls_back_with_warning() {
        let config = config(&[("RUST_LOG", "backend=notalevel"), ("STAGE", "Production")]);
        assert_eq!(config.filter_directives, "info");
        assert_eq!(config.service_context.environment, "Production");
        assert_eq!(config.warnings.len(), 1);
    }

    #[test]
    fn valid_directives_are_kept() {
        let config = config(&[("RUST_LOG", "backend=debug,tower_http=info"), ("LOG_ANSI", "off")]);
        assert_eq!(config.filter_directives, "backend=debug,tower_http=info");
        assert!(!config.ansi);
    }
}
