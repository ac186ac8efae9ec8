use crate::config::types::{ControllerConfig, FetcherConfig, ScanOptions, ScannerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the fetcher and controller sections of a config file
///
/// The `[scan]` section is validated separately, once per run, by
/// [`validate_scan_options`] after command-line overrides are applied.
pub fn validate(config: &ScannerConfig) -> Result<(), ConfigError> {
    // A base URL in the file is checked early so typos surface at load time
    if let Some(base_url) = &config.scan.base_url {
        check_base_url(base_url).map_err(ConfigError::InvalidUrl)?;
    }

    validate_fetcher_config(&config.fetcher)?;
    validate_controller_config(&config.controller)?;
    Ok(())
}

/// Validates the options of a scan run
///
/// Every rule is checked and all violations are reported together, one per
/// line, in field order.
pub fn validate_scan_options(options: &ScanOptions) -> Result<(), ConfigError> {
    let violations = collect_violations(options);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(violations.join("\n")))
    }
}

fn collect_violations(options: &ScanOptions) -> Vec<String> {
    let mut violations = Vec::new();

    if let Err(message) = check_base_url(&options.base_url) {
        violations.push(message);
    }

    if options.thread_count < 1 {
        violations.push(format!(
            "thread-count must be >= 1, got {}",
            options.thread_count
        ));
    }

    if options.searched_text.is_empty() {
        violations.push("searched-text cannot be empty".to_string());
    }

    if options.scan_url_count < 1 {
        violations.push(format!(
            "scan-url-count must be >= 1, got {}",
            options.scan_url_count
        ));
    }

    violations
}

fn check_base_url(base_url: &str) -> Result<(), String> {
    if base_url.trim().is_empty() {
        return Err("base-url cannot be empty".to_string());
    }

    let url = Url::parse(base_url)
        .map_err(|e| format!("base-url '{}' is not a valid absolute URL: {}", base_url, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!(
            "base-url '{}' must use the http or https scheme",
            base_url
        ));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_controller_config(config: &ControllerConfig) -> Result<(), ConfigError> {
    if config.pause_poll_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "pause-poll-ms must be >= 10ms, got {}ms",
            config.pause_poll_ms
        )));
    }

    Ok(())
}
