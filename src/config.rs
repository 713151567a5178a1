use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use stow_it_now::optimizer::PlacementConfig;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "STOW_IT_NOW_API_HOST";
    const PORT_VAR: &'static str = "STOW_IT_NOW_API_PORT";

    fn from_env() -> Self {
        let (bind_ip, display_host) = match env_string(Self::HOST_VAR) {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    log::warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::HOST_VAR,
                        raw,
                        err,
                        Self::DEFAULT_HOST
                    );
                    (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string()),
        };

        let port = match env_string(Self::PORT_VAR) {
            Some(raw) => parse_port(&raw).unwrap_or_else(|| {
                log::warn!(
                    "{} ('{}') must be a port between 1 and 65535. Using {}.",
                    Self::PORT_VAR,
                    raw,
                    Self::DEFAULT_PORT
                );
                Self::DEFAULT_PORT
            }),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Tuning of the placement runs started by the service.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    placement: PlacementConfig,
    time_budget: Duration,
}

impl OptimizerConfig {
    const DEFAULT_TIME_BUDGET_MS: f64 = 5000.0;

    const GRID_STEP_VAR: &'static str = "STOW_IT_NOW_PLACEMENT_GRID_STEP";
    const EPSILON_VAR: &'static str = "STOW_IT_NOW_PLACEMENT_EPSILON";
    const SMALL_GAP_VAR: &'static str = "STOW_IT_NOW_PLACEMENT_SMALL_GAP_THRESHOLD";
    const ALLOW_ROTATION_VAR: &'static str = "STOW_IT_NOW_PLACEMENT_ALLOW_ROTATIONS";
    const PARALLEL_VAR: &'static str = "STOW_IT_NOW_PLACEMENT_PARALLEL";
    const TIME_BUDGET_VAR: &'static str = "STOW_IT_NOW_PLACEMENT_TIME_BUDGET_MS";

    fn from_env() -> Self {
        let grid_step = load_f64_with_warning(
            Self::GRID_STEP_VAR,
            PlacementConfig::DEFAULT_GRID_STEP,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted grid step changes placement density and run time",
        );

        let epsilon = load_f64_with_warning(
            Self::EPSILON_VAR,
            PlacementConfig::DEFAULT_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted tolerance may let pallets touch or reject tight fits",
        );

        let small_gap_threshold = load_f64_with_warning(
            Self::SMALL_GAP_VAR,
            PlacementConfig::DEFAULT_SMALL_GAP_THRESHOLD,
            |value| value >= 0.0,
            "must be >= 0",
            "Adjusted gap threshold changes how Best-Fit avoids slivers",
        );

        let time_budget_ms = load_f64_with_warning(
            Self::TIME_BUDGET_VAR,
            Self::DEFAULT_TIME_BUDGET_MS,
            |value| value >= 1.0 && value <= u64::MAX as f64,
            "must be at least 1",
            "Adjusted time budget changes when long runs are cancelled",
        );

        let allow_rotation = env_string(Self::ALLOW_ROTATION_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ALLOW_ROTATION_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_ALLOW_ROTATION);

        let parallel = env_string(Self::PARALLEL_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PARALLEL_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_PARALLEL);

        let time_budget = Duration::from_millis(time_budget_ms as u64);
        let placement = PlacementConfig::builder()
            .grid_step(grid_step)
            .epsilon(epsilon)
            .small_gap_threshold(small_gap_threshold)
            .allow_rotation(allow_rotation)
            .parallel(parallel)
            .time_budget(time_budget)
            .build();

        Self {
            placement,
            time_budget,
        }
    }

    /// Returns the configured PlacementConfig, including the time budget.
    pub fn placement_config(&self) -> PlacementConfig {
        self.placement
    }

    /// Maximum wall-clock time for one placement request.
    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let time_budget = Duration::from_millis(Self::DEFAULT_TIME_BUDGET_MS as u64);
        Self {
            placement: PlacementConfig::builder().time_budget(time_budget).build(),
            time_budget,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            log::warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            log::warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name,
                other
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    advisory: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => parse_f64_with_default(&raw, var_name, default, validator, invalid_hint)
            .inspect(|value| {
                let tolerance = (default.abs().max(1.0)) * 1e-9;
                if (value - default).abs() > tolerance {
                    log::info!("{} ({} = {}).", advisory, var_name, value);
                }
            })
            .unwrap_or(default),
        None => default,
    }
}

/// Parses and validates a numeric override; `None` means "use the default".
fn parse_f64_with_default(
    raw: &str,
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => Some(value),
        Ok(_) => {
            log::warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name,
                raw,
                invalid_hint,
                default
            );
            None
        }
        Err(err) => {
            log::warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name,
                raw,
                err,
                default
            );
            None
        }
    }
}
