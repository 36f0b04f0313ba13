//! Configuration types for SolarDash

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Default base URL of the Solinteg cloud open API
pub const DEFAULT_SOLINTEG_BASE_URL: &str = "https://lb.solinteg-cloud.com";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Origins allowed to call the API from a browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Any origin (`*`)
    Any,
    /// An explicit allow-list
    List(Vec<String>),
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        AllowedOrigins::List(vec!["http://localhost:3000".to_string()])
    }
}

impl std::str::FromStr for AllowedOrigins {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| o.trim_end_matches('/').to_string())
            .collect();

        if origins.is_empty() {
            return Err("No allowed origins given. Use '*' or a comma separated list".to_string());
        }

        if origins.iter().any(|o| o == "*") {
            return Ok(AllowedOrigins::Any);
        }

        Ok(AllowedOrigins::List(origins))
    }
}

/// Credentials for the Twilio Verify service
#[derive(Debug)]
pub struct TwilioSettings {
    /// Account SID (`AC...`)
    pub account_sid: String,
    /// Account auth token
    pub auth_token: SecretString,
    /// Verify service SID (`VA...`)
    pub service_sid: String,
}

/// Credentials and target device for the Solinteg cloud API
#[derive(Debug)]
pub struct SolintegSettings {
    /// API base URL
    pub base_url: String,
    /// Login account
    pub account: String,
    /// Login password
    pub password: SecretString,
    /// Serial number of the monitored device
    pub device_sn: String,
}

/// Main configuration for SolarDash
#[derive(Debug)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub bind: IpAddr,
    /// Server port
    pub port: u16,
    /// CORS allow-list
    pub allowed_origins: AllowedOrigins,
    /// Lifetime of a session token
    pub session_ttl: Duration,
    /// Interval of the background sweep of expired sessions (zero disables it)
    pub session_sweep_interval: Duration,
    /// Request timeout for calls to upstream providers
    pub upstream_timeout: Duration,
    /// Twilio Verify credentials
    pub twilio: Option<TwilioSettings>,
    /// Solinteg cloud credentials
    pub solinteg: Option<SolintegSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5001,
            allowed_origins: AllowedOrigins::default(),
            session_ttl: Duration::from_secs(60),
            session_sweep_interval: Duration::ZERO,
            upstream_timeout: Duration::from_secs(10),
            twilio: None,
            solinteg: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set bind address
    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder pattern: set allowed CORS origins
    pub fn with_allowed_origins(mut self, origins: AllowedOrigins) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Builder pattern: set session token lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Builder pattern: set expired session sweep interval
    pub fn with_session_sweep_interval(mut self, interval: Duration) -> Self {
        self.session_sweep_interval = interval;
        self
    }

    /// Builder pattern: set upstream request timeout
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Builder pattern: set Twilio credentials
    pub fn with_twilio(mut self, twilio: TwilioSettings) -> Self {
        self.twilio = Some(twilio);
        self
    }

    /// Builder pattern: set Solinteg credentials
    pub fn with_solinteg(mut self, solinteg: SolintegSettings) -> Self {
        self.solinteg = Some(solinteg);
        self
    }

    /// Whether the background session sweep should run
    pub fn sweep_enabled(&self) -> bool {
        !self.session_sweep_interval.is_zero()
    }

    /// Check that the configuration can run a server
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("port must be non-zero"));
        }
        if self.session_ttl.is_zero() {
            return Err(Error::config("session TTL must be non-zero"));
        }
        if self.session_ttl > MAX_SESSION_TTL {
            return Err(Error::config(format!(
                "session TTL must be at most {}s",
                MAX_SESSION_TTL.as_secs()
            )));
        }
        if self.upstream_timeout.is_zero() {
            return Err(Error::config("upstream timeout must be non-zero"));
        }
        if let AllowedOrigins::List(origins) = &self.allowed_origins {
            if origins.is_empty() {
                return Err(Error::config("at least one allowed origin is required"));
            }
        }

        let twilio = self.twilio.as_ref().ok_or(Error::MissingSetting("twilio"))?;
        if twilio.account_sid.is_empty() {
            return Err(Error::MissingSetting("TWILIO_ACCOUNT_SID"));
        }
        if twilio.service_sid.is_empty() {
            return Err(Error::MissingSetting("TWILIO_SERVICE_SID"));
        }

        let solinteg = self
            .solinteg
            .as_ref()
            .ok_or(Error::MissingSetting("solinteg"))?;
        if solinteg.account.is_empty() {
            return Err(Error::MissingSetting("SOLINTEG_ACCOUNT"));
        }
        if solinteg.device_sn.is_empty() {
            return Err(Error::MissingSetting("SOLINTEG_DEVICE_SN"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> Config {
        Config::new()
            .with_twilio(TwilioSettings {
                account_sid: "AC123".to_string(),
                auth_token: SecretString::from("secret"),
                service_sid: "VA123".to_string(),
            })
            .with_solinteg(SolintegSettings {
                base_url: DEFAULT_SOLINTEG_BASE_URL.to_string(),
                account: "ops@example.com".to_string(),
                password: SecretString::from("hunter2"),
                device_sn: "A102300100402049".to_string(),
            })
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert!(!config.sweep_enabled());
        assert_eq!(
            config.allowed_origins,
            AllowedOrigins::List(vec!["http://localhost:3000".to_string()])
        );
    }

    #[test]
    fn test_complete_config_validates() {
        assert!(complete_config().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let result = Config::new().validate();
        assert!(matches!(result, Err(Error::MissingSetting("twilio"))));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = complete_config().with_session_ttl(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_session_ttl_upper_bound() {
        let config = complete_config().with_session_ttl(MAX_SESSION_TTL);
        assert!(config.validate().is_ok());

        let config = complete_config().with_session_ttl(Duration::from_secs(10_000_000_000_000));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_upstream_timeout_rejected() {
        let config = complete_config().with_upstream_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_origin_list_rejected() {
        let config = complete_config().with_allowed_origins(AllowedOrigins::List(Vec::new()));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_origins_parsing() {
        let any: AllowedOrigins = "*".parse().unwrap();
        assert_eq!(any, AllowedOrigins::Any);

        let list: AllowedOrigins = "http://localhost:3000/, https://dash.example.com"
            .parse()
            .unwrap();
        assert_eq!(
            list,
            AllowedOrigins::List(vec![
                "http://localhost:3000".to_string(),
                "https://dash.example.com".to_string(),
            ])
        );

        assert!(" , ".parse::<AllowedOrigins>().is_err());
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let output = format!("{:?}", complete_config());
        assert!(!output.contains("hunter2"));
    }
}
