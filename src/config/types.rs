//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_CLIENT_NAME, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use crate::error_handling::ConfigError;
use crate::starttls::StartTls;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted on stderr:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Minimum remaining certificate validity, in days.
///
/// Parsed from `WARNING[,CRITICAL]`, e.g. `30` or `30,7`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinValidity {
    /// Fewer remaining days than this yields a warning
    pub warning: u32,
    /// Fewer remaining days than this yields a critical verdict
    pub critical: Option<u32>,
}

impl FromStr for MinValidity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidMinValidity(s.to_string());
        let mut parts = s.split(',');
        let warning = parts
            .next()
            .and_then(|w| w.trim().parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let critical = match parts.next() {
            Some(c) => Some(c.trim().parse::<u32>().map_err(|_| invalid())?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        if let Some(critical) = critical {
            if critical > warning {
                return Err(ConfigError::CriticalAboveWarning { warning, critical });
            }
        }
        Ok(Self { warning, critical })
    }
}

impl fmt::Display for MinValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.critical {
            Some(critical) => write!(f, "{},{}", self.warning, critical),
            None => write!(f, "{}", self.warning),
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without going through the command line.
///
/// # Examples
///
/// ```no_run
/// use dane_check::{Config, StartTls};
///
/// let config = Config {
///     host: "mx.example.org".to_string(),
///     port: 25,
///     starttls: Some(StartTls::Smtp),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Hostname whose TLSA records and certificate are checked
    pub host: String,

    /// Port whose TLSA records and service are checked
    pub port: u16,

    /// Address to connect to, if different from `host`
    pub connect_host: Option<String>,

    /// Port to connect to, if different from `port`
    pub connect_port: Option<u16>,

    /// STARTTLS protocol to speak before the handshake
    pub starttls: Option<StartTls>,

    /// Require PKIX validation of the certificate chain
    pub check_pkix: bool,

    /// Warn or fail when the certificate expires soon
    pub min_validity: Option<MinValidity>,

    /// Accept DNS responses without the DNSSEC Authenticated-Data flag
    pub insecure: bool,

    /// Nameserver to query, `IP` or `IP:PORT`
    pub nameserver: Option<String>,

    /// Timeout in seconds for every network operation
    pub timeout_seconds: u64,

    /// Name announced in the SMTP `EHLO`
    pub client_name: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Config {
    /// Address actually connected to.
    pub fn connect_host(&self) -> &str {
        self.connect_host.as_deref().unwrap_or(&self.host)
    }

    /// Port actually connected to.
    pub fn connect_port(&self) -> u16 {
        self.connect_port.unwrap_or(self.port)
    }

    /// Timeout applied to every network operation.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Rejects configurations that cannot be checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if let Some(MinValidity {
            warning,
            critical: Some(critical),
        }) = self.min_validity
        {
            if critical > warning {
                return Err(ConfigError::CriticalAboveWarning { warning, critical });
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            connect_host: None,
            connect_port: None,
            starttls: None,
            check_pkix: false,
            min_validity: None,
            insecure: false,
            nameserver: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            log_level: LogLevel::Warn,
            log_format: LogFormat::Plain,
        }
    }
}

/// Command-line options.
///
/// This struct is automatically generated by `clap` from the field attributes.
///
/// # Examples
///
/// ```bash
/// # HTTPS on the default port
/// dane_check --host www.example.org
///
/// # SMTP with STARTTLS, warn 30 days and fail 7 days before expiry
/// dane_check --host mx.example.org --port 25 --starttls smtp --min-days-valid 30,7
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "dane_check",
    about = "Checks that a TLS service presents a certificate matching its DANE TLSA records."
)]
pub struct Opt {
    /// Hostname to check
    #[arg(short = 'H', long)]
    pub host: String,

    /// TCP port to check
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Connect to this host instead of --host (TLSA name and SNI still use --host)
    #[arg(long)]
    pub connect_host: Option<String>,

    /// Connect to this port instead of --port
    #[arg(long)]
    pub connect_port: Option<u16>,

    /// Negotiate TLS with STARTTLS for this protocol
    #[arg(long, value_enum)]
    pub starttls: Option<StartTls>,

    /// Also require PKIX validation of the certificate
    #[arg(long)]
    pub check_pkix: bool,

    /// Minimum days of certificate validity: WARNING[,CRITICAL]
    #[arg(short = 'd', long)]
    pub min_days_valid: Option<MinValidity>,

    /// Accept DNS responses that are not DNSSEC-authenticated
    #[arg(long)]
    pub insecure: bool,

    /// Nameserver to query (IP or IP:PORT), defaults to the system resolver
    #[arg(short, long)]
    pub nameserver: Option<String>,

    /// Timeout in seconds for each network operation
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Name announced in SMTP EHLO
    #[arg(long, default_value = DEFAULT_CLIENT_NAME)]
    pub client_name: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        Self {
            host: opt.host,
            port: opt.port,
            connect_host: opt.connect_host,
            connect_port: opt.connect_port,
            starttls: opt.starttls,
            check_pkix: opt.check_pkix,
            min_validity: opt.min_days_valid,
            insecure: opt.insecure,
            nameserver: opt.nameserver,
            timeout_seconds: opt.timeout,
            client_name: opt.client_name,
            log_level: opt.log_level,
            log_format: opt.log_format,
        }
    }
}

/// Condenses a rejected command line into one status-line message.
///
/// Drops clap's `error: ` prefix and the trailing usage hint.
pub fn usage_error_message(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    let message = first.strip_prefix("error: ").unwrap_or(first).trim();
    format!("Invalid command line: {message}")
}
