//! check_openhab - monitoring plugin for openHAB.
//!
//! Checks the state of an item, every member of a group, or the status of a
//! thing through the openHAB REST API. Prints one status report on stdout and
//! exits with 0 (OK), 1 (WARNING), 2 (CRITICAL) or 3 (UNKNOWN).
//!
//! ## Usage
//! ```bash
//! # Critical below 5, warning below 10
//! check_openhab -H openhab.lan -i Temperature -w 10: -c 5:
//!
//! # Every member of a group must be ON
//! check_openhab -i AllLights -g -r '^ON$'
//!
//! # Critical when the last update is older than a day
//! check_openhab -i LastUpdate --critical-time P1D:
//!
//! # Thing connectivity
//! check_openhab -t zwave:device:controller:node5
//! ```

mod api;
mod check;
mod config;
mod error;
mod report;
mod verdict;

use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::RestClient;
use check::{Evaluator, Target, ThresholdArgs, Thresholds, DEFAULT_MAX_DEPTH};
use config::{ConnectionConfig, Credentials};
use error::CheckError;
use report::Report;
use verdict::Verdict;

#[derive(Parser, Debug)]
#[command(
    name = "check_openhab",
    about = "Check openHAB items, groups and things",
    version
)]
struct Cli {
    /// openHAB host name or address [env: OPENHAB_HOST, default: localhost]
    #[arg(short = 'H', long)]
    hostname: Option<String>,

    /// openHAB port [env: OPENHAB_PORT, default: 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Connect over https.
    #[arg(short, long)]
    ssl: bool,

    /// REST API base path [default: rest]
    #[arg(long)]
    path: Option<String>,

    /// Basic-auth user name [env: OPENHAB_USERNAME]
    #[arg(short, long)]
    username: Option<String>,

    /// Basic-auth password [env: OPENHAB_PASSWORD]
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Name of the item to check.
    #[arg(short, long)]
    item: Option<String>,

    /// UID of the thing to check.
    #[arg(short, long)]
    thing: Option<String>,

    /// Treat the item as a group and check all of its members.
    #[arg(short, long)]
    group: bool,

    /// Numeric warning range <low>:<high>; either side may be empty.
    #[arg(short, long, allow_hyphen_values = true)]
    warning: Option<String>,

    /// Numeric critical range <low>:<high>; either side may be empty.
    #[arg(short, long, allow_hyphen_values = true)]
    critical: Option<String>,

    /// Time warning range; bounds are dates or ISO-8601 durations (P1D, PT2H).
    #[arg(long)]
    warning_time: Option<String>,

    /// Time critical range; bounds are dates or ISO-8601 durations (P1D, PT2H).
    #[arg(long)]
    critical_time: Option<String>,

    /// OK when the state matches this regex, CRITICAL otherwise.
    #[arg(short, long)]
    regex: Option<String>,

    /// CRITICAL when the regex matches, OK otherwise.
    #[arg(long)]
    invert_regex: bool,

    /// Status reported for uninitialized items: ok, warning, critical, unknown.
    #[arg(short = 'U', long, default_value = "unknown")]
    uninitialized_status: Verdict,

    /// Request timeout in seconds [env: OPENHAB_TIMEOUT, default: 10]
    #[arg(long, value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Maximum group nesting depth.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH, value_parser = parse_max_depth)]
    max_depth: usize,

    /// Accept invalid TLS certificates.
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Verbose logging on stderr (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn threshold_args(&self) -> ThresholdArgs {
        ThresholdArgs {
            warning: self.warning.clone(),
            critical: self.critical.clone(),
            warning_time: self.warning_time.clone(),
            critical_time: self.critical_time.clone(),
            regex: self.regex.clone(),
            invert_regex: self.invert_regex,
        }
    }

    /// Apply command line overrides on top of `base`.
    fn connection_config(&self, base: ConnectionConfig) -> ConnectionConfig {
        let mut cfg = base;

        if let Some(host) = &self.hostname {
            cfg.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if self.ssl {
            cfg.ssl = true;
        }
        if let Some(path) = &self.path {
            cfg.path = path.clone();
        }
        if let Some(username) = &self.username {
            let password = self
                .password
                .clone()
                .or_else(|| cfg.credentials.take().and_then(|c| c.password));
            cfg.credentials = Some(Credentials {
                username: username.clone(),
                password,
            });
        } else if let (Some(password), Some(creds)) = (&self.password, cfg.credentials.as_mut()) {
            creds.password = Some(password.clone());
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout = timeout;
        }
        if self.insecure {
            cfg.insecure = true;
        }

        cfg
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        Ok(_) => Err(format!("timeout must be positive, got {}", value)),
        Err(e) => Err(format!("invalid timeout {}: {}", value, e)),
    }
}

fn parse_max_depth(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("max depth must be at least 1".to_string()),
        Ok(depth) => Ok(depth),
        Err(_) => Err(format!("'{}' is not a depth", value)),
    }
}

fn init_tracing(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries the status report, so logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(format!("check_openhab={}", level).parse()?))
        .try_init()?;

    Ok(())
}

async fn execute(cli: &Cli) -> Result<Report, CheckError> {
    let target = Target::resolve(cli.item.clone(), cli.thing.clone(), cli.group)?;

    let thresholds = Thresholds::from_args(&cli.threshold_args(), Utc::now())?;
    let evaluator = Evaluator::new(thresholds, cli.uninitialized_status);
    tracing::debug!("Using {} thresholds", evaluator.thresholds().kind());

    let config = cli.connection_config(ConnectionConfig::load());
    tracing::info!("Checking {:?} at {}", target, config.base_url());
    let client = RestClient::new(config)?;

    check::run(&target, &evaluator, &client, cli.max_depth).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(Verdict::Unknown.exit_code()),
            };
        }
    };

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("failed to initialise logging: {}", e);
    }

    let report = match execute(&cli).await {
        Ok(report) => report,
        Err(e) => {
            tracing::debug!("Check failed: {:?}", e);
            Report::error(&e)
        }
    };

    println!("{}", report);
    ExitCode::from(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("check_openhab").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["-i", "Temp"]);
        assert_eq!(cli.uninitialized_status, Verdict::Unknown);
        assert_eq!(cli.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!cli.group);

        let cfg = cli.connection_config(ConnectionConfig::default());
        assert_eq!(cfg.item_url("Temp"), "http://localhost:8080/rest/items/Temp");
        assert!(cfg.credentials.is_none());
    }

    #[test]
    fn test_negative_ranges_are_accepted() {
        let cli = parse(&["-i", "Outside", "-w", "-5:30", "-c", "-10:"]);
        let args = cli.threshold_args();
        assert_eq!(args.warning.as_deref(), Some("-5:30"));
        assert_eq!(args.critical.as_deref(), Some("-10:"));
    }

    #[test]
    fn test_threshold_args() {
        let cli = parse(&[
            "-i",
            "Door",
            "--critical-time",
            "P1D:",
            "-r",
            "CLOSED",
            "--invert-regex",
            "-U",
            "critical",
        ]);
        let args = cli.threshold_args();
        assert_eq!(args.critical_time.as_deref(), Some("P1D:"));
        assert_eq!(args.regex.as_deref(), Some("CLOSED"));
        assert!(args.invert_regex);
        assert!(args.warning.is_none());
        assert_eq!(cli.uninitialized_status, Verdict::Critical);
    }

    #[test]
    fn test_connection_overrides() {
        let cli = parse(&[
            "-t", "hue:bridge:1", "-H", "hab", "-p", "8443", "-s", "-u", "admin", "-P", "pw",
            "--timeout", "1.5", "-k",
        ]);
        let base = ConnectionConfig {
            credentials: Some(Credentials {
                username: "env-user".to_string(),
                password: Some("env-pw".to_string()),
            }),
            ..Default::default()
        };
        let cfg = cli.connection_config(base);
        assert_eq!(cfg.thing_url("hue:bridge:1"), "https://hab:8443/rest/things/hue:bridge:1");
        assert_eq!(
            cfg.credentials,
            Some(Credentials {
                username: "admin".to_string(),
                password: Some("pw".to_string()),
            })
        );
        assert_eq!(cfg.timeout, Duration::from_millis(1500));
        assert!(cfg.insecure);
    }

    #[test]
    fn test_password_only_overrides_env_credentials() {
        let cli = parse(&["-i", "Temp", "-P", "cli-pw"]);
        let base = ConnectionConfig {
            credentials: Some(Credentials {
                username: "env-user".to_string(),
                password: None,
            }),
            ..Default::default()
        };
        let creds = cli.connection_config(base).credentials.unwrap();
        assert_eq!(creds.username, "env-user");
        assert_eq!(creds.password.as_deref(), Some("cli-pw"));
    }

    #[test]
    fn test_invalid_cli_values() {
        let bad = [
            vec!["check_openhab", "-i", "T", "-U", "maybe"],
            vec!["check_openhab", "-i", "T", "--timeout", "0"],
            vec!["check_openhab", "-i", "T", "--timeout", "soon"],
            vec!["check_openhab", "-i", "T", "-p", "99999"],
            vec!["check_openhab", "-i", "T", "--timeout", "inf"],
            vec!["check_openhab", "-i", "T", "--timeout", "1e30"],
            vec!["check_openhab", "-i", "T", "--timeout", "-1"],
            vec!["check_openhab", "-i", "T", "--max-depth", "0"],
        ];
        for args in bad {
            assert!(Cli::try_parse_from(args.iter().copied()).is_err(), "{:?}", args);
        }
    }

    #[test]
    fn test_max_depth() {
        assert_eq!(parse(&["-i", "G", "-g", "--max-depth", "1"]).max_depth, 1);
        assert_eq!(parse(&["-i", "G", "-g", "--max-depth", "40"]).max_depth, 40);
    }

    #[tokio::test]
    async fn test_configuration_errors_fail_before_fetching() {
        // Nothing listens on port 9; reaching the network would be a transport error.
        let cli = parse(&["-i", "Temp", "-t", "thing", "-p", "9"]);
        let err = execute(&cli).await.unwrap_err();
        assert!(matches!(err, CheckError::ConfigurationConflict(_)));

        let cli = parse(&["-i", "Temp", "-c", "1:2:3", "-p", "9"]);
        let err = execute(&cli).await.unwrap_err();
        assert!(matches!(err, CheckError::MalformedThreshold(_)));
        assert_eq!(Report::error(&err).exit_code(), 3);

        let cli = parse(&["-i", "Temp", "-r", "[", "-p", "9"]);
        let err = execute(&cli).await.unwrap_err();
        assert!(matches!(err, CheckError::InvalidRegex { .. }));
    }
}
