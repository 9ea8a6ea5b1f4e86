//! Deployment configuration: listener ports and the sampling cadence.
//! Flags win over env vars; env vars win over defaults.

use std::time::Duration;

pub const DEFAULT_WS_PORT: u16 = 3001;
pub const DEFAULT_INGEST_PORT: u16 = 3002;
pub const DEFAULT_TICK_MS: u64 = 2_000;

/// Floor for the sampling cadence so a typo cannot spin the sampler hot.
pub const MIN_TICK_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ws_port: u16,
    pub ingest_port: u16,
    pub tick: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ws_port: DEFAULT_WS_PORT,
            ingest_port: DEFAULT_INGEST_PORT,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl Config {
    /// Defaults overridden by TELEDECK_WS_PORT / TELEDECK_INGEST_PORT /
    /// TELEDECK_TICK_MS where set and parseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(p) = env_parse::<u16>("TELEDECK_WS_PORT") {
            cfg.ws_port = p;
        }
        if let Some(p) = env_parse::<u16>("TELEDECK_INGEST_PORT") {
            cfg.ingest_port = p;
        }
        if let Some(ms) = env_parse::<u64>("TELEDECK_TICK_MS") {
            cfg.tick = Duration::from_millis(ms.max(MIN_TICK_MS));
        }
        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--ws-port PORT|-w PORT] [--ingest-port PORT|-i PORT] [--tick-ms MS|-t MS]"
    )
}

/// Parse CLI flags on top of the env-derived config. Returns the usage
/// string as an error for `--help` or anything malformed.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Config, String> {
    let mut cfg = Config::from_env();
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "teledeck_hub".into());

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--ws-port" | "-w" => cfg.ws_port = parse_value(&prog, it.next())?,
            "--ingest-port" | "-i" => cfg.ingest_port = parse_value(&prog, it.next())?,
            "--tick-ms" | "-t" => {
                let ms: u64 = parse_value(&prog, it.next())?;
                cfg.tick = Duration::from_millis(ms.max(MIN_TICK_MS));
            }
            _ if arg.starts_with("--ws-port=") => {
                cfg.ws_port = parse_value(&prog, arg.split_once('=').map(|(_, v)| v.to_string()))?;
            }
            _ if arg.starts_with("--ingest-port=") => {
                cfg.ingest_port =
                    parse_value(&prog, arg.split_once('=').map(|(_, v)| v.to_string()))?;
            }
            _ if arg.starts_with("--tick-ms=") => {
                let ms: u64 =
                    parse_value(&prog, arg.split_once('=').map(|(_, v)| v.to_string()))?;
                cfg.tick = Duration::from_millis(ms.max(MIN_TICK_MS));
            }
            _ => return Err(usage(&prog)),
        }
    }
    Ok(cfg)
}

fn parse_value<T: std::str::FromStr>(prog: &str, value: Option<String>) -> Result<T, String> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| usage(prog))
}
