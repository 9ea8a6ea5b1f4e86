//! Flag parsing for the hub's deployment configuration.

use std::time::Duration;

use teledeck_hub::config::{parse_args, DEFAULT_INGEST_PORT, DEFAULT_WS_PORT, MIN_TICK_MS};

fn args(list: &[&str]) -> Vec<String> {
    std::iter::once("teledeck_hub")
        .chain(list.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn defaults_when_no_flags() {
    let cfg = parse_args(args(&[])).unwrap();
    assert_eq!(cfg.ws_port, DEFAULT_WS_PORT);
    assert_eq!(cfg.ingest_port, DEFAULT_INGEST_PORT);
    assert_eq!(cfg.tick, Duration::from_millis(2_000));
}

#[test]
fn long_short_and_assign_forms() {
    let cfg = parse_args(args(&["--ws-port", "9001", "-i", "9002", "--tick-ms=500"])).unwrap();
    assert_eq!(cfg.ws_port, 9001);
    assert_eq!(cfg.ingest_port, 9002);
    assert_eq!(cfg.tick, Duration::from_millis(500));

    let cfg = parse_args(args(&["-w", "9003", "--ingest-port=9004", "-t", "1000"])).unwrap();
    assert_eq!(cfg.ws_port, 9003);
    assert_eq!(cfg.ingest_port, 9004);
    assert_eq!(cfg.tick, Duration::from_millis(1_000));
}

#[test]
fn tick_is_clamped_to_the_floor() {
    let cfg = parse_args(args(&["--tick-ms", "1"])).unwrap();
    assert_eq!(cfg.tick, Duration::from_millis(MIN_TICK_MS));
}

#[test]
fn help_and_junk_yield_usage() {
    assert!(parse_args(args(&["--help"])).is_err());
    assert!(parse_args(args(&["--bogus"])).is_err());
    assert!(parse_args(args(&["--ws-port", "not-a-port"])).is_err());
    assert!(parse_args(args(&["--ws-port"])).is_err());
}
