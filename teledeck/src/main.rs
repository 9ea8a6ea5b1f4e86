//! Entry point for the headless viewer. Connects to a hub, then prints
//! status transitions and incoming frames until interrupted.

use std::env;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use teledeck::conn::DEFAULT_RETRY_DELAY;
use teledeck::types::ServerFrame;
use teledeck::viewer;

struct ParsedArgs {
    url: String,
    retry_delay: Duration,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "teledeck".into());
    let mut url: Option<String> = None;
    let mut retry_delay = DEFAULT_RETRY_DELAY;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                return Err(format!(
                    "Usage: {prog} [--retry-ms MS|-r MS] ws://HOST:PORT/ws"
                ));
            }
            "--retry-ms" | "-r" => {
                let ms = it
                    .next()
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or_else(|| format!("Usage: {prog} [--retry-ms MS|-r MS] ws://HOST:PORT/ws"))?;
                retry_delay = Duration::from_millis(ms.max(1));
            }
            _ => {
                if url.is_none() {
                    url = Some(arg);
                } else {
                    return Err(format!(
                        "Unexpected argument. Usage: {prog} [--retry-ms MS|-r MS] ws://HOST:PORT/ws"
                    ));
                }
            }
        }
    }

    let url = url.ok_or_else(|| format!("Usage: {prog} [--retry-ms MS|-r MS] ws://HOST:PORT/ws"))?;
    Ok(ParsedArgs { url, retry_delay })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let mut handle = viewer::spawn(parsed.url, parsed.retry_delay);

    loop {
        tokio::select! {
            changed = handle.status.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(event = "status", state = ?*handle.status.borrow());
            }
            frame = handle.frames.recv() => match frame {
                Some(ServerFrame::HardwareTelemetry { data, timestamp }) => {
                    info!(
                        event = "telemetry",
                        cpu_pct = data.cpu.usage_percent,
                        mem_pct = data.memory.usage_percent,
                        mem_used_gb = %data.memory.used_gb,
                        mem_total_gb = %data.memory.total_gb,
                        gpu = %data.gpu.name,
                        gpu_pct = ?data.gpu.usage_percent,
                        timestamp = ?timestamp,
                    );
                }
                Some(ServerFrame::AgentUpdate { data }) => {
                    info!(event = "agent_update", payload = %data);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown();
    handle.join().await;
    Ok(())
}
