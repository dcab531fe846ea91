//! `judo-server --serve <port>`: hosts tournaments for remote
//! participants. Exit codes: 0 normal, 2 bind failure, 3 load failure.

use std::process::ExitCode;

use judo_core::tournament::Tournament;
use judo_net::Host;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn parse_port(args: &[String]) -> Option<u16> {
    let pos = args.iter().position(|a| a == "--serve")?;
    args.get(pos + 1)?.parse().ok()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(port) = parse_port(&args) else {
        eprintln!("usage: judo-server --serve <port>");
        return ExitCode::from(2);
    };

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, port, "failed to bind");
            return ExitCode::from(2);
        }
    };

    let host = Host::new();
    let salt = chrono::Utc::now();
    let id = judo_core::identifiers::id_from_item(salt, "default");
    let default_tournament = Tournament::new(id, "Open Tournament".to_string(), salt);
    if let Err(err) = host.publish("default".to_string(), default_tournament).await {
        error!(%err, "failed to publish default tournament");
        return ExitCode::from(3);
    }

    info!(port, "judo-server listening");
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                error!(%err, "accept failed");
                continue;
            }
        };
        let host = host.clone();
        tokio::spawn(async move {
            info!(%peer, "connection accepted");
            if let Err(err) = host.accept(stream).await {
                error!(%err, %peer, "session ended with error");
            }
        });
    }
}
