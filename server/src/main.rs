#![deny(warnings)]

use {
    anyhow::{Context, Result},
    command_server::serve_commands,
    std::{env, net::SocketAddr},
    tracing::log,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let address = env::args().nth(1).unwrap_or_else(|| "127.0.0.1:5001".to_owned());
    let address = address
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address {address:?}"))?;

    let (server, address) = serve_commands(address, |command| {
        log::info!("command: {:?}", String::from_utf8_lossy(&command));
        command
    })
    .await?;

    log::info!("listening on {address}");

    server.await
}
