#![deny(warnings)]

//! A single-shot command client: connect to a literal IP address, send one length-prefixed command, read one reply.

pub mod address;
pub mod connection;
pub mod error;
pub mod exchange;

pub use {
    address::{parse_port, resolve, HostAddress, NetworkAddress},
    connection::{Connection, ConnectionState},
    error::{Error, Result},
    exchange::{
        exchange, receive_response, send_command, Command, Response, MAX_COMMAND_LEN,
        RESPONSE_CAPACITY,
    },
};

use tracing::log;

/// Validate the three raw arguments and run one exchange.  Nothing touches the network until all of them are valid.
pub fn run(ip_address: &str, port: &str, command: &str) -> Result<Response> {
    let port = parse_port(port)?;
    let address = resolve(ip_address)?.with_port(port);
    let command = Command::try_from(command)?;

    let response = exchange(&address, &command)?;

    log::info!("Read bytes: {}", response.len());

    Ok(response)
}
