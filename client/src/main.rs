#![deny(warnings)]

use {
    anyhow::Result,
    clap::Parser,
    std::{
        io::{self, Write},
        process::ExitCode,
    },
};

/// Send one length-prefixed command to a server and print its reply
#[derive(Parser, Debug)]
#[command(override_usage = "command-client [-h] <IP_ADDRESS> <PORT> <COMMAND>")]
struct Args {
    /// Literal IPv4 or IPv6 address of the server (no hostnames)
    ip_address: String,

    /// Server port, 0-65535
    port: String,

    /// Command to send; at most 255 bytes
    command: String,
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let response = command_client::run(&args.ip_address, &args.port, &args.command)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(response.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
