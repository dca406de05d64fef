#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::Parser;
use engine::{accept, run_receiver};
use rft::{resolve_ipv6, LogLevel};
use tokio::fs::File;
use tokio::net::UdpSocket;

#[derive(Parser)]
#[command(about = env!("CARGO_PKG_DESCRIPTION"), version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Local hostname to bind to.
    hostname: String,

    /// Local port, in 1..=65535.
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// File to write to. Defaults to standard output.
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Receive window capacity, at most 31.
    #[arg(long, default_value_t = u32::from(codec::MAX_WINDOW_SIZE), value_parser = clap::value_parser!(u32).range(1..=31))]
    window_capacity: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simple_logger::init_with_level(cli.log_level.as_level())?;

    let bind_addr = resolve_ipv6(&cli.hostname, cli.port)?;
    let socket = UdpSocket::bind(bind_addr).await?;
    log::info!("listening on {}", socket.local_addr()?);

    let _peer = accept(&socket).await?;

    let run = async {
        match cli.file {
            Some(path) => {
                let file = File::create(&path).await?;
                run_receiver(&socket, file, cli.window_capacity).await
            }
            None => run_receiver(&socket, tokio::io::stdout(), cli.window_capacity).await,
        }
    };

    tokio::select! {
        result = run => result?,
        _ = tokio::signal::ctrl_c() => {
            log::info!("received interrupt, shutting down");
        }
    }

    log::info!("transfer complete");
    Ok(())
}
