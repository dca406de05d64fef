#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::Parser;
use engine::{run_sender, DEFAULT_TIMER_MICROS};
use rft::{resolve_ipv6, LogLevel};
use tokio::fs::File;
use tokio::net::UdpSocket;

#[derive(Parser)]
#[command(about = env!("CARGO_PKG_DESCRIPTION"), version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Receiver hostname.
    hostname: String,

    /// Receiver port, in 1..=65535.
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// File to read from. Defaults to standard input.
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Retransmission timer, in microseconds.
    #[arg(long, default_value_t = DEFAULT_TIMER_MICROS)]
    timer_micros: u32,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    simple_logger::init_with_level(cli.log_level.as_level())?;

    let peer = resolve_ipv6(&cli.hostname, cli.port)?;
    let socket = UdpSocket::bind("[::]:0").await?;
    socket.connect(peer).await?;
    log::info!("sending to {peer}");

    let capacity = u32::from(codec::MAX_WINDOW_SIZE);

    match cli.file {
        Some(path) => {
            let file = File::open(&path).await?;
            run_sender(&socket, file, capacity, cli.timer_micros).await?;
        }
        None => {
            run_sender(&socket, tokio::io::stdin(), capacity, cli.timer_micros).await?;
        }
    }

    log::info!("transfer complete");
    Ok(())
}
