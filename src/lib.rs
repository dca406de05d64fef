//! Shared process bootstrap for the `sender` and `receiver` binaries:
//! log level parsing and IPv6-only address resolution. The control loops
//! themselves live in the `engine` crate.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use clap::ValueEnum;

/// Verbosity accepted by `--log-level`, mirroring the shape used across
/// this codebase's other binaries.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
#[clap(rename_all = "lower")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
        }
    }
}

/// Resolves `hostname:port` to an IPv6 socket address. The protocol is
/// IPv6-only; hosts that only resolve to IPv4 are rejected rather than
/// silently mapped.
pub fn resolve_ipv6(hostname: &str, port: u16) -> anyhow::Result<SocketAddr> {
    (hostname, port)
        .to_socket_addrs()?
        .find(|addr| matches!(addr.ip(), IpAddr::V6(_)))
        .ok_or_else(|| anyhow::anyhow!("{hostname} has no IPv6 address"))
}
