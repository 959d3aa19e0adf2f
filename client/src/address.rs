//! Literal IP address detection and port parsing.
//!
//! Nothing here touches the network: hostnames are rejected rather than looked up, and the port stays in host byte
//! order until [`NetworkAddress::to_sockaddr`] lowers the whole address for the OS.

use {
    crate::error::{Error, Result},
    socket2::SockAddr,
    std::{
        fmt,
        net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
        str::FromStr,
    },
    tracing::log,
};

/// A literal host address of either family.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostAddress {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
}

impl HostAddress {
    pub fn family(&self) -> &'static str {
        match self {
            HostAddress::V4(_) => "IPv4",
            HostAddress::V6(_) => "IPv6",
        }
    }

    /// The binary address: 4 bytes for IPv4, 16 for IPv6.
    pub fn octets(&self) -> Vec<u8> {
        match self {
            HostAddress::V4(ip) => ip.octets().to_vec(),
            HostAddress::V6(ip) => ip.octets().to_vec(),
        }
    }

    pub fn with_port(self, port: u16) -> NetworkAddress {
        NetworkAddress::new(self, port)
    }
}

impl From<IpAddr> for HostAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip) => HostAddress::V4(ip),
            IpAddr::V6(ip) => HostAddress::V6(ip),
        }
    }
}

impl From<HostAddress> for IpAddr {
    fn from(host: HostAddress) -> Self {
        match host {
            HostAddress::V4(ip) => IpAddr::V4(ip),
            HostAddress::V6(ip) => IpAddr::V6(ip),
        }
    }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAddress::V4(ip) => write!(f, "{ip}"),
            HostAddress::V6(ip) => write!(f, "{ip}"),
        }
    }
}

/// Detect the address family of `text`, trying IPv4 before IPv6.
pub fn resolve(text: &str) -> Result<HostAddress> {
    let host = if let Ok(ip) = Ipv4Addr::from_str(text) {
        HostAddress::V4(ip)
    } else if let Ok(ip) = Ipv6Addr::from_str(text) {
        HostAddress::V6(ip)
    } else {
        return Err(Error::InvalidAddress(text.to_owned()));
    };

    log::info!("{} found", host.family());

    Ok(host)
}

/// Parse a base-10 port number.  Only ASCII digits are accepted, so signs, whitespace, and trailing junk are all
/// `InvalidPort`; anything numeric that doesn't fit in 16 bits is `PortOutOfRange`.
pub fn parse_port(text: &str) -> Result<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPort(text.to_owned()));
    }

    text.parse::<u64>()
        .ok()
        .and_then(|value| u16::try_from(value).ok())
        .ok_or_else(|| Error::PortOutOfRange(text.to_owned()))
}

/// A resolved host plus a port, both in host byte order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NetworkAddress {
    host: HostAddress,
    port: u16,
}

impl NetworkAddress {
    pub fn new(host: HostAddress, port: u16) -> Self {
        Self { host, port }
    }

    pub fn host(&self) -> HostAddress {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The port as it appears on the wire and in `sin_port`/`sin6_port`.
    pub fn network_port(&self) -> [u8; 2] {
        self.port.to_be_bytes()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host.into(), self.port)
    }

    /// Lower into the OS representation handed to `connect(2)`.
    pub fn to_sockaddr(&self) -> SockAddr {
        SockAddr::from(self.socket_addr())
    }
}

impl From<SocketAddr> for NetworkAddress {
    fn from(address: SocketAddr) -> Self {
        Self::new(address.ip().into(), address.port())
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
