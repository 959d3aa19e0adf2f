use {crate::address::NetworkAddress, std::io};

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the client can hit.  None of these are recoverable; callers are expected to report and exit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid port {0:?}: expected a base-10 unsigned integer")]
    InvalidPort(String),

    #[error("port {0} out of range: must be between 0 and 65535")]
    PortOutOfRange(String),

    #[error("{0} is not an IPv4 or IPv6 address")]
    InvalidAddress(String),

    #[error("command is {0} bytes long; at most 255 bytes fit in the length prefix")]
    CommandTooLong(usize),

    #[error("socket creation failed")]
    SocketCreateFailed(#[source] io::Error),

    #[error("unable to connect to {address}")]
    ConnectFailed {
        address: NetworkAddress,
        #[source]
        source: io::Error,
    },

    #[error("error closing socket")]
    CloseFailed(#[source] io::Error),

    #[error("transmission fault")]
    TransmissionFault(#[source] io::Error),
}
