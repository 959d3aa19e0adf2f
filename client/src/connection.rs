use {
    crate::{
        address::NetworkAddress,
        error::{Error, Result},
    },
    socket2::{Domain, Protocol, Socket, Type},
    std::io::{self, Read, Write},
    tracing::log,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Closed,
}

/// A single blocking TCP connection.  Owns exactly one socket handle from `connect` until `close`.
#[derive(Debug)]
pub struct Connection {
    socket: Option<Socket>,
    peer: NetworkAddress,
}

impl Connection {
    /// Create a stream socket for `address`'s family and connect it.  No timeout is configured, so this blocks for as
    /// long as the OS lets `connect(2)` block.
    pub fn connect(address: &NetworkAddress) -> Result<Self> {
        let socket = Socket::new(
            Domain::for_address(address.socket_addr()),
            Type::STREAM,
            Some(Protocol::TCP),
        )
        .map_err(Error::SocketCreateFailed)?;

        log::info!("Connecting to {address}");

        socket
            .connect(&address.to_sockaddr())
            .map_err(|source| Error::ConnectFailed {
                address: *address,
                source,
            })?;

        log::info!("Connected to {address}");

        Ok(Self {
            socket: Some(socket),
            peer: *address,
        })
    }

    pub fn state(&self) -> ConnectionState {
        if self.socket.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Closed
        }
    }

    pub fn peer(&self) -> &NetworkAddress {
        &self.peer
    }

    /// Release the socket handle.  Once closed, further calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        match self.socket.take() {
            Some(socket) => {
                log::debug!("closing connection to {}", self.peer);
                release(socket)
            }
            None => Ok(()),
        }
    }

    fn socket(&mut self) -> io::Result<&mut Socket> {
        self.socket
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection is closed"))
    }
}

// `Socket`'s own `Drop` discards the result of `close(2)`, so hand the descriptor back and close it ourselves.
#[cfg(unix)]
fn release(socket: Socket) -> Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = socket.into_raw_fd();
    if unsafe { libc::close(fd) } == -1 {
        Err(Error::CloseFailed(io::Error::last_os_error()))
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn release(socket: Socket) -> Result<()> {
    drop(socket);
    Ok(())
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket()?.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.socket()?.flush()
    }
}
