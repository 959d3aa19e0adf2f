//! The one-shot request/response exchange.
//!
//! Client to server: `[u8 length][length bytes of command]`.  Server to client: whatever arrives in a single read of
//! up to [`RESPONSE_CAPACITY`] bytes, unframed.

use {
    crate::{
        address::NetworkAddress,
        connection::Connection,
        error::{Error, Result},
    },
    std::{
        fmt,
        io::{self, Read, Write},
    },
    tracing::log,
};

pub const MAX_COMMAND_LEN: usize = u8::MAX as usize;

pub const RESPONSE_CAPACITY: usize = 1024;

/// A command short enough for its length to fit in the one-byte prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct Command(Vec<u8>);

impl Command {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > MAX_COMMAND_LEN {
            Err(Error::CommandTooLong(bytes.len()))
        } else {
            Ok(Self(bytes))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The length prefix followed by the payload.
    pub fn frame(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(1 + self.0.len());
        // `new` guarantees this fits.
        frame.push(self.0.len() as u8);
        frame.extend_from_slice(&self.0);
        frame
    }
}

impl TryFrom<&str> for Command {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Self::new(text.as_bytes())
    }
}

impl TryFrom<String> for Command {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        Self::new(text.into_bytes())
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// The bytes delivered by the single receive call.
#[derive(Clone)]
pub struct Response {
    buffer: [u8; RESPONSE_CAPACITY],
    len: usize,
}

impl Response {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the peer closed (or sent nothing) before the read completed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for Response {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("len", &self.len)
            .field("bytes", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

/// Write the framed command in full.  A short write is reported as a fault rather than retried past.
pub fn send_command<W: Write>(stream: &mut W, command: &Command) -> Result<()> {
    stream
        .write_all(&command.frame())
        .and_then(|()| stream.flush())
        .map_err(Error::TransmissionFault)?;

    log::debug!("sent {} byte command", command.len());

    Ok(())
}

/// Perform exactly one read of at most [`RESPONSE_CAPACITY`] bytes.  Zero bytes is a valid outcome.
pub fn receive_response<R: Read>(stream: &mut R) -> Result<Response> {
    let mut buffer = [0; RESPONSE_CAPACITY];
    let len = loop {
        match stream.read(&mut buffer) {
            Ok(len) => break len,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::TransmissionFault(e)),
        }
    };

    Ok(Response { buffer, len })
}

/// Connect, send `command`, read the reply, and close.  The response is only returned if the close succeeded too.
pub fn exchange(address: &NetworkAddress, command: &Command) -> Result<Response> {
    let mut connection = Connection::connect(address)?;

    send_command(&mut connection, command)?;
    let response = receive_response(&mut connection)?;
    connection.close()?;

    Ok(response)
}
