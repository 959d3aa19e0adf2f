#![deny(warnings)]

use {
    anyhow::{Context, Error, Result},
    bytes::{Buf, Bytes, BytesMut},
    futures::{FutureExt, StreamExt},
    std::{future::Future, io, net::SocketAddr, sync::Arc},
    tokio::{
        io::AsyncWriteExt,
        net::TcpListener,
        task,
    },
    tokio_util::codec::{Decoder, FramedRead},
    tracing::log,
};

/// Decodes `[u8 length][length bytes]` frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandCodec;

impl Decoder for CommandCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Bytes>> {
        let Some(&len) = src.first() else {
            return Ok(None);
        };

        let frame_len = 1 + usize::from(len);
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(1);
        Ok(Some(src.split_to(usize::from(len)).freeze()))
    }
}

/// Accept connections on `address`, read one framed command from each, and write back `handler`'s reply unframed
/// before closing.  Returns the accept loop along with the address actually bound.
pub async fn serve_commands<F>(
    address: SocketAddr,
    handler: F,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)>
where
    F: Fn(Bytes) -> Bytes + Send + Sync + 'static,
{
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Unable to listen on {address}"))?;

    let address = listener.local_addr()?;
    let handler = Arc::new(handler);

    Ok((
        async move {
            loop {
                let (stream, peer) = listener.accept().await?;
                let handler = handler.clone();

                task::spawn(
                    async move {
                        let (reader, mut writer) = stream.into_split();
                        let mut commands = FramedRead::new(reader, CommandCodec);

                        match commands.next().await {
                            Some(command) => {
                                let command = command?;
                                log::debug!("{peer} sent {} byte command", command.len());
                                writer.write_all(&(*handler)(command)).await?;
                            }
                            None => log::debug!("{peer} closed without sending a command"),
                        }

                        writer.shutdown().await?;

                        Ok::<_, Error>(())
                    }
                    .map(move |result| {
                        if let Err(e) = result {
                            log::warn!("error handling connection from {peer}: {e:?}");
                        }
                    }),
                );
            }
        }
        .boxed(),
        address,
    ))
}

/// Reply to every command with the command itself.
pub async fn serve_echo(
    address: SocketAddr,
) -> Result<(impl Future<Output = Result<()>>, SocketAddr)> {
    serve_commands(address, |command| command).await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        command_client::{exchange, Command, NetworkAddress, Response},
        futures::{channel::oneshot, future},
        std::{
            net::{Ipv4Addr, Ipv6Addr},
            sync::Once,
        },
        tokio::net::TcpStream,
    };

    fn init_logging() {
        static ONCE: Once = Once::new();
        ONCE.call_once(pretty_env_logger::init);
    }

    /// Run `server` in the background for as long as the returned sender lives.
    fn spawn_server(
        server: impl Future<Output = Result<()>> + Unpin + Send + 'static,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel::<()>();

        task::spawn(async move {
            drop(future::select(server, rx).await);
        });

        tx
    }

    async fn send(address: SocketAddr, command: &str) -> Result<Response> {
        let address = NetworkAddress::from(address);
        let command = Command::try_from(command)?;
        Ok(task::spawn_blocking(move || exchange(&address, &command)).await??)
    }

    fn hello_world(command: Bytes) -> Bytes {
        if command.as_ref() == b"hello" {
            Bytes::from_static(b"world")
        } else {
            Bytes::from_static(b"?")
        }
    }

    #[test]
    fn decode_waits_for_a_whole_frame() {
        let mut codec = CommandCodec;
        let mut buffer = BytesMut::new();
        assert_eq!(None, codec.decode(&mut buffer).unwrap());

        buffer.extend_from_slice(b"\x05hel");
        assert_eq!(None, codec.decode(&mut buffer).unwrap());

        buffer.extend_from_slice(b"lo\x00\x02hi");
        assert_eq!(
            Some(Bytes::from_static(b"hello")),
            codec.decode(&mut buffer).unwrap()
        );
        assert_eq!(Some(Bytes::new()), codec.decode(&mut buffer).unwrap());
        assert_eq!(
            Some(Bytes::from_static(b"hi")),
            codec.decode(&mut buffer).unwrap()
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn truncated_frame_at_eof_is_an_error() {
        let mut codec = CommandCodec;
        let mut buffer = BytesMut::from(&b"\x05he"[..]);
        assert!(codec.decode_eof(&mut buffer).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn direct_ipv4() -> Result<()> {
        init_logging();

        let (server, address) = serve_commands((Ipv4Addr::LOCALHOST, 0).into(), hello_world).await?;
        let _server = spawn_server(server);

        assert_eq!(b"world", send(address, "hello").await?.as_bytes());
        assert_eq!(b"?", send(address, "goodbye").await?.as_bytes());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn direct_ipv6() -> Result<()> {
        init_logging();

        let Ok((server, address)) =
            serve_commands((Ipv6Addr::LOCALHOST, 0).into(), hello_world).await
        else {
            log::warn!("no IPv6 loopback; skipping");
            return Ok(());
        };
        let _server = spawn_server(server);

        assert_eq!(b"world", send(address, "hello").await?.as_bytes());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn echo_longest_command() -> Result<()> {
        init_logging();

        let (server, address) = serve_echo((Ipv4Addr::LOCALHOST, 0).into()).await?;
        let _server = spawn_server(server);

        let command = "z".repeat(255);
        assert_eq!(command.as_bytes(), send(address, &command).await?.as_bytes());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn silent_handler_yields_empty_response() -> Result<()> {
        init_logging();

        let (server, address) =
            serve_commands((Ipv4Addr::LOCALHOST, 0).into(), |_| Bytes::new()).await?;
        let _server = spawn_server(server);

        assert!(send(address, "anyone there?").await?.is_empty());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn truncated_frame_does_not_stop_the_server() -> Result<()> {
        init_logging();

        let (server, address) = serve_echo((Ipv4Addr::LOCALHOST, 0).into()).await?;
        let _server = spawn_server(server);

        let mut stream = TcpStream::connect(address).await?;
        stream.write_all(b"\x05he").await?;
        stream.shutdown().await?;
        drop(stream);

        assert_eq!(b"still here", send(address, "still here").await?.as_bytes());

        Ok(())
    }
}
