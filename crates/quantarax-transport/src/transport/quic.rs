//! QUIC-based connection substrate: `dial`/`listen` and multiplexed streams
//!
//! ALPN `"quantarax-quic"` is used for direct transfers and `"quic-relay"`
//! for relay control streams (see module docs for the relay wire contract).

use std::net::SocketAddr;
use std::time::Duration;

use quinn::{ClientConfig, Endpoint, RecvStream, SendStream, ServerConfig};

use super::tls_config::{self, TlsIdentity};
use crate::{Result, TransportError};

/// Keep-alive interval applied to both sides of a connection.
pub const KEEP_ALIVE: Duration = Duration::from_secs(10);
/// Idle timeout after which quinn tears down a connection.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// ALPN label for a direct peer-to-peer transfer.
pub const ALPN_DIRECT: &str = "quantarax-quic";
/// ALPN label for an optional relay control stream.
pub const ALPN_RELAY: &str = "quic-relay";

/// A multiplexed, authenticated connection to a peer.
pub struct Conn {
    inner: quinn::Connection,
}

impl Conn {
    /// Open a new bidirectional stream to the peer.
    pub async fn open_stream(&self) -> Result<Stream> {
        let (send, recv) = self
            .inner
            .open_bi()
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;
        Ok(Stream { send, recv, deadline: None })
    }

    /// Accept the next bidirectional stream the peer opens.
    pub async fn accept_stream(&self) -> Result<Stream> {
        let (send, recv) = self
            .inner
            .accept_bi()
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;
        Ok(Stream { send, recv, deadline: None })
    }

    /// Close the connection, notifying the peer with an application error
    /// code and a human-readable reason.
    pub fn close_with_error(&self, code: u32, reason: &str) {
        self.inner.close(quinn::VarInt::from_u32(code), reason.as_bytes());
    }

    /// Remote peer's socket address.
    pub fn remote_address(&self) -> SocketAddr {
        self.inner.remote_address()
    }
}

/// One bidirectional stream within a [`Conn`].
pub struct Stream {
    send: SendStream,
    recv: RecvStream,
    deadline: Option<Duration>,
}

impl Stream {
    /// Set a per-operation deadline applied to subsequent `read`/`write`
    /// calls.
    pub fn set_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    /// Write all of `buf` to the stream.
    pub async fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.with_deadline(self.send.write_all(buf)).await.map_err(|e| match e {
            TimeoutOr::Timeout => TransportError::TimedOut,
            TimeoutOr::Inner(e) => TransportError::ConnectionClosed(e.to_string()),
        })
    }

    /// Read up to `buf.len()` bytes, returning `Ok(None)` on clean EOF.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        self.with_deadline(self.recv.read(buf)).await.map_err(|e| match e {
            TimeoutOr::Timeout => TransportError::TimedOut,
            TimeoutOr::Inner(e) => TransportError::ConnectionClosed(e.to_string()),
        })
    }

    /// Finish the send side, signaling no more data will be written.
    pub async fn close(&mut self) -> Result<()> {
        self.send.finish().map_err(|e| TransportError::ConnectionClosed(e.to_string()))
    }

    async fn with_deadline<T, E, F>(&self, fut: F) -> std::result::Result<T, TimeoutOr<E>>
    where
        F: std::future::Future<Output = std::result::Result<T, E>>,
    {
        match self.deadline {
            Some(d) => tokio::time::timeout(d, fut).await.map_err(|_| TimeoutOr::Timeout)?.map_err(TimeoutOr::Inner),
            None => fut.await.map_err(TimeoutOr::Inner),
        }
    }
}

enum TimeoutOr<E> {
    Timeout,
    Inner(E),
}

/// A bound QUIC endpoint accepting incoming connections.
pub struct Listener {
    endpoint: Endpoint,
}

impl Listener {
    /// Bind a listener on `addr` with a fresh self-signed identity and the
    /// direct-transfer ALPN.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let identity = tls_config::generate_self_signed()?;
        Self::bind_with_identity(addr, &identity)
    }

    /// Bind a listener with a caller-supplied TLS identity (useful for
    /// tests that want a stable identity across restarts).
    pub fn bind_with_identity(addr: SocketAddr, identity: &TlsIdentity) -> Result<Self> {
        let server_config = server_config(identity)?;
        let endpoint = Endpoint::server(server_config, addr)
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        Ok(Self { endpoint })
    }

    /// Local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint.local_addr().map_err(TransportError::Io)
    }

    /// Accept the next incoming connection.
    pub async fn accept(&self) -> Result<Conn> {
        let incoming = self.endpoint.accept().await.ok_or_else(|| {
            TransportError::ConnectionClosed("endpoint closed while waiting for a connection".into())
        })?;
        let connection = incoming.await.map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        Ok(Conn { inner: connection })
    }
}

fn server_config(identity: &TlsIdentity) -> Result<ServerConfig> {
    tls_config::quinn_server_config(identity, &[ALPN_DIRECT])
}

fn client_config() -> Result<ClientConfig> {
    tls_config::quinn_client_config(&[ALPN_DIRECT])
}

/// Dial a peer at `addr`, completing the QUIC + TLS handshake.
pub async fn dial(addr: SocketAddr) -> Result<Conn> {
    let bind_addr: SocketAddr = if addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" }.parse().unwrap();
    let mut endpoint =
        Endpoint::client(bind_addr).map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
    endpoint.set_default_client_config(client_config()?);

    let connecting = endpoint
        .connect(addr, "localhost")
        .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
    let connection = connecting.await.map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
    Ok(Conn { inner: connection })
}

/// Bind a listener for incoming direct connections.
pub fn listen(addr: SocketAddr) -> Result<Listener> {
    Listener::bind(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dial_and_accept_roundtrip() {
        let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            let mut stream = conn.accept_stream().await.unwrap();
            let mut buf = vec![0u8; 64];
            let n = stream.read(&mut buf).await.unwrap().unwrap();
            assert_eq!(&buf[..n], b"hello");
            stream.write(b"world").await.unwrap();
            stream.close().await.unwrap();
        });

        let conn = dial(addr).await.unwrap();
        let mut stream = conn.open_stream().await.unwrap();
        stream.write(b"hello").await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = stream.read(&mut buf).await.unwrap().unwrap();
        assert_eq!(&buf[..n], b"world");
        stream.close().await.unwrap();

        server.await.unwrap();
    }

    #[tokio::test]
    async fn stream_read_honors_deadline() {
        let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let conn = listener.accept().await.unwrap();
            let _stream = conn.accept_stream().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let conn = dial(addr).await.unwrap();
        let mut stream = conn.open_stream().await.unwrap();
        stream.write(b"x").await.unwrap();
        stream.set_deadline(Some(Duration::from_millis(50)));

        let mut buf = vec![0u8; 16];
        let result = stream.read(&mut buf).await;
        assert!(matches!(result, Err(TransportError::TimedOut)));

        server.abort();
    }
}
