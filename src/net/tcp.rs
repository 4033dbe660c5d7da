//! TCP listener bootstrap and socket extensions
//!
//! [`start_listener`] resolves a port or service name and walks the resolved
//! candidates in order. Each candidate gets a fresh socket; the first one
//! that binds and listens is returned. Sockets for failed candidates are
//! `socket2::Socket` values and close when they go out of scope.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use socket2::Socket;
use tracing::{debug, warn};

use super::resolver::{self, Candidate};
use super::{Error, Result, SockAddr, BACKLOG};

/// Extension trait for TcpStream with additional utilities
pub trait TcpExt {
    /// Set both read and write timeouts.
    ///
    /// Transfers in [`super::transfer`] never time out on their own; this is
    /// how a caller bounds them. `None` restores blocking forever.
    fn set_io_timeout(&self, timeout: Option<Duration>) -> Result<()>;

    /// Get local socket address as SockAddr
    fn local_sockaddr(&self) -> Result<SockAddr>;

    /// Get peer socket address as SockAddr
    fn peer_sockaddr(&self) -> Result<SockAddr>;
}

impl TcpExt for TcpStream {
    fn set_io_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)?;
        Ok(())
    }

    fn local_sockaddr(&self) -> Result<SockAddr> {
        Ok(SockAddr::from(self.local_addr()?))
    }

    fn peer_sockaddr(&self) -> Result<SockAddr> {
        Ok(SockAddr::from(self.peer_addr()?))
    }
}

/// Extension trait for TcpListener with additional utilities
pub trait TcpListenerExt {
    /// Get local socket address as SockAddr
    fn local_sockaddr(&self) -> Result<SockAddr>;
}

impl TcpListenerExt for TcpListener {
    fn local_sockaddr(&self) -> Result<SockAddr> {
        Ok(SockAddr::from(self.local_addr()?))
    }
}

/// TCP listener builder
#[derive(Debug, Clone)]
pub struct TcpListenerBuilder {
    reuseaddr: bool,
    backlog: i32,
}

impl Default for TcpListenerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpListenerBuilder {
    /// Create a new TCP listener builder with default settings
    pub fn new() -> Self {
        TcpListenerBuilder {
            reuseaddr: true,
            backlog: BACKLOG,
        }
    }

    /// Set SO_REUSEADDR option (default: true)
    pub fn reuseaddr(mut self, reuse: bool) -> Self {
        self.reuseaddr = reuse;
        self
    }

    /// Set listen backlog (default: [`BACKLOG`])
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Resolve `port` and listen on the first candidate that works.
    pub fn listen(&self, port: &str) -> Result<TcpListener> {
        let candidates = resolver::resolve_passive(port)?;
        self.bind_first(&candidates).map_err(|e| match e {
            Error::NoUsableAddress(_) => Error::NoUsableAddress(port.to_string()),
            other => other,
        })
    }

    /// Try `candidates` in order and return the first listening socket.
    ///
    /// Failures are logged per candidate and never returned individually;
    /// if none succeeds the result is [`Error::NoUsableAddress`].
    pub fn bind_first(&self, candidates: &[Candidate]) -> Result<TcpListener> {
        for (idx, candidate) in candidates.iter().enumerate() {
            match self.bind_candidate(candidate) {
                Ok(listener) => {
                    debug!(addr = %candidate.addr, idx, "listening");
                    return Ok(listener);
                }
                Err((stage, err)) => {
                    warn!(
                        addr = %candidate.addr,
                        family = candidate.addr.family(),
                        idx,
                        "{}: {}",
                        stage,
                        err
                    );
                }
            }
        }

        Err(Error::NoUsableAddress(format!("{} candidate(s) exhausted", candidates.len())))
    }

    /// Create, configure, bind and activate one socket.
    ///
    /// On error the socket is dropped here, which closes it.
    fn bind_candidate(
        &self,
        candidate: &Candidate,
    ) -> std::result::Result<TcpListener, (&'static str, io::Error)> {
        let socket = Socket::new(candidate.domain, candidate.ty, candidate.protocol)
            .map_err(|e| ("socket", e))?;

        // A failed SO_REUSEADDR does not disqualify the candidate.
        if let Err(e) = socket.set_reuse_address(self.reuseaddr) {
            warn!(addr = %candidate.addr, "setsockopt: {}", e);
        }

        socket.bind(&candidate.addr.into()).map_err(|e| ("bind", e))?;
        socket.listen(self.backlog).map_err(|e| ("listen", e))?;

        Ok(socket.into())
    }
}

/// Start a listener on `port` (a decimal port or service name) using
/// default settings.
///
/// The returned listener is bound and accepting. Resolution failures and
/// exhaustion of every candidate are both errors; details of each failed
/// candidate go to the log only.
pub fn start_listener(port: &str) -> Result<TcpListener> {
    TcpListenerBuilder::new().listen(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    fn loopback(port: u16) -> Candidate {
        Candidate::tcp(SockAddr::new_v4(Ipv4Addr::LOCALHOST, port))
    }

    #[test]
    fn test_start_listener_ephemeral() {
        let listener = start_listener("0").unwrap();
        let addr = listener.local_sockaddr().unwrap();
        assert!(addr.is_ipv4());
        assert!(addr.port() > 0);
    }

    #[test]
    fn test_listener_accepts_immediately() {
        let listener = start_listener("0").unwrap();
        let port = listener.local_sockaddr().unwrap().port();

        let mut client = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        client.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[test]
    fn test_start_listener_unresolvable() {
        let result = start_listener("no-such-service-netkit");
        assert!(matches!(result, Err(Error::ResolutionFailed(_))));
    }

    #[test]
    fn test_bind_first_empty() {
        let result = TcpListenerBuilder::new().bind_first(&[]);
        assert!(matches!(result, Err(Error::NoUsableAddress(_))));
    }

    #[traced_test]
    #[test]
    fn test_bind_first_falls_back() {
        let busy = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let busy_port = busy.local_addr().unwrap().port();

        let listener = TcpListenerBuilder::new()
            .bind_first(&[loopback(busy_port), loopback(0)])
            .unwrap();

        let port = listener.local_sockaddr().unwrap().port();
        assert_ne!(port, busy_port);
        assert!(logs_contain("bind: "));
        assert!(logs_contain(&format!("addr=127.0.0.1:{}", busy_port)));
    }

    #[test]
    fn test_bind_first_exhausted() {
        let busy = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let busy_port = busy.local_addr().unwrap().port();

        let result = TcpListenerBuilder::new()
            .bind_first(&[loopback(busy_port), loopback(busy_port)]);
        assert!(matches!(result, Err(Error::NoUsableAddress(_))));
    }

    #[test]
    fn test_listen_reports_port_on_exhaustion() {
        let busy = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let busy_port = busy.local_addr().unwrap().port().to_string();

        match start_listener(&busy_port) {
            Err(Error::NoUsableAddress(what)) => assert_eq!(what, busy_port),
            other => panic!("expected NoUsableAddress, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_options() {
        let listener = TcpListenerBuilder::new()
            .reuseaddr(false)
            .backlog(1)
            .bind_first(&[loopback(0)])
            .unwrap();
        assert!(listener.local_sockaddr().unwrap().port() > 0);
    }

    #[test]
    fn test_stream_io_timeout() {
        let listener = start_listener("0").unwrap();
        let port = listener.local_sockaddr().unwrap().port();
        let client = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).unwrap();

        client.set_io_timeout(Some(Duration::from_secs(3))).unwrap();
        assert_eq!(client.read_timeout().unwrap(), Some(Duration::from_secs(3)));
        assert_eq!(client.write_timeout().unwrap(), Some(Duration::from_secs(3)));

        let peer = client.peer_sockaddr().unwrap();
        assert_eq!(peer.port(), port);
        assert!(client.local_sockaddr().unwrap().is_ipv4());
    }
}
