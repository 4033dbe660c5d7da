//! Socket address handling
//!
//! [`SockAddr`] is the value type carried by resolver candidates. It owns a
//! copy of the address, so nothing in it points back into resolver memory.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

use socket2::Domain;

use super::{Error, Result};

/// An IPv4 or IPv6 socket address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockAddr {
    /// IPv4 socket address
    V4(SocketAddrV4),
    /// IPv6 socket address
    V6(SocketAddrV6),
}

impl SockAddr {
    /// Create a new IPv4 socket address
    pub fn new_v4(ip: Ipv4Addr, port: u16) -> Self {
        SockAddr::V4(SocketAddrV4::new(ip, port))
    }

    /// Create a new IPv6 socket address
    pub fn new_v6(ip: Ipv6Addr, port: u16) -> Self {
        SockAddr::V6(SocketAddrV6::new(ip, port, 0, 0))
    }

    /// Copy an address out of a raw `sockaddr` as returned by the resolver.
    ///
    /// # Safety
    ///
    /// `raw` must be non-null and point to at least `len` readable bytes
    /// holding a `sockaddr` of the family it declares.
    pub unsafe fn from_raw(raw: *const libc::sockaddr, len: libc::socklen_t) -> Result<Self> {
        let len = len as usize;
        match i32::from((*raw).sa_family) {
            libc::AF_INET if len >= std::mem::size_of::<libc::sockaddr_in>() => {
                let sin = &*(raw as *const libc::sockaddr_in);
                let ip = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
                Ok(SockAddr::new_v4(ip, u16::from_be(sin.sin_port)))
            }
            libc::AF_INET6 if len >= std::mem::size_of::<libc::sockaddr_in6>() => {
                let sin6 = &*(raw as *const libc::sockaddr_in6);
                Ok(SockAddr::V6(SocketAddrV6::new(
                    Ipv6Addr::from(sin6.sin6_addr.s6_addr),
                    u16::from_be(sin6.sin6_port),
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                )))
            }
            family => Err(Error::UnsupportedFamily(format!("family {} ({} bytes)", family, len))),
        }
    }

    /// Convert to a standard library `SocketAddr`
    pub fn to_std(&self) -> SocketAddr {
        match self {
            SockAddr::V4(v4) => SocketAddr::V4(*v4),
            SockAddr::V6(v6) => SocketAddr::V6(*v6),
        }
    }

    /// Socket domain matching this address
    pub fn domain(&self) -> Domain {
        match self {
            SockAddr::V4(_) => Domain::IPV4,
            SockAddr::V6(_) => Domain::IPV6,
        }
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            SockAddr::V4(v4) => v4.port(),
            SockAddr::V6(v6) => v6.port(),
        }
    }

    /// Get the IP address
    pub fn ip(&self) -> IpAddr {
        match self {
            SockAddr::V4(v4) => IpAddr::V4(*v4.ip()),
            SockAddr::V6(v6) => IpAddr::V6(*v6.ip()),
        }
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self, SockAddr::V4(_))
    }

    pub fn is_ipv6(&self) -> bool {
        matches!(self, SockAddr::V6(_))
    }

    /// Address family as a string, for log output
    pub fn family(&self) -> &'static str {
        match self {
            SockAddr::V4(_) => "IPv4",
            SockAddr::V6(_) => "IPv6",
        }
    }
}

impl fmt::Display for SockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SockAddr::V4(v4) => write!(f, "{}", v4),
            SockAddr::V6(v6) => write!(f, "{}", v6),
        }
    }
}

impl From<SocketAddr> for SockAddr {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => SockAddr::V4(v4),
            SocketAddr::V6(v6) => SockAddr::V6(v6),
        }
    }
}

impl From<SockAddr> for SocketAddr {
    fn from(addr: SockAddr) -> Self {
        addr.to_std()
    }
}

impl From<SockAddr> for socket2::SockAddr {
    fn from(addr: SockAddr) -> Self {
        socket2::SockAddr::from(addr.to_std())
    }
}
