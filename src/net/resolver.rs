//! Local address resolution
//!
//! Resolves a port number or service name to the ordered list of local
//! addresses a listener may bind to. The system resolver's linked list is
//! copied into owned [`Candidate`] values and released before returning, so
//! callers only ever see a plain `Vec` in resolver order.

use std::ffi::{CStr, CString};
use std::io;
use std::ptr;

use socket2::{Domain, Protocol, Type};
use tracing::debug;

use super::{Error, Result, SockAddr};

/// One local endpoint eligible for binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub domain: Domain,
    pub ty: Type,
    /// `None` lets the kernel pick the default protocol for `ty`
    pub protocol: Option<Protocol>,
    pub addr: SockAddr,
}

impl Candidate {
    /// A TCP stream candidate for `addr`
    pub fn tcp(addr: SockAddr) -> Self {
        Candidate {
            domain: addr.domain(),
            ty: Type::STREAM,
            protocol: Some(Protocol::TCP),
            addr,
        }
    }
}

/// Resolution hints passed to the system resolver
#[derive(Debug, Clone, Copy)]
pub struct Hints {
    pub family: libc::c_int,
    pub socktype: libc::c_int,
    /// Ask for addresses suitable for `bind` rather than `connect`
    pub passive: bool,
}

impl Hints {
    /// Any local IPv4 address, stream sockets, bind side
    pub fn passive_ipv4_stream() -> Self {
        Hints {
            family: libc::AF_INET,
            socktype: libc::SOCK_STREAM,
            passive: true,
        }
    }
}

/// Owns the resolver's list and frees it on drop.
struct AddrInfoList(*mut libc::addrinfo);

impl AddrInfoList {
    fn candidates(&self) -> Vec<Candidate> {
        let mut out = Vec::new();
        let mut cur = self.0;

        while !cur.is_null() {
            // SAFETY: `cur` is a node of the list getaddrinfo handed us and
            // stays valid until freeaddrinfo runs in Drop.
            let info = unsafe { &*cur };
            cur = info.ai_next;

            if info.ai_addr.is_null() {
                continue;
            }

            // SAFETY: ai_addr/ai_addrlen describe the node's own address.
            match unsafe { SockAddr::from_raw(info.ai_addr, info.ai_addrlen) } {
                Ok(addr) => out.push(Candidate {
                    domain: Domain::from(info.ai_family),
                    ty: Type::from(info.ai_socktype),
                    protocol: (info.ai_protocol != 0).then(|| Protocol::from(info.ai_protocol)),
                    addr,
                }),
                Err(e) => debug!("skipping resolver entry: {}", e),
            }
        }

        out
    }
}

impl Drop for AddrInfoList {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe { libc::freeaddrinfo(self.0) };
        }
    }
}

/// Resolve `service` against any local IPv4 address for a stream listener.
///
/// `service` is a decimal port or a service name from the system's service
/// database. Range checks are left to the resolver; see
/// [`is_valid_port`](super::is_valid_port) for validating user input first.
pub fn resolve_passive(service: &str) -> Result<Vec<Candidate>> {
    resolve(None, service, Hints::passive_ipv4_stream())
}

/// Resolve `node`/`service` with explicit hints, preserving resolver order.
pub fn resolve(node: Option<&str>, service: &str, hints: Hints) -> Result<Vec<Candidate>> {
    let c_node = node.map(to_cstring).transpose()?;
    let c_service = to_cstring(service)?;

    let mut raw_hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    raw_hints.ai_family = hints.family;
    raw_hints.ai_socktype = hints.socktype;
    if hints.passive {
        raw_hints.ai_flags = libc::AI_PASSIVE;
    }

    let mut res: *mut libc::addrinfo = ptr::null_mut();
    let rc = unsafe {
        libc::getaddrinfo(
            c_node.as_ref().map_or(ptr::null(), |n| n.as_ptr()),
            c_service.as_ptr(),
            &raw_hints,
            &mut res,
        )
    };

    if rc != 0 {
        return Err(Error::ResolutionFailed(format!("{}: {}", service, gai_error(rc))));
    }

    let list = AddrInfoList(res);
    let candidates = list.candidates();
    debug!(service, count = candidates.len(), "resolved local candidates");
    Ok(candidates)
}

fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s)
        .map_err(|_| Error::ResolutionFailed(format!("{:?} contains a NUL byte", s)))
}

fn gai_error(rc: libc::c_int) -> String {
    if rc == libc::EAI_SYSTEM {
        return io::Error::last_os_error().to_string();
    }
    // SAFETY: gai_strerror returns a pointer to a static string.
    unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }
        .to_string_lossy()
        .into_owned()
}
