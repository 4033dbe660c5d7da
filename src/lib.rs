//! netkit - listener bootstrap and exact-count transfers for TCP
//!
//! Two small guarantees on top of raw sockets:
//!
//! - [`net::start_listener`] returns a socket that is bound and listening, trying
//!   every resolved local address in order until one works.
//! - [`net::write_all`] / [`net::read_all`] move exactly the requested number of
//!   bytes or report failure.
//!
//! ```no_run
//! use netkit::net::{self, is_valid_port};
//!
//! let port = "8080";
//! if is_valid_port(Some(port)) {
//!     let listener = net::start_listener(port).expect("no usable address");
//!     let (mut stream, _) = listener.accept().unwrap();
//!     let mut request = [0u8; 16];
//!     if net::read_all(&mut stream, &mut request) {
//!         net::write_all(&mut stream, &request);
//!     }
//! }
//! ```

pub mod net;
