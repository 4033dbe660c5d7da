//! Exact-count transfers
//!
//! A single `read`/`write` may move fewer bytes than asked. [`write_all`] and
//! [`read_all`] loop until the whole buffer has moved, and stop at the first
//! call that makes no progress: an error, a zero-length write, or end of
//! stream. The result is `true` only when every requested byte moved.
//!
//! Unlike `std::io::Write::write_all`, nothing is retried: `Interrupted` and
//! `WouldBlock` end the transfer like any other error. A partial transfer is
//! reported as plain failure; callers cannot tell how many bytes moved.

use std::io::{self, Read, Write};
use std::os::fd::RawFd;

use tracing::warn;

/// Write all of `buf` to `w`.
pub fn write_all<W: Write + ?Sized>(w: &mut W, buf: &[u8]) -> bool {
    let count = buf.len();
    let mut bytes_sent = 0;

    while bytes_sent < count {
        match w.write(&buf[bytes_sent..]) {
            Ok(0) => {
                warn!(bytes_sent, count, "write: no progress");
                break;
            }
            Ok(n) => bytes_sent += n,
            Err(e) => {
                warn!(bytes_sent, count, "write: {}", e);
                break;
            }
        }
    }

    bytes_sent == count
}

/// Fill all of `buf` from `r`.
///
/// End of stream before `buf` is full is a failure, same as a read error.
pub fn read_all<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> bool {
    let count = buf.len();
    let mut bytes_rx = 0;

    while bytes_rx < count {
        match r.read(&mut buf[bytes_rx..]) {
            Ok(0) => {
                warn!(bytes_rx, count, "read: end of stream");
                break;
            }
            Ok(n) => bytes_rx += n,
            Err(e) => {
                warn!(bytes_rx, count, "read: {}", e);
                break;
            }
        }
    }

    bytes_rx == count
}

/// Write the first `count` bytes of `buf` to the descriptor `fd`.
///
/// Returns `false` without touching `fd` if it is negative, if `buf` is
/// absent while `count > 0`, or if `count` exceeds the buffer. The
/// descriptor is borrowed and left open.
pub fn write_all_fd(fd: RawFd, buf: Option<&[u8]>, count: usize) -> bool {
    let buf = match checked_region(fd, buf, count) {
        Some(buf) => buf,
        None => return false,
    };
    write_all(&mut FdIo(fd), &buf[..count])
}

/// Read exactly `count` bytes from the descriptor `fd` into the start of
/// `buf`. Preconditions are the same as [`write_all_fd`].
pub fn read_all_fd(fd: RawFd, buf: Option<&mut [u8]>, count: usize) -> bool {
    let buf = match checked_region(fd, buf, count) {
        Some(buf) => buf,
        None => return false,
    };
    read_all(&mut FdIo(fd), &mut buf[..count])
}

/// Validate a raw transfer request. An absent buffer with `count == 0`
/// becomes an empty slice.
fn checked_region<B: AsRef<[u8]> + Default>(
    fd: RawFd,
    buf: Option<B>,
    count: usize,
) -> Option<B> {
    if fd < 0 {
        return None;
    }
    match buf {
        None if count > 0 => None,
        None => Some(B::default()),
        Some(b) if b.as_ref().len() < count => None,
        Some(b) => Some(b),
    }
}

/// Borrowed descriptor doing one `read(2)`/`write(2)` per call.
struct FdIo(RawFd);

impl Read for FdIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let ret = unsafe { libc::read(self.0, buf.as_mut_ptr().cast(), buf.len()) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }
}

impl Write for FdIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let ret = unsafe { libc::write(self.0, buf.as_ptr().cast(), buf.len()) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ret as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
