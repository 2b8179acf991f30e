//! Listener binding with retry on port conflicts.

use crate::error::{Result, ShimError};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::atomic::{AtomicU32, Ordering};

pub const DEFAULT_BASE_PORT: u16 = 7348;

/// Offset added to the base port, shared by every shim started through the
/// same allocator. It only grows, and only when a candidate port is taken.
#[derive(Debug, Default)]
pub struct PortAllocator {
    offset: AtomicU32,
}

impl PortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u32 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Bind a loopback listener at `base_port + offset`, bumping the offset on
    /// every "address in use" failure. A base port of 0 asks the OS for any
    /// free port.
    pub fn bind(&self, base_port: u16) -> Result<TcpListener> {
        if base_port == 0 {
            return try_bind(0).map_err(|source| ShimError::Bind { port: 0, source });
        }
        loop {
            let offset = self.offset.load(Ordering::SeqCst);
            let candidate = u32::from(base_port) + offset;
            let Ok(port) = u16::try_from(candidate) else {
                return Err(ShimError::BindExhausted {
                    base_port,
                    last_port: u16::MAX,
                });
            };
            match try_bind(port) {
                Ok(listener) => return Ok(listener),
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    tracing::debug!(port, "shim port in use, trying next");
                    // Another thread may have advanced already; only move past
                    // the port this attempt saw.
                    let _ = self.offset.compare_exchange(
                        offset,
                        offset + 1,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    );
                }
                Err(source) => return Err(ShimError::Bind { port, source }),
            }
        }
    }
}

fn try_bind(port: u16) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}
