//! Listener binding with the strict-port policy.
//!
//! With `strict_port`, the configured port is the only one tried: if it is
//! taken, startup fails.  Without it, the next ports are tried in ascending
//! order and the first free one is used.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::ops::RangeInclusive;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// How many ports are tried when `strict_port` is off, the configured one
/// included.
pub const MAX_PORT_ATTEMPTS: u16 = 10;

/// Errors that prevent the development server from starting.
#[derive(Debug, Error)]
pub enum DevServerError {
    /// The configured port is taken and `strict_port` forbids another.
    #[error("port {} is already in use (strict_port is set)", .0.port())]
    PortInUse(SocketAddr),

    /// Every port in the non-strict search range is taken.
    #[error("no free port in {first}..={last} on {ip}")]
    NoFreePort {
        ip: std::net::IpAddr,
        first: u16,
        last: u16,
    },

    /// Binding failed for a reason other than the port being taken.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Binds a listener on `addr`, applying the strict-port policy.
///
/// # Errors
///
/// [`DevServerError::PortInUse`] when `strict_port` is set and the port is
/// taken, [`DevServerError::NoFreePort`] when the non-strict search is
/// exhausted, [`DevServerError::Bind`] for any other bind failure.
pub async fn bind_listener(addr: SocketAddr, strict_port: bool) -> Result<TcpListener, DevServerError> {
    let ports = candidate_ports(addr.port(), strict_port);

    for port in ports.clone() {
        let candidate = SocketAddr::new(addr.ip(), port);
        match TcpListener::bind(candidate).await {
            Ok(listener) => {
                if port != addr.port() {
                    info!("port {} in use; using {port} instead", addr.port());
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                if strict_port {
                    return Err(DevServerError::PortInUse(addr));
                }
                warn!("port {port} is in use, trying another one...");
            }
            Err(source) => {
                return Err(DevServerError::Bind {
                    addr: candidate,
                    source,
                })
            }
        }
    }

    Err(DevServerError::NoFreePort {
        ip: addr.ip(),
        first: *ports.start(),
        last: *ports.end(),
    })
}

/// Ports tried for `first`: only `first` when strict, otherwise up to
/// [`MAX_PORT_ATTEMPTS`] ports from `first`, stopping at `u16::MAX`.
fn candidate_ports(first: u16, strict_port: bool) -> RangeInclusive<u16> {
    let attempts = if strict_port { 1 } else { MAX_PORT_ATTEMPTS };
    first..=first.saturating_add(attempts - 1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn occupied() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_strict_port_fails_when_taken() {
        // Arrange: hold the port open
        let (_guard, addr) = occupied().await;

        // Act
        let result = bind_listener(addr, true).await;

        // Assert
        assert!(matches!(result, Err(DevServerError::PortInUse(a)) if a == addr));
    }

    #[tokio::test]
    async fn test_strict_port_binds_free_port() {
        let (guard, addr) = occupied().await;
        drop(guard);

        let listener = bind_listener(addr, true).await.unwrap();

        assert_eq!(listener.local_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_non_strict_moves_to_another_port() {
        let (_guard, addr) = occupied().await;

        // The next ports may also be taken on a busy machine; only the
        // outcome "bound somewhere else" is asserted.
        match bind_listener(addr, false).await {
            Ok(listener) => {
                let bound = listener.local_addr().unwrap();
                assert_ne!(bound.port(), addr.port());
                assert!(bound.port() > addr.port());
            }
            Err(DevServerError::NoFreePort { first, .. }) => assert_eq!(first, addr.port()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_candidate_ports_cover_exactly_the_attempted_range() {
        assert_eq!(candidate_ports(3001, true), 3001..=3001);
        assert_eq!(candidate_ports(3001, false), 3001..=3010);
        assert_eq!(candidate_ports(3001, false).count(), MAX_PORT_ATTEMPTS as usize);
    }

    #[test]
    fn test_candidate_ports_stop_at_the_last_port() {
        assert_eq!(candidate_ports(65_530, false), 65_530..=65_535);
    }

    #[test]
    fn test_no_free_port_message_names_the_tried_range() {
        let ports = candidate_ports(3001, false);
        let err = DevServerError::NoFreePort {
            ip: "127.0.0.1".parse().unwrap(),
            first: *ports.start(),
            last: *ports.end(),
        };
        assert_eq!(err.to_string(), "no free port in 3001..=3010 on 127.0.0.1");
    }

    #[test]
    fn test_port_in_use_message_names_port() {
        let err = DevServerError::PortInUse("127.0.0.1:3001".parse().unwrap());
        assert_eq!(err.to_string(), "port 3001 is already in use (strict_port is set)");
    }
}
