// Listener module
// Binds the actuator socket synchronously so bind failures surface from start()

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::ServerError;

/// Listen backlog for the actuator socket
const BACKLOG: i32 = 128;

/// Create a non-blocking `std::net::TcpListener` bound to `addr`.
///
/// `SO_REUSEADDR` lets a restarted process rebind while old connections sit in
/// `TIME_WAIT`; it does not allow two live listeners on one port, so a port
/// that is already in use is reported as [`ServerError::Bind`].
///
/// The listener is handed to the runtime later with `TcpListener::from_std`.
pub fn bind_listener(addr: SocketAddr) -> Result<std::net::TcpListener, ServerError> {
    let bind_err = |source| ServerError::Bind { addr, source };

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP)).map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(BACKLOG).map_err(bind_err)?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_ephemeral_port() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_port_in_use_is_a_bind_error() {
        let first = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let taken = first.local_addr().unwrap();
        match bind_listener(taken) {
            Err(ServerError::Bind { addr, .. }) => assert_eq!(addr, taken),
            other => panic!("expected bind error, got {other:?}"),
        }
    }
}
