//! SOCKS5-backed HTTP client pool with periodic credential/User-Agent rotation

mod credentials;
mod error;
mod pool;

pub use self::error::ProxyPoolError;
pub use self::pool::{PooledClient, ProxyPool, ProxyPoolConfig};
