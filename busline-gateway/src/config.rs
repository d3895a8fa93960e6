use std::{net::SocketAddr, path::PathBuf};

/// Target deployment environment, mirroring the peer [`busline_client`] selector
#[derive(Debug, Clone)]
pub enum Env {
    /// Plaintext, for local development
    Dev,
    /// Certificate/key-file TLS
    Prod {
        cert_path: PathBuf,
        key_path: PathBuf,
    },
}

/// Configuration for [`crate::Gateway`]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub env: Env,
}

/// An environment string did not match `dev` or `prod`
#[derive(Debug, thiserror::Error)]
#[error("unknown environment {0:?}, expected \"dev\" or \"prod\"")]
pub struct UnknownEnvError(pub String);

impl Env {
    /// Validate an `ENV` selector string read by the (out-of-scope) configuration loader
    ///
    /// # Errors
    ///
    /// It returns an error if `selector` is neither `"dev"` nor `"prod"`.
    pub fn validate_selector(selector: &str) -> Result<(), UnknownEnvError> {
        match selector {
            "dev" | "prod" => Ok(()),
            other => Err(UnknownEnvError(other.to_owned())),
        }
    }
}
