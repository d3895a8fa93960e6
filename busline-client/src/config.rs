/// Target deployment environment for [`crate::BusClient::connect`]
///
/// Mirrors the gateway's own transport selection (see `busline_gateway::Env`):
/// `dev` dials plaintext, `prod` dials over TLS using platform trust roots.
#[derive(Debug, Clone)]
pub enum Env {
    Dev,
    Prod,
}
