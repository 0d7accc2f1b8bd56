//! Tunnel types.

use serde::{Deserialize, Serialize};

/// How a tunnel authenticates its peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TunnelAuthentication {
    #[default]
    None,
    KeepAlive,
}

/// Which side of the tunnel this worker plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelMode {
    #[default]
    Client,
    Server,
}

/// An authenticated point-to-point transport carrying one or more streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tunnel {
    pub tunnel_id: u32,
    pub local_ip: String,
    pub local_port: u16,
    pub remote_ip: String,
    pub remote_port: u16,
    pub secret: String,
    #[serde(default)]
    pub authentication: TunnelAuthentication,
    /// Not sent to the worker; selects the add method instead.
    #[serde(default)]
    pub mode: TunnelMode,
}
