//! Mapping from mirror operations to worker methods.

use serde::Serialize;
use serde_json::{Value, json};
use ztvctl_core::{ChannelParams, InputStream, LogLevel, OutputStream, Tunnel, TunnelMode};
use ztvctl_rpc::{RpcClient, RpcError};

pub(crate) const SHUTDOWN: &str = "shutdown";
pub(crate) const STATUS: &str = "status";
pub(crate) const STATISTICS: &str = "statistics";
pub(crate) const DELTA_STATISTICS: &str = "deltaStatistics";
pub(crate) const LIST_SDI_DEVICES: &str = "listSdiDevices";

/// A worker method with its encoded parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Request {
    pub method: &'static str,
    pub params: Value,
}

impl Request {
    fn encode(method: &'static str, params: &impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            method,
            params: serde_json::to_value(params)?,
        })
    }

    fn without(mut self, key: &str) -> Self {
        if let Value::Object(map) = &mut self.params {
            map.remove(key);
        }
        self
    }

    pub async fn send(self, client: &RpcClient) -> Result<Value, RpcError> {
        client.call(self.method, self.params).await
    }
}

pub(crate) fn add_channel(params: &ChannelParams) -> Result<Request, serde_json::Error> {
    Request::encode("addChannel", params)
}

pub(crate) fn remove_channel(channel_id: u32) -> Request {
    Request {
        method: "removeChannel",
        params: json!({ "channelId": channel_id }),
    }
}

pub(crate) fn add_input(input: &InputStream) -> Result<Request, serde_json::Error> {
    match input {
        InputStream::Rtp(s) => Request::encode("addInputStreamRtp", s),
        InputStream::Rist(s) => Request::encode("addInputStreamRist", s),
        InputStream::RtpGenerator(s) => Request::encode("addInputStreamRtpGenerator", s),
        InputStream::FromChannel(s) => Request::encode("addInputStreamFromChannel", s),
        // Hardware and synthetic inputs are numbered by the worker.
        InputStream::Sdi(s) => Ok(Request::encode("addSdiInput", s)?.without("streamId")),
        InputStream::Generator(s) => {
            Ok(Request::encode("addGeneratorInput", s)?.without("streamId"))
        }
    }
}

pub(crate) fn remove_input(channel_id: u32, stream_id: u32) -> Request {
    Request {
        method: "removeInputStream",
        params: json!({ "channelId": channel_id, "streamId": stream_id }),
    }
}

pub(crate) fn add_output(output: &OutputStream) -> Result<Request, serde_json::Error> {
    match output {
        OutputStream::Rtp(s) => Request::encode("addOutputStreamRtp", s),
        OutputStream::Rist(s) => Request::encode("addOutputStreamRist", s),
        OutputStream::Udp(s) => Request::encode("addOutputStreamUdp", s),
        OutputStream::Sdi(s) => Ok(Request::encode("addSdiOutput", s)?.without("streamId")),
    }
}

pub(crate) fn remove_output(channel_id: u32, stream_id: u32) -> Request {
    Request {
        method: "removeOutputStream",
        params: json!({ "channelId": channel_id, "streamId": stream_id }),
    }
}

pub(crate) fn add_tunnel(tunnel: &Tunnel) -> Result<Request, serde_json::Error> {
    let method = match tunnel.mode {
        TunnelMode::Client => "addTunnelClient",
        TunnelMode::Server => "addTunnelServer",
    };
    Ok(Request::encode(method, tunnel)?.without("mode"))
}

pub(crate) fn remove_tunnel(tunnel_id: u32) -> Request {
    Request {
        method: "removeTunnel",
        params: json!({ "tunnelId": tunnel_id }),
    }
}

pub(crate) fn set_logging_level(level: LogLevel) -> Request {
    Request {
        method: "setLoggingOptions",
        params: json!({ "level": level }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ztvctl_core::{GeneratorInput, RistOutput, TunnelAuthentication};

    #[test]
    fn test_generator_input_drops_stream_id() {
        let input = InputStream::Generator(GeneratorInput {
            channel_id: 1,
            stream_id: 9,
            width: Some(1920),
            height: Some(1080),
            fps_num: None,
            fps_den: None,
            bitrate: None,
            keyframe_interval: None,
        });
        let request = add_input(&input).unwrap();
        assert_eq!(request.method, "addGeneratorInput");
        assert_eq!(
            request.params,
            json!({"channelId": 1, "width": 1920, "height": 1080})
        );
    }

    #[test]
    fn test_rist_output_keeps_stream_id() {
        let output = OutputStream::Rist(RistOutput {
            channel_id: 2,
            stream_id: 3,
            tunnel_id: Some(1),
            local_ip: "0.0.0.0".into(),
            local_port: 0,
            remote_ip: "10.0.0.9".into(),
            remote_port: 9000,
            use_origin_timing: true,
        });
        let request = add_output(&output).unwrap();
        assert_eq!(request.method, "addOutputStreamRist");
        assert_eq!(request.params["streamId"], 3);
        assert_eq!(request.params["tunnelId"], 1);
        assert!(request.params.get("type").is_none());
    }

    #[test]
    fn test_tunnel_mode_selects_method() {
        let mut tunnel = Tunnel {
            tunnel_id: 1,
            local_ip: "0.0.0.0".into(),
            local_port: 8000,
            remote_ip: "10.0.0.1".into(),
            remote_port: 8000,
            secret: "hunter2".into(),
            authentication: TunnelAuthentication::KeepAlive,
            mode: TunnelMode::Client,
        };
        let request = add_tunnel(&tunnel).unwrap();
        assert_eq!(request.method, "addTunnelClient");
        assert!(request.params.get("mode").is_none());
        assert_eq!(request.params["authentication"], "keepAlive");

        tunnel.mode = TunnelMode::Server;
        assert_eq!(add_tunnel(&tunnel).unwrap().method, "addTunnelServer");
    }

    #[test]
    fn test_logging_level_params() {
        let request = set_logging_level(LogLevel::Warning);
        assert_eq!(request.method, "setLoggingOptions");
        assert_eq!(request.params, json!({"level": "warning"}));
    }
}
