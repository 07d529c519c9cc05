//! Configuration for the `mdnsd-cli` demo binary.
//!
//! Grounded in the teacher's `ConfigFile`: a `serde`-deserialized struct
//! with a `Default` impl, loaded through the `config` crate with a JSON
//! file source plus environment-variable overrides.

use std::net::Ipv4Addr;
use std::path::Path;

use config::{Config, File as ConfigSource};
use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_FRAME_SIZE;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Local interface address the demo binary binds its UDP socket to.
    pub bind_address: Ipv4Addr,
    /// Maximum outbound datagram size; the engine never emits larger.
    pub frame_size: usize,
    /// The service instance name, e.g. "myhost-a".
    pub service_name: String,
    /// The service type, e.g. "_opcua-tcp._tcp".
    pub service_type: String,
    /// The TCP port the OPC UA server itself listens on.
    pub service_port: u16,
    /// Default record TTL in seconds.
    pub record_ttl: u32,
    /// `RUST_LOG`-style default level for [`crate::logging::init_logging`].
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            bind_address: Ipv4Addr::UNSPECIFIED,
            frame_size: DEFAULT_FRAME_SIZE,
            service_name: String::from("opcua-server"),
            service_type: String::from("_opcua-tcp._tcp"),
            service_port: 4840,
            record_ttl: 120,
            log_level: String::from("info"),
        }
    }
}

impl EngineConfig {
    /// The fully-qualified service type name, e.g.
    /// `_opcua-tcp._tcp.local.`.
    pub fn service_type_fqdn(&self) -> String {
        format!("{}.local", self.service_type)
    }

    /// The fully-qualified instance name, e.g.
    /// `myhost-a._opcua-tcp._tcp.local.`.
    pub fn instance_fqdn(&self) -> String {
        format!("{}.{}", self.service_name, self.service_type_fqdn())
    }

    pub fn as_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!("failed to serialize config: {e:?}"))
    }

    /// Loads configuration from a JSON file, falling back to defaults with
    /// `MDNSD_`-prefixed environment overrides if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self, std::io::Error> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(ConfigSource::new(
                &path.to_string_lossy(),
                config::FileFormat::Json,
            ));
        }
        builder = builder.add_source(config::Environment::with_prefix("MDNSD"));

        let defaults = EngineConfig::default();
        let built = builder.build().map_err(|e| {
            std::io::Error::other(format!("failed to build configuration: {e}"))
        })?;

        match built.try_deserialize::<EngineConfig>() {
            Ok(config) => Ok(config),
            Err(_) if path.is_none() => Ok(defaults),
            Err(e) => Err(std::io::Error::other(format!(
                "failed to parse configuration: {e}"
            ))),
        }
    }
}
