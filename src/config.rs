

use std::{path::Path, time::Duration};

use serde::{Serialize, Deserialize};
use tokio::fs;

use crate::{PeerAddr, RingError};


/// Settings for a single node. Missing fields in a config file fall back
/// to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig{
	/// Display name other participants address messages to.
	pub alias: String,
	/// Host this node listens on and advertises to its neighbours.
	pub host: String,
	/// Listen port. Zero picks a free port.
	pub port: u16,

	pub connect_timeout_ms: u64,
	pub read_timeout_ms: u64,
	pub max_message_bytes: usize,
	pub channel_capacity: usize,
}

impl Default for NodeConfig{
	fn default() -> Self {
		NodeConfig{
			alias: String::new(),
			host: "127.0.0.1".to_string(),
			port: 0,
			connect_timeout_ms: 5_000,
			read_timeout_ms: 5_000,
			max_message_bytes: 64 * 1024,
			channel_capacity: 50,
		}
	}
}


impl NodeConfig{
	pub fn new(alias: impl Into<String>, port: u16) -> Self{
		NodeConfig{
			alias: alias.into(),
			port,
			..Default::default()
		}
	}

	pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RingError>{
		let raw = fs::read_to_string(&path).await?;
		serde_json::from_str(&raw)
			.map_err(|e| RingError::Config(format!("{}: {}", path.as_ref().display(), e)))
	}

	pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RingError>{
		let raw = serde_json::to_string_pretty(self)?;
		fs::write(path, raw).await?;
		Ok(())
	}

	pub fn validate(&self) -> Result<(), RingError>{
		if self.alias.trim().is_empty() {
			return Err(RingError::Config("alias must not be empty".to_string()));
		}
		if self.host.is_empty() {
			return Err(RingError::Config("host must not be empty".to_string()));
		}
		if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
			return Err(RingError::Config("timeouts must be positive".to_string()));
		}
		if self.max_message_bytes == 0 || self.channel_capacity == 0 {
			return Err(RingError::Config("message size and channel capacity must be positive".to_string()));
		}
		Ok(())
	}

	pub fn listen_addr(&self) -> PeerAddr{
		PeerAddr::new(self.host.clone(), self.port)
	}

	pub fn connect_timeout(&self) -> Duration{
		Duration::from_millis(self.connect_timeout_ms)
	}

	pub fn read_timeout(&self) -> Duration{
		Duration::from_millis(self.read_timeout_ms)
	}
}
