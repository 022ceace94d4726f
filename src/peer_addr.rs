use std::{fmt, net::SocketAddr, str::FromStr};

use serde::{Serialize, Deserialize};

use crate::RingError;

/// The address a node listens on. Hosts are kept as strings so that
/// names like `localhost` survive a round trip through the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr{
	pub host: String,
	pub port: u16,
}

impl PeerAddr{
	pub fn new(host: impl Into<String>, port: u16) -> Self{
		Self{
			host: host.into(),
			port,
		}
	}
}

impl From<SocketAddr> for PeerAddr{
	fn from(addr: SocketAddr) -> Self {
		PeerAddr::new(addr.ip().to_string(), addr.port())
	}
}

impl fmt::Display for PeerAddr{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.host.contains(':') {
			write!(f, "[{}]:{}", self.host, self.port)
		}else{
			write!(f, "{}:{}", self.host, self.port)
		}
	}
}

impl FromStr for PeerAddr{
	type Err = RingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (host, port) = s.rsplit_once(':')
			.ok_or_else(|| RingError::InvalidInput(format!("expected host:port, got '{}'", s)))?;
		let host = host.trim_start_matches('[').trim_end_matches(']');
		if host.is_empty() {
			return Err(RingError::InvalidInput(format!("missing host in '{}'", s)));
		}
		let port = port.parse::<u16>()
			.map_err(|_| RingError::InvalidInput(format!("invalid port in '{}'", s)))?;
		Ok(PeerAddr::new(host, port))
	}
}


#[cfg(test)]
mod tests{
	use super::*;

	#[test]
	fn parses_host_and_port(){
		let addr: PeerAddr = "localhost:4000".parse().unwrap();
		assert_eq!(addr, PeerAddr::new("localhost", 4000));
		assert_eq!(addr.to_string(), "localhost:4000");
	}

	#[test]
	fn parses_bracketed_ipv6(){
		let addr: PeerAddr = "[::1]:4000".parse().unwrap();
		assert_eq!(addr.host, "::1");
		assert_eq!(addr.to_string(), "[::1]:4000");
	}

	#[test]
	fn rejects_missing_port(){
		assert!("localhost".parse::<PeerAddr>().is_err());
		assert!("localhost:http".parse::<PeerAddr>().is_err());
		assert!(":4000".parse::<PeerAddr>().is_err());
	}
}
