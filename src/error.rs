use std::{io, time::Duration};

use thiserror::Error;

use crate::PeerAddr;

/// Everything that can go wrong inside a ring node.
///
/// None of these are fatal to the process: network failures are reported
/// to whichever operation issued the send, and the node keeps running.
#[derive(Debug, Error)]
pub enum RingError{
	#[error("malformed message: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("inbound message exceeds {limit} bytes")]
	MessageTooLarge{limit: usize},

	#[error("timed out reading inbound message after {after:?}")]
	ReadTimeout{after: Duration},

	#[error("could not connect to {addr}: {source}")]
	Connect{addr: PeerAddr, #[source] source: io::Error},

	#[error("timed out connecting to {addr} after {after:?}")]
	Timeout{addr: PeerAddr, after: Duration},

	#[error("failed to send to {addr}: {source}")]
	Send{addr: PeerAddr, #[source] source: io::Error},

	#[error("could not listen on {addr}: {source}")]
	Bind{addr: PeerAddr, #[source] source: io::Error},

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] io::Error),
}

impl RingError{
	/// True for failures that happened while reaching another peer.
	pub fn is_delivery_failure(&self) -> bool {
		matches!(self, RingError::Connect{..} | RingError::Timeout{..} | RingError::Send{..})
	}
}
