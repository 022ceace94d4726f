use std::net::SocketAddr;

use serde::{Serialize, Deserialize};

use crate::{PeerAddr, RingError};



/// The five protocol messages exchanged between nodes.
///
/// On the wire each message is a JSON object carrying a `type` tag and a
/// nested `parameters` object, e.g.
/// `{"type":"JOIN","parameters":{"myAlias":"alice","myPort":4000}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters")]
pub enum RingMessage{
	/// A new node asks to be spliced in before the receiver.
	#[serde(rename = "JOIN")]
	Join{
		#[serde(rename = "myAlias")]
		alias: String,
		#[serde(rename = "myPort")]
		port: u16,
	},
	/// Tells a joining node who its predecessor is.
	#[serde(rename = "ACCEPT")]
	Accept{
		#[serde(rename = "ipPred")]
		ip: String,
		#[serde(rename = "portPred")]
		port: u16,
	},
	#[serde(rename = "NEWSUCCESSOR")]
	NewSuccessor{
		#[serde(rename = "ipSuccessor")]
		ip: String,
		#[serde(rename = "portSuccessor")]
		port: u16,
	},
	/// A chat message on its way around the ring.
	#[serde(rename = "PUT")]
	Put{
		#[serde(rename = "aliasSender")]
		sender: String,
		#[serde(rename = "aliasReceiver")]
		recipient: String,
		#[serde(rename = "message")]
		text: String,
	},
	/// Sent by a departing node to its successor, carrying the address
	/// the successor should adopt as predecessor.
	#[serde(rename = "LEAVE")]
	Leave{
		#[serde(rename = "ipPred")]
		ip: String,
		#[serde(rename = "portPred")]
		port: u16,
	},
}

impl RingMessage{
	pub fn join(alias: &str, port: u16) -> Self{
		RingMessage::Join{alias: alias.to_string(), port}
	}

	pub fn accept(predecessor: &PeerAddr) -> Self{
		RingMessage::Accept{ip: predecessor.host.clone(), port: predecessor.port}
	}

	pub fn new_successor(successor: &PeerAddr) -> Self{
		RingMessage::NewSuccessor{ip: successor.host.clone(), port: successor.port}
	}

	pub fn put(sender: &str, recipient: &str, text: &str) -> Self{
		RingMessage::Put{
			sender: sender.to_string(),
			recipient: recipient.to_string(),
			text: text.to_string(),
		}
	}

	pub fn leave(predecessor: &PeerAddr) -> Self{
		RingMessage::Leave{ip: predecessor.host.clone(), port: predecessor.port}
	}

	/// Name of the message type as it appears on the wire.
	pub fn kind(&self) -> &'static str{
		match self{
			RingMessage::Join{..} => "JOIN",
			RingMessage::Accept{..} => "ACCEPT",
			RingMessage::NewSuccessor{..} => "NEWSUCCESSOR",
			RingMessage::Put{..} => "PUT",
			RingMessage::Leave{..} => "LEAVE",
		}
	}

	pub fn encode(&self) -> Result<Vec<u8>, RingError>{
		Ok(serde_json::to_vec(self)?)
	}

	pub fn decode(raw: &[u8]) -> Result<Self, RingError>{
		Ok(serde_json::from_slice(raw)?)
	}
}


/// A decoded message together with the address of the connection it
/// arrived on.
#[derive(Debug, Clone)]
pub struct Inbound{
	pub from: SocketAddr,
	pub message: RingMessage,
}
