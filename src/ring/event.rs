use std::fmt;

use chrono::{DateTime, Utc};

use crate::PeerAddr;


/// Notifications the node hands to whoever is displaying the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingEvent{
	/// A chat message addressed to this node arrived.
	Delivered{sender: String, text: String, received_at: DateTime<Utc>},
	/// A message this node sent travelled the whole ring without finding
	/// its recipient.
	RecipientUnavailable{recipient: String},

	/// Another node is being spliced in as this node's predecessor.
	PeerJoining{alias: String, addr: PeerAddr},
	/// The ACCEPT for this node's own JOIN arrived.
	Joined{predecessor: PeerAddr},
	SuccessorChanged{successor: PeerAddr},
	PredecessorChanged{predecessor: PeerAddr},
	/// Both neighbours have been told to re-link.
	Left,
}

impl fmt::Display for RingEvent{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self{
			RingEvent::Delivered{sender, text, received_at} => {
				write!(f, "[{}] {} said '{}'", received_at.format("%H:%M:%S"), sender, text)
			},
			RingEvent::RecipientUnavailable{recipient} => {
				write!(f, "{} is not available in this chat room", recipient)
			},
			RingEvent::PeerJoining{alias, addr} => write!(f, "{} ({}) is joining the chat", alias, addr),
			RingEvent::Joined{predecessor} => write!(f, "Accepted into the chat, predecessor is {}", predecessor),
			RingEvent::SuccessorChanged{successor} => write!(f, "New successor is {}", successor),
			RingEvent::PredecessorChanged{predecessor} => write!(f, "New predecessor is {}", predecessor),
			RingEvent::Left => write!(f, "Left the chat"),
		}
	}
}
