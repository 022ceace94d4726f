use std::fmt;

use tokio::sync::mpsc::{Sender, error::TrySendError};
use tracing::{instrument, info, warn};

use crate::{
	adaptor::RingAdaptor,
	ring::{event::RingEvent, message::RingMessage, state::{NodePhase, PeerState, RingStatus}},
	PeerAddr, RingError,
};


/// The outbound side of a node: turns user requests into protocol messages.
///
/// Cloning is cheap; all clones share the same ring pointers.
#[derive(Debug, Clone)]
pub struct LocalActor<ADAPTOR: RingAdaptor>{
	state: PeerState,
	adaptor: ADAPTOR,
	events: Sender<RingEvent>,
}


impl<ADAPTOR: RingAdaptor> LocalActor<ADAPTOR> {

	pub(crate) fn new(state: PeerState, adaptor: ADAPTOR, events: Sender<RingEvent>) -> Self{
		LocalActor{
			state,
			adaptor,
			events,
		}
	}

	/// Ask the node at `target` to splice us in before it.
	///
	/// The successor is set as soon as the JOIN is out; the predecessor only
	/// arrives later with the ACCEPT, so for a moment both may point at
	/// `target`.
	#[instrument(skip(self), fields(node = %self.state.alias()))]
	pub async fn request_join(&self, target: PeerAddr) -> Result<(), RingError>{
		let phase = self.state.get().phase;
		if !matches!(phase, NodePhase::Solo | NodePhase::Joining) {
			return Err(RingError::InvalidInput(format!("cannot join while {:?}", phase)));
		}
		if target == self.state.identity().addr {
			return Err(RingError::InvalidInput("cannot join yourself".to_string()));
		}

		let identity = self.state.identity();
		let join = RingMessage::join(&identity.alias, identity.addr.port);
		self.adaptor.send(&target, &join).await?;

		self.state.update(|pointers| {
			pointers.successor = target.clone();
			pointers.phase = NodePhase::Joining;
		});
		info!("sent JOIN to {}", target);
		Ok(())
	}

	/// Send `text` to the participant called `recipient`. The message goes to
	/// our successor and travels the ring from there.
	#[instrument(skip(self, text), fields(node = %self.state.alias()))]
	pub async fn request_send(&self, recipient: &str, text: &str) -> Result<(), RingError>{
		let alias = self.state.alias();
		if recipient == alias {
			return Err(RingError::InvalidInput("you can't message yourself".to_string()));
		}
		if recipient.trim().is_empty() {
			return Err(RingError::InvalidInput("recipient must not be empty".to_string()));
		}

		let status = self.state.get();
		if status.phase == NodePhase::Departed {
			return Err(RingError::InvalidInput("already left the ring".to_string()));
		}

		let put = RingMessage::put(alias, recipient, text);
		self.adaptor.send(&status.successor, &put).await
	}

	/// Tell both neighbours to link to each other.
	///
	/// Both notifications are attempted even if the first one fails; the
	/// report says which of them went out.
	#[instrument(skip(self), fields(node = %self.state.alias()))]
	pub async fn request_leave(&self) -> Result<LeaveReport, RingError>{
		let me = self.state.identity().addr.clone();
		let (successor, predecessor) = self.state.update(|pointers| {
			match pointers.phase {
				NodePhase::Leaving | NodePhase::Departed => Err(pointers.phase),
				_ => {
					pointers.phase = NodePhase::Leaving;
					Ok((pointers.successor.clone(), pointers.predecessor.clone()))
				},
			}
		}).map_err(|phase| RingError::InvalidInput(format!("cannot leave while {:?}", phase)))?;

		let report = if successor == me && predecessor == me {
			// nobody to tell
			LeaveReport{
				successor: successor.clone(),
				predecessor: predecessor.clone(),
				predecessor_notified: Ok(()),
				successor_notified: Ok(()),
			}
		}else{
			let predecessor_notified = self.adaptor.send(&predecessor, &RingMessage::new_successor(&successor)).await;
			if let Err(e) = &predecessor_notified {
				warn!("could not notify predecessor {}: {}", predecessor, e);
			}
			let successor_notified = self.adaptor.send(&successor, &RingMessage::leave(&predecessor)).await;
			if let Err(e) = &successor_notified {
				warn!("could not notify successor {}: {}", successor, e);
			}
			LeaveReport{
				successor,
				predecessor,
				predecessor_notified,
				successor_notified,
			}
		};

		self.state.update(|pointers| {
			pointers.successor = me.clone();
			pointers.predecessor = me.clone();
			pointers.phase = NodePhase::Departed;
		});
		info!("left the ring");
		if let Err(TrySendError::Full(event)) = self.events.try_send(RingEvent::Left) {
			warn!("event queue full, dropping {:?}", event);
		}
		Ok(report)
	}

	pub fn request_status(&self) -> RingStatus{
		self.state.get()
	}
}


/// Outcome of a leave. The protocol has no atomic two-sided leave, so either
/// notification may have failed independently.
#[derive(Debug)]
pub struct LeaveReport{
	pub successor: PeerAddr,
	pub predecessor: PeerAddr,
	/// NEWSUCCESSOR sent to the predecessor.
	pub predecessor_notified: Result<(), RingError>,
	/// LEAVE sent to the successor.
	pub successor_notified: Result<(), RingError>,
}

impl LeaveReport{
	pub fn is_complete(&self) -> bool{
		self.predecessor_notified.is_ok() && self.successor_notified.is_ok()
	}
}

impl fmt::Display for LeaveReport{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_complete() {
			return write!(f, "Left the ring");
		}
		write!(f, "Left, but not every neighbour could be told:")?;
		if let Err(e) = &self.predecessor_notified {
			write!(f, "\n  predecessor {}: {}", self.predecessor, e)?;
		}
		if let Err(e) = &self.successor_notified {
			write!(f, "\n  successor {}: {}", self.successor, e)?;
		}
		Ok(())
	}
}
