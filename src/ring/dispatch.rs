use std::net::SocketAddr;

use chrono::Utc;
use tokio::sync::mpsc::{Receiver, Sender, error::TrySendError};
use tracing::{instrument, info, debug, warn};

use crate::{adaptor::RingAdaptor, PeerAddr};

use super::{
	event::RingEvent,
	message::{Inbound, RingMessage},
	state::{NodePhase, PeerState},
};



/// Applies inbound protocol messages to the local ring pointers, one at a
/// time in arrival order.
pub(crate) struct Dispatcher<ADAPTOR: RingAdaptor>{
	state: PeerState,
	adaptor: ADAPTOR,
	events: Sender<RingEvent>,
}

impl<ADAPTOR: RingAdaptor> Dispatcher<ADAPTOR>{

	pub(crate) fn new(state: PeerState, adaptor: ADAPTOR, events: Sender<RingEvent>) -> Self{
		Dispatcher{
			state,
			adaptor,
			events,
		}
	}

	pub(crate) async fn run(self, mut channel: Receiver<Inbound>){
		while let Some(inbound) = channel.recv().await{
			self.process(inbound).await;
		}
		info!("dispatcher for {} terminating", self.state.alias());
	}

	pub(crate) async fn process(&self, inbound: Inbound){
		let Inbound{from, message} = inbound;
		if self.state.get().phase == NodePhase::Departed {
			// our pointers lead back to ourselves now, acting on anything would loop
			debug!("{} has left, dropping {} from {}", self.state.alias(), message.kind(), from);
			return;
		}
		debug!("Processing {} from {}: {:?}", message.kind(), from, message);
		match message{
			RingMessage::Join{alias, port} => {
				self.join(from, alias, port).await;
			},
			RingMessage::Accept{ip, port} => {
				self.accept(PeerAddr::new(ip, port));
			},
			RingMessage::NewSuccessor{ip, port} => {
				self.new_successor(PeerAddr::new(ip, port));
			},
			RingMessage::Put{..} => {
				self.put(message).await;
			},
			RingMessage::Leave{ip, port} => {
				self.leave(PeerAddr::new(ip, port));
			},
		}
	}

	/// Splice the joining node in as our predecessor. The old predecessor is
	/// taken in the same critical section that installs the joiner, so the
	/// NEWSUCCESSOR below always goes to the node that actually preceded us.
	#[instrument(skip(self), fields(node = %self.state.alias()))]
	async fn join(&self, from: SocketAddr, alias: String, port: u16){
		// the JOIN only carries a port, the host is wherever it connected from
		let joiner = PeerAddr{port, ..PeerAddr::from(from)};
		info!("{} wants to join at {}", alias, joiner);

		let old_predecessor = self.state.update(|pointers| {
			if pointers.phase == NodePhase::Solo {
				pointers.phase = NodePhase::Member;
			}
			std::mem::replace(&mut pointers.predecessor, joiner.clone())
		});
		self.notify(RingEvent::PeerJoining{alias, addr: joiner.clone()});

		if let Err(e) = self.adaptor.send(&joiner, &RingMessage::accept(&old_predecessor)).await {
			warn!("could not send ACCEPT to {}: {}", joiner, e);
		}
		if let Err(e) = self.adaptor.send(&old_predecessor, &RingMessage::new_successor(&joiner)).await {
			warn!("could not send NEWSUCCESSOR to {}: {}", old_predecessor, e);
		}
	}

	#[instrument(skip(self), fields(node = %self.state.alias()))]
	fn accept(&self, predecessor: PeerAddr){
		self.state.update(|pointers| {
			pointers.predecessor = predecessor.clone();
			if pointers.phase == NodePhase::Joining {
				pointers.phase = NodePhase::Member;
			}
		});
		info!("accepted into the ring, predecessor is {}", predecessor);
		self.notify(RingEvent::Joined{predecessor});
	}

	#[instrument(skip(self), fields(node = %self.state.alias()))]
	fn new_successor(&self, successor: PeerAddr){
		self.state.update(|pointers| {
			pointers.successor = successor.clone();
			if pointers.phase == NodePhase::Solo && successor != self.state.identity().addr {
				pointers.phase = NodePhase::Member;
			}
		});
		info!("successor is now {}", successor);
		self.notify(RingEvent::SuccessorChanged{successor});
	}

	async fn put(&self, message: RingMessage){
		let RingMessage::Put{sender, recipient, text} = &message else {
			return;
		};
		let alias = self.state.alias();

		if sender == alias {
			// came all the way around
			info!("{} is not present in the ring", recipient);
			self.notify(RingEvent::RecipientUnavailable{recipient: recipient.clone()});
		}else if recipient == alias {
			self.notify(RingEvent::Delivered{
				sender: sender.clone(),
				text: text.clone(),
				received_at: Utc::now(),
			});
		}else{
			let successor = self.state.get().successor;
			debug!("forwarding message for {} to {}", recipient, successor);
			if let Err(e) = self.adaptor.send(&successor, &message).await {
				warn!("could not forward message for {} to {}: {}", recipient, successor, e);
			}
		}
	}

	#[instrument(skip(self), fields(node = %self.state.alias()))]
	fn leave(&self, predecessor: PeerAddr){
		self.state.update(|pointers| {
			pointers.predecessor = predecessor.clone();
		});
		info!("predecessor left, predecessor is now {}", predecessor);
		self.notify(RingEvent::PredecessorChanged{predecessor});
	}

	/// Hand an event to the display side without ever blocking the dispatcher.
	fn notify(&self, event: RingEvent){
		match self.events.try_send(event) {
			Ok(()) => {},
			Err(TrySendError::Full(event)) => {
				warn!("event queue full, dropping {:?}", event);
			},
			Err(TrySendError::Closed(_)) => {},
		}
	}
}
