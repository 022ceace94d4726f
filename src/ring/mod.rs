use crate::{actor::LocalActor, adaptor::RingAdaptor, config::NodeConfig, PeerAddr, RingError};

use std::path::Path;

use tokio::sync::mpsc::{channel, Receiver};
use tokio::task::JoinHandle;
use tracing::info;


pub mod message;
pub mod event;
pub mod state;

mod dispatch;
use dispatch::Dispatcher;

use event::RingEvent;
use state::{PeerIdentity, PeerState};


/// A ring node before it is started. Created from a [`NodeConfig`] and
/// consumed by [`Ring::start`], which returns a [`RingHandle`].
#[derive(Debug)]
pub struct Ring<ADAPTOR: RingAdaptor>{
	config: NodeConfig,
	adaptor: ADAPTOR,
}

impl<ADAPTOR: RingAdaptor> Ring<ADAPTOR>{

	pub fn new(config: NodeConfig) -> Self{
		let adaptor = ADAPTOR::new(&config);
		Ring{
			config,
			adaptor,
		}
	}

	/// Use an already constructed adaptor instead of building one from the
	/// config.
	pub fn with_adaptor(config: NodeConfig, adaptor: ADAPTOR) -> Self{
		Ring{
			config,
			adaptor,
		}
	}

	/// Create a node from settings stored in a file.
	pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RingError>{
		let config = NodeConfig::from_file(path).await?;
		Ok(Ring::new(config))
	}

	pub fn config(&self) -> &NodeConfig{
		&self.config
	}

	/// Starts the node: binds the listener, spawns the dispatcher and, if
	/// `join_addr` is given, sends a JOIN there.
	///
	/// Without a join address the node starts on its own and waits for
	/// others to join it.
	pub async fn start(self, join_addr: Option<PeerAddr>) -> Result<RingHandle<ADAPTOR>, RingError>{
		self.config.validate()?;
		let capacity = self.config.channel_capacity;

		// Start listener task
		let (inbound_tx, inbound_rx) = channel(capacity);
		let (bound, listener_handle) = self.adaptor.listen_handler(self.config.listen_addr(), inbound_tx).await?;

		// Peers learn our host from the IP we connect from, so advertise the
		// resolved IP rather than a name like `localhost`.
		let addr = if bound.ip().is_unspecified() {
			PeerAddr::new(self.config.host.clone(), bound.port())
		}else{
			PeerAddr::from(bound)
		};
		let identity = PeerIdentity{
			alias: self.config.alias.clone(),
			addr,
		};
		info!("{} listening on {}", identity.alias, identity.addr);
		let state = PeerState::new(identity);

		// Spawn dispatcher task
		let (event_tx, event_rx) = channel(capacity);
		let dispatcher = Dispatcher::new(state.clone(), self.adaptor.clone(), event_tx.clone());
		let dispatcher_handle = tokio::spawn(dispatcher.run(inbound_rx));

		let handle = RingHandle{
			listener_handle,
			dispatcher_handle,
			actor: LocalActor::new(state.clone(), self.adaptor, event_tx),
			state,
			events: Some(event_rx),
		};

		if let Some(addr) = join_addr {
			let joined = handle.actor.request_join(addr).await;
			if let Err(e) = joined {
				handle.stop().await;
				return Err(e);
			}
		}

		Ok(handle)
	}
}



/// A running node.
pub struct RingHandle<ADAPTOR: RingAdaptor>{
	listener_handle: JoinHandle<()>,
	dispatcher_handle: JoinHandle<()>,

	actor: LocalActor<ADAPTOR>,
	state: PeerState,
	events: Option<Receiver<RingEvent>>,
}

impl<ADAPTOR: RingAdaptor> RingHandle<ADAPTOR> {
	/// The actor used to join, send, leave and query status.
	pub fn actor(&self) -> LocalActor<ADAPTOR>{
		self.actor.clone()
	}

	pub fn identity(&self) -> &PeerIdentity{
		self.state.identity()
	}

	pub fn addr(&self) -> PeerAddr{
		self.state.identity().addr.clone()
	}

	pub fn status(&self) -> state::RingStatus{
		self.state.get()
	}

	/// Wait for the next event. Returns None once the events have been
	/// taken with [`RingHandle::take_events`] or the node stopped.
	pub async fn next_event(&mut self) -> Option<RingEvent>{
		match self.events.as_mut() {
			Some(events) => events.recv().await,
			None => None,
		}
	}

	/// Take the event receiver, e.g. to drain it from a separate task.
	pub fn take_events(&mut self) -> Option<Receiver<RingEvent>>{
		self.events.take()
	}

	/// Stop accepting and dispatching messages.
	pub async fn stop(self){
		self.listener_handle.abort();
		let _ = self.listener_handle.await;
		self.dispatcher_handle.abort();
		let _ = self.dispatcher_handle.await;
	}
}
