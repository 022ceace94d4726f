use std::{future::Future, net::SocketAddr};

use tokio::{task::JoinHandle, sync::mpsc::Sender};

use crate::{config::NodeConfig, ring::message::{Inbound, RingMessage}, PeerAddr, RingError};


pub mod tcp_adaptor;


/// The transport a ring node runs over.
///
/// Every message travels on its own connection: the sender opens it, writes
/// one encoded message and closes it. There is no reply on the same
/// connection.
pub trait RingAdaptor: Clone + Send + Sync + 'static{

	fn new(config: &NodeConfig) -> Self;

	/// Start accepting incoming connections on `listen_addr`. Each decoded
	/// message is pushed into `channel`. Returns the address actually bound
	/// (so a zero port can be resolved) and the handle of the accept task.
	fn listen_handler(&self, listen_addr: PeerAddr, channel: Sender<Inbound>)
		-> impl Future<Output = Result<(SocketAddr, JoinHandle<()>), RingError>> + Send;

	/// Deliver a single message to `addr`, fire-and-forget.
	fn send(&self, addr: &PeerAddr, message: &RingMessage)
		-> impl Future<Output = Result<(), RingError>> + Send;
}
