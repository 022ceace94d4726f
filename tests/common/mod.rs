#![allow(dead_code)]

use std::{collections::HashSet, net::SocketAddr, sync::Arc, time::Duration};

use parking_lot::Mutex;
use ring_chat::{
	adaptor::RingAdaptor,
	config::NodeConfig,
	ring::{event::RingEvent, message::{Inbound, RingMessage}, Ring, RingHandle},
	PeerAddr, RingError, TcpAdaptor, TcpRing,
};
use tokio::{sync::mpsc::Sender, task::JoinHandle, time::{sleep, Instant}};


pub const SETTLE: Duration = Duration::from_secs(5);

pub fn config(alias: &str) -> NodeConfig{
	let mut config = NodeConfig::new(alias, 0);
	config.connect_timeout_ms = 1_000;
	config.read_timeout_ms = 1_000;
	config
}

/// Poll `check` until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut check: impl FnMut() -> bool) -> bool{
	let deadline = Instant::now() + limit;
	loop{
		if check() {
			return true;
		}
		if Instant::now() >= deadline {
			return false;
		}
		sleep(Duration::from_millis(10)).await;
	}
}

/// Wait for an event matching `wanted`, skipping anything else.
pub async fn wait_for_event<A: RingAdaptor>(handle: &mut RingHandle<A>, limit: Duration, wanted: impl Fn(&RingEvent) -> bool) -> Option<RingEvent>{
	let deadline = Instant::now() + limit;
	loop{
		let remaining = deadline.saturating_duration_since(Instant::now());
		match tokio::time::timeout(remaining, handle.next_event()).await {
			Ok(Some(event)) if wanted(&event) => return Some(event),
			Ok(Some(_)) => continue,
			Ok(None) | Err(_) => return None,
		}
	}
}

/// Collect whatever events arrive within `window`.
pub async fn collect_events<A: RingAdaptor>(handle: &mut RingHandle<A>, window: Duration) -> Vec<RingEvent>{
	let mut events = Vec::new();
	let deadline = Instant::now() + window;
	loop{
		let remaining = deadline.saturating_duration_since(Instant::now());
		match tokio::time::timeout(remaining, handle.next_event()).await {
			Ok(Some(event)) => events.push(event),
			Ok(None) | Err(_) => return events,
		}
	}
}


pub async fn start_node(alias: &str) -> RingHandle<TcpAdaptor>{
	start_node_with(config(alias)).await
}

pub async fn start_node_with(config: NodeConfig) -> RingHandle<TcpAdaptor>{
	TcpRing::new(config).start(None).await.expect("node should start")
}

/// True once following successors from the first node visits every node
/// exactly once and each successor names the previous node as predecessor.
pub fn ring_is_consistent(nodes: &[RingHandle<TcpAdaptor>]) -> bool{
	let n = nodes.len();
	let index_of = |addr: &PeerAddr| nodes.iter().position(|h| &h.addr() == addr);

	let mut seen = HashSet::new();
	let mut current = 0;
	for _ in 0..n {
		if !seen.insert(current) {
			return false;
		}
		let status = nodes[current].status();
		let Some(next) = index_of(&status.successor) else {
			return false;
		};
		if nodes[next].status().predecessor != nodes[current].addr() {
			return false;
		}
		current = next;
	}
	current == 0 && seen.len() == n
}

/// Build a ring by having every node join the first one, waiting for the
/// ring to settle after each join. With aliases [A, B, C] this yields
/// A -> B -> C -> A.
pub async fn make_ring(aliases: &[&str]) -> Vec<RingHandle<TcpAdaptor>>{
	let mut nodes: Vec<RingHandle<TcpAdaptor>> = Vec::new();
	for alias in aliases {
		let node = start_node(alias).await;
		if let Some(first) = nodes.first() {
			node.actor().request_join(first.addr()).await.expect("join should be sent");
		}
		nodes.push(node);
		assert!(wait_until(SETTLE, || nodes.len() < 2 || ring_is_consistent(&nodes)).await, "ring did not settle");
	}
	nodes
}

pub async fn stop_all<A: RingAdaptor>(nodes: Vec<RingHandle<A>>){
	for node in nodes {
		node.stop().await;
	}
}


/// An in-memory adaptor: records outgoing messages instead of sending them
/// and lets tests inject inbound ones.
#[derive(Debug, Clone, Default)]
pub struct RecordingAdaptor{
	sent: Arc<Mutex<Vec<(PeerAddr, RingMessage)>>>,
	unreachable: Arc<Mutex<HashSet<PeerAddr>>>,
	inbound: Arc<Mutex<Option<Sender<Inbound>>>>,
}

impl RecordingAdaptor{
	pub fn sent(&self) -> Vec<(PeerAddr, RingMessage)>{
		self.sent.lock().clone()
	}

	pub fn clear(&self){
		self.sent.lock().clear();
	}

	pub fn make_unreachable(&self, addr: PeerAddr){
		self.unreachable.lock().insert(addr);
	}

	pub async fn inject(&self, from: SocketAddr, message: RingMessage){
		let channel = self.inbound.lock().clone().expect("node must be started");
		channel.send(Inbound{from, message}).await.expect("dispatcher should be running");
	}
}

impl RingAdaptor for RecordingAdaptor{
	fn new(_config: &NodeConfig) -> Self{
		Self::default()
	}

	async fn listen_handler(&self, listen_addr: PeerAddr, channel: Sender<Inbound>) -> Result<(SocketAddr, JoinHandle<()>), RingError> {
		*self.inbound.lock() = Some(channel);
		let port = if listen_addr.port == 0 { 7000 } else { listen_addr.port };
		let bound = SocketAddr::from(([127, 0, 0, 1], port));
		Ok((bound, tokio::spawn(std::future::pending())))
	}

	async fn send(&self, addr: &PeerAddr, message: &RingMessage) -> Result<(), RingError> {
		if self.unreachable.lock().contains(addr) {
			return Err(RingError::Connect{
				addr: addr.clone(),
				source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
			});
		}
		self.sent.lock().push((addr.clone(), message.clone()));
		Ok(())
	}
}

pub async fn start_recorded(alias: &str) -> (RingHandle<RecordingAdaptor>, RecordingAdaptor){
	start_recorded_with(config(alias)).await
}

pub async fn start_recorded_with(config: NodeConfig) -> (RingHandle<RecordingAdaptor>, RecordingAdaptor){
	let adaptor = RecordingAdaptor::default();
	let handle = Ring::with_adaptor(config, adaptor.clone()).start(None).await.expect("node should start");
	(handle, adaptor)
}

pub fn local(port: u16) -> PeerAddr{
	PeerAddr::new("127.0.0.1", port)
}

pub fn from(port: u16) -> SocketAddr{
	SocketAddr::from(([127, 0, 0, 1], port))
}
