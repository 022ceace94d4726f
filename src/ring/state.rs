

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use serde::{Serialize, Deserialize};

use crate::PeerAddr;



/// Who this node is. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity{
	pub alias: String,
	pub addr: PeerAddr,
}

/// Where a node is in its membership lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodePhase{
	/// Not part of any ring; both pointers refer to this node.
	Solo,
	/// JOIN sent, waiting for ACCEPT.
	Joining,
	Member,
	Leaving,
	Departed,
}

/// The mutable part of a node: its two neighbours. Only reachable through
/// [`PeerState::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingPointers{
	pub successor: PeerAddr,
	pub predecessor: PeerAddr,
	pub phase: NodePhase,
}

impl RingPointers{
	fn solo(addr: &PeerAddr) -> Self{
		RingPointers{
			successor: addr.clone(),
			predecessor: addr.clone(),
			phase: NodePhase::Solo,
		}
	}
}

/// A consistent copy of a node's view of the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingStatus{
	pub alias: String,
	pub addr: PeerAddr,
	pub successor: PeerAddr,
	pub predecessor: PeerAddr,
	pub phase: NodePhase,
}

impl fmt::Display for RingStatus{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Alias: {} ({}) {:?}", self.alias, self.addr, self.phase)?;
		writeln!(f, "Successor: {}", self.successor)?;
		write!(f, "Predecessor: {}", self.predecessor)
	}
}


/// Identity plus ring pointers, shared between the dispatcher and the local
/// actor. Every read-modify-write of the pointers happens inside a single
/// critical section.
#[derive(Debug, Clone)]
pub struct PeerState{
	identity: Arc<PeerIdentity>,
	pointers: Arc<Mutex<RingPointers>>,
}

impl PeerState{
	pub fn new(identity: PeerIdentity) -> Self{
		let pointers = RingPointers::solo(&identity.addr);
		PeerState{
			identity: Arc::new(identity),
			pointers: Arc::new(Mutex::new(pointers)),
		}
	}

	pub fn identity(&self) -> &PeerIdentity{
		&self.identity
	}

	pub fn alias(&self) -> &str{
		&self.identity.alias
	}

	/// Snapshot of the current pointers. The guard is held only while copying.
	pub fn get(&self) -> RingStatus{
		let pointers = self.pointers.lock().clone();
		RingStatus{
			alias: self.identity.alias.clone(),
			addr: self.identity.addr.clone(),
			successor: pointers.successor,
			predecessor: pointers.predecessor,
			phase: pointers.phase,
		}
	}

	/// Apply `mutator` atomically and return whatever it returns.
	///
	/// The mutator must not block; it runs with the guard held.
	pub fn update<R>(&self, mutator: impl FnOnce(&mut RingPointers) -> R) -> R{
		let mut pointers = self.pointers.lock();
		let result = mutator(&mut pointers);
		if pointers.successor == self.identity.addr
			&& pointers.predecessor == self.identity.addr
			&& pointers.phase == NodePhase::Member {
			pointers.phase = NodePhase::Solo;
		}
		result
	}
}


#[cfg(test)]
mod tests{
	use std::thread;

	use super::*;

	fn state() -> PeerState{
		PeerState::new(PeerIdentity{
			alias: "alice".to_string(),
			addr: PeerAddr::new("127.0.0.1", 4000),
		})
	}

	#[test]
	fn starts_solo(){
		let status = state().get();
		assert_eq!(status.phase, NodePhase::Solo);
		assert_eq!(status.successor, status.addr);
		assert_eq!(status.predecessor, status.addr);
	}

	#[test]
	fn update_returns_previous_value(){
		let state = state();
		let joiner = PeerAddr::new("127.0.0.1", 4001);
		let old = state.update(|p| {
			p.phase = NodePhase::Member;
			std::mem::replace(&mut p.predecessor, joiner.clone())
		});
		assert_eq!(old, PeerAddr::new("127.0.0.1", 4000));
		assert_eq!(state.get().predecessor, joiner);
	}

	#[test]
	fn member_with_both_pointers_on_self_falls_back_to_solo(){
		let state = state();
		let other = PeerAddr::new("127.0.0.1", 4001);
		state.update(|p| {
			p.successor = other.clone();
			p.predecessor = other.clone();
			p.phase = NodePhase::Member;
		});
		assert_eq!(state.get().phase, NodePhase::Member);

		let me = state.identity().addr.clone();
		state.update(|p| {
			p.successor = me.clone();
			p.predecessor = me.clone();
		});
		assert_eq!(state.get().phase, NodePhase::Solo);
	}

	#[test]
	fn concurrent_updates_do_not_interleave(){
		let state = state();
		let workers: Vec<_> = (0..8).map(|_| {
			let state = state.clone();
			thread::spawn(move || {
				for _ in 0..500 {
					state.update(|p| {
						let next = p.successor.port.wrapping_add(1);
						p.successor = PeerAddr::new(p.successor.host.clone(), next);
					});
				}
			})
		}).collect();
		for worker in workers {
			worker.join().unwrap();
		}
		assert_eq!(state.get().successor.port, 4000 + 8 * 500);
	}
}
