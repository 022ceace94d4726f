
//! A peer-to-peer chat overlay arranged as a ring.
//!
//! Every process is one node. A node knows only its successor and its
//! predecessor; chat messages travel around the ring in the successor
//! direction until they reach the addressee or come back to the sender.

pub mod ring;
use ring::Ring;

pub mod adaptor;
pub use adaptor::tcp_adaptor::TcpAdaptor;

pub mod actor;
pub mod config;
pub mod error;

mod peer_addr;
pub use peer_addr::PeerAddr;

pub use error::RingError;


pub type TcpRing = Ring<TcpAdaptor>;
