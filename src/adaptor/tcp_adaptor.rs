use std::{net::SocketAddr, time::Duration};

use super::RingAdaptor;
use crate::{config::NodeConfig, ring::message::{Inbound, RingMessage}, PeerAddr, RingError};

use tokio::{net::{TcpListener, TcpStream}, sync::mpsc::Sender, task::JoinHandle, io::{AsyncWriteExt, AsyncReadExt}, time::{timeout, sleep}};
use tracing::{debug, warn, trace};

/// A RingAdaptor that opens one TCP connection per message.
#[derive(Debug, Clone)]
pub struct TcpAdaptor{
	connect_timeout: Duration,
	read_timeout: Duration,
	max_message_bytes: usize,
}

impl RingAdaptor for TcpAdaptor{

	fn new(config: &NodeConfig) -> Self{
		Self{
			connect_timeout: config.connect_timeout(),
			read_timeout: config.read_timeout(),
			max_message_bytes: config.max_message_bytes,
		}
	}

	async fn listen_handler(&self, listen_addr: PeerAddr, channel: Sender<Inbound>) -> Result<(SocketAddr, JoinHandle<()>), RingError> {
		let listener = TcpListener::bind((listen_addr.host.as_str(), listen_addr.port)).await
			.map_err(|source| RingError::Bind{addr: listen_addr.clone(), source})?;
		let local_addr = listener.local_addr()?;
		let adaptor = self.clone();

		let handle = tokio::spawn(async move{
			loop{
				match listener.accept().await {
					Err(e) => {
						// usually fd exhaustion, back off instead of spinning
						warn!("Encountered an error in accept: {}", e);
						sleep(Duration::from_millis(100)).await;
					},
					Ok((stream, peer)) => {
						let adaptor = adaptor.clone();
						let channel = channel.clone();
						tokio::spawn(async move{
							match adaptor.read_message(stream).await {
								Ok(message) => {
									trace!("received {} from {}", message.kind(), peer);
									if channel.send(Inbound{from: peer, message}).await.is_err() {
										debug!("dispatcher is gone, dropping message from {}", peer);
									}
								},
								Err(e) => {
									warn!("dropping connection from {}: {}", peer, e);
								},
							}
						});
					}
				}
			}
		});

		Ok((local_addr, handle))
	}

	async fn send(&self, addr: &PeerAddr, message: &RingMessage) -> Result<(), RingError> {
		let raw_data = message.encode()?;
		let connect = TcpStream::connect((addr.host.as_str(), addr.port));
		let mut stream = match timeout(self.connect_timeout, connect).await {
			Err(_) => return Err(RingError::Timeout{addr: addr.clone(), after: self.connect_timeout}),
			Ok(Err(source)) => return Err(RingError::Connect{addr: addr.clone(), source}),
			Ok(Ok(stream)) => stream,
		};
		stream.write_all(&raw_data).await
			.map_err(|source| RingError::Send{addr: addr.clone(), source})?;
		stream.shutdown().await
			.map_err(|source| RingError::Send{addr: addr.clone(), source})?;
		trace!("sent {} to {}", message.kind(), addr);
		Ok(())
	}
}


impl TcpAdaptor{
	/// Read until the peer closes its side, then decode exactly one message.
	async fn read_message(&self, stream: TcpStream) -> Result<RingMessage, RingError>{
		let limit = self.max_message_bytes;
		let mut buffer = Vec::new();
		let mut reader = stream.take(limit as u64 + 1);

		match timeout(self.read_timeout, reader.read_to_end(&mut buffer)).await {
			Err(_) => return Err(RingError::ReadTimeout{after: self.read_timeout}),
			Ok(result) => { result?; },
		}
		if buffer.len() > limit {
			return Err(RingError::MessageTooLarge{limit});
		}

		RingMessage::decode(&buffer)
	}
}
