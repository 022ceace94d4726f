use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use ring_chat::{actor::{LeaveReport, LocalActor}, config::NodeConfig, PeerAddr, TcpAdaptor, TcpRing};


/// Join a ring of chat peers.
#[derive(Debug, Parser)]
#[command(name = "ring-chat", version)]
struct Args{
	/// Name other participants use to message you
	alias: Option<String>,
	/// Port to listen on
	port: Option<u16>,

	/// Host to listen on and advertise
	#[arg(long, env = "RING_CHAT_HOST")]
	host: Option<String>,

	/// Join the ring through this node right away (host:port)
	#[arg(long)]
	join: Option<PeerAddr>,

	/// JSON config file; command line values take precedence
	#[arg(long, short)]
	config: Option<PathBuf>,

	#[arg(long)]
	connect_timeout_ms: Option<u64>,
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ring_chat=info")))
		.init();

	let args = Args::parse();
	let config = build_config(&args).await?;

	let mut handle = TcpRing::new(config).start(args.join.clone()).await
		.context("failed to start node")?;
	let actor = handle.actor();
	println!("Hello {}! Listening on {}", handle.identity().alias, handle.addr());

	if let Some(mut events) = handle.take_events() {
		tokio::spawn(async move{
			while let Some(event) = events.recv().await{
				println!("{}", event);
			}
		});
	}

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	menu(&actor, &mut lines).await?;

	println!("Goodbye {}!", handle.identity().alias);
	handle.stop().await;
	Ok(())
}


async fn build_config(args: &Args) -> anyhow::Result<NodeConfig>{
	let mut config = match &args.config {
		Some(path) => NodeConfig::from_file(path).await?,
		None => NodeConfig::default(),
	};
	if let Some(alias) = &args.alias {
		config.alias = alias.clone();
	}
	if let Some(port) = args.port {
		config.port = port;
	}
	if let Some(host) = &args.host {
		config.host = host.clone();
	}
	if let Some(ms) = args.connect_timeout_ms {
		config.connect_timeout_ms = ms;
	}
	config.validate().context("usage: ring-chat <alias> <port>")?;
	Ok(config)
}


/// Runs until the user leaves or stdin closes.
async fn menu(actor: &LocalActor<TcpAdaptor>, lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<()>{
	loop{
		println!("--------------------\nChoose an option!\n--------------------");
		println!("1) Join\n2) Send a message\n3) Print info\n4) Leave");

		let Some(choice) = lines.next_line().await? else {
			break;
		};
		match choice.trim() {
			"1" => {
				let Some(target) = prompt(lines, "Address you want to connect to (host:port)?").await? else { break };
				match target.parse::<PeerAddr>() {
					Ok(target) => {
						if let Err(e) = actor.request_join(target).await {
							println!("Join failed: {}", e);
						}
					},
					Err(e) => println!("{}", e),
				}
			},
			"2" => {
				let Some(recipient) = prompt(lines, "Who do you want to message?").await? else { break };
				let Some(text) = prompt(lines, &format!("What do you want to say to {}?", recipient)).await? else { break };
				if let Err(e) = actor.request_send(&recipient, &text).await {
					println!("Message not sent: {}", e);
				}
			},
			"3" => {
				println!("{}", actor.request_status());
			},
			"4" => {
				let report = actor.request_leave().await?;
				print_leave_report(&report);
				return Ok(());
			},
			other => println!("{} is an invalid option. Please try again", other),
		}
	}

	// stdin closed without an explicit leave, still let the neighbours know
	match actor.request_leave().await {
		Ok(report) => print_leave_report(&report),
		Err(e) => println!("Could not leave: {}", e),
	}
	Ok(())
}

fn print_leave_report(report: &LeaveReport){
	if !report.is_complete() {
		println!("{}", report);
	}
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, question: &str) -> anyhow::Result<Option<String>>{
	println!("{}", question);
	Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}
