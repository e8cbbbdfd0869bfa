use clap::Parser;
use scrabble_server::config::DEFAULT_PORT;
use scrabble_server::error::Result;
use scrabble_server::protocol::command::NO_OUTPUT;
use scrabble_server::transport::{load_private_key, Client};
use scrabble_server::utils::crypto::CipherSuite;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive word-board client
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server host name or address
    host: String,

    /// Registered username
    username: String,

    /// PEM private key matching the registered public key
    #[arg(short, long)]
    key: PathBuf,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Session cipher; must match the server
    #[arg(long, default_value_t = CipherSuite::Aes128Ecb)]
    cipher: CipherSuite,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("scrabble-client: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let key = load_private_key(&args.key)?;
    let addr = format!("{}:{}", args.host, args.port);
    let mut client = Client::connect(&addr, &args.username, &key, args.cipher).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match client.command(&line).await? {
            Some(reply) if reply == NO_OUTPUT => {}
            Some(reply) => print!("{reply}"),
            None => return Ok(()),
        }
    }

    client.close().await
}
