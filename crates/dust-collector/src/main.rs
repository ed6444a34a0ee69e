//! # dust-collect
//!
//! Sweeps the dust balances listed in a request file into one token with a
//! single collector transaction, optionally bridging the proceeds.
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chain_eth::LocalSigner;
use clap::Parser;
use dust_collector::clock::{Clock, SystemClock};
use dust_collector::provider::{ChainReader, Wallet};
use dust_collector::request::RequestFile;
use dust_collector::rpc::{JsonRpcClient, RpcWallet};
use dust_collector::{CollectOrchestrator, CollectorConfig, QuoteClient};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zeroize::Zeroizing;

/// Collects dust token balances through the Universal Router.
#[derive(Debug, Parser)]
#[command(author, version, about = "Dust collector", long_about = None)]
struct Args {
    /// JSON file describing the legs, target token and optional bridge destination.
    #[arg(long, value_name = "FILE")]
    request: PathBuf,
    /// TOML configuration; environment variables override its values.
    #[arg(long, value_name = "FILE", env = "DUST_CONFIG")]
    config: Option<PathBuf>,
    /// Ethereum JSON-RPC endpoint of the source chain.
    #[arg(long, value_name = "URL", env = "RPC_URL")]
    rpc_url: String,
    /// Name of the environment variable holding the hex private key.
    #[arg(long, value_name = "VAR", default_value = "PRIVATE_KEY")]
    private_key_env: String,
    /// Timeout for each JSON-RPC request.
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    rpc_timeout: u64,
}

impl Args {
    async fn run(self) -> anyhow::Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init();

        let config = CollectorConfig::load(self.config.as_deref())?;
        config.validate()?;

        let request = RequestFile::load(&self.request)?.into_request()?;

        let secret = Zeroizing::new(
            std::env::var(&self.private_key_env)
                .with_context(|| format!("{} is not set", self.private_key_env))?,
        );
        let signer = LocalSigner::from_hex(&secret)?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let rpc = Arc::new(JsonRpcClient::new(&self.rpc_url, Duration::from_secs(self.rpc_timeout))?);
        let wallet = Arc::new(RpcWallet::new(Arc::clone(&rpc), signer, Arc::clone(&clock)));

        let chain_id = rpc.chain_id().await.context("failed to reach the RPC endpoint")?;
        info!(chain_id, wallet = %wallet.address(), collector = %config.collect.collector, "starting collection");

        let quotes = QuoteClient::new(config.quote.clone(), config.relay.clone())?;
        let orchestrator = CollectOrchestrator::new(config, rpc, wallet, clock, quotes);

        match orchestrator.run(request).await {
            Ok(outcome) => {
                println!("tx hash:      {}", outcome.tx_hash);
                if let Some(block) = outcome.block_number {
                    println!("block:        {block}");
                }
                println!("entry point:  {:?}", outcome.entry);
                println!("value (wei):  {}", outcome.value);
                println!("setup txs:    {}", outcome.authorization_txs);
                Ok(())
            }
            Err(e) => bail!("collection aborted during {}: {}", e.phase, e.source),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    Args::parse().run().await
}
