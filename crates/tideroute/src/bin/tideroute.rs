use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::read_keypair_file;
use solana_sdk::signer::Signer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tideroute::{
    apply_slippage, RateLimitedTransport, Router, RouterConfig, RpcTransport, SubmitOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "tideroute")]
#[command(about = "Best-price swap routing across pump AMM and Raydium pools")]
struct Args {
    /// Path to router configuration file (mainnet defaults when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// RPC URL override
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Write the effective configuration, overrides applied, to this TOML file
    #[arg(long)]
    save_config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every pool trading a mint pair
    Pools { base: String, quote: String },

    /// Quote the best single-hop route
    Quote {
        input: String,
        output: String,
        amount: u64,
    },

    /// Route and submit a swap
    Swap {
        input: String,
        output: String,
        amount: u64,

        /// Simulate instead of sending
        #[arg(long)]
        simulate: bool,

        /// Signer keypair file, overriding the config
        #[arg(short, long)]
        keypair: Option<String>,
    },
}

fn parse_mint(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid mint address {}", value))
}

fn load_config(args: &Args) -> Result<RouterConfig> {
    let config = match &args.config {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig::mainnet(),
    };
    let config = match &args.rpc_url {
        Some(rpc_url) => config.with_rpc_url(rpc_url.clone()),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = load_config(&args).context("Failed to load configuration")?;
    info!(rpc_url = %config.rpc_url, commitment = %config.commitment, "starting tideroute");
    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!(path = %path, "saved configuration");
    }

    let rpc = Arc::new(RpcTransport::new(
        config.rpc_url.clone(),
        config.commitment_config()?,
    ));
    let transport =
        RateLimitedTransport::new(rpc.clone(), config.requests_per_second, config.burst)?;
    let router = Router::from_config(&config, Arc::new(transport));
    info!(protocols = ?router.protocol_names(), "registered protocols");

    match args.command {
        Command::Pools { base, quote } => {
            let (base, quote) = (parse_mint(&base)?, parse_mint(&quote)?);
            let pools = router.query_all_pools(&base, &quote).await?;
            info!(pools = pools.len(), "discovery finished");
            if args.json {
                let listed: Vec<_> = pools
                    .iter()
                    .map(|pool| {
                        let (token_a, token_b) = pool.tokens();
                        json!({
                            "id": pool.id().to_string(),
                            "kind": pool.kind().name(),
                            "token_a": token_a.to_string(),
                            "token_b": token_b.to_string(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else {
                for pool in &pools {
                    println!("{}", pool);
                }
            }
        }
        Command::Quote {
            input,
            output,
            amount,
        } => {
            let (input, output) = (parse_mint(&input)?, parse_mint(&output)?);
            let best = router.get_best_pool(&input, &output, amount).await?;
            let min_amount_out = apply_slippage(best.amount_out, config.slippage_bps);
            if args.json {
                let quote = json!({
                    "pool": best.pool.id().to_string(),
                    "kind": best.pool.kind().name(),
                    "amount_in": amount,
                    "amount_out": best.amount_out,
                    "min_amount_out": min_amount_out,
                    "slippage_bps": config.slippage_bps,
                });
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                println!("pool:        {}", best.pool);
                println!("amount in:   {}", amount);
                println!("amount out:  {}", best.amount_out);
                println!(
                    "minimum out: {} ({} bps slippage)",
                    min_amount_out, config.slippage_bps
                );
            }
        }
        Command::Swap {
            input,
            output,
            amount,
            simulate,
            keypair,
        } => {
            let (input, output) = (parse_mint(&input)?, parse_mint(&output)?);
            let keypair_path = keypair
                .or_else(|| config.keypair_path.clone())
                .ok_or_else(|| anyhow!("No keypair given; pass --keypair or set keypair_path"))?;
            let signer = read_keypair_file(&keypair_path)
                .map_err(|e| anyhow!("Failed to load keypair from {}: {}", keypair_path, e))?;

            let best = router.get_best_pool(&input, &output, amount).await?;
            let min_amount_out = apply_slippage(best.amount_out, config.slippage_bps);
            info!(
                pool = %best.pool,
                amount_out = best.amount_out,
                min_amount_out,
                "routing swap"
            );

            let plan = router
                .build_swap_plan(
                    &best.pool,
                    &config.programs,
                    &signer.pubkey(),
                    &input,
                    amount,
                    min_amount_out,
                )
                .await
                .context("Failed to build swap")?;

            if !simulate {
                warn!("sending transaction without preflight");
            }
            match rpc.submit(&[plan.into_instruction()], &signer, simulate).await? {
                SubmitOutcome::Sent(signature) => println!("signature: {}", signature),
                SubmitOutcome::Simulated {
                    err,
                    logs,
                    units_consumed,
                } => {
                    for line in &logs {
                        println!("{}", line);
                    }
                    if let Some(units) = units_consumed {
                        println!("compute units: {}", units);
                    }
                    match err {
                        Some(err) => println!("simulation failed: {}", err),
                        None => println!("simulation succeeded"),
                    }
                }
            }
        }
    }

    Ok(())
}
