//! merkledrop CLI
//!
//! Builds distributions from allocation lists and operates a distributor
//! whose state is persisted between invocations as a JSON snapshot.

mod paths;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use merkledrop_builder::{load_allocations, Distribution};
use merkledrop_core::{hex_prefix, parse_amount, parse_digest, Address, Amount, CoreError, Digest};
use merkledrop_distributor::{DistributorEvent, DistributorSnapshot, TokenLedger};
use merkledrop_logging::LogLevel;
use merkledrop_merkle::HashAlgorithm;

use paths::{expand_path, DEFAULT_STATE_PATH};

/// merkledrop - Merkle airdrop distribution
#[derive(Parser)]
#[command(name = "merkledrop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Distributor state file
    #[arg(long, global = true, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a distribution (root + proofs) from an allocation list
    Build {
        /// Allocation list (.json, or CSV of address,amount)
        #[arg(short, long)]
        input: PathBuf,

        /// Output distribution file
        #[arg(short, long)]
        output: PathBuf,

        /// Hash primitive (keccak256, sha256)
        #[arg(long, default_value_t = HashAlgorithm::default())]
        hash: HashAlgorithm,
    },

    /// Check a claim against a distribution file without touching state
    Check {
        /// Distribution file
        #[arg(short, long)]
        distribution: PathBuf,

        /// Recipient address
        #[arg(short, long)]
        address: Address,

        /// Amount to check instead of the allocated one
        #[arg(long, value_parser = parse_amount_arg)]
        amount: Option<Amount>,
    },

    /// Create distributor state from a distribution file
    Init {
        /// Distribution file
        #[arg(short, long)]
        distribution: PathBuf,

        /// Admin allowed to sweep custody
        #[arg(long)]
        admin: Address,

        /// Initial custody balance (defaults to the distribution total)
        #[arg(long, value_parser = parse_amount_arg)]
        custody_balance: Option<Amount>,

        /// Asset identifier (defaults to one derived from the root)
        #[arg(long)]
        asset: Option<Address>,

        /// Custody address (defaults to one derived from the root)
        #[arg(long)]
        custody: Option<Address>,

        /// Overwrite existing state
        #[arg(long)]
        force: bool,
    },

    /// Claim an allocation
    Claim {
        /// Recipient address
        #[arg(short, long)]
        address: Address,

        /// Distribution file to take amount and proof from
        #[arg(short, long, conflicts_with_all = ["amount", "proof"])]
        distribution: Option<PathBuf>,

        /// Claimed amount
        #[arg(long, value_parser = parse_amount_arg, requires = "proof")]
        amount: Option<Amount>,

        /// Proof digest (repeat, leaf level first)
        #[arg(long, value_parser = parse_digest_arg)]
        proof: Vec<Digest>,
    },

    /// Add tokens to custody
    Fund {
        #[arg(long, value_parser = parse_amount_arg)]
        amount: Amount,
    },

    /// Sweep distributed tokens from custody to the admin
    Sweep {
        /// Caller address (must be the admin)
        #[arg(long)]
        caller: Address,

        #[arg(long, value_parser = parse_amount_arg)]
        amount: Amount,
    },

    /// Show distributor state
    Status {
        /// Also show claim status and balance of this address
        #[arg(short, long)]
        address: Option<Address>,
    },
}

fn parse_amount_arg(s: &str) -> std::result::Result<Amount, CoreError> {
    parse_amount(s)
}

fn parse_digest_arg(s: &str) -> std::result::Result<Digest, CoreError> {
    parse_digest(s)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    merkledrop_logging::try_init(LogLevel::from_verbosity(cli.verbose))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let state = expand_path(&cli.state);
    debug!("Using state file {}", state.display());

    match cli.command {
        Commands::Build {
            input,
            output,
            hash,
        } => {
            build(&input, &output, hash)?;
        }
        Commands::Check {
            distribution,
            address,
            amount,
        } => {
            check(&distribution, address, amount)?;
        }
        Commands::Init {
            distribution,
            admin,
            custody_balance,
            asset,
            custody,
            force,
        } => {
            init(
                &state,
                &distribution,
                admin,
                custody_balance,
                asset,
                custody,
                force,
            )?;
        }
        Commands::Claim {
            address,
            distribution,
            amount,
            proof,
        } => {
            claim(&state, address, distribution.as_deref(), amount, proof).await?;
        }
        Commands::Fund { amount } => {
            fund(&state, amount)?;
        }
        Commands::Sweep { caller, amount } => {
            sweep(&state, caller, amount).await?;
        }
        Commands::Status { address } => {
            status(&state, address).await?;
        }
    }

    Ok(())
}

// ============================================================================
// Distribution files
// ============================================================================

fn build(input: &Path, output: &Path, hash: HashAlgorithm) -> Result<()> {
    let allocations = load_allocations(input)
        .with_context(|| format!("Failed to load allocations from {}", input.display()))?;
    let distribution = Distribution::build(hash, &allocations)?;
    distribution
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Distribution built");
    println!("  Root:       0x{}", hex::encode(distribution.merkle_root));
    println!("  Hash:       {}", distribution.hash);
    println!("  Recipients: {}", distribution.len());
    println!("  Total:      {}", distribution.token_total);
    println!("  Written to: {}", output.display());
    Ok(())
}

fn load_distribution(path: &Path) -> Result<Distribution> {
    let distribution = Distribution::load(path)
        .with_context(|| format!("Failed to load distribution from {}", path.display()))?;
    Ok(distribution)
}

fn check(path: &Path, address: Address, amount: Option<Amount>) -> Result<()> {
    let distribution = load_distribution(path)?;
    let Some(entry) = distribution.claim_for(&address) else {
        bail!("{} has no allocation in {}", address, path.display());
    };

    let amount = amount.unwrap_or(entry.amount);
    let valid = merkledrop_merkle::verify(
        distribution.hash,
        &address,
        amount,
        &entry.proof,
        &distribution.merkle_root,
    );

    println!("Address: {}", address);
    println!("Amount:  {}", amount);
    println!("Proof:   {} digests", entry.proof.len());
    if valid {
        println!("Claim is valid");
        Ok(())
    } else {
        bail!("Claim does not verify against root {}", hex_prefix(&distribution.merkle_root))
    }
}

// ============================================================================
// Distributor state
// ============================================================================

/// Identity derived from the root so repeated `init`s agree without flags.
fn derived_address(label: &[u8], root: &Digest) -> Address {
    let digest = HashAlgorithm::Keccak256.hash(&[label, root.as_slice()]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from(bytes)
}

fn load_state(path: &Path) -> Result<DistributorSnapshot> {
    if !path.exists() {
        bail!(
            "No distributor state at {} (run `merkledrop init` first)",
            path.display()
        );
    }
    Ok(DistributorSnapshot::load(path)?)
}

fn init(
    state: &Path,
    distribution_path: &Path,
    admin: Address,
    custody_balance: Option<Amount>,
    asset: Option<Address>,
    custody: Option<Address>,
    force: bool,
) -> Result<()> {
    if state.exists() && !force {
        bail!(
            "State already exists at {} (use --force to overwrite)",
            state.display()
        );
    }
    if admin.is_zero() {
        bail!("Admin must not be the zero address");
    }

    let distribution = load_distribution(distribution_path)?;
    let root = distribution.merkle_root;
    let asset = asset.unwrap_or_else(|| derived_address(b"asset", &root));
    let custody = custody.unwrap_or_else(|| derived_address(b"custody", &root));
    let custody_balance = custody_balance.unwrap_or(distribution.token_total);

    let snapshot = DistributorSnapshot::genesis(
        distribution.config(),
        admin,
        asset,
        custody,
        custody_balance,
    );
    snapshot.save(state)?;

    println!("Distributor initialized");
    println!("  Root:    0x{}", hex::encode(root));
    println!("  Admin:   {}", admin);
    println!("  Asset:   {}", asset);
    println!("  Custody: {} ({})", custody, custody_balance);
    println!("  State:   {}", state.display());
    Ok(())
}

async fn claim(
    state: &Path,
    address: Address,
    distribution: Option<&Path>,
    amount: Option<Amount>,
    proof: Vec<Digest>,
) -> Result<()> {
    let (amount, proof) = match (distribution, amount) {
        (Some(path), _) => {
            let distribution = load_distribution(path)?;
            let Some(entry) = distribution.claim_for(&address) else {
                bail!("{} has no allocation in {}", address, path.display());
            };
            (entry.amount, entry.proof.clone())
        }
        (None, Some(amount)) => (amount, proof),
        (None, None) => bail!("Provide --distribution, or --amount with --proof"),
    };

    let snapshot = load_state(state)?;
    let (distributor, token) = snapshot.restore()?;

    let result = distributor.claim(address, amount, &proof).await;
    // Rejected claims leave state untouched; only successes are persisted.
    let receipt = match result {
        Ok(receipt) => receipt,
        Err(e) if e.is_retriable() => {
            bail!("Claim failed: {} (retry once custody is funded)", e)
        }
        Err(e) => bail!("Claim rejected: {}", e),
    };

    DistributorSnapshot::capture(&distributor, &token).save(state)?;

    println!("Claimed {} for {}", receipt.amount, receipt.recipient);
    println!("  Custody remaining: {}", token.custody_balance());
    Ok(())
}

fn fund(state: &Path, amount: Amount) -> Result<()> {
    let snapshot = load_state(state)?;
    let (distributor, token) = snapshot.restore()?;

    token.mint(token.custody(), amount)?;
    DistributorSnapshot::capture(&distributor, &token).save(state)?;

    println!("Custody funded with {}", amount);
    println!("  Custody balance: {}", token.custody_balance());
    Ok(())
}

async fn sweep(state: &Path, caller: Address, amount: Amount) -> Result<()> {
    let snapshot = load_state(state)?;
    let (distributor, token) = snapshot.restore()?;

    distributor
        .sweep_distributed(caller, amount)
        .await
        .context("Sweep failed")?;
    DistributorSnapshot::capture(&distributor, &token).save(state)?;

    println!("Recovered {} to {}", amount, caller);
    println!("  Custody remaining: {}", token.custody_balance());
    Ok(())
}

async fn status(state: &Path, address: Option<Address>) -> Result<()> {
    let snapshot = load_state(state)?;
    let (distributor, token) = snapshot.restore()?;

    println!("merkledrop Status");
    println!("=================");
    println!("Root:        0x{}", hex::encode(distributor.merkle_root()));
    println!("Hash:        {}", distributor.config().hash);
    println!("Admin:       {}", distributor.admin());
    println!("Asset:       {}", token.asset_id());
    println!("Custody:     {}", token.custody());
    println!("Balance:     {}", distributor.custody_balance().await);
    println!("Claimed:     {}", distributor.ledger().claimed_count());

    if let Some(address) = address {
        println!();
        println!("Address:     {}", address);
        println!("Has claimed: {}", distributor.is_claimed(&address));
        println!("Balance:     {}", token.balance(&address));
    }

    let events = distributor.events().events();
    if !events.is_empty() {
        println!();
        println!("Events:");
        for event in events {
            match event {
                DistributorEvent::Claimed { recipient, amount } => {
                    println!("  Claimed    {} {}", recipient, amount);
                }
                DistributorEvent::Recovered { asset, amount } => {
                    println!("  Recovered  {} {}", asset, amount);
                }
            }
        }
    }

    Ok(())
}
