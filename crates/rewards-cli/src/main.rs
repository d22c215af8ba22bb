// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use partner_rewards::{
    CommissionCalculator, EngineConfig, InMemoryStore, RewardsSimulator, Snapshot,
};
use rust_decimal::Decimal;
use serde::Serialize;

mod dto;

use dto::{
    AllPartnersResponse, DistributionResponse, PartnerCommissionResponse, SimulationResponse,
    WalletRewardResponse,
};

/// Staking reward simulation and partner commission.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path of a TOML configuration file.
    #[clap(long, env = "PARTNER_REWARDS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Annual yield as a fraction, overriding the configuration file.
    #[clap(long, env, global = true)]
    annual_yield: Option<Decimal>,

    /// Number of epochs in a year, overriding the configuration file.
    #[clap(long, env, global = true)]
    epochs_per_year: Option<u64>,

    /// Validator commission rate in [0, 1], overriding the configuration file.
    #[clap(long, env, global = true)]
    validator_commission_rate: Option<Decimal>,

    /// Number of partners computed concurrently, overriding the configuration file.
    #[clap(long, env, global = true)]
    max_concurrent_partners: Option<usize>,

    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false, global = true)]
    log_json: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate the reward of one epoch for an active stake.
    Simulate {
        /// Active stake in native units.
        #[clap(long)]
        active_stake: u128,

        #[clap(long)]
        epoch: u64,
    },

    /// Proportional share of a staker reward for one wallet.
    WalletRewards {
        #[clap(long)]
        wallet_stake: u128,

        #[clap(long)]
        total_stake: u128,

        #[clap(long)]
        staker_reward: u128,
    },

    /// Check that allocated rewards add up to an expected total.
    ValidateDistribution {
        #[clap(long)]
        expected_total: u128,

        /// Largest accepted absolute difference.
        #[clap(long, default_value = "0")]
        tolerance: u128,

        /// Allocated amounts in native units.
        allocations: Vec<u128>,
    },

    /// Replace the reward rows of a snapshot with simulated ones.
    GenerateRewards {
        /// JSON snapshot file.
        #[clap(long)]
        snapshot: PathBuf,

        /// Output file, stdout when not set.
        #[clap(long)]
        output: Option<PathBuf>,
    },

    /// Commission of one partner over a range of epochs.
    Commission {
        /// JSON snapshot file.
        #[clap(long)]
        snapshot: PathBuf,

        #[clap(long)]
        partner: String,

        #[clap(long)]
        start_epoch: u64,

        #[clap(long)]
        end_epoch: u64,

        /// Partner commission rate in [0, 1].
        #[clap(long)]
        rate: Decimal,
    },

    /// Commission of every active partner over a range of epochs.
    CommissionAll {
        /// JSON snapshot file.
        #[clap(long)]
        snapshot: PathBuf,

        #[clap(long)]
        start_epoch: u64,

        #[clap(long)]
        end_epoch: u64,

        /// Partner commission rate in [0, 1].
        #[clap(long)]
        rate: Decimal,

        /// Include per-epoch details of each partner.
        #[clap(long, default_value_t = false)]
        with_epochs: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    if args.log_json {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(&args)?;

    match args.command {
        Command::Simulate { active_stake, epoch } => {
            let simulator = RewardsSimulator::new(config.simulator)?;
            let sim = simulator.simulate_epoch_rewards(active_stake, epoch)?;
            print_json(&SimulationResponse::from(&sim))
        }
        Command::WalletRewards { wallet_stake, total_stake, staker_reward } => {
            let simulator = RewardsSimulator::new(config.simulator)?;
            let reward =
                simulator.calculate_wallet_rewards(wallet_stake, total_stake, staker_reward)?;
            print_json(&WalletRewardResponse {
                wallet_stake: wallet_stake.to_string(),
                total_stake: total_stake.to_string(),
                staker_reward: staker_reward.to_string(),
                wallet_reward: reward.to_string(),
                wallet_reward_formatted: dto::format_amount(reward),
            })
        }
        Command::ValidateDistribution { expected_total, tolerance, allocations } => {
            let simulator = RewardsSimulator::new(config.simulator)?;
            let check =
                simulator.validate_rewards_distribution(&allocations, expected_total, tolerance)?;
            let allocated = allocations
                .iter()
                .try_fold(0u128, |acc, v| acc.checked_add(*v))
                .context("allocations overflow")?;
            print_json(&DistributionResponse::new(check, expected_total, allocated, tolerance))
        }
        Command::GenerateRewards { snapshot, output } => {
            let simulator = RewardsSimulator::new(config.simulator)?;
            let mut data = read_snapshot(&snapshot)?;
            data.epoch_rewards =
                simulator.simulate_for_summaries(&data.epoch_summaries, Some(chrono::Utc::now()))?;
            tracing::info!(
                "Generated {} reward rows from {}",
                data.epoch_rewards.len(),
                snapshot.display()
            );

            match output {
                Some(path) => {
                    let contents = serde_json::to_string_pretty(&data)?;
                    std::fs::write(&path, contents)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    Ok(())
                }
                None => print_json(&data),
            }
        }
        Command::Commission { snapshot, partner, start_epoch, end_epoch, rate } => {
            let calculator = open_calculator(&snapshot, &config)?;
            let result = calculator
                .calculate_partner_commission(&partner, start_epoch, end_epoch, rate)
                .await
                .with_context(|| format!("Failed to compute commission for partner {partner}"))?;
            print_json(&PartnerCommissionResponse::new(&result, true))
        }
        Command::CommissionAll { snapshot, start_epoch, end_epoch, rate, with_epochs } => {
            let calculator = open_calculator(&snapshot, &config)?;
            let all = calculator
                .calculate_all_partners_commission(start_epoch, end_epoch, rate)
                .await
                .context("Failed to compute partner commissions")?;
            print_json(&AllPartnersResponse::new(&all, with_epochs))
        }
    }
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(annual_yield) = args.annual_yield {
        config.simulator.annual_yield = annual_yield;
    }
    if let Some(epochs_per_year) = args.epochs_per_year {
        config.simulator.epochs_per_year = epochs_per_year;
    }
    if let Some(rate) = args.validator_commission_rate {
        config.simulator.commission_rate = rate;
    }
    if let Some(max) = args.max_concurrent_partners {
        config.calculator.max_concurrent_partners = max;
    }
    config.validate().context("Invalid configuration")?;
    tracing::debug!("Using configuration {:?}", config);
    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))
}

fn open_calculator(path: &Path, config: &EngineConfig) -> Result<CommissionCalculator> {
    let store = InMemoryStore::new(read_snapshot(path)?)
        .with_context(|| format!("Invalid snapshot {}", path.display()))?;
    Ok(CommissionCalculator::from_store(Arc::new(store), config.calculator.clone())?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
