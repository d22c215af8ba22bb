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

//! Deterministic epoch reward simulation and proportional reward allocation.

use chrono::{DateTime, Utc};
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::SimulatorConfig,
    error::{Result, RewardsError},
    models::{EpochReward, EpochSummary, SimulationParams},
};

/// Rewards of one validator for one simulated epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRewardSimulation {
    pub epoch: u64,
    pub active_stake: u128,
    pub total_reward: u128,
    pub validator_commission: u128,
    pub staker_reward: u128,
    pub simulation_params: SimulationParams,
}

impl EpochRewardSimulation {
    /// Turn the simulation into a reward row for `validator_id`.
    pub fn into_epoch_reward(
        self,
        validator_id: impl Into<String>,
        simulated_at: Option<DateTime<Utc>>,
    ) -> EpochReward {
        EpochReward {
            epoch: self.epoch,
            validator_id: validator_id.into(),
            total_reward: self.total_reward,
            validator_commission: self.validator_commission,
            staker_reward: self.staker_reward,
            active_stake: self.active_stake,
            simulation_params: Some(self.simulation_params),
            simulated_at,
        }
    }
}

/// Outcome of [RewardsSimulator::validate_rewards_distribution]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionCheck {
    pub is_valid: bool,
    /// Absolute difference between the allocated sum and the expected total
    pub difference: u128,
}

/// Reward allocated to one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAllocation {
    pub wallet_id: String,
    pub stake: u128,
    pub reward: u128,
}

/// Epoch reward simulator with a fixed configuration
#[derive(Debug, Clone)]
pub struct RewardsSimulator {
    config: SimulatorConfig,
    epoch_rate: Decimal,
}

impl RewardsSimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self> {
        config.validate()?;
        let epoch_rate = epoch_rate_of(&config).ok_or(RewardsError::Overflow("epoch rate"))?;
        Ok(Self { config, epoch_rate })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Yield of a single epoch, `annual_yield / epochs_per_year`.
    pub fn epoch_rate(&self) -> Decimal {
        self.epoch_rate
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            annual_yield: self.config.annual_yield,
            epochs_per_year: self.config.epochs_per_year,
            commission_rate: self.config.commission_rate,
            epoch_rate: self.epoch_rate,
        }
    }

    /// Compute the total reward of `active_stake` for one epoch and split it into validator
    /// commission and staker reward.
    ///
    /// The staker reward is the remainder of the total after commission, so the two always
    /// add up to the total exactly.
    pub fn simulate_epoch_rewards(
        &self,
        active_stake: u128,
        epoch: u64,
    ) -> Result<EpochRewardSimulation> {
        let stake = Decimal::from_u128(active_stake)
            .ok_or(RewardsError::Overflow("active stake exceeds decimal range"))?;

        // floor(stake * annual / epochs) == floor(stake * epoch_rate), without rounding the rate
        let total_reward = stake
            .checked_mul(self.config.annual_yield)
            .and_then(|v| v.checked_div(Decimal::from(self.config.epochs_per_year)))
            .ok_or(RewardsError::Overflow("total reward"))
            .and_then(|v| floor_to_u128(v, "total reward"))?;

        let validator_commission = mul_floor(total_reward, self.config.commission_rate)?;
        let staker_reward = total_reward - validator_commission;

        tracing::trace!(
            "Simulated epoch {}: stake={} total={} commission={} staker={}",
            epoch,
            active_stake,
            total_reward,
            validator_commission,
            staker_reward
        );

        Ok(EpochRewardSimulation {
            epoch,
            active_stake,
            total_reward,
            validator_commission,
            staker_reward,
            simulation_params: self.params(),
        })
    }

    /// Proportional share of `staker_reward` for a wallet holding `wallet_stake` of
    /// `total_stake`, rounded down.
    pub fn calculate_wallet_rewards(
        &self,
        wallet_stake: u128,
        total_stake: u128,
        staker_reward: u128,
    ) -> Result<u128> {
        if total_stake == 0 {
            return Ok(0);
        }
        if wallet_stake > total_stake {
            return Err(RewardsError::InvalidArgument(format!(
                "wallet stake {wallet_stake} exceeds total stake {total_stake}"
            )));
        }

        mul_div_floor(staker_reward, wallet_stake, total_stake)
    }

    /// Split `staker_reward` across wallets in proportion to their stake. The total stake is
    /// the sum of the given stakes.
    pub fn allocate_wallet_rewards(
        &self,
        stakes: &[(String, u128)],
        staker_reward: u128,
    ) -> Result<Vec<WalletAllocation>> {
        let total_stake = stakes
            .iter()
            .try_fold(0u128, |acc, (_, stake)| acc.checked_add(*stake))
            .ok_or(RewardsError::Overflow("total wallet stake"))?;

        stakes
            .iter()
            .map(|(wallet_id, stake)| {
                Ok(WalletAllocation {
                    wallet_id: wallet_id.clone(),
                    stake: *stake,
                    reward: self.calculate_wallet_rewards(*stake, total_stake, staker_reward)?,
                })
            })
            .collect()
    }

    /// Check that the floor-rounded `allocations` stay within `tolerance` of `expected_total`.
    pub fn validate_rewards_distribution(
        &self,
        allocations: &[u128],
        expected_total: u128,
        tolerance: u128,
    ) -> Result<DistributionCheck> {
        let allocated = allocations
            .iter()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or(RewardsError::Overflow("allocation sum"))?;
        let difference = allocated.abs_diff(expected_total);
        if allocated > expected_total {
            tracing::warn!("Allocated {} exceeds expected total {}", allocated, expected_total);
        }
        Ok(DistributionCheck { is_valid: difference <= tolerance, difference })
    }

    /// Manufacture one reward row per summary, using each summary's total active stake.
    pub fn simulate_for_summaries(
        &self,
        summaries: &[EpochSummary],
        simulated_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<EpochReward>> {
        summaries
            .iter()
            .map(|summary| {
                self.simulate_epoch_rewards(summary.total_active_stake, summary.epoch)
                    .map(|sim| sim.into_epoch_reward(summary.validator_id.clone(), simulated_at))
            })
            .collect()
    }
}

impl Default for RewardsSimulator {
    fn default() -> Self {
        let config = SimulatorConfig::default();
        // 0.05 / 73 is within decimal range
        let epoch_rate = epoch_rate_of(&config).unwrap_or_default();
        Self { config, epoch_rate }
    }
}

fn epoch_rate_of(config: &SimulatorConfig) -> Option<Decimal> {
    config.annual_yield.checked_div(Decimal::from(config.epochs_per_year))
}

/// `floor(amount * numerator / denominator)` computed exactly in integers.
///
/// Fails with `Overflow` only when the result itself does not fit in a `u128`.
pub(crate) fn mul_div_floor(amount: u128, numerator: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(RewardsError::InvalidArgument("division by zero stake".to_string()));
    }
    if let Some(product) = amount.checked_mul(numerator) {
        return Ok(product / denominator);
    }

    // amount * n / d == (amount / d) * n + (amount % d) * n / d
    let (quotient, remainder) = (amount / denominator, amount % denominator);
    let whole = quotient.checked_mul(numerator).ok_or(RewardsError::Overflow("amount * ratio"))?;
    let part = match remainder.checked_mul(numerator) {
        Some(product) => product / denominator,
        None => wide_mul_div(remainder, numerator, denominator),
    };
    whole.checked_add(part).ok_or(RewardsError::Overflow("amount * ratio"))
}

/// `floor(r * n / d)` for `r < d` without a wider integer type, by shift-and-add over the
/// bits of `n`. Keeps `q * d + rem == r * prefix(n)` with `rem < d`.
fn wide_mul_div(r: u128, n: u128, d: u128) -> u128 {
    let (mut q, mut rem) = (0u128, 0u128);
    for bit in (0..u128::BITS).rev() {
        q <<= 1;
        if rem >= d - rem {
            rem -= d - rem;
            q += 1;
        } else {
            rem += rem;
        }
        if (n >> bit) & 1 == 1 {
            if rem >= d - r {
                rem -= d - r;
                q += 1;
            } else {
                rem += r;
            }
        }
    }
    q
}

/// `floor(amount * ratio)` for a non-negative ratio.
pub(crate) fn mul_floor(amount: u128, ratio: Decimal) -> Result<u128> {
    let amount = Decimal::from_u128(amount)
        .ok_or(RewardsError::Overflow("amount exceeds decimal range"))?;
    let product = amount.checked_mul(ratio).ok_or(RewardsError::Overflow("amount * ratio"))?;
    floor_to_u128(product, "amount * ratio")
}

pub(crate) fn floor_to_u128(value: Decimal, what: &'static str) -> Result<u128> {
    value.floor().to_u128().ok_or(RewardsError::Overflow(what))
}
