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

//! Records consumed by the engine. Amounts are in the chain's smallest native unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Basis points in 100%.
pub const MAX_BPS: u16 = 10_000;

/// Stake and commission of one validator in one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub validator_id: String,
    pub epoch: u64,
    /// Validator commission in basis points (0-10000)
    pub commission_bps: u16,
    /// Total active stake delegated to the validator in the epoch
    pub total_active_stake: u128,
}

impl EpochSummary {
    /// Commission as a fraction of one.
    pub fn commission_rate(&self) -> Decimal {
        Decimal::from(self.commission_bps) / Decimal::from(MAX_BPS)
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.commission_bps > MAX_BPS {
            return Err(StoreError::InvalidRecord(format!(
                "commission_bps {} of validator {} in epoch {} exceeds {}",
                self.commission_bps, self.validator_id, self.epoch, MAX_BPS
            )));
        }
        Ok(())
    }
}

/// A stake position as observed in one epoch.
///
/// The position is attributed through its withdrawer wallet, which holds the economic benefit,
/// not through the staker wallet that controls it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeAccount {
    pub epoch: u64,
    pub validator_id: String,
    pub withdrawer_wallet_id: String,
    pub staker_wallet_id: String,
    pub stake_amount: u128,
    pub activation_epoch: u64,
    #[serde(default)]
    pub deactivation_epoch: Option<u64>,
}

impl StakeAccount {
    pub fn validate(&self) -> Result<(), StoreError> {
        match self.deactivation_epoch {
            Some(deactivation) if deactivation < self.activation_epoch => {
                Err(StoreError::InvalidRecord(format!(
                    "stake account of withdrawer {} deactivates in epoch {} before activating in epoch {}",
                    self.withdrawer_wallet_id, deactivation, self.activation_epoch
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Parameters a simulated reward row was produced with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub annual_yield: Decimal,
    pub epochs_per_year: u64,
    pub commission_rate: Decimal,
    pub epoch_rate: Decimal,
}

/// Reward earned by one validator in one epoch, split into commission and staker reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochReward {
    pub epoch: u64,
    pub validator_id: String,
    pub total_reward: u128,
    pub validator_commission: u128,
    pub staker_reward: u128,
    pub active_stake: u128,
    /// Present only for rows produced by the simulator
    #[serde(default)]
    pub simulation_params: Option<SimulationParams>,
    /// Bookkeeping only, never read by any computation
    #[serde(default)]
    pub simulated_at: Option<DateTime<Utc>>,
}

impl EpochReward {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.validator_commission.checked_add(self.staker_reward) != Some(self.total_reward) {
            return Err(StoreError::InvalidRecord(format!(
                "reward of validator {} in epoch {}: commission {} + staker reward {} != total {}",
                self.validator_id,
                self.epoch,
                self.validator_commission,
                self.staker_reward,
                self.total_reward
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerWallet {
    pub wallet_id: String,
    pub partner_id: String,
    pub chain_id: String,
    pub address: String,
    pub active: bool,
}
