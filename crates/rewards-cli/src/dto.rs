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

//! JSON output of the command line tool.
//!
//! Amounts are written as decimal strings of native units, paired with a `_formatted` field in
//! display units where a person is likely to read them.

use partner_rewards::{
    to_display_units, AllPartnersCommission, DistributionCheck, EpochCommissionDetail,
    EpochRewardSimulation, PartnerCommission, ValidatorCommissionSummary,
};
use serde::Serialize;

/// Display-unit rendering of a native amount
pub fn format_amount(amount: u128) -> String {
    match to_display_units(amount) {
        Ok(display) => display.to_string(),
        Err(_) => format!("{amount} native units"),
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    pub epoch: u64,
    pub active_stake: String,
    pub total_reward: String,
    pub total_reward_formatted: String,
    pub validator_commission: String,
    pub staker_reward: String,
    pub annual_yield: String,
    pub epochs_per_year: u64,
    pub commission_rate: String,
    pub epoch_rate: String,
}

impl From<&EpochRewardSimulation> for SimulationResponse {
    fn from(sim: &EpochRewardSimulation) -> Self {
        Self {
            epoch: sim.epoch,
            active_stake: sim.active_stake.to_string(),
            total_reward: sim.total_reward.to_string(),
            total_reward_formatted: format_amount(sim.total_reward),
            validator_commission: sim.validator_commission.to_string(),
            staker_reward: sim.staker_reward.to_string(),
            annual_yield: sim.simulation_params.annual_yield.to_string(),
            epochs_per_year: sim.simulation_params.epochs_per_year,
            commission_rate: sim.simulation_params.commission_rate.to_string(),
            epoch_rate: sim.simulation_params.epoch_rate.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletRewardResponse {
    pub wallet_stake: String,
    pub total_stake: String,
    pub staker_reward: String,
    pub wallet_reward: String,
    pub wallet_reward_formatted: String,
}

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub expected_total: String,
    pub allocated_total: String,
    pub tolerance: String,
    pub difference: String,
    pub is_valid: bool,
}

impl DistributionResponse {
    pub fn new(check: DistributionCheck, expected_total: u128, allocated: u128, tolerance: u128) -> Self {
        Self {
            expected_total: expected_total.to_string(),
            allocated_total: allocated.to_string(),
            tolerance: tolerance.to_string(),
            difference: check.difference.to_string(),
            is_valid: check.is_valid,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EpochCommissionEntry {
    pub epoch: u64,
    pub validator_id: String,
    pub total_active_stake: String,
    pub partner_stake: String,
    pub stake_percentage: String,
    pub total_reward: String,
    pub validator_commission: String,
    pub staker_reward: String,
    pub partner_staker_reward: String,
    pub validator_commission_share: String,
    pub partner_commission: String,
}

impl From<&EpochCommissionDetail> for EpochCommissionEntry {
    fn from(d: &EpochCommissionDetail) -> Self {
        Self {
            epoch: d.epoch,
            validator_id: d.validator_id.clone(),
            total_active_stake: d.total_active_stake.to_string(),
            partner_stake: d.partner_stake.to_string(),
            stake_percentage: d.stake_percentage.to_string(),
            total_reward: d.total_reward.to_string(),
            validator_commission: d.validator_commission.to_string(),
            staker_reward: d.staker_reward.to_string(),
            partner_staker_reward: d.partner_staker_reward.to_string(),
            validator_commission_share: d.validator_commission_share.to_string(),
            partner_commission: d.partner_commission.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidatorCommissionEntry {
    pub validator_id: String,
    pub epochs: u64,
    pub total_stake: String,
    pub average_stake: String,
    pub total_validator_commission_share: String,
    pub total_commission: String,
    pub total_commission_formatted: String,
    pub average_commission: String,
}

impl From<&ValidatorCommissionSummary> for ValidatorCommissionEntry {
    fn from(v: &ValidatorCommissionSummary) -> Self {
        Self {
            validator_id: v.validator_id.clone(),
            epochs: v.epochs,
            total_stake: v.total_stake.to_string(),
            average_stake: v.average_stake.to_string(),
            total_validator_commission_share: v.total_validator_commission_share.to_string(),
            total_commission: v.total_commission.to_string(),
            total_commission_formatted: format_amount(v.total_commission),
            average_commission: v.average_commission.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PartnerCommissionResponse {
    pub partner_id: String,
    pub partner_name: String,
    pub wallet_count: usize,
    pub validator_count: usize,
    pub start_epoch: u64,
    pub end_epoch: u64,
    pub epoch_count: u64,
    pub commission_rate: String,
    pub total_partner_stake: String,
    pub average_partner_stake: String,
    pub total_partner_staker_reward: String,
    pub total_validator_commission_share: String,
    pub total_commission: String,
    pub total_commission_formatted: String,
    pub validators: Vec<ValidatorCommissionEntry>,
    /// Omitted from the all-partners listing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epochs: Option<Vec<EpochCommissionEntry>>,
}

impl PartnerCommissionResponse {
    pub fn new(result: &PartnerCommission, with_epochs: bool) -> Self {
        Self {
            partner_id: result.partner_id.clone(),
            partner_name: result.partner_name.clone(),
            wallet_count: result.wallet_count,
            validator_count: result.validator_count,
            start_epoch: result.start_epoch,
            end_epoch: result.end_epoch,
            epoch_count: result.epoch_count,
            commission_rate: result.commission_rate.to_string(),
            total_partner_stake: result.total_partner_stake.to_string(),
            average_partner_stake: result.average_partner_stake.to_string(),
            total_partner_staker_reward: result.total_partner_staker_reward.to_string(),
            total_validator_commission_share: result.total_validator_commission_share.to_string(),
            total_commission: result.total_commission.to_string(),
            total_commission_formatted: format_amount(result.total_commission),
            validators: result.validators.iter().map(Into::into).collect(),
            epochs: with_epochs.then(|| result.epochs.iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailedPartnerEntry {
    pub partner_id: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct AllPartnersResponse {
    pub start_epoch: u64,
    pub end_epoch: u64,
    pub commission_rate: String,
    pub total_commission: String,
    pub total_commission_formatted: String,
    pub partners: Vec<PartnerCommissionResponse>,
    /// Partners that held no stake in the range
    pub skipped: Vec<String>,
    pub failed: Vec<FailedPartnerEntry>,
}

impl AllPartnersResponse {
    pub fn new(all: &AllPartnersCommission, with_epochs: bool) -> Self {
        let total = all.total_commission();
        Self {
            start_epoch: all.start_epoch,
            end_epoch: all.end_epoch,
            commission_rate: all.commission_rate.to_string(),
            total_commission: total.to_string(),
            total_commission_formatted: format_amount(total),
            partners: all.computed().map(|r| PartnerCommissionResponse::new(r, with_epochs)).collect(),
            skipped: all.skipped().map(str::to_string).collect(),
            failed: all
                .failed()
                .map(|(partner_id, error)| FailedPartnerEntry {
                    partner_id: partner_id.to_string(),
                    error: error.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(1_500_000_000), "1.5");
        assert_eq!(format_amount(30_000), "0.00003");
        assert_eq!(format_amount(u128::MAX), format!("{} native units", u128::MAX));
    }
}
