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

#![allow(dead_code)]

use std::sync::Arc;

use partner_rewards::{
    CalculatorConfig, CommissionCalculator, EpochReward, EpochSummary, InMemoryStore, Partner,
    PartnerWallet, Snapshot, StakeAccount,
};

pub const VALIDATOR: &str = "val-1";

pub fn partner(id: &str, active: bool) -> Partner {
    Partner { id: id.into(), name: format!("Partner {id}"), active }
}

pub fn wallet(wallet_id: &str, partner_id: &str, active: bool) -> PartnerWallet {
    PartnerWallet {
        wallet_id: wallet_id.into(),
        partner_id: partner_id.into(),
        chain_id: "mainnet".into(),
        address: format!("addr-{wallet_id}"),
        active,
    }
}

pub fn summary(validator_id: &str, epoch: u64, total_active_stake: u128) -> EpochSummary {
    EpochSummary { validator_id: validator_id.into(), epoch, commission_bps: 500, total_active_stake }
}

pub fn stake(epoch: u64, validator_id: &str, withdrawer: &str, amount: u128) -> StakeAccount {
    StakeAccount {
        epoch,
        validator_id: validator_id.into(),
        withdrawer_wallet_id: withdrawer.into(),
        staker_wallet_id: format!("staker-{withdrawer}"),
        stake_amount: amount,
        activation_epoch: 0,
        deactivation_epoch: None,
    }
}

pub fn reward(validator_id: &str, epoch: u64, commission: u128, staker: u128) -> EpochReward {
    EpochReward {
        epoch,
        validator_id: validator_id.into(),
        total_reward: commission + staker,
        validator_commission: commission,
        staker_reward: staker,
        active_stake: 1_000,
        simulation_params: None,
        simulated_at: None,
    }
}

/// One validator with 1000 active stake in epochs 800-802 and a 500_000 commission pool per
/// epoch.
///
/// * p1 holds 600 in 800 and 500 in 801 through two active wallets. A third, inactive wallet
///   holds 100 in 800.
/// * p2 has no wallets.
/// * p3 holds 400 in 800.
/// * p9 is inactive.
pub fn snapshot() -> Snapshot {
    let mut snapshot = Snapshot {
        partners: vec![
            partner("p1", true),
            partner("p2", true),
            partner("p3", true),
            partner("p9", false),
        ],
        partner_wallets: vec![
            wallet("w1", "p1", true),
            wallet("w2", "p1", true),
            wallet("w3", "p1", false),
            wallet("w4", "p3", true),
            wallet("w9", "p9", true),
        ],
        stake_accounts: vec![
            stake(800, VALIDATOR, "w1", 400),
            stake(800, VALIDATOR, "w2", 200),
            stake(800, VALIDATOR, "w3", 100),
            stake(800, VALIDATOR, "w4", 400),
            stake(801, VALIDATOR, "w1", 500),
            // staker wallet of the partner, withdrawer outside it
            StakeAccount {
                staker_wallet_id: "w1".into(),
                ..stake(801, VALIDATOR, "outsider", 300)
            },
        ],
        ..Default::default()
    };
    for epoch in 800..=802 {
        snapshot.epoch_summaries.push(summary(VALIDATOR, epoch, 1_000));
        snapshot.epoch_rewards.push(reward(VALIDATOR, epoch, 500_000, 9_500_000));
    }
    snapshot
}

pub fn store(snapshot: Snapshot) -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new(snapshot).expect("valid snapshot"))
}

pub fn calculator(snapshot: Snapshot) -> CommissionCalculator {
    CommissionCalculator::from_store(store(snapshot), CalculatorConfig::default())
        .expect("valid config")
}
