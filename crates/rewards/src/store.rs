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

//! Read-only data access used by the engine, and an in-memory implementation.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    models::{EpochReward, EpochSummary, Partner, PartnerWallet, StakeAccount},
};

pub type EpochSummaryReaderObj = Arc<dyn EpochSummaryReader + Send + Sync>;
pub type StakeAccountReaderObj = Arc<dyn StakeAccountReader + Send + Sync>;
pub type EpochRewardReaderObj = Arc<dyn EpochRewardReader + Send + Sync>;
pub type PartnerReaderObj = Arc<dyn PartnerReader + Send + Sync>;

#[async_trait]
pub trait EpochSummaryReader {
    /// Get all validator summaries with epoch in [start_epoch, end_epoch], ordered by epoch
    /// then validator
    async fn get_epoch_summaries(
        &self,
        start_epoch: u64,
        end_epoch: u64,
    ) -> Result<Vec<EpochSummary>, StoreError>;
}

#[async_trait]
pub trait StakeAccountReader {
    /// Get stake accounts with epoch in [start_epoch, end_epoch] whose withdrawer wallet is in
    /// `withdrawers`, ordered by epoch
    async fn get_stake_accounts(
        &self,
        start_epoch: u64,
        end_epoch: u64,
        withdrawers: &BTreeSet<String>,
    ) -> Result<Vec<StakeAccount>, StoreError>;
}

#[async_trait]
pub trait EpochRewardReader {
    /// Get the reward rows with epoch in [start_epoch, end_epoch], one per (validator, epoch)
    async fn get_epoch_rewards(
        &self,
        start_epoch: u64,
        end_epoch: u64,
    ) -> Result<Vec<EpochReward>, StoreError>;
}

#[async_trait]
pub trait PartnerReader {
    /// Get a partner by ID
    async fn get_partner(&self, partner_id: &str) -> Result<Option<Partner>, StoreError>;

    /// Get all wallets mapped to a partner, active or not
    async fn get_partner_wallets(&self, partner_id: &str)
        -> Result<Vec<PartnerWallet>, StoreError>;

    /// Get all active partners, ordered by ID
    async fn list_active_partners(&self) -> Result<Vec<Partner>, StoreError>;
}

/// Materialized records the in-memory store is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub partners: Vec<Partner>,
    pub partner_wallets: Vec<PartnerWallet>,
    pub epoch_summaries: Vec<EpochSummary>,
    pub stake_accounts: Vec<StakeAccount>,
    pub epoch_rewards: Vec<EpochReward>,
}

/// Reader implementation over a validated [Snapshot], indexed by epoch.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    partners: BTreeMap<String, Partner>,
    wallets_by_partner: HashMap<String, Vec<PartnerWallet>>,
    summaries_by_epoch: BTreeMap<u64, Vec<EpochSummary>>,
    stake_accounts_by_epoch: BTreeMap<u64, Vec<StakeAccount>>,
    rewards_by_epoch: BTreeMap<u64, Vec<EpochReward>>,
}

impl InMemoryStore {
    /// Validate every record of the snapshot and index it.
    pub fn new(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut store = Self::default();

        for partner in snapshot.partners {
            if store.partners.contains_key(&partner.id) {
                return Err(StoreError::InvalidRecord(format!("duplicate partner {}", partner.id)));
            }
            store.partners.insert(partner.id.clone(), partner);
        }

        let mut wallet_ids = BTreeSet::new();
        for wallet in snapshot.partner_wallets {
            if !store.partners.contains_key(&wallet.partner_id) {
                return Err(StoreError::InvalidRecord(format!(
                    "wallet {} references unknown partner {}",
                    wallet.wallet_id, wallet.partner_id
                )));
            }
            if !wallet_ids.insert(wallet.wallet_id.clone()) {
                return Err(StoreError::InvalidRecord(format!(
                    "wallet {} is mapped more than once",
                    wallet.wallet_id
                )));
            }
            store.wallets_by_partner.entry(wallet.partner_id.clone()).or_default().push(wallet);
        }

        let mut summary_keys = BTreeSet::new();
        for summary in snapshot.epoch_summaries {
            summary.validate()?;
            if !summary_keys.insert((summary.epoch, summary.validator_id.clone())) {
                return Err(StoreError::InvalidRecord(format!(
                    "duplicate summary for validator {} in epoch {}",
                    summary.validator_id, summary.epoch
                )));
            }
            store.summaries_by_epoch.entry(summary.epoch).or_default().push(summary);
        }
        for summaries in store.summaries_by_epoch.values_mut() {
            summaries.sort_by(|a, b| a.validator_id.cmp(&b.validator_id));
        }

        for account in snapshot.stake_accounts {
            account.validate()?;
            store.stake_accounts_by_epoch.entry(account.epoch).or_default().push(account);
        }

        let mut reward_keys = BTreeSet::new();
        for reward in snapshot.epoch_rewards {
            reward.validate()?;
            if !reward_keys.insert((reward.epoch, reward.validator_id.clone())) {
                return Err(StoreError::InvalidRecord(format!(
                    "duplicate reward for validator {} in epoch {}",
                    reward.validator_id, reward.epoch
                )));
            }
            store.rewards_by_epoch.entry(reward.epoch).or_default().push(reward);
        }

        tracing::debug!(
            "Indexed {} partners, {} summary epochs, {} stake epochs, {} reward epochs",
            store.partners.len(),
            store.summaries_by_epoch.len(),
            store.stake_accounts_by_epoch.len(),
            store.rewards_by_epoch.len()
        );
        Ok(store)
    }
}

#[async_trait]
impl EpochSummaryReader for InMemoryStore {
    async fn get_epoch_summaries(
        &self,
        start_epoch: u64,
        end_epoch: u64,
    ) -> Result<Vec<EpochSummary>, StoreError> {
        if start_epoch > end_epoch {
            return Ok(Vec::new());
        }
        Ok(self
            .summaries_by_epoch
            .range(start_epoch..=end_epoch)
            .flat_map(|(_, summaries)| summaries.iter().cloned())
            .collect())
    }
}

#[async_trait]
impl StakeAccountReader for InMemoryStore {
    async fn get_stake_accounts(
        &self,
        start_epoch: u64,
        end_epoch: u64,
        withdrawers: &BTreeSet<String>,
    ) -> Result<Vec<StakeAccount>, StoreError> {
        if start_epoch > end_epoch || withdrawers.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .stake_accounts_by_epoch
            .range(start_epoch..=end_epoch)
            .flat_map(|(_, accounts)| accounts.iter())
            .filter(|account| withdrawers.contains(&account.withdrawer_wallet_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EpochRewardReader for InMemoryStore {
    async fn get_epoch_rewards(
        &self,
        start_epoch: u64,
        end_epoch: u64,
    ) -> Result<Vec<EpochReward>, StoreError> {
        if start_epoch > end_epoch {
            return Ok(Vec::new());
        }
        Ok(self
            .rewards_by_epoch
            .range(start_epoch..=end_epoch)
            .flat_map(|(_, rewards)| rewards.iter().cloned())
            .collect())
    }
}

#[async_trait]
impl PartnerReader for InMemoryStore {
    async fn get_partner(&self, partner_id: &str) -> Result<Option<Partner>, StoreError> {
        Ok(self.partners.get(partner_id).cloned())
    }

    async fn get_partner_wallets(
        &self,
        partner_id: &str,
    ) -> Result<Vec<PartnerWallet>, StoreError> {
        Ok(self.wallets_by_partner.get(partner_id).cloned().unwrap_or_default())
    }

    async fn list_active_partners(&self) -> Result<Vec<Partner>, StoreError> {
        Ok(self.partners.values().filter(|p| p.active).cloned().collect())
    }
}
