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

//! Partner stake aggregation over withdrawer wallets.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{Result, RewardsError},
    models::StakeAccount,
    store::StakeAccountReaderObj,
};

/// Partner stake by (epoch, validator_id)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerStakeByEpoch(pub BTreeMap<(u64, String), u128>);

impl PartnerStakeByEpoch {
    /// Stake held with `validator_id` in `epoch`, zero if none
    pub fn get(&self, epoch: u64, validator_id: &str) -> u128 {
        self.0.get(&(epoch, validator_id.to_string())).copied().unwrap_or(0)
    }

    /// Stake summed over all validators in `epoch`
    pub fn epoch_total(&self, epoch: u64) -> u128 {
        self.0
            .range((epoch, String::new())..)
            .take_while(|((e, _), _)| *e == epoch)
            .map(|(_, stake)| *stake)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sums the stake attributed to a partner through its withdrawer wallets.
#[derive(Clone)]
pub struct StakeAggregator {
    reader: StakeAccountReaderObj,
}

impl StakeAggregator {
    pub fn new(reader: StakeAccountReaderObj) -> Self {
        Self { reader }
    }

    /// Total stake, across all validators, of stake accounts in `epoch` whose withdrawer is in
    /// `wallets`.
    pub async fn sum_partner_stake(&self, wallets: &BTreeSet<String>, epoch: u64) -> Result<u128> {
        if wallets.is_empty() {
            return Ok(0);
        }
        let accounts = self.reader.get_stake_accounts(epoch, epoch, wallets).await?;
        sum_stake(accounts.iter().filter(|a| a.epoch == epoch))
    }

    /// Partner stake in [start_epoch, end_epoch] partitioned by epoch and validator, read with
    /// a single range query.
    pub async fn partner_stake_by_validator(
        &self,
        wallets: &BTreeSet<String>,
        start_epoch: u64,
        end_epoch: u64,
    ) -> Result<PartnerStakeByEpoch> {
        if start_epoch > end_epoch {
            return Err(RewardsError::InvalidRange { start_epoch, end_epoch });
        }
        if wallets.is_empty() {
            return Ok(PartnerStakeByEpoch::default());
        }

        let accounts = self.reader.get_stake_accounts(start_epoch, end_epoch, wallets).await?;
        tracing::debug!(
            "Loaded {} stake accounts for {} wallets in epochs {}-{}",
            accounts.len(),
            wallets.len(),
            start_epoch,
            end_epoch
        );

        let mut by_epoch: BTreeMap<(u64, String), u128> = BTreeMap::new();
        for account in accounts {
            // Readers are trusted to filter, but a stray row must not be attributed
            if account.epoch < start_epoch
                || account.epoch > end_epoch
                || !wallets.contains(&account.withdrawer_wallet_id)
            {
                continue;
            }
            let entry = by_epoch.entry((account.epoch, account.validator_id)).or_insert(0);
            *entry = entry
                .checked_add(account.stake_amount)
                .ok_or(RewardsError::Overflow("partner stake"))?;
        }
        Ok(PartnerStakeByEpoch(by_epoch))
    }
}

fn sum_stake<'a>(accounts: impl Iterator<Item = &'a StakeAccount>) -> Result<u128> {
    accounts
        .map(|a| a.stake_amount)
        .try_fold(0u128, |acc, v| acc.checked_add(v))
        .ok_or(RewardsError::Overflow("partner stake"))
}
