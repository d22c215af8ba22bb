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

//! Stake-weighted partner commission over a range of epochs.
//!
//! A partner's commission in an epoch comes out of the validator's commission pool: the pool
//! is first scaled by the partner's share of the validator's active stake and then by the
//! partner's negotiated commission rate. Staker rewards are reported for information only.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use futures_util::{stream, StreamExt};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Serialize;

use crate::{
    aggregator::StakeAggregator,
    config::{validate_rate, CalculatorConfig},
    error::{Result, RewardsError},
    models::{EpochReward, EpochSummary},
    simulator::{mul_div_floor, mul_floor},
    store::{
        EpochRewardReader, EpochRewardReaderObj, EpochSummaryReader, EpochSummaryReaderObj,
        PartnerReader, PartnerReaderObj, StakeAccountReader, StakeAccountReaderObj,
    },
};

/// Missing epochs listed in a discontinuity error before eliding the rest
const MAX_LISTED_GAPS: usize = 10;

/// Partner figures for one validator in one epoch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpochCommissionDetail {
    pub epoch: u64,
    pub validator_id: String,
    pub total_active_stake: u128,
    pub partner_stake: u128,
    /// Partner stake divided by the validator's total active stake, rounded to decimal
    /// precision and not used in the amounts below
    pub stake_percentage: Decimal,
    pub total_reward: u128,
    pub validator_commission: u128,
    pub staker_reward: u128,
    /// Informational, not part of the commission
    pub partner_staker_reward: u128,
    pub validator_commission_share: u128,
    pub partner_commission: u128,
}

/// Partner figures for one validator across the range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorCommissionSummary {
    pub validator_id: String,
    /// Epochs of the range in which the validator reported a summary
    pub epochs: u64,
    pub total_stake: u128,
    pub average_stake: u128,
    pub total_validator_commission_share: u128,
    pub total_commission: u128,
    pub average_commission: u128,
}

/// Commission of one partner over [start_epoch, end_epoch]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerCommission {
    pub partner_id: String,
    pub partner_name: String,
    pub wallet_count: usize,
    /// Validators with which the partner held stake in at least one epoch
    pub validator_count: usize,
    pub start_epoch: u64,
    pub end_epoch: u64,
    pub epoch_count: u64,
    pub commission_rate: Decimal,
    /// Partner stake summed over every (epoch, validator)
    pub total_partner_stake: u128,
    pub average_partner_stake: u128,
    pub total_partner_staker_reward: u128,
    pub total_validator_commission_share: u128,
    pub total_commission: u128,
    pub validators: Vec<ValidatorCommissionSummary>,
    pub epochs: Vec<EpochCommissionDetail>,
}

/// Result of the all-partners computation for a single partner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartnerCommissionOutcome {
    /// The partner held stake in the range
    Computed(PartnerCommission),
    /// The computation succeeded but the partner held no stake
    NoStake { partner_id: String },
    /// The computation failed for this partner
    Failed { partner_id: String, error: RewardsError },
}

impl PartnerCommissionOutcome {
    pub fn partner_id(&self) -> &str {
        match self {
            Self::Computed(result) => &result.partner_id,
            Self::NoStake { partner_id } | Self::Failed { partner_id, .. } => partner_id,
        }
    }
}

/// Outcomes of the all-partners computation, in partner order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllPartnersCommission {
    pub start_epoch: u64,
    pub end_epoch: u64,
    pub commission_rate: Decimal,
    pub outcomes: Vec<PartnerCommissionOutcome>,
}

impl AllPartnersCommission {
    /// Partners with positive stake
    pub fn computed(&self) -> impl Iterator<Item = &PartnerCommission> {
        self.outcomes.iter().filter_map(|o| match o {
            PartnerCommissionOutcome::Computed(result) => Some(result),
            _ => None,
        })
    }

    /// Partners that held no stake in the range
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            PartnerCommissionOutcome::NoStake { partner_id } => Some(partner_id.as_str()),
            _ => None,
        })
    }

    /// Partners whose computation failed, with the reason
    pub fn failed(&self) -> impl Iterator<Item = (&str, &RewardsError)> {
        self.outcomes.iter().filter_map(|o| match o {
            PartnerCommissionOutcome::Failed { partner_id, error } => {
                Some((partner_id.as_str(), error))
            }
            _ => None,
        })
    }

    /// Sum of the commission of every computed partner
    pub fn total_commission(&self) -> u128 {
        self.computed().map(|r| r.total_commission).sum()
    }
}

#[derive(Default)]
struct ValidatorTotals {
    epochs: u64,
    total_stake: u128,
    total_validator_commission_share: u128,
    total_commission: u128,
}

/// Attributes validator commission to partners. Holds no state between calls.
#[derive(Clone)]
pub struct CommissionCalculator {
    summaries: EpochSummaryReaderObj,
    rewards: EpochRewardReaderObj,
    partners: PartnerReaderObj,
    aggregator: StakeAggregator,
    config: CalculatorConfig,
}

impl CommissionCalculator {
    pub fn new(
        summaries: EpochSummaryReaderObj,
        stakes: StakeAccountReaderObj,
        rewards: EpochRewardReaderObj,
        partners: PartnerReaderObj,
        config: CalculatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { summaries, rewards, partners, aggregator: StakeAggregator::new(stakes), config })
    }

    /// Build a calculator reading everything from one store.
    pub fn from_store<S>(store: Arc<S>, config: CalculatorConfig) -> Result<Self>
    where
        S: EpochSummaryReader
            + StakeAccountReader
            + EpochRewardReader
            + PartnerReader
            + Send
            + Sync
            + 'static,
    {
        Self::new(store.clone(), store.clone(), store.clone(), store, config)
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Compute the commission owed to `partner_id` for every epoch in [start_epoch, end_epoch].
    ///
    /// Fails if the range is inverted, the partner is unknown, any epoch of the range has no
    /// summary, or a summary has no matching reward row.
    ///
    /// `commission_rate` must lie in [0, 1]: the partner is paid out of its share of the
    /// validator commission, never more than that share.
    pub async fn calculate_partner_commission(
        &self,
        partner_id: &str,
        start_epoch: u64,
        end_epoch: u64,
        commission_rate: Decimal,
    ) -> Result<PartnerCommission> {
        check_range(start_epoch, end_epoch)?;
        validate_rate("partner commission rate", commission_rate)?;

        let partner = self
            .partners
            .get_partner(partner_id)
            .await?
            .ok_or_else(|| RewardsError::PartnerNotFound(partner_id.to_string()))?;

        let summaries = self.summaries.get_epoch_summaries(start_epoch, end_epoch).await?;
        check_continuity(start_epoch, end_epoch, &summaries)?;

        let wallets: BTreeSet<String> = self
            .partners
            .get_partner_wallets(partner_id)
            .await?
            .into_iter()
            .filter(|w| w.active)
            .map(|w| w.wallet_id)
            .collect();

        let stakes =
            self.aggregator.partner_stake_by_validator(&wallets, start_epoch, end_epoch).await?;

        let rewards: HashMap<(u64, String), EpochReward> = self
            .rewards
            .get_epoch_rewards(start_epoch, end_epoch)
            .await?
            .into_iter()
            .map(|r| ((r.epoch, r.validator_id.clone()), r))
            .collect();

        tracing::debug!(
            "Computing commission for partner {} over epochs {}-{}: {} wallets, {} summaries, {} reward rows",
            partner_id,
            start_epoch,
            end_epoch,
            wallets.len(),
            summaries.len(),
            rewards.len()
        );

        let mut epochs = Vec::with_capacity(summaries.len());
        let mut totals_by_validator: BTreeMap<String, ValidatorTotals> = BTreeMap::new();
        let mut total_partner_stake = 0u128;
        let mut total_partner_staker_reward = 0u128;
        let mut total_validator_commission_share = 0u128;
        let mut total_commission = 0u128;

        for summary in &summaries {
            let partner_stake = stakes.get(summary.epoch, &summary.validator_id);
            let reward = rewards
                .get(&(summary.epoch, summary.validator_id.clone()))
                .ok_or_else(|| RewardsError::EpochRewardNotFound {
                    validator_id: summary.validator_id.clone(),
                    epoch: summary.epoch,
                })?;

            let detail = compute_epoch_detail(summary, reward, partner_stake, commission_rate)?;

            total_partner_stake = add(total_partner_stake, detail.partner_stake)?;
            total_partner_staker_reward =
                add(total_partner_staker_reward, detail.partner_staker_reward)?;
            total_validator_commission_share =
                add(total_validator_commission_share, detail.validator_commission_share)?;
            total_commission = add(total_commission, detail.partner_commission)?;

            let totals = totals_by_validator.entry(summary.validator_id.clone()).or_default();
            totals.epochs += 1;
            totals.total_stake = add(totals.total_stake, detail.partner_stake)?;
            totals.total_validator_commission_share =
                add(totals.total_validator_commission_share, detail.validator_commission_share)?;
            totals.total_commission = add(totals.total_commission, detail.partner_commission)?;

            epochs.push(detail);
        }

        let validators: Vec<ValidatorCommissionSummary> = totals_by_validator
            .into_iter()
            .filter(|(_, totals)| totals.total_stake > 0)
            .map(|(validator_id, totals)| ValidatorCommissionSummary {
                validator_id,
                epochs: totals.epochs,
                total_stake: totals.total_stake,
                average_stake: totals.total_stake / u128::from(totals.epochs),
                total_validator_commission_share: totals.total_validator_commission_share,
                total_commission: totals.total_commission,
                average_commission: totals.total_commission / u128::from(totals.epochs),
            })
            .collect();

        let epoch_count = end_epoch - start_epoch + 1;
        let result = PartnerCommission {
            partner_id: partner.id,
            partner_name: partner.name,
            wallet_count: wallets.len(),
            validator_count: validators.len(),
            start_epoch,
            end_epoch,
            epoch_count,
            commission_rate,
            total_partner_stake,
            average_partner_stake: total_partner_stake / u128::from(epoch_count),
            total_partner_staker_reward,
            total_validator_commission_share,
            total_commission,
            validators,
            epochs,
        };

        tracing::info!(
            "Partner {} commission over epochs {}-{}: stake={} commission={} validators={}",
            result.partner_id,
            start_epoch,
            end_epoch,
            result.total_partner_stake,
            result.total_commission,
            result.validator_count
        );
        Ok(result)
    }

    /// Compute the commission of every active partner over [start_epoch, end_epoch].
    ///
    /// Partners are computed concurrently, up to `max_concurrent_partners` at a time, and
    /// reported in listing order. A failure for one partner is recorded in its outcome and does
    /// not fail the batch.
    pub async fn calculate_all_partners_commission(
        &self,
        start_epoch: u64,
        end_epoch: u64,
        commission_rate: Decimal,
    ) -> Result<AllPartnersCommission> {
        check_range(start_epoch, end_epoch)?;
        validate_rate("partner commission rate", commission_rate)?;

        let partners = self.partners.list_active_partners().await?;
        tracing::info!(
            "Computing commission for {} active partners over epochs {}-{}",
            partners.len(),
            start_epoch,
            end_epoch
        );

        let this = self;
        let outcomes: Vec<PartnerCommissionOutcome> = stream::iter(partners)
            .map(|partner| async move {
                match this
                    .calculate_partner_commission(&partner.id, start_epoch, end_epoch, commission_rate)
                    .await
                {
                    Ok(result) if result.total_partner_stake > 0 => {
                        PartnerCommissionOutcome::Computed(result)
                    }
                    Ok(_) => {
                        tracing::debug!("Partner {} held no stake, skipping", partner.id);
                        PartnerCommissionOutcome::NoStake { partner_id: partner.id }
                    }
                    Err(error) => {
                        tracing::warn!(
                            "Commission computation failed for partner {}: {}",
                            partner.id,
                            error
                        );
                        PartnerCommissionOutcome::Failed { partner_id: partner.id, error }
                    }
                }
            })
            .buffered(self.config.max_concurrent_partners)
            .collect()
            .await;

        let result =
            AllPartnersCommission { start_epoch, end_epoch, commission_rate, outcomes };
        tracing::info!(
            "All partners over epochs {}-{}: {} computed, {} without stake, {} failed",
            start_epoch,
            end_epoch,
            result.computed().count(),
            result.skipped().count(),
            result.failed().count()
        );
        Ok(result)
    }
}

fn compute_epoch_detail(
    summary: &EpochSummary,
    reward: &EpochReward,
    partner_stake: u128,
    commission_rate: Decimal,
) -> Result<EpochCommissionDetail> {
    if partner_stake > summary.total_active_stake {
        return Err(RewardsError::StakeExceedsTotal {
            validator_id: summary.validator_id.clone(),
            epoch: summary.epoch,
            partner_stake,
            total_active_stake: summary.total_active_stake,
        });
    }

    let stake_percentage = if summary.total_active_stake == 0 {
        Decimal::ZERO
    } else {
        Decimal::from_u128(partner_stake)
            .zip(Decimal::from_u128(summary.total_active_stake))
            .and_then(|(partner, total)| partner.checked_div(total))
            .ok_or(RewardsError::Overflow("stake percentage"))?
    };

    // Shares use the exact stake ratio, the rounded percentage is only reported
    let (partner_staker_reward, validator_commission_share) = if summary.total_active_stake == 0 {
        (0, 0)
    } else {
        (
            mul_div_floor(reward.staker_reward, partner_stake, summary.total_active_stake)?,
            mul_div_floor(reward.validator_commission, partner_stake, summary.total_active_stake)?,
        )
    };
    let partner_commission = mul_floor(validator_commission_share, commission_rate)?;

    Ok(EpochCommissionDetail {
        epoch: summary.epoch,
        validator_id: summary.validator_id.clone(),
        total_active_stake: summary.total_active_stake,
        partner_stake,
        stake_percentage,
        total_reward: reward.total_reward,
        validator_commission: reward.validator_commission,
        staker_reward: reward.staker_reward,
        partner_staker_reward,
        validator_commission_share,
        partner_commission,
    })
}

fn check_range(start_epoch: u64, end_epoch: u64) -> Result<()> {
    if start_epoch > end_epoch {
        return Err(RewardsError::InvalidRange { start_epoch, end_epoch });
    }
    Ok(())
}

/// The summaries must cover every epoch of [start_epoch, end_epoch].
fn check_continuity(start_epoch: u64, end_epoch: u64, summaries: &[EpochSummary]) -> Result<()> {
    let present: BTreeSet<u64> = summaries
        .iter()
        .map(|s| s.epoch)
        .filter(|e| (start_epoch..=end_epoch).contains(e))
        .collect();

    let gaps = missing_ranges(start_epoch, end_epoch, &present);
    if gaps.is_empty() {
        return Ok(());
    }

    let available = epoch_ranges(&present);
    let mut missing = format_ranges(gaps.iter().take(MAX_LISTED_GAPS));
    if gaps.len() > MAX_LISTED_GAPS {
        missing.push_str(&format!(" and {} more gaps", gaps.len() - MAX_LISTED_GAPS));
    }
    Err(RewardsError::DiscontinuousRange {
        start_epoch,
        end_epoch,
        missing,
        available: if available.is_empty() {
            "none".to_string()
        } else {
            format_ranges(available.iter())
        },
    })
}

/// Inclusive ranges of [start, end] absent from `present`.
fn missing_ranges(start: u64, end: u64, present: &BTreeSet<u64>) -> Vec<(u64, u64)> {
    let mut gaps = Vec::new();
    let mut cursor = Some(start);
    for &epoch in present.range(start..=end) {
        if let Some(next) = cursor {
            if epoch > next {
                gaps.push((next, epoch - 1));
            }
        }
        cursor = epoch.checked_add(1);
    }
    if let Some(next) = cursor {
        if next <= end {
            gaps.push((next, end));
        }
    }
    gaps
}

/// Collapse sorted epochs into inclusive ranges.
fn epoch_ranges(epochs: &BTreeSet<u64>) -> Vec<(u64, u64)> {
    let mut ranges: Vec<(u64, u64)> = Vec::new();
    for &epoch in epochs {
        match ranges.last_mut() {
            Some((_, last)) if last.checked_add(1) == Some(epoch) => *last = epoch,
            _ => ranges.push((epoch, epoch)),
        }
    }
    ranges
}

fn format_ranges<'a>(ranges: impl Iterator<Item = &'a (u64, u64)>) -> String {
    ranges
        .map(|(a, b)| if a == b { a.to_string() } else { format!("{a}-{b}") })
        .collect::<Vec<_>>()
        .join(", ")
}

fn add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(RewardsError::Overflow("commission totals"))
}
