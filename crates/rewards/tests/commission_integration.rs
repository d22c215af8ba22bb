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

mod common;

use common::{calculator, reward, snapshot, stake, summary, wallet, VALIDATOR};
use partner_rewards::{PartnerCommissionOutcome, RewardsError};
use rust_decimal::Decimal;

fn rate(tenths: i64) -> Decimal {
    Decimal::new(tenths, 1)
}

#[tokio::test]
async fn test_single_epoch_commission() {
    let calc = calculator(snapshot());
    let result = calc.calculate_partner_commission("p1", 800, 800, rate(1)).await.unwrap();

    assert_eq!(result.partner_id, "p1");
    assert_eq!(result.partner_name, "Partner p1");
    // The inactive wallet is not counted
    assert_eq!(result.wallet_count, 2);
    assert_eq!(result.validator_count, 1);
    assert_eq!(result.epoch_count, 1);
    assert_eq!(result.total_partner_stake, 600);
    assert_eq!(result.total_validator_commission_share, 300_000);
    assert_eq!(result.total_commission, 30_000);
    assert_eq!(result.total_partner_staker_reward, 5_700_000);

    let detail = &result.epochs[0];
    assert_eq!(detail.epoch, 800);
    assert_eq!(detail.validator_id, VALIDATOR);
    assert_eq!(detail.stake_percentage, rate(6));
    assert_eq!(detail.total_active_stake, 1_000);
    assert_eq!(detail.validator_commission, 500_000);
}

#[tokio::test]
async fn test_multi_epoch_totals_and_averages() {
    let calc = calculator(snapshot());
    let result = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap();

    assert_eq!(result.epoch_count, 3);
    assert_eq!(result.epochs.len(), 3);
    let commissions: Vec<u128> = result.epochs.iter().map(|d| d.partner_commission).collect();
    // 801 has a 300 stake whose staker wallet is the partner's, which does not count
    assert_eq!(commissions, vec![30_000, 25_000, 0]);

    assert_eq!(result.total_partner_stake, 1_100);
    assert_eq!(result.average_partner_stake, 366);
    assert_eq!(result.total_validator_commission_share, 550_000);
    assert_eq!(result.total_commission, 55_000);
    assert_eq!(result.total_partner_staker_reward, 10_450_000);

    assert_eq!(result.validators.len(), 1);
    let validator = &result.validators[0];
    assert_eq!(validator.validator_id, VALIDATOR);
    assert_eq!(validator.epochs, 3);
    assert_eq!(validator.total_stake, 1_100);
    assert_eq!(validator.average_stake, 366);
    assert_eq!(validator.total_commission, 55_000);
    assert_eq!(validator.average_commission, 18_333);
}

#[tokio::test]
async fn test_partner_without_wallets_earns_nothing() {
    let calc = calculator(snapshot());
    let result = calc.calculate_partner_commission("p2", 800, 802, rate(1)).await.unwrap();

    assert_eq!(result.wallet_count, 0);
    assert_eq!(result.validator_count, 0);
    assert_eq!(result.total_partner_stake, 0);
    assert_eq!(result.total_commission, 0);
    assert!(result.validators.is_empty());
    assert_eq!(result.epochs.len(), 3);
    assert!(result.epochs.iter().all(|d| d.partner_commission == 0));
}

#[tokio::test]
async fn test_range_beyond_available_data() {
    let mut data = snapshot();
    data.epoch_summaries.clear();
    data.epoch_rewards.clear();
    for epoch in 800..=860 {
        data.epoch_summaries.push(summary(VALIDATOR, epoch, 1_000));
        data.epoch_rewards.push(reward(VALIDATOR, epoch, 500_000, 9_500_000));
    }
    let calc = calculator(data);

    let err = calc.calculate_partner_commission("p1", 800, 900, rate(1)).await.unwrap_err();
    match &err {
        RewardsError::DiscontinuousRange { start_epoch, end_epoch, missing, available } => {
            assert_eq!((*start_epoch, *end_epoch), (800, 900));
            assert_eq!(missing, "861-900");
            assert_eq!(available, "800-860");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_data_consistency());

    let ok = calc.calculate_partner_commission("p1", 800, 860, rate(1)).await.unwrap();
    assert_eq!(ok.epoch_count, 61);
}

#[tokio::test]
async fn test_gap_inside_range() {
    let mut data = snapshot();
    data.epoch_summaries.retain(|s| s.epoch != 801);
    let calc = calculator(data);

    let err = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap_err();
    let RewardsError::DiscontinuousRange { missing, available, .. } = err else {
        panic!("expected discontinuity, got {err:?}");
    };
    assert_eq!(missing, "801");
    assert_eq!(available, "800, 802");
}

#[tokio::test]
async fn test_inverted_range_is_checked_first() {
    let calc = calculator(snapshot());
    let err = calc.calculate_partner_commission("unknown", 900, 800, rate(1)).await.unwrap_err();
    assert_eq!(err, RewardsError::InvalidRange { start_epoch: 900, end_epoch: 800 });

    let err = calc.calculate_all_partners_commission(900, 800, rate(1)).await.unwrap_err();
    assert_eq!(err, RewardsError::InvalidRange { start_epoch: 900, end_epoch: 800 });
}

#[tokio::test]
async fn test_unknown_partner() {
    let calc = calculator(snapshot());
    let err = calc.calculate_partner_commission("nobody", 800, 802, rate(1)).await.unwrap_err();
    assert_eq!(err, RewardsError::PartnerNotFound("nobody".into()));
}

#[tokio::test]
async fn test_invalid_commission_rate() {
    let calc = calculator(snapshot());
    for bad in [Decimal::new(-1, 1), Decimal::new(11, 1)] {
        let err = calc.calculate_partner_commission("p1", 800, 800, bad).await.unwrap_err();
        assert!(matches!(err, RewardsError::InvalidArgument(_)), "{bad}: {err:?}");
    }
}

#[tokio::test]
async fn test_missing_reward_row() {
    let mut data = snapshot();
    data.epoch_rewards.retain(|r| r.epoch != 801);
    let calc = calculator(data);

    let err = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap_err();
    assert_eq!(
        err,
        RewardsError::EpochRewardNotFound { validator_id: VALIDATOR.into(), epoch: 801 }
    );
}

#[tokio::test]
async fn test_proportional_to_stake() {
    let calc = calculator(snapshot());
    let p1 = calc.calculate_partner_commission("p1", 800, 800, rate(1)).await.unwrap();
    let p3 = calc.calculate_partner_commission("p3", 800, 800, rate(1)).await.unwrap();

    assert_eq!(p1.total_partner_stake, 600);
    assert_eq!(p3.total_partner_stake, 400);
    assert_eq!(p1.total_commission * 2, p3.total_commission * 3);
}

#[tokio::test]
async fn test_linear_in_commission_rate() {
    let calc = calculator(snapshot());
    let single = calc.calculate_partner_commission("p1", 800, 800, rate(1)).await.unwrap();
    let double = calc.calculate_partner_commission("p1", 800, 800, rate(2)).await.unwrap();
    let zero = calc.calculate_partner_commission("p1", 800, 800, Decimal::ZERO).await.unwrap();

    assert_eq!(single.total_commission, 30_000);
    assert_eq!(double.total_commission, 60_000);
    assert_eq!(zero.total_commission, 0);
    // The share of the validator pool does not depend on the rate
    assert_eq!(single.total_validator_commission_share, double.total_validator_commission_share);
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let calc = calculator(snapshot());
    let first = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap();
    let second = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_multiple_validators() {
    let mut data = snapshot();
    for epoch in 800..=802 {
        data.epoch_summaries.push(summary("val-2", epoch, 2_000));
        data.epoch_rewards.push(reward("val-2", epoch, 1_000_000, 19_000_000));
    }
    data.stake_accounts.push(stake(800, "val-2", "w1", 1_000));
    let calc = calculator(data);

    let result = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap();
    assert_eq!(result.validator_count, 2);
    assert_eq!(result.epochs.len(), 6);

    let order: Vec<(u64, &str)> =
        result.epochs.iter().map(|d| (d.epoch, d.validator_id.as_str())).collect();
    assert_eq!(
        order,
        vec![
            (800, "val-1"),
            (800, "val-2"),
            (801, "val-1"),
            (801, "val-2"),
            (802, "val-1"),
            (802, "val-2"),
        ]
    );

    assert_eq!(result.epochs[1].validator_commission_share, 500_000);
    assert_eq!(result.epochs[1].partner_commission, 50_000);
    assert_eq!(result.total_commission, 105_000);

    let val2 = result.validators.iter().find(|v| v.validator_id == "val-2").unwrap();
    assert_eq!(val2.epochs, 3);
    assert_eq!(val2.total_commission, 50_000);
    assert_eq!(val2.average_commission, 16_666);
}

#[tokio::test]
async fn test_partner_stake_beyond_validator_total() {
    let mut data = snapshot();
    data.stake_accounts.push(stake(802, VALIDATOR, "w1", 1_001));
    let calc = calculator(data);

    let err = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap_err();
    assert_eq!(
        err,
        RewardsError::StakeExceedsTotal {
            validator_id: VALIDATOR.into(),
            epoch: 802,
            partner_stake: 1_001,
            total_active_stake: 1_000,
        }
    );
}

#[tokio::test]
async fn test_all_partners_outcomes() {
    let mut data = snapshot();
    data.partners.push(common::partner("p4", true));
    data.partner_wallets.push(wallet("w5", "p4", true));
    data.stake_accounts.push(stake(800, VALIDATOR, "w5", 5_000));
    let calc = calculator(data);

    let all = calc.calculate_all_partners_commission(800, 802, rate(1)).await.unwrap();
    let ids: Vec<&str> = all.outcomes.iter().map(|o| o.partner_id()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4"]);

    let computed: Vec<(&str, u128)> =
        all.computed().map(|r| (r.partner_id.as_str(), r.total_commission)).collect();
    assert_eq!(computed, vec![("p1", 55_000), ("p3", 20_000)]);
    assert_eq!(all.skipped().collect::<Vec<_>>(), vec!["p2"]);

    let failed: Vec<_> = all.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "p4");
    assert!(matches!(failed[0].1, RewardsError::StakeExceedsTotal { .. }));
    assert_eq!(all.total_commission(), 75_000);

    // Each computed outcome equals the single-partner result
    let single = calc.calculate_partner_commission("p1", 800, 802, rate(1)).await.unwrap();
    assert_eq!(all.outcomes[0], PartnerCommissionOutcome::Computed(single));
}

#[tokio::test]
async fn test_all_partners_with_serial_limit() {
    let store = common::store(snapshot());
    let config = partner_rewards::CalculatorConfig { max_concurrent_partners: 1 };
    let serial = partner_rewards::CommissionCalculator::from_store(store, config).unwrap();
    let parallel = calculator(snapshot());

    let a = serial.calculate_all_partners_commission(800, 802, rate(1)).await.unwrap();
    let b = parallel.calculate_all_partners_commission(800, 802, rate(1)).await.unwrap();
    assert_eq!(a, b);
}
