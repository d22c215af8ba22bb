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

//! Staking reward simulation and stake-weighted partner commission.

// Declare modules
pub mod aggregator;
pub mod calculator;
pub mod config;
pub mod error;
pub mod models;
pub mod simulator;
pub mod store;
pub mod units;

// Re-export commonly used types
pub use aggregator::{PartnerStakeByEpoch, StakeAggregator};

pub use calculator::{
    AllPartnersCommission, CommissionCalculator, EpochCommissionDetail, PartnerCommission,
    PartnerCommissionOutcome, ValidatorCommissionSummary,
};

pub use config::{CalculatorConfig, EngineConfig, SimulatorConfig};

pub use error::{RewardsError, StoreError};

pub use models::{
    EpochReward, EpochSummary, Partner, PartnerWallet, SimulationParams, StakeAccount, MAX_BPS,
};

pub use simulator::{DistributionCheck, EpochRewardSimulation, RewardsSimulator, WalletAllocation};

pub use store::{
    EpochRewardReader, EpochRewardReaderObj, EpochSummaryReader, EpochSummaryReaderObj,
    InMemoryStore, PartnerReader, PartnerReaderObj, Snapshot, StakeAccountReader,
    StakeAccountReaderObj,
};

pub use units::{from_display_units, to_display_units, NATIVE_UNITS_PER_DISPLAY_UNIT};
