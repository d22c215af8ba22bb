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

use thiserror::Error;

/// Errors raised by the data readers backing the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Errors raised by the simulator, the aggregator and the commission calculator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("start epoch {start_epoch} is after end epoch {end_epoch}")]
    InvalidRange { start_epoch: u64, end_epoch: u64 },

    #[error(
        "epoch range {start_epoch}-{end_epoch} is not continuous: missing epochs {missing}; available epochs: {available}"
    )]
    DiscontinuousRange { start_epoch: u64, end_epoch: u64, missing: String, available: String },

    #[error("partner {0} not found")]
    PartnerNotFound(String),

    #[error("epoch reward not found for validator {validator_id} in epoch {epoch}")]
    EpochRewardNotFound { validator_id: String, epoch: u64 },

    #[error(
        "partner stake {partner_stake} exceeds total active stake {total_active_stake} of validator {validator_id} in epoch {epoch}"
    )]
    StakeExceedsTotal {
        validator_id: String,
        epoch: u64,
        partner_stake: u128,
        total_active_stake: u128,
    },

    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl RewardsError {
    /// Whether the error points at inconsistent upstream data rather than a bad request.
    pub fn is_data_consistency(&self) -> bool {
        matches!(
            self,
            Self::DiscontinuousRange { .. }
                | Self::EpochRewardNotFound { .. }
                | Self::StakeExceedsTotal { .. }
                | Self::Store(StoreError::InvalidRecord(_))
        )
    }
}

pub type Result<T, E = RewardsError> = std::result::Result<T, E>;
