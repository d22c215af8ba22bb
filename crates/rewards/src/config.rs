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

//! Engine configuration.
//!
//! Configuration values are constructed explicitly and passed to each component. Nothing here
//! is global, so callers running with different parameters never observe each other.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardsError};

/// Default annual yield (5%)
pub const DEFAULT_ANNUAL_YIELD: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// Default number of epochs per year
pub const DEFAULT_EPOCHS_PER_YEAR: u64 = 73;
/// Default validator commission rate (5%)
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// Default number of partners computed concurrently
pub const DEFAULT_MAX_CONCURRENT_PARTNERS: usize = 8;

/// Parameters of the epoch reward simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Annual yield as a fraction, e.g. 0.05 for 5%
    pub annual_yield: Decimal,
    /// Number of epochs in a year
    pub epochs_per_year: u64,
    /// Share of each epoch reward kept by the validator, in [0, 1]
    pub commission_rate: Decimal,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            annual_yield: DEFAULT_ANNUAL_YIELD,
            epochs_per_year: DEFAULT_EPOCHS_PER_YEAR,
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.annual_yield.is_sign_negative() && !self.annual_yield.is_zero() {
            return Err(RewardsError::InvalidArgument(format!(
                "annual yield must be non-negative, got {}",
                self.annual_yield
            )));
        }
        if self.epochs_per_year == 0 {
            return Err(RewardsError::InvalidArgument(
                "epochs per year must be greater than zero".to_string(),
            ));
        }
        validate_rate("validator commission rate", self.commission_rate)
    }
}

/// Parameters of the commission calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    /// Upper bound on partners computed at once by the all-partners entry point
    pub max_concurrent_partners: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self { max_concurrent_partners: DEFAULT_MAX_CONCURRENT_PARTNERS }
    }
}

impl CalculatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_partners == 0 {
            return Err(RewardsError::InvalidArgument(
                "max_concurrent_partners must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top level configuration file layout.
///
/// ```toml
/// [simulator]
/// annual_yield = "0.05"
/// epochs_per_year = 73
/// commission_rate = "0.05"
///
/// [calculator]
/// max_concurrent_partners = 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub simulator: SimulatorConfig,
    pub calculator: CalculatorConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| RewardsError::InvalidArgument(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RewardsError::InvalidArgument(format!(
                "failed to read config {}: {e}",
                path.display()
            ))
        })?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulator.validate()?;
        self.calculator.validate()
    }
}

/// Check that `rate` is a fraction in [0, 1].
pub(crate) fn validate_rate(name: &str, rate: Decimal) -> Result<()> {
    if (rate.is_sign_negative() && !rate.is_zero()) || rate > Decimal::ONE {
        return Err(RewardsError::InvalidArgument(format!("{name} must be in [0, 1], got {rate}")));
    }
    Ok(())
}
