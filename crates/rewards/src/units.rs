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

//! Conversion between the smallest native unit and the display unit.

use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};

use crate::error::{Result, RewardsError};

/// Native units in one display unit (9 decimals)
pub const NATIVE_UNITS_PER_DISPLAY_UNIT: u64 = 1_000_000_000;
/// Number of decimals of the display unit
pub const DISPLAY_DECIMALS: u32 = 9;

/// Convert a native amount to display units, e.g. `1_500_000_000` to `1.5`.
pub fn to_display_units(amount: u128) -> Result<Decimal> {
    let mut value = Decimal::from_u128(amount)
        .ok_or(RewardsError::Overflow("native amount exceeds decimal range"))?;
    value.set_scale(DISPLAY_DECIMALS).map_err(|_| RewardsError::Overflow("display scale"))?;
    Ok(value.normalize())
}

/// Convert a display amount to native units.
///
/// Digits below one native unit are truncated. Exact multiples of one native unit round-trip
/// through [to_display_units] unchanged.
pub fn from_display_units(amount: Decimal) -> Result<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(RewardsError::InvalidArgument(format!(
            "display amount must be non-negative, got {amount}"
        )));
    }
    amount
        .checked_mul(Decimal::from(NATIVE_UNITS_PER_DISPLAY_UNIT))
        .ok_or(RewardsError::Overflow("display amount exceeds decimal range"))?
        .trunc()
        .to_u128()
        .ok_or(RewardsError::Overflow("display amount exceeds native range"))
}
