//! 金额换算
//!
//! 系统内部金额一律以 i64 分存储和计算，十进制只出现在边界（积分系统 JSON、提现金额、对外视图）。

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ValidationError;

/// 将十进制金额换算为分，保留两位小数并四舍五入（中点远离零）
///
/// 超出 i64 范围时返回 `None`。
pub fn to_cents(amount: Decimal) -> Option<i64> {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)?
        .to_i64()
}

/// 将用户输入的正金额换算为分
///
/// 舍入后为 0 的金额同样视为非正数。
pub fn decimal_to_cents(amount: Decimal) -> Result<i64, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    let cents = to_cents(amount).ok_or(ValidationError::AmountOutOfRange)?;
    if cents <= 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(cents)
}

/// 将分换算为两位小数的十进制金额
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
