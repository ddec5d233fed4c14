//! 领域模型

mod balance;
mod enums;
mod order;
mod withdrawal;

pub use balance::{Balance, DebitOutcome};
pub use enums::OrderStatus;
pub use order::Order;
pub use withdrawal::{NewWithdrawal, Withdrawal};
