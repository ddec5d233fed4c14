//! 业务服务层
//!
//! - `ledger`: 余额账本（入账、条件扣减、撤销扣减、懒创建）
//! - `order_service`: 订单上传与查询
//! - `withdrawal_service`: 提现协调与补偿
//! - `dto`: 十进制金额的对外视图

pub mod dto;
mod ledger;
mod order_service;
mod withdrawal_service;

pub use ledger::BalanceLedger;
pub use order_service::{OrderService, SubmitOutcome};
pub use withdrawal_service::WithdrawalCoordinator;
