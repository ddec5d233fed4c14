//! 存储层
//!
//! 提供订单、余额、提现记录的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 存储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 运行时查询访问 PostgreSQL
//! - 跨表原子操作（订单结算）由 `SettlementStore` 在单个事务内完成
//! - 定义 trait 接口以支持内存实现与 mock 测试

mod balance_repo;
mod error;
mod memory;
mod order_repo;
mod settlement_repo;
mod traits;
mod withdrawal_repo;

pub use balance_repo::BalanceRepository;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use order_repo::OrderRepository;
pub use settlement_repo::SettlementRepository;
pub use traits::*;
pub use withdrawal_repo::WithdrawalRepository;
