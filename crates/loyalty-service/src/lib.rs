//! Gophermart 积分核心
//!
//! 负责订单号校验、积分计算系统对账、余额账本与提现协调。
//!
//! # 模块
//!
//! - `luhn`: 订单号 Luhn 校验与生成
//! - `money`: 十进制金额与分之间的换算
//! - `models`: 订单、余额、提现记录
//! - `repository`: 存储接口及 PostgreSQL / 内存实现
//! - `service`: 余额账本、订单上传、提现协调
//! - `accrual`: 积分计算系统客户端与对账 Worker
//! - `health`: 健康检查端点

pub mod accrual;
pub mod error;
pub mod health;
pub mod luhn;
pub mod models;
pub mod money;
pub mod repository;
pub mod service;

pub use error::{LoyaltyError, Result, ValidationError};
