//! 订单号工具
//!
//! 校验订单号或为给定前缀补全 Luhn 校验位，便于手工联调。
//!
//! ```bash
//! luhn-generator validate 79927398713
//! luhn-generator generate 7992739871
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use loyalty::luhn::{generate_valid_luhn, validate_order_number};

#[derive(Parser, Debug)]
#[command(name = "luhn-generator")]
#[command(version, about = "订单号 Luhn 校验工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 校验订单号
    Validate {
        /// 待校验的订单号
        number: String,
    },

    /// 为数字前缀追加校验位
    Generate {
        /// 数字前缀
        prefix: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { number } => match validate_order_number(&number) {
            Ok(()) => {
                println!("{}: valid", number.trim());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", number.trim(), e);
                ExitCode::FAILURE
            }
        },
        Commands::Generate { prefix } => match generate_valid_luhn(&prefix) {
            Some(number) => {
                println!("{}", number);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("前缀必须是非空的数字串: {:?}", prefix);
                ExitCode::FAILURE
            }
        },
    }
}
