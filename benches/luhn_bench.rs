//! 订单号校验与金额换算基准测试
//!
//! 测试覆盖：
//! - 不同长度订单号的 Luhn 校验
//! - 校验位生成
//! - 十进制金额到分的换算

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use loyalty::luhn::{generate_valid_luhn, is_valid_luhn, validate_order_number};
use loyalty::money::decimal_to_cents;
use rust_decimal::Decimal;
use std::hint::black_box;

/// 生成指定长度的合法订单号
fn order_number(len: usize) -> String {
    let prefix: String = (0..len.saturating_sub(1))
        .map(|i| char::from(b'0' + (i % 10) as u8))
        .collect();
    generate_valid_luhn(&prefix).unwrap_or_default()
}

fn bench_luhn_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("luhn_validation");

    for len in [10usize, 16, 32, 64] {
        let number = order_number(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &number, |b, number| {
            b.iter(|| is_valid_luhn(black_box(number)))
        });
    }

    group.finish();
}

fn bench_order_number_validation(c: &mut Criterion) {
    let valid = order_number(16);
    let mut invalid = valid.clone();
    invalid.pop();
    invalid.push(if valid.ends_with('0') { '1' } else { '0' });

    c.bench_function("validate_order_number/valid", |b| {
        b.iter(|| validate_order_number(black_box(&valid)))
    });
    c.bench_function("validate_order_number/bad_checksum", |b| {
        b.iter(|| validate_order_number(black_box(&invalid)))
    });
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_valid_luhn/15", |b| {
        b.iter(|| generate_valid_luhn(black_box("456126121234546")))
    });
}

fn bench_money(c: &mut Criterion) {
    let amount = Decimal::new(72998, 2);
    c.bench_function("decimal_to_cents", |b| {
        b.iter(|| decimal_to_cents(black_box(amount)))
    });
}

criterion_group!(
    benches,
    bench_luhn_validation,
    bench_order_number_validation,
    bench_generate,
    bench_money
);
criterion_main!(benches);
