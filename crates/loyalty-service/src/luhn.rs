//! Luhn 校验位算法
//!
//! 订单号与提现关联单号都必须通过 Luhn 校验。校验前去除所有空格。

use crate::error::ValidationError;

/// 校验数字串是否满足 Luhn 算法
///
/// 空串、含非数字字符或少于 2 位数字时返回 false。
pub fn is_valid_luhn(number: &str) -> bool {
    let digits = strip_spaces(number);
    if digits.len() < 2 || !all_digits(&digits) {
        return false;
    }
    checksum(&digits) == 0
}

/// 为数字前缀追加校验位，生成合法号码
///
/// 前缀为空或含非数字字符时返回 `None`。
pub fn generate_valid_luhn(prefix: &str) -> Option<String> {
    let prefix = strip_spaces(prefix);
    if prefix.is_empty() || !all_digits(&prefix) {
        return None;
    }

    let check_digit = (10 - checksum(&format!("{}0", prefix))) % 10;
    Some(format!("{}{}", prefix, check_digit))
}

/// 校验订单号并区分失败原因
///
/// 输入先去除首尾空白，再依次检查：为空、含非数字字符、校验位错误。
pub fn validate_order_number(number: &str) -> Result<(), ValidationError> {
    let number = number.trim();
    if number.is_empty() {
        return Err(ValidationError::EmptyOrderNumber);
    }
    if !all_digits(number) {
        return Err(ValidationError::NonDigitOrderNumber);
    }
    if !is_valid_luhn(number) {
        return Err(ValidationError::BadChecksum);
    }
    Ok(())
}

fn strip_spaces(s: &str) -> String {
    s.chars().filter(|c| *c != ' ').collect()
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// 从右向左，偶数位数字翻倍（大于 9 时减 9），求和后模 10
fn checksum(digits: &str) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum::<u32>()
        % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_numbers() {
        assert!(is_valid_luhn("79927398713"));
        assert!(is_valid_luhn("4561261212345467"));
        assert!(is_valid_luhn("12345678903"));
        assert!(is_valid_luhn("0000000000"));
    }

    #[test]
    fn test_known_invalid_numbers() {
        assert!(!is_valid_luhn("79927398714"));
        assert!(!is_valid_luhn("4561261212345464"));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(!is_valid_luhn(""));
        assert!(!is_valid_luhn("   "));
        assert!(!is_valid_luhn("0"));
        assert!(!is_valid_luhn("7992a398713"));
        assert!(!is_valid_luhn("-79927398713"));
    }

    #[test]
    fn test_spaces_are_ignored() {
        assert!(is_valid_luhn("7992 7398 713"));
        assert!(is_valid_luhn(" 79927398713 "));
    }

    #[test]
    fn test_generate_valid_luhn() {
        assert_eq!(generate_valid_luhn("123456789").as_deref(), Some("1234567897"));
        assert_eq!(generate_valid_luhn("7992739871").as_deref(), Some("79927398713"));
        assert_eq!(generate_valid_luhn("12 34").as_deref(), Some("12344"));
        assert_eq!(generate_valid_luhn("12a"), None);
        assert_eq!(generate_valid_luhn(""), None);
    }

    #[test]
    fn test_generated_numbers_validate() {
        for prefix in ["1", "42", "987654321", "100000000000000", "5555"] {
            let number = generate_valid_luhn(prefix).unwrap();
            assert!(is_valid_luhn(&number), "{} 应通过校验", number);
        }
    }

    #[test]
    fn test_validate_order_number_kinds() {
        assert_eq!(validate_order_number("12345678903"), Ok(()));
        assert_eq!(validate_order_number(" 12345678903\n"), Ok(()));
        assert_eq!(
            validate_order_number("  "),
            Err(ValidationError::EmptyOrderNumber)
        );
        assert_eq!(
            validate_order_number("1234-5678"),
            Err(ValidationError::NonDigitOrderNumber)
        );
        assert_eq!(
            validate_order_number("12345678904"),
            Err(ValidationError::BadChecksum)
        );
    }
}
