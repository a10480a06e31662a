// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde_json::Number;

/// How should numbers be compared.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum NumericMode {
    /// Numbers are equal when written the same way, so `1` and `1.0` differ.
    #[default]
    Exact,
    /// Numbers are equal when they denote the same decimal value, so `1`,
    /// `1.0` and `10e-1` are all equal. No floating point is involved.
    Decimal,
}

impl NumericMode {
    pub(crate) fn equal(&self, actual: &Number, expected: &Number) -> bool {
        match self {
            NumericMode::Exact => actual == expected,
            NumericMode::Decimal => {
                let (actual, expected) = (actual.to_string(), expected.to_string());
                match (Decimal::parse(&actual), Decimal::parse(&expected)) {
                    (Some(a), Some(e)) => a == e,
                    _ => actual == expected,
                }
            }
        }
    }
}

/// Normalised `sign * digits * 10^exponent` with no leading or trailing
/// zeros in `digits`. Zero is always positive with empty digits.
#[derive(Debug, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl Decimal {
    fn parse(text: &str) -> Option<Decimal> {
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let (mantissa, exponent) = match unsigned.find(|c| c == 'e' || c == 'E') {
            Some(at) => (&unsigned[..at], unsigned[at + 1..].parse::<i64>().ok()?),
            None => (unsigned, 0),
        };

        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if integer.is_empty()
            || !integer
                .bytes()
                .chain(fraction.bytes())
                .all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let all_digits = format!("{}{}", integer, fraction);
        let significant = all_digits.trim_start_matches('0');
        if significant.is_empty() {
            return Some(Decimal {
                negative: false,
                digits: String::new(),
                exponent: 0,
            });
        }

        let trimmed = significant.trim_end_matches('0');
        let trailing = (significant.len() - trimmed.len()) as i64;
        let exponent = exponent
            .checked_sub(fraction.len() as i64)?
            .checked_add(trailing)?;

        Some(Decimal {
            negative,
            digits: trimmed.to_string(),
            exponent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(value: serde_json::Value) -> Number {
        match value {
            serde_json::Value::Number(n) => n,
            other => panic!("not a number: {}", other),
        }
    }

    fn parsed(text: &str) -> Number {
        number(serde_json::from_str(text).unwrap())
    }

    #[test]
    fn test_exact() {
        let mode = NumericMode::Exact;
        assert!(mode.equal(&number(json!(1)), &number(json!(1))));
        assert!(mode.equal(&parsed("50"), &number(json!(50))));
        assert!(!mode.equal(&parsed("1"), &parsed("1.0")));
        assert!(!mode.equal(&number(json!(1)), &number(json!(2))));
    }

    #[test]
    fn test_decimal() {
        let mode = NumericMode::Decimal;
        assert!(mode.equal(&parsed("1"), &parsed("1.0")));
        assert!(mode.equal(&parsed("1"), &parsed("10e-1")));
        assert!(mode.equal(&parsed("1200"), &parsed("1.2E3")));
        assert!(mode.equal(&parsed("0.0"), &parsed("-0")));
        assert!(mode.equal(&parsed("-5.60"), &parsed("-5.6")));
        assert!(!mode.equal(&parsed("5.6"), &parsed("-5.6")));
        assert!(!mode.equal(&parsed("0.1"), &parsed("0.01")));
    }

    #[test]
    fn test_decimal_keeps_precision() {
        let mode = NumericMode::Decimal;
        assert!(!mode.equal(
            &parsed("12345678901234567890.000000000000000001"),
            &parsed("12345678901234567890")
        ));
    }
}
