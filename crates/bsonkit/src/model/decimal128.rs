//! IEEE 754-2008 decimal128 values in binary integer decimal encoding.
//!
//! Values are held in wire order (16 little-endian bytes) and converted to
//! and from decimal strings without going through binary floating point.
//! String conversion is exact: parsing fails on precision loss instead of
//! rounding, with zero-padding/stripping used only where it cannot change
//! the value.

use std::str::FromStr;

/// Largest coefficient: 34 decimal digits.
const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999_999;

/// Decimal exponent range.
const EXPONENT_MAX: i64 = 6111;
const EXPONENT_MIN: i64 = -6176;
const EXPONENT_BIAS: i64 = 6176;

/// A 128-bit decimal floating point value.
///
/// Equality is bytewise: distinct encodings of the same numeric value (for
/// example `1` and `1.0`) compare unequal, and `NaN` compares equal to an
/// identically encoded `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    bytes: [u8; 16],
}

/// Error type for decimal string parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal128ParseError {
    pub message: String,
}

impl std::fmt::Display for Decimal128ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Decimal128ParseError {}

fn parse_error(message: impl Into<String>) -> Decimal128ParseError {
    Decimal128ParseError {
        message: message.into(),
    }
}

/// Decoded form used by the formatter: finite values carry an exact
/// coefficient and exponent.
enum Classified {
    NaN,
    Infinity { negative: bool },
    Finite {
        negative: bool,
        coefficient: u128,
        exponent: i64,
    },
}

impl Decimal128 {
    /// Positive zero.
    pub const ZERO: Decimal128 = Decimal128 {
        bytes: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x40, 0x30],
    };

    /// Not a number (quiet).
    pub const NAN: Decimal128 = Decimal128 {
        bytes: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x7C],
    };

    /// Positive infinity.
    pub const INFINITY: Decimal128 = Decimal128 {
        bytes: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x78],
    };

    /// Negative infinity.
    pub const NEG_INFINITY: Decimal128 = Decimal128 {
        bytes: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xF8],
    };

    /// Creates a value from 16 wire-order (little-endian) bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Returns the 16 wire-order bytes.
    pub fn bytes(&self) -> &[u8; 16] {
        &self.bytes
    }

    fn low(&self) -> u64 {
        // SAFETY: the array is 16 bytes, both halves always exist
        u64::from_le_bytes(self.bytes[0..8].try_into().unwrap())
    }

    fn high(&self) -> u64 {
        // SAFETY: the array is 16 bytes, both halves always exist
        u64::from_le_bytes(self.bytes[8..16].try_into().unwrap())
    }

    /// Returns true for either NaN encoding.
    pub fn is_nan(&self) -> bool {
        (self.high() >> 58) & 0x1F == 0x1F
    }

    /// Returns true for positive or negative infinity.
    pub fn is_infinite(&self) -> bool {
        (self.high() >> 58) & 0x1F == 0x1E
    }

    fn classify(&self) -> Classified {
        let high = self.high();
        let negative = high >> 63 == 1;
        let combination = (high >> 58) & 0x1F;

        if combination == 0x1F {
            return Classified::NaN;
        }
        if combination == 0x1E {
            return Classified::Infinity { negative };
        }

        let (biased_exponent, coefficient) = if combination >> 3 == 0b11 {
            // Large-coefficient form: the implicit (100)b prefix pushes every
            // such coefficient past 34 digits, so it decodes as zero
            ((high >> 47) & 0x3FFF, 0)
        } else {
            let coefficient =
                (((high & 0x0001_FFFF_FFFF_FFFF) as u128) << 64) | self.low() as u128;
            let coefficient = if coefficient > MAX_COEFFICIENT {
                0
            } else {
                coefficient
            };
            ((high >> 49) & 0x3FFF, coefficient)
        };

        Classified::Finite {
            negative,
            coefficient,
            exponent: biased_exponent as i64 - EXPONENT_BIAS,
        }
    }

    fn from_parts(negative: bool, coefficient: u128, exponent: i64) -> Self {
        let biased = (exponent + EXPONENT_BIAS) as u64;
        let mut high = (biased << 49) | (coefficient >> 64) as u64;
        if negative {
            high |= 1 << 63;
        }
        let low = coefficient as u64;

        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&low.to_le_bytes());
        bytes[8..16].copy_from_slice(&high.to_le_bytes());
        Self { bytes }
    }
}

impl std::fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (negative, coefficient, exponent) = match self.classify() {
            Classified::NaN => return f.write_str("NaN"),
            Classified::Infinity { negative: true } => return f.write_str("-Infinity"),
            Classified::Infinity { negative: false } => return f.write_str("Infinity"),
            Classified::Finite {
                negative,
                coefficient,
                exponent,
            } => (negative, coefficient, exponent),
        };

        if negative {
            f.write_str("-")?;
        }

        let digits = coefficient.to_string();
        let adjusted = exponent + digits.len() as i64 - 1;

        if exponent > 0 || adjusted < -6 {
            // Scientific notation with an explicit exponent sign
            f.write_str(&digits[..1])?;
            if digits.len() > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            if adjusted >= 0 {
                write!(f, "E+{}", adjusted)
            } else {
                write!(f, "E{}", adjusted)
            }
        } else if exponent == 0 {
            f.write_str(&digits)
        } else {
            let point = digits.len() as i64 + exponent;
            if point > 0 {
                write!(f, "{}.{}", &digits[..point as usize], &digits[point as usize..])
            } else {
                write!(f, "0.{}{}", "0".repeat(-point as usize), digits)
            }
        }
    }
}

impl FromStr for Decimal128 {
    type Err = Decimal128ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (negative, body) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };

        if body.eq_ignore_ascii_case("nan") {
            return Ok(Self::NAN);
        }
        if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
            return Ok(if negative {
                Self::NEG_INFINITY
            } else {
                Self::INFINITY
            });
        }

        // Split off an exponent suffix, then the fraction
        let (mantissa, exp_value) = match body.find(['e', 'E']) {
            Some(at) => {
                let exp: i64 = body[at + 1..]
                    .parse()
                    .map_err(|_| parse_error(format!("Invalid decimal exponent: {}", input)))?;
                (&body[..at], exp)
            }
            None => (body, 0),
        };

        let (int_part, frac_part) = match mantissa.find('.') {
            Some(at) => (&mantissa[..at], &mantissa[at + 1..]),
            None => (mantissa, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(parse_error(format!("Invalid decimal literal: {}", input)));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(parse_error(format!("Invalid decimal literal: {}", input)));
        }

        let mut exponent = exp_value - frac_part.len() as i64;
        let mut digits: String = int_part.chars().chain(frac_part.chars()).collect();

        // Strip leading zeros, keeping one digit
        let nonzero = digits.find(|c| c != '0').unwrap_or(digits.len() - 1);
        digits.drain(..nonzero);

        if digits == "0" {
            // A zero coefficient absorbs any exponent clamp
            exponent = exponent.clamp(EXPONENT_MIN, EXPONENT_MAX);
            return Ok(Self::from_parts(negative, 0, exponent));
        }

        // Over 34 significant digits is representable only if the excess
        // digits are trailing zeros
        while digits.len() > 34 && digits.ends_with('0') {
            digits.pop();
            exponent += 1;
        }
        if digits.len() > 34 {
            return Err(parse_error(format!(
                "Decimal value has too many significant digits: {}",
                input
            )));
        }

        // Clamp the exponent into range where zeros allow it
        while exponent > EXPONENT_MAX && digits.len() < 34 {
            digits.push('0');
            exponent -= 1;
        }
        if exponent > EXPONENT_MAX {
            return Err(parse_error(format!("Decimal exponent overflow: {}", input)));
        }
        while exponent < EXPONENT_MIN && digits.len() > 1 && digits.ends_with('0') {
            digits.pop();
            exponent += 1;
        }
        if exponent < EXPONENT_MIN {
            return Err(parse_error(format!("Decimal exponent underflow: {}", input)));
        }

        // digits is 1..=34 ASCII decimal digits, which always fits in u128
        let coefficient: u128 = match digits.parse() {
            Ok(c) => c,
            Err(_) => return Err(parse_error(format!("Invalid decimal digits: {}", input))),
        };
        Ok(Self::from_parts(negative, coefficient, exponent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal128 {
        s.parse().unwrap()
    }

    fn halves(d: &Decimal128) -> (u64, u64) {
        (d.high(), d.low())
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(halves(&dec("1")), (0x3040_0000_0000_0000, 1));
        assert_eq!(halves(&dec("0")), (0x3040_0000_0000_0000, 0));
        assert_eq!(halves(&dec("-0")), (0xB040_0000_0000_0000, 0));
        assert_eq!(halves(&dec("0.1")), (0x303E_0000_0000_0000, 1));
        assert_eq!(halves(&dec("0.001")), (0x303A_0000_0000_0000, 1));
        assert_eq!(halves(&dec("1E+3")), (0x3046_0000_0000_0000, 1));
        assert_eq!(halves(&dec("-1")), (0xB040_0000_0000_0000, 1));
        assert_eq!(
            halves(&dec("9.999999999999999999999999999999999E+6144")),
            (0x5FFF_ED09_BEAD_87C0, 0x378D_8E63_FFFF_FFFF)
        );
    }

    #[test]
    fn test_special_values() {
        assert_eq!(dec("NaN"), Decimal128::NAN);
        assert_eq!(dec("nan"), Decimal128::NAN);
        assert_eq!(dec("-NaN"), Decimal128::NAN);
        assert_eq!(dec("Infinity"), Decimal128::INFINITY);
        assert_eq!(dec("inf"), Decimal128::INFINITY);
        assert_eq!(dec("-Infinity"), Decimal128::NEG_INFINITY);

        assert!(Decimal128::NAN.is_nan());
        assert!(!Decimal128::NAN.is_infinite());
        assert!(Decimal128::INFINITY.is_infinite());
        assert!(Decimal128::NEG_INFINITY.is_infinite());
        assert!(!Decimal128::ZERO.is_nan());
    }

    #[test]
    fn test_format() {
        assert_eq!(Decimal128::NAN.to_string(), "NaN");
        assert_eq!(Decimal128::INFINITY.to_string(), "Infinity");
        assert_eq!(Decimal128::NEG_INFINITY.to_string(), "-Infinity");
        assert_eq!(Decimal128::ZERO.to_string(), "0");
        assert_eq!(dec("-0").to_string(), "-0");
        assert_eq!(dec("123.45").to_string(), "123.45");
        assert_eq!(dec("0.001").to_string(), "0.001");
        assert_eq!(dec("1E+3").to_string(), "1E+3");
        assert_eq!(dec("1E-7").to_string(), "1E-7");
        assert_eq!(dec("0.0000005").to_string(), "5E-7");
        assert_eq!(dec("12345678.9").to_string(), "12345678.9");
        assert_eq!(dec("0E+3").to_string(), "0E+3");
        assert_eq!(dec("0E-6176").to_string(), "0E-6176");
    }

    #[test]
    fn test_string_roundtrip() {
        let cases = [
            "0",
            "-0",
            "1",
            "-1",
            "12345678901234567",
            "989898983458",
            "0.1",
            "0.001",
            "0.00100",
            "1.00",
            "123.456",
            "1E+3",
            "0E+3",
            "5E-7",
            "9.999999999999999999999999999999999E+6144",
            "1E-6176",
            "0E-6176",
            "NaN",
            "Infinity",
            "-Infinity",
        ];
        for case in cases {
            let parsed = dec(case);
            assert_eq!(parsed.to_string(), case, "roundtrip failed for {}", case);
        }
    }

    #[test]
    fn test_trailing_zeros_preserved() {
        // 0.00100 has five significant wire digits: coefficient 100, exp -5
        let d = dec("0.00100");
        assert_eq!(d.to_string(), "0.00100");
        assert_ne!(d, dec("0.001"));
    }

    #[test]
    fn test_exponent_clamping() {
        // Padding zeros brings an over-range exponent back in range
        assert_eq!(dec("1E+6112").to_string(), "1.0E+6112");
        // Stripping trailing zeros brings an under-range exponent back
        assert_eq!(dec("10E-6177").to_string(), "1E-6176");
        // Zero absorbs any exponent
        assert_eq!(dec("0E+9999").to_string(), "0E+6111");
        assert_eq!(dec("0E-9999").to_string(), "0E-6176");
    }

    #[test]
    fn test_parse_failures() {
        assert!("".parse::<Decimal128>().is_err());
        assert!("abc".parse::<Decimal128>().is_err());
        assert!("1.2.3".parse::<Decimal128>().is_err());
        assert!("1E".parse::<Decimal128>().is_err());
        assert!("E5".parse::<Decimal128>().is_err());
        // 35 significant non-zero digits cannot be represented exactly
        assert!("12345678901234567890123456789012345"
            .parse::<Decimal128>()
            .is_err());
        // Exponent out of range with no zeros to shift
        assert!("1E+6200".parse::<Decimal128>().is_err());
        assert!("1E-6200".parse::<Decimal128>().is_err());
    }

    #[test]
    fn test_35_digits_with_trailing_zero_is_exact() {
        let d = dec("12345678901234567890123456789012340");
        assert_eq!(d.to_string(), "1.234567890123456789012345678901234E+34");
    }

    #[test]
    fn test_non_canonical_coefficient_decodes_as_zero() {
        // Large-coefficient form: bits 62-61 set, exponent field at bits 60-47
        let mut bytes = [0u8; 16];
        let high: u64 = 0x6000_0000_0000_0000 | ((EXPONENT_BIAS as u64) << 47);
        bytes[8..16].copy_from_slice(&high.to_le_bytes());
        let d = Decimal128::from_bytes(bytes);
        assert_eq!(d.to_string(), "0");
    }

    #[test]
    fn test_wire_bytes_roundtrip() {
        let d = dec("-123.456");
        let bytes = *d.bytes();
        assert_eq!(Decimal128::from_bytes(bytes), d);
    }
}
