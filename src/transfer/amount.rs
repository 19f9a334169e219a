//! Fixed-point token amounts in human units.
//!
//! Amounts are kept as an integer mantissa plus a decimal scale so that
//! `1.1` stays `1.1` all the way to the quantity string. Formatting to the
//! token precision rounds half-up.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest number of fraction digits an amount may carry.
pub const MAX_SCALE: u32 = 38;

/// Errors raised while parsing an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Invalid amount \"{0}\"")]
    Malformed(String),

    #[error("Amount must be greater than 0")]
    NotPositive,

    #[error("Amount \"{0}\" is out of range")]
    OutOfRange(String),
}

/// A positive decimal quantity of token units, e.g. `1.5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Amount {
    mantissa: u128,
    scale: u32,
}

impl Amount {
    /// Build from an integer mantissa and a number of fraction digits.
    pub fn from_parts(mantissa: u128, scale: u32) -> Result<Self, AmountError> {
        if scale > MAX_SCALE {
            return Err(AmountError::OutOfRange(format!("{mantissa}e-{scale}")));
        }
        if mantissa == 0 {
            return Err(AmountError::NotPositive);
        }
        Ok(Self { mantissa, scale })
    }

    /// Whole token units (no fraction).
    pub fn from_units(units: u64) -> Result<Self, AmountError> {
        Self::from_parts(units as u128, 0)
    }

    pub fn mantissa(&self) -> u128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Render with exactly `precision` fraction digits.
    ///
    /// Digits beyond `precision` are rounded half-up; precision 0 prints no
    /// decimal point.
    pub fn to_fixed(&self, precision: u8) -> String {
        let precision = u32::from(precision);
        let (value, scale) = if self.scale > precision {
            let divisor = 10u128.pow(self.scale - precision);
            let truncated = self.mantissa / divisor;
            let remainder = self.mantissa % divisor;
            let rounded = if remainder * 2 >= divisor {
                truncated + 1
            } else {
                truncated
            };
            (rounded, precision)
        } else {
            (self.mantissa, self.scale)
        };

        let unit = 10u128.pow(scale);
        let whole = value / unit;
        if precision == 0 {
            return whole.to_string();
        }

        let mut fraction = if scale == 0 {
            String::new()
        } else {
            format!("{:0width$}", value % unit, width = scale as usize)
        };
        while fraction.len() < precision as usize {
            fraction.push('0');
        }
        format!("{whole}.{fraction}")
    }

    /// Exact sum of two amounts, `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let lhs = self.mantissa.checked_mul(10u128.pow(scale - self.scale))?;
        let rhs = other.mantissa.checked_mul(10u128.pow(scale - other.scale))?;
        Some(Self {
            mantissa: lhs.checked_add(rhs)?,
            scale,
        })
    }
}

impl Amount {
    /// Compare by value, so `1.5` and `1.50` are equal.
    pub fn compare(&self, other: &Self) -> Ordering {
        match self.scale.cmp(&other.scale) {
            Ordering::Equal => self.mantissa.cmp(&other.mantissa),
            Ordering::Greater => match other.mantissa.checked_mul(10u128.pow(self.scale - other.scale)) {
                Some(rhs) => self.mantissa.cmp(&rhs),
                // `other` has more whole units than any value at our scale.
                None => Ordering::Less,
            },
            Ordering::Less => other.compare(self).reverse(),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        let well_formed = !(whole.is_empty() && fraction.is_empty())
            && whole.bytes().all(|b| b.is_ascii_digit())
            && fraction.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(AmountError::Malformed(s.to_string()));
        }

        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > MAX_SCALE as usize {
            return Err(AmountError::OutOfRange(s.to_string()));
        }

        let digits = format!("{whole}{fraction}");
        let digits = digits.trim_start_matches('0');
        let mantissa = if digits.is_empty() {
            0
        } else {
            digits
                .parse::<u128>()
                .map_err(|_| AmountError::OutOfRange(s.to_string()))?
        };

        Self::from_parts(mantissa, fraction.len() as u32)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = 10u128.pow(self.scale);
        let whole = self.mantissa / unit;
        if self.scale == 0 {
            return write!(f, "{whole}");
        }
        let fraction = format!("{:0width$}", self.mantissa % unit, width = self.scale as usize);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.{fraction}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a positive decimal number or numeric string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Amount::from_units(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(AmountError::NotPositive))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
                if !v.is_finite() {
                    return Err(E::custom(AmountError::Malformed(v.to_string())));
                }
                if v <= 0.0 {
                    return Err(E::custom(AmountError::NotPositive));
                }
                // f64 Display is the shortest round-trip form and never uses an exponent.
                v.to_string().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
