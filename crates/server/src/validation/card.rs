//! Payment card validation and display masking.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("invalid month value")]
    Month,
    #[error("invalid year value")]
    Year,
    #[error("invalid cvc value")]
    Cvc,
    #[error("invalid pin value")]
    Pin,
    #[error("invalid number value")]
    Number,
}

/// A payment card with whitespace already stripped from its digit fields.
#[derive(Clone, PartialEq, Eq)]
pub struct CreditCard {
    pub number: String,
    pub month: i32,
    pub year: i32,
    pub cvc: String,
    pub pin: String,
}

impl CreditCard {
    pub fn new(number: &str, month: i32, year: i32, cvc: &str, pin: &str) -> Self {
        Self {
            number: strip_whitespace(number),
            month,
            year,
            cvc: strip_whitespace(cvc),
            pin: strip_whitespace(pin),
        }
    }

    /// Check ranges and lengths, then the Luhn checksum of the number.
    pub fn validate(&self) -> Result<(), CardError> {
        if !(1..=12).contains(&self.month) {
            return Err(CardError::Month);
        }
        if self.year < 1970 {
            return Err(CardError::Year);
        }
        if !(3..=4).contains(&self.cvc.chars().count()) {
            return Err(CardError::Cvc);
        }
        if !(4..=6).contains(&self.pin.chars().count()) {
            return Err(CardError::Pin);
        }
        if !(13..=19).contains(&self.number.len()) || !luhn_valid(&self.number) {
            return Err(CardError::Number);
        }
        Ok(())
    }

    /// All but the last four digits as `*`, in space-separated groups of four.
    ///
    /// `4242424242424242` masks to `**** **** **** 4242`.
    pub fn mask(&self) -> String {
        let chars: Vec<char> = self.number.chars().collect();
        let hidden = chars.len().saturating_sub(4);

        let mut mask = String::with_capacity(chars.len() + chars.len() / 4);
        for i in 0..hidden {
            mask.push('*');
            if i % 4 == 3 {
                mask.push(' ');
            }
        }
        mask.extend(&chars[hidden..]);
        mask
    }
}

// Sensitive digits stay out of logs.
impl std::fmt::Debug for CreditCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditCard")
            .field("number", &self.mask())
            .field("month", &self.month)
            .field("year", &self.year)
            .finish_non_exhaustive()
    }
}

/// Luhn checksum over an all-digit string.
pub fn luhn_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let sum: u32 = number
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
