//! Input checks applied before anything is encrypted or persisted.

pub mod card;

pub use card::CreditCard;

/// Fail with `"{field} is required"` when `value` is empty.
pub fn require(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_names_the_field() {
        assert!(require("name", "x").is_ok());
        assert_eq!(require("name", "").unwrap_err(), "name is required");
    }
}
