/// Transfer form and client-side validation
///
/// Every check here runs before any network call.
use crate::error::ValidationError;
use crate::session::Balances;
use crate::tokens::{TrackedToken, NATIVE_TRANSFER_CEILING};

/// User input of the send screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferForm {
    pub amount: String,
    pub destination_address: String,
    pub token: TrackedToken,
}

impl Default for TransferForm {
    fn default() -> Self {
        Self {
            amount: "0".to_string(),
            destination_address: String::new(),
            token: TrackedToken::Usdc,
        }
    }
}

impl TransferForm {
    pub fn clear_inputs(&mut self) {
        self.amount = "0".to_string();
        self.destination_address.clear();
    }
}

/// Digits and decimal points only; the empty string passes and is caught separately
pub fn is_amount_format_valid(amount: &str) -> bool {
    amount.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Lenient numeric parse; anything unparseable counts as zero
fn parse_amount(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Largest amount (exclusive) that may be sent of `token`
pub fn transfer_limit(token: TrackedToken, balances: &Balances) -> f64 {
    let balance = parse_amount(balances.get(token));
    if token.is_native() {
        balance * NATIVE_TRANSFER_CEILING
    } else {
        balance
    }
}

/// Validate the form against the current balances
pub fn validate_transfer(form: &TransferForm, balances: &Balances) -> Result<(), ValidationError> {
    if !is_amount_format_valid(&form.amount) {
        return Err(ValidationError::InvalidFormat);
    }
    if form.amount.is_empty() {
        return Err(ValidationError::EmptyAmount);
    }

    let amount = parse_amount(&form.amount);
    let limit = transfer_limit(form.token, balances);
    if amount < limit {
        Ok(())
    } else {
        log::debug!(
            "Rejecting {} {}: limit is {}",
            amount,
            form.token,
            limit
        );
        Err(ValidationError::InsufficientBalance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balances(eth: &str, usdc: &str) -> Balances {
        Balances {
            eth_sepolia: eth.to_string(),
            usdc: usdc.to_string(),
        }
    }

    fn form(amount: &str, token: TrackedToken) -> TransferForm {
        TransferForm {
            amount: amount.to_string(),
            destination_address: "0xdead".to_string(),
            token,
        }
    }

    #[test]
    fn test_rejects_non_numeric_characters() {
        let b = balances("100", "100");
        for amount in ["1e3", "-1", "1,5", " 1", "abc", "0x10", "½"] {
            assert_eq!(
                validate_transfer(&form(amount, TrackedToken::Usdc), &b),
                Err(ValidationError::InvalidFormat),
                "amount {:?}",
                amount
            );
        }
    }

    #[test]
    fn test_empty_amount() {
        assert_eq!(
            validate_transfer(&form("", TrackedToken::Usdc), &balances("1", "1")),
            Err(ValidationError::EmptyAmount)
        );
    }

    #[test]
    fn test_stablecoin_strict_less_than_balance() {
        let b = balances("0", "40");
        assert_eq!(
            validate_transfer(&form("50", TrackedToken::Usdc), &b),
            Err(ValidationError::InsufficientBalance)
        );
        assert_eq!(
            validate_transfer(&form("40", TrackedToken::Usdc), &b),
            Err(ValidationError::InsufficientBalance)
        );
        assert_eq!(validate_transfer(&form("39.99", TrackedToken::Usdc), &b), Ok(()));
    }

    #[test]
    fn test_native_token_keeps_fee_reserve() {
        let b = balances("9", "0");
        assert_eq!(
            validate_transfer(&form("10", TrackedToken::EthSepolia), &b),
            Err(ValidationError::InsufficientBalance)
        );
        assert_eq!(
            validate_transfer(&form("8.5", TrackedToken::EthSepolia), &b),
            Err(ValidationError::InsufficientBalance)
        );
        assert_eq!(validate_transfer(&form("8", TrackedToken::EthSepolia), &b), Ok(()));
    }

    #[test]
    fn test_lone_decimal_point_counts_as_zero() {
        assert_eq!(
            validate_transfer(&form(".", TrackedToken::Usdc), &balances("0", "1")),
            Ok(())
        );
        assert_eq!(
            validate_transfer(&form(".", TrackedToken::Usdc), &balances("0", "0")),
            Err(ValidationError::InsufficientBalance)
        );
    }

    #[test]
    fn test_clear_inputs_resets_amount_and_destination() {
        let mut f = form("3", TrackedToken::EthSepolia);
        f.clear_inputs();
        assert_eq!(f.amount, "0");
        assert!(f.destination_address.is_empty());
        assert_eq!(f.token, TrackedToken::EthSepolia);
    }
}
