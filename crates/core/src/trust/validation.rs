//! Input validation for trust operations.
//!
//! Runs before any storage access. Everything here is a caller error and
//! maps to [`TrustError::Validation`].

use trustbook_shared::types::Money;

use super::error::TrustError;
use super::types::{
    CreateTrustAccountInput, PostTransactionInput, TransferInput, UpdateTrustAccountInput,
    VoidTransactionInput,
};

/// Maximum length of free-text fields (description, reason, names).
pub const MAX_TEXT_LEN: usize = 500;

/// Number of trailing account-number digits kept when masking.
const VISIBLE_ACCOUNT_DIGITS: usize = 4;

/// Validates that an amount is strictly positive and fits the ledger
/// columns exactly.
pub fn validate_amount(amount: Money) -> Result<(), TrustError> {
    if !amount.is_positive() {
        return Err(TrustError::validation(format!(
            "amount must be greater than zero, got {amount}"
        )));
    }
    validate_storable("amount", amount)
}

/// Validates that a value has at most four decimal places and a magnitude
/// below 10^15.
pub fn validate_storable(field: &str, value: Money) -> Result<(), TrustError> {
    if value.amount().normalize().scale() > Money::STORED_SCALE {
        return Err(TrustError::validation(format!(
            "{field} has more than {} decimal places: {}",
            Money::STORED_SCALE,
            value.amount()
        )));
    }
    if !value.is_storable() {
        return Err(TrustError::validation(format!(
            "{field} must be below {} in magnitude, got {}",
            Money::STORED_LIMIT.amount(),
            value.amount()
        )));
    }
    Ok(())
}

/// Validates a required free-text field.
pub fn validate_required_text(field: &str, value: &str) -> Result<(), TrustError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrustError::validation(format!("{field} is required")));
    }
    validate_text_len(field, trimmed)
}

fn validate_text_len(field: &str, value: &str) -> Result<(), TrustError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(TrustError::validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&String>) -> Result<(), TrustError> {
    value.map_or(Ok(()), |v| validate_text_len(field, v))
}

/// Validates a single-entry posting.
pub fn validate_post(input: &PostTransactionInput) -> Result<(), TrustError> {
    if !input.transaction_type.is_single_entry() {
        return Err(TrustError::validation(format!(
            "{} cannot be posted directly; use a transfer or a void",
            input.transaction_type
        )));
    }
    validate_amount(input.amount)?;
    validate_required_text("description", &input.description)?;
    validate_optional_text("reference", input.reference.as_ref())?;
    validate_optional_text("payee", input.payee.as_ref())?;
    validate_optional_text("payor", input.payor.as_ref())?;
    validate_optional_text("check number", input.check_number.as_ref())
}

/// Validates a transfer.
pub fn validate_transfer(input: &TransferInput) -> Result<(), TrustError> {
    validate_amount(input.amount)?;
    validate_required_text("description", &input.description)?;
    validate_optional_text("reference", input.reference.as_ref())?;
    if input.source() == input.destination() {
        return Err(TrustError::validation(
            "source and destination ledgers must differ",
        ));
    }
    Ok(())
}

/// Validates a void request. The reason is the audit justification and is
/// never optional.
pub fn validate_void(input: &VoidTransactionInput) -> Result<(), TrustError> {
    validate_required_text("void reason", &input.reason)
}

/// Validates account creation.
pub fn validate_create_account(input: &CreateTrustAccountInput) -> Result<(), TrustError> {
    validate_required_text("name", &input.name)?;
    validate_required_text("bank name", &input.bank_name)?;
    validate_required_text("account number", &input.account_number)?;
    validate_optional_text("routing number", input.routing_number.as_ref())?;
    validate_optional_text("description", input.description.as_ref())
}

/// Validates an account patch.
pub fn validate_update_account(input: &UpdateTrustAccountInput) -> Result<(), TrustError> {
    if let Some(name) = &input.name {
        validate_required_text("name", name)?;
    }
    if let Some(bank_name) = &input.bank_name {
        validate_required_text("bank name", bank_name)?;
    }
    if let Some(bank_balance) = input.bank_balance {
        validate_storable("bank balance", bank_balance)?;
    }
    validate_optional_text("routing number", input.routing_number.as_ref())?;
    validate_optional_text("description", input.description.as_ref())
}

/// Masks a bank account number, keeping only the last four digits.
///
/// Non-digit separators are dropped first, so `"12-3456-789"` becomes
/// `"****6789"`. Numbers with four digits or fewer are fully masked.
#[must_use]
pub fn mask_account_number(account_number: &str) -> String {
    let digits: Vec<char> = account_number
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if digits.len() <= VISIBLE_ACCOUNT_DIGITS {
        return "****".to_string();
    }
    let tail: String = digits[digits.len() - VISIBLE_ACCOUNT_DIGITS..].iter().collect();
    format!("****{tail}")
}
