//! `SeaORM` active enums for Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use trustbook_core::trust::{TransactionSource, TransactionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "trust_transaction_type"
)]
pub enum TrustTransactionType {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "transfer_in")]
    TransferIn,
    #[sea_orm(string_value = "transfer_out")]
    TransferOut,
    #[sea_orm(string_value = "interest")]
    Interest,
    #[sea_orm(string_value = "bank_fee")]
    BankFee,
    #[sea_orm(string_value = "void_reversal")]
    VoidReversal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "trust_transaction_source"
)]
pub enum TrustTransactionSource {
    #[sea_orm(string_value = "wire")]
    Wire,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "ach")]
    Ach,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "money_order")]
    MoneyOrder,
    #[sea_orm(string_value = "cashiers_check")]
    CashiersCheck,
    #[sea_orm(string_value = "internal_transfer")]
    InternalTransfer,
    #[sea_orm(string_value = "other")]
    Other,
}

impl From<TransactionType> for TrustTransactionType {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Deposit => Self::Deposit,
            TransactionType::Withdrawal => Self::Withdrawal,
            TransactionType::TransferIn => Self::TransferIn,
            TransactionType::TransferOut => Self::TransferOut,
            TransactionType::Interest => Self::Interest,
            TransactionType::BankFee => Self::BankFee,
            TransactionType::VoidReversal => Self::VoidReversal,
        }
    }
}

impl From<TrustTransactionType> for TransactionType {
    fn from(value: TrustTransactionType) -> Self {
        match value {
            TrustTransactionType::Deposit => Self::Deposit,
            TrustTransactionType::Withdrawal => Self::Withdrawal,
            TrustTransactionType::TransferIn => Self::TransferIn,
            TrustTransactionType::TransferOut => Self::TransferOut,
            TrustTransactionType::Interest => Self::Interest,
            TrustTransactionType::BankFee => Self::BankFee,
            TrustTransactionType::VoidReversal => Self::VoidReversal,
        }
    }
}

impl From<TransactionSource> for TrustTransactionSource {
    fn from(value: TransactionSource) -> Self {
        match value {
            TransactionSource::Wire => Self::Wire,
            TransactionSource::Check => Self::Check,
            TransactionSource::Cash => Self::Cash,
            TransactionSource::Ach => Self::Ach,
            TransactionSource::CreditCard => Self::CreditCard,
            TransactionSource::MoneyOrder => Self::MoneyOrder,
            TransactionSource::CashiersCheck => Self::CashiersCheck,
            TransactionSource::InternalTransfer => Self::InternalTransfer,
            TransactionSource::Other => Self::Other,
        }
    }
}
