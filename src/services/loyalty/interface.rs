use mongodb::bson::oid::ObjectId;

use crate::models::loyalty::LoyaltyBalance;
use crate::models::voucher::UserVoucher;

#[derive(Debug, PartialEq, Eq)]
pub enum LoyaltyError {
    InsufficientPoints,
    VoucherUnavailable,
    BalanceNotFound,
    DatabaseError(String),
}

impl std::fmt::Display for LoyaltyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoyaltyError::InsufficientPoints => write!(f, "Not enough points for this voucher"),
            LoyaltyError::VoucherUnavailable => write!(f, "Voucher no longer available"),
            LoyaltyError::BalanceNotFound => write!(f, "Loyalty balance not found"),
            LoyaltyError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for LoyaltyError {}

/// Boundary for the shared mutable loyalty state. Balances and vouchers are
/// touched by concurrent requests, so every mutation behind this trait must
/// be a single conditional update, never a read-then-write.
pub trait LoyaltyOperations {
    async fn init_balance(&self, user_id: ObjectId) -> Result<LoyaltyBalance, LoyaltyError>;
    async fn get_balance(&self, user_id: ObjectId) -> Result<LoyaltyBalance, LoyaltyError>;
    async fn credit_points(
        &self,
        user_id: ObjectId,
        points: i64,
    ) -> Result<LoyaltyBalance, LoyaltyError>;

    async fn claim_voucher(
        &self,
        user_id: ObjectId,
        catalog_id: ObjectId,
    ) -> Result<(UserVoucher, LoyaltyBalance), LoyaltyError>;
    async fn redeemable_vouchers(
        &self,
        user_id: ObjectId,
    ) -> Result<Vec<UserVoucher>, LoyaltyError>;
    async fn find_voucher(
        &self,
        user_id: ObjectId,
        voucher_id: ObjectId,
    ) -> Result<UserVoucher, LoyaltyError>;
    async fn consume_voucher(
        &self,
        user_id: ObjectId,
        voucher_id: ObjectId,
    ) -> Result<UserVoucher, LoyaltyError>;
    async fn release_voucher(
        &self,
        user_id: ObjectId,
        voucher_id: ObjectId,
    ) -> Result<(), LoyaltyError>;
}
