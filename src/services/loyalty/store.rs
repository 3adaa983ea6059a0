use std::sync::Arc;

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};
use rand::{distributions::Alphanumeric, Rng};

use crate::models::loyalty::LoyaltyBalance;
use crate::models::voucher::{UserVoucher, VoucherCatalogEntry};
use crate::services::loyalty::interface::{LoyaltyError, LoyaltyOperations};

const VOUCHER_CODE_LEN: usize = 8;

/// MongoDB-backed loyalty state. Point debits carry a `$gte` guard and
/// voucher consumption flips `is_used` through a filtered update, so two
/// tabs racing the same balance cannot double-spend.
pub struct MongoLoyaltyStore {
    client: Arc<Client>,
}

impl MongoLoyaltyStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn balances(&self) -> Collection<LoyaltyBalance> {
        self.client.database("Account").collection("LoyaltyBalances")
    }

    fn vouchers(&self) -> Collection<UserVoucher> {
        self.client.database("Account").collection("UserVouchers")
    }

    fn catalog(&self) -> Collection<VoucherCatalogEntry> {
        self.client.database("Catalog").collection("VoucherCatalog")
    }

    fn generate_code() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(VOUCHER_CODE_LEN)
            .map(char::from)
            .collect::<String>()
            .to_uppercase()
    }

    async fn refund_points(&self, user_id: ObjectId, points: i64) {
        // Compensation path; losing it leaks points but must not mask the
        // original failure.
        let result = self
            .balances()
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$inc": { "points": points }, "$set": { "updated_at": DateTime::now() } },
            )
            .await;
        if let Err(err) = result {
            eprintln!("Failed to refund {} points to {}: {:?}", points, user_id, err);
        }
    }
}

impl LoyaltyOperations for MongoLoyaltyStore {
    /// Idempotent: a balance already present is left untouched.
    async fn init_balance(&self, user_id: ObjectId) -> Result<LoyaltyBalance, LoyaltyError> {
        let now = DateTime::now();
        self.balances()
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$setOnInsert": {
                    "user_id": user_id,
                    "points": 0i64,
                    "created_at": now,
                    "updated_at": now,
                } },
            )
            .upsert(true)
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))?;

        self.get_balance(user_id).await
    }

    async fn get_balance(&self, user_id: ObjectId) -> Result<LoyaltyBalance, LoyaltyError> {
        match self.balances().find_one(doc! { "user_id": user_id }).await {
            Ok(Some(balance)) => Ok(balance),
            Ok(None) => Err(LoyaltyError::BalanceNotFound),
            Err(err) => Err(LoyaltyError::DatabaseError(err.to_string())),
        }
    }

    async fn credit_points(
        &self,
        user_id: ObjectId,
        points: i64,
    ) -> Result<LoyaltyBalance, LoyaltyError> {
        debug_assert!(points >= 0);

        let now = DateTime::now();
        let updated = self
            .balances()
            .find_one_and_update(
                doc! { "user_id": user_id },
                doc! {
                    "$inc": { "points": points },
                    "$set": { "updated_at": now },
                    "$setOnInsert": { "created_at": now },
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))?;

        updated.ok_or(LoyaltyError::BalanceNotFound)
    }

    /// Spend points on a catalog entry, producing an unused user-owned
    /// voucher copy. Debit and stock decrement are both guarded updates;
    /// a lost stock race refunds the debit.
    async fn claim_voucher(
        &self,
        user_id: ObjectId,
        catalog_id: ObjectId,
    ) -> Result<(UserVoucher, LoyaltyBalance), LoyaltyError> {
        let entry = match self.catalog().find_one(doc! { "_id": catalog_id }).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return Err(LoyaltyError::VoucherUnavailable),
            Err(err) => return Err(LoyaltyError::DatabaseError(err.to_string())),
        };

        // 1. Debit the balance, but only if it covers the cost.
        let debited = self
            .balances()
            .find_one_and_update(
                doc! { "user_id": user_id, "points": { "$gte": entry.points_cost } },
                doc! {
                    "$inc": { "points": -entry.points_cost },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))?;

        let balance = match debited {
            Some(balance) => balance,
            None => return Err(LoyaltyError::InsufficientPoints),
        };

        // 2. Take one unit of stock, if any is left.
        let stocked = self
            .catalog()
            .find_one_and_update(
                doc! { "_id": catalog_id, "remaining": { "$gt": 0 } },
                doc! { "$inc": { "remaining": -1 } },
            )
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()));

        match stocked {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.refund_points(user_id, entry.points_cost).await;
                return Err(LoyaltyError::VoucherUnavailable);
            }
            Err(err) => {
                self.refund_points(user_id, entry.points_cost).await;
                return Err(err);
            }
        }

        // 3. Mint the user's copy.
        let voucher = UserVoucher {
            id: None,
            user_id,
            catalog_id,
            code: Self::generate_code(),
            discount_amount: entry.discount_amount,
            points_cost: entry.points_cost,
            is_used: false,
            claimed_at: Some(DateTime::now()),
            used_at: None,
        };

        match self.vouchers().insert_one(&voucher).await {
            Ok(result) => {
                let mut voucher = voucher;
                voucher.id = result.inserted_id.as_object_id();
                Ok((voucher, balance))
            }
            Err(err) => {
                self.refund_points(user_id, entry.points_cost).await;
                let _ = self
                    .catalog()
                    .update_one(
                        doc! { "_id": catalog_id },
                        doc! { "$inc": { "remaining": 1 } },
                    )
                    .await;
                Err(LoyaltyError::DatabaseError(err.to_string()))
            }
        }
    }

    async fn redeemable_vouchers(
        &self,
        user_id: ObjectId,
    ) -> Result<Vec<UserVoucher>, LoyaltyError> {
        let cursor = self
            .vouchers()
            .find(doc! { "user_id": user_id, "is_used": false })
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))?;

        cursor
            .try_collect::<Vec<UserVoucher>>()
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))
    }

    async fn find_voucher(
        &self,
        user_id: ObjectId,
        voucher_id: ObjectId,
    ) -> Result<UserVoucher, LoyaltyError> {
        match self
            .vouchers()
            .find_one(doc! { "_id": voucher_id, "user_id": user_id })
            .await
        {
            Ok(Some(voucher)) => Ok(voucher),
            Ok(None) => Err(LoyaltyError::VoucherUnavailable),
            Err(err) => Err(LoyaltyError::DatabaseError(err.to_string())),
        }
    }

    /// Exactly-once consumption: the `is_used: false` filter means only one
    /// of two concurrent submissions can win this update.
    async fn consume_voucher(
        &self,
        user_id: ObjectId,
        voucher_id: ObjectId,
    ) -> Result<UserVoucher, LoyaltyError> {
        let consumed = self
            .vouchers()
            .find_one_and_update(
                doc! { "_id": voucher_id, "user_id": user_id, "is_used": false },
                doc! { "$set": { "is_used": true, "used_at": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))?;

        consumed.ok_or(LoyaltyError::VoucherUnavailable)
    }

    async fn release_voucher(
        &self,
        user_id: ObjectId,
        voucher_id: ObjectId,
    ) -> Result<(), LoyaltyError> {
        self.vouchers()
            .update_one(
                doc! { "_id": voucher_id, "user_id": user_id },
                doc! { "$set": { "is_used": false }, "$unset": { "used_at": "" } },
            )
            .await
            .map_err(|e| LoyaltyError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
