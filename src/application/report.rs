use crate::domain::ports::TransactionRepository;
use crate::domain::transaction::TransactionStatus;
use crate::error::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Sums the amounts of `processed` transactions per user.
pub async fn sum_by_user(repository: &dyn TransactionRepository) -> Result<BTreeMap<Uuid, Decimal>> {
    let mut totals = BTreeMap::new();
    for tx in repository.list().await? {
        if tx.status == TransactionStatus::Processed {
            *totals.entry(tx.user_id).or_insert(Decimal::ZERO) += tx.amount;
        }
    }
    Ok(totals)
}
