//! Ledger repository.
//!
//! Appends run inside the caller's transaction. Each append locks the
//! (landlord, currency) ledger account row, reads the latest entry and
//! writes the next running balance, so concurrent appends to one account
//! serialize and `account_version` stays gap-free.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use rentflow_core::ledger::{LedgerBalance, LedgerError, LedgerService, NewLedgerEntry, RunningBalance};
use rentflow_shared::types::{Currency, LedgerAccountId, LedgerEntryId, PageRequest, PageResponse, UserId};

use crate::entities::{ledger_accounts, ledger_entries};

fn db_err(e: sea_orm::DbErr) -> LedgerError {
    LedgerError::Database(e.to_string())
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Gets or creates the ledger account and locks it for the rest of the
    /// transaction.
    pub async fn lock_account_in<C: ConnectionTrait>(
        conn: &C,
        landlord_id: UserId,
        currency: Currency,
    ) -> Result<ledger_accounts::Model, LedgerError> {
        let candidate = ledger_accounts::ActiveModel {
            id: Set(LedgerAccountId::new().into()),
            landlord_id: Set(landlord_id.into()),
            currency: Set(currency.code().to_string()),
            created_at: Set(Utc::now().into()),
        };
        ledger_accounts::Entity::insert(candidate)
            .on_conflict(
                OnConflict::columns([
                    ledger_accounts::Column::LandlordId,
                    ledger_accounts::Column::Currency,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(db_err)?;

        ledger_accounts::Entity::find()
            .filter(ledger_accounts::Column::LandlordId.eq(landlord_id.into_inner()))
            .filter(ledger_accounts::Column::Currency.eq(currency.code()))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::Database("ledger account vanished after upsert".into()))
    }

    /// Appends an entry inside the caller's transaction.
    pub async fn append_entry_in<C: ConnectionTrait>(
        conn: &C,
        entry: &NewLedgerEntry,
    ) -> Result<ledger_entries::Model, LedgerError> {
        LedgerService::validate_entry(entry)?;
        let currency = entry.amount.currency;
        let account = Self::lock_account_in(conn, entry.landlord_id, currency).await?;

        let previous = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::LedgerAccountId.eq(account.id))
            .order_by_desc(ledger_entries::Column::AccountVersion)
            .one(conn)
            .await
            .map_err(db_err)?
            .map(|last| RunningBalance {
                account_version: last.account_version,
                previous_balance: last.previous_balance_minor,
                current_balance: last.current_balance_minor,
            });
        let running = LedgerService::next_running_balance(previous.as_ref(), currency, entry)?;

        let model = ledger_entries::ActiveModel {
            id: Set(LedgerEntryId::new().into()),
            ledger_account_id: Set(account.id),
            landlord_id: Set(entry.landlord_id.into()),
            currency: Set(currency.code().to_string()),
            entry_type: Set(entry.entry_type.into()),
            amount_minor: Set(entry.amount.amount_minor),
            source: Set(entry.source.into()),
            payment_id: Set(entry.payment_id.map(Into::into)),
            payout_id: Set(entry.payout_id.map(Into::into)),
            account_version: Set(running.account_version),
            previous_balance_minor: Set(running.previous_balance),
            current_balance_minor: Set(running.current_balance),
            memo: Set(entry.memo.clone()),
            created_at: Set(Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;

        tracing::info!(
            landlord_id = %entry.landlord_id,
            currency = %currency,
            entry_type = %entry.entry_type,
            amount_minor = entry.amount.amount_minor,
            account_version = running.account_version,
            "Ledger entry appended"
        );
        Ok(model)
    }

    /// Folds the balance on any connection, including an open transaction.
    pub async fn balance_in<C: ConnectionTrait>(
        conn: &C,
        landlord_id: UserId,
        currency: Currency,
    ) -> Result<LedgerBalance, LedgerError> {
        let rows = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::LandlordId.eq(landlord_id.into_inner()))
            .filter(ledger_entries::Column::Currency.eq(currency.code()))
            .all(conn)
            .await
            .map_err(db_err)?;
        LedgerBalance::from_entries(
            landlord_id,
            currency,
            rows.into_iter()
                .map(|row| (row.entry_type.into(), row.amount_minor)),
        )
    }

    /// Current balance of a landlord in one currency.
    pub async fn balance(
        &self,
        landlord_id: UserId,
        currency: Currency,
    ) -> Result<LedgerBalance, LedgerError> {
        Self::balance_in(&self.db, landlord_id, currency).await
    }

    /// Entries in insertion order.
    pub async fn entries(
        &self,
        landlord_id: UserId,
        currency: Option<Currency>,
        page: PageRequest,
    ) -> Result<PageResponse<ledger_entries::Model>, LedgerError> {
        let mut query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::LandlordId.eq(landlord_id.into_inner()));
        if let Some(currency) = currency {
            query = query.filter(ledger_entries::Column::Currency.eq(currency.code()));
        }
        let paginator = query
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .order_by_asc(ledger_entries::Column::AccountVersion)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(page.page_index())
            .await
            .map_err(db_err)?;
        Ok(PageResponse::new(data, page, total))
    }
}
