//! `SeaORM` Entity for ledger_entries table. Append-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntrySource, EntryType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_account_id: Uuid,
    pub landlord_id: Uuid,
    pub currency: String,
    pub entry_type: EntryType,
    pub amount_minor: i64,
    pub source: EntrySource,
    #[sea_orm(unique)]
    pub payment_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub payout_id: Option<Uuid>,
    pub account_version: i64,
    pub previous_balance_minor: i64,
    pub current_balance_minor: i64,
    pub memo: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledger_accounts::Entity",
        from = "Column::LedgerAccountId",
        to = "super::ledger_accounts::Column::Id"
    )]
    LedgerAccounts,
}

impl Related<super::ledger_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
