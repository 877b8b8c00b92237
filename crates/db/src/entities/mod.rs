//! `SeaORM` entities.

pub mod invoices;
pub mod ledger_accounts;
pub mod ledger_entries;
pub mod payments;
pub mod payouts;
pub mod provider_events;
pub mod receipts;
pub mod sea_orm_active_enums;
pub mod users;
