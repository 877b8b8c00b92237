//! String-backed enums stored in text columns.
//!
//! Each enum mirrors a status type in `rentflow-core`; the `From` impls
//! are the only place the two vocabularies meet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use rentflow_core::access::Role;
use rentflow_core::invoice::InvoiceStatus as CoreInvoiceStatus;
use rentflow_core::ledger::{EntrySource as CoreEntrySource, EntryType as CoreEntryType};
use rentflow_core::payment::PaymentStatus as CorePaymentStatus;
use rentflow_core::payout::PayoutStatus as CorePayoutStatus;
use rentflow_core::webhook::ProviderStatus;

/// Stored user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserRole {
    /// Tenant.
    #[sea_orm(string_value = "tenant")]
    Tenant,
    /// Landlord.
    #[sea_orm(string_value = "landlord")]
    Landlord,
    /// Staff.
    #[sea_orm(string_value = "staff")]
    Staff,
}

/// Stored invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum InvoiceStatus {
    /// Draft.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Issued.
    #[sea_orm(string_value = "issued")]
    Issued,
    /// Paid.
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Overdue.
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// Void.
    #[sea_orm(string_value = "void")]
    Void,
}

/// Stored payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentStatus {
    /// Submitted.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Confirmed.
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Stored ledger entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum EntryType {
    /// Credit.
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Debit.
    #[sea_orm(string_value = "debit")]
    Debit,
}

/// Stored ledger entry source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum EntrySource {
    /// Payment.
    #[sea_orm(string_value = "payment")]
    Payment,
    /// Payout.
    #[sea_orm(string_value = "payout")]
    Payout,
}

/// Stored payout status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PayoutStatus {
    /// Pending.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Denied.
    #[sea_orm(string_value = "denied")]
    Denied,
}

/// Stored provider event status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ProviderEventStatus {
    /// Succeeded.
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    /// Failed.
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Requires action.
    #[sea_orm(string_value = "requires_action")]
    RequiresAction,
    /// Pending.
    #[sea_orm(string_value = "pending")]
    Pending,
}

macro_rules! mirror_enum {
    ($db:ident, $core:ident, { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $($core::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(UserRole, Role, { Tenant, Landlord, Staff });
mirror_enum!(InvoiceStatus, CoreInvoiceStatus, { Draft, Issued, Paid, Overdue, Void });
mirror_enum!(PaymentStatus, CorePaymentStatus, { Submitted, Confirmed, Failed });
mirror_enum!(EntryType, CoreEntryType, { Credit, Debit });
mirror_enum!(EntrySource, CoreEntrySource, { Payment, Payout });
mirror_enum!(PayoutStatus, CorePayoutStatus, { Pending, Approved, Denied });
mirror_enum!(ProviderEventStatus, ProviderStatus, { Succeeded, Failed, RequiresAction, Pending });

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn test_invoice_status_mirrors_core() {
        for status in InvoiceStatus::iter() {
            let core: CoreInvoiceStatus = status.into();
            assert_eq!(InvoiceStatus::from(core), status);
            assert_eq!(status.to_value(), core.as_str());
        }
    }

    #[test]
    fn test_payment_and_payout_values() {
        for status in PaymentStatus::iter() {
            assert_eq!(status.to_value(), CorePaymentStatus::from(status).as_str());
        }
        for status in PayoutStatus::iter() {
            assert_eq!(status.to_value(), CorePayoutStatus::from(status).as_str());
        }
        for status in ProviderEventStatus::iter() {
            assert_eq!(status.to_value(), ProviderStatus::from(status).as_str());
        }
    }
}
