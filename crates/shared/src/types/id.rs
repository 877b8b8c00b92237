//! Typed IDs for the rent-payment domain.
//!
//! A `PaymentId` can never be handed to a function expecting an `InvoiceId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered (UUID v7) identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

typed_id!(UserId, "Identifier of a tenant, landlord or staff user.");
typed_id!(InvoiceId, "Identifier of a rent invoice.");
typed_id!(PaymentId, "Identifier of a tenant payment.");
typed_id!(ReceiptId, "Identifier of a payment receipt.");
typed_id!(LedgerAccountId, "Identifier of a landlord ledger account (one per currency).");
typed_id!(LedgerEntryId, "Identifier of an append-only ledger entry.");
typed_id!(PayoutId, "Identifier of a landlord payout request.");
typed_id!(ProviderEventId, "Identifier of a recorded payment-provider webhook event.");
