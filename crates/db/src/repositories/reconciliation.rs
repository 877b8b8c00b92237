//! Payment reconciliation repository.
//!
//! Confirmation is the one place where four rows change together: the
//! payment, its invoice, a receipt and a ledger credit. All of it runs in a
//! single transaction with the payment and invoice rows locked, so a
//! repeated or concurrent confirm either sees the confirmed payment and
//! backs off, or trips a unique key and is reported as already confirmed.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};

use rentflow_core::access::Actor;
use rentflow_core::invoice::InvoiceAction;
use rentflow_core::payment::{
    ConfirmationPlan, ConfirmationSource, FailurePlan, PaymentError, PaymentReconciler,
    PaymentStatus, SubmitPaymentInput,
};
use rentflow_core::webhook::{NormalizedEvent, PaymentRef, ProviderStatus, WebhookError};
use rentflow_shared::types::{InvoiceId, PaymentId, ProviderEventId, ReceiptId, UserId};

use super::ledger::LedgerRepository;
use super::snapshot::{invoice_snapshot, payment_snapshot};
use crate::entities::sea_orm_active_enums::{
    InvoiceStatus as DbInvoiceStatus, PaymentStatus as DbPaymentStatus,
};
use crate::entities::{invoices, ledger_entries, payments, provider_events, receipts};

/// Failure reason recorded when a provider reports a failure without one.
const DEFAULT_PROVIDER_FAILURE: &str = "Payment failed at provider";

fn db_err(e: DbErr) -> PaymentError {
    PaymentError::Database(e.to_string())
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// A payment with its receipt, once confirmed.
#[derive(Debug, Clone)]
pub struct PaymentDetails {
    /// Payment row.
    pub payment: payments::Model,
    /// Receipt row, present for confirmed payments.
    pub receipt: Option<receipts::Model>,
}

/// Result of a confirmation request.
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// This call confirmed the payment.
    Applied {
        /// Confirmed payment.
        payment: payments::Model,
        /// Settled invoice.
        invoice: invoices::Model,
        /// Stamped receipt.
        receipt: receipts::Model,
        /// Landlord credit.
        entry: ledger_entries::Model,
    },
    /// The payment was confirmed earlier.
    AlreadyConfirmed {
        /// Payment as stored.
        payment: payments::Model,
    },
    /// Another payment settled the invoice; this one stays submitted.
    AlreadyPaid {
        /// Payment as stored.
        payment: payments::Model,
    },
}

impl ConfirmOutcome {
    /// The payment the outcome refers to.
    #[must_use]
    pub const fn payment(&self) -> &payments::Model {
        match self {
            Self::Applied { payment, .. }
            | Self::AlreadyConfirmed { payment }
            | Self::AlreadyPaid { payment } => payment,
        }
    }

    /// Returns true when this call changed anything.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Short label for responses and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::AlreadyConfirmed { .. } => "already_confirmed",
            Self::AlreadyPaid { .. } => "already_paid",
        }
    }
}

/// Result of a failure request.
#[derive(Debug, Clone)]
pub struct FailOutcome {
    /// Payment as stored after the call.
    pub payment: payments::Model,
    /// False when the payment had already failed.
    pub applied: bool,
}

/// Result of applying one provider event.
#[derive(Debug, Clone)]
pub enum ProviderEventOutcome {
    /// `(provider, event_id)` was seen before. Nothing changed.
    Duplicate,
    /// A non-final status was recorded against the payment.
    Recorded {
        /// Referenced payment.
        payment_id: PaymentId,
        /// Reported status.
        status: ProviderStatus,
    },
    /// The event ran the confirm path.
    Confirmed(ConfirmOutcome),
    /// The event ran the fail path.
    Failed(FailOutcome),
    /// The event contradicts the payment's state and was recorded only.
    Ignored {
        /// Referenced payment.
        payment_id: PaymentId,
        /// Why it was not applied.
        reason: String,
    },
}

impl ProviderEventOutcome {
    /// Returns true when the event changed a payment.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        match self {
            Self::Confirmed(outcome) => outcome.is_applied(),
            Self::Failed(outcome) => outcome.applied,
            Self::Duplicate | Self::Recorded { .. } | Self::Ignored { .. } => false,
        }
    }
}

enum ConfirmFailure {
    Domain(PaymentError),
    Conflict(String),
}

impl From<PaymentError> for ConfirmFailure {
    fn from(e: PaymentError) -> Self {
        Self::Domain(e)
    }
}

fn write_err(e: DbErr) -> ConfirmFailure {
    if is_unique_violation(&e) {
        ConfirmFailure::Conflict(e.to_string())
    } else {
        ConfirmFailure::Domain(db_err(e))
    }
}

/// Payment reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a tenant's payment against an invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is missing, the actor is not its
    /// tenant, the currency or amount does not match, the invoice is not
    /// payable, or the reference is invalid. No row is written on error.
    pub async fn submit_payment(
        &self,
        actor: &Actor,
        input: SubmitPaymentInput,
    ) -> Result<payments::Model, PaymentError> {
        if actor.id != input.payer_id {
            return Err(PaymentError::Forbidden {
                payer_id: actor.id,
                invoice_id: input.invoice_id,
            });
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let payment = submit_in(&txn, &input, None).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            payment_id = %payment.id,
            invoice_id = %input.invoice_id,
            payer_id = %input.payer_id,
            amount = %input.amount,
            "Payment submitted"
        );
        Ok(payment)
    }

    /// Confirms a submitted payment on behalf of a staff member.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff, the payment is missing
    /// or failed, or the invoice cannot be settled.
    pub async fn confirm_payment(
        &self,
        actor: &Actor,
        payment_id: PaymentId,
    ) -> Result<ConfirmOutcome, PaymentError> {
        actor.require_staff("confirm payments")?;

        let txn = self.db.begin().await.map_err(db_err)?;
        match confirm_in(&txn, payment_id, ConfirmationSource::Staff, Some(actor.id)).await {
            Ok(outcome) => {
                txn.commit().await.map_err(db_err)?;
                log_confirmation(&outcome, &ConfirmationSource::Staff);
                Ok(outcome)
            }
            Err(ConfirmFailure::Domain(e)) => Err(e),
            Err(ConfirmFailure::Conflict(detail)) => {
                txn.rollback().await.map_err(db_err)?;
                self.resolve_conflict(payment_id, detail).await
            }
        }
    }

    /// A concurrent confirm won the race on a unique key. If the payment is
    /// now confirmed, this call becomes a no-op.
    async fn resolve_conflict(
        &self,
        payment_id: PaymentId,
        detail: String,
    ) -> Result<ConfirmOutcome, PaymentError> {
        let payment = payments::Entity::find_by_id(payment_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;
        if payment.status == DbPaymentStatus::Confirmed {
            tracing::debug!(%payment_id, "Confirm lost a race; payment already confirmed");
            Ok(ConfirmOutcome::AlreadyConfirmed { payment })
        } else {
            tracing::error!(%payment_id, %detail, "Unique violation while confirming payment");
            Err(PaymentError::Database(detail))
        }
    }

    /// Marks a submitted payment failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not staff, the reason is blank, the
    /// payment is missing, or it is already confirmed.
    pub async fn fail_payment(
        &self,
        actor: &Actor,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<FailOutcome, PaymentError> {
        actor.require_staff("fail payments")?;

        let txn = self.db.begin().await.map_err(db_err)?;
        let outcome = fail_in(&txn, payment_id, reason).await?;
        txn.commit().await.map_err(db_err)?;

        if outcome.applied {
            tracing::info!(%payment_id, failed_by = %actor.id, "Payment failed");
        } else {
            tracing::debug!(%payment_id, "Payment already failed");
        }
        Ok(outcome)
    }

    /// Finds a payment with its receipt.
    ///
    /// Payments are visible to the payer, the invoice's landlord and staff;
    /// anyone else gets `PaymentNotFound`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is missing or not visible.
    pub async fn find_details(
        &self,
        actor: &Actor,
        payment_id: PaymentId,
    ) -> Result<PaymentDetails, PaymentError> {
        let (payment, invoice) = payments::Entity::find_by_id(payment_id.into_inner())
            .find_also_related(invoices::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(PaymentError::PaymentNotFound(payment_id))?;

        let mut parties: Vec<UserId> = vec![payment.payer_id.into()];
        if let Some(invoice) = &invoice {
            parties.push(invoice.landlord_id.into());
        }
        if !actor.can_view(&parties) {
            return Err(PaymentError::PaymentNotFound(payment_id));
        }

        let receipt = receipts::Entity::find()
            .filter(receipts::Column::PaymentId.eq(payment.id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(PaymentDetails { payment, receipt })
    }

    /// Applies one verified, normalized provider event.
    ///
    /// # Errors
    ///
    /// Returns an error if the referenced payment is missing, an external
    /// payment fails submission checks, or the store fails. Nothing is
    /// recorded on error, so the provider's retry is processed afresh.
    pub async fn apply_provider_event(
        &self,
        event: &NormalizedEvent,
    ) -> Result<ProviderEventOutcome, WebhookError> {
        let txn = self.db.begin().await.map_err(webhook_db_err)?;

        let event_row_id = ProviderEventId::new();
        let inserted = provider_events::Entity::insert(provider_events::ActiveModel {
            id: Set(event_row_id.into()),
            provider: Set(event.provider.clone()),
            event_id: Set(event.event_id.clone()),
            event_type: Set(event.event_type.clone()),
            status: Set(event.status.into()),
            payment_id: Set(None),
            received_at: Set(Utc::now().into()),
        })
        .on_conflict(
            OnConflict::columns([
                provider_events::Column::Provider,
                provider_events::Column::EventId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(webhook_db_err)?;

        if inserted == 0 {
            tracing::debug!(
                provider = %event.provider,
                event_id = %event.event_id,
                "Duplicate provider event"
            );
            return Ok(ProviderEventOutcome::Duplicate);
        }

        let payment_id = resolve_payment(&txn, event).await?;
        provider_events::Entity::update_many()
            .col_expr(
                provider_events::Column::PaymentId,
                Expr::value(payment_id.into_inner()),
            )
            .filter(provider_events::Column::Id.eq(event_row_id.into_inner()))
            .exec(&txn)
            .await
            .map_err(webhook_db_err)?;

        let outcome = match event.status {
            ProviderStatus::Succeeded => {
                let source = ConfirmationSource::Provider(event.provider.clone());
                match confirm_in(&txn, payment_id, source.clone(), None).await {
                    Ok(outcome) => {
                        log_confirmation(&outcome, &source);
                        ProviderEventOutcome::Confirmed(outcome)
                    }
                    Err(ConfirmFailure::Domain(
                        e @ (PaymentError::NotSubmitted { .. }
                        | PaymentError::InvalidTransition { .. }),
                    )) => ProviderEventOutcome::Ignored {
                        payment_id,
                        reason: e.to_string(),
                    },
                    Err(ConfirmFailure::Domain(e)) => return Err(e.into()),
                    Err(ConfirmFailure::Conflict(detail)) => {
                        return Err(WebhookError::Database(detail));
                    }
                }
            }
            ProviderStatus::Failed => {
                let reason = event
                    .failure_reason
                    .as_deref()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or(DEFAULT_PROVIDER_FAILURE);
                match fail_in(&txn, payment_id, reason).await {
                    Ok(outcome) => ProviderEventOutcome::Failed(outcome),
                    Err(e @ PaymentError::InvalidTransition { .. }) => {
                        ProviderEventOutcome::Ignored {
                            payment_id,
                            reason: e.to_string(),
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            ProviderStatus::RequiresAction | ProviderStatus::Pending => {
                ProviderEventOutcome::Recorded {
                    payment_id,
                    status: event.status,
                }
            }
        };

        txn.commit().await.map_err(webhook_db_err)?;

        tracing::info!(
            provider = %event.provider,
            event_id = %event.event_id,
            %payment_id,
            status = %event.status,
            applied = outcome.is_applied(),
            "Provider event applied"
        );
        Ok(outcome)
    }
}

fn webhook_db_err(e: DbErr) -> WebhookError {
    WebhookError::Database(e.to_string())
}

fn log_confirmation(outcome: &ConfirmOutcome, source: &ConfirmationSource) {
    let payment = outcome.payment();
    match outcome {
        ConfirmOutcome::Applied { entry, .. } => tracing::info!(
            payment_id = %payment.id,
            invoice_id = %payment.invoice_id,
            %source,
            ledger_entry_id = %entry.id,
            "Payment confirmed"
        ),
        ConfirmOutcome::AlreadyConfirmed { .. } | ConfirmOutcome::AlreadyPaid { .. } => {
            tracing::debug!(
                payment_id = %payment.id,
                invoice_id = %payment.invoice_id,
                outcome = outcome.label(),
                "Confirmation was a no-op"
            );
        }
    }
}

async fn lock_invoice<C: ConnectionTrait>(
    conn: &C,
    invoice_id: InvoiceId,
) -> Result<invoices::Model, PaymentError> {
    invoices::Entity::find_by_id(invoice_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(PaymentError::InvoiceNotFound(invoice_id))
}

async fn lock_payment<C: ConnectionTrait>(
    conn: &C,
    payment_id: PaymentId,
) -> Result<payments::Model, PaymentError> {
    payments::Entity::find_by_id(payment_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(PaymentError::PaymentNotFound(payment_id))
}

async fn reload_payment<C: ConnectionTrait>(
    conn: &C,
    payment_id: PaymentId,
) -> Result<payments::Model, PaymentError> {
    payments::Entity::find_by_id(payment_id.into_inner())
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(PaymentError::PaymentNotFound(payment_id))
}

/// Validates and inserts a submitted payment. `external` carries the
/// provider name and external id for provider-created payments.
async fn submit_in<C: ConnectionTrait>(
    conn: &C,
    input: &SubmitPaymentInput,
    external: Option<(&str, &str)>,
) -> Result<payments::Model, PaymentError> {
    let invoice = lock_invoice(conn, input.invoice_id).await?;
    let snapshot = invoice_snapshot(&invoice).map_err(PaymentError::Database)?;
    let reference = PaymentReconciler::validate_submission(&snapshot, input)?;

    let now = Utc::now().into();
    payments::ActiveModel {
        id: Set(PaymentId::new().into()),
        invoice_id: Set(invoice.id),
        payer_id: Set(input.payer_id.into()),
        amount_minor: Set(input.amount.amount_minor),
        currency: Set(input.amount.currency.code().to_string()),
        status: Set(DbPaymentStatus::Submitted),
        reference: Set(reference),
        provider: Set(external.map(|(provider, _)| provider.to_string())),
        external_id: Set(external.map(|(_, external_id)| external_id.to_string())),
        confirmed_at: Set(None),
        confirmed_by: Set(None),
        confirmation_source: Set(None),
        failed_at: Set(None),
        failure_reason: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .map_err(db_err)
}

async fn confirm_in<C: ConnectionTrait>(
    conn: &C,
    payment_id: PaymentId,
    source: ConfirmationSource,
    confirmed_by: Option<UserId>,
) -> Result<ConfirmOutcome, ConfirmFailure> {
    let payment = lock_payment(conn, payment_id).await?;
    match PaymentStatus::from(payment.status) {
        PaymentStatus::Confirmed => return Ok(ConfirmOutcome::AlreadyConfirmed { payment }),
        status @ PaymentStatus::Failed => {
            return Err(PaymentError::NotSubmitted { status }.into());
        }
        PaymentStatus::Submitted => {}
    }

    let invoice = lock_invoice(conn, payment.invoice_id.into()).await?;
    let payment_view = payment_snapshot(&payment).map_err(PaymentError::Database)?;
    let invoice_view = invoice_snapshot(&invoice).map_err(PaymentError::Database)?;

    let effects =
        match PaymentReconciler::plan_confirmation(&payment_view, &invoice_view, source, confirmed_by)? {
            ConfirmationPlan::AlreadyConfirmed => {
                return Ok(ConfirmOutcome::AlreadyConfirmed { payment });
            }
            ConfirmationPlan::AlreadyPaid => return Ok(ConfirmOutcome::AlreadyPaid { payment }),
            ConfirmationPlan::Apply(effects) => effects,
        };

    let confirmed_at = effects.confirmed_at;
    let updated = payments::Entity::update_many()
        .col_expr(
            payments::Column::Status,
            Expr::value(DbPaymentStatus::Confirmed),
        )
        .col_expr(payments::Column::ConfirmedAt, Expr::value(confirmed_at))
        .col_expr(
            payments::Column::ConfirmedBy,
            Expr::value(effects.confirmed_by.map(UserId::into_inner)),
        )
        .col_expr(
            payments::Column::ConfirmationSource,
            Expr::value(effects.source.to_stored()),
        )
        .col_expr(payments::Column::UpdatedAt, Expr::value(confirmed_at))
        .filter(payments::Column::Id.eq(payment.id))
        .filter(payments::Column::Status.eq(DbPaymentStatus::Submitted))
        .exec(conn)
        .await
        .map_err(write_err)?;
    if updated.rows_affected == 0 {
        return Err(ConfirmFailure::Conflict(format!(
            "payment {payment_id} left submitted state during confirmation"
        )));
    }

    let paid_at = match &effects.invoice_action {
        InvoiceAction::MarkPaid { paid_at, .. } => *paid_at,
        _ => confirmed_at,
    };
    let updated = invoices::Entity::update_many()
        .col_expr(
            invoices::Column::Status,
            Expr::value(DbInvoiceStatus::from(effects.invoice_action.new_status())),
        )
        .col_expr(invoices::Column::PaidAt, Expr::value(paid_at))
        .col_expr(invoices::Column::UpdatedAt, Expr::value(paid_at))
        .filter(invoices::Column::Id.eq(invoice.id))
        .filter(invoices::Column::Status.eq(invoice.status))
        .exec(conn)
        .await
        .map_err(write_err)?;
    if updated.rows_affected == 0 {
        return Err(ConfirmFailure::Conflict(format!(
            "invoice {} changed during confirmation",
            invoice.id
        )));
    }

    let receipt = receipts::ActiveModel {
        id: Set(ReceiptId::new().into()),
        payment_id: Set(effects.receipt.payment_id.into()),
        invoice_id: Set(effects.receipt.invoice_id.into()),
        amount_minor: Set(effects.receipt.amount.amount_minor),
        currency: Set(effects.receipt.amount.currency.code().to_string()),
        issued_at: Set(effects.receipt.issued_at.into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(write_err)?;

    let entry = LedgerRepository::append_entry_in(conn, &effects.credit)
        .await
        .map_err(PaymentError::from)?;

    let payment = reload_payment(conn, payment_id).await?;
    let invoice = invoices::Entity::find_by_id(invoice.id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(PaymentError::InvoiceNotFound(payment.invoice_id.into()))?;

    Ok(ConfirmOutcome::Applied {
        payment,
        invoice,
        receipt,
        entry,
    })
}

async fn fail_in<C: ConnectionTrait>(
    conn: &C,
    payment_id: PaymentId,
    reason: &str,
) -> Result<FailOutcome, PaymentError> {
    let payment = lock_payment(conn, payment_id).await?;
    let (failed_at, reason) = match PaymentReconciler::plan_failure(payment.status.into(), reason)? {
        FailurePlan::AlreadyFailed => {
            return Ok(FailOutcome {
                payment,
                applied: false,
            });
        }
        FailurePlan::Apply { failed_at, reason } => (failed_at, reason),
    };

    let updated = payments::Entity::update_many()
        .col_expr(payments::Column::Status, Expr::value(DbPaymentStatus::Failed))
        .col_expr(payments::Column::FailedAt, Expr::value(failed_at))
        .col_expr(payments::Column::FailureReason, Expr::value(reason))
        .col_expr(payments::Column::UpdatedAt, Expr::value(failed_at))
        .filter(payments::Column::Id.eq(payment.id))
        .filter(payments::Column::Status.eq(DbPaymentStatus::Submitted))
        .exec(conn)
        .await
        .map_err(db_err)?;
    if updated.rows_affected == 0 {
        return Err(PaymentError::InvalidTransition {
            from: payment.status.into(),
            to: PaymentStatus::Failed,
        });
    }

    Ok(FailOutcome {
        payment: reload_payment(conn, payment_id).await?,
        applied: true,
    })
}

/// Finds the payment an event refers to, creating external payments on
/// first sight.
async fn resolve_payment<C: ConnectionTrait>(
    conn: &C,
    event: &NormalizedEvent,
) -> Result<PaymentId, WebhookError> {
    match &event.payment_ref {
        PaymentRef::Known(payment_id) => {
            let exists = payments::Entity::find_by_id(payment_id.into_inner())
                .one(conn)
                .await
                .map_err(webhook_db_err)?
                .is_some();
            if exists {
                Ok(*payment_id)
            } else {
                Err(PaymentError::PaymentNotFound(*payment_id).into())
            }
        }
        PaymentRef::External {
            invoice_id,
            external_id,
            amount,
        } => {
            let existing = payments::Entity::find()
                .filter(payments::Column::Provider.eq(event.provider.as_str()))
                .filter(payments::Column::ExternalId.eq(external_id.as_str()))
                .one(conn)
                .await
                .map_err(webhook_db_err)?;
            if let Some(existing) = existing {
                return Ok(existing.id.into());
            }

            let invoice = invoices::Entity::find_by_id(invoice_id.into_inner())
                .one(conn)
                .await
                .map_err(webhook_db_err)?
                .ok_or(PaymentError::InvoiceNotFound(*invoice_id))?;
            let input = SubmitPaymentInput {
                invoice_id: *invoice_id,
                payer_id: invoice.tenant_id.into(),
                amount: *amount,
                reference: external_id.clone(),
            };
            let payment =
                submit_in(conn, &input, Some((event.provider.as_str(), external_id.as_str())))
                    .await?;
            tracing::info!(
                payment_id = %payment.id,
                %invoice_id,
                provider = %event.provider,
                %external_id,
                "External payment recorded"
            );
            Ok(payment.id.into())
        }
    }
}
