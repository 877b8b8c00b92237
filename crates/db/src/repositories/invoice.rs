//! Invoice repository for database operations.
//!
//! Every transition locks the invoice row, asks [`InvoiceStateMachine`]
//! for the action and writes it with an update guarded on the status the
//! action was planned against.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use rentflow_core::access::{Actor, Role};
use rentflow_core::invoice::{
    InvoiceAction, InvoiceError, InvoiceNumber, InvoiceStateMachine, InvoiceStatus, NewInvoice,
};
use rentflow_shared::types::{InvoiceId, PageRequest, PageResponse, UserId};

use crate::entities::sea_orm_active_enums::InvoiceStatus as DbInvoiceStatus;
use crate::entities::{invoices, users};

/// Attempts at finding a free invoice number before giving up.
pub const MAX_NUMBER_ATTEMPTS: u32 = 5;

fn db_err(e: DbErr) -> InvoiceError {
    InvoiceError::Database(e.to_string())
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Only invoices in this status.
    pub status: Option<InvoiceStatus>,
    /// Only invoices of this landlord (staff only).
    pub landlord_id: Option<UserId>,
    /// Only invoices billed to this tenant.
    pub tenant_id: Option<UserId>,
}

enum IssueFailure {
    NumberTaken(String),
    Invoice(InvoiceError),
}

impl From<InvoiceError> for IssueFailure {
    fn from(e: InvoiceError) -> Self {
        Self::Invoice(e)
    }
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft invoice.
    ///
    /// Landlords create invoices for themselves; staff for any landlord.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The actor may not create the invoice
    /// - The input is invalid (negative amount, self-billing)
    /// - Either party does not exist with the expected role
    /// - Database operation fails
    pub async fn create_draft(
        &self,
        actor: &Actor,
        input: NewInvoice,
    ) -> Result<invoices::Model, InvoiceError> {
        actor.require_role(&[Role::Landlord, Role::Staff], "create invoices")?;
        actor.require_owner_or_staff(input.landlord_id, "invoice")?;
        InvoiceStateMachine::validate_new_invoice(&input)?;

        self.require_party(input.landlord_id, Role::Landlord).await?;
        self.require_party(input.tenant_id, Role::Tenant).await?;

        let now = Utc::now().into();
        let model = invoices::ActiveModel {
            id: Set(InvoiceId::new().into()),
            landlord_id: Set(input.landlord_id.into()),
            tenant_id: Set(input.tenant_id.into()),
            number: Set(None),
            amount_minor: Set(input.amount.amount_minor),
            currency: Set(input.amount.currency.code().to_string()),
            status: Set(DbInvoiceStatus::Draft),
            description: Set(input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())),
            due_date: Set(input.due_date),
            issued_at: Set(None),
            paid_at: Set(None),
            voided_at: Set(None),
            voided_by: Set(None),
            void_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;

        tracing::info!(
            invoice_id = %model.id,
            landlord_id = %input.landlord_id,
            tenant_id = %input.tenant_id,
            amount = %input.amount,
            "Draft invoice created"
        );
        Ok(model)
    }

    async fn require_party(&self, user_id: UserId, expected: Role) -> Result<(), InvoiceError> {
        let user = users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        match user {
            Some(user) if Role::from(user.role) == expected => Ok(()),
            _ => Err(InvoiceError::InvalidParty { user_id, expected }),
        }
    }

    /// Finds an invoice by id without access checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find(&self, id: InvoiceId) -> Result<Option<invoices::Model>, InvoiceError> {
        invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds an invoice the actor may see.
    ///
    /// Invoices the actor is not a party to are reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the invoice does not exist or is not visible.
    pub async fn find_visible(
        &self,
        actor: &Actor,
        id: InvoiceId,
    ) -> Result<invoices::Model, InvoiceError> {
        let model = self.find(id).await?.ok_or(InvoiceError::NotFound(id))?;
        if !is_visible(actor, &model) {
            return Err(InvoiceError::NotFound(id));
        }
        Ok(model)
    }

    /// Lists invoices visible to the actor, newest first.
    ///
    /// Landlords only see their own invoices and tenants only the
    /// non-draft invoices billed to them, whatever the filter asks for.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: InvoiceFilter,
        page: PageRequest,
    ) -> Result<PageResponse<invoices::Model>, InvoiceError> {
        let mut query = invoices::Entity::find();

        match actor.role {
            Role::Staff => {
                if let Some(landlord_id) = filter.landlord_id {
                    query = query.filter(invoices::Column::LandlordId.eq(landlord_id.into_inner()));
                }
                if let Some(tenant_id) = filter.tenant_id {
                    query = query.filter(invoices::Column::TenantId.eq(tenant_id.into_inner()));
                }
            }
            Role::Landlord => {
                query = query.filter(invoices::Column::LandlordId.eq(actor.id.into_inner()));
                if let Some(tenant_id) = filter.tenant_id {
                    query = query.filter(invoices::Column::TenantId.eq(tenant_id.into_inner()));
                }
            }
            Role::Tenant => {
                query = query
                    .filter(invoices::Column::TenantId.eq(actor.id.into_inner()))
                    .filter(invoices::Column::Status.ne(DbInvoiceStatus::Draft));
            }
        }

        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(DbInvoiceStatus::from(status)));
        }

        let paginator = query
            .order_by_desc(invoices::Column::CreatedAt)
            .order_by_desc(invoices::Column::Id)
            .paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(page.page_index())
            .await
            .map_err(db_err)?;
        Ok(PageResponse::new(data, page, total))
    }

    /// Issues a draft invoice under a freshly generated number.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is not a visible draft owned by the
    /// actor, or no free number is found.
    pub async fn issue(&self, actor: &Actor, id: InvoiceId) -> Result<invoices::Model, InvoiceError> {
        self.issue_with_numbers(actor, id, || {
            InvoiceNumber::generate(Utc::now().date_naive())
        })
        .await
    }

    /// Issues a draft invoice, drawing candidate numbers from `next_number`.
    ///
    /// A number collision rolls the attempt back and draws again, up to
    /// [`MAX_NUMBER_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Same as [`Self::issue`].
    pub async fn issue_with_numbers<F>(
        &self,
        actor: &Actor,
        id: InvoiceId,
        mut next_number: F,
    ) -> Result<invoices::Model, InvoiceError>
    where
        F: FnMut() -> InvoiceNumber + Send,
    {
        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            match self.try_issue(actor, id, next_number()).await {
                Ok(model) => {
                    tracing::info!(
                        invoice_id = %id,
                        number = model.number.as_deref().unwrap_or_default(),
                        attempt,
                        "Invoice issued"
                    );
                    return Ok(model);
                }
                Err(IssueFailure::NumberTaken(number)) => {
                    tracing::warn!(invoice_id = %id, %number, attempt, "Invoice number taken, retrying");
                }
                Err(IssueFailure::Invoice(e)) => return Err(e),
            }
        }
        Err(InvoiceError::NumberExhausted {
            attempts: MAX_NUMBER_ATTEMPTS,
        })
    }

    async fn try_issue(
        &self,
        actor: &Actor,
        id: InvoiceId,
        number: InvoiceNumber,
    ) -> Result<invoices::Model, IssueFailure> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let invoice = lock_visible(&txn, actor, id).await?;
        actor
            .require_owner_or_staff(invoice.landlord_id.into(), "invoice")
            .map_err(InvoiceError::from)?;

        let current: InvoiceStatus = invoice.status.into();
        let InvoiceAction::Issue {
            new_status,
            number,
            issued_at,
        } = InvoiceStateMachine::issue(current, invoice.number.as_deref(), number)?
        else {
            return Err(IssueFailure::Invoice(InvoiceError::Database(
                "state machine returned a non-issue action".into(),
            )));
        };

        let result = invoices::Entity::update_many()
            .col_expr(
                invoices::Column::Status,
                Expr::value(DbInvoiceStatus::from(new_status)),
            )
            .col_expr(invoices::Column::Number, Expr::value(number.as_str()))
            .col_expr(invoices::Column::IssuedAt, Expr::value(issued_at))
            .col_expr(invoices::Column::UpdatedAt, Expr::value(issued_at))
            .filter(invoices::Column::Id.eq(invoice.id))
            .filter(invoices::Column::Status.eq(DbInvoiceStatus::Draft))
            .exec(&txn)
            .await;

        let result = match result {
            Ok(result) => result,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(IssueFailure::NumberTaken(number.into_string()));
            }
            Err(e) => return Err(db_err(e).into()),
        };
        if result.rows_affected == 0 {
            return Err(InvoiceError::InvalidTransition {
                from: current,
                to: InvoiceStatus::Issued,
            }
            .into());
        }

        let updated = reload(&txn, id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Voids a non-terminal invoice.
    ///
    /// # Errors
    ///
    /// Returns an error if the invoice is not visible, the actor is neither
    /// its landlord nor staff, the reason is blank, or the invoice is paid
    /// or already void.
    pub async fn void(
        &self,
        actor: &Actor,
        id: InvoiceId,
        reason: &str,
    ) -> Result<invoices::Model, InvoiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let invoice = lock_visible(&txn, actor, id).await?;
        actor.require_owner_or_staff(invoice.landlord_id.into(), "invoice")?;

        let current: InvoiceStatus = invoice.status.into();
        let InvoiceAction::Void {
            new_status,
            voided_by,
            voided_at,
            reason,
        } = InvoiceStateMachine::void(current, actor.id, reason)?
        else {
            return Err(InvoiceError::Database(
                "state machine returned a non-void action".into(),
            ));
        };

        let result = invoices::Entity::update_many()
            .col_expr(
                invoices::Column::Status,
                Expr::value(DbInvoiceStatus::from(new_status)),
            )
            .col_expr(invoices::Column::VoidedAt, Expr::value(voided_at))
            .col_expr(invoices::Column::VoidedBy, Expr::value(voided_by.into_inner()))
            .col_expr(invoices::Column::VoidReason, Expr::value(reason.clone()))
            .col_expr(invoices::Column::UpdatedAt, Expr::value(voided_at))
            .filter(invoices::Column::Id.eq(invoice.id))
            .filter(invoices::Column::Status.eq(invoice.status))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(InvoiceError::InvalidTransition {
                from: current,
                to: InvoiceStatus::Void,
            });
        }

        let updated = reload(&txn, id).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(invoice_id = %id, voided_by = %actor.id, %reason, "Invoice voided");
        Ok(updated)
    }
}

fn is_visible(actor: &Actor, model: &invoices::Model) -> bool {
    let parties = [model.landlord_id.into(), model.tenant_id.into()];
    if !actor.can_view(&parties) {
        return false;
    }
    !(actor.role == Role::Tenant && model.status == DbInvoiceStatus::Draft)
}

async fn lock_visible(
    txn: &DatabaseTransaction,
    actor: &Actor,
    id: InvoiceId,
) -> Result<invoices::Model, InvoiceError> {
    let invoice = invoices::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(InvoiceError::NotFound(id))?;
    if !is_visible(actor, &invoice) {
        return Err(InvoiceError::NotFound(id));
    }
    Ok(invoice)
}

async fn reload(txn: &DatabaseTransaction, id: InvoiceId) -> Result<invoices::Model, InvoiceError> {
    invoices::Entity::find_by_id(id.into_inner())
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or(InvoiceError::NotFound(id))
}
