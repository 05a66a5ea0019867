//! # Service Repository
//!
//! Persists service assignments. The charge is read from the catalog inside
//! the completing transaction and frozen onto the row.

use resort_core::{BillingStatus, ServiceAssignment, ServiceStatus, ValidationError};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{OpsError, OpsResult};
use crate::repository::catalog::{fetch_employee, fetch_room, fetch_service};
use crate::repository::{ensure_updated, RepoContext};
use crate::retry::with_retry;

const SELECT_ASSIGNMENT: &str = r#"
    SELECT id, service_id, employee_id, room_id, status, billing_status,
           charge_cents, bill_id, assigned_at, completed_at, updated_at, version
    FROM service_assignments
"#;

/// Repository for service assignments.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    ctx: RepoContext,
}

impl ServiceRepository {
    pub(crate) fn new(ctx: RepoContext) -> Self {
        ServiceRepository { ctx }
    }

    /// Assigns a service to an employee for a room, in `pending`.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown service, employee or room
    /// - `Validation` if the service is inactive
    pub async fn assign(
        &self,
        service_id: &str,
        employee_id: &str,
        room_id: &str,
    ) -> OpsResult<ServiceAssignment> {
        with_retry(&self.ctx.engine, "service.assign", move || {
            self.try_assign(service_id, employee_id, room_id)
        })
        .await
    }

    async fn try_assign(
        &self,
        service_id: &str,
        employee_id: &str,
        room_id: &str,
    ) -> OpsResult<ServiceAssignment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let service = fetch_service(&mut tx, service_id).await?;
        if !service.is_active {
            return Err(ValidationError::Unavailable {
                field: "service".to_string(),
                value: service.id,
            }
            .into());
        }
        fetch_employee(&mut tx, employee_id).await?;
        fetch_room(&mut tx, room_id).await?;

        let assignment = ServiceAssignment::new(service_id, employee_id, room_id, now);

        sqlx::query(
            r#"
            INSERT INTO service_assignments (
                id, service_id, employee_id, room_id, status, billing_status,
                charge_cents, bill_id, assigned_at, completed_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&assignment.id)
        .bind(&assignment.service_id)
        .bind(&assignment.employee_id)
        .bind(&assignment.room_id)
        .bind(assignment.status)
        .bind(assignment.billing_status)
        .bind(assignment.charge_cents)
        .bind(&assignment.bill_id)
        .bind(assignment.assigned_at)
        .bind(assignment.completed_at)
        .bind(assignment.updated_at)
        .bind(assignment.version)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            assignment_id = %assignment.id,
            service = %service.name,
            room_id = %room_id,
            employee_id = %employee_id,
            "Service assigned"
        );

        Ok(assignment)
    }

    /// Moves an assignment along an allowed edge. Completing it freezes the
    /// service's current charge.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown assignment
    /// - `InvalidTransition` for an edge outside
    ///   `pending → in_progress → completed`, `pending|in_progress → cancelled`
    pub async fn transition(&self, id: &str, next: ServiceStatus) -> OpsResult<ServiceAssignment> {
        with_retry(&self.ctx.engine, "service.transition", move || {
            self.try_transition(id, next)
        })
        .await
    }

    async fn try_transition(&self, id: &str, next: ServiceStatus) -> OpsResult<ServiceAssignment> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut assignment = fetch_assignment(&mut tx, id).await?;
        let from = assignment.status;
        let service = fetch_service(&mut tx, &assignment.service_id).await?;

        assignment.transition(next, service.charge(), now)?;
        save_assignment(&mut tx, &mut assignment).await?;

        tx.commit().await?;

        info!(
            assignment_id = %id,
            from = %from,
            to = %next,
            charge_cents = ?assignment.charge_cents,
            "Service assignment transitioned"
        );

        Ok(assignment)
    }

    /// Marks completed assignments as billed outside a checkout.
    ///
    /// Already-billed ids are skipped. Returns how many changed.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `InvalidTransition` if any id is not `completed`; nothing is written
    pub async fn mark_billed(&self, ids: &[String]) -> OpsResult<usize> {
        with_retry(&self.ctx.engine, "service.mark_billed", move || {
            self.try_mark_billed(ids)
        })
        .await
    }

    async fn try_mark_billed(&self, ids: &[String]) -> OpsResult<usize> {
        let now = self.ctx.clock.now();
        let mut tx = self.ctx.pool.begin().await?;

        let mut changed = 0;
        for id in ids {
            let mut assignment = fetch_assignment(&mut tx, id).await?;
            if assignment.billing_status != BillingStatus::Unbilled {
                debug!(assignment_id = %id, "Already billed, skipping");
                continue;
            }
            assignment.mark_billed(None, now)?;
            save_assignment(&mut tx, &mut assignment).await?;
            changed += 1;
        }

        tx.commit().await?;

        info!(requested = ids.len(), changed, "Service assignments billed");
        Ok(changed)
    }

    pub async fn get(&self, id: &str) -> OpsResult<ServiceAssignment> {
        let mut conn = self.ctx.pool.acquire().await?;
        fetch_assignment(&mut conn, id).await
    }

    pub async fn list_by_room(&self, room_id: &str) -> OpsResult<Vec<ServiceAssignment>> {
        let sql = format!("{SELECT_ASSIGNMENT} WHERE room_id = ?1 ORDER BY assigned_at, id");
        let rows = sqlx::query_as::<_, ServiceAssignment>(&sql)
            .bind(room_id)
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_employee(&self, employee_id: &str) -> OpsResult<Vec<ServiceAssignment>> {
        let sql = format!("{SELECT_ASSIGNMENT} WHERE employee_id = ?1 ORDER BY assigned_at, id");
        let rows = sqlx::query_as::<_, ServiceAssignment>(&sql)
            .bind(employee_id)
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

pub(crate) async fn fetch_assignment(
    conn: &mut SqliteConnection,
    id: &str,
) -> OpsResult<ServiceAssignment> {
    let sql = format!("{SELECT_ASSIGNMENT} WHERE id = ?1");
    sqlx::query_as::<_, ServiceAssignment>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| OpsError::not_found("ServiceAssignment", id))
}

/// Unbilled assignments for one room; the stay-window filter is applied by
/// the caller.
pub(crate) async fn fetch_unbilled_for_room(
    conn: &mut SqliteConnection,
    room_id: &str,
) -> OpsResult<Vec<ServiceAssignment>> {
    let sql = format!(
        "{SELECT_ASSIGNMENT} WHERE room_id = ?1 AND billing_status = 'unbilled' ORDER BY assigned_at, id"
    );
    let rows = sqlx::query_as::<_, ServiceAssignment>(&sql)
        .bind(room_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub(crate) async fn save_assignment(
    conn: &mut SqliteConnection,
    assignment: &mut ServiceAssignment,
) -> OpsResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE service_assignments SET
            status = ?1,
            billing_status = ?2,
            charge_cents = ?3,
            bill_id = ?4,
            completed_at = ?5,
            updated_at = ?6,
            version = version + 1
        WHERE id = ?7 AND version = ?8
        "#,
    )
    .bind(assignment.status)
    .bind(assignment.billing_status)
    .bind(assignment.charge_cents)
    .bind(&assignment.bill_id)
    .bind(assignment.completed_at)
    .bind(assignment.updated_at)
    .bind(&assignment.id)
    .bind(assignment.version)
    .execute(&mut *conn)
    .await?;

    ensure_updated(result, "ServiceAssignment", &assignment.id)?;
    assignment.version += 1;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::fixture;
    use resort_core::{BillingStatus, Money};

    #[tokio::test]
    async fn test_assign_starts_pending() {
        let fx = fixture().await;
        let sa = fx
            .db
            .services()
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();

        assert_eq!(sa.status, ServiceStatus::Pending);
        assert_eq!(sa.billing_status, BillingStatus::Unbilled);
        assert_eq!(sa.charge_cents, None);
    }

    #[tokio::test]
    async fn test_assign_rejects_unknown_and_inactive() {
        let fx = fixture().await;
        let services = fx.db.services();

        let err = services
            .assign("missing", &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = services
            .assign(&fx.spa.id, &fx.housekeeper.id, "missing-room")
            .await
            .unwrap_err();
        assert_eq!(err.entity_id(), Some("missing-room"));

        fx.db.catalog().set_service_active(&fx.laundry.id, false).await.unwrap();
        let err = services
            .assign(&fx.laundry.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_completion_freezes_charge_against_price_edits() {
        let fx = fixture().await;
        let services = fx.db.services();
        let sa = services
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();

        services.transition(&sa.id, ServiceStatus::InProgress).await.unwrap();
        let done = services.transition(&sa.id, ServiceStatus::Completed).await.unwrap();
        assert_eq!(done.charge_cents, Some(15_000));

        fx.db
            .catalog()
            .update_service_charge(&fx.spa.id, Money::from_cents(99_000))
            .await
            .unwrap();
        let stored = services.get(&sa.id).await.unwrap();
        assert_eq!(stored.charge(), Money::from_cents(15_000));
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_edges_are_rejected() {
        let fx = fixture().await;
        let services = fx.db.services();
        let sa = services
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();

        let err = services
            .transition(&sa.id, ServiceStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        services.transition(&sa.id, ServiceStatus::Cancelled).await.unwrap();
        let err = services
            .transition(&sa.id, ServiceStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = services.transition("missing", ServiceStatus::InProgress).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_mark_billed_only_completed() {
        let fx = fixture().await;
        let services = fx.db.services();

        let done = services
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();
        services.transition(&done.id, ServiceStatus::InProgress).await.unwrap();
        services.transition(&done.id, ServiceStatus::Completed).await.unwrap();

        let cancelled = services
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();
        services.transition(&cancelled.id, ServiceStatus::Cancelled).await.unwrap();

        let err = services
            .mark_billed(&[done.id.clone(), cancelled.id.clone()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(
            services.get(&done.id).await.unwrap().billing_status,
            BillingStatus::Unbilled
        );

        assert_eq!(services.mark_billed(&[done.id.clone()]).await.unwrap(), 1);
        assert_eq!(services.mark_billed(&[done.id.clone()]).await.unwrap(), 0);
        assert_eq!(
            services.get(&cancelled.id).await.unwrap().billing_status,
            BillingStatus::Unbilled
        );
    }

    #[tokio::test]
    async fn test_listing() {
        let fx = fixture().await;
        let services = fx.db.services();
        services
            .assign(&fx.spa.id, &fx.housekeeper.id, &fx.room_101.id)
            .await
            .unwrap();
        services
            .assign(&fx.laundry.id, &fx.housekeeper.id, &fx.room_102.id)
            .await
            .unwrap();

        assert_eq!(services.list_by_room(&fx.room_101.id).await.unwrap().len(), 1);
        assert_eq!(
            services.list_by_employee(&fx.housekeeper.id).await.unwrap().len(),
            2
        );
        assert!(services.list_by_employee(&fx.chef.id).await.unwrap().is_empty());
    }
}
