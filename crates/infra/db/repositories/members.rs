use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::{
    dsl::max,
    insert_into,
    pg::Pg,
    prelude::*,
    sql_types::{Bool, Nullable},
    update,
};
use std::{collections::HashMap, sync::Arc};
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            members::{InsertMemberEntity, MemberEntity, UpdateMemberEntity},
            payments::InsertPaymentEntity,
        },
        repositories::{errors::MemberStatusConflict, members::MemberRepository},
        value_objects::{
            duplicates::DuplicateCandidate,
            enums::member_statuses::MemberStatus,
            lifecycle::{check_deactivation_eligibility, release_member_id},
            members::{ExpiredMemberModel, MemberOutcome, MemberSearchFilter},
        },
    },
    infra::db::postgres::{
        conflicts::{escape_like, map_member_id_conflict},
        postgres_connection::PgPoolSquad,
        schema::{members, payments},
    },
};

type MemberPredicate = Box<dyn BoxableExpression<members::table, Pg, SqlType = Nullable<Bool>>>;

const SEARCH_RESULT_LIMIT: i64 = 500;

pub struct MemberPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl MemberPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MemberRepository for MemberPostgres {
    async fn find_by_uuid(&self, member_uuid: Uuid) -> Result<Option<MemberEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<MemberEntity>> {
            let mut conn = db_pool.get()?;

            let result = members::table
                .find(member_uuid)
                .select(MemberEntity::as_select())
                .first::<MemberEntity>(&mut conn)
                .optional()?;

            Ok(result)
        })
        .await?
    }

    async fn list_active_member_ids(&self) -> Result<Vec<i32>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<i32>> {
            let mut conn = db_pool.get()?;

            let ids = members::table
                .filter(members::status.eq(MemberStatus::Active.as_str()))
                .filter(members::member_id.is_not_null())
                .select(members::member_id.assume_not_null())
                .order(members::member_id.asc())
                .load::<i32>(&mut conn)?;

            Ok(ids)
        })
        .await?
    }

    async fn create_member(
        &self,
        member: InsertMemberEntity,
        initial_payment: Option<InsertPaymentEntity>,
    ) -> Result<(MemberEntity, Option<Uuid>)> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<(MemberEntity, Option<Uuid>)> {
            let mut conn = db_pool.get()?;
            let requested_id = member.member_id;

            conn.transaction::<(MemberEntity, Option<Uuid>), anyhow::Error, _>(|tx| {
                let created = insert_into(members::table)
                    .values(&member)
                    .returning(MemberEntity::as_returning())
                    .get_result::<MemberEntity>(tx)
                    .map_err(|err| map_member_id_conflict(err, requested_id))?;

                let payment_id = match initial_payment {
                    Some(payment) => Some(
                        insert_into(payments::table)
                            .values(&payment)
                            .returning(payments::id)
                            .get_result::<Uuid>(tx)?,
                    ),
                    None => None,
                };

                Ok((created, payment_id))
            })
        })
        .await?
    }

    async fn update_active_member(
        &self,
        member_uuid: Uuid,
        changes: UpdateMemberEntity,
    ) -> Result<MemberEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<MemberEntity> {
            let mut conn = db_pool.get()?;
            let requested_id = changes.member_id.flatten();

            let updated = update(
                members::table
                    .filter(members::member_uuid.eq(member_uuid))
                    .filter(members::status.eq(MemberStatus::Active.as_str())),
            )
            .set(&changes)
            .returning(MemberEntity::as_returning())
            .get_result::<MemberEntity>(&mut conn)
            .optional()
            .map_err(|err| map_member_id_conflict(err, requested_id))?;

            updated.ok_or_else(|| {
                MemberStatusConflict {
                    member_uuid,
                    expected: MemberStatus::Active,
                }
                .into()
            })
        })
        .await?
    }

    async fn reactivate_member(&self, member_uuid: Uuid, member_id: i32) -> Result<MemberEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<MemberEntity> {
            let mut conn = db_pool.get()?;

            let updated = update(
                members::table
                    .filter(members::member_uuid.eq(member_uuid))
                    .filter(members::status.eq(MemberStatus::Inactive.as_str())),
            )
            .set((
                members::status.eq(MemberStatus::Active.as_str()),
                members::member_id.eq(Some(member_id)),
                members::preferred_member_id.eq(Some(member_id)),
                members::date_inactivated.eq(None::<NaiveDate>),
                members::updated_at.eq(Utc::now()),
            ))
            .returning(MemberEntity::as_returning())
            .get_result::<MemberEntity>(&mut conn)
            .optional()
            .map_err(|err| map_member_id_conflict(err, Some(member_id)))?;

            updated.ok_or_else(|| {
                MemberStatusConflict {
                    member_uuid,
                    expected: MemberStatus::Inactive,
                }
                .into()
            })
        })
        .await?
    }

    async fn list_expired_without_payment(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<ExpiredMemberModel>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<ExpiredMemberModel>> {
            let mut conn = db_pool.get()?;

            // Anti-join: a member survives only if no payment is dated after expiration.
            let expired = members::table
                .left_join(
                    payments::table.on(payments::member_uuid
                        .eq(members::member_uuid)
                        .and(payments::date.gt(members::expiration_date))),
                )
                .filter(members::status.eq(MemberStatus::Active.as_str()))
                .filter(members::expiration_date.lt(cutoff))
                .filter(payments::id.nullable().is_null())
                .select(MemberEntity::as_select())
                .order((
                    members::expiration_date.asc(),
                    members::last_name.asc(),
                    members::first_name.asc(),
                ))
                .load::<MemberEntity>(&mut conn)?;

            if expired.is_empty() {
                return Ok(Vec::new());
            }

            let member_uuids: Vec<Uuid> = expired.iter().map(|member| member.member_uuid).collect();
            let last_payments: HashMap<Uuid, Option<NaiveDate>> = payments::table
                .filter(payments::member_uuid.eq_any(&member_uuids))
                .group_by(payments::member_uuid)
                .select((payments::member_uuid, max(payments::date)))
                .load::<(Uuid, Option<NaiveDate>)>(&mut conn)?
                .into_iter()
                .collect();

            Ok(expired
                .into_iter()
                .map(|member| {
                    let last_payment_date = last_payments.get(&member.member_uuid).copied().flatten();
                    ExpiredMemberModel {
                        member,
                        last_payment_date,
                    }
                })
                .collect())
        })
        .await?
    }

    async fn deactivate_members(
        &self,
        member_uuids: Vec<Uuid>,
        today: NaiveDate,
        grace_period_days: i64,
    ) -> Result<Vec<MemberOutcome>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<MemberOutcome>> {
            let mut conn = db_pool.get()?;

            conn.transaction::<Vec<MemberOutcome>, anyhow::Error, _>(|tx| {
                let mut outcomes = Vec::with_capacity(member_uuids.len());
                for member_uuid in member_uuids {
                    // Nested transactions are savepoints: a failed member rolls back alone.
                    let outcome = tx
                        .transaction::<MemberOutcome, anyhow::Error, _>(|savepoint| {
                            deactivate_one(savepoint, member_uuid, today, grace_period_days)
                        })
                        .unwrap_or_else(|err| {
                            tracing::warn!(%member_uuid, error = ?err, "members: deactivation failed");
                            MemberOutcome::failed(member_uuid, None, format!("Error: {err}"))
                        });
                    outcomes.push(outcome);
                }
                Ok(outcomes)
            })
        })
        .await?
    }

    async fn mark_deceased(
        &self,
        member_uuids: Vec<Uuid>,
        today: NaiveDate,
    ) -> Result<Vec<MemberOutcome>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<MemberOutcome>> {
            let mut conn = db_pool.get()?;

            conn.transaction::<Vec<MemberOutcome>, anyhow::Error, _>(|tx| {
                let mut outcomes = Vec::with_capacity(member_uuids.len());
                for member_uuid in member_uuids {
                    let outcome = tx
                        .transaction::<MemberOutcome, anyhow::Error, _>(|savepoint| {
                            mark_deceased_one(savepoint, member_uuid, today)
                        })
                        .unwrap_or_else(|err| {
                            tracing::warn!(%member_uuid, error = ?err, "members: marking deceased failed");
                            MemberOutcome::failed(member_uuid, None, format!("Error: {err}"))
                        });
                    outcomes.push(outcome);
                }
                Ok(outcomes)
            })
        })
        .await?
    }

    async fn find_duplicate_candidates(
        &self,
        candidate: DuplicateCandidate,
    ) -> Result<Vec<MemberEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<MemberEntity>> {
            let mut conn = db_pool.get()?;

            let mut predicates: Vec<MemberPredicate> = Vec::new();
            if !candidate.first_name.is_empty() && !candidate.last_name.is_empty() {
                predicates.push(Box::new(
                    members::first_name
                        .ilike(escape_like(&candidate.first_name))
                        .and(members::last_name.ilike(escape_like(&candidate.last_name)))
                        .nullable(),
                ));
            }
            if let Some(phone) = candidate.phone {
                predicates.push(Box::new(members::home_phone.eq(phone)));
            }
            if let Some(email) = candidate.email {
                predicates.push(Box::new(members::email.ilike(escape_like(&email))));
            }

            let Some(predicate) = any_of(predicates) else {
                return Ok(Vec::new());
            };

            let result = members::table
                .filter(predicate)
                .select(MemberEntity::as_select())
                .order((members::last_name.asc(), members::first_name.asc()))
                .load::<MemberEntity>(&mut conn)?;

            Ok(result)
        })
        .await?
    }

    async fn search_members(&self, filter: MemberSearchFilter) -> Result<Vec<MemberEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<MemberEntity>> {
            let mut conn = db_pool.get()?;

            let mut query = members::table
                .select(MemberEntity::as_select())
                .into_boxed();

            if let Some(member_id) = filter.member_id_query() {
                query = query.filter(members::member_id.eq(member_id));
            } else if let Some(name) = filter.name_query() {
                for token in name.split_whitespace() {
                    let pattern = format!("%{}%", escape_like(token));
                    query = query.filter(
                        members::first_name
                            .ilike(pattern.clone())
                            .or(members::last_name.ilike(pattern)),
                    );
                }
            }

            if let Some(status) = filter.status {
                query = query.filter(members::status.eq(status.as_str()));
            }
            if filter.exclude_deceased {
                query = query.filter(members::status.ne(MemberStatus::Deceased.as_str()));
            }

            if let Some(range) = filter.browse {
                let initials: Vec<MemberPredicate> = range
                    .letters()
                    .iter()
                    .map(|letter| -> MemberPredicate {
                        Box::new(members::last_name.ilike(format!("{letter}%")).nullable())
                    })
                    .collect();
                if let Some(predicate) = any_of(initials) {
                    query = query.filter(predicate);
                }
            }

            let result = query
                .order((members::last_name.asc(), members::first_name.asc()))
                .limit(SEARCH_RESULT_LIMIT)
                .load::<MemberEntity>(&mut conn)?;

            Ok(result)
        })
        .await?
    }
}

fn any_of(predicates: Vec<MemberPredicate>) -> Option<MemberPredicate> {
    predicates
        .into_iter()
        .reduce(|acc, next| -> MemberPredicate { Box::new(acc.or(next)) })
}

fn lock_member(conn: &mut PgConnection, member_uuid: Uuid) -> QueryResult<Option<MemberEntity>> {
    members::table
        .find(member_uuid)
        .select(MemberEntity::as_select())
        .for_update()
        .first::<MemberEntity>(conn)
        .optional()
}

/// Row changes for a member leaving active status, plus the outcome to report once written.
#[derive(Debug, Clone, PartialEq)]
struct StatusChange {
    status: MemberStatus,
    preferred_member_id: Option<i32>,
    date_inactivated: NaiveDate,
    outcome: MemberOutcome,
}

fn plan_deactivation(
    member: &MemberEntity,
    last_payment_date: Option<NaiveDate>,
    today: NaiveDate,
    grace_period_days: i64,
) -> std::result::Result<StatusChange, MemberOutcome> {
    check_deactivation_eligibility(
        member.status(),
        member.expiration_date,
        last_payment_date,
        today,
        grace_period_days,
    )
    .map_err(|reason| {
        MemberOutcome::failed(
            member.member_uuid,
            Some(member.full_name()),
            format!("Not eligible: {reason}"),
        )
    })?;

    let release = release_member_id(member.member_id, member.preferred_member_id);
    let message = match release.released_member_id {
        Some(member_id) => format!("Deactivated; member ID {member_id} released"),
        None => "Deactivated".to_string(),
    };
    Ok(StatusChange {
        status: MemberStatus::Inactive,
        preferred_member_id: release.preferred_member_id,
        date_inactivated: today,
        outcome: MemberOutcome::succeeded(
            member.member_uuid,
            member.full_name(),
            release.released_member_id,
            message,
        ),
    })
}

fn plan_deceased(
    member: &MemberEntity,
    today: NaiveDate,
) -> std::result::Result<StatusChange, MemberOutcome> {
    if member.status() == MemberStatus::Deceased {
        return Err(MemberOutcome::failed(
            member.member_uuid,
            Some(member.full_name()),
            "Member is already marked deceased",
        ));
    }

    let release = release_member_id(member.member_id, member.preferred_member_id);
    let message = match release.released_member_id {
        Some(member_id) => format!("Marked deceased; member ID {member_id} released"),
        None => "Marked deceased".to_string(),
    };
    Ok(StatusChange {
        status: MemberStatus::Deceased,
        preferred_member_id: release.preferred_member_id,
        // An inactive member keeps the date they originally lapsed.
        date_inactivated: member.date_inactivated.unwrap_or(today),
        outcome: MemberOutcome::succeeded(
            member.member_uuid,
            member.full_name(),
            release.released_member_id,
            message,
        ),
    })
}

fn apply_status_change(
    conn: &mut PgConnection,
    member_uuid: Uuid,
    change: StatusChange,
) -> Result<MemberOutcome> {
    update(members::table.find(member_uuid))
        .set((
            members::status.eq(change.status.as_str()),
            members::member_id.eq(None::<i32>),
            members::preferred_member_id.eq(change.preferred_member_id),
            members::date_inactivated.eq(Some(change.date_inactivated)),
            members::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(change.outcome)
}

fn deactivate_one(
    conn: &mut PgConnection,
    member_uuid: Uuid,
    today: NaiveDate,
    grace_period_days: i64,
) -> Result<MemberOutcome> {
    let Some(member) = lock_member(conn, member_uuid)? else {
        return Ok(MemberOutcome::failed(member_uuid, None, "Member not found"));
    };

    let last_payment_date = payments::table
        .filter(payments::member_uuid.eq(member_uuid))
        .select(max(payments::date))
        .first::<Option<NaiveDate>>(conn)?;

    match plan_deactivation(&member, last_payment_date, today, grace_period_days) {
        Ok(change) => apply_status_change(conn, member_uuid, change),
        Err(refused) => Ok(refused),
    }
}

fn mark_deceased_one(
    conn: &mut PgConnection,
    member_uuid: Uuid,
    today: NaiveDate,
) -> Result<MemberOutcome> {
    let Some(member) = lock_member(conn, member_uuid)? else {
        return Ok(MemberOutcome::failed(member_uuid, None, "Member not found"));
    };

    match plan_deceased(&member, today) {
        Ok(change) => apply_status_change(conn, member_uuid, change),
        Err(refused) => Ok(refused),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(status: MemberStatus, member_id: Option<i32>, preferred_member_id: Option<i32>) -> MemberEntity {
        let now = Utc::now();
        MemberEntity {
            member_uuid: Uuid::new_v4(),
            member_id,
            preferred_member_id,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: None,
            member_type_id: Uuid::new_v4(),
            status: status.as_str().to_string(),
            expiration_date: date(2025, 1, 31),
            milestone_date: None,
            date_joined: date(2015, 6, 1),
            date_inactivated: None,
            home_address: None,
            home_city: None,
            home_state: None,
            home_zip: None,
            home_phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn deactivation_releases_the_id_and_remembers_it() {
        let active = member(MemberStatus::Active, Some(17), Some(4));

        let change = plan_deactivation(&active, Some(date(2024, 12, 1)), date(2025, 6, 1), 90).unwrap();

        assert_eq!(change.status, MemberStatus::Inactive);
        assert_eq!(change.preferred_member_id, Some(17));
        assert_eq!(change.date_inactivated, date(2025, 6, 1));
        assert!(change.outcome.succeeded);
        assert_eq!(change.outcome.member_id, Some(17));
        assert_eq!(change.outcome.message, "Deactivated; member ID 17 released");
    }

    #[test]
    fn payment_after_expiration_blocks_deactivation() {
        let active = member(MemberStatus::Active, Some(17), Some(17));

        let refused = plan_deactivation(&active, Some(date(2025, 2, 3)), date(2025, 6, 1), 90).unwrap_err();

        assert!(!refused.succeeded);
        assert_eq!(refused.member_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            refused.message,
            "Not eligible: member has a payment after expiration (paid 2025-02-03)"
        );
    }

    #[test]
    fn deactivation_inside_the_grace_period_is_refused() {
        let active = member(MemberStatus::Active, Some(17), Some(17));

        let refused = plan_deactivation(&active, None, date(2025, 3, 1), 90).unwrap_err();

        assert!(refused.message.starts_with("Not eligible: member is not expired 90+ days"));
    }

    #[test]
    fn marking_inactive_member_deceased_keeps_lapse_date() {
        let mut inactive = member(MemberStatus::Inactive, None, Some(8));
        inactive.date_inactivated = Some(date(2024, 9, 30));

        let change = plan_deceased(&inactive, date(2025, 6, 1)).unwrap();

        assert_eq!(change.status, MemberStatus::Deceased);
        assert_eq!(change.preferred_member_id, Some(8));
        assert_eq!(change.date_inactivated, date(2024, 9, 30));
        assert_eq!(change.outcome.member_id, None);
        assert_eq!(change.outcome.message, "Marked deceased");
    }

    #[test]
    fn marking_active_member_deceased_releases_the_id() {
        let active = member(MemberStatus::Active, Some(3), Some(3));

        let change = plan_deceased(&active, date(2025, 6, 1)).unwrap();

        assert_eq!(change.date_inactivated, date(2025, 6, 1));
        assert_eq!(change.outcome.message, "Marked deceased; member ID 3 released");
    }

    #[test]
    fn deceased_member_is_not_marked_twice() {
        let deceased = member(MemberStatus::Deceased, None, Some(3));

        let refused = plan_deceased(&deceased, date(2025, 6, 1)).unwrap_err();

        assert_eq!(refused.message, "Member is already marked deceased");
    }
}
