use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Agency, AgencyChanges, Call, Clinic, ClinicChanges, NewClinic, OwnerKey, Profile, Subscription,
    SubscriptionUpsert, DEFAULT_PLAN,
};
use crate::database::repository::{RemovedClinic, TenantStore};
use crate::types::SubscriptionStatus;

const INSERT_PROFILE: &str = r#"
    INSERT INTO profiles (id, role, agency_id, clinic_id)
    VALUES ($1, $2, $3, $4)
    RETURNING id, role, agency_id, clinic_id, created_at, updated_at
"#;

const INSERT_CLINIC: &str = r#"
    INSERT INTO clinics (id, name, agency_id, ghl_location_id, phone_number, system_status)
    VALUES ($1, $2, $3, $4, $5, 'active')
    RETURNING *
"#;

/// `TenantStore` backed by the hosted Postgres database
#[derive(Clone)]
pub struct PgTenantStore {
    pool: PgPool,
}

impl PgTenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TenantStore for PgTenantStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, role, agency_id, clinic_id, created_at, updated_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, DatabaseError> {
        let row = sqlx::query_as::<_, Profile>(INSERT_PROFILE)
            .bind(profile.id)
            .bind(profile.role.as_str())
            .bind(profile.agency_id)
            .bind(profile.clinic_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_agency(&self, id: Uuid) -> Result<Option<Agency>, DatabaseError> {
        let agency = sqlx::query_as::<_, Agency>("SELECT * FROM agencies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(agency)
    }

    async fn insert_agency_with_admin(&self, agency: &Agency, admin: &Profile) -> Result<(Agency, Profile), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let agency = sqlx::query_as::<_, Agency>(
            r#"
            INSERT INTO agencies (id, name, owner_user_id, logo_url, brand_color, system_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(agency.id)
        .bind(&agency.name)
        .bind(agency.owner_user_id)
        .bind(&agency.logo_url)
        .bind(&agency.brand_color)
        .bind(agency.system_status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, Profile>(INSERT_PROFILE)
            .bind(admin.id)
            .bind(admin.role.as_str())
            .bind(admin.agency_id)
            .bind(admin.clinic_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((agency, profile))
    }

    async fn update_agency(&self, id: Uuid, changes: &AgencyChanges) -> Result<Option<Agency>, DatabaseError> {
        let agency = sqlx::query_as::<_, Agency>(
            r#"
            UPDATE agencies SET
                name = COALESCE($2, name),
                logo_url = COALESCE($3, logo_url),
                brand_color = COALESCE($4, brand_color),
                system_status = COALESCE($5::text, system_status),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.logo_url)
        .bind(&changes.brand_color)
        .bind(changes.system_status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;
        Ok(agency)
    }

    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, DatabaseError> {
        let clinic = sqlx::query_as::<_, Clinic>("SELECT * FROM clinics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(clinic)
    }

    async fn insert_clinic(&self, clinic: &NewClinic) -> Result<Clinic, DatabaseError> {
        let row = sqlx::query_as::<_, Clinic>(INSERT_CLINIC)
            .bind(clinic.id)
            .bind(&clinic.name)
            .bind(clinic.agency_id)
            .bind(&clinic.ghl_location_id)
            .bind(&clinic.phone_number)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_clinic_with_profile(&self, clinic: &NewClinic, profile: &Profile) -> Result<(Clinic, Profile), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let clinic = sqlx::query_as::<_, Clinic>(INSERT_CLINIC)
            .bind(clinic.id)
            .bind(&clinic.name)
            .bind(clinic.agency_id)
            .bind(&clinic.ghl_location_id)
            .bind(&clinic.phone_number)
            .fetch_one(&mut *tx)
            .await?;

        let profile = sqlx::query_as::<_, Profile>(INSERT_PROFILE)
            .bind(profile.id)
            .bind(profile.role.as_str())
            .bind(profile.agency_id)
            .bind(profile.clinic_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((clinic, profile))
    }

    async fn update_clinic(&self, id: Uuid, changes: &ClinicChanges) -> Result<Option<Clinic>, DatabaseError> {
        let clinic = sqlx::query_as::<_, Clinic>(
            r#"
            UPDATE clinics SET
                system_status = COALESCE($2::text, system_status),
                forwarding_number = COALESCE($3, forwarding_number),
                voice = COALESCE($4, voice),
                phone_number = COALESCE($5, phone_number),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.system_status.map(|s| s.as_str()))
        .bind(&changes.forwarding_number)
        .bind(&changes.voice)
        .bind(&changes.phone_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(clinic)
    }

    async fn list_agency_clinics(&self, agency_id: Uuid) -> Result<Vec<Clinic>, DatabaseError> {
        let clinics = sqlx::query_as::<_, Clinic>(
            "SELECT * FROM clinics WHERE agency_id = $1 ORDER BY created_at DESC",
        )
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(clinics)
    }

    async fn remove_clinic(&self, id: Uuid) -> Result<Option<RemovedClinic>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let Some(clinic) = sqlx::query_as::<_, Clinic>("SELECT * FROM clinics WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let revoked: Vec<(Uuid,)> = sqlx::query_as("DELETE FROM profiles WHERE clinic_id = $1 RETURNING id")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM clinics WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(RemovedClinic {
            clinic,
            revoked_profiles: revoked.into_iter().map(|(id,)| id).collect(),
        }))
    }

    async fn list_clinic_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<Call>, DatabaseError> {
        let calls = sqlx::query_as::<_, Call>(
            "SELECT * FROM calls WHERE clinic_id = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(clinic_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(calls)
    }

    async fn get_subscription(&self, key: OwnerKey) -> Result<Option<Subscription>, DatabaseError> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE owner_type = $1 AND owner_id = $2",
        )
        .bind(key.owner_type.as_str())
        .bind(key.owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<Subscription, DatabaseError> {
        // $5/$6 are NULL when the event did not carry them: inserts take the
        // defaults and updates keep the stored values.
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (
                id, owner_type, owner_id, paddle_subscription_id,
                status, plan, billing_email, current_period_end
            )
            VALUES ($1, $2, $3, $4, COALESCE($5::text, $9), COALESCE($6::text, $10), $7, $8)
            ON CONFLICT (owner_type, owner_id) DO UPDATE SET
                paddle_subscription_id = COALESCE(EXCLUDED.paddle_subscription_id, subscriptions.paddle_subscription_id),
                status = COALESCE($5::text, subscriptions.status),
                plan = COALESCE($6::text, subscriptions.plan),
                billing_email = COALESCE(EXCLUDED.billing_email, subscriptions.billing_email),
                current_period_end = COALESCE(EXCLUDED.current_period_end, subscriptions.current_period_end),
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(upsert.key.owner_type.as_str())
        .bind(upsert.key.owner_id)
        .bind(&upsert.paddle_subscription_id)
        .bind(upsert.status.map(|s| s.as_str()))
        .bind(&upsert.plan)
        .bind(&upsert.billing_email)
        .bind(upsert.current_period_end)
        .bind(SubscriptionStatus::Active.as_str())
        .bind(DEFAULT_PLAN)
        .fetch_one(&self.pool)
        .await?;
        Ok(subscription)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
