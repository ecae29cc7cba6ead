//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediscribe_core::domain::{
    Account, AccountCredentials, ClinicianProfile, DocumentKind, DocumentStatus, MedicalDocument,
    NewDocument, SubscriptionPlan,
};
use mediscribe_core::ports::{DocumentStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    user_id: Uuid,
    email: String,
    is_developer: bool,
    plan: Option<String>,
    trial_started_at: Option<DateTime<Utc>>,
}

impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            user_id: self.user_id,
            email: self.email,
            is_developer: self.is_developer,
            // An unknown stored plan value is treated as unset, which
            // resolves through the normal trial path.
            plan: self.plan.as_deref().and_then(SubscriptionPlan::parse),
            trial_started_at: self.trial_started_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

impl CredentialsRecord {
    fn to_domain(self) -> AccountCredentials {
        AccountCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    user_id: Uuid,
    doc_type: String,
    subtype: String,
    patient_name: String,
    patient_info: serde_json::Value,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    fn to_domain(self) -> PortResult<MedicalDocument> {
        let kind = DocumentKind::parse(&self.doc_type).ok_or_else(|| {
            PortError::Unexpected(format!("unknown document type in store: {}", self.doc_type))
        })?;
        let status = DocumentStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("unknown document status in store: {}", self.status))
        })?;
        Ok(MedicalDocument {
            id: self.id,
            user_id: self.user_id,
            kind,
            subtype: self.subtype,
            patient_name: self.patient_name,
            patient_info: self.patient_info,
            content: self.content,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    user_id: Uuid,
    full_name: String,
    license_id: String,
    specialty: String,
    main_use: Option<String>,
    additional_needs: Option<String>,
}

impl ProfileRecord {
    fn to_domain(self) -> ClinicianProfile {
        ClinicianProfile {
            user_id: self.user_id,
            full_name: self.full_name,
            license_id: self.license_id,
            specialty: self.specialty,
            main_use: self.main_use,
            additional_needs: self.additional_needs,
        }
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for PgStore {
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3)
             RETURNING user_id, email, is_developer, plan, trial_started_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_account(&self, user_id: Uuid) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "SELECT user_id, email, is_developer, plan, trial_started_at
             FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Account {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Account for {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(|(user_id,)| user_id)
            .ok_or(PortError::NotAuthenticated)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn set_plan(&self, user_id: Uuid, plan: SubscriptionPlan) -> PortResult<()> {
        sqlx::query("UPDATE users SET plan = $1 WHERE user_id = $2")
            .bind(plan.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn set_trial_start(&self, user_id: Uuid, started_at: DateTime<Utc>) -> PortResult<()> {
        // Written exactly once: a concurrent first resolution must not move
        // an already-recorded start.
        sqlx::query(
            "UPDATE users SET trial_started_at = $1
             WHERE user_id = $2 AND trial_started_at IS NULL",
        )
        .bind(started_at)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn create_document(&self, document: NewDocument) -> PortResult<MedicalDocument> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            "INSERT INTO documents
                 (id, user_id, doc_type, subtype, patient_name, patient_info, content, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, user_id, doc_type, subtype, patient_name, patient_info,
                       content, status, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(document.user_id)
        .bind(document.kind.as_str())
        .bind(&document.subtype)
        .bind(&document.patient_name)
        .bind(&document.patient_info)
        .bind(&document.content)
        .bind(document.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_documents(&self, user_id: Uuid) -> PortResult<Vec<MedicalDocument>> {
        let records = sqlx::query_as::<_, DocumentRecord>(
            "SELECT id, user_id, doc_type, subtype, patient_name, patient_info,
                    content, status, created_at, updated_at
             FROM documents WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_documents_since(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        since: DateTime<Utc>,
    ) -> PortResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM documents
             WHERE user_id = $1 AND doc_type = $2 AND created_at >= $3",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count)
    }

    async fn upsert_profile(&self, profile: ClinicianProfile) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO profiles (user_id, full_name, license_id, specialty, main_use, additional_needs)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id) DO UPDATE SET
                 full_name = EXCLUDED.full_name,
                 license_id = EXCLUDED.license_id,
                 specialty = EXCLUDED.specialty,
                 main_use = EXCLUDED.main_use,
                 additional_needs = EXCLUDED.additional_needs,
                 updated_at = NOW()",
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.license_id)
        .bind(&profile.specialty)
        .bind(&profile.main_use)
        .bind(&profile.additional_needs)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> PortResult<ClinicianProfile> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT user_id, full_name, license_id, specialty, main_use, additional_needs
             FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Profile for {} not found", user_id)))?;
        Ok(record.to_domain())
    }
}
