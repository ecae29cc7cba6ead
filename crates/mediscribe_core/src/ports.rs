//! crates/mediscribe_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Account, AccountCredentials, ClinicianProfile, DocumentKind, MedicalDocument, NewDocument,
    SubscriptionPlan,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network)
/// so nothing propagates as a raw transport exception to callers.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A required credential for the completion service is absent.
    /// Fatal for the current request, never retried.
    #[error("Completion service not configured: {0}")]
    Configuration(String),
    /// The completion-service call failed (auth, rate limit, network).
    /// Carries the upstream message; never retried automatically.
    #[error("Completion provider error: {0}")]
    Provider(String),
    /// A required field is missing or empty; caught before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The action was attempted without a bound account.
    #[error("Not authenticated")]
    NotAuthenticated,
    /// `can_create` said no: the monthly free-tier limit is reached.
    #[error("Monthly limit reached for {0}")]
    QuotaExceeded(DocumentKind),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Document / Profile Store Port
//=========================================================================================

/// The durable store collaborator: accounts, auth sessions, billing state,
/// generated documents and onboarding profiles.
///
/// Billing state (stored plan, trial start) lives here so entitlements
/// survive across devices and sessions; it is never kept client-side.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Accounts & Auth ---
    async fn create_account(&self, email: &str, hashed_password: &str) -> PortResult<Account>;

    async fn get_account(&self, user_id: Uuid) -> PortResult<Account>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<AccountCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Billing State ---
    async fn set_plan(&self, user_id: Uuid, plan: SubscriptionPlan) -> PortResult<()>;

    /// Records the first-of-trial timestamp. Written exactly once per
    /// account, at first entitlement resolution.
    async fn set_trial_start(&self, user_id: Uuid, started_at: DateTime<Utc>) -> PortResult<()>;

    // --- Documents ---
    async fn create_document(&self, document: NewDocument) -> PortResult<MedicalDocument>;

    async fn list_documents(&self, user_id: Uuid) -> PortResult<Vec<MedicalDocument>>;

    /// Counts documents of `kind` owned by `user_id` created on or after
    /// `since`. Recomputed on demand; the store is expected to index by
    /// (owner, created_at).
    async fn count_documents_since(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        since: DateTime<Utc>,
    ) -> PortResult<i64>;

    // --- Onboarding Profile ---
    async fn upsert_profile(&self, profile: ClinicianProfile) -> PortResult<()>;

    async fn get_profile(&self, user_id: Uuid) -> PortResult<ClinicianProfile>;
}

//=========================================================================================
// Completion Service Port
//=========================================================================================

/// One request to the text/vision completion collaborator.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    /// When present the request is multimodal (text + high-detail image).
    pub image_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Thin abstraction over the text/vision completion API. Owns no state;
/// a single failed call surfaces as a terminal error to the caller.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> PortResult<String>;
}
