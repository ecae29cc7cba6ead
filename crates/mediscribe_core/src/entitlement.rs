//! crates/mediscribe_core/src/entitlement.rs
//!
//! The entitlement engine: resolves an account's effective plan from its
//! stored billing state, derives monthly usage, and gates every
//! document-creation action.
//!
//! State machine per non-developer account:
//! free(unused) -> trial(active) -> trial(expired)=free(limited) -> premium.
//! The free->trial transition happens exactly once, at first resolution,
//! triggered by the absence of a stored trial start. premium is terminal.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    Account, DocumentKind, Entitlement, PlanLimits, SubscriptionPlan, SubscriptionStatus,
    UsageSummary,
};
use crate::ports::{DocumentStore, PortResult};

/// Every new account gets this many days of unrestricted trial.
pub const TRIAL_DURATION_DAYS: i64 = 7;

/// Monthly free-tier ceilings per metered document kind.
pub const FREE_LAUDO_LIMIT: i64 = 5;
pub const FREE_RECEITA_LIMIT: i64 = 5;

const FREE_LIMITS: PlanLimits = PlanLimits {
    laudos: FREE_LAUDO_LIMIT,
    receitas: FREE_RECEITA_LIMIT,
    unlimited: false,
};

// -1 means unlimited.
const UNLIMITED_LIMITS: PlanLimits = PlanLimits {
    laudos: -1,
    receitas: -1,
    unlimited: true,
};

//=========================================================================================
// Pure Resolution
//=========================================================================================

/// Resolves the effective entitlement of an account at `now`.
///
/// Pure: the caller is responsible for persisting the trial start when the
/// returned entitlement is a fresh trial (`stored_trial_start` was `None`).
pub fn resolve_entitlement(
    is_developer: bool,
    stored_plan: Option<SubscriptionPlan>,
    stored_trial_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Entitlement {
    // Developer accounts are premium unconditionally; no other check runs.
    if is_developer {
        return Entitlement {
            plan: SubscriptionPlan::Premium,
            trial_days_remaining: None,
            is_trial_expired: false,
            is_developer: true,
        };
    }

    if stored_plan == Some(SubscriptionPlan::Premium) {
        return Entitlement {
            plan: SubscriptionPlan::Premium,
            trial_days_remaining: None,
            is_trial_expired: false,
            is_developer: false,
        };
    }

    match stored_trial_start {
        // First resolution for this account: the trial starts now.
        None => Entitlement {
            plan: SubscriptionPlan::Trial,
            trial_days_remaining: Some(TRIAL_DURATION_DAYS),
            is_trial_expired: false,
            is_developer: false,
        },
        Some(started_at) => {
            let days_elapsed = (now - started_at).num_days();
            let remaining = TRIAL_DURATION_DAYS - days_elapsed;
            if remaining > 0 {
                Entitlement {
                    plan: SubscriptionPlan::Trial,
                    trial_days_remaining: Some(remaining),
                    is_trial_expired: false,
                    is_developer: false,
                }
            } else {
                Entitlement {
                    plan: SubscriptionPlan::Free,
                    trial_days_remaining: Some(0),
                    is_trial_expired: true,
                    is_developer: false,
                }
            }
        }
    }
}

impl Entitlement {
    /// Whether this entitlement permits creating one more document of `kind`.
    ///
    /// Pure query with no side effects; callers perform the creation
    /// afterward. The check-then-act gap is accepted for this soft cap.
    pub fn can_create(&self, usage: &UsageSummary, kind: DocumentKind) -> bool {
        if self.is_developer || self.plan == SubscriptionPlan::Premium {
            return true;
        }
        if self.plan == SubscriptionPlan::Trial && !self.is_trial_expired {
            return true;
        }
        match kind {
            DocumentKind::Laudo => usage.laudos < FREE_LAUDO_LIMIT,
            DocumentKind::Receita => usage.receitas < FREE_RECEITA_LIMIT,
            // relatorio is not metered in the baseline policy
            DocumentKind::Relatorio => true,
        }
    }

    /// The limits table matching this entitlement's resolved plan.
    pub fn limits(&self) -> PlanLimits {
        match self.plan {
            SubscriptionPlan::Premium | SubscriptionPlan::Trial => UNLIMITED_LIMITS,
            SubscriptionPlan::Free => FREE_LIMITS,
        }
    }
}

/// Midnight UTC on the first day of `now`'s month, the lower bound for
/// usage counting.
pub fn first_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

//=========================================================================================
// Entitlement Service (store-backed)
//=========================================================================================

/// Loads, resolves and mutates entitlement state through the store port.
///
/// Nothing is cached in-process: plan, trial start and usage are read fresh
/// from the store on every call, so concurrent requests never observe
/// in-memory state of each other.
#[derive(Clone)]
pub struct EntitlementService {
    store: Arc<dyn DocumentStore>,
}

impl EntitlementService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolves the account's subscription status at `now`, persisting the
    /// trial start on first resolution and recounting this month's usage.
    pub async fn status(&self, user_id: Uuid, now: DateTime<Utc>) -> PortResult<SubscriptionStatus> {
        let account = self.store.get_account(user_id).await?;
        let entitlement = resolve_entitlement(
            account.is_developer,
            account.plan,
            account.trial_started_at,
            now,
        );

        if starts_trial(&account, &entitlement) {
            self.store.set_trial_start(user_id, now).await?;
        }

        let usage = self.usage(user_id, now).await?;

        Ok(SubscriptionStatus {
            limits: entitlement.limits(),
            plan: entitlement.plan,
            trial_days_remaining: entitlement.trial_days_remaining,
            is_trial_expired: entitlement.is_trial_expired,
            is_developer: entitlement.is_developer,
            usage,
        })
    }

    /// Whether the account may create one more document of `kind` right now.
    pub async fn can_create(
        &self,
        user_id: Uuid,
        kind: DocumentKind,
        now: DateTime<Utc>,
    ) -> PortResult<bool> {
        let account = self.store.get_account(user_id).await?;
        let entitlement = resolve_entitlement(
            account.is_developer,
            account.plan,
            account.trial_started_at,
            now,
        );
        if starts_trial(&account, &entitlement) {
            self.store.set_trial_start(user_id, now).await?;
        }
        let usage = self.usage(user_id, now).await?;
        Ok(entitlement.can_create(&usage, kind))
    }

    /// Upgrades the account to premium. Terminal: there is no automatic
    /// downgrade path afterwards.
    pub async fn upgrade(&self, user_id: Uuid, now: DateTime<Utc>) -> PortResult<SubscriptionStatus> {
        self.store
            .set_plan(user_id, SubscriptionPlan::Premium)
            .await?;
        self.status(user_id, now).await
    }

    /// Recounts this calendar month's generated documents per metered kind.
    async fn usage(&self, user_id: Uuid, now: DateTime<Utc>) -> PortResult<UsageSummary> {
        let since = first_of_month(now);
        let laudos = self
            .store
            .count_documents_since(user_id, DocumentKind::Laudo, since)
            .await?;
        let receitas = self
            .store
            .count_documents_since(user_id, DocumentKind::Receita, since)
            .await?;
        Ok(UsageSummary { laudos, receitas })
    }
}

/// True when this resolution is the one-time free->trial transition.
fn starts_trial(account: &Account, entitlement: &Entitlement) -> bool {
    !account.is_developer
        && account.trial_started_at.is_none()
        && entitlement.plan == SubscriptionPlan::Trial
}

//=========================================================================================
// Tests
//=========================================================================================
