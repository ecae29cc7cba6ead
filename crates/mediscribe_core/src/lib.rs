pub mod analysis;
pub mod domain;
pub mod entitlement;
pub mod parser;
pub mod ports;
pub mod prompts;

pub use domain::{
    Account, AccountCredentials, AnalysisRequest, AnalysisResult, ClinicianProfile, DocumentKind,
    DocumentStatus, Entitlement, ExamModality, GenerationRequest, MedicalDocument, NewDocument,
    PatientInfo, PlanLimits, SubscriptionPlan, SubscriptionStatus, Urgency, UsageSummary,
};
pub use entitlement::{resolve_entitlement, EntitlementService, TRIAL_DURATION_DAYS};
pub use ports::{CompletionRequest, CompletionService, DocumentStore, PortError, PortResult};
