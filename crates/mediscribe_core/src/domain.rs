//! crates/mediscribe_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or external service; the
//! request/response types carry serde attributes because they double as the
//! wire contract of the HTTP service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Accounts and Subscription State
//=========================================================================================

/// Represents a clinician account together with its stored billing state.
///
/// `plan` and `trial_started_at` are the *stored* values; the effective plan
/// is always derived through the entitlement engine, never read off this
/// struct directly.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: Uuid,
    pub email: String,
    /// Server-assigned at provisioning time. Not mutable through the API.
    pub is_developer: bool,
    pub plan: Option<SubscriptionPlan>,
    pub trial_started_at: Option<DateTime<Utc>>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Trial,
    Premium,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Trial => "trial",
            Self::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "trial" => Some(Self::Trial),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved entitlement of one account at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Entitlement {
    pub plan: SubscriptionPlan,
    pub trial_days_remaining: Option<i64>,
    pub is_trial_expired: bool,
    pub is_developer: bool,
}

/// Per-plan monthly document ceilings. `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    pub laudos: i64,
    pub receitas: i64,
    pub unlimited: bool,
}

/// Documents created by one account since the first day of the current month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub laudos: i64,
    pub receitas: i64,
}

/// The full subscription view exposed to the dashboard: resolved plan,
/// trial countdown, limits and current usage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub plan: SubscriptionPlan,
    pub trial_days_remaining: Option<i64>,
    pub is_trial_expired: bool,
    pub is_developer: bool,
    pub limits: PlanLimits,
    pub usage: UsageSummary,
}

/// Onboarding profile collected after signup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicianProfile {
    #[serde(skip_deserializing, default)]
    pub user_id: Uuid,
    pub full_name: String,
    /// Professional license id (CRM).
    pub license_id: String,
    pub specialty: String,
    pub main_use: Option<String>,
    pub additional_needs: Option<String>,
}

//=========================================================================================
// Documents
//=========================================================================================

/// The three kinds of generated documents. Only `laudo` and `receita` are
/// metered against the free-tier quota; `relatorio` is not counted in the
/// baseline policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Laudo,
    Receita,
    Relatorio,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Laudo => "laudo",
            Self::Receita => "receita",
            Self::Relatorio => "relatorio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "laudo" => Some(Self::Laudo),
            "receita" => Some(Self::Receita),
            "relatorio" => Some(Self::Relatorio),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Completed,
    Pending,
    Draft,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Draft => "draft",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "draft" => Some(Self::Draft),
            _ => None,
        }
    }
}

/// A generated artifact persisted in the document store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: DocumentKind,
    /// Free-text template name, e.g. the exam or prescription type.
    pub subtype: String,
    pub patient_name: String,
    /// Semi-structured clinical fields; the schema varies per kind.
    pub patient_info: serde_json::Value,
    pub content: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for persisting a freshly generated document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: Uuid,
    pub kind: DocumentKind,
    pub subtype: String,
    pub patient_name: String,
    pub patient_info: serde_json::Value,
    pub content: String,
    pub status: DocumentStatus,
}

//=========================================================================================
// Analysis
//=========================================================================================

/// The five exam specialties an analysis can be asked for. Anything else
/// falls back to the generic persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(from = "String", into = "String")]
pub enum ExamModality {
    RaioX,
    Tomografia,
    Ressonancia,
    ExameLaboratorial,
    Ultrassom,
    Generico,
}

impl ExamModality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RaioX => "raio-x",
            Self::Tomografia => "tomografia",
            Self::Ressonancia => "ressonancia",
            Self::ExameLaboratorial => "exame-laboratorial",
            Self::Ultrassom => "ultrassom",
            Self::Generico => "generico",
        }
    }

    /// Unknown values resolve to the generic persona rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "raio-x" => Self::RaioX,
            "tomografia" => Self::Tomografia,
            "ressonancia" => Self::Ressonancia,
            "exame-laboratorial" => Self::ExameLaboratorial,
            "ultrassom" => Self::Ultrassom,
            _ => Self::Generico,
        }
    }
}

impl From<String> for ExamModality {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ExamModality> for String {
    fn from(m: ExamModality) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for ExamModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub clinical_history: Option<String>,
}

/// Ephemeral description of one AI analysis invocation. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub document_type: ExamModality,
    pub image_url: Option<String>,
    pub patient_info: PatientInfo,
    pub exam_details: Option<String>,
    pub specific_questions: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

/// Structured output of one analysis. `analysis` always carries the raw
/// completion text verbatim; the lists fall back to fixed placeholders when
/// the text had no recognizable structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis: String,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub confidence: f32,
}

//=========================================================================================
// Generation
//=========================================================================================

/// One document-generation request, tagged by kind on the wire as
/// `{ "type": "laudo", "data": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
#[derive(ToSchema)]
pub enum GenerationRequest {
    Laudo(LaudoData),
    Receita(ReceitaData),
    Relatorio(RelatorioData),
}

impl GenerationRequest {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Laudo(_) => DocumentKind::Laudo,
            Self::Receita(_) => DocumentKind::Receita,
            Self::Relatorio(_) => DocumentKind::Relatorio,
        }
    }

    /// The free-text template name of the request (its `tipo` field).
    pub fn subtype(&self) -> &str {
        match self {
            Self::Laudo(d) => &d.tipo,
            Self::Receita(d) => &d.tipo,
            Self::Relatorio(d) => &d.tipo,
        }
    }

    pub fn patient_name(&self) -> &str {
        match self {
            Self::Laudo(d) => &d.paciente,
            Self::Receita(d) => &d.paciente,
            Self::Relatorio(d) => &d.paciente,
        }
    }

    /// The clinical fields as a semi-structured value for persistence.
    pub fn patient_info_json(&self) -> serde_json::Value {
        match self {
            Self::Laudo(d) => serde_json::to_value(d).unwrap_or_default(),
            Self::Receita(d) => serde_json::to_value(d).unwrap_or_default(),
            Self::Relatorio(d) => serde_json::to_value(d).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaudoData {
    pub paciente: String,
    pub idade: String,
    pub sexo: String,
    pub tipo: String,
    pub queixa_principal: String,
    pub historico: String,
    pub exame: String,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceitaData {
    pub paciente: String,
    pub idade: String,
    pub sexo: String,
    pub tipo: String,
    pub diagnostico: String,
    pub medicamentos: String,
    pub posologia: String,
    pub duracao: String,
    pub observacoes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatorioData {
    pub paciente: String,
    pub idade: String,
    pub sexo: String,
    pub tipo: String,
    pub motivo_internacao: Option<String>,
    pub evolucao: String,
    pub procedimentos: String,
    pub condicao_alta: Option<String>,
    pub recomendacoes: String,
    pub observacoes: Option<String>,
}
