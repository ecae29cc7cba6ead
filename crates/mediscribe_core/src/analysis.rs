//! crates/mediscribe_core/src/analysis.rs
//!
//! Coordinates one AI invocation end to end: validate input, assemble the
//! prompts, dispatch through the completion-service port (text-only or with
//! an attached exam image) and normalize the response.
//!
//! No retries anywhere: a failed provider call surfaces as a terminal error
//! to the caller.

use crate::domain::{AnalysisRequest, AnalysisResult, DocumentKind, GenerationRequest};
use crate::parser::parse_analysis;
use crate::ports::{CompletionRequest, CompletionService, PortError, PortResult};
use crate::prompts::{analysis_prompts, generation_prompt};

/// Token ceiling for exam analysis responses.
pub const ANALYSIS_MAX_TOKENS: u32 = 2000;
/// Low temperature favors precision over creativity for clinical content.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;
/// Document generation runs warmer to produce naturally worded text.
pub const GENERATION_TEMPERATURE: f32 = 0.7;

/// Per-kind token ceilings for generated documents. Fixed, not configurable
/// per request.
pub fn generation_max_tokens(kind: DocumentKind) -> u32 {
    match kind {
        DocumentKind::Relatorio => 1800,
        DocumentKind::Laudo => 1500,
        DocumentKind::Receita => 1200,
    }
}

/// Runs one exam analysis through the completion service and parses the
/// result. The image path and the text-only path differ only in the request
/// payload; both use the same prompts and budget.
pub async fn analyze(
    completions: &dyn CompletionService,
    request: &AnalysisRequest,
) -> PortResult<AnalysisResult> {
    validate_analysis(request)?;
    let (system, user) = analysis_prompts(request);

    let raw = completions
        .complete(CompletionRequest {
            system: Some(system),
            user,
            image_url: request.image_url.clone(),
            max_tokens: ANALYSIS_MAX_TOKENS,
            temperature: ANALYSIS_TEMPERATURE,
        })
        .await?;

    Ok(parse_analysis(&raw))
}

/// Runs one document generation through the completion service and returns
/// the generated text as-is.
pub async fn generate(
    completions: &dyn CompletionService,
    request: &GenerationRequest,
) -> PortResult<String> {
    validate_generation(request)?;

    completions
        .complete(CompletionRequest {
            system: None,
            user: generation_prompt(request),
            image_url: None,
            max_tokens: generation_max_tokens(request.kind()),
            temperature: GENERATION_TEMPERATURE,
        })
        .await
}

fn validate_analysis(request: &AnalysisRequest) -> PortResult<()> {
    let patient = &request.patient_info;
    require("patientInfo.name", &patient.name)?;
    require("patientInfo.age", &patient.age)?;
    require("patientInfo.sex", &patient.sex)?;
    Ok(())
}

fn validate_generation(request: &GenerationRequest) -> PortResult<()> {
    match request {
        GenerationRequest::Laudo(d) => {
            require("paciente", &d.paciente)?;
            require("idade", &d.idade)?;
            require("sexo", &d.sexo)?;
            require("tipo", &d.tipo)?;
            require("queixaPrincipal", &d.queixa_principal)?;
            require("historico", &d.historico)?;
            require("exame", &d.exame)?;
        }
        GenerationRequest::Receita(d) => {
            require("paciente", &d.paciente)?;
            require("idade", &d.idade)?;
            require("sexo", &d.sexo)?;
            require("tipo", &d.tipo)?;
            require("diagnostico", &d.diagnostico)?;
            require("medicamentos", &d.medicamentos)?;
            require("posologia", &d.posologia)?;
            require("duracao", &d.duracao)?;
        }
        GenerationRequest::Relatorio(d) => {
            require("paciente", &d.paciente)?;
            require("idade", &d.idade)?;
            require("sexo", &d.sexo)?;
            require("tipo", &d.tipo)?;
            require("evolucao", &d.evolucao)?;
            require("procedimentos", &d.procedimentos)?;
            require("recomendacoes", &d.recomendacoes)?;
        }
    }
    Ok(())
}

fn require(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::Validation(format!(
            "required field missing: {field}"
        )));
    }
    Ok(())
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExamModality, LaudoData, PatientInfo, Urgency};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Completion stub that records the request it received and replies
    /// with a fixed body.
    struct StubCompletions {
        reply: PortResult<String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl StubCompletions {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: PortError) -> Self {
            Self {
                reply: Err(error),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_request(&self) -> CompletionRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl CompletionService for StubCompletions {
        async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(PortError::Configuration(m)) => Err(PortError::Configuration(m.clone())),
                Err(PortError::Provider(m)) => Err(PortError::Provider(m.clone())),
                Err(_) => Err(PortError::Unexpected("stub".to_string())),
            }
        }
    }

    fn tomografia_request(image: Option<&str>) -> AnalysisRequest {
        AnalysisRequest {
            document_type: ExamModality::Tomografia,
            image_url: image.map(str::to_string),
            patient_info: PatientInfo {
                name: "Bob".to_string(),
                age: "52".to_string(),
                sex: "M".to_string(),
                clinical_history: None,
            },
            exam_details: Some("dor abdominal".to_string()),
            specific_questions: None,
        }
    }

    const STUB_ANALYSIS: &str = "\
Achados principais:
- Coleção líquida em fossa ilíaca direita
- Espessamento parietal de alça

Recomendações de conduta:
- Avaliação cirúrgica imediata

Nível de urgência: alta";

    #[tokio::test]
    async fn analyze_with_image_takes_multimodal_path() {
        let stub = StubCompletions::replying(STUB_ANALYSIS);
        let result = analyze(&stub, &tomografia_request(Some("https://x/y.png")))
            .await
            .unwrap();

        assert_eq!(result.findings.len(), 2);
        assert_eq!(
            result.recommendations,
            vec!["Avaliação cirúrgica imediata".to_string()]
        );
        assert_eq!(result.urgency, Urgency::High);
        assert_eq!(result.analysis, STUB_ANALYSIS);

        let sent = stub.last_request();
        assert_eq!(sent.image_url.as_deref(), Some("https://x/y.png"));
        assert_eq!(sent.max_tokens, ANALYSIS_MAX_TOKENS);
        assert_eq!(sent.temperature, ANALYSIS_TEMPERATURE);
        assert!(sent.system.unwrap().contains("Tomografia Computadorizada"));
        assert!(sent.user.contains("Bob"));
        assert!(sent.user.contains("dor abdominal"));
    }

    #[tokio::test]
    async fn analyze_without_image_is_text_only() {
        let stub = StubCompletions::replying(STUB_ANALYSIS);
        analyze(&stub, &tomografia_request(None)).await.unwrap();
        assert_eq!(stub.last_request().image_url, None);
    }

    #[tokio::test]
    async fn analyze_rejects_missing_patient_fields_before_dispatch() {
        let stub = StubCompletions::replying(STUB_ANALYSIS);
        let mut request = tomografia_request(None);
        request.patient_info.name = "  ".to_string();

        let error = analyze(&stub, &request).await.unwrap_err();
        assert!(matches!(error, PortError::Validation(_)));
        assert!(stub.seen.lock().unwrap().is_empty(), "must not dispatch");
    }

    #[tokio::test]
    async fn provider_failure_surfaces_without_retry() {
        let stub = StubCompletions::failing(PortError::Provider("rate limited".to_string()));
        let error = analyze(&stub, &tomografia_request(None)).await.unwrap_err();
        assert!(matches!(error, PortError::Provider(_)));
        assert_eq!(stub.seen.lock().unwrap().len(), 1, "exactly one attempt");
    }

    #[tokio::test]
    async fn generate_uses_per_kind_budget_and_no_system_prompt() {
        let stub = StubCompletions::replying("LAUDO MÉDICO\n...");
        let request = GenerationRequest::Laudo(LaudoData {
            paciente: "Ana".to_string(),
            idade: "30".to_string(),
            sexo: "F".to_string(),
            tipo: "raio-x".to_string(),
            queixa_principal: "tosse".to_string(),
            historico: "nega comorbidades".to_string(),
            exame: "raio-x de tórax".to_string(),
            observacoes: None,
        });

        let content = generate(&stub, &request).await.unwrap();
        assert_eq!(content, "LAUDO MÉDICO\n...");

        let sent = stub.last_request();
        assert_eq!(sent.system, None);
        assert_eq!(sent.max_tokens, 1500);
        assert_eq!(sent.temperature, GENERATION_TEMPERATURE);
        assert!(sent.user.contains("laudo médico"));
    }

    #[tokio::test]
    async fn generate_rejects_empty_required_field() {
        let stub = StubCompletions::replying("x");
        let request = GenerationRequest::Laudo(LaudoData {
            paciente: "Ana".to_string(),
            idade: "30".to_string(),
            sexo: "F".to_string(),
            tipo: "raio-x".to_string(),
            queixa_principal: String::new(),
            historico: "ok".to_string(),
            exame: "ok".to_string(),
            observacoes: None,
        });
        let error = generate(&stub, &request).await.unwrap_err();
        match error {
            PortError::Validation(message) => assert!(message.contains("queixaPrincipal")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(stub.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn token_budgets_per_kind() {
        assert_eq!(generation_max_tokens(DocumentKind::Relatorio), 1800);
        assert_eq!(generation_max_tokens(DocumentKind::Laudo), 1500);
        assert_eq!(generation_max_tokens(DocumentKind::Receita), 1200);
    }
}
