//! crates/mediscribe_core/src/prompts.rs
//!
//! Assembles the instruction templates sent to the completion service:
//! specialist personas for exam analysis and the numbered document
//! templates for laudo / receita / relatorio generation.
//!
//! Everything here is pure string assembly; deterministic for identical
//! inputs.

use crate::domain::{
    AnalysisRequest, ExamModality, GenerationRequest, LaudoData, ReceitaData, RelatorioData,
};

//=========================================================================================
// Analysis: specialist personas
//=========================================================================================

/// Disclaimer block present in every persona: analyses are auxiliary only,
/// require clinical correlation, must state confidence and suggest
/// complementary investigation.
const BASE_PERSONA: &str = "\
Você é um médico especialista experiente atuando como assistente de IA para análise de exames médicos.
Sua função é auxiliar médicos fornecendo análises detalhadas, identificando achados importantes e sugerindo diagnósticos diferenciais.

IMPORTANTE:
- Suas análises são para AUXÍLIO MÉDICO, não substituem avaliação clínica completa
- Sempre mencione a necessidade de correlação clínica
- Seja preciso, objetivo e use terminologia médica apropriada
- Indique o nível de confiança em suas observações
- Sugira investigações complementares quando apropriado";

fn specialty_focus(modality: ExamModality) -> Option<&'static str> {
    match modality {
        ExamModality::RaioX => Some(
            "ESPECIALIDADE: Radiologia - Raio-X
Foque em:
- Análise de estruturas ósseas e articulações
- Avaliação de campos pulmonares e mediastino
- Identificação de fraturas, luxações, alterações degenerativas
- Sinais de processos infecciosos ou neoplásicos
- Alinhamento e posicionamento anatômico",
        ),
        ExamModality::Tomografia => Some(
            "ESPECIALIDADE: Radiologia - Tomografia Computadorizada
Foque em:
- Análise detalhada de tecidos moles e estruturas ósseas
- Identificação de lesões, massas ou coleções
- Avaliação de vasos sanguíneos e órgãos
- Sinais de hemorragia, isquemia ou trauma
- Estadiamento de processos patológicos",
        ),
        ExamModality::Ressonancia => Some(
            "ESPECIALIDADE: Radiologia - Ressonância Magnética
Foque em:
- Análise de tecidos moles com alta resolução
- Avaliação de sistema nervoso central
- Identificação de lesões, edema, inflamação
- Caracterização de massas e tumores
- Avaliação de estruturas articulares e ligamentares",
        ),
        ExamModality::ExameLaboratorial => Some(
            "ESPECIALIDADE: Medicina Laboratorial
Foque em:
- Interpretação de valores laboratoriais
- Identificação de alterações significativas
- Correlação entre diferentes parâmetros
- Sugestão de exames complementares
- Possíveis diagnósticos baseados em padrões laboratoriais",
        ),
        ExamModality::Ultrassom => Some(
            "ESPECIALIDADE: Ultrassonografia
Foque em:
- Análise de ecogenicidade e textura dos órgãos
- Identificação de massas, cistos ou coleções
- Avaliação de fluxo vascular (quando Doppler)
- Medidas e dimensões de estruturas
- Sinais de processos inflamatórios ou obstrutivos",
        ),
        ExamModality::Generico => None,
    }
}

/// The fixed 5-point requested-output structure appended to every analysis
/// user prompt. The response parser keys off these section names.
const REQUESTED_STRUCTURE: &str = "\
Por favor, forneça uma análise médica detalhada incluindo:
1. Achados principais
2. Interpretação clínica
3. Diagnósticos diferenciais possíveis
4. Recomendações de conduta
5. Nível de urgência (baixo/médio/alto)";

/// Builds the (system, user) prompt pair for one analysis request.
pub fn analysis_prompts(request: &AnalysisRequest) -> (String, String) {
    let system = match specialty_focus(request.document_type) {
        Some(focus) => format!("{BASE_PERSONA}\n\n{focus}"),
        None => BASE_PERSONA.to_string(),
    };

    let patient = &request.patient_info;
    let mut user = format!(
        "Paciente: {}, {} anos, sexo {}\n",
        patient.name, patient.age, patient.sex
    );
    if let Some(history) = non_empty(&patient.clinical_history) {
        user.push_str(&format!("Histórico Clínico: {history}\n"));
    }
    if let Some(details) = non_empty(&request.exam_details) {
        user.push_str(&format!("Detalhes do Exame: {details}\n"));
    }
    if let Some(questions) = non_empty(&request.specific_questions) {
        user.push_str(&format!("Questões Específicas: {questions}\n"));
    }
    user.push('\n');
    user.push_str(REQUESTED_STRUCTURE);

    (system, user)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

//=========================================================================================
// Generation: document templates
//=========================================================================================

/// Builds the single-prompt template for one generation request.
pub fn generation_prompt(request: &GenerationRequest) -> String {
    match request {
        GenerationRequest::Laudo(data) => laudo_prompt(data),
        GenerationRequest::Receita(data) => receita_prompt(data),
        GenerationRequest::Relatorio(data) => relatorio_prompt(data),
    }
}

fn laudo_prompt(data: &LaudoData) -> String {
    let mut prompt = format!(
        "Você é um médico especialista gerando um laudo médico profissional.

DADOS DO PACIENTE:
- Nome: {}
- Idade: {} anos
- Sexo: {}

TIPO DE LAUDO: {}

INFORMAÇÕES CLÍNICAS:
- Queixa Principal: {}
- Histórico: {}
- Exame Realizado: {}
",
        data.paciente,
        data.idade,
        data.sexo,
        data.tipo,
        data.queixa_principal,
        data.historico,
        data.exame,
    );
    if let Some(obs) = non_empty(&data.observacoes) {
        prompt.push_str(&format!("- Observações: {obs}\n"));
    }
    prompt.push_str(
        "
Gere um laudo médico completo, profissional e detalhado seguindo o padrão médico brasileiro. Inclua:
1. Identificação do paciente
2. Indicação clínica
3. Técnica utilizada
4. Descrição dos achados
5. Impressão diagnóstica
6. Conclusão

Use linguagem técnica apropriada e seja objetivo.",
    );
    prompt
}

fn receita_prompt(data: &ReceitaData) -> String {
    let mut prompt = format!(
        "Você é um médico gerando uma receita médica profissional.

DADOS DO PACIENTE:
- Nome: {}
- Idade: {} anos
- Sexo: {}

TIPO DE RECEITA: {}

INFORMAÇÕES CLÍNICAS:
- Diagnóstico: {}
- Medicamentos: {}
- Posologia: {}
- Duração do Tratamento: {}
",
        data.paciente,
        data.idade,
        data.sexo,
        data.tipo,
        data.diagnostico,
        data.medicamentos,
        data.posologia,
        data.duracao,
    );
    if let Some(obs) = non_empty(&data.observacoes) {
        prompt.push_str(&format!("- Observações: {obs}\n"));
    }
    prompt.push_str(
        "
Gere uma receita médica completa e profissional seguindo o padrão brasileiro. Inclua:
1. Identificação do paciente
2. Prescrição detalhada dos medicamentos
3. Posologia clara e específica
4. Orientações de uso
5. Duração do tratamento
6. Recomendações gerais

Use linguagem técnica apropriada e seja claro nas instruções.",
    );
    prompt
}

fn relatorio_prompt(data: &RelatorioData) -> String {
    let mut prompt = format!(
        "Você é um médico gerando um relatório médico profissional.

DADOS DO PACIENTE:
- Nome: {}
- Idade: {} anos
- Sexo: {}

TIPO DE RELATÓRIO: {}

INFORMAÇÕES CLÍNICAS:
",
        data.paciente, data.idade, data.sexo, data.tipo,
    );
    if let Some(motivo) = non_empty(&data.motivo_internacao) {
        prompt.push_str(&format!("- Motivo da Internação: {motivo}\n"));
    }
    prompt.push_str(&format!("- Evolução Clínica: {}\n", data.evolucao));
    prompt.push_str(&format!(
        "- Procedimentos Realizados: {}\n",
        data.procedimentos
    ));
    if let Some(alta) = non_empty(&data.condicao_alta) {
        prompt.push_str(&format!("- Condição na Alta: {alta}\n"));
    }
    prompt.push_str(&format!("- Recomendações: {}\n", data.recomendacoes));
    if let Some(obs) = non_empty(&data.observacoes) {
        prompt.push_str(&format!("- Observações: {obs}\n"));
    }
    prompt.push_str(
        "
Gere um relatório médico completo e profissional seguindo o padrão brasileiro. Inclua:
1. Identificação do paciente
2. Resumo do caso
3. Evolução clínica detalhada
4. Procedimentos e tratamentos realizados
5. Condição atual do paciente
6. Recomendações e orientações
7. Conclusão

Use linguagem técnica apropriada e seja detalhado.",
    );
    prompt
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientInfo;

    fn request(modality: ExamModality) -> AnalysisRequest {
        AnalysisRequest {
            document_type: modality,
            image_url: None,
            patient_info: PatientInfo {
                name: "Ana".to_string(),
                age: "30".to_string(),
                sex: "F".to_string(),
                clinical_history: None,
            },
            exam_details: None,
            specific_questions: None,
        }
    }

    #[test]
    fn raio_x_persona_carries_base_and_focus() {
        let (system, user) = analysis_prompts(&request(ExamModality::RaioX));
        assert!(system.contains("AUXÍLIO MÉDICO"));
        assert!(system.contains("correlação clínica"));
        assert!(system.contains("Radiologia - Raio-X"));
        assert!(system.contains("campos pulmonares"));

        assert!(user.contains("Ana"));
        assert!(user.contains("30"));
        assert!(user.contains("1. Achados principais"));
        assert!(user.contains("5. Nível de urgência (baixo/médio/alto)"));
    }

    #[test]
    fn unknown_modality_falls_back_to_base_persona_alone() {
        let (system, _) = analysis_prompts(&request(ExamModality::Generico));
        assert!(system.contains("AUXÍLIO MÉDICO"));
        assert!(!system.contains("ESPECIALIDADE:"));
    }

    #[test]
    fn each_specialty_has_its_own_focus() {
        let specialties = [
            (ExamModality::Tomografia, "Tomografia Computadorizada"),
            (ExamModality::Ressonancia, "Ressonância Magnética"),
            (ExamModality::ExameLaboratorial, "Medicina Laboratorial"),
            (ExamModality::Ultrassom, "Ultrassonografia"),
        ];
        for (modality, marker) in specialties {
            let (system, _) = analysis_prompts(&request(modality));
            assert!(system.contains(marker), "missing focus for {modality}");
        }
    }

    #[test]
    fn optional_fields_are_omitted_not_placeholder_filled() {
        let (_, user) = analysis_prompts(&request(ExamModality::RaioX));
        assert!(!user.contains("Histórico Clínico"));
        assert!(!user.contains("Detalhes do Exame"));
        assert!(!user.contains("Questões Específicas"));

        let mut with_extras = request(ExamModality::RaioX);
        with_extras.patient_info.clinical_history = Some("hipertensa".to_string());
        with_extras.exam_details = Some("PA e perfil".to_string());
        with_extras.specific_questions = Some("fratura?".to_string());
        let (_, user) = analysis_prompts(&with_extras);
        assert!(user.contains("Histórico Clínico: hipertensa"));
        assert!(user.contains("Detalhes do Exame: PA e perfil"));
        assert!(user.contains("Questões Específicas: fratura?"));
    }

    #[test]
    fn laudo_template_lists_the_six_sections() {
        let prompt = generation_prompt(&GenerationRequest::Laudo(LaudoData {
            paciente: "Bruno".to_string(),
            idade: "52".to_string(),
            sexo: "M".to_string(),
            tipo: "raio-x".to_string(),
            queixa_principal: "dor torácica".to_string(),
            historico: "tabagista".to_string(),
            exame: "raio-x de tórax".to_string(),
            observacoes: None,
        }));
        assert!(prompt.contains("TIPO DE LAUDO: raio-x"));
        assert!(prompt.contains("Queixa Principal: dor torácica"));
        assert!(prompt.contains("5. Impressão diagnóstica"));
        assert!(prompt.contains("6. Conclusão"));
        assert!(!prompt.contains("Observações"));
    }

    #[test]
    fn relatorio_template_omits_absent_optionals() {
        let data = RelatorioData {
            paciente: "Carla".to_string(),
            idade: "47".to_string(),
            sexo: "F".to_string(),
            tipo: "alta hospitalar".to_string(),
            motivo_internacao: None,
            evolucao: "melhora progressiva".to_string(),
            procedimentos: "antibioticoterapia".to_string(),
            condicao_alta: Some("estável".to_string()),
            recomendacoes: "retorno em 7 dias".to_string(),
            observacoes: None,
        };
        let prompt = generation_prompt(&GenerationRequest::Relatorio(data));
        assert!(!prompt.contains("Motivo da Internação"));
        assert!(prompt.contains("Condição na Alta: estável"));
        assert!(prompt.contains("Evolução Clínica: melhora progressiva"));
        assert!(prompt.contains("7. Conclusão"));
    }

    #[test]
    fn receita_template_carries_prescription_fields() {
        let prompt = generation_prompt(&GenerationRequest::Receita(ReceitaData {
            paciente: "Davi".to_string(),
            idade: "8".to_string(),
            sexo: "M".to_string(),
            tipo: "simples".to_string(),
            diagnostico: "amigdalite".to_string(),
            medicamentos: "amoxicilina 500mg".to_string(),
            posologia: "8/8h".to_string(),
            duracao: "10 dias".to_string(),
            observacoes: Some("tomar após as refeições".to_string()),
        }));
        assert!(prompt.contains("Diagnóstico: amigdalite"));
        assert!(prompt.contains("Posologia: 8/8h"));
        assert!(prompt.contains("Duração do Tratamento: 10 dias"));
        assert!(prompt.contains("Observações: tomar após as refeições"));
    }
}
