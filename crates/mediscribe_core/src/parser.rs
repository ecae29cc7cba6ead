//! crates/mediscribe_core/src/parser.rs
//!
//! Heuristic, line-oriented parser for free-form analysis text coming back
//! from the completion service. It never fails: text with no recognizable
//! structure yields fixed placeholder lists and the raw text is always
//! preserved verbatim in the result.

use crate::domain::{AnalysisResult, Urgency};

/// Placeholder when no findings list could be extracted.
pub const FALLBACK_FINDINGS: &str = "Análise detalhada disponível no texto completo";
/// Placeholder when no recommendations list could be extracted.
pub const FALLBACK_RECOMMENDATIONS: &str = "Correlação clínica recomendada";
/// The parser does not derive confidence from text; it is a fixed constant.
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

enum Section {
    None,
    Findings,
    Recommendations,
}

/// Extracts structured fields from raw completion text.
///
/// Section detection is case-insensitive substring matching, bilingual
/// (Portuguese/English). A marker line switches the current section; within
/// findings/recommendations, dash-prefixed lines become list items. Urgency
/// markers are scanned on their own lines and the last match wins.
pub fn parse_analysis(raw: &str) -> AnalysisResult {
    let mut findings: Vec<String> = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    let mut urgency = Urgency::Low;
    let mut section = Section::None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();

        if lower.contains("achado") || lower.contains("finding") {
            section = Section::Findings;
        } else if lower.contains("recomenda") || lower.contains("recommendation") {
            section = Section::Recommendations;
        } else if lower.contains("urgência") || lower.contains("urgency") {
            if lower.contains("alta") || lower.contains("high") {
                urgency = Urgency::High;
            } else if lower.contains("média") || lower.contains("medium") {
                urgency = Urgency::Medium;
            }
        }

        // A marker line that itself starts with a dash is also captured.
        if let Some(item) = trimmed.strip_prefix('-') {
            let item = item.trim();
            if !item.is_empty() {
                match section {
                    Section::Findings => findings.push(item.to_string()),
                    Section::Recommendations => recommendations.push(item.to_string()),
                    Section::None => {}
                }
            }
        }
    }

    if findings.is_empty() {
        findings.push(FALLBACK_FINDINGS.to_string());
    }
    if recommendations.is_empty() {
        recommendations.push(FALLBACK_RECOMMENDATIONS.to_string());
    }

    AnalysisResult {
        analysis: raw.to_string(),
        findings,
        recommendations,
        urgency,
        confidence: DEFAULT_CONFIDENCE,
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_placeholders() {
        let result = parse_analysis("");
        assert_eq!(result.analysis, "");
        assert_eq!(result.findings, vec![FALLBACK_FINDINGS.to_string()]);
        assert_eq!(
            result.recommendations,
            vec![FALLBACK_RECOMMENDATIONS.to_string()]
        );
        assert_eq!(result.urgency, Urgency::Low);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn unstructured_prose_keeps_raw_text_and_falls_back() {
        let raw = "O exame está dentro dos padrões de normalidade.\nSem alterações.";
        let result = parse_analysis(raw);
        assert_eq!(result.analysis, raw);
        assert_eq!(result.findings, vec![FALLBACK_FINDINGS.to_string()]);
        assert_eq!(result.urgency, Urgency::Low);
    }

    #[test]
    fn sections_capture_dash_items_in_order() {
        let raw = "\
1. Achados principais:
- Opacidade em lobo superior direito
- Índice cardiotorácico preservado

2. Recomendações de conduta:
- Tomografia de tórax para caracterização
- Correlação com quadro clínico";
        let result = parse_analysis(raw);
        assert_eq!(
            result.findings,
            vec![
                "Opacidade em lobo superior direito".to_string(),
                "Índice cardiotorácico preservado".to_string(),
            ]
        );
        assert_eq!(
            result.recommendations,
            vec![
                "Tomografia de tórax para caracterização".to_string(),
                "Correlação com quadro clínico".to_string(),
            ]
        );
    }

    #[test]
    fn section_detection_is_case_insensitive_and_bilingual() {
        let raw = "\
MAIN FINDINGS:
- right pleural effusion
RECOMMENDATIONS:
- thoracentesis";
        let result = parse_analysis(raw);
        assert_eq!(result.findings, vec!["right pleural effusion".to_string()]);
        assert_eq!(result.recommendations, vec!["thoracentesis".to_string()]);
    }

    #[test]
    fn urgency_marker_on_same_line_sets_level() {
        let result = parse_analysis("Nível de urgência: ALTA");
        assert_eq!(result.urgency, Urgency::High);

        let result = parse_analysis("Urgency level: medium");
        assert_eq!(result.urgency, Urgency::Medium);

        // Marker line without a level keeps the default.
        let result = parse_analysis("Nível de urgência: baixo");
        assert_eq!(result.urgency, Urgency::Low);
    }

    #[test]
    fn urgency_last_match_wins() {
        let raw = "\
Urgência: alta
Texto intermediário.
Urgência: média";
        let result = parse_analysis(raw);
        assert_eq!(result.urgency, Urgency::Medium);
    }

    #[test]
    fn dash_lines_outside_any_section_are_ignored() {
        let raw = "\
- item solto antes de qualquer seção
Achados:
- item capturado";
        let result = parse_analysis(raw);
        assert_eq!(result.findings, vec!["item capturado".to_string()]);
    }

    #[test]
    fn never_panics_on_arbitrary_text() {
        for raw in [
            "----",
            "\n\n\n",
            "urgência urgência urgência",
            "achado recomenda urgência alta média",
            "🩻 emoji e unicode £¢ variado\n- com item perdido",
        ] {
            let result = parse_analysis(raw);
            assert!(!result.findings.is_empty());
            assert!(!result.recommendations.is_empty());
            assert_eq!(result.analysis, raw);
        }
    }
}
