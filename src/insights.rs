// Insight extraction: prompt construction and response normalization.
//
// The model is instructed to answer in a fixed JSON schema. Whatever comes
// back, the stored analysis result always conforms to `InsightReport`: a
// response that fails to parse as the schema is replaced by a
// deterministic fallback built from the raw text.

use crate::models::InsightReport;

pub const SYSTEM_PROMPT: &str = r#"You are a medical conversation analysis AI. Analyze the following doctor-patient conversation transcript and provide insights in the following JSON format:
{
  "summary": "A concise summary of the conversation highlighting the main medical concerns, symptoms, and diagnosis/treatment discussed",
  "keyPoints": [
    "Key point 1",
    "Key point 2",
    "Key point 3"
  ],
  "followUp": [
    "Follow-up action 1",
    "Follow-up action 2"
  ],
  "medicalTerms": [
    {
      "term": "medical term",
      "definition": "explanation of the term"
    }
  ],
  "symptoms": ["list of symptoms mentioned"],
  "diagnosis": "potential diagnosis mentioned",
  "treatmentPlan": "treatment plan discussed"
}
Focus on accuracy and provide clinically relevant insights."#;

/// Maximum number of characters of raw model output carried into the
/// fallback summary.
const FALLBACK_SUMMARY_CHARS: usize = 500;

pub fn user_prompt(transcript: &str) -> String {
    format!(
        "Please analyze this medical conversation transcript:\n\n{}",
        transcript
    )
}

/// Parse the model's text response as the insight schema, falling back to
/// a deterministic placeholder report when it is not valid.
pub fn normalize(raw: &str) -> InsightReport {
    serde_json::from_str::<InsightReport>(raw).unwrap_or_else(|_| fallback(raw))
}

/// Deterministic placeholder built from unparseable model output: the
/// first 500 characters of the raw text with an ellipsis marker, plus
/// fixed values for every other field.
pub fn fallback(raw: &str) -> InsightReport {
    let truncated: String = raw.chars().take(FALLBACK_SUMMARY_CHARS).collect();
    InsightReport {
        summary: format!("{}...", truncated),
        key_points: vec![
            "Analysis completed".to_string(),
            "Please review transcript".to_string(),
        ],
        follow_up: vec!["Schedule follow-up appointment".to_string()],
        medical_terms: vec![],
        symptoms: vec![],
        diagnosis: "To be determined".to_string(),
        treatment_plan: "To be discussed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_schema_passes_through() {
        let raw = r#"{
            "summary": "Patient reports recurring headaches.",
            "keyPoints": ["Recurring headaches", "Light sensitivity"],
            "followUp": ["Neurology referral"],
            "medicalTerms": [{"term": "photophobia", "definition": "light sensitivity"}],
            "symptoms": ["headache", "photophobia"],
            "diagnosis": "Probable migraine",
            "treatmentPlan": "Trial of triptans"
        }"#;
        let report = normalize(raw);
        assert_eq!(report.summary, "Patient reports recurring headaches.");
        assert_eq!(report.medical_terms.len(), 1);
        assert_eq!(report.diagnosis, "Probable migraine");
    }

    #[test]
    fn test_invalid_output_yields_exact_fallback() {
        let report = normalize("Patient has migraines");
        let expected = serde_json::json!({
            "summary": "Patient has migraines...",
            "keyPoints": ["Analysis completed", "Please review transcript"],
            "followUp": ["Schedule follow-up appointment"],
            "medicalTerms": [],
            "symptoms": [],
            "diagnosis": "To be determined",
            "treatmentPlan": "To be discussed"
        });
        assert_eq!(serde_json::to_value(&report).unwrap(), expected);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let raw = "The model wandered off and wrote prose instead of JSON.";
        assert_eq!(normalize(raw), normalize(raw));
    }

    #[test]
    fn test_fallback_truncates_long_output() {
        let raw = "x".repeat(1200);
        let report = normalize(&raw);
        assert_eq!(report.summary.chars().count(), 503);
        assert!(report.summary.ends_with("..."));
    }

    #[test]
    fn test_fallback_truncation_is_char_safe() {
        // Multibyte characters must not be split mid-codepoint.
        let raw = "é".repeat(600);
        let report = normalize(&raw);
        assert!(report.summary.starts_with("é"));
        assert_eq!(report.summary.chars().count(), 503);
    }

    #[test]
    fn test_json_missing_summary_falls_back() {
        let raw = r#"{"keyPoints": ["a"], "diagnosis": "flu"}"#;
        let report = normalize(raw);
        assert_eq!(report.diagnosis, "To be determined");
        assert!(report.summary.ends_with("..."));
    }
}
