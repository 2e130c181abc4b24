use crate::completion::{CompletionClient, CompletionError};
use crate::types::{Feedback, Virtue};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

const FALLBACK_ENCOURAGEMENT: &str = "¡Buen trabajo registrando tu progreso hoy!";
const FALLBACK_TIP: &str = "Intenta notar una oportunidad pequeña para practicar esto mañana.";
const FALLBACK_SCORE: u8 = 5;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Remote(#[from] CompletionError),

    #[error("model returned no text")]
    EmptyResponse,

    #[error("model returned invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model response violates schema: {0}")]
    Schema(String),
}

/// Turns a reflection into structured feedback via the completion service
pub struct FeedbackGateway<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    model: &'a str,
}

impl<'a, C: CompletionClient + ?Sized> FeedbackGateway<'a, C> {
    pub fn new(client: &'a C, model: &'a str) -> Self {
        Self { client, model }
    }

    /// Feedback used whenever the service can't give a valid answer
    pub fn fallback() -> Feedback {
        Feedback {
            encouragement: FALLBACK_ENCOURAGEMENT.to_string(),
            practical_tip: FALLBACK_TIP.to_string(),
            score: FALLBACK_SCORE,
        }
    }

    /// One call to the service. `reflection` must already be trimmed and non-empty.
    pub fn analyze(&self, virtue: Virtue, reflection: &str) -> Result<Feedback, GatewayError> {
        let prompt = feedback_prompt(virtue, reflection);
        let text = self
            .client
            .generate_json(self.model, &prompt, &feedback_schema())?
            .ok_or(GatewayError::EmptyResponse)?;

        parse_feedback(&text)
    }

    /// Like `analyze`, but any failure becomes the fallback feedback
    pub fn analyze_or_fallback(&self, virtue: Virtue, reflection: &str) -> Feedback {
        match self.analyze(virtue, reflection) {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!(error = %e, %virtue, "reflection analysis failed, using fallback");
                Self::fallback()
            }
        }
    }
}

fn feedback_prompt(virtue: Virtue, reflection: &str) -> String {
    format!(
        "El usuario es un estudiante escolar. Ha registrado una entrada en su diario de virtudes.\n\
         Virtud practicada: {virtue}.\n\
         Reflexión del estudiante: \"{reflection}\".\n\
         \n\
         Analiza esta entrada.\n\
         1. Proporciona una frase corta y motivadora (encouragement).\n\
         2. Sugiere un consejo práctico muy breve y concreto para mejorar o mantener esta virtud mañana (practicalTip).\n\
         3. Asigna una puntuación del 1 al 10 basada en la profundidad de la reflexión (score).\n\
         \n\
         Responde estrictamente en JSON."
    )
}

/// Response schema declared to the service
pub fn feedback_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "encouragement": { "type": "STRING" },
            "practicalTip": { "type": "STRING" },
            "score": { "type": "INTEGER" }
        },
        "required": ["encouragement", "practicalTip", "score"]
    })
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid fence regex")
    })
}

/// Exactly the declared schema: no extra keys, integer score
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FeedbackResponse {
    encouragement: String,
    practical_tip: String,
    score: u8,
}

/// Validate a model answer against the feedback schema
fn parse_feedback(text: &str) -> Result<Feedback, GatewayError> {
    let body = match code_fence().captures(text) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => text.trim(),
    };

    let feedback: FeedbackResponse = serde_json::from_str(body)?;

    if !(1..=10).contains(&feedback.score) {
        return Err(GatewayError::Schema(format!(
            "score {} outside 1-10",
            feedback.score
        )));
    }
    if feedback.encouragement.trim().is_empty() {
        return Err(GatewayError::Schema("empty encouragement".to_string()));
    }
    if feedback.practical_tip.trim().is_empty() {
        return Err(GatewayError::Schema("empty practicalTip".to_string()));
    }

    Ok(Feedback {
        encouragement: feedback.encouragement.trim().to_string(),
        practical_tip: feedback.practical_tip.trim().to_string(),
        score: feedback.score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::testing::{Reply, ScriptedClient};

    const MODEL: &str = "gemini-2.5-flash";

    fn analyze(reply: Reply) -> Result<Feedback, GatewayError> {
        let client = ScriptedClient::replying(vec![reply]);
        FeedbackGateway::new(&client, MODEL).analyze(Virtue::Honesty, "Dije la verdad")
    }

    #[test]
    fn test_valid_response_parses() {
        let feedback = analyze(Reply::Text(
            r#"{"encouragement":"¡Excelente!","practicalTip":"Repite mañana","score":8}"#,
        ))
        .unwrap();

        assert_eq!(feedback.encouragement, "¡Excelente!");
        assert_eq!(feedback.practical_tip, "Repite mañana");
        assert_eq!(feedback.score, 8);
    }

    #[test]
    fn test_fenced_response_parses() {
        let feedback = analyze(Reply::Text(
            "```json\n{\"encouragement\":\"Bien\",\"practicalTip\":\"Sigue\",\"score\":3}\n```",
        ))
        .unwrap();
        assert_eq!(feedback.score, 3);
    }

    #[test]
    fn test_error_variants() {
        assert!(matches!(analyze(Reply::Fail), Err(GatewayError::Remote(_))));
        assert!(matches!(analyze(Reply::Empty), Err(GatewayError::EmptyResponse)));
        assert!(matches!(analyze(Reply::Text("not json")), Err(GatewayError::Parse(_))));
        assert!(matches!(
            analyze(Reply::Text(r#"{"encouragement":"a","practicalTip":"b","score":11}"#)),
            Err(GatewayError::Schema(_))
        ));
        assert!(matches!(
            analyze(Reply::Text(r#"{"encouragement":"a","practicalTip":"b","score":0}"#)),
            Err(GatewayError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_or_extra_fields_rejected() {
        assert!(analyze(Reply::Text(r#"{"encouragement":"a","score":4}"#)).is_err());
        assert!(analyze(Reply::Text(
            r#"{"encouragement":"a","practicalTip":"b","score":4,"mood":"happy"}"#
        ))
        .is_err());
        assert!(analyze(Reply::Text(r#"{"encouragement":"a","practicalTip":"b","score":4.5}"#)).is_err());
    }

    #[test]
    fn test_remote_failure_yields_fallback() {
        for virtue in Virtue::ALL {
            let client = ScriptedClient::replying(vec![Reply::Fail]);
            let feedback = FeedbackGateway::new(&client, MODEL).analyze_or_fallback(virtue, "algo");

            assert_eq!(feedback, FeedbackGateway::<ScriptedClient>::fallback());
            assert_eq!(feedback.score, 5);
            assert_eq!(feedback.encouragement, "¡Buen trabajo registrando tu progreso hoy!");
            assert_eq!(
                feedback.practical_tip,
                "Intenta notar una oportunidad pequeña para practicar esto mañana."
            );
            assert_eq!(client.calls.get(), 1);
        }
    }

    #[test]
    fn test_malformed_json_yields_fallback() {
        let client = ScriptedClient::replying(vec![Reply::Text("{\"encouragement\": ")]);
        let feedback =
            FeedbackGateway::new(&client, MODEL).analyze_or_fallback(Virtue::Respect, "Escuché");
        assert_eq!(feedback, FeedbackGateway::<ScriptedClient>::fallback());
    }

    #[test]
    fn test_prompt_and_schema_sent() {
        let client = ScriptedClient::replying(vec![Reply::Empty]);
        let _ = FeedbackGateway::new(&client, MODEL).analyze(Virtue::Gratitude, "Agradecí a mi madre");

        let prompts = client.prompts.borrow();
        assert!(prompts[0].contains("Virtud practicada: Gratitud."));
        assert!(prompts[0].contains("\"Agradecí a mi madre\""));

        let schemas = client.schemas.borrow();
        assert_eq!(schemas[0], feedback_schema());
        assert_eq!(schemas[0]["properties"]["score"]["type"], "INTEGER");
    }
}
