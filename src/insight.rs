use crate::completion::CompletionClient;
use crate::types::Entry;
use tracing::warn;

pub const NO_HISTORY: &str = "Registra tus virtudes para ver análisis aquí.";
pub const NO_TEXT: &str = "Sigue así.";
pub const UNAVAILABLE: &str = "Continúa registrando tu progreso.";

/// Entries considered for a summary
const SUMMARY_WINDOW: usize = 5;

/// Short narrative summary of recent entries
pub struct InsightSummarizer<'a, C: CompletionClient + ?Sized> {
    client: &'a C,
    model: &'a str,
}

impl<'a, C: CompletionClient + ?Sized> InsightSummarizer<'a, C> {
    pub fn new(client: &'a C, model: &'a str) -> Self {
        Self { client, model }
    }

    /// Summarize the first five of `entries`; the caller puts the most relevant first.
    pub fn summarize(&self, entries: &[Entry]) -> String {
        if entries.is_empty() {
            return NO_HISTORY.to_string();
        }

        let prompt = insight_prompt(entries);
        match self.client.generate_text(self.model, &prompt) {
            Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => NO_TEXT.to_string(),
            Err(e) => {
                warn!(error = %e, "weekly insight failed");
                UNAVAILABLE.to_string()
            }
        }
    }
}

fn insight_prompt(entries: &[Entry]) -> String {
    let lines = entries
        .iter()
        .take(SUMMARY_WINDOW)
        .map(|e| format!("- {}: {}", e.virtue, e.reflection))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analiza estos registros recientes de un estudiante:\n\
         {lines}\n\
         \n\
         Escribe un resumen muy breve (máximo 2 frases) sobre su patrón de comportamiento \
         y una palabra clave que defina su semana."
    )
}
