//! services/api/src/assistant/mod.rs
//!
//! Orchestrates one request/response cycle against the completion endpoint:
//! build the request, dispatch it, and normalize the answer. One-sentence tasks
//! hand back the model's text as-is; report tasks are also split into sections.

pub mod retry;

use beyond_bark_core::{
    ports::{CompletionService, PortError, PortResult},
    prompts::{build_request, AssistTask, ModelCatalog},
    sections::{split_sections, ParsedSections, CARE_SUGGESTION_LABELS},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use retry::RetryPolicy;

/// A report-style answer: the raw completion and its extracted sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub raw: String,
    pub sections: ParsedSections,
}

impl Assessment {
    fn from_report(raw: String, labels: &[&str]) -> Self {
        let sections = split_sections(&raw, labels);
        Self { raw, sections }
    }
}

#[derive(Clone)]
pub struct PetAssistant {
    completion: Arc<dyn CompletionService>,
    models: ModelCatalog,
    retry: RetryPolicy,
}

impl PetAssistant {
    pub fn new(completion: Arc<dyn CompletionService>, models: ModelCatalog, retry: RetryPolicy) -> Self {
        Self {
            completion,
            models,
            retry,
        }
    }

    /// Describes the mood of the animal in a hosted photo, in one sentence.
    pub async fn predict_mood(&self, image_url: &str, species: &str) -> PortResult<String> {
        self.sentence(AssistTask::MoodDetection { image_url, species }).await
    }

    /// Names a likely disease visible in a hosted photo, in one sentence.
    pub async fn predict_disease(&self, image_url: &str, species: &str) -> PortResult<String> {
        self.sentence(AssistTask::DiseasePrediction { image_url, species }).await
    }

    pub async fn ask(&self, question: &str) -> PortResult<String> {
        self.sentence(AssistTask::Chatbot { question }).await
    }

    pub async fn assess_symptoms(&self, symptoms: &str, species: &str) -> PortResult<Assessment> {
        self.report(AssistTask::SymptomAssessment { symptoms, species }).await
    }

    pub async fn identify_species(&self, image_url: &str) -> PortResult<Assessment> {
        self.report(AssistTask::SpeciesIdentification { image_url }).await
    }

    /// Fetches care suggestions for a mood, retrying transient failures and
    /// answers with no recognizable sections. If every attempt comes back
    /// without sections, the last answer is returned with empty sections.
    pub async fn care_suggestions(&self, mood: &str, cancel: &CancellationToken) -> PortResult<Assessment> {
        let outcome = self
            .retry
            .run(cancel, |attempt| self.care_attempt(mood, attempt))
            .await;

        match outcome {
            Err(PortError::RetriesExhausted { attempts, last }) => match *last {
                PortError::EmptyReport { raw } => {
                    warn!(attempts, "No usable care suggestions after retrying");
                    Ok(Assessment::from_report(raw, CARE_SUGGESTION_LABELS))
                }
                other => Err(PortError::RetriesExhausted {
                    attempts,
                    last: Box::new(other),
                }),
            },
            other => other,
        }
    }

    async fn care_attempt(&self, mood: &str, attempt: u32) -> PortResult<Assessment> {
        info!(attempt, "Requesting care suggestions");
        let raw = self.complete_text(AssistTask::CareSuggestions { mood }).await?;
        let assessment = Assessment::from_report(raw, CARE_SUGGESTION_LABELS);
        if assessment.sections.is_empty() {
            return Err(PortError::EmptyReport {
                raw: assessment.raw,
            });
        }
        Ok(assessment)
    }

    async fn sentence(&self, task: AssistTask<'_>) -> PortResult<String> {
        let text = self.complete_text(task).await?;
        if text.is_empty() {
            return Err(PortError::Unexpected(
                "The model returned no text content.".to_string(),
            ));
        }
        Ok(text)
    }

    async fn report(&self, task: AssistTask<'_>) -> PortResult<Assessment> {
        let labels = task.kind().report_labels().unwrap_or_default();
        let raw = self.complete_text(task).await?;
        Ok(Assessment::from_report(raw, labels))
    }

    /// Dispatches the task and returns the trimmed text of the first choice,
    /// or an empty string when the model produced nothing.
    async fn complete_text(&self, task: AssistTask<'_>) -> PortResult<String> {
        let kind = task.kind();
        let request = build_request(&task, &self.models);
        let response = self.completion.complete(request).await?;
        let text = response.first_content().unwrap_or_default().trim().to_string();
        info!(
            ?kind,
            completion_tokens = response.usage.completion_tokens,
            chars = text.len(),
            "Completion normalized"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{reply, ScriptedCompletion};
    use beyond_bark_core::chat::Role;
    use std::time::Duration;

    fn assistant(completion: Arc<ScriptedCompletion>, attempts: u32) -> PetAssistant {
        PetAssistant::new(
            completion,
            ModelCatalog {
                vision_model: "vision".to_string(),
                text_model: "text".to_string(),
            },
            RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(2)),
        )
    }

    const REPORT: &str = "Mood Explanation: Anxious.\nWhat to Do: Comfort it.\nWhat to Feed: Light meals.\nAny Additional Care Tips: Keep it indoors.";

    #[tokio::test]
    async fn care_suggestions_are_split_into_sections() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(reply(REPORT))]));
        let result = assistant(completion.clone(), 3)
            .care_suggestions("anxious", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.sections.get("What to Feed"), Some("Light meals."));
        let requests = completion.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[0].role(), Role::System);
        assert!(requests[0].messages[1].content().contains("anxious"));
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once_and_recovers() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Err(PortError::Transport("timed out".to_string())),
            Ok(reply(REPORT)),
        ]));
        let result = assistant(completion.clone(), 3)
            .care_suggestions("anxious", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.sections.get("Mood Explanation"), Some("Anxious."));
        assert_eq!(completion.requests().len(), 2);
    }

    #[tokio::test]
    async fn unusable_answers_fall_back_to_empty_sections() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(reply("I cannot help with that.")),
            Ok(reply("Still nothing useful.")),
        ]));
        let result = assistant(completion.clone(), 2)
            .care_suggestions("sleepy", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.requests().len(), 2);
        assert_eq!(result.raw, "Still nothing useful.");
        assert_eq!(result.sections.len(), 4);
        assert!(result.sections.is_empty());
    }

    #[tokio::test]
    async fn rejected_request_is_not_retried() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Err(PortError::Rejected(
            "model not found".to_string(),
        ))]));
        let err = assistant(completion.clone(), 3)
            .care_suggestions("happy", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Rejected(_)));
        assert_eq!(completion.requests().len(), 1);
    }

    #[tokio::test]
    async fn one_sentence_tasks_return_trimmed_text_without_retry() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            Ok(reply("  The dog looks relaxed and content.\n")),
            Err(PortError::Transport("offline".to_string())),
        ]));
        let assistant = assistant(completion.clone(), 3);

        let mood = assistant
            .predict_mood("https://i.ibb.co/a/dog.jpg", "Dog")
            .await
            .unwrap();
        assert_eq!(mood, "The dog looks relaxed and content.");
        assert_eq!(completion.requests()[0].model, "vision");

        let err = assistant.ask("Is chocolate safe?").await.unwrap_err();
        assert!(matches!(err, PortError::Transport(_)));
        assert_eq!(completion.requests().len(), 2);
    }

    #[tokio::test]
    async fn empty_sentence_is_an_error() {
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(reply("   "))]));
        let err = assistant(completion, 1)
            .predict_disease("https://i.ibb.co/a/cat.jpg", "Cat")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn species_report_keeps_raw_text_and_sections() {
        let raw = "Species Name: Felis catus (domestic cat)\nBreed Name: Siamese\nWhat It Eats: Meat.";
        let completion = Arc::new(ScriptedCompletion::new(vec![Ok(reply(raw))]));
        let report = assistant(completion, 1)
            .identify_species("https://i.ibb.co/a/cat.jpg")
            .await
            .unwrap();

        assert_eq!(report.raw, raw);
        assert_eq!(report.sections.get("Breed Name"), Some("Siamese"));
        assert_eq!(report.sections.get("Ideal Climate"), Some(""));
    }
}
