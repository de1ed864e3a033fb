//! crates/beyond_bark_core/src/prompts.rs
//!
//! Turns a task and its inputs into a `ChatRequest`. Every task maps to a fixed
//! persona, a fixed prompt template and a token budget. Building a request is a
//! pure formatting step: inputs are interpolated as given and never validated.

use crate::chat::{ChatRequest, Message};
use crate::sections::{CARE_SUGGESTION_LABELS, SPECIES_REPORT_LABELS, SYMPTOM_REPORT_LABELS};

//=========================================================================================
// Personas
//=========================================================================================

const HELPFUL_ASSISTANT: &str = "Act like you are a helpful assistant.";

const VETERINARY_ASSISTANT: &str =
    "You are an expert veterinary assistant with more than 10 years of clinical experience.";

const WILDLIFE_BIOLOGIST: &str = "You are a wildlife biologist AI with 20 years of experience in zoology and veterinary science, able to identify any living creature.";

//=========================================================================================
// Prompt Templates
//=========================================================================================

const MOOD_DETECTION_TEMPLATE: &str = r#"You are a highly capable vision-language model. Analyze the image at this URL: {image_url}

The user says the species is: {species}.

First, check whether that matches the image.
Then decide whether the subject is a pet or a wild animal.
Finally, describe the emotional or behavioral state of the subject in ONE clear, concise sentence, based only on visible cues such as posture, facial expression or activity.

Respond only with that final sentence."#;

const DISEASE_PREDICTION_TEMPLATE: &str = r#"Analyze this pet image: {image_url}
The species is: {species}.
Predict any disease or visible health issue and explain it in ONE concise sentence."#;

const SYMPTOM_ASSESSMENT_TEMPLATE: &str = r#"Analyze the following symptoms described for a {species}:

"{symptoms}"

Respond with a structured report using exactly these headings:

{headings}

Stay concise, compassionate and clear."#;

const SPECIES_IDENTIFICATION_TEMPLATE: &str = r#"Given this image: {image_url}

Identify the species shown as accurately as possible, then give the following details using exactly these headings:

{headings}

Respond clearly using the headings above. Avoid disclaimers or vague statements."#;

const CHATBOT_TEMPLATE: &str = r#"A pet owner asked: "{question}".
Give a brief, clear and valuable answer in 2-3 sentences or bullet points.
Avoid lengthy explanations, but make sure the answer is informative and helpful."#;

const CARE_SUGGESTIONS_TEMPLATE: &str = r#"A pet is showing this mood: "{mood}".
Give well-formatted, detailed guidance using exactly these section headings:

{headings}

Use the headings above exactly as written and keep each section clear."#;

//=========================================================================================
// Task Definitions
//=========================================================================================

/// The kinds of request the assistant knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    MoodDetection,
    DiseasePrediction,
    SymptomAssessment,
    SpeciesIdentification,
    Chatbot,
    CareSuggestions,
}

impl TaskKind {
    /// Small budgets for one-sentence answers, large ones for multi-section reports.
    pub fn max_tokens(self) -> u32 {
        match self {
            TaskKind::MoodDetection | TaskKind::DiseasePrediction => 256,
            TaskKind::Chatbot => 1024,
            TaskKind::SymptomAssessment | TaskKind::SpeciesIdentification => 3072,
            TaskKind::CareSuggestions => 4096,
        }
    }

    pub fn persona(self) -> &'static str {
        match self {
            TaskKind::MoodDetection => HELPFUL_ASSISTANT,
            TaskKind::DiseasePrediction
            | TaskKind::SymptomAssessment
            | TaskKind::Chatbot
            | TaskKind::CareSuggestions => VETERINARY_ASSISTANT,
            TaskKind::SpeciesIdentification => WILDLIFE_BIOLOGIST,
        }
    }

    /// The section headings a report-style task asks the model to emit.
    /// One-sentence tasks have none and are returned as raw text.
    pub fn report_labels(self) -> Option<&'static [&'static str]> {
        match self {
            TaskKind::SymptomAssessment => Some(SYMPTOM_REPORT_LABELS),
            TaskKind::SpeciesIdentification => Some(SPECIES_REPORT_LABELS),
            TaskKind::CareSuggestions => Some(CARE_SUGGESTION_LABELS),
            TaskKind::MoodDetection | TaskKind::DiseasePrediction | TaskKind::Chatbot => None,
        }
    }

    fn uses_vision(self) -> bool {
        matches!(
            self,
            TaskKind::MoodDetection | TaskKind::DiseasePrediction | TaskKind::SpeciesIdentification
        )
    }
}

/// A task together with the inputs it interpolates.
#[derive(Debug, Clone, Copy)]
pub enum AssistTask<'a> {
    MoodDetection { image_url: &'a str, species: &'a str },
    DiseasePrediction { image_url: &'a str, species: &'a str },
    SymptomAssessment { symptoms: &'a str, species: &'a str },
    SpeciesIdentification { image_url: &'a str },
    Chatbot { question: &'a str },
    CareSuggestions { mood: &'a str },
}

impl AssistTask<'_> {
    pub fn kind(&self) -> TaskKind {
        match self {
            AssistTask::MoodDetection { .. } => TaskKind::MoodDetection,
            AssistTask::DiseasePrediction { .. } => TaskKind::DiseasePrediction,
            AssistTask::SymptomAssessment { .. } => TaskKind::SymptomAssessment,
            AssistTask::SpeciesIdentification { .. } => TaskKind::SpeciesIdentification,
            AssistTask::Chatbot { .. } => TaskKind::Chatbot,
            AssistTask::CareSuggestions { .. } => TaskKind::CareSuggestions,
        }
    }
}

/// Which model handles which kind of task. Image tasks need a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    pub vision_model: String,
    pub text_model: String,
}

impl ModelCatalog {
    pub fn model_for(&self, kind: TaskKind) -> &str {
        if kind.uses_vision() {
            &self.vision_model
        } else {
            &self.text_model
        }
    }
}

//=========================================================================================
// Request Builder
//=========================================================================================

/// Builds the two-message request (system persona, user prompt) for a task.
pub fn build_request(task: &AssistTask<'_>, models: &ModelCatalog) -> ChatRequest {
    let kind = task.kind();
    let user_message = match *task {
        AssistTask::MoodDetection { image_url, species } => Message::user_with_image(
            fill(
                MOOD_DETECTION_TEMPLATE,
                &[("{image_url}", image_url), ("{species}", species)],
            ),
            image_url,
        ),
        AssistTask::DiseasePrediction { image_url, species } => Message::user_with_image(
            fill(
                DISEASE_PREDICTION_TEMPLATE,
                &[("{image_url}", image_url), ("{species}", species)],
            ),
            image_url,
        ),
        AssistTask::SymptomAssessment { symptoms, species } => Message::user(fill(
            SYMPTOM_ASSESSMENT_TEMPLATE,
            &[
                ("{headings}", heading_block(SYMPTOM_REPORT_LABELS).as_str()),
                ("{species}", species),
                ("{symptoms}", symptoms),
            ],
        )),
        AssistTask::SpeciesIdentification { image_url } => Message::user_with_image(
            fill(
                SPECIES_IDENTIFICATION_TEMPLATE,
                &[
                    ("{headings}", heading_block(SPECIES_REPORT_LABELS).as_str()),
                    ("{image_url}", image_url),
                ],
            ),
            image_url,
        ),
        AssistTask::Chatbot { question } => {
            Message::user(fill(CHATBOT_TEMPLATE, &[("{question}", question)]))
        }
        AssistTask::CareSuggestions { mood } => Message::user(fill(
            CARE_SUGGESTIONS_TEMPLATE,
            &[
                ("{headings}", heading_block(CARE_SUGGESTION_LABELS).as_str()),
                ("{mood}", mood),
            ],
        )),
    };

    ChatRequest {
        model: models.model_for(kind).to_string(),
        messages: vec![Message::system(kind.persona()), user_message],
        max_tokens: kind.max_tokens(),
    }
}

/// Resolves a species picked from a fixed list, where "Other" means the user
/// typed the species in by hand.
pub fn resolve_species<'a>(selected: &'a str, other: Option<&'a str>) -> &'a str {
    match other {
        Some(typed) if selected.eq_ignore_ascii_case("other") && !typed.trim().is_empty() => {
            typed.trim()
        }
        _ => selected,
    }
}

/// Fills `{placeholder}`s in one left-to-right pass over the template.
/// Substituted text is never scanned again, so input that happens to contain
/// a placeholder stays literal.
fn fill(template: &str, fields: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let tail = &rest[open..];
        match fields.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                filled.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                filled.push('{');
                rest = &tail[1..];
            }
        }
    }
    filled.push_str(rest);
    filled
}

fn heading_block(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| format!("{label}:\n[...]"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    fn models() -> ModelCatalog {
        ModelCatalog {
            vision_model: "vision-model".to_string(),
            text_model: "text-model".to_string(),
        }
    }

    #[test]
    fn care_suggestions_request_shape() {
        let request = build_request(&AssistTask::CareSuggestions { mood: "anxious" }, &models());

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role(), Role::System);
        assert_eq!(request.messages[1].role(), Role::User);
        assert!(request.messages[1].content().contains("anxious"));
        for label in CARE_SUGGESTION_LABELS {
            assert!(request.messages[1].content().contains(label));
        }
        assert_eq!(request.model, "text-model");
    }

    #[test]
    fn image_tasks_use_vision_model_and_attach_image() {
        let url = "https://i.ibb.co/abc/dog.jpg";
        let request = build_request(
            &AssistTask::MoodDetection {
                image_url: url,
                species: "Dog",
            },
            &models(),
        );

        assert_eq!(request.model, "vision-model");
        assert_eq!(request.messages[1].image_url(), Some(url));
        assert!(request.messages[1].content().contains(url));
        assert!(request.messages[1].content().contains("Dog"));
        assert!(request.messages[0].image_url().is_none());
    }

    #[test]
    fn one_sentence_tasks_get_smaller_budgets_than_reports() {
        let mood = build_request(
            &AssistTask::DiseasePrediction {
                image_url: "https://x/y.png",
                species: "Cat",
            },
            &models(),
        );
        let report = build_request(
            &AssistTask::SpeciesIdentification {
                image_url: "https://x/y.png",
            },
            &models(),
        );
        assert!(mood.max_tokens < report.max_tokens);
        assert!(TaskKind::Chatbot.max_tokens() < TaskKind::CareSuggestions.max_tokens());
    }

    #[test]
    fn personas_match_task() {
        let species = build_request(
            &AssistTask::SpeciesIdentification {
                image_url: "https://x/y.png",
            },
            &models(),
        );
        assert!(species.messages[0].content().contains("wildlife biologist"));

        let chat = build_request(&AssistTask::Chatbot { question: "Can dogs eat grapes?" }, &models());
        assert!(chat.messages[0].content().contains("veterinary assistant"));
        assert!(chat.messages[1].content().contains("Can dogs eat grapes?"));
    }

    #[test]
    fn empty_input_passes_through() {
        let request = build_request(&AssistTask::Chatbot { question: "" }, &models());
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content().contains("asked: \"\""));
    }

    #[test]
    fn symptom_report_lists_its_headings() {
        let request = build_request(
            &AssistTask::SymptomAssessment {
                symptoms: "vomiting since morning",
                species: "Cat",
            },
            &models(),
        );
        let prompt = request.messages[1].content();
        assert!(prompt.contains("vomiting since morning"));
        assert!(prompt.contains("for a Cat"));
        assert!(prompt.contains("Suspected Disease(s):"));
        assert!(request.messages[1].image_url().is_none());
    }

    #[test]
    fn placeholders_in_user_text_stay_literal() {
        let request = build_request(&AssistTask::CareSuggestions { mood: "{headings}" }, &models());
        let prompt = request.messages[1].content();
        assert!(prompt.contains("showing this mood: \"{headings}\""));
        assert_eq!(prompt.matches("Mood Explanation:").count(), 1);

        let request = build_request(
            &AssistTask::SymptomAssessment {
                symptoms: "limping {species}",
                species: "Dog",
            },
            &models(),
        );
        assert!(request.messages[1].content().contains("\"limping {species}\""));
    }

    #[test]
    fn resolve_species_prefers_typed_value_for_other() {
        assert_eq!(resolve_species("Dog", Some("Ferret")), "Dog");
        assert_eq!(resolve_species("Other", Some(" Ferret ")), "Ferret");
        assert_eq!(resolve_species("Other", Some("  ")), "Other");
        assert_eq!(resolve_species("Cat", None), "Cat");
    }
}
