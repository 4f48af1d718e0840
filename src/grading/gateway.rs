//! Boundary to the remote grading service

use std::fmt::Display;
use std::future::Future;

use crate::claude::{ClaudeClient, ClaudeModel, CreateMessageRequest, Message};

use super::parser::{ParsedFeedback, extract_score, parse_feedback};
use super::prompt::{GradingRequest, build_prompt, system_prompt};
use super::sections::{Language, SectionKey, SectionSet};

/// A text-in/text-out grading service
pub trait Grader {
    type Error: Display;

    /// Send one prompt and return the service's reply text
    fn complete(&self, prompt: String) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Outcome of asking the gateway to grade an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    /// Raw reply text; on failure, the error message behind the error marker
    Graded(String),
    /// An input was blank and nothing was sent
    MissingInput(&'static str),
}

/// Builds grading requests and turns service failures into reply text
#[derive(Debug, Clone)]
pub struct GradingGateway<G> {
    grader: G,
    language: Language,
}

impl<G: Grader> GradingGateway<G> {
    pub fn new(grader: G, language: Language) -> Self {
        Self { grader, language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn sections(&self) -> &'static SectionSet {
        self.language.sections()
    }

    /// Grade `request` with a single call to the service, no retry
    pub async fn evaluate(&self, request: &GradingRequest<'_>) -> GatewayReply {
        let set = self.sections();
        if !request.is_complete() {
            return GatewayReply::MissingInput(set.missing_input);
        }

        let prompt = build_prompt(self.language, request);
        tracing::debug!("Grading answer ({} chars prompt)", prompt.len());

        match self.grader.complete(prompt).await {
            Ok(reply) => {
                tracing::debug!("Grader replied with {} chars", reply.len());
                GatewayReply::Graded(reply)
            }
            Err(e) => {
                tracing::warn!("Grading failed: {}", e);
                GatewayReply::Graded(format!("{}{}", set.error_marker, e))
            }
        }
    }
}

/// A grader reply with the fields the history keeps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub raw: String,
    pub feedback: ParsedFeedback,
    pub score: Option<u32>,
    /// Content gaps text, absent when the section is missing or unparsed
    pub content_gaps: Option<String>,
}

impl GradedAnswer {
    pub fn from_reply(raw: String, set: &SectionSet) -> Self {
        let feedback = parse_feedback(&raw, set);
        let score = extract_score(&feedback);
        let content_gaps = feedback
            .section(SectionKey::ContentGaps)
            .filter(|gaps| *gaps != set.unavailable)
            .map(str::to_string);
        Self { raw, feedback, score, content_gaps }
    }
}

/// Grader backed by the Claude messages API
pub struct ClaudeGrader {
    client: ClaudeClient,
    model: ClaudeModel,
    language: Language,
}

impl ClaudeGrader {
    /// Maximum reply length; five short sections fit comfortably
    const MAX_TOKENS: u32 = 1024;

    pub fn new(client: ClaudeClient, model: ClaudeModel, language: Language) -> Self {
        Self { client, model, language }
    }
}

impl Grader for ClaudeGrader {
    type Error = crate::claude::ClaudeError;

    async fn complete(&self, prompt: String) -> Result<String, Self::Error> {
        let request = CreateMessageRequest::new(self.model, vec![Message::user(prompt)])
            .with_system(system_prompt(self.language))
            .with_max_tokens(Self::MAX_TOKENS);

        let response = self.client.send_message(request).await?;
        Ok(response.text())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use pretty_assertions::assert_eq;

    /// Grader that replays canned replies and counts calls
    #[derive(Default)]
    pub(crate) struct ScriptedGrader {
        replies: Mutex<Vec<Result<String, String>>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedGrader {
        pub(crate) fn replying(replies: Vec<Result<String, String>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self { replies: Mutex::new(replies), calls: AtomicUsize::new(0) }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Grader for ScriptedGrader {
        type Error = String;

        async fn complete(&self, _prompt: String) -> Result<String, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies.lock().unwrap().pop().unwrap_or_else(|| Err("no reply scripted".into()))
        }
    }

    impl Grader for &ScriptedGrader {
        type Error = String;

        async fn complete(&self, prompt: String) -> Result<String, String> {
            (**self).complete(prompt).await
        }
    }

    fn request<'a>(answer: &'a str) -> GradingRequest<'a> {
        GradingRequest {
            question: "O que é dolo?",
            candidate_answer: answer,
            reference_answer: "Vontade consciente.",
        }
    }

    #[tokio::test]
    async fn blank_answer_makes_no_call() {
        let grader = ScriptedGrader::replying(vec![Ok("unused".into())]);
        let gateway = GradingGateway::new(&grader, Language::Pt);

        let reply = gateway.evaluate(&request("   ")).await;

        assert_eq!(
            reply,
            GatewayReply::MissingInput("Por favor, forneça ambas as respostas para comparação.")
        );
        assert_eq!(grader.calls(), 0);
    }

    #[tokio::test]
    async fn failure_becomes_feedback_text() {
        let grader = ScriptedGrader::replying(vec![Err("quota exceeded".into())]);
        let gateway = GradingGateway::new(&grader, Language::En);

        let reply = gateway.evaluate(&request("An answer")).await;

        assert_eq!(reply, GatewayReply::Graded("Error contacting the grader: quota exceeded".into()));
        assert_eq!(grader.calls(), 1);
    }

    #[test]
    fn graded_answer_extracts_history_fields() {
        let raw = "**1. Pontuação de Sentido (0-100):** 72% complete\n\
                   **3. Lacunas de Conteúdo:** - faltou o elemento volitivo"
            .to_string();
        let graded = GradedAnswer::from_reply(raw, &crate::grading::sections::PORTUGUESE);
        assert_eq!(graded.score, Some(72));
        assert_eq!(graded.content_gaps.as_deref(), Some("- faltou o elemento volitivo"));
    }

    #[test]
    fn unavailable_gaps_are_not_stored() {
        let raw = "**1. Pontuação de Sentido (0-100):** 90".to_string();
        let graded = GradedAnswer::from_reply(raw, &crate::grading::sections::PORTUGUESE);
        assert_eq!(graded.content_gaps, None);
    }
}
