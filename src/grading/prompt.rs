//! Grading prompt templates

use super::sections::{Language, SectionKey};

/// The texts a grading request compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradingRequest<'a> {
    pub question: &'a str,
    pub candidate_answer: &'a str,
    pub reference_answer: &'a str,
}

impl GradingRequest<'_> {
    /// Whether every text is non-empty after trimming
    pub fn is_complete(&self) -> bool {
        [self.question, self.candidate_answer, self.reference_answer]
            .iter()
            .all(|s| !s.trim().is_empty())
    }
}

/// System prompt that pins the reply format
pub fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::Pt => {
            "Você é um corretor de questões discursivas. Responda sempre em português, \
             seguindo exatamente a estrutura de seções pedida, com os títulos em negrito."
        }
        Language::En => {
            "You grade open-ended study answers. Always follow the requested section \
             structure exactly, with the section titles in bold."
        }
    }
}

/// Build the grading prompt for `request`
pub fn build_prompt(language: Language, request: &GradingRequest<'_>) -> String {
    let set = language.sections();
    let title = |key| set.section(key).marker;

    match language {
        Language::Pt => format!(
            "Forneça um feedback **sucinto e objetivo** para a 'Resposta do Usuário' em \
             comparação com a 'Resposta Esperada', focando nos pontos essenciais.\n\n\
             **Estrutura de Feedback Requerida:**\n\n\
             {score}\n\
             [Pontuação numérica de 0 a 100% pela similaridade de sentido com a Resposta \
             Esperada. 100% = sentido idêntico e completo.]\n\n\
             {eval}\n\
             [Avaliação qualitativa muito breve (ex: \"Excelente.\", \"Bom, mas faltou X.\", \
             \"Incompleto.\", \"Incorreto.\").]\n\n\
             {gaps}\n\
             [Pontos-chave da Resposta Esperada que NÃO foram abordados, em tópicos sucintos. \
             Se não houver, diga \"Nenhuma lacuna significativa.\"]\n\n\
             {grammar}\n\
             [Principais erros da Resposta do Usuário no formato 'Incorreto' -> 'Correção'. \
             Se não houver, diga \"Nenhum erro encontrado.\"]\n\n\
             {tips}\n\
             [Sugestões muito concisas de clareza, concisão e correção, em tópicos.]\n\n\
             ---\nPergunta:\n{question}\n\n\
             ---\nResposta Esperada:\n{reference}\n\n\
             ---\nResposta do Usuário:\n{candidate}\n---\n",
            score = title(SectionKey::Score),
            eval = title(SectionKey::MeaningEval),
            gaps = title(SectionKey::ContentGaps),
            grammar = title(SectionKey::GrammarErrors),
            tips = title(SectionKey::Suggestions),
            question = request.question.trim(),
            reference = request.reference_answer.trim(),
            candidate = request.candidate_answer.trim(),
        ),
        Language::En => format!(
            "Give **brief, objective** feedback on the 'User Answer' compared with the \
             'Expected Answer', focusing on the essentials.\n\n\
             **Required Feedback Structure:**\n\n\
             {score}\n\
             [A number from 0 to 100% for how closely the meaning matches the Expected \
             Answer. 100% = identical, complete meaning.]\n\n\
             {eval}\n\
             [A very short verdict (e.g. \"Excellent.\", \"Good, but missed X.\", \
             \"Incomplete.\", \"Incorrect.\").]\n\n\
             {gaps}\n\
             [Key points of the Expected Answer the User Answer did NOT cover, as short \
             bullets. If none, say \"No significant gaps.\"]\n\n\
             {grammar}\n\
             [Main mistakes in the User Answer as 'Wrong' -> 'Correction'. If none, say \
             \"No errors found.\"]\n\n\
             {tips}\n\
             [Very concise bullets on clarity, concision and correctness.]\n\n\
             ---\nQuestion:\n{question}\n\n\
             ---\nExpected Answer:\n{reference}\n\n\
             ---\nUser Answer:\n{candidate}\n---\n",
            score = title(SectionKey::Score),
            eval = title(SectionKey::MeaningEval),
            gaps = title(SectionKey::ContentGaps),
            grammar = title(SectionKey::GrammarErrors),
            tips = title(SectionKey::Suggestions),
            question = request.question.trim(),
            reference = request.reference_answer.trim(),
            candidate = request.candidate_answer.trim(),
        ),
    }
}
