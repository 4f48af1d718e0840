//! Section markers and user-facing strings of the grader's reply format

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named part of a graded reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionKey {
    /// Numeric meaning score, 0-100
    Score,
    /// Short qualitative verdict
    MeaningEval,
    /// Key points of the expected answer that were missed
    ContentGaps,
    /// "wrong -> correction" pairs
    GrammarErrors,
    /// Improvement suggestions
    Suggestions,
}

impl SectionKey {
    pub const ALL: [SectionKey; 5] = [
        SectionKey::Score,
        SectionKey::MeaningEval,
        SectionKey::ContentGaps,
        SectionKey::GrammarErrors,
        SectionKey::Suggestions,
    ];
}

/// One section of the reply and the marker that opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub key: SectionKey,
    /// Title as the grader is asked to write it, e.g. `1. Score (0-100):`
    pub title: &'static str,
    /// Exact text that opens the section in the reply
    pub marker: &'static str,
}

/// Language of the prompt, the reply sections and the messages around them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Brazilian Portuguese
    #[default]
    Pt,
    /// English
    En,
}

impl Language {
    pub fn sections(self) -> &'static SectionSet {
        match self {
            Language::Pt => &PORTUGUESE,
            Language::En => &ENGLISH,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "pt-br" | "portuguese" => Ok(Language::Pt),
            "en" | "english" => Ok(Language::En),
            _ => Err(format!("Unknown language: {}. Options: pt, en", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Pt => f.write_str("pt"),
            Language::En => f.write_str("en"),
        }
    }
}

/// Everything language-specific about grading
#[derive(Debug, PartialEq, Eq)]
pub struct SectionSet {
    /// Reply sections in the order the grader writes them
    pub sections: [Section; 5],
    /// Value of a section whose marker is missing from the reply
    pub unavailable: &'static str,
    /// Prefix of a grading failure that is shown in place of feedback
    pub error_marker: &'static str,
    /// Shown instead of grading when an answer is missing
    pub missing_input: &'static str,
}

impl SectionSet {
    pub fn section(&self, key: SectionKey) -> &Section {
        // Each set lists every key exactly once, in `SectionKey::ALL` order
        &self.sections[key as usize]
    }

    /// Display label for a section (its title without numbering and colon)
    pub fn label(&self, key: SectionKey) -> &'static str {
        let title = self.section(key).title;
        let title = title.split_once(". ").map_or(title, |(_, rest)| rest);
        title.trim_end_matches(':')
    }
}

pub static PORTUGUESE: SectionSet = SectionSet {
    sections: [
        Section {
            key: SectionKey::Score,
            title: "1. Pontuação de Sentido (0-100):",
            marker: "**1. Pontuação de Sentido (0-100):**",
        },
        Section {
            key: SectionKey::MeaningEval,
            title: "2. Avaliação Principal do Sentido:",
            marker: "**2. Avaliação Principal do Sentido:**",
        },
        Section {
            key: SectionKey::ContentGaps,
            title: "3. Lacunas de Conteúdo:",
            marker: "**3. Lacunas de Conteúdo:**",
        },
        Section {
            key: SectionKey::GrammarErrors,
            title: "4. Erros Gramaticais/Ortográficos:",
            marker: "**4. Erros Gramaticais/Ortográficos:**",
        },
        Section {
            key: SectionKey::Suggestions,
            title: "5. Sugestões Rápidas de Melhoria:",
            marker: "**5. Sugestões Rápidas de Melhoria:**",
        },
    ],
    unavailable: "Não disponível.",
    error_marker: "Erro ao comunicar com o avaliador: ",
    missing_input: "Por favor, forneça ambas as respostas para comparação.",
};

pub static ENGLISH: SectionSet = SectionSet {
    sections: [
        Section {
            key: SectionKey::Score,
            title: "1. Meaning Score (0-100):",
            marker: "**1. Meaning Score (0-100):**",
        },
        Section {
            key: SectionKey::MeaningEval,
            title: "2. Main Meaning Assessment:",
            marker: "**2. Main Meaning Assessment:**",
        },
        Section {
            key: SectionKey::ContentGaps,
            title: "3. Content Gaps:",
            marker: "**3. Content Gaps:**",
        },
        Section {
            key: SectionKey::GrammarErrors,
            title: "4. Grammar/Spelling Errors:",
            marker: "**4. Grammar/Spelling Errors:**",
        },
        Section {
            key: SectionKey::Suggestions,
            title: "5. Quick Improvement Suggestions:",
            marker: "**5. Quick Improvement Suggestions:**",
        },
    ],
    unavailable: "Not available.",
    error_marker: "Error contacting the grader: ",
    missing_input: "Please provide both answers for comparison.",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_follow_key_order() {
        for set in [&PORTUGUESE, &ENGLISH] {
            for key in SectionKey::ALL {
                assert_eq!(set.section(key).key, key);
            }
        }
    }

    #[test]
    fn markers_wrap_titles() {
        for section in PORTUGUESE.sections.iter().chain(ENGLISH.sections.iter()) {
            assert_eq!(section.marker, format!("**{}**", section.title));
        }
    }

    #[test]
    fn labels_drop_numbering() {
        assert_eq!(PORTUGUESE.label(SectionKey::ContentGaps), "Lacunas de Conteúdo");
        assert_eq!(ENGLISH.label(SectionKey::Score), "Meaning Score (0-100)");
    }

    #[test]
    fn language_parse() {
        assert_eq!("PT".parse::<Language>(), Ok(Language::Pt));
        assert_eq!("english".parse::<Language>(), Ok(Language::En));
        assert!("klingon".parse::<Language>().is_err());
    }
}
