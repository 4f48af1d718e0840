//! Feedback parser: splits a grader reply into its named sections

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::sections::{Section, SectionKey, SectionSet};

/// First run of digits in the score section. ASCII only, so a score always
/// parses as `u32` without digit-script conversion.
static SCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

/// Separator after which the reply echoes the answers back
const TRANSCRIPT_SEPARATOR: &str = "---";

/// Character that may close a section label right after its marker
const LABEL_TERMINATOR: char = ':';

/// Why a reply could not be split
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A section was defined with an empty marker
    #[error("Section {0:?} has an empty marker")]
    EmptyMarker(SectionKey),

    /// A computed slice fell inside a multi-byte character
    #[error("Slice {start}..{end} is not on a character boundary")]
    Boundary { start: usize, end: usize },
}

/// Section texts of a successfully parsed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSections {
    values: BTreeMap<SectionKey, String>,
}

impl FeedbackSections {
    /// Text of a section; the "unavailable" value when its marker was missing
    pub fn get(&self, key: SectionKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or_default()
    }
}

/// Structured view of a grader reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFeedback {
    /// Every section resolved, to its text or the "unavailable" value
    Sections(FeedbackSections),
    /// Parsing failed; only the raw reply can be shown
    Raw { raw: String, error: String },
}

impl ParsedFeedback {
    pub fn section(&self, key: SectionKey) -> Option<&str> {
        match self {
            ParsedFeedback::Sections(sections) => Some(sections.get(key)),
            ParsedFeedback::Raw { .. } => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ParsedFeedback::Raw { .. })
    }
}

/// Parse a reply against an ordered list of sections.
///
/// Each section runs from the end of its marker up to the nearest marker of a
/// later section. The last present section runs to the transcript separator or
/// the end of the text. Missing markers resolve to `unavailable`.
pub fn parse_sections(raw: &str, sections: &[Section], unavailable: &str) -> ParsedFeedback {
    match extract_all(raw, sections) {
        Ok(found) => {
            let values = sections
                .iter()
                .map(|s| {
                    let text = found.get(&s.key).cloned().unwrap_or_else(|| unavailable.to_string());
                    (s.key, text)
                })
                .collect();
            ParsedFeedback::Sections(FeedbackSections { values })
        }
        Err(e) => {
            tracing::warn!("Could not parse grader reply: {}", e);
            ParsedFeedback::Raw { raw: raw.to_string(), error: e.to_string() }
        }
    }
}

/// Parse a reply in the format of `set`
pub fn parse_feedback(raw: &str, set: &SectionSet) -> ParsedFeedback {
    parse_sections(raw, &set.sections, set.unavailable)
}

fn extract_all(
    text: &str,
    sections: &[Section],
) -> Result<BTreeMap<SectionKey, String>, ParseError> {
    let mut found = BTreeMap::new();

    for (i, section) in sections.iter().enumerate() {
        if section.marker.is_empty() {
            return Err(ParseError::EmptyMarker(section.key));
        }
        let Some(start) = text.find(section.marker) else {
            continue;
        };

        let mut content_start = start + section.marker.len();
        if slice(text, content_start, text.len())?.starts_with(LABEL_TERMINATOR) {
            content_start += LABEL_TERMINATOR.len_utf8();
        }
        let rest = slice(text, content_start, text.len())?;

        let next = sections[i + 1..]
            .iter()
            .filter(|s| !s.marker.is_empty())
            .filter_map(|s| rest.find(s.marker))
            .min();

        let content = match next {
            Some(end) => slice(rest, 0, end)?.trim(),
            None => {
                let tail = rest.trim();
                tail.split(TRANSCRIPT_SEPARATOR).next().unwrap_or(tail).trim()
            }
        };
        found.insert(section.key, content.to_string());
    }

    Ok(found)
}

fn slice(text: &str, start: usize, end: usize) -> Result<&str, ParseError> {
    text.get(start..end).ok_or(ParseError::Boundary { start, end })
}

/// Numeric score of a reply: the first digit run of its score section.
///
/// Absent (never zero) when the section has no digits, the number overflows,
/// or the reply could not be parsed.
pub fn extract_score(feedback: &ParsedFeedback) -> Option<u32> {
    let text = feedback.section(SectionKey::Score)?;
    SCORE_RE.find(text)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::sections::{ENGLISH, PORTUGUESE};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn reply(fillers: [&str; 5], set: &SectionSet) -> String {
        set.sections
            .iter()
            .zip(fillers)
            .map(|(s, filler)| format!("{}\n{}\n\n", s.marker, filler))
            .collect()
    }

    const FILLERS: [&str; 5] = [
        "85%",
        "Bom, mas faltou citar a culpa consciente.",
        "- Distinção entre dolo eventual e culpa consciente",
        "'consiente' -> 'consciente'",
        "- Cite o art. 18 do Código Penal",
    ];

    #[test]
    fn recovers_every_section() {
        let text = reply(FILLERS, &PORTUGUESE);
        let parsed = parse_feedback(&text, &PORTUGUESE);

        for (key, filler) in SectionKey::ALL.into_iter().zip(FILLERS) {
            assert_eq!(parsed.section(key), Some(filler));
        }
    }

    #[test]
    fn missing_section_defaults_to_unavailable() {
        let text: String = PORTUGUESE
            .sections
            .iter()
            .zip(FILLERS)
            .filter(|(s, _)| s.key != SectionKey::ContentGaps)
            .map(|(s, filler)| format!("{} {}\n", s.marker, filler))
            .collect();

        let parsed = parse_feedback(&text, &PORTUGUESE);
        assert_eq!(parsed.section(SectionKey::ContentGaps), Some("Não disponível."));
        assert_eq!(parsed.section(SectionKey::Score), Some(FILLERS[0]));
        assert_eq!(parsed.section(SectionKey::MeaningEval), Some(FILLERS[1]));
        assert_eq!(parsed.section(SectionKey::GrammarErrors), Some(FILLERS[3]));
        assert_eq!(parsed.section(SectionKey::Suggestions), Some(FILLERS[4]));
    }

    #[test]
    fn last_section_stops_at_transcript_separator() {
        let mut text = reply(FILLERS, &ENGLISH);
        text.push_str("---\nExpected answer:\nsomething\n---\nUser answer:\nother\n");

        let parsed = parse_feedback(&text, &ENGLISH);
        assert_eq!(parsed.section(SectionKey::Suggestions), Some(FILLERS[4]));
    }

    #[test]
    fn skips_one_label_terminator() {
        let text = "**1. Meaning Score (0-100):**: 40";
        let parsed = parse_feedback(text, &ENGLISH);
        assert_eq!(parsed.section(SectionKey::Score), Some("40"));

        let text = "**1. Meaning Score (0-100):**:: 40";
        let parsed = parse_feedback(text, &ENGLISH);
        assert_eq!(parsed.section(SectionKey::Score), Some(": 40"));
    }

    #[test]
    fn unstructured_reply_is_all_unavailable() {
        let parsed = parse_feedback("Erro ao comunicar com o avaliador: timeout", &PORTUGUESE);
        for key in SectionKey::ALL {
            assert_eq!(parsed.section(key), Some("Não disponível."));
        }
        assert_eq!(extract_score(&parsed), None);
    }

    #[test]
    fn failure_falls_back_to_raw() {
        let broken = [Section { key: SectionKey::Score, title: "", marker: "" }];
        let parsed = parse_sections("anything", &broken, "n/a");
        assert_eq!(
            parsed,
            ParsedFeedback::Raw {
                raw: "anything".into(),
                error: "Section Score has an empty marker".into()
            }
        );
        assert_eq!(extract_score(&parsed), None);
    }

    #[test]
    fn score_is_first_digit_run() {
        let parsed =
            parse_feedback("**1. Pontuação de Sentido (0-100):** 72% complete", &PORTUGUESE);
        assert_eq!(extract_score(&parsed), Some(72));
    }

    #[test]
    fn score_skips_non_ascii_digits() {
        let parsed = parse_feedback("**1. Meaning Score (0-100):** ٨٥ (70)", &ENGLISH);
        assert_eq!(extract_score(&parsed), Some(70));
    }

    #[test]
    fn score_without_digits_is_absent() {
        let parsed = parse_feedback("**1. Pontuação de Sentido (0-100):** N/A", &PORTUGUESE);
        assert_eq!(extract_score(&parsed), None);
    }

    #[test]
    fn overflowing_score_is_absent() {
        let parsed =
            parse_feedback("**1. Meaning Score (0-100):** 99999999999999999999", &ENGLISH);
        assert_eq!(extract_score(&parsed), None);
    }

    proptest! {
        #[test]
        fn arbitrary_text_never_falls_back(text in "\\PC*") {
            let parsed = parse_feedback(&text, &ENGLISH);
            prop_assert!(!parsed.is_raw());
            for key in SectionKey::ALL {
                prop_assert!(parsed.section(key).is_some());
            }
        }

        #[test]
        fn marker_followed_by_text_is_recovered(body in "[a-zA-Z ]{1,40}") {
            let text = format!("{} {}", ENGLISH.sections[1].marker, body);
            let parsed = parse_feedback(&text, &ENGLISH);
            prop_assert_eq!(parsed.section(SectionKey::MeaningEval), Some(body.trim()));
        }
    }
}
