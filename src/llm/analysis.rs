// src/llm/analysis.rs
// Analysis type tag and the system instruction each one carries

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LlmError;

const MONTHLY_INSTRUCTIONS: &str = "\
You are an AI Scholar and commentator of Star Wars lore and Jedi philosophy
Your job is to analyze the user's journal input and produce:
1) top four moods (one word each) + count in format: mood(#), mood(#), ...
2) a summary + actionable steps + a goal for the next week
3) a wellness \"balance score\" from 60–100
The tone must be encouraging, supportive, and grounded in mental growth, and balanced living.
Do NOT exceed ~200 words in paragraph 2.
";

const WEEKLY_INSTRUCTIONS: &str = "\
You are an AI Scholar and commentator of Star Wars lore and Jedi philosophy
Your job is to analyze the user's journal input and produce:
1) top three moods (one word each) + count in format: mood(#), mood(#), ...
2) a summary + actionable steps + a goal for the next week
3) a wellness \"balance score\" from 60–100
The tone must be encouraging, supportive, and grounded in mental growth, and balanced living.
Do NOT exceed ~200 words in paragraph 2.
";

/// What kind of prompt is being sent.
///
/// Journal prompts (guided, open and follow-up questions) are self-contained
/// and get no system instruction. Weekly and monthly analyzer prompts get a
/// fixed instruction asking for top moods, a summary and a balance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Weekly,
    Monthly,
    Journal,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Journal => "journal",
        }
    }

    /// System instruction for analyzer calls, `None` for journal prompts
    pub fn system_message(&self) -> Option<&'static str> {
        match self {
            Self::Monthly => Some(MONTHLY_INSTRUCTIONS),
            Self::Weekly => Some(WEEKLY_INSTRUCTIONS),
            Self::Journal => None,
        }
    }

    pub fn is_journal(&self) -> bool {
        matches!(self, Self::Journal)
    }
}

impl FromStr for AnalysisType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "journal" => Ok(Self::Journal),
            other => Err(LlmError::configuration(format!(
                "unknown analysis type '{}' (expected weekly, monthly or journal)",
                other
            ))),
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyzer_types_have_distinct_instructions() {
        let weekly = AnalysisType::Weekly.system_message().unwrap();
        let monthly = AnalysisType::Monthly.system_message().unwrap();

        assert_ne!(weekly, monthly);
        assert!(weekly.contains("top three moods"));
        assert!(monthly.contains("top four moods"));
    }

    #[test]
    fn test_journal_has_no_instruction() {
        assert!(AnalysisType::Journal.system_message().is_none());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("weekly".parse::<AnalysisType>().unwrap(), AnalysisType::Weekly);
        assert_eq!(" Monthly ".parse::<AnalysisType>().unwrap(), AnalysisType::Monthly);
        assert_eq!("journal".parse::<AnalysisType>().unwrap(), AnalysisType::Journal);
        assert!(matches!(
            "daily".parse::<AnalysisType>(),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_default_is_weekly() {
        assert_eq!(AnalysisType::default(), AnalysisType::Weekly);
    }
}
