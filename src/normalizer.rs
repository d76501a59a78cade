//! Clarifying-question extraction from free-form model text.

/// Upper bound on returned questions.
pub const MAX_QUESTIONS: usize = 4;

/// Candidates this short or shorter are treated as fragments.
const MIN_QUESTION_CHARS: usize = 10;

/// Characters stripped from the start of a line (bullets and enumeration).
const LEADING_MARKERS: &[char] = &['-', '•', '*', '.', ')', ' ', '\t', '1', '2', '3', '4', '5', '6', '7', '8', '9', '0'];

/// Substituted when the text contains no usable questions.
pub const DEFAULT_QUESTIONS: [&str; 3] = [
    "Can you provide more details about your situation?",
    "When did this occur?",
    "Do you have any documentation or evidence?",
];

/// Extract up to [`MAX_QUESTIONS`] clarifying questions, in order of appearance.
///
/// Never returns an empty list.
pub fn extract_clarifying_questions(text: &str) -> Vec<String> {
    let questions: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.contains('?'))
        .map(|line| line.trim_start_matches(LEADING_MARKERS).trim_end().to_string())
        .filter(|question| question.chars().count() > MIN_QUESTION_CHARS)
        .take(MAX_QUESTIONS)
        .collect();

    if questions.is_empty() {
        default_questions()
    } else {
        questions
    }
}

pub fn default_questions() -> Vec<String> {
    DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_questions_and_strips_markers() {
        let text = "This looks like a negligence claim.\n\
                    1. What state did this occur in?\n\
                    - Were there any witnesses present?\n\
                    • Did you seek medical treatment?";

        assert_eq!(
            extract_clarifying_questions(text),
            vec![
                "What state did this occur in?",
                "Were there any witnesses present?",
                "Did you seek medical treatment?",
            ]
        );
    }

    #[test]
    fn test_caps_at_four() {
        let text = (1..=6)
            .map(|i| format!("{}. Is this question number {}?", i, i))
            .collect::<Vec<_>>()
            .join("\n");

        let questions = extract_clarifying_questions(&text);
        assert_eq!(questions.len(), MAX_QUESTIONS);
        assert_eq!(questions[0], "Is this question number 1?");
        assert_eq!(questions[3], "Is this question number 4?");
    }

    #[test]
    fn test_discards_fragments() {
        let text = "?\n- Why?\nWhen exactly did the collision happen?";
        assert_eq!(
            extract_clarifying_questions(text),
            vec!["When exactly did the collision happen?"]
        );
    }

    #[test]
    fn test_defaults_when_no_questions() {
        let questions = extract_clarifying_questions("Rear-end collisions typically establish fault.");
        assert_eq!(questions, default_questions());
        assert_eq!(questions.len(), 3);
    }

    #[test]
    fn test_defaults_for_empty_text() {
        assert_eq!(extract_clarifying_questions(""), default_questions());
    }
}
