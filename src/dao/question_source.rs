//! Bulk question source: CSV files holding the whole question bank.

use std::{io, path::PathBuf};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::info;

use crate::dao::models::QuestionEntity;

/// Time budget assigned to imported questions.
pub const IMPORTED_QUESTION_TIME_SECS: u32 = 300;
const OPTION_LETTERS: [&str; 5] = ["A", "B", "C", "D", "E"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read question source `{path}`")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Provider of a full question bank.
pub trait QuestionSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'static, Result<Vec<QuestionEntity>, SourceError>>;
}

/// Reads the bank from a CSV file on disk every time it is fetched.
#[derive(Debug, Clone)]
pub struct CsvQuestionSource {
    path: PathBuf,
    part_one_rows: usize,
}

impl CsvQuestionSource {
    pub fn new(path: impl Into<PathBuf>, part_one_rows: usize) -> Self {
        Self {
            path: path.into(),
            part_one_rows,
        }
    }
}

impl QuestionSource for CsvQuestionSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Vec<QuestionEntity>, SourceError>> {
        let source = self.clone();
        Box::pin(async move {
            let text = tokio::fs::read_to_string(&source.path)
                .await
                .map_err(|err| SourceError::Read {
                    path: source.path.display().to_string(),
                    source: err,
                })?;
            let questions = parse_csv(&text, source.part_one_rows);
            info!(
                path = %source.path.display(),
                count = questions.len(),
                "parsed question bank"
            );
            Ok(questions)
        })
    }
}

/// In-memory CSV text, used when the bank is uploaded rather than read from disk.
#[derive(Debug, Clone)]
pub struct InlineQuestionSource {
    text: String,
    part_one_rows: usize,
}

impl InlineQuestionSource {
    pub fn new(text: impl Into<String>, part_one_rows: usize) -> Self {
        Self {
            text: text.into(),
            part_one_rows,
        }
    }
}

impl QuestionSource for InlineQuestionSource {
    fn fetch(&self) -> BoxFuture<'static, Result<Vec<QuestionEntity>, SourceError>> {
        let questions = parse_csv(&self.text, self.part_one_rows);
        Box::pin(async move { Ok(questions) })
    }
}

/// Parse a CSV question bank.
///
/// A header containing `ans_1` and `correct_ans` selects the multiple-choice
/// layout (`ques, ans_1.., correct_ans`); any other header selects
/// `question,answer` rows. Rows before `part_one_rows` belong to part 1, the
/// rest to part 2. Ids are assigned `csv_<n>` in output order.
pub fn parse_csv(text: &str, part_one_rows: usize) -> Vec<QuestionEntity> {
    let mut lines = text.trim().lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers = parse_csv_line(header_line.trim());
    let multiple_choice =
        headers.iter().any(|h| h == "ans_1") && headers.iter().any(|h| h == "correct_ans");

    let mut questions = Vec::new();
    for (row, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let part = if row < part_one_rows { 1 } else { 2 };

        let parsed = if multiple_choice {
            parse_multiple_choice_row(line, part)
        } else {
            parse_pair_row(line, part)
        };
        if let Some(question) = parsed {
            questions.push(question);
        }
    }

    for (index, question) in questions.iter_mut().enumerate() {
        question.id = format!("csv_{}", index + 1);
    }
    questions
}

fn parse_multiple_choice_row(line: &str, part: u8) -> Option<QuestionEntity> {
    let values = parse_csv_line(line);
    if values.len() < 4 {
        return None;
    }

    let correct = values[values.len() - 1].trim().to_uppercase();
    let options: IndexMap<String, String> = values[1..values.len() - 1]
        .iter()
        .zip(OPTION_LETTERS)
        .filter(|(text, _)| !text.is_empty())
        .map(|(text, letter)| (letter.to_string(), text.clone()))
        .collect();

    let mut summary = options
        .iter()
        .map(|(letter, text)| format!("{letter}: {text}\n"))
        .collect::<String>();
    summary.push_str(&format!("\nCorrect answer: {correct}"));

    Some(QuestionEntity {
        id: String::new(),
        part,
        question: values[0].clone(),
        answer_options: Some(options),
        correct_answer: Some(correct),
        answer: Some(summary),
        time: Some(IMPORTED_QUESTION_TIME_SECS),
    })
}

fn parse_pair_row(line: &str, part: u8) -> Option<QuestionEntity> {
    let (question, answer) = match quoted_pair(line) {
        Some(pair) => pair,
        None => {
            let (question, answer) = line.split_once(',')?;
            (question.trim().to_string(), answer.trim().to_string())
        }
    };

    Some(QuestionEntity {
        id: String::new(),
        part,
        question,
        answer_options: None,
        correct_answer: None,
        answer: Some(answer),
        time: Some(IMPORTED_QUESTION_TIME_SECS),
    })
}

/// Match the exact `"question","answer"` shape, unescaping doubled quotes.
fn quoted_pair(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('"')?.strip_suffix('"')?;
    let (question, answer) = inner.split_once("\",\"")?;
    Some((question.replace("\"\"", "\""), answer.replace("\"\"", "\"")))
}

/// Split one CSV line into trimmed fields, honouring quotes and `""` escapes.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            other => current.push(other),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_line_handles_quotes_and_escapes() {
        let fields = parse_csv_line(r#"  "a, b" , "say ""hi""",c "#);
        assert_eq!(fields, vec!["a, b", r#"say "hi""#, "c"]);
    }

    #[test]
    fn multiple_choice_layout_is_detected() {
        let text = "ques,ans_1,ans_2,ans_3,correct_ans\nCapital of France?,Paris,Rome,,a \n";
        let questions = parse_csv(text, 58);
        assert_eq!(questions.len(), 1);

        let question = &questions[0];
        assert_eq!(question.id, "csv_1");
        assert_eq!(question.part, 1);
        assert_eq!(question.correct_answer.as_deref(), Some("A"));
        let options = question.answer_options.as_ref().unwrap();
        assert_eq!(options.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(question.time, Some(IMPORTED_QUESTION_TIME_SECS));
    }

    #[test]
    fn short_multiple_choice_rows_are_skipped() {
        let text = "ques,ans_1,correct_ans\nOnly,one,A\nQ,x,y,B\n";
        let questions = parse_csv(text, 58);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Q");
        assert_eq!(questions[0].id, "csv_1");
    }

    #[test]
    fn pair_layout_splits_parts_by_row() {
        let text = "question,answer\n\"q1\",\"a \"\"1\"\"\"\nq2, a2, with comma\nq3,a3\n";
        let questions = parse_csv(text, 2);

        assert_eq!(questions[0].question, "q1");
        assert_eq!(questions[0].answer.as_deref(), Some("a \"1\""));
        assert_eq!(questions[1].answer.as_deref(), Some("a2, with comma"));
        assert_eq!(
            questions.iter().map(|q| q.part).collect::<Vec<_>>(),
            vec![1, 1, 2]
        );
        assert_eq!(questions[2].id, "csv_3");
    }

    #[test]
    fn empty_text_yields_no_questions() {
        assert!(parse_csv("", 58).is_empty());
        assert!(parse_csv("ques,ans_1,correct_ans", 58).is_empty());
    }
}
