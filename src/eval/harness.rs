//! Evaluation harness
//!
//! Runs a JSONL question set through the full pipeline and answerer,
//! scores each case with the lexical metrics, and writes a JSON report.
//!
//! Case format, one JSON object per line:
//! `{"question": "...", "ground_truth": "..."}`

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::answer::Answerer;
use crate::eval::metrics;
use crate::rag::RagPipeline;

/// One evaluation case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub ground_truth: String,
}

/// Scores for one case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub question: String,
    pub answer: String,
    pub refused: bool,
    pub citations: usize,
    pub faithfulness: f32,
    pub answer_relevancy: f32,
    pub context_precision: f32,
    pub context_recall: f32,
}

/// Averages across all scored cases
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Averages {
    pub faithfulness: f32,
    pub answer_relevancy: f32,
    pub context_precision: f32,
    pub context_recall: f32,
}

/// Full evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub cases: Vec<CaseResult>,
    pub averages: Averages,
    pub warnings: Vec<String>,
}

impl EvalReport {
    /// Save the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, json).context("Failed to write report")?;
        Ok(())
    }

    /// Plain-text summary table
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<50} {:>6} {:>6} {:>6} {:>6}\n",
            "question", "faith", "relev", "prec", "recall"
        ));
        for case in &self.cases {
            let mut question: String = case.question.chars().take(47).collect();
            if case.question.chars().count() > 47 {
                question.push('…');
            }
            out.push_str(&format!(
                "{:<50} {:>6.2} {:>6.2} {:>6.2} {:>6.2}\n",
                question,
                case.faithfulness,
                case.answer_relevancy,
                case.context_precision,
                case.context_recall
            ));
        }
        out.push_str(&format!(
            "{:<50} {:>6.2} {:>6.2} {:>6.2} {:>6.2}\n",
            "AVERAGE",
            self.averages.faithfulness,
            self.averages.answer_relevancy,
            self.averages.context_precision,
            self.averages.context_recall
        ));
        out
    }
}

/// Load cases from a JSONL file; blank lines are skipped
pub fn load_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read eval file: {}", path.display()))?;

    let mut cases = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let case: EvalCase = serde_json::from_str(line)
            .context(format!("Invalid eval case on line {}", line_no + 1))?;
        cases.push(case);
    }

    Ok(cases)
}

/// Runs cases through retrieval and answering
pub struct EvalHarness {
    pipeline: RagPipeline,
    answerer: Answerer,
    model: String,
}

impl EvalHarness {
    pub fn new(pipeline: RagPipeline, answerer: Answerer, model: String) -> Self {
        Self {
            pipeline,
            answerer,
            model,
        }
    }

    /// Run all cases. A case that errors (blocked query, Ollama hiccup)
    /// becomes a warning rather than sinking the whole run.
    pub async fn run(&self, cases: &[EvalCase]) -> Result<EvalReport> {
        let mut results = Vec::new();
        let mut warnings = Vec::new();

        for case in cases {
            match self.run_case(case).await {
                Ok(result) => results.push(result),
                Err(e) => warnings.push(format!("case \"{}\": {}", case.question, e)),
            }
        }

        let averages = Self::average(&results);

        Ok(EvalReport {
            generated_at: Utc::now(),
            model: self.model.clone(),
            cases: results,
            averages,
            warnings,
        })
    }

    async fn run_case(&self, case: &EvalCase) -> Result<CaseResult> {
        let retrieval = self.pipeline.execute(&case.question).await?;
        let answer = self.answerer.answer(&retrieval).await?;

        let passage_texts: Vec<String> = retrieval
            .passages
            .iter()
            .map(|r| r.passage.text.clone())
            .collect();

        Ok(CaseResult {
            question: case.question.clone(),
            answer: answer.text.clone(),
            refused: answer.refused,
            citations: answer.citations.len(),
            faithfulness: metrics::faithfulness(&answer.text, &retrieval.context.text),
            answer_relevancy: metrics::answer_relevancy(&case.question, &answer.text),
            context_precision: metrics::context_precision(&case.ground_truth, &passage_texts),
            context_recall: metrics::context_recall(&case.ground_truth, &retrieval.context.text),
        })
    }

    fn average(results: &[CaseResult]) -> Averages {
        if results.is_empty() {
            return Averages::default();
        }
        let n = results.len() as f32;
        Averages {
            faithfulness: results.iter().map(|r| r.faithfulness).sum::<f32>() / n,
            answer_relevancy: results.iter().map(|r| r.answer_relevancy).sum::<f32>() / n,
            context_precision: results.iter().map(|r| r.context_precision).sum::<f32>() / n,
            context_recall: results.iter().map(|r| r.context_recall).sum::<f32>() / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_cases_jsonl() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cases.jsonl");
        fs::write(
            &path,
            "{\"question\": \"Q1?\", \"ground_truth\": \"A1\"}\n\n{\"question\": \"Q2?\", \"ground_truth\": \"A2\"}\n",
        )
        .unwrap();

        let cases = load_cases(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].question, "Q1?");
        assert_eq!(cases[1].ground_truth, "A2");
    }

    #[test]
    fn test_load_cases_bad_line_errors() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cases.jsonl");
        fs::write(&path, "{\"question\": \"Q1?\"}\n").unwrap();

        let result = load_cases(&path);
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("line 1"));
    }

    #[test]
    fn test_averages() {
        let results = vec![
            CaseResult {
                question: "q1".into(),
                answer: "a1".into(),
                refused: false,
                citations: 1,
                faithfulness: 1.0,
                answer_relevancy: 0.5,
                context_precision: 1.0,
                context_recall: 0.0,
            },
            CaseResult {
                question: "q2".into(),
                answer: "a2".into(),
                refused: false,
                citations: 0,
                faithfulness: 0.0,
                answer_relevancy: 0.5,
                context_precision: 0.0,
                context_recall: 1.0,
            },
        ];

        let averages = EvalHarness::average(&results);
        assert!((averages.faithfulness - 0.5).abs() < f32::EPSILON);
        assert!((averages.answer_relevancy - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_average_empty() {
        let averages = EvalHarness::average(&[]);
        assert_eq!(averages.faithfulness, 0.0);
    }

    #[test]
    fn test_report_roundtrip_and_table() {
        let report = EvalReport {
            generated_at: Utc::now(),
            model: "qwen2.5:7b-instruct".to_string(),
            cases: vec![CaseResult {
                question: "What is the reimbursement window?".into(),
                answer: "Thirty days [1].".into(),
                refused: false,
                citations: 1,
                faithfulness: 0.9,
                answer_relevancy: 0.8,
                context_precision: 1.0,
                context_recall: 0.7,
            }],
            averages: Averages {
                faithfulness: 0.9,
                answer_relevancy: 0.8,
                context_precision: 1.0,
                context_recall: 0.7,
            },
            warnings: Vec::new(),
        };

        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("report.json");
        report.save(&path).unwrap();

        let loaded: EvalReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.cases.len(), 1);

        let table = report.render_table();
        assert!(table.contains("AVERAGE"));
        assert!(table.contains("0.90"));
    }
}
