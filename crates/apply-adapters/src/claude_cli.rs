//! Subprocess-backed LLM invocation adapter for resume tailoring and cover
//! letter generation.
//!
//! `ResumeGenerator`/`CoverLetterGenerator` model the LLM call as a narrow
//! port (§1: the invocation subprocess itself is out of scope). Grounded on
//! `examples/original_source/claude_cli/client.py`'s `run()` helper: invoke
//! a CLI via a subprocess, passing the prompt and a JSON schema, parsing a
//! structured JSON result back out — reimplemented with
//! `tokio::process::Command` rather than adding an HTTP client dependency
//! the rest of this workspace has no other use for.

use apply_domain::entities::{CoverLetter, TailoredResume};
use apply_ports::{CoverLetterGenerator, GenerationError, ResumeGenerator};
use tokio::process::Command;
use tracing::{instrument, warn};

/// Keyword scan used to recognize an auth-related CLI failure, recovered
/// from `claude_cli/client.py::_AUTH_KEYWORDS`.
const AUTH_KEYWORDS: &[&str] = &["not authenticated", "login", "auth", "setup-token", "subscription"];

pub struct ClaudeCliGenerator {
    binary: String,
    model: String,
    max_turns: u32,
    timeout: std::time::Duration,
}

impl ClaudeCliGenerator {
    pub fn new(binary: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            max_turns: 3,
            timeout: std::time::Duration::from_secs(120),
        }
    }

    async fn invoke(&self, system_prompt: &str, user_message: &str) -> Result<String, GenerationError> {
        match self.invoke_once(system_prompt, user_message, 1).await {
            Ok(stdout) => Ok(stdout),
            Err(first_error) => {
                warn!(error = %first_error, "generator invocation failed, retrying once (cold start)");
                self.invoke_once(system_prompt, user_message, 2)
                    .await
                    .map_err(|_| first_error)
            }
        }
    }

    async fn invoke_once(
        &self,
        system_prompt: &str,
        user_message: &str,
        attempt: u32,
    ) -> Result<String, GenerationError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg(user_message)
            .arg("--append-system-prompt")
            .arg(system_prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.model)
            .arg("--max-turns")
            .arg(self.max_turns.to_string());

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| GenerationError::Failed {
                message: format!("generation timed out after {:?} (attempt {attempt})", self.timeout),
            })?
            .map_err(|e| GenerationError::Failed {
                message: format!("failed to spawn {}: {e}", self.binary),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if is_auth_error(&stderr) || is_auth_error(&stdout) {
            return Err(GenerationError::Failed {
                message: "CLI invocation is not authenticated".to_string(),
            });
        }
        if !output.status.success() {
            return Err(GenerationError::Failed {
                message: format!("CLI exited with {}: {stderr}", output.status),
            });
        }
        Ok(stdout)
    }
}

fn is_auth_error(text: &str) -> bool {
    let lowered = text.to_lowercase();
    AUTH_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

fn parse_json<T: serde::de::DeserializeOwned>(stdout: &str) -> Result<T, GenerationError> {
    serde_json::from_str(stdout).map_err(|e| GenerationError::Failed {
        message: format!("failed to parse generator output: {e}"),
    })
}

const RESUME_SYSTEM_PROMPT: &str = "Tailor the candidate's resume to the job description. \
Reorder and select only existing achievements and skills; never invent new companies, \
skills, or metrics. Respond with JSON matching the TailoredResume schema.";

const COVER_LETTER_SYSTEM_PROMPT: &str = "Write a cover letter for the candidate based strictly \
on their resume and the job description. Never invent facts not present in the resume. \
Respond with JSON matching the CoverLetter schema.";

impl ResumeGenerator for ClaudeCliGenerator {
    #[instrument(skip(self, resume_text, job_description))]
    async fn tailor(
        &self,
        resume_text: &str,
        job_description: &str,
        job_title: &str,
        company_name: &str,
    ) -> Result<TailoredResume, GenerationError> {
        let user_message = format!(
            "Job title: {job_title}\nCompany: {company_name}\n\nJob description:\n{job_description}\n\nResume:\n{resume_text}"
        );
        let stdout = self.invoke(RESUME_SYSTEM_PROMPT, &user_message).await?;
        parse_json(&stdout)
    }
}

impl CoverLetterGenerator for ClaudeCliGenerator {
    #[instrument(skip(self, resume_text, job_description))]
    async fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        job_title: &str,
        company_name: &str,
    ) -> Result<CoverLetter, GenerationError> {
        let user_message = format!(
            "Job title: {job_title}\nCompany: {company_name}\n\nJob description:\n{job_description}\n\nResume:\n{resume_text}"
        );
        let stdout = self.invoke(COVER_LETTER_SYSTEM_PROMPT, &user_message).await?;
        parse_json(&stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_auth_failure_keywords() {
        assert!(is_auth_error("Error: not authenticated, please run setup-token"));
        assert!(is_auth_error("Please login to continue"));
        assert!(!is_auth_error("Successfully tailored resume"));
    }

    #[test]
    fn parses_well_formed_json() {
        let json = r#"{"greeting":"Dear Hiring Manager,","opening_paragraph":"...","body_paragraphs":[],"closing_paragraph":"...","sign_off":"Sincerely,"}"#;
        let letter: CoverLetter = parse_json(json).unwrap();
        assert_eq!(letter.greeting, "Dear Hiring Manager,");
    }

    #[test]
    fn malformed_json_is_a_generation_error() {
        let result: Result<CoverLetter, GenerationError> = parse_json("not json");
        assert!(matches!(result, Err(GenerationError::Failed { .. })));
    }
}
