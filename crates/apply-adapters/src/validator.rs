//! Anti-fabrication Validator: flags companies, skills, and metrics that
//! appear in a tailored resume/cover letter but not in the original
//! (SPEC_FULL.md §4.6).
//!
//! Grounded on `examples/original_source/resume_ai/validator.py`: exact
//! regexes, stop words, and tech-keyword vocabulary, reimplemented with the
//! `regex` crate and `once_cell::sync::Lazy` for one-time compilation.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub new_companies: Vec<String>,
    pub new_skills: Vec<String>,
    pub new_metrics: Vec<String>,
    pub warnings: Vec<String>,
}

static COMPANY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)+)\b").unwrap());

static AT_FOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:at|for)\s+([A-Z][a-zA-Z]*(?:\s+[A-Z][a-zA-Z]*)*)").unwrap());

static CAMEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-z]+(?:[A-Z][a-z]+)+)\b").unwrap());

static CAPS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]{2,})\b").unwrap());

static PERCENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?%").unwrap());
static DOLLAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$[\d,]+(?:\.\d+)?[MmKkBb]?").unwrap());
static USD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)USD\s*[\d,]+(?:\.\d+)?").unwrap());
static MULTIPLIER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b\d+x\b").unwrap());
static LARGE_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3,}(?:,\d{3})*)\b").unwrap());

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "shall", "should", "may", "might", "can", "could", "i", "my",
    "me", "we", "our", "you", "your", "he", "she", "it", "they", "them", "their", "this", "that",
    "these", "those", "using", "including", "such", "also", "each", "every", "all", "both", "any",
    "some", "no", "not", "only", "into", "about", "after", "before", "between", "through",
    "during", "under", "above", "led", "built", "managed", "developed", "created", "designed",
    "implemented", "achieved", "delivered", "established", "maintained", "supported", "worked",
    "focused", "responsible",
];

/// Fixed tech-keyword vocabulary (cloud/infra, AI/ML, data, backend,
/// devsecops, frontend, misc), recovered from `resume_ai/validator.py`.
const TECH_KEYWORDS: &[&str] = &[
    // Cloud & infrastructure
    "kubernetes", "k8s", "docker", "aws", "gcp", "azure", "terraform", "terragrunt", "atlantis",
    "helm", "devspace", "calico", "linkerd", "gke", "eks", "aks", "lambda", "sqs", "ec2", "s3",
    "cloudformation", "pulumi", "vagrant", "ansible", "chef", "puppet",
    // AI/ML
    "langraph", "langchain", "langflow", "openai", "anthropic", "gemini", "ollama", "crawl4ai",
    "tensorflow", "keras", "pytorch", "scikit-learn", "huggingface", "rag", "llm", "cnn", "lstm",
    "bert", "gpt",
    // Data
    "airflow", "postgresql", "postgres", "redis", "elasticsearch", "kafka", "mongodb", "mysql",
    "sqlite", "cassandra", "dynamodb", "bigquery", "snowflake", "spark", "hadoop", "flink",
    // Backend
    "python", "fastapi", "flask", "django", "celery", "sqlalchemy", "java", "spring", "go",
    "golang", "typescript", "javascript", "node", "express", "rust", "ruby", "rails", "php",
    "laravel", "scala",
    // DevSecOps
    "gitops", "github", "gitlab", "jenkins", "circleci", "prometheus", "grafana", "loki", "falco",
    "vault", "keycloak", "datadog", "newrelic", "splunk", "pagerduty", "bats", "pytest",
    "testcontainers",
    // Frontend
    "react", "nextjs", "angular", "vue", "svelte", "tailwindcss", "webpack", "vite", "storybook",
    // Misc
    "graphql", "grpc", "rest", "oauth", "saml", "sso", "ci/cd", "microservices", "etl", "iot",
    "blockchain",
];

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

struct Entities {
    companies: BTreeSet<String>,
    skills: BTreeSet<String>,
    metrics: BTreeSet<String>,
}

fn extract_entities(text: &str) -> Entities {
    let mut companies = BTreeSet::new();
    for m in COMPANY_PATTERN.find_iter(text) {
        let candidate = m.as_str();
        let first_word = candidate.split_whitespace().next().unwrap_or("");
        if !STOP_WORDS.contains(&normalize(first_word).as_str()) {
            companies.insert(normalize(candidate));
        }
    }
    for cap in AT_FOR_PATTERN.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            let candidate = m.as_str();
            let first_word = candidate.split_whitespace().next().unwrap_or("");
            if !STOP_WORDS.contains(&normalize(first_word).as_str()) {
                companies.insert(normalize(candidate));
            }
        }
    }

    let lowered = text.to_lowercase();
    let mut skills = BTreeSet::new();
    for keyword in TECH_KEYWORDS {
        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        if Regex::new(&pattern).unwrap().is_match(&lowered) {
            skills.insert(keyword.to_string());
        }
    }
    for m in CAMEL_PATTERN.find_iter(text) {
        skills.insert(normalize(m.as_str()));
    }
    for m in CAPS_PATTERN.find_iter(text) {
        if m.as_str().len() >= 2 {
            skills.insert(normalize(m.as_str()));
        }
    }

    let mut metrics = BTreeSet::new();
    for m in PERCENT_PATTERN.find_iter(text) {
        metrics.insert(m.as_str().to_string());
    }
    for m in DOLLAR_PATTERN.find_iter(text) {
        metrics.insert(m.as_str().to_string());
    }
    for m in USD_PATTERN.find_iter(text) {
        metrics.insert(m.as_str().to_string());
    }
    for m in MULTIPLIER_PATTERN.find_iter(text) {
        metrics.insert(m.as_str().to_lowercase());
    }
    for cap in LARGE_NUMBER_PATTERN.captures_iter(text) {
        if let Some(m) = cap.get(1) {
            metrics.insert(m.as_str().replace(',', ""));
        }
    }

    Entities {
        companies,
        skills,
        metrics,
    }
}

/// Compare an original resume/cover-letter text against a tailored one,
/// flagging any company, skill, or metric present in the tailored text but
/// absent from the original. §4.6.
pub fn validate_no_fabrication(original_text: &str, tailored_text: &str) -> ValidationResult {
    let original = extract_entities(original_text);
    let tailored = extract_entities(tailored_text);

    let new_companies: Vec<String> = tailored
        .companies
        .difference(&original.companies)
        .cloned()
        .collect();
    let new_skills: Vec<String> = tailored.skills.difference(&original.skills).cloned().collect();
    let new_metrics: Vec<String> = tailored
        .metrics
        .difference(&original.metrics)
        .cloned()
        .collect();

    let mut warnings = Vec::new();
    for company in &new_companies {
        warnings.push(format!(
            "New company detected: '{company}' not found in original resume"
        ));
    }
    for skill in &new_skills {
        warnings.push(format!(
            "New skill detected: '{skill}' not found in original resume"
        ));
    }
    for metric in &new_metrics {
        warnings.push(format!(
            "New metric detected: '{metric}' not found in original resume"
        ));
    }

    ValidationResult {
        is_valid: new_companies.is_empty() && new_skills.is_empty() && new_metrics.is_empty(),
        new_companies,
        new_skills,
        new_metrics,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_valid() {
        let text = "Worked at Acme Corp building systems with Python and AWS, improved latency by 30%.";
        let result = validate_no_fabrication(text, text);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn fabricated_company_is_flagged() {
        let original = "Worked at Acme Corp on backend systems.";
        let tailored = "Worked at Acme Corp and Globex Industries on backend systems.";
        let result = validate_no_fabrication(original, tailored);
        assert!(!result.is_valid);
        assert!(result.new_companies.iter().any(|c| c.contains("globex")));
    }

    #[test]
    fn fabricated_skill_is_flagged() {
        let original = "Built APIs with Python.";
        let tailored = "Built APIs with Python and Kubernetes.";
        let result = validate_no_fabrication(original, tailored);
        assert!(!result.is_valid);
        assert!(result.new_skills.contains(&"kubernetes".to_string()));
    }

    #[test]
    fn fabricated_metric_is_flagged() {
        let original = "Improved throughput significantly.";
        let tailored = "Improved throughput by 45% and cut costs by $2M.";
        let result = validate_no_fabrication(original, tailored);
        assert!(!result.is_valid);
        assert!(result.new_metrics.iter().any(|m| m == "45%"));
    }

    #[test]
    fn reordered_achievements_without_new_facts_stay_valid() {
        let original = "Led migration to AWS. Improved latency by 20%. Worked at Acme Corp.";
        let tailored = "Worked at Acme Corp. Improved latency by 20%. Led migration to AWS.";
        let result = validate_no_fabrication(original, tailored);
        assert!(result.is_valid);
    }
}
