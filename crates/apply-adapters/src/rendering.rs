//! Document rendering adapter.
//!
//! `apply_ports::DocumentRenderer` models PDF rendering as a narrow port
//! (§1: the real renderer is out of scope). As with `extraction.rs`, no
//! PDF-rendering crate is present in the retrieved corpus, so this adapter
//! renders to a plain Markdown file under `tailored_artifacts_dir`; the
//! `PathBuf` it returns is recorded in a `ResumeVersion` exactly as a real
//! PDF path would be.

use std::path::{Path, PathBuf};

use apply_domain::entities::{CoverLetter, TailoredResume};
use apply_ports::{DocumentRenderer, RenderError};
use tracing::instrument;

pub struct MarkdownDocumentRenderer {
    output_dir: PathBuf,
}

impl MarkdownDocumentRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    async fn write(&self, file_name: String, contents: String) -> Result<PathBuf, RenderError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| RenderError::Failed {
                message: e.to_string(),
            })?;
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| RenderError::Failed {
                message: e.to_string(),
            })?;
        Ok(path)
    }
}

impl DocumentRenderer for MarkdownDocumentRenderer {
    #[instrument(skip(self, tailored))]
    async fn render_resume(
        &self,
        job_key: &str,
        tailored: &TailoredResume,
    ) -> Result<PathBuf, RenderError> {
        let mut md = format!("# Resume\n\n{}\n\n", tailored.professional_summary);
        md.push_str("## Technical Skills\n\n");
        for section in &tailored.technical_skills {
            md.push_str(&format!("- **{}**: {}\n", section.category, section.skills.join(", ")));
        }
        md.push_str("\n## Work Experience\n\n");
        for entry in &tailored.work_experience {
            md.push_str(&format!("### {} — {} ({})\n", entry.title, entry.company, entry.period));
            for achievement in &entry.achievements {
                md.push_str(&format!("- {achievement}\n"));
            }
        }
        md.push_str("\n## Key Projects\n\n");
        for project in &tailored.key_projects {
            md.push_str(&format!("- {project}\n"));
        }
        md.push_str(&format!("\n## Education\n\n{}\n", tailored.education));

        self.write(format!("{}-resume.md", sanitize(job_key)), md).await
    }

    #[instrument(skip(self, letter))]
    async fn render_cover_letter(
        &self,
        job_key: &str,
        letter: &CoverLetter,
    ) -> Result<PathBuf, RenderError> {
        let mut md = format!("{}\n\n{}\n\n", letter.greeting, letter.opening_paragraph);
        for paragraph in &letter.body_paragraphs {
            md.push_str(paragraph);
            md.push_str("\n\n");
        }
        md.push_str(&format!("{}\n\n{}\n", letter.closing_paragraph, letter.sign_off));

        self.write(format!("{}-cover-letter.md", sanitize(job_key)), md).await
    }
}

fn sanitize(job_key: &str) -> String {
    job_key.chars().map(|c| if c.is_alphanumeric() { c } else { '_' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apply_domain::entities::{SkillSection, WorkExperienceEntry};

    #[tokio::test]
    async fn renders_resume_to_markdown_file() {
        let dir = std::env::temp_dir().join(format!("apply-adapters-render-{}", ulid::Ulid::new()));
        let renderer = MarkdownDocumentRenderer::new(&dir);
        let tailored = TailoredResume {
            professional_summary: "Backend engineer.".to_string(),
            technical_skills: vec![SkillSection {
                category: "Languages".to_string(),
                skills: vec!["Rust".to_string()],
            }],
            work_experience: vec![WorkExperienceEntry {
                company: "Acme".to_string(),
                title: "Engineer".to_string(),
                period: "2020-2024".to_string(),
                achievements: vec!["Shipped things.".to_string()],
            }],
            key_projects: vec!["Orchestrator".to_string()],
            education: "BS Computer Science".to_string(),
            tailoring_notes: "".to_string(),
        };

        let path = renderer.render_resume("acme::swe", &tailored).await.unwrap();
        assert!(path.exists());
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("Backend engineer."));
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
