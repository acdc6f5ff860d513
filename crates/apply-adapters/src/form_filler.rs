//! Generic Form Filler: matches form fields to `CandidateProfile` values by
//! keyword, over the `FormPage` port (SPEC_FULL.md §4.4).
//!
//! Grounded on `examples/original_source/core/form_filler.py`: exact keyword
//! map, ATS iframe allowlist, and fill algorithm (first-match-wins against
//! `clues`, select/checkbox/radio/text dispatch by element kind).

use apply_domain::entities::CandidateProfile;
use apply_ports::{FormElementKind, FormField, FormPage, FormPageError};
use tracing::instrument;

/// Domains hosting a known ATS iframe. §4.4.
const ATS_IFRAME_ALLOWLIST: &[&str] = &[
    "boards.greenhouse.io",
    "jobs.lever.co",
    "jobs.ashbyhq.com",
    "app.bamboohr.com",
    "workday",
];

/// Ordered keyword map: field kind -> keywords matched against a field's
/// lowercased clues. First match wins. §4.4 (authoritative, resolves the
/// distilled spec's "ordered keyword map" ambiguity).
const FIELD_KEYWORDS: &[(&str, &[&str])] = &[
    ("first_name", &["first name", "firstname", "fname", "given name"]),
    ("last_name", &["last name", "lastname", "lname", "surname", "family name"]),
    ("email", &["email", "e-mail"]),
    ("phone", &["phone", "telephone", "mobile", "cell"]),
    ("location", &["city", "location", "address"]),
    ("github", &["github", "portfolio", "code repository"]),
    ("website", &["website", "personal site", "blog", "url"]),
    ("experience", &["years of experience", "years experience", "how many years"]),
    ("current_title", &["current title", "current role", "job title"]),
    ("current_company", &["current company", "current employer", "company name"]),
    ("salary", &["desired salary", "salary expectation", "expected compensation"]),
    ("start_date", &["start date", "available", "notice period", "availability"]),
    ("education", &["education", "degree", "university", "school"]),
    ("authorization", &["authorized to work", "work authorization", "visa", "legally authorized"]),
    ("relocate", &["willing to relocate", "relocation", "open to relocation"]),
    ("hear_about", &["how did you hear", "where did you find", "referral source"]),
    ("cover_letter", &["cover letter", "cover_letter", "coverletter", "additional document"]),
    ("linkedin", &["linkedin", "linked in"]),
];

pub struct FormFiller<'a> {
    profile: &'a CandidateProfile,
}

impl<'a> FormFiller<'a> {
    pub fn new(profile: &'a CandidateProfile) -> Self {
        Self { profile }
    }

    /// Detect which frame (if any) hosts a known ATS iframe. `None` means
    /// the form lives directly on the page.
    pub fn detect_ats_iframe(&self, page: &dyn FormPage) -> Option<String> {
        page.frame_urls()
            .into_iter()
            .find(|url| ATS_IFRAME_ALLOWLIST.iter().any(|domain| url.contains(domain)))
    }

    fn identify(&self, field: &FormField) -> Option<&'static str> {
        let clues = field.clues.to_lowercase();
        FIELD_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| clues.contains(kw)))
            .map(|(kind, _)| *kind)
    }

    fn value_for(&self, key: &str) -> Option<String> {
        let p = self.profile;
        match key {
            "first_name" => Some(p.first_name.clone()),
            "last_name" => Some(p.last_name.clone()),
            "email" => Some(p.email.clone()),
            "phone" => Some(p.phone.clone()),
            "location" => Some(p.location.clone()),
            "github" => p.github.clone(),
            "website" => p.website.clone(),
            "experience" => Some(p.years_experience.clone()),
            "current_title" => Some(p.current_title.clone()),
            "current_company" => Some(p.current_company.clone()),
            "salary" => p.desired_salary.clone(),
            "start_date" => p.start_date.clone(),
            "education" => Some(p.education.clone()),
            "authorization" => Some(p.work_authorization.clone()),
            "relocate" => Some(p.willing_to_relocate.clone()),
            "hear_about" => Some("Job board".to_string()),
            // The candidate has no LinkedIn field populated.
            "linkedin" => Some(String::new()),
            // Never filled as text; handled by the separate file-upload pass.
            "cover_letter" => None,
            _ => None,
        }
    }

    /// Fill every recognized field on the page (or, if an ATS iframe is
    /// detected, scoped to that frame). Returns the map of field-kind ->
    /// value filled, matching the `fields_filled` reported on the Worker's
    /// progress Event.
    #[instrument(skip(self, page))]
    pub fn fill_form(
        &self,
        page: &dyn FormPage,
        resume_path: Option<&str>,
        cover_letter_path: Option<&str>,
    ) -> Result<std::collections::HashMap<String, String>, FormPageError> {
        let frame = self.detect_ats_iframe(page);
        let mut filled = std::collections::HashMap::new();

        for field in page.fields(frame.as_deref()) {
            if field.element_kind == FormElementKind::File {
                match self.identify(&field) {
                    Some("cover_letter") => {
                        if let Some(path) = cover_letter_path {
                            page.upload_file(&field, path)?;
                            filled.insert("cover_letter".to_string(), path.to_string());
                        }
                    }
                    Some(key) => {
                        if let Some(path) = resume_path {
                            page.upload_file(&field, path)?;
                            filled.insert(key.to_string(), path.to_string());
                        }
                    }
                    // A file input with no identifying keywords is assumed to
                    // be the single resume upload slot. §4.4.
                    None => {
                        if let Some(path) = resume_path {
                            page.upload_file(&field, path)?;
                            filled.insert("resume".to_string(), path.to_string());
                        }
                    }
                }
                continue;
            }

            let Some(key) = self.identify(&field) else {
                continue;
            };
            let Some(value) = self.value_for(key) else {
                continue;
            };

            match field.element_kind {
                FormElementKind::Select => {
                    page.select_option(&field, &value)?;
                }
                FormElementKind::Checkbox => {
                    let checked = matches!(value.to_lowercase().as_str(), "yes" | "true" | "1");
                    page.set_checkbox(&field, checked)?;
                }
                FormElementKind::Radio => {
                    let matches_value = field
                        .current_value_attr
                        .as_deref()
                        .map(|attr| attr.to_lowercase().contains(&value.to_lowercase()))
                        .unwrap_or(false);
                    if matches_value {
                        page.set_checkbox(&field, true)?;
                    }
                }
                FormElementKind::Text | FormElementKind::TextArea => {
                    page.fill_text(&field, &value)?;
                }
                FormElementKind::File => unreachable!("handled above"),
            }
            filled.insert(key.to_string(), value);
        }

        Ok(filled)
    }
}
