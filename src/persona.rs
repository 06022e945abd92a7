//! Persona context — who the assistant speaks for.
//!
//! Reads the free-text biography and the profile document once at startup.
//! A `.pdf` profile is text-extracted page by page; anything else is read as
//! UTF-8 text. The result is immutable for the life of the process.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::PersonaSettings;

/// Errors loading persona documents. Always fatal at startup.
#[derive(Debug, Error)]
pub enum PersonaError {
    /// A document could not be read.
    #[error("failed to read {kind} document {path}: {reason}")]
    Unreadable {
        kind: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// The profile PDF could not be opened or parsed.
    #[error("failed to extract text from {path}: {reason}")]
    PdfExtraction { path: PathBuf, reason: String },
}

/// The identity and background the assistant represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Display name, used throughout the system prompt.
    pub name: String,
    /// Free-text career summary.
    pub biography: String,
    /// Text of the profile document (e.g. a LinkedIn export).
    pub profile_text: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        biography: impl Into<String>,
        profile_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            biography: biography.into(),
            profile_text: profile_text.into(),
        }
    }

    /// Load the persona documents named in the settings.
    pub fn load(settings: &PersonaSettings) -> Result<Self, PersonaError> {
        let biography = read_text(&settings.summary_path, "summary")?;
        let profile_text = read_profile(&settings.profile_path)?;

        tracing::info!(
            name = %settings.name,
            summary = %settings.summary_path.display(),
            profile = %settings.profile_path.display(),
            biography_chars = biography.len(),
            profile_chars = profile_text.len(),
            "persona loaded"
        );

        Ok(Self::new(settings.name.clone(), biography, profile_text))
    }
}

fn read_text(path: &Path, kind: &'static str) -> Result<String, PersonaError> {
    std::fs::read_to_string(path).map_err(|e| PersonaError::Unreadable {
        kind,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn read_profile(path: &Path) -> Result<String, PersonaError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        extract_pdf_text(path)
    } else {
        read_text(path, "profile")
    }
}

/// Concatenate the text of every page, in page order.
///
/// Pages with no extractable text (scans, images) are skipped.
fn extract_pdf_text(path: &Path) -> Result<String, PersonaError> {
    if !path.is_file() {
        return Err(PersonaError::Unreadable {
            kind: "profile",
            path: path.to_path_buf(),
            reason: "file not found".into(),
        });
    }

    let doc = lopdf::Document::load(path).map_err(|e| PersonaError::PdfExtraction {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    for page in doc.get_pages().keys() {
        match doc.extract_text(&[*page]) {
            Ok(page_text) if !page_text.trim().is_empty() => text.push_str(&page_text),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(page = *page, error = %e, "skipping unreadable profile page");
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: &Path, summary: &str, profile: &str) -> PersonaSettings {
        PersonaSettings {
            name: "Ada".to_string(),
            summary_path: dir.join(summary),
            profile_path: dir.join(profile),
        }
    }

    #[test]
    fn test_load_text_documents_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.txt"), "Mathematician.\nWrote notes.").unwrap();
        std::fs::write(dir.path().join("profile.txt"), "Experience\n  Analyst, 1843").unwrap();

        let persona = Persona::load(&settings(dir.path(), "summary.txt", "profile.txt")).unwrap();
        assert_eq!(persona.name, "Ada");
        assert_eq!(persona.biography, "Mathematician.\nWrote notes.");
        assert_eq!(persona.profile_text, "Experience\n  Analyst, 1843");
    }

    /// Write a PDF with one text line per page.
    fn write_pdf(path: &Path, pages: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => count,
                "Kids" => kids,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_pdf_profile_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.txt"), "s").unwrap();
        write_pdf(
            &dir.path().join("linkedin.pdf"),
            &["Page one text", "Page two text"],
        );

        let persona = Persona::load(&settings(dir.path(), "summary.txt", "linkedin.pdf")).unwrap();

        let first = persona.profile_text.find("Page one text").expect("first page");
        let second = persona.profile_text.find("Page two text").expect("second page");
        assert!(first < second);
    }

    #[test]
    fn test_missing_summary_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("profile.txt"), "p").unwrap();

        let err = Persona::load(&settings(dir.path(), "summary.txt", "profile.txt")).unwrap_err();
        assert!(matches!(err, PersonaError::Unreadable { kind: "summary", .. }));
    }

    #[test]
    fn test_missing_profile_pdf_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.txt"), "s").unwrap();

        let err = Persona::load(&settings(dir.path(), "summary.txt", "linkedin.pdf")).unwrap_err();
        assert!(matches!(err, PersonaError::Unreadable { kind: "profile", .. }));
    }

    #[test]
    fn test_corrupt_pdf_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.txt"), "s").unwrap();
        std::fs::write(dir.path().join("linkedin.PDF"), "this is not a pdf").unwrap();

        let err = Persona::load(&settings(dir.path(), "summary.txt", "linkedin.PDF")).unwrap_err();
        assert!(matches!(err, PersonaError::PdfExtraction { .. }));
    }
}
