use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::modules::content::model::ItemType;

pub const MAX_WAIT_SECS: u64 = 30;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadAccepted {
    pub upload_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadStatusQuery {
    /// Block up to this many seconds (max 30) for the upload to finish.
    pub wait_secs: Option<u64>,
}

impl UploadStatusQuery {
    pub fn wait(&self) -> Option<std::time::Duration> {
        self.wait_secs
            .filter(|secs| *secs > 0)
            .map(|secs| std::time::Duration::from_secs(secs.min(MAX_WAIT_SECS)))
    }
}

/// Multipart body of an upload request, as collected from the form fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<bytes::Bytes>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub item_type: Option<String>,
    pub title: Option<String>,
}

/// Validated form, ready to hand to the coordinator.
#[derive(Debug)]
pub struct ValidatedUpload {
    pub file: bytes::Bytes,
    pub file_name: String,
    pub content_type: mime::Mime,
    pub item_type: ItemType,
    pub title: String,
}

impl UploadForm {
    pub fn validate(self) -> Result<ValidatedUpload, String> {
        let file = self.file.ok_or("Missing 'file' field")?;
        if file.is_empty() {
            return Err("Uploaded file is empty".to_string());
        }

        let item_type: ItemType = self.item_type.as_deref().ok_or("Missing 'type' field")?.parse()?;
        let file_name = self.file_name.unwrap_or_else(|| "file".to_string());
        let content_type = resolve_content_type(item_type, self.content_type.as_deref(), &file_name)?;

        let title = match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => file_name.clone(),
        };
        if title.chars().count() > 200 {
            return Err("Title must be at most 200 characters".to_string());
        }

        Ok(ValidatedUpload {
            file,
            file_name,
            content_type,
            item_type,
            title,
        })
    }
}

/// Pick the content type to store the file under and check that both the
/// sent type and the file extension agree with the declared item type.
pub fn resolve_content_type(declared: ItemType, sent: Option<&str>, file_name: &str) -> Result<mime::Mime, String> {
    let guessed = mime_guess::from_path(file_name).first();
    if let Some(guessed) = &guessed {
        if !declared.accepts(guessed) {
            return Err(format!("File '{}' does not look like {} content", file_name, declared));
        }
    }

    let sent = sent
        .and_then(|s| s.parse::<mime::Mime>().ok())
        .filter(|m| *m != mime::APPLICATION_OCTET_STREAM);

    let resolved = sent
        .or(guessed)
        .ok_or_else(|| format!("Cannot determine the content type of '{}'", file_name))?;

    if !declared.accepts(&resolved) {
        return Err(format!("Content type {} is not valid for {} items", resolved, declared));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn form(file_name: &str, content_type: Option<&str>, item_type: &str) -> UploadForm {
        UploadForm {
            file: Some(Bytes::from_static(b"payload")),
            file_name: Some(file_name.to_string()),
            content_type: content_type.map(str::to_string),
            item_type: Some(item_type.to_string()),
            title: Some("  Intro  ".to_string()),
        }
    }

    #[test]
    fn accepts_matching_video() {
        let upload = form("intro.mp4", Some("video/mp4"), "video").validate().unwrap();
        assert_eq!(upload.item_type, ItemType::Video);
        assert_eq!(upload.content_type.essence_str(), "video/mp4");
        assert_eq!(upload.title, "Intro");
    }

    #[test]
    fn falls_back_to_extension_for_generic_content_type() {
        let upload = form("workbook.pdf", Some("application/octet-stream"), "document")
            .validate()
            .unwrap();
        assert_eq!(upload.content_type.essence_str(), "application/pdf");
    }

    #[test]
    fn rejects_extension_that_contradicts_declared_type() {
        let err = form("song.mp3", Some("video/mp4"), "video").validate().unwrap_err();
        assert!(err.contains("song.mp3"));
    }

    #[test]
    fn rejects_content_type_that_contradicts_declared_type() {
        assert!(form("cover", Some("audio/mpeg"), "image").validate().is_err());
    }

    #[test]
    fn rejects_empty_file_and_unknown_type() {
        let mut empty = form("a.png", Some("image/png"), "image");
        empty.file = Some(Bytes::new());
        assert_eq!(empty.validate().unwrap_err(), "Uploaded file is empty");

        assert!(form("a.png", Some("image/png"), "slides").validate().is_err());
    }

    #[test]
    fn blank_title_defaults_to_file_name() {
        let mut upload = form("cover.png", None, "image");
        upload.title = Some("   ".to_string());
        assert_eq!(upload.validate().unwrap().title, "cover.png");
    }

    #[test]
    fn wait_is_capped() {
        assert_eq!(UploadStatusQuery { wait_secs: Some(120) }.wait(), Some(std::time::Duration::from_secs(30)));
        assert_eq!(UploadStatusQuery { wait_secs: Some(0) }.wait(), None);
        assert_eq!(UploadStatusQuery { wait_secs: None }.wait(), None);
    }
}
