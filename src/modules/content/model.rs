use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "content_item_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Image,
    Audio,
    Video,
    Document,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Image => "image",
            ItemType::Audio => "audio",
            ItemType::Video => "video",
            ItemType::Document => "document",
        }
    }

    /// Whether a MIME type is acceptable for this declared item type.
    pub fn accepts(&self, mime: &mime::Mime) -> bool {
        match self {
            ItemType::Image => mime.type_() == mime::IMAGE,
            ItemType::Audio => mime.type_() == mime::AUDIO,
            ItemType::Video => mime.type_() == mime::VIDEO,
            ItemType::Document => {
                mime.type_() == mime::TEXT
                    || (mime.type_() == mime::APPLICATION && mime.subtype() != mime::OCTET_STREAM)
            }
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ItemType::Image),
            "audio" => Ok(ItemType::Audio),
            "video" => Ok(ItemType::Video),
            "document" => Ok(ItemType::Document),
            other => Err(format!("Unknown content type '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct CourseSection {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct CourseContentItem {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub item_type: ItemType,
    pub file_url: String,
    pub transcoding_asset_id: Option<String>,
    pub transcoding_playback_id: Option<String>,
    pub sort_order: i32,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
    #[schema(value_type = String, format = DateTime)]
    #[serde(with = "time::serde::iso8601")]
    pub updated_at: OffsetDateTime,
}

/// Identifiers of a processed video on the transcoding service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodingRefs {
    pub asset_id: String,
    pub playback_id: String,
}

impl TranscodingRefs {
    pub fn stream_url(&self) -> String {
        format!("https://stream.mux.com/{}.m3u8", self.playback_id)
    }
}

/// A fully ingested item, ready to be written.
///
/// The constructors are the only way to build one, so a video item always
/// carries its transcoding identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContentItem {
    section_id: Uuid,
    title: String,
    item_type: ItemType,
    file_url: String,
    transcoding: Option<TranscodingRefs>,
}

impl NewContentItem {
    pub fn stored(section_id: Uuid, title: String, item_type: ItemType, file_url: String) -> Self {
        debug_assert!(item_type != ItemType::Video, "video items must be transcoded");
        Self {
            section_id,
            title,
            item_type,
            file_url,
            transcoding: None,
        }
    }

    pub fn transcoded(section_id: Uuid, title: String, refs: TranscodingRefs) -> Self {
        Self {
            section_id,
            title,
            item_type: ItemType::Video,
            file_url: refs.stream_url(),
            transcoding: Some(refs),
        }
    }

    pub fn section_id(&self) -> Uuid {
        self.section_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn file_url(&self) -> &str {
        &self.file_url
    }

    pub fn transcoding(&self) -> Option<&TranscodingRefs> {
        self.transcoding.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_parses_case_insensitively() {
        assert_eq!("Video".parse::<ItemType>().unwrap(), ItemType::Video);
        assert_eq!(" document ".parse::<ItemType>().unwrap(), ItemType::Document);
        assert!("podcast".parse::<ItemType>().is_err());
    }

    #[test]
    fn item_type_accepts_matching_mime() {
        assert!(ItemType::Image.accepts(&mime::IMAGE_JPEG));
        assert!(!ItemType::Image.accepts(&"video/mp4".parse().unwrap()));
        assert!(ItemType::Video.accepts(&"video/mp4".parse().unwrap()));
        assert!(ItemType::Audio.accepts(&"audio/mpeg".parse().unwrap()));
        assert!(ItemType::Document.accepts(&mime::APPLICATION_PDF));
        assert!(ItemType::Document.accepts(&mime::TEXT_PLAIN));
        assert!(!ItemType::Document.accepts(&mime::APPLICATION_OCTET_STREAM));
    }

    #[test]
    fn transcoded_item_carries_both_identifiers() {
        let section = Uuid::new_v4();
        let item = NewContentItem::transcoded(
            section,
            "Intro".to_string(),
            TranscodingRefs {
                asset_id: "a1".to_string(),
                playback_id: "p1".to_string(),
            },
        );

        assert_eq!(item.item_type(), ItemType::Video);
        assert_eq!(item.file_url(), "https://stream.mux.com/p1.m3u8");
        let refs = item.transcoding().unwrap();
        assert_eq!(refs.asset_id, "a1");
        assert_eq!(refs.playback_id, "p1");
    }
}
