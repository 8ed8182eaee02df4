use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Where the bytes of a resource physically live. At most one per resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    /// Bytes embedded in the resource row.
    Inline(Vec<u8>),
    /// Absolute filesystem path under the data root.
    Local(String),
    /// Directly fetchable link (object storage or a plain external URL).
    External(String),
}

impl ResourceLocation {
    pub fn external_link(&self) -> Option<&str> {
        match self {
            ResourceLocation::External(link) => Some(link),
            _ => None,
        }
    }

    pub fn internal_path(&self) -> Option<&str> {
        match self {
            ResourceLocation::Local(path) => Some(path),
            _ => None,
        }
    }
}

/// A stored attachment owned by a creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: i32,
    pub creator_id: i32,
    /// Seconds since epoch.
    pub created_ts: i64,
    pub updated_ts: i64,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    /// `None` when the record carries no location, or when an inline blob was
    /// not requested (`FindResource::get_blob == false`).
    pub location: Option<ResourceLocation>,
    pub linked_memo_amount: i64,
}

impl Resource {
    /// File extension of the stored filename including the dot, e.g. `.png`.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default()
    }
}

/// Resource draft handed to a storage backend before it is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceCreate {
    pub creator_id: i32,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub location: Option<ResourceLocation>,
}

/// Lookup filter for resource records.
#[derive(Debug, Clone, Default)]
pub struct FindResource {
    pub id: Option<i32>,
    pub creator_id: Option<i32>,
    pub filename: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Load inline blob bytes. Listing never needs them.
    pub get_blob: bool,
}

impl FindResource {
    pub fn by_id(id: i32) -> Self {
        FindResource {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn with_blob(mut self) -> Self {
        self.get_blob = true;
        self
    }

    pub fn with_creator(mut self, creator_id: i32) -> Self {
        self.creator_id = Some(creator_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResource {
    pub id: i32,
    pub filename: Option<String>,
    pub updated_ts: i64,
}

/// Memo visibility tier. Ordering follows precedence: Public > Protected > Private.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Private,
    Protected,
    Public,
}

impl FromStr for Visibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Visibility::Public),
            "PROTECTED" => Ok(Visibility::Protected),
            "PRIVATE" => Ok(Visibility::Private),
            _ => Err(anyhow::anyhow!("Invalid visibility: {}", s)),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "PUBLIC"),
            Visibility::Protected => write!(f, "PROTECTED"),
            Visibility::Private => write!(f, "PRIVATE"),
        }
    }
}

/// Link between a memo and a resource it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoResource {
    pub memo_id: i32,
    pub resource_id: i32,
}

pub const ACTIVITY_RESOURCE_CREATE: &str = "resource.create";
pub const ACTIVITY_LEVEL_INFO: &str = "INFO";

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityCreate {
    pub creator_id: i32,
    pub kind: String,
    pub level: String,
    pub payload: serde_json::Value,
}

impl ActivityCreate {
    pub fn resource_created(creator_id: i32, resource: &ResourceCreate) -> Self {
        ActivityCreate {
            creator_id,
            kind: ACTIVITY_RESOURCE_CREATE.to_string(),
            level: ACTIVITY_LEVEL_INFO.to_string(),
            payload: serde_json::json!({
                "filename": resource.filename,
                "type": resource.content_type,
                "size": resource.size,
            }),
        }
    }
}

/// Resource as returned to API clients. Inline bytes and internal paths are never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    pub id: i32,
    pub creator_id: i32,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub filename: String,
    pub external_link: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub linked_memo_amount: i64,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        let external_link = resource
            .location
            .as_ref()
            .and_then(|l| l.external_link())
            .unwrap_or_default()
            .to_string();
        ResourceResponse {
            id: resource.id,
            creator_id: resource.creator_id,
            created_ts: resource.created_ts,
            updated_ts: resource.updated_ts,
            filename: resource.filename,
            external_link,
            content_type: resource.content_type,
            size: resource.size,
            linked_memo_amount: resource.linked_memo_amount,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub external_link: String,
    #[serde(default, rename = "type")]
    pub content_type: String,
    /// Fetch the external link and store its bytes with the active backend.
    #[serde(default)]
    pub download_to_local: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListResourcesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(location: Option<ResourceLocation>) -> Resource {
        Resource {
            id: 1,
            creator_id: 2,
            created_ts: 10,
            updated_ts: 11,
            filename: "cat.png".to_string(),
            content_type: "image/png".to_string(),
            size: 3,
            location,
            linked_memo_amount: 0,
        }
    }

    #[test]
    fn test_visibility_precedence() {
        assert!(Visibility::Public > Visibility::Protected);
        assert!(Visibility::Protected > Visibility::Private);
        assert_eq!(
            [Visibility::Private, Visibility::Public, Visibility::Protected]
                .into_iter()
                .max(),
            Some(Visibility::Public)
        );
    }

    #[test]
    fn test_visibility_round_trip_text() {
        for v in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            assert_eq!(v.to_string().parse::<Visibility>().unwrap(), v);
        }
        assert!("public".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_response_hides_internal_location() {
        let local = ResourceResponse::from(resource(Some(ResourceLocation::Local(
            "/data/assets/cat.png".to_string(),
        ))));
        assert_eq!(local.external_link, "");

        let inline = ResourceResponse::from(resource(Some(ResourceLocation::Inline(vec![1, 2, 3]))));
        let json = serde_json::to_value(&inline).unwrap();
        assert_eq!(json["type"], "image/png");
        assert_eq!(json["externalLink"], "");
        assert!(json.get("blob").is_none());
        assert!(json.get("internalPath").is_none());

        let remote = ResourceResponse::from(resource(Some(ResourceLocation::External(
            "https://cdn.example.com/cat.png".to_string(),
        ))));
        assert_eq!(remote.external_link, "https://cdn.example.com/cat.png");
    }

    #[test]
    fn test_extension() {
        assert_eq!(resource(None).extension(), ".png");
        let mut r = resource(None);
        r.filename = "README".to_string();
        assert_eq!(r.extension(), "");
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateResourceRequest =
            serde_json::from_str(r#"{"externalLink":"https://x.test/a.png"}"#).unwrap();
        assert_eq!(req.external_link, "https://x.test/a.png");
        assert!(!req.download_to_local);
        assert!(req.filename.is_empty());
    }

    #[test]
    fn test_activity_payload() {
        let draft = ResourceCreate {
            creator_id: 5,
            filename: "a.txt".to_string(),
            content_type: "text/plain".to_string(),
            size: 4,
            location: None,
        };
        let activity = ActivityCreate::resource_created(5, &draft);
        assert_eq!(activity.kind, "resource.create");
        assert_eq!(activity.level, "INFO");
        assert_eq!(activity.payload["size"], 4);
        assert_eq!(activity.payload["type"], "text/plain");
    }
}
