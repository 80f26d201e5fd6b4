//! Request and response bodies of the MDR APIs.
//!
//! Item values are entity specific, so item bodies carry their value fields as a flattened
//! JSON object next to the shared version metadata.

use chrono::{DateTime, Utc};
use mdr_core::{
    ItemFilter, LibraryItem, LibraryItemValue, LibraryRecord, MdrError, MdrResult, Page,
    VersionHistoryEntry, VersionSelector,
};
use mdr_types::VersionNumber;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every error response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// e.g. `VersioningException`
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorRes {
    pub fn from_error(err: &MdrError) -> Self {
        let message = if err.is_internal() {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };
        Self {
            error_type: err.error_type().to_string(),
            message,
            code: err.code().map(str::to_string),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LibraryRes {
    pub name: String,
    pub is_editable: bool,
}

impl From<LibraryRecord> for LibraryRes {
    fn from(record: LibraryRecord) -> Self {
        Self {
            name: record.name,
            is_editable: record.is_editable,
        }
    }
}

fn default_editable() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateLibraryReq {
    pub name: String,
    #[serde(default = "default_editable")]
    pub is_editable: bool,
}

/// One version of a library item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LibraryItemRes {
    pub uid: String,
    pub library_name: String,
    pub status: String,
    pub version: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub change_description: String,
    pub author_username: String,
    pub possible_actions: Vec<String>,
    /// Entity specific value fields.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

impl LibraryItemRes {
    pub fn from_item<V: LibraryItemValue>(item: &LibraryItem<V>) -> MdrResult<Self> {
        let fields = match serde_json::to_value(item.value()).map_err(MdrError::Serialization)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let metadata = item.item_metadata();
        Ok(Self {
            uid: item.uid().unwrap_or_default().to_string(),
            library_name: item.library().name().to_string(),
            status: metadata.status().as_str().to_string(),
            version: metadata.version(),
            start_date: metadata.start_date(),
            end_date: metadata.end_date(),
            change_description: metadata.change_description().to_string(),
            author_username: metadata.author().to_string(),
            possible_actions: item
                .possible_actions()
                .into_iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            fields,
        })
    }
}

/// One entry of a version history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VersionRes {
    #[serde(flatten)]
    pub item: LibraryItemRes,
    /// Fields that differ from the previous version, each mapped to `true`.
    pub changes: BTreeMap<String, bool>,
}

impl VersionRes {
    pub fn from_entry<V: LibraryItemValue>(entry: &VersionHistoryEntry<V>) -> MdrResult<Self> {
        Ok(Self {
            item: LibraryItemRes::from_item(&entry.item)?,
            changes: entry.changes.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageRes {
    pub items: Vec<LibraryItemRes>,
    pub total: Option<usize>,
    pub page: usize,
    pub size: usize,
}

impl PageRes {
    pub fn from_page<V: LibraryItemValue>(page: &Page<LibraryItem<V>>) -> MdrResult<Self> {
        Ok(Self {
            items: page
                .items
                .iter()
                .map(LibraryItemRes::from_item)
                .collect::<MdrResult<_>>()?,
            total: page.total,
            page: page.page_number,
            size: page.page_size,
        })
    }
}

/// Body of a create request: `library_name` plus the value fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateItemReq {
    pub library_name: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

/// Body of a draft edit: the changed value fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EditItemReq {
    pub change_description: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

/// Body of a new version request; value fields are optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewVersionReq {
    #[serde(default)]
    pub change_description: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Map<String, Value>,
}

fn page_number_or_default(page_number: Option<usize>) -> usize {
    page_number.unwrap_or(1)
}

fn parse_status(status: Option<&str>) -> MdrResult<Option<mdr_core::LibraryItemStatus>> {
    status.map(str::parse).transpose()
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub library_name: Option<String>,
    /// Draft, Final or Retired
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,
    /// 1-based
    pub page_number: Option<usize>,
    /// 0 returns every item
    pub page_size: Option<usize>,
    pub total_count: Option<bool>,
}

impl ListQuery {
    pub fn to_filter(&self) -> MdrResult<ItemFilter> {
        let defaults = ItemFilter::default();
        Ok(ItemFilter {
            library_name: self.library_name.clone(),
            status: parse_status(self.status.as_deref())?,
            sort_by: self.sort_by.clone(),
            sort_desc: self.sort_desc.unwrap_or(false),
            page_number: page_number_or_default(self.page_number),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            total_count: self.total_count.unwrap_or(false),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditTrailQuery {
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
    pub total_count: Option<bool>,
}

impl AuditTrailQuery {
    /// `(page_number, page_size, total_count)` with defaults applied.
    pub fn paging(&self) -> (usize, usize, bool) {
        (
            page_number_or_default(self.page_number),
            self.page_size.unwrap_or(ItemFilter::default().page_size),
            self.total_count.unwrap_or(false),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VersionQuery {
    /// e.g. `1.2`
    pub version: Option<String>,
    pub status: Option<String>,
    /// RFC 3339 date-time
    pub at_specified_date_time: Option<String>,
}

impl VersionQuery {
    pub fn to_selector(&self) -> MdrResult<VersionSelector> {
        let version = self
            .version
            .as_deref()
            .map(|v| {
                v.parse::<VersionNumber>()
                    .map_err(|e| MdrError::Validation(format!("version: {e}")))
            })
            .transpose()?;
        let at_specified_date_time = self
            .at_specified_date_time
            .as_deref()
            .map(|at| {
                DateTime::parse_from_rfc3339(at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| MdrError::Validation(format!("at_specified_date_time: {e}")))
            })
            .transpose()?;
        Ok(VersionSelector {
            version,
            status: parse_status(self.status.as_deref())?,
            at_specified_date_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_keeps_value_fields() {
        let req: CreateItemReq =
            serde_json::from_value(json!({"library_name": "Sponsor", "name": "A"})).unwrap();
        assert_eq!(req.library_name, "Sponsor");
        assert_eq!(req.fields.get("name"), Some(&json!("A")));
        assert!(!req.fields.contains_key("library_name"));
    }

    #[test]
    fn version_query_parses_selectors() {
        let query = VersionQuery {
            version: Some("1.2".into()),
            status: Some("final".into()),
            at_specified_date_time: Some("2024-01-02T03:04:05Z".into()),
        };
        let selector = query.to_selector().unwrap();
        assert_eq!(selector.version, Some(VersionNumber::new(1, 2)));
        assert_eq!(selector.status, Some(mdr_core::LibraryItemStatus::Final));
        assert!(selector.at_specified_date_time.is_some());

        let bad = VersionQuery {
            version: Some("one".into()),
            ..Default::default()
        };
        assert!(matches!(bad.to_selector(), Err(MdrError::Validation(_))));
    }

    #[test]
    fn list_query_applies_defaults() {
        let filter = ListQuery::default().to_filter().unwrap();
        assert_eq!(filter, ItemFilter::default());

        let bad = ListQuery {
            status: Some("pending".into()),
            ..Default::default()
        };
        assert!(bad.to_filter().is_err());
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = MdrError::CorruptMetadata("secret path".into());
        let res = ErrorRes::from_error(&err);
        assert_eq!(res.error_type, "InternalServerError");
        assert!(!res.message.contains("secret"));

        let res = ErrorRes::from_error(&MdrError::versioning_with_code(
            "Only DRAFT version can be approved.",
            "invalid_status_non_draft",
        ));
        assert_eq!(res.error_type, "VersioningException");
        assert_eq!(res.code.as_deref(), Some("invalid_status_non_draft"));
    }
}
