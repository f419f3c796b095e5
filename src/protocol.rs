//! Wire types for the CouchDB REST API.
//!
//! Response shapes follow the server's JSON structures; fields the server may
//! leave out are defaulted so that older and clustered servers decode alike.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document whose schema is not known statically.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Prefix of every design document id.
pub const DESIGN_PREFIX: &str = "_design/";

/// Prefix of a view segment below a design document.
pub const VIEW_PREFIX: &str = "_view/";

/// Vendor block of the server root response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}

/// Server metadata returned by `GET /`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
  #[serde(default)]
  pub couchdb: String,
  #[serde(default)]
  pub version: String,
  #[serde(default, rename = "git_sha")]
  pub sha: String,
  #[serde(default)]
  pub uuid: String,
  #[serde(default)]
  pub features: Vec<String>,
  #[serde(default)]
  pub vendor: Vendor,
}

impl ServerInfo {
  pub fn has_feature(&self, feature: &str) -> bool {
    self.features.iter().any(|f| f == feature)
  }
}

/// Byte sizes reported for databases and view indexes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sizes {
  /// Size of the file on disk. View indexes are not included.
  #[serde(default)]
  pub file: u64,
  /// Uncompressed size of the contents.
  #[serde(default)]
  pub external: u64,
  /// Size of live data.
  #[serde(default)]
  pub active: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseProps {
  #[serde(default)]
  pub partitioned: bool,
}

/// Cluster replication parameters of a database
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
  /// Number of range partitions.
  #[serde(default, rename = "q")]
  pub shards: u16,
  /// Number of copies of every document.
  #[serde(default, rename = "n")]
  pub replicas: u16,
  /// Copies that must be written before a successful reply.
  #[serde(default, rename = "w")]
  pub write_quorum: u16,
  /// Consistent copies that must be read before a successful reply.
  #[serde(default, rename = "r")]
  pub read_quorum: u16,
}

/// Database descriptor returned by `GET /{db}`
///
/// The sequence tokens are opaque. Clustered servers send strings and single
/// node servers send numbers, so they stay raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseInfo {
  #[serde(rename = "db_name")]
  pub name: String,
  #[serde(default)]
  pub purge_seq: serde_json::Value,
  #[serde(default)]
  pub update_seq: serde_json::Value,
  #[serde(default)]
  pub sizes: Sizes,
  #[serde(default)]
  pub props: DatabaseProps,
  #[serde(default, rename = "doc_del_count")]
  pub doc_deleted_count: u64,
  #[serde(default)]
  pub doc_count: u64,
  #[serde(default)]
  pub disk_format_version: u16,
  #[serde(default)]
  pub compact_running: bool,
  #[serde(default)]
  pub cluster: Cluster,
  #[serde(default)]
  pub instance_start_time: String,
}

/// Map/reduce definition of a single view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
  #[serde(rename = "map")]
  pub map_function: String,
  #[serde(rename = "reduce", default, skip_serializing_if = "Option::is_none")]
  pub reduce_function: Option<String>,
}

/// Design document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
  pub rev: Option<String>,
  #[serde(default)]
  pub views: BTreeMap<String, ViewDefinition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language: Option<String>,
}

impl DesignDocument {
  /// Name without the `_design/` prefix.
  pub fn name(&self) -> &str {
    self.id.strip_prefix(DESIGN_PREFIX).unwrap_or(&self.id)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatesPending {
  #[serde(default)]
  pub minimum: i64,
  #[serde(default)]
  pub preferred: i64,
  #[serde(default)]
  pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewIndex {
  #[serde(default)]
  pub updates_pending: UpdatesPending,
  #[serde(default)]
  pub waiting_commit: bool,
  #[serde(default)]
  pub waiting_clients: u32,
  #[serde(default)]
  pub updater_running: bool,
  #[serde(default)]
  pub update_seq: serde_json::Value,
  #[serde(default)]
  pub sizes: Sizes,
  #[serde(default)]
  pub signature: String,
  #[serde(default)]
  pub purge_seq: serde_json::Value,
  #[serde(default)]
  pub language: String,
  #[serde(default)]
  pub compact_running: bool,
}

/// Design document information returned by `GET /{db}/_design/{ddoc}/_info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocumentInfo {
  pub name: String,
  #[serde(default)]
  pub view_index: ViewIndex,
}

/// One row of a view result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
  /// Absent on reduced rows.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default)]
  pub key: serde_json::Value,
  #[serde(default)]
  pub value: serde_json::Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doc: Option<Document>,
}

/// View query result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_rows: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub offset: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub update_seq: Option<serde_json::Value>,
  #[serde(default)]
  pub rows: Vec<ViewRow>,
}

/// Response to any document write
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
  pub id: String,
  #[serde(default)]
  pub ok: bool,
  pub rev: String,
}

/// `{"ok": true}` style acknowledgement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OkResponse {
  #[serde(default)]
  pub ok: bool,
}

/// Response of `POST /{db}/_find`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResponse {
  #[serde(default)]
  pub docs: Vec<Document>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub warning: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub execution_stats: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bookmark: Option<String>,
}

/// Response of `GET /_uuids`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UuidBatch {
  #[serde(default)]
  pub uuids: Vec<String>,
}
