//! Blocking HTTP client for the CouchDB REST API.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::{
  DatabaseInfo, DesignDocument, DesignDocumentInfo, Document, FindResponse, OkResponse,
  ServerInfo, UuidBatch, ViewResult, WriteResponse, DESIGN_PREFIX, VIEW_PREFIX,
};
use crate::query::{FindOptions, ViewOptions};

const SYSTEM_DATABASES: &[&str] = &["_users", "_replicator", "_global_changes"];

fn database_name_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_$()+/-]*$").expect("static pattern"))
}

/// Check a database name against the server's naming rule.
pub fn validate_database_name(name: &str) -> Result<()> {
  if SYSTEM_DATABASES.contains(&name) || database_name_pattern().is_match(name) {
    Ok(())
  } else {
    Err(Error::InvalidDatabaseName(name.to_string()))
  }
}

/// Where new document ids come from when the caller leaves the id empty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdSource {
  /// Ask the server's `_uuids` endpoint.
  #[default]
  Server,
  /// Generate a random v4 UUID locally, saving a round trip.
  Local,
}

/// CouchDB client.
///
/// Read-only operations take `&self` and can share one instance. Selecting a
/// database takes `&mut self`; clone the client per call site when different
/// parts of a program work on different databases. Clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct CouchClient {
  server_url: Url,
  database_url: Option<Url>,
  database: Option<String>,
  username: Option<String>,
  password: Option<String>,
  all_dbs_path: String,
  id_source: IdSource,
  http: HttpClient,
  server_info: ServerInfo,
}

impl fmt::Debug for CouchClient {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CouchClient")
      .field("server_url", &self.server_url.as_str())
      .field("database", &self.database)
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "***"))
      .field("id_source", &self.id_source)
      .field("server_info", &self.server_info)
      .finish()
  }
}

impl CouchClient {
  /// Build a client without talking to the server.
  pub fn new(config: Config) -> Result<Self> {
    Self::with_http_client(config, HttpClient::new())
  }

  /// Build a client on top of an existing transport.
  pub fn with_http_client(config: Config, http: HttpClient) -> Result<Self> {
    let server_url = config.server_url()?;
    Ok(Self {
      server_url,
      database_url: None,
      database: None,
      username: config.username,
      password: config.password,
      all_dbs_path: config.all_dbs_path,
      id_source: IdSource::default(),
      http,
      server_info: ServerInfo::default(),
    })
  }

  /// Build a client and load the server metadata from `GET /`.
  pub fn connect(config: Config) -> Result<Self> {
    let mut client = Self::new(config)?;
    client.refresh_server_info()?;
    info!(
      server = %client.server_url,
      version = %client.server_info.version,
      vendor = %client.server_info.vendor.name,
      "connected to CouchDB"
    );
    Ok(client)
  }

  pub fn with_id_source(mut self, source: IdSource) -> Self {
    self.id_source = source;
    self
  }

  pub fn server_info(&self) -> &ServerInfo {
    &self.server_info
  }

  pub fn server_url(&self) -> &Url {
    &self.server_url
  }

  /// URL of the selected database, `None` when not connected to one.
  pub fn database_url(&self) -> Option<&Url> {
    self.database_url.as_ref()
  }

  pub fn database_name(&self) -> Option<&str> {
    self.database.as_deref()
  }

  pub fn is_connected(&self) -> bool {
    self.database_url.is_some()
  }

  /// Re-read version, features and vendor from the server root.
  pub fn refresh_server_info(&mut self) -> Result<&ServerInfo> {
    let url = self.server_url.clone();
    self.server_info = self.send(self.request(Method::GET, url), &[200])?;
    Ok(&self.server_info)
  }

  /// List all databases on the server.
  pub fn all_databases(&self) -> Result<Vec<String>> {
    let segments: Vec<&str> = self
      .all_dbs_path
      .split('/')
      .filter(|s| !s.is_empty())
      .collect();
    let url = join(&self.server_url, &segments)?;
    self.send(self.request(Method::GET, url), &[200])
  }

  /// Create a database. An existing database is reported as a status error.
  pub fn create_database(&self, name: &str) -> Result<bool> {
    validate_database_name(name)?;
    let url = join(&self.server_url, &[name])?;
    let resp: OkResponse = self.send(self.request(Method::PUT, url), &[200, 201, 202])?;
    Ok(resp.ok)
  }

  /// Delete a database. Deleting the selected one drops the selection.
  pub fn delete_database(&mut self, name: &str) -> Result<bool> {
    validate_database_name(name)?;
    let url = join(&self.server_url, &[name])?;
    let resp: OkResponse = self.send(self.request(Method::DELETE, url), &[200, 202])?;
    if self.database.as_deref() == Some(name) {
      self.database = None;
      self.database_url = None;
    }
    Ok(resp.ok)
  }

  /// Select a database and return its descriptor.
  ///
  /// The selection only changes when the database exists.
  pub fn use_database(&mut self, name: &str) -> Result<DatabaseInfo> {
    let url = join(&self.server_url, &[name])?;
    let db: DatabaseInfo = self.send(self.request(Method::GET, url.clone()), &[200])?;
    info!(database = %name, docs = db.doc_count, "selected database");
    self.database = Some(name.to_string());
    self.database_url = Some(url);
    Ok(db)
  }

  /// Descriptor of the selected database.
  pub fn database_info(&self) -> Result<DatabaseInfo> {
    let url = self.db_url("read database info")?.clone();
    self.send(self.request(Method::GET, url), &[200])
  }

  pub fn get_document(&self, id: &str) -> Result<Document> {
    self.get_document_as(id)
  }

  /// Fetch a document into a statically-known type.
  pub fn get_document_as<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
    let url = join(self.db_url("get a document")?, &[id])?;
    self.send(self.request(Method::GET, url), &[200])
  }

  /// Create or replace a document.
  ///
  /// An empty `id` gets a fresh identifier first. The id is written into the
  /// document's `_id`, and on success the new revision into `_rev`, so the same
  /// document can be written again. Revision conflicts are returned as is.
  pub fn create_or_update_document(&self, doc: &mut Document, id: &str) -> Result<WriteResponse> {
    let db_url = self.db_url("write a document")?;

    let id = if id.is_empty() {
      self.next_id()?
    } else {
      id.to_string()
    };
    let url = join(db_url, &[id.as_str()])?;
    doc.insert("_id".to_string(), serde_json::Value::String(id));

    let body = serde_json::to_vec(doc)?;
    let req = self
      .request(Method::PUT, url)
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .body(body);
    let resp: WriteResponse = self.send(req, &[200, 201, 202])?;
    if !resp.ok {
      warn!(id = %resp.id, "write acknowledged without ok flag");
    }

    doc.insert("_rev".to_string(), serde_json::Value::String(resp.rev.clone()));
    Ok(resp)
  }

  /// Write a typed document. When `id` is empty the document's own `_id`
  /// is used if it has one.
  pub fn put_document<T: Serialize>(&self, doc: &T, id: &str) -> Result<WriteResponse> {
    let mut map = match serde_json::to_value(doc)? {
      serde_json::Value::Object(map) => map,
      other => {
        return Err(<serde_json::Error as serde::ser::Error>::custom(format!(
          "document must be a JSON object, got {}",
          other
        ))
        .into())
      }
    };

    let own_id = map
      .get("_id")
      .and_then(|v| v.as_str())
      .unwrap_or_default()
      .to_string();
    let id = if id.is_empty() { own_id.as_str() } else { id };
    self.create_or_update_document(&mut map, id)
  }

  pub fn delete_document(&self, id: &str, rev: &str) -> Result<WriteResponse> {
    let mut url = join(self.db_url("delete a document")?, &[id])?;
    url.query_pairs_mut().append_pair("rev", rev);
    self.send(self.request(Method::DELETE, url), &[200, 202])
  }

  /// Fetch a design document. The `_design/` prefix is optional.
  pub fn get_design_document(&self, name: &str) -> Result<DesignDocument> {
    let url = join(
      self.db_url("get a design document")?,
      &["_design", design_name(name)],
    )?;
    self.send(self.request(Method::GET, url), &[200])
  }

  pub fn get_design_document_info(&self, name: &str) -> Result<DesignDocumentInfo> {
    let url = join(
      self.db_url("get design document info")?,
      &["_design", design_name(name), "_info"],
    )?;
    self.send(self.request(Method::GET, url), &[200])
  }

  /// Query a view of a design document.
  pub fn query_view(&self, design: &str, view: &str, opts: &ViewOptions) -> Result<ViewResult> {
    let view = view.strip_prefix(VIEW_PREFIX).unwrap_or(view);
    let mut url = join(
      self.db_url("query a view")?,
      &["_design", design_name(design), "_view", view],
    )?;

    let query = opts.to_query_string();
    if !query.is_empty() {
      url.set_query(Some(&query));
    }
    self.send(self.request(Method::GET, url), &[200])
  }

  /// Run a Mango query against the selected database.
  pub fn find(&self, opts: &FindOptions) -> Result<FindResponse> {
    let url = join(self.db_url("find")?, &["_find"])?;
    let req = self.request(Method::POST, url).json(opts);
    let resp: FindResponse = self.send(req, &[200])?;
    if let Some(warning) = &resp.warning {
      warn!(%warning, "find returned a warning");
    }
    Ok(resp)
  }

  /// One fresh identifier from the server.
  pub fn fetch_uuid(&self) -> Result<String> {
    let url = join(&self.server_url, &["_uuids"])?;
    let batch: UuidBatch = self.send(self.request(Method::GET, url), &[200])?;
    batch
      .uuids
      .into_iter()
      .next()
      .ok_or_else(|| Error::UnexpectedResponse("empty uuid batch".to_string()))
  }

  pub fn fetch_uuids(&self, count: u32) -> Result<Vec<String>> {
    let mut url = join(&self.server_url, &["_uuids"])?;
    url
      .query_pairs_mut()
      .append_pair("count", &count.to_string());
    let batch: UuidBatch = self.send(self.request(Method::GET, url), &[200])?;
    Ok(batch.uuids)
  }

  fn next_id(&self) -> Result<String> {
    match self.id_source {
      IdSource::Server => self.fetch_uuid(),
      IdSource::Local => Ok(Uuid::new_v4().simple().to_string()),
    }
  }

  fn db_url(&self, operation: &'static str) -> Result<&Url> {
    self.database_url.as_ref().ok_or(Error::NotConnected(operation))
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    debug!(%method, %url, "request");
    let req = self
      .http
      .request(method, url)
      .header(reqwest::header::ACCEPT, "application/json");
    match &self.username {
      Some(user) => req.basic_auth(user, self.password.as_ref()),
      None => req,
    }
  }

  fn send<T: DeserializeOwned>(&self, req: RequestBuilder, expected: &[u16]) -> Result<T> {
    let resp = req.send()?;
    let status = resp.status().as_u16();
    let body = resp.text()?;

    if !expected.contains(&status) {
      debug!(status, %body, "unexpected status");
      return Err(Error::Status {
        status,
        message: body,
      });
    }

    Ok(serde_json::from_str(&body)?)
  }
}

fn design_name(name: &str) -> &str {
  name.strip_prefix(DESIGN_PREFIX).unwrap_or(name)
}

/// Append path segments to `base`, escaping each one.
fn join(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| Error::Config(format!("{} cannot be a base URL", base)))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}
