//! Demonstration of the couchdriver client against a live server.
//!
//! Reads the connection settings from the environment (see
//! `couchdriver::config`), then lists databases, selects one, queries a view
//! and runs a Mango query.

use couchdriver::query::{and, field, FindOptions, ViewOptions};
use couchdriver::{Config, CouchClient, User};
use tracing_subscriber::{fmt, EnvFilter};

/// Set-but-blank counts as unset.
fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
  non_blank(std::env::var(key).ok()).unwrap_or_else(|| default.to_string())
}

fn main() -> couchdriver::Result<()> {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("info,couchdriver=info"));
  fmt().with_env_filter(filter).with_target(true).init();

  let config = Config::from_env()?;
  let mut client = CouchClient::connect(config)?;
  let info = client.server_info();
  println!(
    "CouchDB {} ({}) features: {:?}",
    info.version, info.vendor.name, info.features
  );

  let dbs = client.all_databases()?;
  println!("Databases: {:?}", dbs);

  let db_name = match non_blank(std::env::var("COUCHDB_DB").ok()) {
    Some(name) => name,
    None => match dbs.iter().find(|d| !d.starts_with('_')) {
      Some(name) => name.clone(),
      None => {
        tracing::warn!("no user database found, nothing else to show");
        return Ok(());
      }
    },
  };

  let db = client.use_database(&db_name)?;
  println!(
    "{}: {} docs, {} bytes external",
    db.name, db.doc_count, db.sizes.external
  );

  let design = env_or("USER_DESIGN_DOC", "test");
  let view_name = env_or("ALL_USERS_VIEW", "all_user_view");

  let opts = ViewOptions::new().include_docs(true);
  match client.query_view(&design, &view_name, &opts) {
    Ok(view) => {
      for row in &view.rows {
        match row.doc.clone().map(serde_json::Value::Object) {
          Some(doc) => match serde_json::from_value::<User>(doc) {
            Ok(user) => println!("  {} <{}> credits={}", user.name, user.email, user.credits),
            Err(_) => println!("  {} -> {}", row.key, row.value),
          },
          None => println!("  {} -> {}", row.key, row.value),
        }
      }

      let unsorted = client.query_view(&design, &view_name, &opts.include_docs(false).sorted(false))?;
      println!("Unsorted view: {} rows", unsorted.rows.len());
    }
    Err(e) => tracing::warn!(error = %e, "view query failed"),
  }

  let new_id = client.fetch_uuid()?;
  println!("Fresh id: {}", new_id);

  let opts = FindOptions::new()
    .selector(and(vec![field("credits").lt(666), field("type").eq("user")]))
    .limit(3);
  println!("Find body: {}", serde_json::to_string(&opts)?);

  let found = client.find(&opts)?;
  for doc in &found.docs {
    println!("  {}", serde_json::Value::Object(doc.clone()));
  }

  Ok(())
}
