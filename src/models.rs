//! Statically-typed documents stored by the application.

use serde::{Deserialize, Serialize};

/// Value of the `type` field carried by every user document.
pub const USER_TYPE: &str = "user";

/// Account document
///
/// `kind` distinguishes plain users from admins and the various partner
/// categories that get discounts (`ASCFI`, `CREA`, `ACADEMIC`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
  pub rev: Option<String>,
  #[serde(rename = "type")]
  pub kind: String,
  pub name: String,
  #[serde(default)]
  pub nif: String,
  pub email: String,
  pub password_hash: String,
  #[serde(default)]
  pub credits: f64,
}

impl User {
  pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
    Self {
      id: String::new(),
      rev: None,
      kind: USER_TYPE.to_string(),
      name: name.into(),
      nif: String::new(),
      email: email.into(),
      password_hash: String::new(),
      credits: 0.0,
    }
  }

  pub fn is_admin(&self) -> bool {
    self.kind.eq_ignore_ascii_case("admin")
  }
}
