// Wizard session
// Everything a staff member has entered so far, kept between requests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cache::{CacheBackend, CacheError, CacheRegion, TypedCache};
use crate::certificates::IssuanceOutcome;
use crate::wizard::{RecipientInput, WizardState};

/// One certificate being prepared in step 2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    /// Opaque key; posted fields for this line are named `gc{key}-{field}`
    pub key: String,
    pub fields: BTreeMap<String, String>,
}

impl LineItem {
    pub fn new(key: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    pub fn blank() -> Self {
        Self::new(new_line_key(), BTreeMap::new())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Fresh line key
pub fn new_line_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Field prefix of a line in posted data
pub fn line_prefix(key: &str) -> String {
    format!("gc{}-", key)
}

/// Collect the posted fields of one line
///
/// Fields are stripped of their `gc{key}-` prefix, empty values are dropped and the
/// quantity is kept as the posted string.
pub fn normalize_line_item(raw: &BTreeMap<String, String>, key: &str) -> LineItem {
    let prefix = line_prefix(key);
    let fields = raw
        .iter()
        .filter_map(|(name, value)| {
            let field = name.strip_prefix(&prefix)?;
            if field.is_empty() || value.is_empty() {
                return None;
            }
            let value = if field == "quantity" {
                value.trim().to_string()
            } else {
                value.clone()
            };
            Some((field.to_string(), value))
        })
        .collect();

    LineItem::new(key, fields)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardSession {
    pub state: WizardState,
    pub step1: Option<RecipientInput>,
    pub step2: Vec<LineItem>,
    /// Name of the group template the lines were loaded from
    pub template_group: Option<String>,
    /// Result of the last submission, read by the confirmation view
    pub outcome: Option<IssuanceOutcome>,
}

/// Sessions stored as JSON under `wizard:{staff_id}`
#[derive(Clone)]
pub struct SessionStore {
    cache: TypedCache<WizardSession>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            cache: TypedCache::new(backend, CacheRegion::WizardSession),
        }
    }

    pub async fn load(&self, staff_id: i32) -> Result<WizardSession, CacheError> {
        Ok(self.cache.try_get(staff_id).await?.unwrap_or_default())
    }

    pub async fn save(&self, staff_id: i32, session: &WizardSession) -> Result<(), CacheError> {
        self.cache.try_set(staff_id, session).await
    }

    pub async fn load_step1(&self, staff_id: i32) -> Result<Option<RecipientInput>, CacheError> {
        Ok(self.load(staff_id).await?.step1)
    }

    pub async fn save_step1(&self, staff_id: i32, step1: Option<RecipientInput>) -> Result<(), CacheError> {
        let mut session = self.load(staff_id).await?;
        session.step1 = step1;
        self.save(staff_id, &session).await
    }

    pub async fn load_step2(&self, staff_id: i32) -> Result<Vec<LineItem>, CacheError> {
        Ok(self.load(staff_id).await?.step2)
    }

    pub async fn save_step2(&self, staff_id: i32, step2: Vec<LineItem>) -> Result<(), CacheError> {
        let mut session = self.load(staff_id).await?;
        session.step2 = step2;
        self.save(staff_id, &session).await
    }
}
