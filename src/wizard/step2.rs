// Step-2 line editing
// Add, duplicate, delete and group-template expansion, bounded by the batch limit

use serde::Deserialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::certificates::CertificateGroupTemplate;
use crate::wizard::{forms::DATE_FORMAT, LineItem};

pub const AT_LEAST_ONE_CERTIFICATE: &str = "You must have at least one certificate.";

pub fn limit_message(limit: usize) -> String {
    format!("You cannot create more than {} certificates", limit)
}

/// What a step-2 post asks for; anything but `Submit` only edits the lines
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step2Action {
    Add {
        /// Line the button was pressed on
        key: Option<String>,
    },
    Duplicate {
        key: String,
        /// Number of copies as posted; unparsable values mean one
        count: Option<String>,
    },
    Delete {
        key: String,
    },
    Reload {
        key: String,
    },
    Reset,
    LoadGroup {
        group: i32,
    },
    #[default]
    Submit,
}

/// Outcome of a line edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditResult {
    /// Line the client should scroll back to
    pub refocus: Option<String>,
    pub warnings: Vec<String>,
}

impl EditResult {
    fn focus(key: impl Into<String>) -> Self {
        Self {
            refocus: Some(key.into()),
            warnings: Vec::new(),
        }
    }

    fn warn(key: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            refocus: Some(key.into()),
            warnings: vec![warning.into()],
        }
    }
}

/// Append a blank line unless the batch is full
pub fn add_line(lines: &mut Vec<LineItem>, limit: usize, pressed_on: Option<String>) -> EditResult {
    if lines.len() < limit {
        let line = LineItem::blank();
        let key = line.key.clone();
        lines.push(line);
        EditResult::focus(key)
    } else {
        let key = pressed_on
            .or_else(|| lines.last().map(|l| l.key.clone()))
            .unwrap_or_default();
        EditResult::warn(key, limit_message(limit))
    }
}

/// Append `count` copies of a line, or none when they would not all fit
pub fn duplicate_line(lines: &mut Vec<LineItem>, limit: usize, key: &str, count: Option<&str>) -> EditResult {
    let Some(source) = lines.iter().find(|l| l.key == key).cloned() else {
        return EditResult::focus(key);
    };

    let count = count
        .and_then(|c| c.trim().parse::<i64>().ok())
        .unwrap_or(1);
    let Ok(count) = usize::try_from(count) else {
        return EditResult::focus(key);
    };

    if lines.len() + count > limit {
        return EditResult::warn(key, limit_message(limit));
    }

    let mut result = EditResult::focus(key);
    for n in 0..count {
        let copy = LineItem::new(crate::wizard::new_line_key(), source.fields.clone());
        if n == 0 {
            result.refocus = Some(copy.key.clone());
        }
        lines.push(copy);
    }
    result
}

/// Remove a line, always keeping at least one
pub fn delete_line(lines: &mut Vec<LineItem>, key: &str) -> EditResult {
    if lines.len() > 1 {
        lines.retain(|l| l.key != key);
        EditResult::focus(key)
    } else {
        EditResult::warn(key, AT_LEAST_ONE_CERTIFICATE)
    }
}

/// Lines of a group template; each row is repeated `count` times
pub fn expand_group(templates: &[CertificateGroupTemplate]) -> Vec<LineItem> {
    let mut lines = Vec::new();

    for template in templates {
        let mut fields = BTreeMap::new();
        fields.insert("type".to_string(), template.certificate_type_id.to_string());
        if let Some(club) = template.club_id {
            fields.insert("club".to_string(), club.to_string());
        }
        if let Some(club) = template.club_secondary_id {
            fields.insert("club_secondary".to_string(), club.to_string());
        }
        if let Some(quantity) = template.quantity.filter(|q| !q.is_zero()) {
            fields.insert("quantity".to_string(), quantity.to_string());
        }
        if let Some(note) = template.note.as_ref().filter(|n| !n.is_empty()) {
            fields.insert("note".to_string(), note.clone());
        }
        if let Some(message) = template.message.as_ref().filter(|m| !m.is_empty()) {
            fields.insert("message".to_string(), message.clone());
        }
        if let Some(power_cart) = template.power_cart {
            fields.insert("power_cart".to_string(), power_cart.code().to_string());
        }
        if let Some(expiry) = template.expiry_date {
            fields.insert("expiry_date".to_string(), expiry.format(DATE_FORMAT).to_string());
        }

        for _ in 0..template.count.max(0) {
            lines.push(LineItem::new(crate::wizard::new_line_key(), fields.clone()));
        }
    }

    lines
}
