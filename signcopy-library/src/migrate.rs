//! Schema migrations for library documents.
//!
//! Each step is keyed by the version it upgrades from and only fills in or
//! renames what is missing, so replaying a step is harmless. The version
//! field is bumped once after every applicable step has run.

use crate::document::DocumentKind;
use crate::error::{LibraryError, LibraryResult};
use serde_json::{Map, Value};
use signcopy_types::{SignColor, SignVariant};

/// Version written by this build.
pub const CURRENT_VERSION: u64 = 3;

/// Root field holding the schema version.
pub const VERSION_KEY: &str = "config-version";

/// Version assumed for documents that predate the version field.
const UNVERSIONED: u64 = 1;

/// What a migration run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: u64,
    pub to: u64,
}

impl MigrationReport {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Reads the stored version of `doc`.
pub fn version_of(doc: &Value) -> u64 {
    doc.get(VERSION_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(UNVERSIONED)
}

/// Upgrades `doc` in place to [`CURRENT_VERSION`].
///
/// Documents already at or above the current version are left untouched.
pub fn migrate(kind: DocumentKind, doc: &mut Value) -> LibraryResult<MigrationReport> {
    let from = version_of(doc);
    if from >= CURRENT_VERSION {
        return Ok(MigrationReport { from, to: from });
    }

    let root = doc
        .as_object_mut()
        .ok_or_else(|| LibraryError::Migration("document root is not an object".to_string()))?;

    if from < 2 {
        rename_root(kind, root);
        for_each_entry(kind, root, upgrade_entry_v2);
    }
    if from < 3 {
        for_each_entry(kind, root, upgrade_entry_v3);
        if kind == DocumentKind::Players {
            drop_empty_sections(root);
        }
    }

    root.insert(VERSION_KEY.to_string(), Value::from(CURRENT_VERSION));
    Ok(MigrationReport {
        from,
        to: CURRENT_VERSION,
    })
}

/// v1 kept owner libraries under `signs`.
fn rename_root(kind: DocumentKind, root: &mut Map<String, Value>) {
    if kind == DocumentKind::Players && !root.contains_key(kind.root_key()) {
        if let Some(signs) = root.remove("signs") {
            root.insert(kind.root_key().to_string(), signs);
        }
    }
}

/// v1 entries used `lines` and `color` for the front side.
fn upgrade_entry_v2(entry: &mut Map<String, Value>) {
    move_field(entry, "lines", "front");
    move_field(entry, "color", "frontColor");
}

/// v2 had a single glow flag and no back side metadata.
fn upgrade_entry_v3(entry: &mut Map<String, Value>) {
    let legacy = entry
        .get("glowing")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    entry
        .entry("frontGlowing")
        .or_insert(Value::Bool(legacy));
    entry.entry("backGlowing").or_insert(Value::Bool(false));
    entry
        .entry("back")
        .or_insert_with(|| Value::Array(Vec::new()));
    entry
        .entry("backColor")
        .or_insert_with(|| Value::from(SignColor::FALLBACK.as_str()));
    entry
        .entry("signType")
        .or_insert_with(|| Value::from(SignVariant::default().as_str()));
    entry.entry("glowing").or_insert(Value::Bool(legacy));
}

fn move_field(entry: &mut Map<String, Value>, from: &str, to: &str) {
    if entry.contains_key(to) {
        return;
    }
    if let Some(value) = entry.remove(from) {
        entry.insert(to.to_string(), value);
    }
}

fn drop_empty_sections(root: &mut Map<String, Value>) {
    if let Some(Value::Object(owners)) = root.get_mut(DocumentKind::Players.root_key()) {
        owners.retain(|_, section| match section {
            Value::Object(entries) => !entries.is_empty(),
            _ => false,
        });
    }
}

fn for_each_entry(
    kind: DocumentKind,
    root: &mut Map<String, Value>,
    mut apply: impl FnMut(&mut Map<String, Value>),
) {
    let Some(Value::Object(section)) = root.get_mut(kind.root_key()) else {
        return;
    };
    match kind {
        DocumentKind::Players => {
            for owner in section.values_mut() {
                if let Value::Object(entries) = owner {
                    entries
                        .values_mut()
                        .filter_map(Value::as_object_mut)
                        .for_each(&mut apply);
                }
            }
        }
        DocumentKind::Templates => {
            section
                .values_mut()
                .filter_map(Value::as_object_mut)
                .for_each(&mut apply);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v1_players_document_is_upgraded() {
        let mut doc = json!({
            "signs": {
                "owner-a": {
                    "shop": { "lines": ["Shop"], "color": "RED", "glowing": true }
                },
                "owner-b": {}
            }
        });

        let report = migrate(DocumentKind::Players, &mut doc).unwrap();

        assert_eq!(report, MigrationReport { from: 1, to: 3 });
        assert_eq!(doc["config-version"], 3);
        assert!(doc.get("signs").is_none());
        let shop = &doc["players"]["owner-a"]["shop"];
        assert_eq!(shop["front"], json!(["Shop"]));
        assert_eq!(shop["frontColor"], "RED");
        assert_eq!(shop["frontGlowing"], true);
        assert_eq!(shop["backGlowing"], false);
        assert_eq!(shop["backColor"], "BLACK");
        assert_eq!(shop["signType"], "REGULAR");
        assert!(shop.get("lines").is_none());
        assert!(doc["players"].get("owner-b").is_none());
    }

    #[test]
    fn current_document_is_untouched() {
        let mut doc = json!({ "config-version": 3, "templates": { "a": { "front": [] } } });
        let before = doc.clone();

        let report = migrate(DocumentKind::Templates, &mut doc).unwrap();

        assert!(!report.changed());
        assert_eq!(doc, before);
    }

    #[test]
    fn non_object_root_is_an_error() {
        let mut doc = json!([1, 2, 3]);
        assert!(migrate(DocumentKind::Players, &mut doc).is_err());
    }
}
