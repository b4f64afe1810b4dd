//! Structural diff between configuration snapshots.
//!
//! Used by the reload path to log a field-level changelog before the new
//! snapshot is published. The comparison walks the serialized value trees so
//! the changelog survives schema growth without per-field bookkeeping.

use serde_json::Value;

use crate::config::schema::ConfigSnapshot;

/// A single leaf-level configuration change.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Dotted field path, e.g. `routes.api.upstream`.
    pub path: String,
    pub old: Value,
    pub new: Value,
}

/// Compute the leaf-level changes between two snapshots.
pub fn diff_snapshots(old: &ConfigSnapshot, new: &ConfigSnapshot) -> Vec<Change> {
    // Both sides come from our own Serialize impls; failure here would be a
    // schema bug, surfaced as an empty changelog rather than a crash.
    let (Ok(old), Ok(new)) = (serde_json::to_value(old), serde_json::to_value(new)) else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    walk(String::new(), &old, &new, &mut changes);
    changes
}

fn walk(path: String, old: &Value, new: &Value, changes: &mut Vec<Change>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for (key, old_value) in old_map {
                let child = join(&path, key);
                match new_map.get(key) {
                    Some(new_value) => walk(child, old_value, new_value, changes),
                    None => changes.push(Change {
                        path: child,
                        old: old_value.clone(),
                        new: Value::Null,
                    }),
                }
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    changes.push(Change {
                        path: join(&path, key),
                        old: Value::Null,
                        new: new_value.clone(),
                    });
                }
            }
        }
        _ if old != new => changes.push(Change {
            path,
            old: old.clone(),
            new: new.clone(),
        }),
        _ => {}
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
