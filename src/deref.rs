//! `$ref` dereferencing with sibling-property merging.
//!
//! Every reference is resolved and inlined. Supported forms:
//!
//! - `#/json/pointer` against the document the reference appears in
//! - `relative/file.json` and `relative/file.json#/pointer`, resolved against
//!   the directory (or URL) of the document the reference appears in
//! - `file:///absolute/file.json`
//! - `https://host/file.json` (requires the `remote` feature)
//!
//! When an object carries `$ref` next to other keys and the target is an
//! object, the result holds the target's keys followed by the siblings, and
//! siblings win on conflict. Without siblings the object is replaced by the
//! target.
//!
//! An object with a string `$id` (or draft-4 `id`) moves the base for
//! relative file references below it, as JSON Schema requires. Embedded
//! `$id` values are not registered as lookup targets, so a reference must
//! name a real file or URL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::RefError;
use crate::fetch::{is_url, load_json};

const REF: &str = "$ref";

/// Dereference a schema file, resolving relative references against its directory.
///
/// # Errors
///
/// `RefError::Load` if the file or a referenced file cannot be loaded,
/// `RefError::Unresolvable` for a dangling pointer, and `RefError::Circular`
/// for a reference cycle.
pub fn dereference_file(path: &Path) -> Result<Value, RefError> {
    let root = load_json(path)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let key = document_key_for_path(path);

    let mut resolver = Resolver::default();
    let scope = Scope {
        key,
        base: Base::Dir(base.to_path_buf()),
        root: Rc::new(root),
    };
    resolver.documents.insert(scope.key.clone(), scope.root.clone());
    let root = scope.root.clone();
    resolver.resolve_value(&root, &scope)
}

/// Dereference an in-memory schema, resolving relative references against `base_dir`.
pub fn dereference(schema: &Value, base_dir: &Path) -> Result<Value, RefError> {
    let scope = Scope {
        key: "<root>".to_string(),
        base: Base::Dir(base_dir.to_path_buf()),
        root: Rc::new(schema.clone()),
    };
    Resolver::default().resolve_value(schema, &scope)
}

/// Navigate a JSON Pointer fragment (e.g., "#/definitions/foo" or "#/oneOf/0").
///
/// The fragment is percent-decoded before it is split, so
/// `#/definitions/My%20Type` finds the `My Type` entry.
/// Returns `None` when any segment is missing.
pub fn navigate_fragment<'a>(document: &'a Value, fragment: &str) -> Option<&'a Value> {
    let decoded = percent_decode_str(fragment).decode_utf8_lossy();
    // Remove leading # and split by /
    let path = decoded.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Some(document);
    }

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Where relative references of a document are resolved from.
#[derive(Debug, Clone)]
enum Base {
    Dir(PathBuf),
    Url(Url),
}

/// A loaded document that references are currently being resolved in.
#[derive(Debug, Clone)]
struct Scope {
    key: String,
    base: Base,
    root: Rc<Value>,
}

#[derive(Default)]
struct Resolver {
    /// Loaded documents by canonical key, so each file is read once.
    documents: HashMap<String, Rc<Value>>,
    /// References being expanded, innermost last.
    active: Vec<String>,
}

impl Resolver {
    fn resolve_value(&mut self, value: &Value, scope: &Scope) -> Result<Value, RefError> {
        match value {
            Value::Object(map) => {
                let rebased = rebase(scope, map);
                let scope = rebased.as_ref().unwrap_or(scope);
                match map.get(REF) {
                    Some(Value::String(reference)) => self.resolve_ref(reference, map, scope),
                    _ => {
                        let mut resolved = Map::new();
                        for (key, child) in map {
                            resolved.insert(key.clone(), self.resolve_value(child, scope)?);
                        }
                        Ok(Value::Object(resolved))
                    }
                }
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_ref(
        &mut self,
        reference: &str,
        map: &Map<String, Value>,
        scope: &Scope,
    ) -> Result<Value, RefError> {
        let (location, fragment) = match reference.find('#') {
            Some(idx) => (&reference[..idx], &reference[idx..]),
            None => (reference, ""),
        };

        let target_scope = if location.is_empty() {
            scope.clone()
        } else {
            self.open(reference, location, &scope.base)?
        };

        let active_key = format!("{}{}", target_scope.key, fragment);
        if self.active.contains(&active_key) {
            return Err(RefError::Circular {
                reference: reference.to_string(),
            });
        }

        let root = target_scope.root.clone();
        let target =
            navigate_fragment(&root, fragment).ok_or_else(|| RefError::Unresolvable {
                reference: reference.to_string(),
                message: format!("fragment not found in {}", target_scope.key),
            })?;

        self.active.push(active_key);
        let resolved = self.resolve_value(target, &target_scope);
        self.active.pop();
        let resolved = resolved?;

        let siblings: Vec<(&String, &Value)> =
            map.iter().filter(|(key, _)| key.as_str() != REF).collect();
        match resolved {
            Value::Object(mut merged) if !siblings.is_empty() => {
                for (key, value) in siblings {
                    merged.insert(key.clone(), self.resolve_value(value, scope)?);
                }
                Ok(Value::Object(merged))
            }
            other => Ok(other),
        }
    }

    /// Load the document a reference points into, relative to `base`.
    fn open(&mut self, reference: &str, location: &str, base: &Base) -> Result<Scope, RefError> {
        if is_url(location) {
            let url = parse_url(reference, location)?;
            return self.open_url(reference, url);
        }
        if let Some(path) = location.strip_prefix("file://") {
            return self.open_path(Path::new(path));
        }

        match base {
            Base::Dir(dir) => self.open_path(&dir.join(location)),
            Base::Url(base_url) => {
                let url = base_url
                    .join(location)
                    .map_err(|e| RefError::Unresolvable {
                        reference: reference.to_string(),
                        message: e.to_string(),
                    })?;
                self.open_url(reference, url)
            }
        }
    }

    fn open_path(&mut self, path: &Path) -> Result<Scope, RefError> {
        let key = document_key_for_path(path);
        let root = match self.documents.get(&key) {
            Some(root) => root.clone(),
            None => {
                let loaded = Rc::new(load_json(path)?);
                debug!(path = %path.display(), "loaded reference target");
                self.documents.insert(key.clone(), loaded.clone());
                loaded
            }
        };
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Scope {
            key,
            base: Base::Dir(dir),
            root,
        })
    }

    #[cfg(feature = "remote")]
    fn open_url(&mut self, _reference: &str, url: Url) -> Result<Scope, RefError> {
        let key = url.to_string();
        let root = match self.documents.get(&key) {
            Some(root) => root.clone(),
            None => {
                let loaded = Rc::new(crate::fetch::load_json_url(url.as_str())?);
                debug!(%url, "fetched reference target");
                self.documents.insert(key.clone(), loaded.clone());
                loaded
            }
        };
        Ok(Scope {
            key,
            base: Base::Url(url),
            root,
        })
    }

    #[cfg(not(feature = "remote"))]
    fn open_url(&mut self, reference: &str, _url: Url) -> Result<Scope, RefError> {
        Err(RefError::UnsupportedRemote {
            reference: reference.to_string(),
        })
    }
}

/// Scope for the members of an object carrying `$id` (or draft-4 `id`).
///
/// Only the base for relative file references moves. Fragment-only
/// references keep resolving against the enclosing document.
fn rebase(scope: &Scope, map: &Map<String, Value>) -> Option<Scope> {
    let id = match (map.get("$id"), map.get("id")) {
        (Some(Value::String(id)), _) => id,
        (None, Some(Value::String(id))) => id,
        _ => return None,
    };
    let location = id.split('#').next().unwrap_or("");
    if location.is_empty() {
        return None;
    }

    let base = if is_url(location) {
        Base::Url(Url::parse(location).ok()?)
    } else if let Some(path) = location.strip_prefix("file://") {
        Base::Dir(base_dir_of(Path::new(path), path.ends_with('/')))
    } else {
        match &scope.base {
            Base::Dir(dir) => Base::Dir(base_dir_of(&dir.join(location), location.ends_with('/'))),
            Base::Url(url) => Base::Url(url.join(location).ok()?),
        }
    };
    Some(Scope {
        key: scope.key.clone(),
        base,
        root: scope.root.clone(),
    })
}

fn base_dir_of(path: &Path, is_dir: bool) -> PathBuf {
    if is_dir {
        path.to_path_buf()
    } else {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    }
}

fn parse_url(reference: &str, location: &str) -> Result<Url, RefError> {
    Url::parse(location).map_err(|e| RefError::Unresolvable {
        reference: reference.to_string(),
        message: e.to_string(),
    })
}

fn document_key_for_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    canonical.display().to_string()
}
