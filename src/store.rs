// 💾 Session Store - saved calculations on disk
// One pretty-printed JSON file per calculation: <folder>/<name>.json
//
// Save overwrites without warning, load replaces the whole session.
// No locking, no versioning.

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{CalcError, Result};
use crate::session::Session;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct SessionStore {
    folder: PathBuf,
}

impl SessionStore {
    /// Open the store, creating the folder if needed.
    pub fn open(folder: impl Into<PathBuf>) -> Result<Self> {
        let folder = folder.into();
        fs::create_dir_all(&folder)?;
        Ok(SessionStore { folder })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File backing the calculation called `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_key(name)?;
        Ok(self.folder.join(format!("{}.{}", name, EXTENSION)))
    }

    /// Write the session under its own name, replacing any earlier file.
    ///
    /// JSON has no NaN or infinity, so a line holding one is refused rather
    /// than written as `null`.
    pub fn save(&self, session: &Session) -> Result<PathBuf> {
        let path = self.path_for(&session.name)?;
        check_finite(session)?;

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        session
            .serialize(&mut ser)
            .map_err(std::io::Error::from)?;

        fs::write(&path, buf)?;

        tracing::info!(
            name = %session.name,
            path = %path.display(),
            adds = session.adds.len(),
            omits = session.omits.len(),
            "calculation saved"
        );
        Ok(path)
    }

    /// Names of all saved calculations, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if validate_key(stem).is_ok() => names.push(stem.to_string()),
                _ => tracing::debug!(path = %path.display(), "skipping file with unusable name"),
            }
        }

        names.sort();
        Ok(names)
    }

    /// Read the calculation saved under `key`.
    ///
    /// Missing `adds`/`omits` load as empty lists. A missing name falls back
    /// to the key.
    pub fn load(&self, key: &str) -> Result<Session> {
        let path = self.path_for(key)?;

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CalcError::SessionNotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let mut session: Session =
            serde_json::from_str(&text).map_err(|source| CalcError::CorruptSessionData {
                key: key.to_string(),
                source,
            })?;

        if session.name.is_empty() {
            session.name = key.to_string();
        }

        tracing::info!(
            name = %session.name,
            path = %path.display(),
            adds = session.adds.len(),
            omits = session.omits.len(),
            "calculation loaded"
        );
        Ok(session)
    }
}

/// A key must be non-blank and usable as a single file name.
fn validate_key(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CalcError::EmptyName);
    }
    if name.contains(|c: char| matches!(c, '/' | '\\' | '\0')) || name == "." || name == ".." {
        return Err(CalcError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn check_finite(session: &Session) -> Result<()> {
    let bad = session.adds.iter().chain(&session.omits).find(|item| {
        !(item.quantity.is_finite()
            && item.carbon_per_unit.is_finite()
            && item.total_carbon.is_finite())
    });
    match bad {
        Some(item) => Err(CalcError::NonFiniteValue {
            reference_name: item.reference_name.clone(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LineItem;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SessionStore) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("saved_calculations")).unwrap();
        (dir, store)
    }

    fn demo_session() -> Session {
        let mut session = Session::new("demo", "ground floor slab");
        session.adds.push(LineItem::new("Concrete C30", 100.0, 0.12));
        session.adds.push(LineItem::new("Rebar UK", 0.1 + 0.2, 1.99));
        session.omits.push(LineItem::new("Sawn timber", 1.0 / 3.0, 0.263));
        session
    }

    #[test]
    fn test_open_creates_folder() {
        let (dir, store) = test_store();
        assert!(dir.path().join("saved_calculations").is_dir());
        assert_eq!(store.list().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_dir, store) = test_store();
        let session = demo_session();

        let path = store.save(&session).unwrap();
        assert_eq!(path.file_name().unwrap(), "demo.json");

        let loaded = store.load("demo").unwrap();
        assert_eq!(loaded, session, "loaded session should equal saved one");
    }

    #[test]
    fn test_round_trip_empty_session() {
        let (_dir, store) = test_store();
        let session = Session::new("empty", "");

        store.save(&session).unwrap();
        let loaded = store.load("empty").unwrap();

        assert_eq!(loaded, session);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_saved_file_shape() {
        let (_dir, store) = test_store();
        let path = store.save(&demo_session()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"name\": \"demo\""), "4-space indent: {}", text);

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(json["adds"][0]["ICE DB Name"], "Concrete C30");
        assert_eq!(json["adds"][0]["Qty"], 100.0);
        assert_eq!(json["omits"][0]["EC_per_unit"], 0.263);
        assert!(json["omits"][0]["Total_EC"].is_f64());
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, store) = test_store();
        store.save(&demo_session()).unwrap();

        let replacement = Session::new("demo", "second version");
        store.save(&replacement).unwrap();

        let loaded = store.load("demo").unwrap();
        assert_eq!(loaded.description, "second version");
        assert!(loaded.is_empty());
        assert_eq!(store.list().unwrap(), vec!["demo"]);
    }

    #[test]
    fn test_list_sorted_json_only() {
        let (_dir, store) = test_store();
        for name in ["zeta", "alpha", "mid"] {
            store.save(&Session::new(name, "")).unwrap();
        }
        fs::write(store.folder().join("notes.txt"), "not a calculation").unwrap();
        fs::write(store.folder().join("carbon-calc.log"), "log").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_list_skips_unloadable_names() {
        let (_dir, store) = test_store();
        store.save(&Session::new("kept", "")).unwrap();
        fs::write(store.folder().join(" .json"), "{}").unwrap();

        let names = store.list().unwrap();
        assert_eq!(names, vec!["kept"]);
        for name in names {
            store.load(&name).unwrap();
        }
    }

    #[test]
    fn test_save_refuses_non_finite_values() {
        let (_dir, store) = test_store();
        let mut session = Session::new("odd", "");
        session.adds.push(LineItem::new("Concrete C30", 2.0, 0.12));
        session.omits.push(LineItem::new("Rebar UK", f64::INFINITY, 1.99));

        match store.save(&session) {
            Err(CalcError::NonFiniteValue { reference_name }) => {
                assert_eq!(reference_name, "Rebar UK")
            }
            other => panic!("expected NonFiniteValue, got {:?}", other),
        }
        assert!(!store.folder().join("odd.json").exists());

        session.omits.clear();
        session.adds.push(LineItem::new("Odd", 2.0, f64::NAN));
        assert!(matches!(
            store.save(&session),
            Err(CalcError::NonFiniteValue { .. })
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_blank_name() {
        let (_dir, store) = test_store();
        let session = Session::new("   ", "");
        assert!(matches!(store.save(&session), Err(CalcError::EmptyName)));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_name_with_separator() {
        let (_dir, store) = test_store();
        for name in ["../escape", "a/b", "..", "c\\d"] {
            let session = Session::new(name, "");
            assert!(
                matches!(store.save(&session), Err(CalcError::InvalidName { .. })),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_load_unknown_key() {
        let (_dir, store) = test_store();
        match store.load("nope") {
            Err(CalcError::SessionNotFound { key }) => assert_eq!(key, "nope"),
            other => panic!("expected SessionNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_corrupt_file() {
        let (_dir, store) = test_store();
        fs::write(store.folder().join("broken.json"), "{ not json").unwrap();
        fs::write(
            store.folder().join("wrong.json"),
            r#"{"name": "wrong", "adds": [{"Qty": "many"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load("broken"),
            Err(CalcError::CorruptSessionData { .. })
        ));
        assert!(matches!(
            store.load("wrong"),
            Err(CalcError::CorruptSessionData { .. })
        ));
    }

    #[test]
    fn test_load_lenient_missing_fields() {
        let (_dir, store) = test_store();
        fs::write(
            store.folder().join("legacy.json"),
            r#"{"description": "adds only", "adds": [
                {"ICE DB Name": "Concrete C30", "Qty": 100, "EC_per_unit": 0.12, "Total_EC": 12.0}
            ]}"#,
        )
        .unwrap();

        let session = store.load("legacy").unwrap();
        assert_eq!(session.name, "legacy");
        assert_eq!(session.description, "adds only");
        assert_eq!(session.adds.len(), 1);
        assert_eq!(session.adds[0].quantity, 100.0);
        assert!(session.omits.is_empty());
    }
}
