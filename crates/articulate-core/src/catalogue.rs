//! Sidecar part catalogue (`data_infos_<build_id>.json`)
//!
//! The file is a JSON array of build cases. Each build appends one case and
//! grows its `part` list as parts are registered. The case is held in memory
//! and only reaches the file when the build is finalized.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One exported part file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CataloguePart {
    pub part_name: String,
    pub file_name: String,
    pub file_obj_path: String,
}

/// One build's entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCase {
    pub id: String,
    #[serde(default)]
    pub obj_name: String,
    /// Path of the whole-asset mesh
    pub file_obj_path: String,
    #[serde(default)]
    pub part: Vec<CataloguePart>,
}

/// Append-only catalogue bound to its file
#[derive(Debug, Clone)]
pub struct Catalogue {
    path: PathBuf,
    cases: Vec<CatalogueCase>,
    /// The last case was begun but has not been written yet
    unsaved_case: bool,
}

impl Catalogue {
    /// Catalogue file for a build below `output_root`
    pub fn file_path(output_root: &Path, build_id: &str) -> PathBuf {
        output_root.join(format!("data_infos_{}.json", build_id))
    }

    /// Open an existing catalogue or start an empty one; nothing is written yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogueError> {
        let path = path.into();
        let cases = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| CatalogueError::Parse(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(CatalogueError::Io(e.to_string())),
        };
        Ok(Self {
            path,
            cases,
            unsaved_case: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cases(&self) -> &[CatalogueCase] {
        &self.cases
    }

    /// Start a new case for a build, replacing a case that was never written
    pub fn begin_case(&mut self, id: &str, obj_name: &str, whole_path: &Path) {
        if self.unsaved_case {
            self.cases.pop();
        }
        self.unsaved_case = true;
        self.cases.push(CatalogueCase {
            id: id.to_string(),
            obj_name: obj_name.to_string(),
            file_obj_path: whole_path.to_string_lossy().to_string(),
            part: Vec::new(),
        });
    }

    /// Rename the asset in the current case
    pub fn set_object_name(&mut self, obj_name: &str) -> Result<(), CatalogueError> {
        let case = self.cases.last_mut().ok_or(CatalogueError::NoOpenCase)?;
        case.obj_name = obj_name.to_string();
        Ok(())
    }

    /// Append parts to the current case; nothing is written until [`save`](Self::save)
    pub fn append_parts(&mut self, parts: Vec<CataloguePart>) -> Result<(), CatalogueError> {
        let case = self.cases.last_mut().ok_or(CatalogueError::NoOpenCase)?;
        case.part.extend(parts);
        Ok(())
    }

    /// Number of parts in the current case
    pub fn current_part_count(&self) -> usize {
        self.cases.last().map_or(0, |case| case.part.len())
    }

    /// Write the whole catalogue back to its file
    pub fn save(&mut self) -> Result<(), CatalogueError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CatalogueError::Io(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&self.cases)
            .map_err(|e| CatalogueError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| CatalogueError::Io(e.to_string()))?;
        self.unsaved_case = false;
        Ok(())
    }
}

/// Catalogue errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogueError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Failed to parse catalogue {0}")]
    Parse(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Catalogue has no open build case")]
    NoOpenCase,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: u64) -> CataloguePart {
        CataloguePart {
            part_name: "door_part".to_string(),
            file_name: format!("{}.obj", id),
            file_obj_path: format!("/out/7/objs/{}.obj", id),
        }
    }

    #[test]
    fn test_save_persists_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = Catalogue::file_path(dir.path(), "7");
        assert!(path.ends_with("data_infos_7.json"));

        let mut catalogue = Catalogue::open(&path).unwrap();
        catalogue.begin_case("7", "Dishwasher", Path::new("/out/7/objs/whole.obj"));
        catalogue.append_parts(vec![part(0), part(1)]).unwrap();
        assert_eq!(catalogue.current_part_count(), 2);
        assert!(!path.exists());
        catalogue.save().unwrap();

        let reopened = Catalogue::open(&path).unwrap();
        assert_eq!(reopened.cases().len(), 1);
        assert_eq!(reopened.cases()[0].part[1].file_name, "1.obj");
        assert_eq!(reopened.cases()[0].obj_name, "Dishwasher");
    }

    #[test]
    fn test_new_build_appends_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = Catalogue::file_path(dir.path(), "0");

        let mut first = Catalogue::open(&path).unwrap();
        first.begin_case("0", "Lamp", Path::new("whole.obj"));
        first.append_parts(vec![part(0)]).unwrap();
        first.save().unwrap();

        let mut second = Catalogue::open(&path).unwrap();
        second.begin_case("0", "Lamp", Path::new("whole.obj"));
        assert_eq!(second.current_part_count(), 0);
        second.append_parts(vec![part(0)]).unwrap();
        second.save().unwrap();
        assert_eq!(Catalogue::open(&path).unwrap().cases().len(), 2);
    }

    #[test]
    fn test_unsaved_case_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = Catalogue::file_path(dir.path(), "3");

        let mut catalogue = Catalogue::open(&path).unwrap();
        catalogue.begin_case("3", "unknown", Path::new("whole.obj"));
        catalogue.begin_case("3", "Oven", Path::new("whole.obj"));
        assert_eq!(catalogue.cases().len(), 1);
        assert!(!path.exists());

        catalogue.save().unwrap();
        catalogue.begin_case("3", "Oven", Path::new("whole.obj"));
        assert_eq!(catalogue.cases().len(), 2);
    }

    #[test]
    fn test_append_without_case_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalogue = Catalogue::open(dir.path().join("c.json")).unwrap();
        assert!(matches!(
            catalogue.append_parts(vec![part(0)]),
            Err(CatalogueError::NoOpenCase)
        ));
    }
}
