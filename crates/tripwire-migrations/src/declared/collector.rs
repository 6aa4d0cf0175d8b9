//! Discovery of model declaration files

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use convert_case::{Case, Casing};
use regex::Regex;
use tripwire_core::Dialect;
use tripwire_triggers::{TemplateVars, Trigger};

use super::{CollectError, CollectResult};
use crate::DeclarationExtractor;

static MODEL_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(create_trigger|drop_trigger|trigger)[.(]").expect("valid regex")
});

/// Returns true if a model source declares triggers
pub fn declares_triggers(text: &str) -> bool {
    MODEL_MARKER_RE.is_match(text)
}

/// The triggers one model declares
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredModel {
    /// PascalCase model name
    pub name: String,
    /// Table declarations default to
    pub table: String,
    pub path: PathBuf,
    pub triggers: Vec<Trigger>,
}

/// Registry of models and their declared triggers
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    models: Vec<DeclaredModel>,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: DeclaredModel) {
        self.models.push(model);
    }

    pub fn models(&self) -> &[DeclaredModel] {
        &self.models
    }

    pub fn is_empty(&self) -> bool {
        self.models.iter().all(|m| m.triggers.is_empty())
    }

    /// Every declared trigger, prepared with `vars`
    pub fn prepared_triggers(&self, vars: &TemplateVars) -> CollectResult<Vec<Trigger>> {
        let mut triggers = Vec::new();
        for model in &self.models {
            for trigger in &model.triggers {
                let mut trigger = trigger.clone();
                trigger.prepare(vars)?;
                triggers.push(trigger);
            }
        }
        Ok(triggers)
    }
}

/// Collects the declared trigger set from a model directory
///
/// Only files with the extension that contain a `trigger` declaration are
/// parsed. A file that declares triggers but does not parse is an error: its
/// triggers must not silently drop out of the declared set.
#[derive(Debug, Clone)]
pub struct DeclarationCollector {
    dir: PathBuf,
    extension: String,
    dialect: Dialect,
    vars: TemplateVars,
}

impl DeclarationCollector {
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        dialect: Dialect,
        vars: TemplateVars,
    ) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            dialect,
            vars,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Scans the model directory and registers every model declaring triggers
    pub fn index(&self) -> CollectResult<DeclarationIndex> {
        let mut index = DeclarationIndex::new();
        if !self.dir.is_dir() {
            tracing::debug!(dir = %self.dir.display(), "Model directory does not exist");
            return Ok(index);
        }

        let read_dir_err = |source| CollectError::ReadDir {
            path: self.dir.clone(),
            source,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(read_dir_err)? {
            let path = entry.map_err(read_dir_err)?.path();
            let matches_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == self.extension);
            if path.is_file() && matches_extension {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            if let Some(model) = self.load(&path)? {
                index.register(model);
            }
        }
        Ok(index)
    }

    /// The declared trigger set, prepared
    pub fn collect(&self) -> CollectResult<Vec<Trigger>> {
        let triggers = self.index()?.prepared_triggers(&self.vars)?;
        tracing::debug!(count = triggers.len(), "Collected declared triggers");
        Ok(triggers)
    }

    fn load(&self, path: &Path) -> CollectResult<Option<DeclaredModel>> {
        let text = std::fs::read_to_string(path).map_err(|source| CollectError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        if !declares_triggers(&text) {
            tracing::debug!(path = %path.display(), "No trigger declarations");
            return Ok(None);
        }

        let table = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let name = table.to_case(Case::Pascal);

        let triggers = DeclarationExtractor::new(self.dialect)
            .with_default_table(table.clone())
            .with_creates_only(true)
            .extract(&text)
            .map_err(|source| CollectError::DeclarationLoad {
                model: name.clone(),
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(model = %name, count = triggers.len(), "Loaded model declarations");

        Ok(Some(DeclaredModel {
            name,
            table,
            path: path.to_path_buf(),
            triggers,
        }))
    }
}
