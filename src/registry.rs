//! Sorting the script folder into per-event buckets.
use crate::config::RULES_SCRIPT;
use crate::error::{EngineError, EngineResult};
use mlua::{Table, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Script file extension
pub const SCRIPT_EXTENSION: &str = "lua";

/// Global table in the rules script listing helper modules that belong to no bucket
pub const MODULES_TABLE: &str = "scripts_modules";

/// Window lifecycle events scripts can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Open,
    Close,
    Focus,
    Blur,
    NameChange,
}

impl EventKind {
    /// Lookup order of the assignment tables, the first table naming a file wins
    pub const ALL: [EventKind; 5] =
        [EventKind::Open, EventKind::Close, EventKind::Focus, EventKind::Blur, EventKind::NameChange];

    /// Global table in the rules script assigning files to this event
    pub fn table_name(&self) -> &'static str {
        match self {
            EventKind::Open => "scripts_window_open",
            EventKind::Close => "scripts_window_close",
            EventKind::Focus => "scripts_window_focus",
            EventKind::Blur => "scripts_window_blur",
            EventKind::NameChange => "scripts_window_name_change",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            EventKind::Open => "window open",
            EventKind::Close => "window close",
            EventKind::Focus => "window focus",
            EventKind::Blur => "window blur",
            EventKind::NameChange => "window name change",
        };
        write!(f, "{}", label)
    }
}

/// Where the rules script put a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Bucket(EventKind),
    Module,
}

/// File names the rules script assigned, by table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    lists: HashMap<EventKind, Vec<String>>,
    modules: Vec<String>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, kind: EventKind, file: &str) {
        self.lists.entry(kind).or_default().push(file.to_owned());
    }

    pub fn module(&mut self, file: &str) {
        self.modules.push(file.to_owned());
    }

    /// Read the assignment tables out of the rules script's globals. Missing tables are fine,
    /// malformed ones are reported and skipped.
    pub fn from_globals(globals: &Table) -> Self {
        let mut assignments = Assignments::new();
        for kind in EventKind::ALL {
            for file in read_list(globals, kind.table_name()) {
                assignments.assign(kind, &file);
            }
        }
        for file in read_list(globals, MODULES_TABLE) {
            assignments.module(&file);
        }
        assignments
    }

    /// Look the file name up, `None` means the rules script didn't mention it
    pub fn lookup(&self, file: &str) -> Option<Assignment> {
        EventKind::ALL
            .iter()
            .find(|kind| self.lists.get(kind).map_or(false, |list| list.iter().any(|x| x == file)))
            .map(|kind| Assignment::Bucket(*kind))
            .or_else(|| self.modules.iter().any(|x| x == file).then_some(Assignment::Module))
    }
}

fn read_list(globals: &Table, name: &str) -> Vec<String> {
    let table = match globals.get(name) {
        Ok(Value::Nil) => return vec![],
        Ok(Value::Table(table)) => table,
        Ok(other) => {
            warn!("{} should be a table of file names, found {}", name, other.type_name());
            return vec![];
        },
        Err(e) => {
            warn!("{} could not be read: {}", name, e);
            return vec![];
        },
    };

    let mut files = vec![];
    for value in table.sequence_values::<Value>() {
        match value {
            Ok(Value::String(s)) => files.push(s.to_string_lossy().to_string()),
            Ok(other) => warn!("{}: ignoring {} entry, file names must be strings", name, other.type_name()),
            Err(e) => warn!("{}: {}", name, e),
        }
    }
    files
}

/// Script files of the folder sorted into one ordered bucket per event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRegistry {
    buckets: BTreeMap<EventKind, Vec<PathBuf>>,
}

impl ScriptRegistry {
    /// Scan the folder, non recursively, and bucket every script according to the assignments.
    /// Scripts the rules script doesn't mention run when a window opens; the rules script itself
    /// and the listed modules don't go anywhere.
    pub fn classify(folder: &Path, assignments: &Assignments) -> EngineResult<Self> {
        let entries = fs::read_dir(folder).map_err(|_| EngineError::FolderUnreadable(folder.to_path_buf()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_script(path))
            .collect();
        files.sort();

        let mut registry = ScriptRegistry::default();
        for path in files {
            let file = match path.file_name().and_then(|x| x.to_str()) {
                Some(file) => file.to_owned(),
                None => continue,
            };
            if file == RULES_SCRIPT {
                continue;
            }
            match assignments.lookup(&file) {
                Some(Assignment::Bucket(kind)) => registry.push(kind, path),
                Some(Assignment::Module) => trace!("classify: module {}", file),
                None => registry.push(EventKind::Open, path),
            }
        }
        Ok(registry)
    }

    fn push(&mut self, kind: EventKind, path: PathBuf) {
        trace!("classify: {} => {}", path.display(), kind);
        self.buckets.entry(kind).or_default().push(path);
    }

    /// Scripts to run for the event in execution order
    pub fn bucket(&self, kind: EventKind) -> &[PathBuf] {
        self.buckets.get(&kind).map(|x| x.as_slice()).unwrap_or(&[])
    }

    /// True if the file sits in any bucket
    pub fn is_member(&self, path: &Path) -> bool {
        self.buckets.values().any(|bucket| bucket.iter().any(|x| x == path))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|bucket| bucket.is_empty())
    }

    /// Non empty buckets in event order
    pub fn iter(&self) -> impl Iterator<Item = (EventKind, &[PathBuf])> {
        self.buckets.iter().filter(|(_, v)| !v.is_empty()).map(|(k, v)| (*k, v.as_slice()))
    }
}

/// True for file names with the script extension
pub fn is_script(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == SCRIPT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn folder(files: &[&str]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for file in files {
            fs::write(tmp.path().join(file), "-- test\n").unwrap();
        }
        tmp
    }

    #[test]
    fn test_unassigned_scripts_run_on_open() {
        let tmp = folder(&["wmscript.lua", "b.lua", "a.lua", "notes.txt", "c.lua.bak"]);
        fs::create_dir(tmp.path().join("dir.lua")).unwrap();

        let registry = ScriptRegistry::classify(tmp.path(), &Assignments::new()).unwrap();
        assert_eq!(registry.bucket(EventKind::Open), &[tmp.path().join("a.lua"), tmp.path().join("b.lua")]);
        assert!(registry.bucket(EventKind::Close).is_empty());
        assert!(!registry.is_member(&tmp.path().join("wmscript.lua")));
    }

    #[test]
    fn test_assigned_scripts() {
        let tmp = folder(&["wmscript.lua", "open.lua", "close.lua", "focus.lua", "blur.lua", "name.lua", "lib.lua"]);
        let mut assignments = Assignments::new();
        assignments.assign(EventKind::Close, "close.lua");
        assignments.assign(EventKind::Focus, "focus.lua");
        assignments.assign(EventKind::Blur, "blur.lua");
        assignments.assign(EventKind::NameChange, "name.lua");
        assignments.assign(EventKind::Close, "missing.lua");
        assignments.module("lib.lua");

        let registry = ScriptRegistry::classify(tmp.path(), &assignments).unwrap();
        let p = |f: &str| tmp.path().join(f);
        assert_eq!(registry.bucket(EventKind::Open), &[p("open.lua")]);
        assert_eq!(registry.bucket(EventKind::Close), &[p("close.lua")]);
        assert_eq!(registry.bucket(EventKind::Focus), &[p("focus.lua")]);
        assert_eq!(registry.bucket(EventKind::Blur), &[p("blur.lua")]);
        assert_eq!(registry.bucket(EventKind::NameChange), &[p("name.lua")]);
        assert!(!registry.is_member(&p("lib.lua")));
        assert!(registry.is_member(&p("focus.lua")));
    }

    #[test]
    fn test_every_script_in_at_most_one_bucket() {
        let tmp = folder(&["wmscript.lua", "x.lua", "y.lua", "z.lua"]);
        let mut assignments = Assignments::new();
        assignments.assign(EventKind::Focus, "x.lua");
        assignments.assign(EventKind::Blur, "x.lua");
        assignments.assign(EventKind::Close, "y.lua");
        assignments.assign(EventKind::Open, "y.lua");

        let registry = ScriptRegistry::classify(tmp.path(), &assignments).unwrap();
        let all: Vec<&PathBuf> = registry.iter().flat_map(|(_, v)| v.iter()).collect();
        let unique: HashSet<&PathBuf> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
        assert_eq!(all.len(), 3);

        // Open is looked up first
        assert_eq!(registry.bucket(EventKind::Open), &[tmp.path().join("y.lua"), tmp.path().join("z.lua")]);
        assert_eq!(registry.bucket(EventKind::Focus), &[tmp.path().join("x.lua")]);
    }

    #[test]
    fn test_classify_is_repeatable() {
        let tmp = folder(&["wmscript.lua", "one.lua", "two.lua"]);
        let first = ScriptRegistry::classify(tmp.path(), &Assignments::new()).unwrap();
        let second = ScriptRegistry::classify(tmp.path(), &Assignments::new()).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());

        let empty = folder(&["wmscript.lua"]);
        assert!(ScriptRegistry::classify(empty.path(), &Assignments::new()).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let err = ScriptRegistry::classify(&missing, &Assignments::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<EngineError>(), Some(&EngineError::FolderUnreadable(missing)));
    }

    #[test]
    fn test_assignments_from_globals() {
        let lua = mlua::Lua::new();
        lua.load(
            r#"
            scripts_window_focus = { "f.lua", 42, "g.lua" }
            scripts_window_blur = "not a table"
            scripts_modules = { "util.lua" }
            "#,
        )
        .exec()
        .unwrap();

        let assignments = Assignments::from_globals(&lua.globals());
        assert_eq!(assignments.lookup("f.lua"), Some(Assignment::Bucket(EventKind::Focus)));
        assert_eq!(assignments.lookup("g.lua"), Some(Assignment::Bucket(EventKind::Focus)));
        assert_eq!(assignments.lookup("util.lua"), Some(Assignment::Module));
        assert_eq!(assignments.lookup("other.lua"), None);
    }
}
