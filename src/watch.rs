//! Watching the script folder for changes.
use crate::error::EngineResult;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, warn};

/// What happened to a file in the script folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsChange {
    Created(PathBuf),
    Removed(PathBuf),
    Modified(PathBuf),
}

/// Non recursive watch on one folder. The watcher's own thread only forwards raw events into
/// the channel, everything else happens on the caller's thread.
pub struct FolderWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
}

impl FolderWatcher {
    pub fn new(folder: &Path) -> EngineResult<Self> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(folder, RecursiveMode::NonRecursive)?;
        debug!("watch: {}", folder.display());
        Ok(Self { _watcher: watcher, rx })
    }

    /// Wait up to `timeout` for changes and return them along with everything else already
    /// queued. An empty result means nothing happened.
    pub fn wait(&self, timeout: Duration) -> Vec<FsChange> {
        let mut changes = vec![];
        match self.rx.recv_timeout(timeout) {
            Ok(event) => self.collect(event, &mut changes),
            Err(RecvTimeoutError::Timeout) => return changes,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("watch: channel disconnected");
                return changes;
            },
        }
        while let Ok(event) = self.rx.try_recv() {
            self.collect(event, &mut changes);
        }
        changes
    }

    fn collect(&self, event: notify::Result<Event>, changes: &mut Vec<FsChange>) {
        match event {
            Ok(event) => changes.extend(classify_event(&event)),
            Err(e) => warn!("watch: {}", e),
        }
    }
}

/// Reduce a raw notification to the changes the dispatcher cares about. Renames count as a
/// removal of the old name and a creation of the new one.
pub fn classify_event(event: &Event) -> Vec<FsChange> {
    let paths = event.paths.iter().cloned();
    match event.kind {
        EventKind::Create(_) => paths.map(FsChange::Created).collect(),
        EventKind::Remove(_) => paths.map(FsChange::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.map(FsChange::Removed).collect(),
            RenameMode::To => paths.map(FsChange::Created).collect(),
            RenameMode::Both if event.paths.len() == 2 => {
                vec![FsChange::Removed(event.paths[0].clone()), FsChange::Created(event.paths[1].clone())]
            },

            // The backend couldn't tell which side of the rename this is
            _ => paths.map(|path| if path.exists() { FsChange::Created(path) } else { FsChange::Removed(path) }).collect(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => vec![],
        EventKind::Modify(_) => paths.map(FsChange::Modified).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths.iter().fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_classify_event() {
        let created = event(EventKind::Create(CreateKind::File), &["/s/a.lua"]);
        assert_eq!(classify_event(&created), vec![FsChange::Created(PathBuf::from("/s/a.lua"))]);

        let removed = event(EventKind::Remove(RemoveKind::Any), &["/s/a.lua"]);
        assert_eq!(classify_event(&removed), vec![FsChange::Removed(PathBuf::from("/s/a.lua"))]);

        let written = event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/s/a.lua"]);
        assert_eq!(classify_event(&written), vec![FsChange::Modified(PathBuf::from("/s/a.lua"))]);

        let renamed = event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["/s/a.lua~", "/s/a.lua"]);
        assert_eq!(
            classify_event(&renamed),
            vec![FsChange::Removed(PathBuf::from("/s/a.lua~")), FsChange::Created(PathBuf::from("/s/a.lua"))]
        );

        let touched = event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)), &["/s/a.lua"]);
        assert!(classify_event(&touched).is_empty());
        let opened = event(EventKind::Access(AccessKind::Any), &["/s/a.lua"]);
        assert!(classify_event(&opened).is_empty());
    }

    #[test]
    fn test_ambiguous_rename_checks_the_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let here = tmp.path().join("here.lua");
        fs::write(&here, "").unwrap();
        let gone = tmp.path().join("gone.lua");

        let mut renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Any)));
        renamed = renamed.add_path(here.clone()).add_path(gone.clone());
        assert_eq!(classify_event(&renamed), vec![FsChange::Created(here), FsChange::Removed(gone)]);
    }
}
