//! Re-import of files that change on disk.
//!
//! Each imported file is watched through its parent directory, since many
//! backends report saves (write-to-temp then rename) as directory events.
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

struct Target {
    path: PathBuf,
    root: PathBuf,
    name: Option<OsString>,
    pending_since: Option<Instant>,
}

impl Target {
    fn matches(&self, event: &Event) -> bool {
        event.paths.iter().any(|path| {
            path == &self.root
                || path == &self.path
                || (path.parent() == Some(self.root.as_path())
                    && self
                        .name
                        .as_ref()
                        .is_some_and(|name| path.file_name().is_some_and(|f| f == name)))
        })
    }
}

/// Watches a set of files and reports each one once its changes settle.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    roots: HashSet<PathBuf>,
    targets: Vec<Target>,
    debounce: Duration,
}

impl FileWatcher {
    /// Create a watcher with nothing registered yet.
    ///
    /// # Errors
    /// Returns an error if the platform watcher cannot be created.
    pub fn new(debounce: Duration) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        Ok(Self {
            watcher,
            rx,
            roots: HashSet::new(),
            targets: Vec::new(),
            debounce,
        })
    }

    /// Start watching `path`. Watching the same file twice is a no-op.
    ///
    /// # Errors
    /// Returns an error if the file's directory cannot be watched.
    pub fn watch(&mut self, path: impl AsRef<Path>) -> notify::Result<()> {
        // OS event paths are canonical; store ours the same way.
        let path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        if self.targets.iter().any(|t| t.path == path) {
            return Ok(());
        }
        let root = watch_root_for(&path);
        if !self.roots.contains(&root) {
            self.watcher.watch(&root, RecursiveMode::NonRecursive)?;
            self.roots.insert(root.clone());
        }
        crate::perf::log_event("watcher.watch", format!("path={}", path.display()));
        self.targets.push(Target {
            name: path.file_name().map(std::ffi::OsStr::to_os_string),
            path,
            root,
            pending_since: None,
        });
        Ok(())
    }

    /// Canonical paths currently watched, in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(|t| t.path.as_path())
    }

    /// Drain pending events and return the files whose changes have settled.
    pub fn take_changed(&mut self) -> Vec<PathBuf> {
        let now = Instant::now();
        let mut total = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            total += 1;
            match event {
                Ok(ev) => {
                    let mut relevant = false;
                    for target in self.targets.iter_mut().filter(|t| t.matches(&ev)) {
                        target.pending_since = Some(now);
                        relevant = true;
                    }
                    if !relevant {
                        crate::perf::log_event(
                            "watcher.irrelevant",
                            format!("kind={:?} paths={:?}", ev.kind, ev.paths),
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!("file watcher error: {err}");
                    crate::perf::log_event("watcher.error", format!("{err}"));
                }
            }
        }
        if total > 0 {
            crate::perf::log_event("watcher.poll", format!("events={total}"));
        }

        let debounce = self.debounce;
        self.targets
            .iter_mut()
            .filter_map(|target| {
                let since = target.pending_since?;
                if since.elapsed() < debounce {
                    return None;
                }
                target.pending_since = None;
                Some(target.path.clone())
            })
            .collect()
    }

    /// Time until the earliest pending change settles, if any is pending.
    pub fn time_until_ready(&self) -> Option<Duration> {
        self.targets
            .iter()
            .filter_map(|t| t.pending_since)
            .map(|since| self.debounce.saturating_sub(since.elapsed()))
            .min()
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_directory_event_marks_every_file_in_it() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("CMakeLists.txt"), "project(a)").unwrap();
        std::fs::write(root.join(".cmake_format"), "IndentWidth: 2").unwrap();

        let mut watcher = FileWatcher::new(Duration::from_millis(10)).unwrap();
        watcher.watch(root.join("CMakeLists.txt")).unwrap();
        watcher.watch(root.join(".cmake_format")).unwrap();

        let ev = event(vec![root]);
        assert!(watcher.targets.iter().all(|t| t.matches(&ev)));
    }

    #[test]
    fn test_sibling_file_event_is_not_relevant() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("CMakeLists.txt"), "").unwrap();

        let mut watcher = FileWatcher::new(Duration::from_millis(10)).unwrap();
        watcher.watch(root.join("CMakeLists.txt")).unwrap();

        let ev = event(vec![root.join("notes.txt")]);
        assert!(!watcher.targets[0].matches(&ev));
    }

    #[test]
    fn test_watching_twice_registers_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.cmake");
        std::fs::write(&path, "").unwrap();

        let mut watcher = FileWatcher::new(Duration::from_millis(10)).unwrap();
        watcher.watch(&path).unwrap();
        watcher.watch(&path).unwrap();
        assert_eq!(watcher.targets().count(), 1);
        assert_eq!(watcher.time_until_ready(), None);
    }

    #[test]
    fn test_watch_root_for_relative_file_is_dot() {
        assert_eq!(
            watch_root_for(Path::new("CMakeLists.txt")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().canonicalize().unwrap().join("CMakeLists.txt");
        std::fs::write(&path, "project(a)").unwrap();

        let mut watcher = FileWatcher::new(Duration::from_millis(200)).unwrap();
        watcher.watch(&path).unwrap();

        // Let the backend register the watch.
        std::thread::sleep(Duration::from_millis(500));
        std::fs::write(&path, "project(b)").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut changed = Vec::new();
        while Instant::now() < deadline && changed.is_empty() {
            changed = watcher.take_changed();
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(changed, vec![path]);
    }
}
