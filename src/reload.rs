//! Development-time reloading of templates backed by files.
//!
//! A [ReloadingTemplate] compiles its file once when opened. While watched,
//! a `notify` poll watcher checks the file every interval and a background
//! thread recompiles against the same schema on each change. A successful recompile replaces the
//! published [Template] in one swap; a failed one is logged and the last
//! good template stays in service.
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Mutex, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
    time::{Duration, SystemTime},
};
use notify::{PollWatcher, RecursiveMode, Watcher};
use crate::context::ContextRef;
use crate::error::{LoadError, RenderError};
use crate::schema::Schema;
use crate::template::Template;


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Unwatched,
    Watching,
    Recompiling,
    /// Last recompile failed; the previous template is still served.
    Failed(String),
}


/// Change events for one watched file.
pub type Modifications = mpsc::Receiver<notify::Result<notify::Event>>;

/// Polls `path` every `interval` and sends an event for each change.
///
/// The stream ends once the returned watcher is dropped.
pub fn watch(path: &Path, interval: Duration) -> notify::Result<(PollWatcher, Modifications)> {
    let (tx, rx) = mpsc::channel();
    let config = notify::Config::default().with_poll_interval(interval);
    let mut watcher = PollWatcher::new(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    }, config)?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok((watcher, rx))
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}


struct Shared {
    path: PathBuf,
    schema: Arc<Schema>,
    current: RwLock<Arc<Template>>,
    state: Mutex<WatchState>,
    last_modified: Mutex<Option<SystemTime>>,
    watched: AtomicBool,
}

impl Shared {
    fn set_state(&self, state: WatchState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn settled(&self) -> WatchState {
        if self.watched.load(Ordering::Acquire) {
            WatchState::Watching
        } else {
            WatchState::Unwatched
        }
    }

    /// Recompiles if the file changed since the last modification handled.
    fn refresh(&self) -> bool {
        match modified(&self.path) {
            Ok(time) => self.apply(time),
            Err(error) => {
                tracing::error!(path = %self.path.display(), error = %error, "cannot read template");
                false
            }
        }
    }

    fn apply(&self, time: SystemTime) -> bool {
        {
            let mut last = self.last_modified.lock().unwrap_or_else(PoisonError::into_inner);
            if *last == Some(time) {
                return false;
            }
            *last = Some(time);
        }
        self.recompile()
    }

    fn recompile(&self) -> bool {
        self.set_state(WatchState::Recompiling);
        let path = self.path.display();
        match compile_file(&self.path, &self.schema) {
            Ok(template) => {
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(template);
                self.set_state(self.settled());
                tracing::info!(path = %path, "reloaded template");
                true
            },
            Err(error) => {
                tracing::warn!(path = %path, error = %error, "reload failed, keeping previous template");
                self.set_state(WatchState::Failed(error.to_string()));
                false
            }
        }
    }
}

fn compile_file(path: &Path, schema: &Arc<Schema>) -> Result<Template, LoadError> {
    let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Template::compile(&source, Arc::clone(schema)).map_err(|source| LoadError::Compile {
        name: path.display().to_string(),
        source,
    })
}


struct Worker {
    // dropping it ends the event stream and with it the thread
    watcher: PollWatcher,
    handle: JoinHandle<()>,
}


/// A file-backed template that can follow changes to its file.
pub struct ReloadingTemplate {
    shared: Arc<Shared>,
    worker: Option<Worker>,
}

impl ReloadingTemplate {
    /// Compiles the file at `path`. Fails if the first compile fails.
    pub fn open(path: impl Into<PathBuf>, schema: impl Into<Arc<Schema>>) -> Result<Self, LoadError> {
        let path = path.into();
        let schema = schema.into();
        let last_modified = modified(&path).ok();
        let template = compile_file(&path, &schema)?;
        Ok(ReloadingTemplate {
            shared: Arc::new(Shared {
                path,
                schema,
                current: RwLock::new(Arc::new(template)),
                state: Mutex::new(WatchState::Unwatched),
                last_modified: Mutex::new(last_modified),
                watched: AtomicBool::new(false),
            }),
            worker: None,
        })
    }

    /// The template currently published.
    pub fn current(&self) -> Arc<Template> {
        Arc::clone(&self.shared.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn render(&self, context: ContextRef) -> Result<String, RenderError> {
        self.current().render(context)
    }

    pub fn state(&self) -> WatchState {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Checks the file once and recompiles if it changed.
    ///
    /// Returns whether a new template was published.
    pub fn poll(&self) -> bool {
        self.shared.refresh()
    }

    /// Starts watching the file every `interval`. Does nothing if already watching.
    pub fn watch(&mut self, interval: Duration) -> Result<(), LoadError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let (watcher, events) = watch(&shared.path, interval).map_err(|source| LoadError::Watch {
            path: shared.path.display().to_string(),
            source,
        })?;
        let handle = thread::Builder::new()
            .name(format!("reload {}", shared.path.display()))
            .spawn(move || {
                for event in events {
                    match event {
                        Ok(event) if event.kind.is_remove() => {
                            tracing::error!(path = %shared.path.display(), "template removed, keeping previous template");
                        },
                        Ok(event) if event.kind.is_access() => {},
                        Ok(_) => {
                            shared.refresh();
                        },
                        Err(error) => {
                            tracing::error!(path = %shared.path.display(), error = %error, "watch failed");
                        }
                    }
                }
            })
            .map_err(|source| LoadError::Io {
                path: self.shared.path.display().to_string(),
                source,
            })?;
        self.shared.watched.store(true, Ordering::Release);
        if self.state() == WatchState::Unwatched {
            self.shared.set_state(WatchState::Watching);
        }
        self.worker = Some(Worker { watcher, handle });
        Ok(())
    }

    /// Stops watching, if watching.
    pub fn unwatch(&mut self) {
        if let Some(Worker { watcher, handle }) = self.worker.take() {
            drop(watcher);
            if handle.join().is_err() {
                tracing::error!(path = %self.shared.path.display(), "reload thread panicked");
            }
            self.shared.watched.store(false, Ordering::Release);
            self.shared.set_state(WatchState::Unwatched);
        }
    }
}

impl Drop for ReloadingTemplate {
    fn drop(&mut self) {
        self.unwatch();
    }
}
