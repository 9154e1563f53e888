/*!
Write messages to size-rotated log files.

All messages are written to a single active file in a log directory. When writing the next message would push the active file over its size limit, a new file is created and becomes the active one. When there are more files than the configured limit, the oldest are archived and deleted.

# Getting started

```
# fn main() -> Result<(), quill_file::Error> {
# let dir = tempfile::tempdir()?;
let files = quill_file::set(dir.path())
    .max_files(10)
    .max_file_size_bytes(10 * 1024 * 1024)
    .open()?;
# Ok(())
# }
```

To log to files through `quill`, pass the [`FileSetBuilder`] itself to `quill::Setup::to_file` instead; the set is opened when the logger is spawned. All writes happen on the logger's background thread.

# File naming

Log files are named `{millis}_{date}.log`, like `1716778800123_2024-05-27-03-00-00.log`. See the [`name`] module for details. Only files that match this scheme are considered part of the set; anything else in the directory is left alone.

# When files roll

Messages are only ever written to a single file at a time. That file changes when:

1. There's no active file yet.
2. The size of the active file plus the size of the next message exceeds [`FileSetBuilder::max_file_size_bytes`]. A message that's larger than the limit on its own is still written, to a fresh file.

When the set is opened, the directory is scanned and the newest existing file is reused. If the directory has no log files then a new one is created.

# Retention

Whenever there are more than [`FileSetBuilder::max_files`] log files in the set, the oldest are evicted. An evicted file is passed to the configured [`archive::Archive`] (by default [`archive::TarGz`]) along with a label covering the time range from its creation up to the creation of the next file, then deleted. Archival is best-effort: if it fails, the file is deleted anyway. The oldest file in a set has no archive label if it's the only one left, so it's deleted without being archived.

# Handling IO failures

If the active file disappears from disk (for example, it's deleted by another process), the directory is re-scanned and the newest file in it becomes active, creating one if necessary. This is retried for up to [`FileSetBuilder::missing_file_timeout`]. If there's still no file to write to by then, the message is dropped. This is the only way a message accepted by the logger can be lost.

If writing to the active file fails, the file is closed and the message is dropped. The next message will re-open the newest file in the set.
*/

#![deny(missing_docs)]

mod internal_metrics;

pub mod archive;
pub mod index;
pub mod name;

use std::{
    fmt,
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use quill_core::{internal_debug, internal_warn, metric::Metric, Message, Sink};
use time::UtcOffset;

use archive::{Archive, TarGz};
use index::{Evicted, FileIndex};
use internal_metrics::InternalMetrics;

/**
An error attempting to open or write to a [`FileSet`].
*/
pub struct Error(Box<dyn std::error::Error + Send + Sync>);

impl Error {
    /**
    Create an error from some other error.
    */
    pub fn new(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error(e.into())
    }

    /**
    Create an error from a message.
    */
    pub fn msg(msg: impl fmt::Display) -> Self {
        Error(msg.to_string().into())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::new(err)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/**
Create a builder for a [`FileSet`] in the directory `dir`.

It will use the following defaults:

- 10 max files.
- 10MiB max file size.
- Evicted files are archived as `.tar.gz`.
- A missing active file is retried every 100ms for up to 3s.
*/
pub fn set(dir: impl AsRef<Path>) -> FileSetBuilder {
    FileSetBuilder::new(dir.as_ref())
}

/**
A builder for a [`FileSet`].

Use [`set`] to begin a [`FileSetBuilder`], then call [`FileSetBuilder::open`] to complete it.
*/
pub struct FileSetBuilder {
    dir: PathBuf,
    max_files: usize,
    max_file_size_bytes: u64,
    archive: Option<Box<dyn Archive + Send + Sync>>,
    missing_file_timeout: Duration,
    missing_file_retry: Duration,
    utc_offset: Option<UtcOffset>,
}

/**
The default maximum number of log files to keep.
*/
pub const DEFAULT_MAX_FILES: usize = 10;

/**
The default maximum size of a log file.
*/
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024; // 10MiB

const DEFAULT_MISSING_FILE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_MISSING_FILE_RETRY: Duration = Duration::from_millis(100);

impl FileSetBuilder {
    /**
    Create a builder for a [`FileSet`] in the directory `dir`.
    */
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSetBuilder {
            dir: dir.into(),
            max_files: DEFAULT_MAX_FILES,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            archive: Some(Box::new(TarGz::new())),
            missing_file_timeout: DEFAULT_MISSING_FILE_TIMEOUT,
            missing_file_retry: DEFAULT_MISSING_FILE_RETRY,
            utc_offset: None,
        }
    }

    /**
    The maximum number of log files to keep.

    Files are evicted oldest first whenever there are more than this many. The active file is never evicted, so values below `1` are treated as `1`.
    */
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /**
    The maximum size of a file before new writes will roll over to a new one.
    */
    pub fn max_file_size_bytes(mut self, max_file_size_bytes: u64) -> Self {
        self.max_file_size_bytes = max_file_size_bytes;
        self
    }

    /**
    Archive evicted files using `archive`.
    */
    pub fn archive_with(mut self, archive: impl Archive + Send + Sync + 'static) -> Self {
        self.archive = Some(Box::new(archive));
        self
    }

    /**
    Delete evicted files without archiving them.
    */
    pub fn no_archive(mut self) -> Self {
        self.archive = None;
        self
    }

    /**
    How long to keep trying to find a file to write to when the active file goes missing.
    */
    pub fn missing_file_timeout(mut self, timeout: Duration) -> Self {
        self.missing_file_timeout = timeout;
        self
    }

    /**
    How long to wait between attempts to find a file to write to when the active file goes missing.
    */
    pub fn missing_file_retry(mut self, retry: Duration) -> Self {
        self.missing_file_retry = retry;
        self
    }

    /**
    The offset to render dates in file names with.

    By default, the local offset is used if it can be determined, and UTC otherwise.
    */
    pub fn utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = Some(offset);
        self
    }

    /**
    Complete the builder, scanning the log directory and opening the active file.

    The directory is created if it doesn't exist. Existing log files are indexed, the oldest are evicted if there are too many, and the newest becomes the active file. If there are no log files then a new one is created.
    */
    pub fn open(self) -> Result<FileSet, Error> {
        let file_set = FileSet {
            dir: self.dir,
            max_files: self.max_files.max(1),
            max_file_size_bytes: self.max_file_size_bytes,
            archive: self.archive,
            missing_file_timeout: self.missing_file_timeout,
            missing_file_retry: self.missing_file_retry,
            utc_offset: self
                .utc_offset
                .unwrap_or_else(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)),
            metrics: InternalMetrics::default(),
            state: Mutex::new(State {
                index: FileIndex::new(),
                current: None,
            }),
            active: Mutex::new(None),
        };

        {
            let mut active = file_set.lock_active();
            file_set.reconcile(&mut active)?;
        }

        Ok(file_set)
    }
}

/**
A set of rolling log files.

Create a file set through the [`set`] function, calling [`FileSetBuilder::open`] to complete configuration.
*/
pub struct FileSet {
    dir: PathBuf,
    max_files: usize,
    max_file_size_bytes: u64,
    archive: Option<Box<dyn Archive + Send + Sync>>,
    missing_file_timeout: Duration,
    missing_file_retry: Duration,
    utc_offset: UtcOffset,
    metrics: InternalMetrics,
    // The index and the path and size of the active file
    // This lock is never held across disk IO
    state: Mutex<State>,
    // The open handle to the active file
    // This lock is only contended by the writer
    active: Mutex<Option<ActiveFile>>,
}

struct State {
    index: FileIndex,
    current: Option<Current>,
}

struct Current {
    path: PathBuf,
    size_bytes: u64,
}

impl Sink for FileSet {
    fn emit(&self, msg: &Message) {
        // Failures are already reported by `write`
        let _ = self.write(msg.as_bytes());
    }

    fn blocking_flush(&self, _: Duration) -> bool {
        self.sync().is_ok()
    }
}

impl FileSet {
    /**
    The directory log files are written to.
    */
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /**
    Get a snapshot of the log files in the set, oldest first.
    */
    pub fn files(&self) -> Vec<(u64, PathBuf)> {
        self.lock_state()
            .index
            .iter()
            .map(|(key, path)| (key, path.to_owned()))
            .collect()
    }

    /**
    The path of the active file.
    */
    pub fn current_path(&self) -> Option<PathBuf> {
        self.lock_state()
            .current
            .as_ref()
            .map(|current| current.path.clone())
    }

    /**
    The number of bytes written to the active file, including any that were there when it was opened.
    */
    pub fn current_size_bytes(&self) -> Option<u64> {
        self.lock_state()
            .current
            .as_ref()
            .map(|current| current.size_bytes)
    }

    /**
    Sync the active file to disk.
    */
    pub fn sync(&self) -> Result<(), Error> {
        if let Some(active) = &*self.lock_active() {
            active.file.sync_all()?;
        }

        Ok(())
    }

    /**
    Sync and close the active file.

    The next write will re-open the newest file in the set.
    */
    pub fn close(&self) -> Result<(), Error> {
        let mut active = self.lock_active();

        if let Some(active) = active.take() {
            active.file.sync_all()?;

            internal_debug!("closed {}", active.path.display());
        }

        Ok(())
    }

    /**
    Get an iterator of metrics produced by the file set.

    These metrics can be used to monitor the running health of your logging pipeline.
    */
    pub fn sample_metrics(&self) -> impl Iterator<Item = Metric> + 'static {
        self.metrics.sample()
    }

    /**
    Write a message to the active file, rolling or recovering it as needed.
    */
    pub fn write(&self, buf: &[u8]) -> Result<(), Error> {
        let mut active = self.lock_active();

        // The size check must see the file that will actually be written to
        if !self.ensure_active(&mut active) {
            return Err(self.drop_message(buf));
        }

        let needs_roll = {
            let state = self.lock_state();

            match &state.current {
                Some(current) => {
                    current.size_bytes + buf.len() as u64 > self.max_file_size_bytes
                }
                None => true,
            }
        };

        if needs_roll {
            if let Err(err) = self.roll(&mut active) {
                // There may still be a file to write to
                internal_warn!("failed to roll to a new file: {}", err);
            }

            if !self.ensure_active(&mut active) {
                return Err(self.drop_message(buf));
            }
        }

        let Some(file) = active.as_mut() else {
            return Err(Error::msg("no log file available; the message was dropped"));
        };

        match file.write_message(buf) {
            Ok(written_bytes) => {
                if let Some(current) = &mut self.lock_state().current {
                    current.size_bytes += written_bytes;
                }

                Ok(())
            }
            Err(err) => {
                self.metrics.file_write_failed.increment();
                self.metrics.file_msg_dropped.increment();

                internal_warn!(
                    "failed to write message to {}: {}",
                    file.path.display(),
                    err
                );

                // Consider the file poisoned; the next write will re-open it
                *active = None;

                Err(err.into())
            }
        }
    }

    fn drop_message(&self, buf: &[u8]) -> Error {
        self.metrics.file_msg_dropped.increment();

        internal_warn!(
            "no log file available in {} after {:?}; dropping {} byte message",
            self.dir.display(),
            self.missing_file_timeout,
            buf.len(),
        );

        Error::msg("no log file available; the message was dropped")
    }

    fn ensure_active(&self, active: &mut Option<ActiveFile>) -> bool {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            if let Some(file) = active {
                if file.path.exists() {
                    if attempts > 0 {
                        self.metrics.file_missing_recovered.increment();
                    }

                    return true;
                }
            }

            if attempts > 0 && start.elapsed() >= self.missing_file_timeout {
                return false;
            }

            attempts += 1;

            if let Err(err) = self.reconcile(active) {
                internal_warn!(
                    "failed to recover a log file in {}: {}",
                    self.dir.display(),
                    err
                );
            }

            if active.as_ref().map(|file| file.path.exists()).unwrap_or(false) {
                continue;
            }

            thread::sleep(self.missing_file_retry);
        }
    }

    /**
    Rebuild the index from the log directory and reattach to its newest file.
    */
    fn reconcile(&self, active: &mut Option<ActiveFile>) -> Result<(), Error> {
        *active = None;

        fs::create_dir_all(&self.dir).map_err(|err| {
            internal_warn!(
                "failed to create log directory {}: {}",
                self.dir.display(),
                err
            );

            err
        })?;

        let mut index = FileIndex::scan(&self.dir).map_err(|err| {
            self.metrics.file_set_read_failed.increment();

            internal_warn!("failed to read files in {}: {}", self.dir.display(), err);

            err
        })?;

        let evicted = index.evict_over(self.max_files);
        let newest = index.newest().map(|(_, path)| path.to_owned());

        {
            let mut state = self.lock_state();

            state.index = index;
            state.current = None;
        }

        self.evict(evicted);

        let Some(path) = newest else {
            return self.roll(active);
        };

        match ActiveFile::try_open_reuse(&path) {
            Ok((file, size_bytes)) => {
                internal_debug!("reusing {}", path.display());

                self.lock_state().current = Some(Current { path, size_bytes });
                *active = Some(file);

                Ok(())
            }
            Err(err) => {
                self.metrics.file_open_failed.increment();

                internal_warn!("failed to open {}: {}", path.display(), err);

                Err(err.into())
            }
        }
    }

    /**
    Create a new file and make it the active one.
    */
    fn roll(&self, active: &mut Option<ActiveFile>) -> Result<(), Error> {
        *active = None;

        let (key, path) = {
            let state = self.lock_state();

            let key = state.index.next_key(now_millis());

            (key, self.dir.join(name::file_name(key, self.utc_offset)))
        };

        let file = fs::create_dir_all(&self.dir)
            .and_then(|_| ActiveFile::try_open_create(&path))
            .map_err(|err| {
                self.metrics.file_create_failed.increment();

                internal_warn!("failed to create {}: {}", path.display(), err);

                err
            })?;

        self.metrics.file_create.increment();

        internal_debug!("created {}", path.display());

        let evicted = {
            let mut state = self.lock_state();

            state.index.insert(key, path.clone());
            state.current = Some(Current {
                path,
                size_bytes: 0,
            });

            state.index.evict_over(self.max_files)
        };

        *active = Some(file);

        self.evict(evicted);

        Ok(())
    }

    /**
    Archive and delete files that have been removed from the index.
    */
    fn evict(&self, evicted: Vec<Evicted>) {
        for file in evicted {
            if !file.path.exists() {
                continue;
            }

            if let (Some(archive), Some(label)) = (&self.archive, &file.archive_label) {
                match archive.archive(&file.path, label) {
                    Ok(archive_path) => {
                        self.metrics.file_archive.increment();

                        internal_debug!(
                            "archived {} to {}",
                            file.path.display(),
                            archive_path.display()
                        );
                    }
                    Err(err) => {
                        self.metrics.file_archive_failed.increment();

                        internal_warn!(
                            "failed to archive {} as {}: {}",
                            file.path.display(),
                            label,
                            err
                        );
                    }
                }
            }

            if let Err(err) = fs::remove_file(&file.path) {
                self.metrics.file_delete_failed.increment();

                internal_warn!("failed to delete {}: {}", file.path.display(), err);
            } else {
                self.metrics.file_delete.increment();

                internal_debug!("deleted {}", file.path.display());
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_active(&self) -> MutexGuard<Option<ActiveFile>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ActiveFile {
    file: File,
    path: PathBuf,
    needs_recovery: bool,
}

impl ActiveFile {
    fn try_open_reuse(path: &Path) -> Result<(ActiveFile, u64), io::Error> {
        let mut file = OpenOptions::new().read(true).append(true).open(path)?;

        let size_bytes = file.metadata()?.len();

        // If the last write to the file was incomplete then terminate it
        // before writing anything new
        let needs_recovery = if size_bytes > 0 {
            let mut last = [0; 1];

            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;

            last[0] != b'\n'
        } else {
            false
        };

        Ok((
            ActiveFile {
                file,
                path: path.into(),
                needs_recovery,
            },
            size_bytes,
        ))
    }

    fn try_open_create(path: &Path) -> Result<ActiveFile, io::Error> {
        let file = OpenOptions::new()
            .create_new(true)
            .read(false)
            .append(true)
            .open(path)?;

        Ok(ActiveFile {
            file,
            path: path.into(),
            needs_recovery: false,
        })
    }

    fn write_message(&mut self, buf: &[u8]) -> Result<u64, io::Error> {
        let mut written_bytes = 0;

        // If the file may be corrupted then terminate any previously
        // written content. This ensures the message that's about to be
        // written isn't mangled together with an incomplete one
        if self.needs_recovery {
            self.file.write_all(b"\n")?;
            written_bytes += 1;
        }

        self.needs_recovery = true;

        self.file.write_all(buf)?;
        self.file.flush()?;
        written_bytes += buf.len() as u64;

        self.needs_recovery = false;

        Ok(written_bytes)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|now| now.as_millis() as u64)
        .unwrap_or_default()
}
