/*!
Archival of evicted log files.

When a log file is evicted it's first handed to an [`Archive`], then deleted. Archival is best-effort: if it fails the failure is reported on the internal channel and the file is deleted anyway.

The default archiver is [`TarGz`], which bundles the evicted file into a gzipped tarball next to it.
*/

use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use flate2::{write::GzEncoder, Compression};

use quill_core::internal_debug;

use crate::{name, Error};

/**
A strategy for archiving an evicted log file before it's deleted.
*/
pub trait Archive {
    /**
    Archive the file at `path` under `label`.

    The label identifies the time range covered by the file. On success, the path of the created archive is returned.
    */
    fn archive(&self, path: &Path, label: &str) -> Result<PathBuf, Error>;
}

impl<'a, T: Archive + ?Sized> Archive for &'a T {
    fn archive(&self, path: &Path, label: &str) -> Result<PathBuf, Error> {
        (**self).archive(path, label)
    }
}

impl<'a, T: Archive + ?Sized + 'a> Archive for Box<T> {
    fn archive(&self, path: &Path, label: &str) -> Result<PathBuf, Error> {
        (**self).archive(path, label)
    }
}

impl<'a, T: Archive + ?Sized + 'a> Archive for Arc<T> {
    fn archive(&self, path: &Path, label: &str) -> Result<PathBuf, Error> {
        (**self).archive(path, label)
    }
}

/**
Archive files into a gzipped tarball.

The archive is written to the same directory as the file, named `{label}.tar.gz`, and contains the file under its own name. Existing archives are never replaced: if the name is taken, the next free `{label}.{n}.tar.gz` is used instead.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGz {
    level: Option<u32>,
}

impl TarGz {
    /**
    Create an archiver using the default compression level.
    */
    pub fn new() -> Self {
        TarGz { level: None }
    }

    /**
    Use a specific compression level, from `0` (none) to `9` (best).
    */
    pub fn compression_level(mut self, level: u32) -> Self {
        self.level = Some(level.min(9));
        self
    }

    fn compression(&self) -> Compression {
        self.level.map(Compression::new).unwrap_or_default()
    }
}

const MAX_ARCHIVE_NAME_ATTEMPTS: usize = 1000;

/**
Create a new archive file in `dir` without clobbering any existing one.
*/
fn create_archive_file(dir: &Path, label: &str) -> Result<(File, PathBuf), Error> {
    for n in 0..MAX_ARCHIVE_NAME_ATTEMPTS {
        let archive_path = dir.join(name::nth_archive_name(label, n));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&archive_path)
        {
            Ok(file) => return Ok((file, archive_path)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                internal_debug!("{} already exists", archive_path.display());
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::msg(format!(
        "no free archive name for {} in {}",
        label,
        dir.display()
    )))
}

impl Archive for TarGz {
    fn archive(&self, path: &Path, label: &str) -> Result<PathBuf, Error> {
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::msg("unable to determine filename"))?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let (out, archive_path) = create_archive_file(dir, label)?;

        let write = || -> Result<(), Error> {
            let mut tar = tar::Builder::new(GzEncoder::new(out, self.compression()));
            tar.append_path_with_name(path, file_name)?;

            let out = tar.into_inner()?.finish()?;
            out.sync_all()?;

            Ok(())
        };

        match write() {
            Ok(()) => Ok(archive_path),
            Err(err) => {
                // Only the archive created here is removed
                let _ = fs::remove_file(&archive_path);

                Err(err)
            }
        }
    }
}

/**
An [`Archive`] from a function.

Use [`from_fn`] to create one.
*/
pub struct FromFn<F>(F);

impl<F: Fn(&Path, &str) -> Result<PathBuf, Error>> Archive for FromFn<F> {
    fn archive(&self, path: &Path, label: &str) -> Result<PathBuf, Error> {
        (self.0)(path, label)
    }
}

/**
Create an [`Archive`] that calls `f` for each evicted file.
*/
pub fn from_fn<F: Fn(&Path, &str) -> Result<PathBuf, Error>>(f: F) -> FromFn<F> {
    FromFn(f)
}
