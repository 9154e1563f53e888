/*!
The index of log files in a directory.

The index is a cache of the filesystem: it's rebuilt by scanning the log directory and then kept up-to-date as files are created and evicted. It's never persisted itself.
*/

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::name;

/**
Log files ordered by their creation timestamp, oldest first.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    files: BTreeMap<u64, PathBuf>,
}

/**
A log file that's been removed from the index and needs to be archived and deleted.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evicted {
    /**
    The key the file was indexed by.
    */
    pub key: u64,
    /**
    The path to the file.
    */
    pub path: PathBuf,
    /**
    The label to archive the file under.

    This is only present when there was a newer file in the index to bound the time range the evicted file covers.
    */
    pub archive_label: Option<String>,
}

impl FileIndex {
    /**
    Create an empty index.
    */
    pub fn new() -> Self {
        FileIndex {
            files: BTreeMap::new(),
        }
    }

    /**
    Build an index from the log files in `dir`.

    Only regular files whose names match the log file naming scheme are included. Anything else in the directory, including archives, is ignored.
    */
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self, io::Error> {
        let dir = dir.as_ref();

        let mut index = FileIndex::new();

        for entry in fs::read_dir(dir)? {
            let Ok(entry) = entry else {
                continue;
            };

            if let Ok(file_type) = entry.file_type() {
                if !file_type.is_file() {
                    continue;
                }
            }

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            if let Some(key) = name::parse_file_name(file_name) {
                index.insert(key, entry.path());
            }
        }

        Ok(index)
    }

    /**
    The number of files in the index.
    */
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /**
    Whether the index is empty.
    */
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /**
    Add a file to the index.

    If there's already a file with the same key then it's replaced and returned. The replaced file is left on disk.
    */
    pub fn insert(&mut self, key: u64, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.files.insert(key, path.into())
    }

    /**
    Get the path of the file with the given key.
    */
    pub fn get(&self, key: u64) -> Option<&Path> {
        self.files.get(&key).map(|path| &**path)
    }

    /**
    Get the oldest file in the index.
    */
    pub fn oldest(&self) -> Option<(u64, &Path)> {
        self.files
            .first_key_value()
            .map(|(key, path)| (*key, &**path))
    }

    /**
    Get the newest file in the index.
    */
    pub fn newest(&self) -> Option<(u64, &Path)> {
        self.files
            .last_key_value()
            .map(|(key, path)| (*key, &**path))
    }

    /**
    Iterate over the files in the index, oldest first.
    */
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Path)> {
        self.files.iter().map(|(key, path)| (*key, &**path))
    }

    /**
    Get a key for a new file created at `now`.

    Keys always increase. If the clock hasn't moved past the newest file in the index, or has gone backwards, then the key is the next one after the newest.
    */
    pub fn next_key(&self, now: u64) -> u64 {
        match self.newest() {
            Some((newest, _)) if newest >= now => newest + 1,
            _ => now,
        }
    }

    /**
    Remove the oldest file from the index.

    The archive label is derived from the names of the oldest file and the one after it.
    */
    pub fn pop_oldest(&mut self) -> Option<Evicted> {
        let (key, path) = self.files.pop_first()?;

        let archive_label = self.oldest().and_then(|(_, next)| {
            name::archive_label(file_name_str(&path)?, file_name_str(next)?)
        });

        Some(Evicted {
            key,
            path,
            archive_label,
        })
    }

    /**
    Remove the oldest files from the index until there are at most `max_files` left.
    */
    pub fn evict_over(&mut self, max_files: usize) -> Vec<Evicted> {
        let mut evicted = Vec::new();

        while self.files.len() > max_files {
            match self.pop_oldest() {
                Some(file) => evicted.push(file),
                None => break,
            }
        }

        evicted
    }
}

fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();

        path
    }

    #[test]
    fn scan_includes_only_log_files() {
        let dir = tempfile::tempdir().unwrap();

        let a = touch(dir.path(), "1716778800123_2024-05-27-03-00-00.log");
        let b = touch(dir.path(), "1716783312000_2024-05-27-04-15-12.log");
        touch(dir.path(), "20240527030000-20240527041512.tar.gz");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "1716778800123_2024-05-27-03-00-00.log.bak");
        fs::create_dir(dir.path().join("1716790000000_2024-05-27-06-06-40.log")).unwrap();

        let index = FileIndex::scan(dir.path()).unwrap();

        assert_eq!(
            vec![(1716778800123, &*a), (1716783312000, &*b)],
            index.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn scan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();

        touch(dir.path(), "1716778800123_2024-05-27-03-00-00.log");
        touch(dir.path(), "1716783312000_2024-05-27-04-15-12.log");
        touch(dir.path(), "1716790000000_2024-05-27-06-06-40.log");

        let first = FileIndex::scan(dir.path()).unwrap();
        let second = FileIndex::scan(dir.path()).unwrap();

        assert_eq!(3, first.len());
        assert_eq!(first, second);
    }

    #[test]
    fn scan_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();

        assert!(FileIndex::scan(dir.path().join("missing")).is_err());
    }

    #[test]
    fn insert_is_last_write_wins() {
        let mut index = FileIndex::new();

        assert_eq!(None, index.insert(1, "a.log"));
        assert_eq!(Some(PathBuf::from("a.log")), index.insert(1, "b.log"));

        assert_eq!(1, index.len());
        assert_eq!(Some(Path::new("b.log")), index.get(1));
    }

    #[test]
    fn next_key_always_increases() {
        let mut index = FileIndex::new();

        assert_eq!(100, index.next_key(100));

        index.insert(100, "a.log");

        assert_eq!(101, index.next_key(100));
        assert_eq!(101, index.next_key(50));
        assert_eq!(200, index.next_key(200));
    }

    #[test]
    fn pop_oldest_labels_by_time_range() {
        let mut index = FileIndex::new();

        index.insert(
            1716783312000,
            "log/1716783312000_2024-05-27-04-15-12.log",
        );
        index.insert(
            1716778800123,
            "log/1716778800123_2024-05-27-03-00-00.log",
        );

        let evicted = index.pop_oldest().unwrap();

        assert_eq!(1716778800123, evicted.key);
        assert_eq!(
            PathBuf::from("log/1716778800123_2024-05-27-03-00-00.log"),
            evicted.path
        );
        assert_eq!(
            Some("20240527030000-20240527041512"),
            evicted.archive_label.as_deref()
        );

        // The last file has nothing to bound it
        let evicted = index.pop_oldest().unwrap();

        assert_eq!(1716783312000, evicted.key);
        assert_eq!(None, evicted.archive_label);

        assert_eq!(None, index.pop_oldest());
    }

    #[test]
    fn evict_over_keeps_the_newest() {
        let mut index = FileIndex::new();

        for key in 1..=5 {
            index.insert(key, format!("{}.log", key));
        }

        let evicted = index.evict_over(2);

        assert_eq!(
            vec![1, 2, 3],
            evicted.iter().map(|file| file.key).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![4, 5],
            index.iter().map(|(key, _)| key).collect::<Vec<_>>()
        );

        assert!(index.evict_over(2).is_empty());
    }
}
