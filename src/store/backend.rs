use crate::error::GameError;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Durable string key-value storage. Every mutation is persisted before it returns.
pub trait KeyValueStore
{
    fn get(&self, key: &str) -> Result<Option<String>, GameError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError>;
    fn remove(&mut self, key: &str) -> Result<(), GameError>;
}

/// One file per key inside a data directory.
pub struct FileStore
{
    dir: PathBuf,
}

impl FileStore
{
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GameError>
    {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| GameError::Store {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path
    {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf
    {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore
{
    fn get(&self, key: &str) -> Result<Option<String>, GameError>
    {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(GameError::Store { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError>
    {
        let path = self.path_for(key);
        let temp_path = self.dir.join(format!(".{key}.tmp"));
        write_synced(&temp_path, value).map_err(|source| GameError::Store {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| GameError::Store { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), GameError>
    {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(GameError::Store { path, source }),
        }
    }
}

fn write_synced(path: &Path, value: &str) -> io::Result<()>
{
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

/// Volatile storage, used by tests and when no data directory is wanted.
#[derive(Default)]
pub struct MemoryStore
{
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore
{
    fn get(&self, key: &str) -> Result<Option<String>, GameError>
    {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError>
    {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), GameError>
    {
        self.values.remove(key);
        Ok(())
    }
}
