//! Store management and object I/O.

use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hash};
use crate::object::{HEADER_SIZE, ObjectHeader, ObjectType};
use crate::refs::RefManager;
use crate::tree::{self, TreeEntry};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Config file format version.
const CONFIG_VERSION: &str = "1";

/// A content-addressed object store on disk.
///
/// Layout:
/// - `config` with `version` and `algo`
/// - `objects/<algo>/<prefix>/<suffix>` object files
/// - `refs/<name>` named references
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    algorithm: Algorithm,
}

impl Store {
    /// Initialize a new store at the given path.
    pub fn init<P: AsRef<Path>>(root: P, algorithm: Algorithm) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("objects").join(algorithm.as_str()))?;
        fs::create_dir_all(root.join("refs"))?;
        fs::write(
            root.join("config"),
            format!("version={}\nalgo={}\n", CONFIG_VERSION, algorithm.as_str()),
        )?;

        tracing::debug!(root = %root.display(), algo = algorithm.as_str(), "initialized store");
        Ok(Self { root, algorithm })
    }

    /// Open an existing store, validating its layout.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let algorithm = Self::parse_config(&root, &fs::read_to_string(&config_path)?)?;

        if !root.join("objects").join(algorithm.as_str()).exists() {
            return Err(Error::invalid_store(
                &root,
                "objects directory structure missing",
            ));
        }
        if !root.join("refs").exists() {
            return Err(Error::invalid_store(&root, "refs directory missing"));
        }

        Ok(Self { root, algorithm })
    }

    /// Parse `key=value` config lines; `#` starts a comment.
    fn parse_config(root: &Path, content: &str) -> Result<Algorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some(CONFIG_VERSION) {
            return Err(Error::invalid_store(
                root,
                format!("unsupported config version: {:?}", version),
            ));
        }

        let algo = algo.ok_or_else(|| Error::invalid_store(root, "missing algo in config"))?;
        Algorithm::parse(algo)
    }

    /// Path of the object file for `hash`: `objects/{algorithm}/{prefix}/{suffix}`.
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.root
            .join("objects")
            .join(self.algorithm.as_str())
            .join(hash.prefix())
            .join(hash.suffix())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Named references in this store.
    pub fn refs(&self) -> RefManager<'_> {
        RefManager::new(self)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.object_path(hash).exists()
    }

    /// Read just the header of an object.
    pub fn object_header(&self, hash: &Hash) -> Result<ObjectHeader> {
        let mut file = self.open_object(hash)?;
        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        ObjectHeader::decode(&buf)
    }

    fn open_object(&self, hash: &Hash) -> Result<fs::File> {
        match fs::File::open(self.object_path(hash)) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::object_not_found(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read an object of the expected type and verify its hash.
    fn read_verified(&self, hash: &Hash, expected: ObjectType) -> Result<Vec<u8>> {
        let mut file = self.open_object(hash)?;
        let obj_path = self.object_path(hash);

        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut buf)?;
        let header = ObjectHeader::decode(&buf)?;

        if header.object_type != expected {
            return Err(Error::invalid_object_type(
                expected.as_str(),
                header.object_type.as_str(),
            ));
        }

        let mut payload = Vec::new();
        file.read_to_end(&mut payload)?;

        if payload.len() as u64 != header.payload_len {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Payload length mismatch: expected {}, got {}",
                    header.payload_len,
                    payload.len()
                ),
            ));
        }

        let computed = Hash::hash_bytes(&payload);
        if computed != *hash {
            return Err(Error::corrupted_object(
                &obj_path,
                format!("Hash mismatch: expected {}, got {}", hash, computed),
            ));
        }

        Ok(payload)
    }

    /// Write an object atomically, skipping it if already present.
    fn write_object(&self, object_type: ObjectType, payload: &[u8]) -> Result<Hash> {
        let hash = Hash::hash_bytes(payload);
        let obj_path = self.object_path(&hash);
        if obj_path.exists() {
            return Ok(hash);
        }

        let shard = obj_path
            .parent()
            .ok_or_else(|| Error::invalid_store(&self.root, "object path has no parent"))?;
        fs::create_dir_all(shard)?;

        let header = ObjectHeader::new(object_type, self.algorithm, payload.len() as u64);
        let mut temp_file = tempfile::NamedTempFile::new_in(shard)?;
        temp_file.write_all(&header.encode())?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;
        temp_file.persist(&obj_path)?;

        tracing::trace!(%hash, kind = object_type.as_str(), "wrote object");
        Ok(hash)
    }

    /// Store a blob read from `reader`.
    pub fn put_blob<R: Read>(&self, mut reader: R) -> Result<Hash> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        self.write_object(ObjectType::Blob, &payload)
    }

    /// Retrieve a blob's bytes.
    pub fn get_blob(&self, hash: &Hash) -> Result<Vec<u8>> {
        self.read_verified(hash, ObjectType::Blob)
    }

    /// Store a tree. Entries are sorted into canonical order first.
    pub fn put_tree(&self, entries: Vec<TreeEntry>) -> Result<Hash> {
        let payload = tree::encode_tree(entries)?;
        self.write_object(ObjectType::Tree, &payload)
    }

    /// Retrieve a tree's entries in canonical order.
    pub fn get_tree(&self, hash: &Hash) -> Result<Vec<TreeEntry>> {
        let payload = self.read_verified(hash, ObjectType::Tree)?;
        tree::decode_tree(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::file_modes;
    use tempfile::TempDir;

    fn new_store() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let store = Store::init(temp_dir.path().join("store"), Algorithm::Blake3).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_init_layout_and_reopen() {
        let (_dir, store) = new_store();
        assert!(store.root().join("objects/blake3-256").is_dir());
        assert!(store.root().join("refs").is_dir());

        let config = fs::read_to_string(store.root().join("config")).unwrap();
        assert!(config.contains("version=1"));
        assert!(config.contains("algo=blake3-256"));

        let reopened = Store::open(store.root()).unwrap();
        assert_eq!(reopened.algorithm(), Algorithm::Blake3);
    }

    #[test]
    fn test_open_invalid() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Store::open(temp_dir.path().join("missing")).is_err());

        let bare = temp_dir.path().join("bare");
        fs::create_dir_all(&bare).unwrap();
        assert!(matches!(
            Store::open(&bare).unwrap_err(),
            Error::InvalidStore { .. }
        ));
    }

    #[test]
    fn test_parse_config() {
        let root = Path::new("/tmp/x");
        let algo = Store::parse_config(root, "# comment\nversion=1\n\nalgo = blake3-256\n").unwrap();
        assert_eq!(algo, Algorithm::Blake3);

        assert!(Store::parse_config(root, "version=2\nalgo=blake3-256\n").is_err());
        assert!(Store::parse_config(root, "version=1\n").is_err());
        assert!(Store::parse_config(root, "version=1\nalgo=md5\n").is_err());
    }

    #[test]
    fn test_blob_roundtrip_and_dedup() {
        let (_dir, store) = new_store();
        let hash = store.put_blob(&b"hello world"[..]).unwrap();
        assert_eq!(hash, Hash::hash_bytes(b"hello world"));
        assert!(store.contains(&hash));
        assert_eq!(store.get_blob(&hash).unwrap(), b"hello world");

        let again = store.put_blob(&b"hello world"[..]).unwrap();
        assert_eq!(again, hash);

        let header = store.object_header(&hash).unwrap();
        assert_eq!(header.object_type, ObjectType::Blob);
        assert_eq!(header.payload_len, 11);
    }

    #[test]
    fn test_missing_object() {
        let (_dir, store) = new_store();
        let hash = Hash::hash_bytes(b"nope");
        assert!(!store.contains(&hash));
        assert!(matches!(
            store.get_blob(&hash).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
        assert!(matches!(
            store.object_header(&hash).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
    }

    #[test]
    fn test_corruption_detected() {
        let (_dir, store) = new_store();
        let hash = store.put_blob(&b"original"[..]).unwrap();

        let path = store.object_path(&hash);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            store.get_blob(&hash).unwrap_err(),
            Error::CorruptedObject { .. }
        ));
    }

    #[test]
    fn test_tree_roundtrip_and_type_check() {
        let (_dir, store) = new_store();
        let blob = store.put_blob(&b"content"[..]).unwrap();
        let entries = vec![
            TreeEntry::new(ObjectType::Blob, file_modes::REGULAR, blob, "b.txt").unwrap(),
            TreeEntry::new(ObjectType::Blob, file_modes::REGULAR, blob, "a.txt").unwrap(),
        ];
        let tree = store.put_tree(entries).unwrap();

        let listed = store.get_tree(&tree).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "a.txt");

        assert!(matches!(
            store.get_blob(&tree).unwrap_err(),
            Error::InvalidObjectType { .. }
        ));
        assert!(matches!(
            store.get_tree(&blob).unwrap_err(),
            Error::InvalidObjectType { .. }
        ));
    }
}
