//! Orchestrates load → parse → build → instantiate and owns the
//! process-wide prefab cache (spec §4.8).

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::cache::{ArchiveCache, ArchiveHandle, ByteFetcher, ServerCredentials};
use crate::errors::{Result, RwxError};
use crate::parser::parse_model;
use crate::scene::prefab::ModelPrefab;
use crate::texture::TextureLoader;

/// `(server, lowercased model name)` — the prefab cache key (spec §3,
/// "Lifecycles").
type PrefabKey = (String, String);

pub struct SceneAssembler<F: ByteFetcher> {
    archives: Arc<ArchiveCache<F>>,
    textures: Arc<TextureLoader<F>>,
    prefabs: RwLock<FxHashMap<PrefabKey, Arc<ModelPrefab>>>,
}

impl<F: ByteFetcher> SceneAssembler<F> {
    #[must_use]
    pub fn new(archives: Arc<ArchiveCache<F>>) -> Self {
        let textures = Arc::new(TextureLoader::new(archives.clone()));
        Self {
            archives,
            textures,
            prefabs: RwLock::new(FxHashMap::default()),
        }
    }

    /// The texture loader this assembler resolved its archives through —
    /// material texture names are resolved against it by whatever owns
    /// the GPU upload path (out of scope here, spec §1).
    #[must_use]
    pub fn textures(&self) -> &Arc<TextureLoader<F>> {
        &self.textures
    }

    fn cache_key(server: Option<&str>, name: &str) -> PrefabKey {
        (
            server.unwrap_or_default().to_string(),
            name.to_ascii_lowercase(),
        )
    }

    /// Fast path: return a cached prefab. Slow path: download the model
    /// archive, open it, look up `<name>.rwx` (falling back to
    /// `<name>.RWX`), and parse it. Concurrent loaders racing on the same
    /// key all parse, but only the first to reach [`Self::deposit`] wins —
    /// the cache is insert-once per key (spec §5).
    pub async fn load_from_remote(
        &self,
        name: &str,
        server: Option<&str>,
        credentials: Option<&ServerCredentials>,
    ) -> Result<Arc<ModelPrefab>> {
        let key = Self::cache_key(server, name);
        if let Some(hit) = self.prefabs.read().get(&key).cloned() {
            return Ok(hit);
        }

        let server = server.unwrap_or_default();
        let archive_path = self.archives.fetch_model(server, name, credentials).await?;
        let mut handle = self.archives.open_archive(&archive_path).await?;
        let prefab = parse_from_handle(&mut handle, name)?;
        Ok(self.deposit(key, prefab))
    }

    /// Same slow path as [`Self::load_from_remote`] but against archive
    /// bytes the caller already has in hand, with no server key.
    pub fn load_from_local_archive(&self, bytes: Vec<u8>, name: &str) -> Result<Arc<ModelPrefab>> {
        let key = Self::cache_key(None, name);
        if let Some(hit) = self.prefabs.read().get(&key).cloned() {
            return Ok(hit);
        }
        let mut handle = ArchiveHandle::open(bytes)?;
        let prefab = parse_from_handle(&mut handle, name)?;
        Ok(self.deposit(key, prefab))
    }

    /// Lists every `.rwx` entry in an already-downloaded archive, without
    /// touching the prefab cache.
    pub fn list_models_in_archive(bytes: Vec<u8>) -> Result<Vec<String>> {
        let handle = ArchiveHandle::open(bytes)?;
        Ok(handle
            .list_entries()
            .into_iter()
            .filter(|entry| entry.to_ascii_lowercase().ends_with(".rwx"))
            .collect())
    }

    /// Downloads each named model in sequence, yielding `(completed,
    /// total)` to `progress` after every item (spec §4.8, §5 "one per
    /// frame/yield point"). Failed loads are skipped rather than aborting
    /// the batch.
    pub async fn preload_models(
        &self,
        names: &[String],
        server: Option<&str>,
        credentials: Option<&ServerCredentials>,
        mut progress: impl FnMut(usize, usize),
    ) {
        let total = names.len();
        for (index, name) in names.iter().enumerate() {
            if let Err(err) = self.load_from_remote(name, server, credentials).await {
                log::warn!("rwx_forge: preload of `{name}` failed: {err}");
            }
            progress(index + 1, total);
        }
    }

    /// Purges the on-disk archive cache and the in-memory prefab cache
    /// for one server, or everything when `server` is `None`.
    pub async fn clear_cache(&self, server: Option<&str>) -> Result<()> {
        self.archives.clear(server).await?;
        match server {
            Some(server) => self.prefabs.write().retain(|(s, _), _| s != server),
            None => self.prefabs.write().clear(),
        }
        Ok(())
    }

    /// Inserts `prefab` under `key` unless another loader already beat
    /// this one to it, and returns whichever value is now authoritative
    /// (spec §5, "the cache is insert-once per key").
    fn deposit(&self, key: PrefabKey, prefab: ModelPrefab) -> Arc<ModelPrefab> {
        let candidate = Arc::new(prefab);
        let mut guard = self.prefabs.write();
        guard.entry(key).or_insert(candidate).clone()
    }
}

fn parse_from_handle(handle: &mut ArchiveHandle, name: &str) -> Result<ModelPrefab> {
    let lower = format!("{name}.rwx");
    let upper = format!("{name}.RWX");
    let bytes = handle
        .read_entry(&lower, None)?
        .or(handle.read_entry(&upper, None)?)
        .ok_or_else(|| RwxError::NotFound(lower))?;
    let source = String::from_utf8_lossy(&bytes).into_owned();
    Ok(parse_model(&source))
}
