//! Predefined CMap resources.
//!
//! Predefined CMaps (`UniJIS-UCS2-H`, `Adobe-GB1-UCS2`, ...) are read
//! through a [`CMapResourceProvider`] and parsed once. The [`CMapCache`] is
//! an explicit service shared through `Arc` by everything that needs
//! predefined CMaps; the whole lookup-load-insert sequence runs under its
//! lock so concurrent requests for the same name parse it once.

use super::parser::{parse_cmap, CMapData};
use super::to_unicode::CMapToUnicode;
use crate::config::FontConfig;
use crate::error::{Error, Result};
use crate::fonts::glyph::utf16_of;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Longest `usecmap` chain that is followed.
const MAX_USECMAP_DEPTH: usize = 8;

/// Source of predefined CMap programs.
pub trait CMapResourceProvider: Send + Sync {
    /// Raw program of the named CMap, or `None` if the provider does not have it.
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>>;
}

/// Reads CMap resources from a directory, one file per CMap name.
#[derive(Debug, Clone)]
pub struct DirectoryCMapProvider {
    dir: PathBuf,
}

impl DirectoryCMapProvider {
    /// Provider over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Provider over the configured directory (or `$FONT_OXIDE_CMAP_DIR`).
    pub fn from_config(config: &FontConfig) -> Option<Self> {
        config.resolved_cmap_dir().map(Self::new)
    }
}

impl CMapResourceProvider for DirectoryCMapProvider {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if name.is_empty() || name.contains(&['/', '\\'][..]) || name.starts_with('.') {
            log::warn!("Refusing CMap resource name {:?}", name);
            return Ok(None);
        }
        let path = self.dir.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => {
                log::debug!("Loaded CMap resource {}", path.display());
                Ok(Some(bytes))
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory CMap resources.
#[derive(Debug, Clone, Default)]
pub struct MemoryCMapProvider {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryCMapProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    pub fn insert(&mut self, name: impl Into<String>, program: impl Into<Vec<u8>>) {
        self.resources.insert(name.into(), program.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, program: impl Into<Vec<u8>>) -> Self {
        self.insert(name, program);
        self
    }
}

impl CMapResourceProvider for MemoryCMapProvider {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.resources.get(name).cloned())
    }
}

/// Parsed predefined CMaps, keyed by name.
pub struct CMapCache {
    provider: Box<dyn CMapResourceProvider>,
    cmaps: Mutex<HashMap<String, Arc<CMapData>>>,
    to_unicode: Mutex<HashMap<String, Arc<CMapToUnicode>>>,
}

impl std::fmt::Debug for CMapCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CMapCache")
            .field("cached", &self.cached_names())
            .finish_non_exhaustive()
    }
}

impl CMapCache {
    /// Cache over `provider`.
    pub fn new(provider: impl CMapResourceProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            cmaps: Mutex::new(HashMap::new()),
            to_unicode: Mutex::new(HashMap::new()),
        }
    }

    /// Cache over the configured resource directory; without one, only
    /// the Identity CMaps (which need no resource) are available.
    pub fn from_config(config: &FontConfig) -> Self {
        match DirectoryCMapProvider::from_config(config) {
            Some(provider) => Self::new(provider),
            None => Self::new(MemoryCMapProvider::new()),
        }
    }

    /// The named CMap with its `usecmap` parents merged in.
    pub fn cmap(&self, name: &str) -> Result<Arc<CMapData>> {
        let mut cmaps = self.cmaps.lock().unwrap_or_else(PoisonError::into_inner);
        self.load_locked(&mut cmaps, name, 0)
    }

    fn load_locked(
        &self,
        cmaps: &mut HashMap<String, Arc<CMapData>>,
        name: &str,
        depth: usize,
    ) -> Result<Arc<CMapData>> {
        if let Some(hit) = cmaps.get(name) {
            log::trace!("CMap cache hit: {}", name);
            return Ok(Arc::clone(hit));
        }
        if depth > MAX_USECMAP_DEPTH {
            return Err(Error::ParseError {
                offset: 0,
                reason: format!("usecmap chain too deep at {}", name),
            });
        }
        log::debug!("CMap cache miss: {}", name);

        let program = self
            .provider
            .load(name)?
            .ok_or_else(|| Error::CMapNotFound(name.to_string()))?;
        let mut data = parse_cmap(&program)?;
        if let Some(parent_name) = data.usecmap.clone() {
            let parent = self.load_locked(cmaps, &parent_name, depth + 1)?;
            data.merge_parent(&parent);
        }

        let data = Arc::new(data);
        cmaps.insert(name.to_string(), Arc::clone(&data));
        Ok(data)
    }

    /// Merge the `usecmap` parents of an embedded CMap.
    ///
    /// A parent that cannot be loaded is skipped with a warning.
    pub fn resolve_parents(&self, mut data: CMapData) -> CMapData {
        if let Some(parent_name) = data.usecmap.clone() {
            match self.cmap(&parent_name) {
                Ok(parent) => data.merge_parent(&parent),
                Err(e) => log::warn!("Cannot load parent CMap {}: {}", parent_name, e),
            }
        }
        data
    }

    /// Code → Unicode map of a predefined CMap.
    ///
    /// bf mappings are used as they are. A CMap with only CID mappings
    /// (`Uni*-UCS2-*`, `Adobe-*-UCS2`) is read in reverse: CID → the
    /// Unicode code it was keyed by.
    pub fn to_unicode(&self, name: &str) -> Result<Arc<CMapToUnicode>> {
        let mut maps = self.to_unicode.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = maps.get(name) {
            return Ok(Arc::clone(hit));
        }

        let data = self.cmap(name)?;
        let map = if data.unicode.is_empty() {
            let mut map = CMapToUnicode::new();
            for (code, cid) in &data.cids {
                if let Some(chars) = utf16_of(code.value) {
                    if map.lookup(*cid).is_none() {
                        map.add_mapping(*cid, chars);
                    }
                }
            }
            map
        } else {
            CMapToUnicode::from_cmap_data((*data).clone())
        };

        let map = Arc::new(map);
        maps.insert(name.to_string(), Arc::clone(&map));
        Ok(map)
    }

    /// Names currently held in the cache.
    pub fn cached_names(&self) -> Vec<String> {
        let cmaps = self.cmaps.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = cmaps.keys().cloned().collect();
        names.sort();
        names
    }
}
