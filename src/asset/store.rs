use std::{path::Path, sync::Arc};

use generational_arena::{Arena, Index};

use super::{
    buffer::{FileSource, FsSource},
    Asset, AssetParser,
};
use crate::{config::ImportConfig, error::LoadError};

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct AssetId(pub Index);
impl From<AssetId> for Index {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

/// Owns every loaded asset. Callers hold `AssetId`s and pass the store by
/// reference wherever assets are needed.
pub struct AssetStore {
    assets: Arena<Arc<Asset>>,
    source: Box<dyn FileSource>,
    pub config: ImportConfig,
}

impl AssetStore {
    pub fn new(config: ImportConfig) -> Self {
        Self::with_source(Box::new(FsSource), config)
    }

    pub fn with_source(source: Box<dyn FileSource>, config: ImportConfig) -> Self {
        Self { assets: Arena::new(), source, config }
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<AssetId, LoadError> {
        let asset = AssetParser::new(self.source.as_ref(), self.config.clone()).parse_file(path.as_ref())?;
        Ok(self.insert(asset))
    }

    pub fn load_bytes(&mut self, bytes: &[u8], base_path: impl AsRef<Path>) -> Result<AssetId, LoadError> {
        let asset = AssetParser::new(self.source.as_ref(), self.config.clone()).parse(bytes, base_path.as_ref())?;
        Ok(self.insert(asset))
    }

    pub fn insert(&mut self, asset: Asset) -> AssetId {
        AssetId(self.assets.insert(Arc::new(asset)))
    }

    pub fn get(&self, id: AssetId) -> Option<&Arc<Asset>> {
        self.assets.get(id.0)
    }

    /// Instances already holding the asset keep it alive.
    pub fn remove(&mut self, id: AssetId) -> Option<Arc<Asset>> {
        self.assets.remove(id.0)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
