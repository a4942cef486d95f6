// ============================================================
// Layer 6 - Pretrained Backbone Store
// ============================================================
// Resolves backbone weights by name to burn records in a local
// directory. The store never downloads anything: when a file is
// missing the error names the upstream ImageNet checkpoint the
// record should be converted from.
//
// Layout:
//   weights/
//     squeezenet1_0.mpk
//     squeezenet1_1.mpk
//     resnet18.mpk
//     resnet34.mpk

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

/// Known backbone checkpoints and where they originate.
pub const CATALOG: [(&str, &str); 4] = [
    ("squeezenet1_0", "https://download.pytorch.org/models/squeezenet1_0-a815701f.pth"),
    ("squeezenet1_1", "https://download.pytorch.org/models/squeezenet1_1-f364aa15.pth"),
    ("resnet18", "https://download.pytorch.org/models/resnet18-5c106cde.pth"),
    ("resnet34", "https://download.pytorch.org/models/resnet34-333f7ec4.pth"),
];

pub fn source_url(name: &str) -> Option<&'static str> {
    CATALOG.iter().find(|(n, _)| *n == name).map(|(_, url)| *url)
}

pub struct PretrainedStore {
    dir: PathBuf,
}

impl PretrainedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record for `name`, without the recorder extension.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Load the weights catalogued as `name` into `module`, which must
    /// already have the matching architecture.
    pub fn load<B: Backend, M: Module<B>>(&self, name: &str, module: M, device: &B::Device) -> Result<M> {
        let Some(url) = source_url(name) else {
            bail!("No pretrained weights named '{name}' in the catalog");
        };
        let path = self.path_of(name);
        let recorder = CompactRecorder::new();
        let record: M::Record = Recorder::<B>::load(&recorder, path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load pretrained '{name}' from '{}'. Convert {url} into a burn record first.",
                    path.display()
                )
            })?;
        tracing::info!("Loaded pretrained weights '{name}'");
        Ok(module.load_record(record))
    }
}

#[cfg(test)]
impl PretrainedStore {
    /// Store `module` under `name` the way converted weights are laid out.
    pub(crate) fn save<B: Backend, M: Module<B>>(&self, name: &str, module: &M) -> Result<()> {
        if source_url(name).is_none() {
            bail!("No pretrained weights named '{name}' in the catalog");
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create weights dir '{}'", self.dir.display()))?;
        let path = self.path_of(name);
        let recorder = CompactRecorder::new();
        Recorder::<B>::record(&recorder, module.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backbone::SqueezeNetVersion;
    use crate::ml::squeezenet::SqueezeNetConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_catalog_covers_every_backbone() {
        for name in [
            SqueezeNetVersion::V1_0.weights_name(),
            SqueezeNetVersion::V1_1.weights_name(),
            crate::domain::backbone::ResNetDepth::R18.weights_name(),
            crate::domain::backbone::ResNetDepth::R34.weights_name(),
        ] {
            assert!(source_url(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_missing_file_error_names_source() {
        let device = Default::default();
        let store = PretrainedStore::new(std::env::temp_dir().join("c4-no-such-weights"));
        let model = SqueezeNetConfig::new().init::<TestBackend>(&device);
        let err = store.load::<TestBackend, _>("squeezenet1_1", model, &device).unwrap_err();
        assert!(format!("{err:#}").contains("squeezenet1_1-f364aa15.pth"));
    }

    #[test]
    fn test_save_then_load() {
        let device = Default::default();
        let dir = std::env::temp_dir().join(format!("c4-weights-{}", std::process::id()));
        let store = PretrainedStore::new(&dir);
        let model = SqueezeNetConfig::new().with_num_classes(4).init::<TestBackend>(&device);
        store.save::<TestBackend, _>("squeezenet1_1", &model).unwrap();

        let fresh = SqueezeNetConfig::new().with_num_classes(4).init::<TestBackend>(&device);
        let loaded = store.load::<TestBackend, _>("squeezenet1_1", fresh, &device).unwrap();
        assert_eq!(loaded.num_params(), model.num_params());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_name_rejected() {
        let device = Default::default();
        let store = PretrainedStore::new(std::env::temp_dir());
        let model = SqueezeNetConfig::new().init::<TestBackend>(&device);
        assert!(store.load::<TestBackend, _>("vgg16", model, &device).is_err());
    }
}
