use std::sync::Arc;

use shared::domain::{CompilerConfigModel, CompilerInfo, LanguageConfig};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{dispatcher::CompilerApi, error::ConfigLoadError};

/// Holds the language catalog. A successful load swaps the whole catalog in
/// one step; a failed load leaves the previous one untouched.
#[derive(Default)]
pub struct ConfigStore {
    catalog: RwLock<Option<Arc<CompilerConfigModel>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(
        &self,
        api: &dyn CompilerApi,
    ) -> Result<Arc<CompilerConfigModel>, ConfigLoadError> {
        let body = api.fetch_config().await.map_err(|err| {
            warn!(error = %err, "compiler catalog unreachable");
            ConfigLoadError::from(err)
        })?;
        self.load_from_str(&body).await
    }

    pub async fn load_from_str(
        &self,
        body: &str,
    ) -> Result<Arc<CompilerConfigModel>, ConfigLoadError> {
        let model = CompilerConfigModel::from_json(body).map_err(|err| {
            warn!(error = %err, "compiler catalog rejected");
            ConfigLoadError::from(err)
        })?;
        Ok(self.install(model).await)
    }

    pub async fn install(&self, model: CompilerConfigModel) -> Arc<CompilerConfigModel> {
        let model = Arc::new(model);
        *self.catalog.write().await = Some(model.clone());
        info!(languages = model.languages().len(), "compiler catalog loaded");
        model
    }

    pub async fn catalog(&self) -> Option<Arc<CompilerConfigModel>> {
        self.catalog.read().await.clone()
    }

    pub async fn default_language(&self) -> Option<LanguageConfig> {
        self.catalog()
            .await
            .map(|catalog| catalog.default_language().clone())
    }

    pub fn default_compiler(language: &LanguageConfig) -> Option<&CompilerInfo> {
        language.default_compiler()
    }
}

#[cfg(test)]
#[path = "tests/config_store_tests.rs"]
mod tests;
