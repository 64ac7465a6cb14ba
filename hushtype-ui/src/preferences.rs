use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::info;

use hushtype_core::{
    AppConfig, AzureOpenAiConfig, OpenAiConfig, Provider, UpdateStatus,
};
use hushtype_gateway::Backend;

/// What the preferences pane shows about stored credentials. Keys are masked
/// before they ever reach a view; the full secret only travels on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub active_provider: Option<Provider>,
    pub openai_key: Option<String>,
    pub azure_key: Option<String>,
    pub azure_endpoint: Option<String>,
}

/// View-model behind the preferences pane. Unlike the popup controller,
/// preferences surface command failures to the caller: a form needs to show
/// "save failed", there is no backend event that would re-assert it.
pub struct Preferences {
    backend: Arc<dyn Backend>,
}

impl Preferences {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn load_summary(&self) -> anyhow::Result<ProviderSummary> {
        let app = self
            .backend
            .load_app_config()
            .await
            .context("load app config")?;
        let openai = self
            .backend
            .load_openai_config()
            .await
            .context("load OpenAI config")?;
        let azure = self
            .backend
            .load_azure_openai_config()
            .await
            .context("load Azure OpenAI config")?;

        Ok(ProviderSummary {
            active_provider: app.active_provider,
            openai_key: openai.map(|c| mask_api_key(&c.api_key)),
            azure_key: azure.as_ref().map(|c| mask_api_key(&c.api_key)),
            azure_endpoint: azure.map(|c| c.endpoint),
        })
    }

    /// Validate the key against the provider before storing it; a key the
    /// backend's test call rejects is never saved.
    pub async fn save_openai(&self, api_key: &str) -> anyhow::Result<()> {
        let api_key = api_key.trim();
        let ok = self
            .backend
            .test_openai_config(api_key)
            .await
            .context("test OpenAI key")?;
        if !ok {
            bail!("the OpenAI API key was rejected");
        }
        self.backend
            .save_openai_config(&OpenAiConfig {
                api_key: api_key.to_string(),
            })
            .await
            .context("save OpenAI config")?;
        info!("OpenAI credentials updated");
        Ok(())
    }

    pub async fn save_azure(&self, api_key: &str, endpoint: &str) -> anyhow::Result<()> {
        let api_key = api_key.trim();
        let endpoint = endpoint.trim();
        let ok = self
            .backend
            .test_azure_openai_config(api_key, endpoint)
            .await
            .context("test Azure OpenAI key")?;
        if !ok {
            bail!("the Azure OpenAI key or endpoint was rejected");
        }
        self.backend
            .save_azure_openai_config(&AzureOpenAiConfig {
                api_key: api_key.to_string(),
                endpoint: endpoint.to_string(),
            })
            .await
            .context("save Azure OpenAI config")?;
        info!("Azure OpenAI credentials updated");
        Ok(())
    }

    pub async fn delete_openai(&self) -> anyhow::Result<()> {
        self.backend
            .delete_openai_config()
            .await
            .context("delete OpenAI config")?;
        Ok(())
    }

    pub async fn delete_azure(&self) -> anyhow::Result<()> {
        self.backend
            .delete_azure_openai_config()
            .await
            .context("delete Azure OpenAI config")?;
        Ok(())
    }

    pub async fn set_active_provider(&self, provider: Option<Provider>) -> anyhow::Result<()> {
        self.backend
            .save_app_config(&AppConfig {
                active_provider: provider,
            })
            .await
            .context("save app config")?;
        Ok(())
    }

    pub async fn check_for_updates(&self) -> anyhow::Result<UpdateStatus> {
        let status = self
            .backend
            .check_for_updates()
            .await
            .context("check for updates")?;
        Ok(status)
    }
}

/// Keep only the last four characters visible.
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "••••".into();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("••••{tail}")
}
