//! Application state: the store handle, the optional completion client and
//! the instruction templates. Built once in `main` and shared by handlers.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{AppConfig, Prompts};
use crate::error::TutorError;
use crate::openai::{CompletionClient, OpenAI};
use crate::store::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub completion: Option<Arc<dyn CompletionClient>>,
    pub prompts: Prompts,
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Build state from config: the OpenAI client is created only if an API key is set.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(config: &AppConfig, db: Database) -> Result<Self, TutorError> {
        let completion: Option<Arc<dyn CompletionClient>> = match &config.openai {
            Some(oa_cfg) => {
                let oa = OpenAI::new(oa_cfg)?;
                info!(target: "coding_tutor", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(Arc::new(oa))
            }
            None => {
                warn!(target: "coding_tutor", "OpenAI disabled (no OPENAI_API_KEY). AI endpoints will fail.");
                None
            }
        };
        info!(target: "coding_tutor", prompts_version = %config.prompts.version, "Instruction templates ready");

        Ok(Self::new(db, completion, config.prompts.clone(), config.cors_origins.clone()))
    }

    pub fn new(
        db: Database,
        completion: Option<Arc<dyn CompletionClient>>,
        prompts: Prompts,
        cors_origins: Vec<String>,
    ) -> Self {
        Self { db, completion, prompts, cors_origins }
    }

    /// The configured completion client, or an upstream error if there is none.
    pub fn completion(&self) -> Result<&dyn CompletionClient, TutorError> {
        self.completion
            .as_deref()
            .ok_or_else(|| TutorError::upstream("completion service is not configured"))
    }
}
