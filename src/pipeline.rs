//! End-to-end annotation: load the corpus, bring up the parser service,
//! drive it over the corpus, shut it down.

use crate::config::Config;
use crate::corpus::{CorpusError, CorpusIndex};
use crate::driver::{ArtifactError, ArtifactWriter, CorpusDriver, RunOutcome};
use crate::parser::{CoreNlpClient, ParserClient};
use crate::supervisor::{CoreNlpServer, StartupError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that end a run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no corpus file configured")]
    MissingCorpus,

    #[error("corpus: {0}")]
    Corpus(#[from] CorpusError),

    #[error("parser service failed to start: {0}")]
    Startup(#[from] StartupError),

    #[error("parser service at {0} is not reachable")]
    ServiceUnavailable(String),

    #[error("output: {0}")]
    Output(#[from] ArtifactError),
}

/// Load the corpus named in the configuration
pub fn load_corpus(config: &Config) -> Result<CorpusIndex, RunError> {
    let path = config.corpus.path.as_deref().ok_or(RunError::MissingCorpus)?;
    let index = CorpusIndex::from_path(path)?;
    info!(path = %path.display(), sentences = index.len(), "corpus loaded");
    Ok(index)
}

/// Run the whole annotation.
///
/// Without `client.url` a CoreNLP server is started from `server` and
/// stopped afterwards; with it, the given server must already be live.
pub async fn annotate(config: &Config) -> Result<RunOutcome, RunError> {
    let index = load_corpus(config)?;

    let (server, url) = match &config.client.url {
        Some(url) => (None, url.clone()),
        None => {
            let server = CoreNlpServer::start(&config.server).await?;
            let url = server.base_url();
            (Some(server), url)
        }
    };

    let client = CoreNlpClient::new(url.clone(), &config.client);
    if server.is_none() && !client.is_available().await {
        return Err(RunError::ServiceUnavailable(url));
    }

    let outcome = annotate_with(Arc::new(client), config, &index).await;

    if let Some(server) = server {
        if let Err(e) = server.stop().await {
            warn!(error = %e, "parser server did not shut down cleanly");
        }
    }
    outcome
}

/// Run the driver over `index` with an already-available parser
pub async fn annotate_with(
    parser: Arc<dyn ParserClient>,
    config: &Config,
    index: &CorpusIndex,
) -> Result<RunOutcome, RunError> {
    let driver = CorpusDriver::new(parser, ArtifactWriter::new(config.output.clone()), config.trace);
    Ok(driver.run(index, &config.selection()).await?)
}
