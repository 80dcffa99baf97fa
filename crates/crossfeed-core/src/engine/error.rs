use crate::core::models::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model validation failed: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("model '{model}' has no biomass reaction designated for scoring")]
    MissingObjective { model: String },

    #[error("organism '{organism}' is not a member of community '{community}'")]
    UnknownOrganism { organism: String, community: String },

    #[error("internal logic error: {0}")]
    Internal(String),
}
