use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{file} is missing required column {column:?}")]
    MissingColumn { file: String, column: &'static str },

    #[error("malformed urls field {raw:?}: {source}")]
    MalformedUrls {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no creator id found in creator field {raw:?}")]
    MalformedCreator { raw: String },

    #[error("no category url found in category field {raw:?}")]
    MalformedCategory { raw: String },

    #[error("invalid number {value:?} in {column}")]
    InvalidNumber { column: &'static str, value: String },

    #[error("unknown campaign state {value:?}")]
    UnknownState { value: String },
}
