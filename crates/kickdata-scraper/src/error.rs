use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no reward tiers found on {url}")]
    NoRewardTiers { url: String },

    #[error("no FAQ count marker found on {url}")]
    MissingFaqCount { url: String },

    #[error("could not parse {field} {value:?} on {url}")]
    NumberParse {
        field: &'static str,
        url: String,
        value: String,
    },
}
