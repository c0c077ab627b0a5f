use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClockError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Cannot find taxon '{taxon}' of clade '{clade}' in the tree")]
    UnknownTaxon { clade: String, taxon: String },

    #[error("Taxon '{taxon}' is declared more than once in clade '{clade}'")]
    DuplicateTaxon { clade: String, taxon: String },

    #[error("Clade '{0}' must be monophyletic")]
    NotMonophyletic(String),

    #[error("Tree Error: {0}")]
    Tree(String),

    #[error("Parameter Error: {0}")]
    Parameter(String),

    #[error("Numeric Error: {0}")]
    Numeric(String),
}

pub type ClockResult<T> = Result<T, ClockError>;
