use std::io;

use mapinfo::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("invalid syntax options in '{path}': {source}")]
    Syntax {
        path: String,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}
