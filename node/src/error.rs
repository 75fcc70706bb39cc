use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] venue_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] venue_store_lmdb::LmdbError),

    #[error("venue code error: {0}")]
    Code(#[from] venue_codes::CodeError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("REST server error: {0}")]
    Rpc(String),
}
