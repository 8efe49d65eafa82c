use thiserror::Error;

use crate::{
    config::ConfigError,
    link::FrameError,
    message::MessageError,
    protocol::ProtocolError,
};

/// Unified error covering frame construction, message construction, reassembly and config.
/// - `From<T>` impls let `?` cross layers.
#[derive(Debug, Error)]
pub enum DiagError {
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("message error: {0}")]
    Message(#[from] MessageError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, DiagError>;
