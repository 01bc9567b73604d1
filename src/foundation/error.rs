pub type MixResult<T> = Result<T, MixError>;

#[derive(thiserror::Error, Debug)]
pub enum MixError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid caps: {0}")]
    InvalidCaps(String),

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MixError {
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn invalid_caps(msg: impl Into<String>) -> Self {
        Self::InvalidCaps(msg.into())
    }

    pub fn invalid_packet(msg: impl Into<String>) -> Self {
        Self::InvalidPacket(msg.into())
    }
}
