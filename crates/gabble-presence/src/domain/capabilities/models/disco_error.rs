// gabble-presence/gabble-presence
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiscoError {
    #[error("Disco request timed out")]
    Timeout,
    #[error("Disco request was cancelled")]
    Cancelled,
    #[error("Disco request failed: {msg}")]
    Unknown { msg: String },
}
