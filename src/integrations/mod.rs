//! External service integrations.

pub mod email_client {
    pub use crate::email_client::*;
}

pub mod backup_client {
    pub use crate::backup_client::*;
}
