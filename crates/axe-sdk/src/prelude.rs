//! Convenience re-exports for common usage

pub use crate::builder::{AxeClientBuilder, ConfigError};
pub use crate::client::{AxeClient, SdkError, SdkResult};
pub use crate::journal::{FileJournal, Journal, JournalError, MemoryJournal};

pub use axe_ledger::{Order, OrderLedger, QueryError};
pub use axe_session::{ResendPolicy, SessionConfig};
pub use axe_types::{AxeError, Message, MsgType, OrderInstruction, ResponseCode};
