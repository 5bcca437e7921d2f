//! Conversation domain module.
//!
//! - `turn`: a single message (`Turn`, `Sender`, `TurnId`)
//! - `log`: the ordered, editable sequence of turns (`ConversationLog`)

mod log;
mod turn;

pub use log::ConversationLog;
pub use turn::{Sender, Turn, TurnId};
