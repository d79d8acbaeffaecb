pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod proxy;
pub mod server;
pub mod translate;

pub use config::{Endpoints, RelayConfig};
pub use error::{RelayError, Result};
pub use logging::SharedLogger;
pub use proxy::{dispatch, HttpSender, ReqwestSender};
pub use server::{build_router, AppState};
pub use translate::request::adapt;
pub use translate::response::extract;
pub use translate::types::{
    ChatMessage, ChatRequest, ChatResult, MessageList, ProviderRequest, Role,
};
