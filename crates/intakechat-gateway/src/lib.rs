pub mod api;
pub mod flow;
pub mod router;
pub mod server;
pub mod session;
pub mod state;

pub use flow::{ChatFlow, EntryMode, FlowError, NotificationStatus, SubmitOutcome};
pub use server::GatewayServer;
pub use session::{ChatSession, SessionSummary};
pub use state::{AppState, SharedState};
