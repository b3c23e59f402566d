//! Server-Sent Events (SSE) infrastructure for realtime chat push.
//!
//! This crate holds the process-wide broker that fans chat events (new
//! message, reaction change, pin change) out to the long-lived streaming
//! connections currently open for that chat.
//!
//! # Architecture
//!
//! - **One connection per open chat view**: a client opens one SSE connection
//!   per chat it is watching; the connection is bound to that chat id and the
//!   authenticated user id for its whole lifetime.
//! - **Dual-index registry**: O(1) lookups for both connection cleanup and
//!   chat-scoped routing via separate DashMap indices.
//! - **Ephemeral messages**: nothing is persisted or replayed. A client that
//!   connects after an event was pushed catches up through the paginated
//!   message fetch, not through the broker.
//! - **Best-effort delivery**: a send failure on one connection unregisters
//!   that connection and never blocks delivery to the rest.
//!
//! # Message Flow
//!
//! 1. Frontend opens the per-chat stream endpoint
//! 2. Backend authenticates the user and checks chat membership
//! 3. Connection registered in ConnectionRegistry under its chat id
//! 4. When a message/reaction/pin changes, the controller sends a typed event
//!    via `app_state.sse_manager.send_message()`
//! 5. Manager routes the event to every connection registered for that chat
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with dual-index architecture and type-safe ConnectionId
//! - `manager`: High-level event routing (delegates to ConnectionRegistry)
//! - `message`: Type-safe event and scope definitions

pub mod connection;
pub mod manager;
pub mod message;

pub use manager::Manager;
