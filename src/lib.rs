//! # rpc-bus
//!
//! **A library for request/reply RPC microservices over a message broker.**
//!
//! `rpc-bus` turns a broker queue into an RPC endpoint. A **producer**
//! (gateway) sends a request to a worker queue and awaits a correlated reply
//! on a temporary queue of its own; one or more **consumers** (workers) pull
//! requests off the worker queue, route them to a registered handler, and
//! always reply — even when the request itself is malformed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   request    ┌─────────┐   route    ┌─────────┐   store call   ┌───────┐
//! │ Producer │ ────────────▶│ Consumer│───────────▶│ Router  │───────────────▶│ Store │
//! │ (gateway)│◀──reply queue─│ (worker)│◀───result───│         │◀────entity─────│       │
//! └──────────┘               └─────────┘             └─────────┘                └───────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. A [`producer::Producer`] sends a [`envelope::BusMessage`] to a named
//!    queue, declaring a temporary server-named reply queue for itself.
//! 2. A [`consumer::Consumer`] decodes each delivery into a `BusMessage` and
//!    hands it to a [`router::BusRouter`], which selects the one handler
//!    registered for the message's `(type, resource)` pair.
//! 3. The handler — typically a [`crud::CrudHandler`] bound to a
//!    [`store::Store`], or the built-in [`health::HealthHandler`] — runs and
//!    returns a JSON string result or an [`error::AppError`].
//! 4. The consumer always replies: success becomes `{ok:true, data:...}`,
//!    failure becomes `{ok:false, error:{code,message,details}}`
//!    ([`envelope::RpcEnvelope`]).
//! 5. The producer's [`producer::Producer::call`] resolves with the decoded
//!    payload, an [`error::AppError`] reconstructed from the remote's
//!    `RpcError` (kind [`error::ErrorKind::Rpc`]), or kind
//!    [`error::ErrorKind::GatewayTimeout`] if no reply arrives in time.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`error`] | Closed error taxonomy (`AppError`/`ErrorKind`) with HTTP-style status codes |
//! | [`envelope`] | Wire types: `BusMessage`, `RpcEnvelope`, `RpcError` |
//! | [`params`] | Strict decoding of a `BusMessage`'s opaque `data`/`id` fields |
//! | [`entity`] | The `Entity` contract the CRUD handler requires (`id`, `createdAt`, `updatedAt`) |
//! | [`store`] | The `Store<T>` persistence trait, plus a bundled in-memory reference impl |
//! | [`handler`] | The `BusHandler` trait every routable service implements |
//! | [`crud`] | Generic Create/Get/List/Update/Delete handler bound to a `Store` |
//! | [`health`] | Connectivity probe handler |
//! | [`router`] | Matches an incoming message to exactly one registered handler |
//! | [`config`] | `BrokerSettings` bound at startup |
//! | [`consumer`] | The long-lived worker loop: receive → decode → route → reply |
//! | [`producer`] | Fire a request and await a correlated reply, with timeout |
//! | [`gateway`] | The user-visible error shape a process host serializes back to its own callers |

pub mod config;
pub mod consumer;
pub mod crud;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod health;
pub mod params;
pub mod producer;
pub mod router;
pub mod store;

pub use envelope::{BusMessage, MessageType, RpcEnvelope, RpcError};
pub use error::{AppError, ErrorKind};
pub use handler::BusHandler;
pub use router::BusRouter;
