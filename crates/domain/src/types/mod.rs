//! Domain types and models

pub mod account;
pub mod api;
pub mod request;
pub mod session;

pub use account::{Account, KeyHandle, ProxyBinding};
pub use api::{
    Balance, DailyTask, EgressIp, LoginRequest, Profile, RefreshRequest, StatusAck, Task,
    TokenPair,
};
pub use request::{FailureClass, HttpMethod, RequestAuth, RequestOutcome, RequestSpec};
pub use session::SessionRecord;
