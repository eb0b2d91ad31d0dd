pub mod endpoints;
mod error;
mod gateway;
mod macros;
pub mod repositories;
mod request;
pub mod testing;
mod transport;

pub use crate::error::{ApiError, NETWORK_ERROR_MESSAGE, StructuredError, ValidationError};
pub use crate::gateway::Gateway;
pub use crate::request::{EmptyResponse, Method, Request as ApiRequest, RequestData, Upload};
pub use crate::transport::{
    Body, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};
use repositories::*;

pub struct Request;

impl Request {
    pub fn new() -> Self {
        Self {}
    }

    pub fn auth() -> AuthRepository {
        AuthRepository::new()
    }

    pub fn kids() -> KidRepository {
        KidRepository::new()
    }

    pub fn records(kid_id: endpoints::KidId) -> RecordRepository {
        RecordRepository::new(kid_id)
    }

    pub fn chat() -> ChatRepository {
        ChatRepository::new()
    }

    pub fn community() -> CommunityRepository {
        CommunityRepository::new()
    }

    pub fn daily_tips() -> DailyTipRepository {
        DailyTipRepository::new()
    }
}
