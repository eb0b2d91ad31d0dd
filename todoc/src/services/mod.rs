mod chat;
mod community;
mod kids;
mod records;
mod tips;

pub use chat::ChatService;
pub use community::{CommunityService, NewPost, PageInfo};
pub use kids::KidService;
pub use records::{RecordFilter, RecordService};
pub use tips::TipService;

use todoc_api::{ApiRequest, Gateway};

use crate::error::AppError;

/// Validate locally, then send through the gateway
pub(crate) async fn call<R>(gateway: &Gateway, request: R) -> Result<R::Response, AppError>
where
    R: ApiRequest,
{
    if let Err(e) = request.validate() {
        tracing::debug!("Rejected before sending: {}", e);
        return Err(e.into());
    }
    Ok(gateway.send(request).await?)
}
