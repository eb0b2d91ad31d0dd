use std::sync::Arc;
use todoc_api::{ApiError, Gateway, Request};
use todoc_session::{MemoryStore, SessionStore};

#[tokio::main]
pub async fn main() -> Result<(), ApiError> {
    let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
    let gateway = Gateway::new("http://localhost:8000", session.clone());

    let tokens = gateway
        .send(Request::auth().login("mom@example.com", "password"))
        .await?;
    if let Err(e) = session.login(tokens) {
        eprintln!("could not store session: {}", e);
        return Ok(());
    }

    let _kids = gateway.send(Request::kids().list()).await?;
    Ok(())
}
