use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

/// Header a returning player sends their key in
pub const PLAYER_KEY_HEADER: &str = "x-player-key";

/// Anonymous identity used to key saved progress.
///
/// Taken from the `x-player-key` header or a `player` query parameter. A
/// player who sends neither gets a fresh key, which they should keep and send
/// on later connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerKey {
    pub key: Uuid,
    /// True when the key was generated for this request
    pub issued: bool,
}

impl<S> FromRequestParts<S> for PlayerKey
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        // Try the header first, then the query string
        let raw = parts
            .headers
            .get(PLAYER_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(String::from)
            .or_else(|| {
                parts
                    .uri
                    .query()
                    .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
                    .and_then(|params| {
                        params
                            .into_iter()
                            .find(|(k, _)| k == "player")
                            .map(|(_, v)| v)
                    })
            });

        async move {
            match raw {
                Some(raw) => {
                    let key = Uuid::parse_str(raw.trim()).map_err(|_| StatusCode::BAD_REQUEST)?;
                    Ok(PlayerKey { key, issued: false })
                }
                None => Ok(PlayerKey {
                    key: Uuid::new_v4(),
                    issued: true,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<PlayerKey, StatusCode> {
        let (mut parts, _) = request.into_parts();
        PlayerKey::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_key_from_header() {
        let key = Uuid::new_v4();
        let request = Request::builder()
            .uri("/ws")
            .header(PLAYER_KEY_HEADER, key.to_string())
            .body(())
            .unwrap();

        assert_eq!(extract(request).await, Ok(PlayerKey { key, issued: false }));
    }

    #[tokio::test]
    async fn test_key_from_query() {
        let key = Uuid::new_v4();
        let request = Request::builder()
            .uri(format!("/ws?player={}", key))
            .body(())
            .unwrap();

        assert_eq!(extract(request).await, Ok(PlayerKey { key, issued: false }));
    }

    #[tokio::test]
    async fn test_missing_key_is_issued() {
        let request = Request::builder().uri("/ws").body(()).unwrap();
        let player = extract(request).await.unwrap();
        assert!(player.issued);
    }

    #[tokio::test]
    async fn test_malformed_key_rejected() {
        let request = Request::builder().uri("/ws?player=nope").body(()).unwrap();
        assert_eq!(extract(request).await, Err(StatusCode::BAD_REQUEST));
    }
}
