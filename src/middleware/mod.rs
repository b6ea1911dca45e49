use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::convert::Infallible;

use crate::models::AuthToken;

/// Токен из заголовка `Authorization: Token <token>`, если он есть.
///
/// Экстрактор никогда не отклоняет запрос: что делать без токена, решает
/// обработчик (экран бронирования отправляет на страницу входа).
#[derive(Debug, Clone)]
pub struct MaybeAuthToken(pub Option<AuthToken>);

impl MaybeAuthToken {
    pub fn token(&self) -> Option<&AuthToken> {
        self.0.as_ref()
    }
}

fn parse_token(value: &str) -> Option<AuthToken> {
    let token = value.strip_prefix("Token ")?.trim();
    (!token.is_empty()).then(|| AuthToken::new(token))
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuthToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_token);

        Ok(MaybeAuthToken(token))
    }
}
