use axum::{
    extract::rejection::{TypedHeaderRejection, TypedHeaderRejectionReason},
    headers::Authorization,
    TypedHeader,
};

use crate::{
    db::UserId,
    error::{AppError, AppResult},
    utils::jwt::{JWTToken, TokenKeys},
};

pub type BearerToken = Result<TypedHeader<Authorization<JWTToken>>, TypedHeaderRejection>;

// Requests carry the acting user's id in the path or body. The Authorization
// header is optional, but when one is sent it has to be a valid bearer token
// whose subject is that user.
pub fn ensure_acting_user(keys: &TokenKeys, token: BearerToken, user_id: UserId) -> AppResult<()> {
    let token = match token {
        Ok(TypedHeader(Authorization(token))) => token,
        Err(rejection) => match rejection.reason() {
            TypedHeaderRejectionReason::Missing => return Ok(()),
            _ => return Err(AppError::Unauthorized("malformed authorization header")),
        },
    };

    let subject = keys.verify_token(&token.0)?;
    if subject != user_id {
        return Err(AppError::Forbidden("token does not belong to this user"));
    }

    Ok(())
}
