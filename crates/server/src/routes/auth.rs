use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use tasklane_api::crypto::{self, AUTH_TYPE_LINK_SHARE};
use tasklane_models::{Auth, link_shares};

use super::{AppState, now_unix};
use crate::error::ApiErr;

/// The principal behind the request's bearer token.
///
/// User tokens are trusted as issued. Link-share tokens re-read their share,
/// so deleting a share revokes its tokens at once.
pub struct AuthUser(pub Auth);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiErr::unauthorized("missing or invalid Authorization header"))?;

        let now = now_unix();
        let claims = crypto::verify_jwt(token, &state.config.service.jwt_secret, now)
            .map_err(|e| ApiErr::unauthorized(e.message()))?;

        if claims.kind == AUTH_TYPE_LINK_SHARE {
            if !state.config.service.enable_link_sharing {
                return Err(ApiErr::unauthorized("link sharing is disabled"));
            }
            let share = {
                let conn = state.db.conn();
                link_shares::get_by_id(&conn, claims.id)
            };
            return match share {
                Ok(share) => Ok(Self(Auth::link_share(&share))),
                Err(tasklane_models::Error::ListShareDoesNotExist) => {
                    Err(ApiErr::unauthorized("the link share does not exist anymore"))
                }
                Err(e) => Err(e.into()),
            };
        }

        state.metrics.record_active(claims.id, now as i64).await;
        Ok(Self(Auth::User {
            id: claims.id,
            username: claims.username,
        }))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tasklane_api::service;

    use super::*;
    use crate::routes::test_support::{self, SECRET};

    fn share_token(id: i64) -> String {
        let conn = tasklane_models::testing::fixtures();
        let share = link_shares::get_by_id(&conn, id).unwrap();
        service::link_share_token(&share, SECRET, 3600, now_unix()).unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_and_forged_tokens() {
        let state = test_support::state();
        let (status, _, body) = test_support::send(&state, "GET", "/api/v1/user", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing or invalid Authorization header");

        let (status, _, _) =
            test_support::send(&state, "GET", "/api/v1/user", Some("not.a.token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user = tasklane_api::User {
            id: 1,
            username: "user1".into(),
            ..Default::default()
        };
        let foreign = service::user_token(&user, "other-secret", 3600, now_unix()).unwrap();
        let (status, _, _) = test_support::send(&state, "GET", "/api/v1/user", Some(&foreign), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn link_share_tokens_reach_their_list() {
        let state = test_support::state();
        let token = share_token(1);
        let (status, _, body) = test_support::send(&state, "GET", "/api/v1/lists/1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Test1");

        let (status, _, _) = test_support::send(&state, "GET", "/api/v1/lists/2", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn deleted_share_revokes_its_token() {
        let state = test_support::state();
        let token = share_token(2);
        state
            .db
            .conn()
            .execute("DELETE FROM link_shares WHERE id = 2", [])
            .unwrap();
        let (status, _, _) = test_support::send(&state, "GET", "/api/v1/lists/2", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn link_share_tokens_refused_when_sharing_is_off() {
        let state = test_support::state_with(|c| c.service.enable_link_sharing = false);
        let token = share_token(1);
        let (status, _, _) = test_support::send(&state, "GET", "/api/v1/lists/1", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn requests_mark_users_active() {
        let state = test_support::state_with(|c| c.service.enable_metrics = true);
        test_support::get_as(&state, 1, "/api/v1/user").await;
        test_support::get_as(&state, 2, "/api/v1/user").await;
        assert_eq!(state.metrics.active_users(now_unix() as i64).await.unwrap(), 2);
    }
}
