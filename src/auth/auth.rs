use crate::{
    auth::jwt::verify_token,
    error::ApiError,
    model::{
        role::Role,
        user::{Staff, StaffRole, Student, User},
    },
    models::TokenType,
    state::AppContext,
    utils::db_utils::fetch_user,
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    /// Reads the bearer token of `req` and checks it is a valid access token.
    pub fn from_headers(req: &HttpRequest) -> Result<Self, ApiError> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized("Missing token"))?;

        let ctx = req
            .app_data::<Data<AppContext>>()
            .ok_or_else(|| ApiError::internal(anyhow::anyhow!("App context missing")))?;

        let claims = verify_token(token, &ctx.config.jwt_secret)
            .map_err(|_| ApiError::Unauthorized("Invalid token"))?;

        if claims.token_type != TokenType::Access {
            return Err(ApiError::Unauthorized("Invalid token type"));
        }

        let role = Role::from_id(claims.role).ok_or(ApiError::Unauthorized("Invalid role"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            role,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // the auth middleware has usually done the work already
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }
        ready(AuthUser::from_headers(req).map_err(Into::into))
    }
}

impl AuthUser {
    pub fn require_staff(&self) -> Result<StaffRole, ApiError> {
        self.role
            .staff_role()
            .ok_or_else(|| ApiError::forbidden("Staff only"))
    }

    pub fn require_student(&self) -> Result<(), ApiError> {
        if self.role == Role::Student {
            Ok(())
        } else {
            Err(ApiError::forbidden("Students only"))
        }
    }

    pub async fn load(&self, pool: &SqlitePool) -> Result<User, ApiError> {
        fetch_user(pool, self.user_id)
            .await?
            .ok_or(ApiError::Unauthorized("Account no longer exists"))
    }

    pub async fn load_staff(&self, pool: &SqlitePool) -> Result<Staff, ApiError> {
        self.require_staff()?;
        match self.load(pool).await? {
            User::Staff(staff) => Ok(staff),
            User::Student(_) => Err(ApiError::forbidden("Staff only")),
        }
    }

    pub async fn load_student(&self, pool: &SqlitePool) -> Result<Student, ApiError> {
        self.require_student()?;
        match self.load(pool).await? {
            User::Student(student) => Ok(student),
            User::Staff(_) => Err(ApiError::forbidden("Students only")),
        }
    }
}
