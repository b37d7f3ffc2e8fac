use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    error::ApiError,
    model::{
        role::Role,
        user::{User, UserKind},
    },
    models::{AuthResponse, LoginReqDto, SignupReq, TokenPair, TokenType},
    state::AppContext,
    utils::{
        db_utils::{fetch_user, fetch_user_row_by_email},
        validators::{
            Checks, MIN_PASSWORD_LEN, validate_email, validate_min_length, validate_reg_no,
            validate_staff_id,
        },
    },
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_DEPARTMENT: &str = "Computer Science";

fn token_error(e: jsonwebtoken::errors::Error) -> ApiError {
    error!(error = %e, "Failed to sign token");
    ApiError::internal(e)
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, ctx: &AppContext) -> Result<bool, ApiError> {
    let email = email.trim().to_lowercase();

    // 1️⃣ Cuckoo filter: fast negative
    if !ctx.email_filter.might_exist(&email) {
        return Ok(true);
    }

    // 2️⃣ Moka cache: fast positive
    if ctx.email_cache.is_taken(&email).await {
        return Ok(false);
    }

    // 3️⃣ Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(&ctx.pool)
    .await?;

    if exists {
        ctx.email_cache.mark_taken(&email).await;
    }
    Ok(!exists)
}

fn validate_signup(req: &SignupReq) -> Result<(), ApiError> {
    let mut checks = Checks::new();
    checks
        .required(&req.name, "name", "Name is required")
        .check(validate_email(req.email.trim()), "email", "Please enter a valid email")
        .check(
            validate_min_length(&req.password, MIN_PASSWORD_LEN),
            "password",
            "Password must be at least 6 characters",
        )
        .check(
            req.confirm_password
                .as_deref()
                .is_none_or(|confirm| confirm == req.password),
            "confirmPassword",
            "Passwords do not match",
        );

    match req.role {
        UserKind::Student => {
            checks
                .check(
                    req.reg_no.as_deref().is_some_and(validate_reg_no),
                    "regNo",
                    "Registration number must be 6-12 upper case letters or digits",
                )
                .required_opt(req.degree_name.as_deref(), "degreeName", "Degree name is required")
                .required_opt(req.stream.as_deref(), "stream", "Stream is required")
                .check(
                    req.year.is_none_or(|y| (1..=6).contains(&y)),
                    "year",
                    "Year must be between 1 and 6",
                );
        }
        UserKind::Staff => {
            checks
                .check(
                    req.staff_id.as_deref().is_some_and(validate_staff_id),
                    "staffId",
                    "Staff ID must be 4-10 upper case letters or digits",
                )
                .check(req.staff_role.is_some(), "staffRole", "Staff role is required");
        }
    }

    checks.finish()
}

/// Inserts a new account and returns its id
async fn insert_user(req: &SignupReq, hashed: &str, pool: &SqlitePool) -> Result<i64, ApiError> {
    let department = req
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DEPARTMENT);

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (name, email, password, kind, institution_type, department, shift,
             reg_no, degree_name, stream, year, staff_id, staff_role, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(req.name.trim())
    .bind(req.email.trim().to_lowercase())
    .bind(hashed)
    .bind(req.role.as_ref())
    .bind(req.institution_type.as_ref())
    .bind(department)
    .bind(req.shift.as_ref())
    .bind(
        (req.role == UserKind::Student)
            .then(|| req.reg_no.as_deref().map(str::trim))
            .flatten(),
    )
    .bind(
        (req.role == UserKind::Student)
            .then(|| req.degree_name.as_deref().map(str::trim))
            .flatten(),
    )
    .bind(
        (req.role == UserKind::Student)
            .then(|| req.stream.as_deref().map(str::trim))
            .flatten(),
    )
    .bind((req.role == UserKind::Student).then(|| i64::from(req.year.unwrap_or(1))))
    .bind(
        (req.role == UserKind::Staff)
            .then(|| req.staff_id.as_deref().map(str::trim))
            .flatten(),
    )
    .bind(
        (req.role == UserKind::Staff)
            .then_some(req.staff_role)
            .flatten()
            .map(|r| r.as_ref().to_string()),
    )
    .bind(Utc::now())
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(ApiError::Conflict("Email already registered"))
        }
        Err(e) => {
            error!(error = %e, "Failed to register user");
            Err(e.into())
        }
    }
}

/// Issues an access/refresh token pair and records the refresh token.
async fn issue_tokens(user: &User, ctx: &AppContext) -> Result<TokenPair, ApiError> {
    let role = Role::for_user(user);

    debug!("Generating access token");
    let token = generate_access_token(
        user.id(),
        user.email().to_string(),
        role,
        &ctx.config.jwt_secret,
        ctx.config.access_token_ttl,
    )
    .map_err(token_error)?;

    debug!("Generating refresh token");
    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id(),
        user.email().to_string(),
        role,
        &ctx.config.jwt_secret,
        ctx.config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    debug!(user_id = user.id(), jti = %refresh_claims.jti, "Storing refresh token");
    sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expires_at) VALUES (?, ?, ?)")
        .bind(user.id())
        .bind(&refresh_claims.jti)
        .bind(refresh_claims.exp as i64)
        .execute(&ctx.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            ApiError::from(e)
        })?;

    Ok(TokenPair {
        token,
        refresh_token,
    })
}

/// Account registration handler
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupReq,
    responses(
        (status = 201, description = "Account created, signed in", body = Object),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "error": "validation failed",
            "fields": { "email": "Please enter a valid email" }
        })),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_signup", skip(ctx, req), fields(email = %req.email, role = %req.role))]
pub async fn signup(
    req: web::Json<SignupReq>,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    info!("Signup request received");
    let req = req.into_inner();

    validate_signup(&req)?;

    if !is_email_available(&req.email, &ctx).await? {
        info!("Email already registered");
        return Err(ApiError::Conflict("Email already registered").into());
    }

    let hashed = hash_password(&req.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        ApiError::internal(anyhow::anyhow!("password hashing failed: {e}"))
    })?;

    let user_id = insert_user(&req, &hashed, &ctx.pool).await?;

    // keep the filter and cache in step with the table
    ctx.email_filter.insert(&req.email);
    ctx.email_cache.mark_taken(&req.email).await;

    let user = fetch_user(&ctx.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("user {user_id} vanished after insert")))?;

    let tokens = issue_tokens(&user, &ctx).await?;

    info!(user_id, kind = %user.kind(), "Signup successful");

    Ok(HttpResponse::Created().json(AuthResponse {
        user,
        token: tokens.token,
        refresh_token: tokens.refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = Object),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(ctx, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    // 1️⃣ Basic validation
    Checks::new()
        .required(&user.email, "email", "Email is required")
        .required(&user.password, "password", "Password is required")
        .finish()?;

    // 2️⃣ Fetch user
    debug!("Fetching user from database");
    let row = match fetch_user_row_by_email(&ctx.pool, &user.email).await {
        Ok(Some(row)) => {
            debug!(user_id = row.id, "User found");
            row
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return Err(ApiError::Unauthorized("Invalid credentials").into());
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return Err(ApiError::from(e).into());
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&user.password, &row.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials").into());
    }
    debug!("Password verified");

    let user_id = row.id;
    let account = User::try_from(row).map_err(ApiError::from)?;

    // 4️⃣ Tokens
    let tokens = issue_tokens(&account, &ctx).await?;

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user_id)
        .execute(&ctx.pool)
        .await
    {
        warn!(error = %e, "Failed to update last_login_at");
    }
    ctx.email_cache.mark_taken(account.email()).await;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: account,
        token: tokens.token,
        refresh_token: tokens.refresh_token,
    }))
}

/// Session restore: the account behind the presented access token
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current account", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, ctx: web::Data<AppContext>) -> actix_web::Result<impl Responder> {
    let user = auth.load(&ctx.pool).await?;
    Ok(HttpResponse::Ok().json(user))
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token missing, invalid or revoked")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    let token = bearer(&req).ok_or(ApiError::Unauthorized("No token"))?;

    let claims = verify_token(token, &ctx.config.jwt_secret)
        .map_err(|_| ApiError::Unauthorized("Invalid token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("Invalid token type").into());
    }

    // 🔥 revoke the presented token; only one caller can win this update
    let revoked = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ? AND revoked = 0")
        .bind(&claims.jti)
        .execute(&ctx.pool)
        .await
        .map_err(ApiError::from)?;

    if revoked.rows_affected() == 0 {
        warn!(user_id = claims.user_id, "Refresh with unknown or revoked token");
        return Err(ApiError::Unauthorized("Token revoked").into());
    }

    let user = fetch_user(&ctx.pool, claims.user_id)
        .await?
        .ok_or(ApiError::Unauthorized("Account no longer exists"))?;

    // 🔄 issue new pair
    let tokens = issue_tokens(&user, &ctx).await?;

    Ok(HttpResponse::Ok().json(tokens))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Refresh token revoked (or nothing to do)"),
        (status = 500, description = "Token could not be revoked")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
) -> actix_web::Result<impl Responder> {
    // 1️⃣ only a valid refresh token can log out
    let claims = match bearer(&req).map(|t| verify_token(t, &ctx.config.jwt_secret)) {
        Some(Ok(c)) if c.token_type == TokenType::Refresh => c,
        _ => return Ok(HttpResponse::NoContent().finish()),
    };

    // 2️⃣ revoke refresh token; an unknown jti is not an error
    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(&ctx.pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = claims.user_id, "Failed to revoke refresh token");
            ApiError::from(e)
        })?;

    // 3️⃣ success (even if token didn't exist)
    Ok(HttpResponse::NoContent().finish())
}
