#![allow(dead_code)]

use reqwest::{redirect, Client, Response};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};
use tokio::sync::OnceCell;
use yatube::config::{media::MediaConfig, site::SiteConfig};
use yatube::services::cache::CacheService;

static INIT: Once = Once::new();
static MIGRATIONS: OnceCell<()> = OnceCell::const_new();
static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        let config = yatube::config::jwt::JwtConfig::from_env().unwrap();
        let _ = yatube::utils::jwt::init_jwt_config(config);
    });
}

/// Unique suffix so tests sharing one database never collide.
pub fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, n, &salt[..8])
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub site: SiteConfig,
}

pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub token: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        request.send().await.expect("GET failed")
    }

    pub async fn post_form(
        &self,
        path: &str,
        user: Option<&TestUser>,
        form: &[(&str, &str)],
    ) -> Response {
        let mut request = self.client.post(self.url(path)).form(form);
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        request.send().await.expect("POST failed")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(SiteConfig {
        // large pages keep rows from concurrently running tests on page 1
        posts_per_page: 1000,
        ..SiteConfig::default()
    })
    .await
}

pub async fn spawn_app_with(site: SiteConfig) -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    MIGRATIONS
        .get_or_init(|| async {
            yatube::migration::Migrator::up(&db, None)
                .await
                .expect("Failed to run migrations");
        })
        .await;

    let media = MediaConfig {
        media_dir: std::env::temp_dir()
            .join("yatube-test-media")
            .to_string_lossy()
            .to_string(),
    };

    let app = yatube::routes::create_routes()
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(CacheService::in_memory()))
        .layer(axum::extract::Extension(site.clone()))
        .layer(axum::extract::Extension(media));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to build client");

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client,
        site,
    }
}

/// Sign a user up through the form and return their id and session token.
pub async fn create_test_user(app: &TestApp, prefix: &str) -> TestUser {
    let username = unique(prefix);
    let email = format!("{}@test.com", username);

    let resp = app
        .post_form(
            "/auth/signup/",
            None,
            &[
                ("username", username.as_str()),
                ("email", email.as_str()),
                ("password", "test_password_123"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 302, "signup of '{}' failed", username);

    let cookie = resp
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("access_token="))
        .and_then(|v| v.split(';').next())
        .expect("signup did not set a session cookie")
        .to_string();

    let id = user_id(&app.db, &username).await;
    TestUser {
        id,
        username,
        token: cookie,
    }
}

pub async fn user_id(db: &DatabaseConnection, username: &str) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT id FROM users WHERE username = $1",
            vec![username.into()],
        ))
        .await
        .expect("user lookup failed")
        .expect("user row missing");
    row.try_get_by_index(0).unwrap()
}

/// Make a user admin by directly updating the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = 'admin' WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user admin");
}

/// Create a group as `admin` and return its JSON.
pub async fn create_test_group(app: &TestApp, admin: &TestUser, slug: &str) -> serde_json::Value {
    let resp = app
        .post_form(
            "/groups/",
            Some(admin),
            &[
                ("title", "Тестовая группа"),
                ("slug", slug),
                ("description", "Тестовое описание"),
            ],
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["data"].clone()
}

/// Publish a post through the create form and return its id.
pub async fn create_test_post(app: &TestApp, author: &TestUser, text: &str) -> i32 {
    let resp = app
        .post_form("/create/", Some(author), &[("text", text), ("group", "")])
        .await;
    assert_eq!(resp.status(), 302);

    let row = app
        .db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT id FROM posts WHERE author_id = $1 AND text = $2 ORDER BY id DESC LIMIT 1",
            vec![author.id.into(), text.into()],
        ))
        .await
        .expect("post lookup failed")
        .expect("post row missing");
    row.try_get_by_index(0).unwrap()
}

pub async fn count(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) -> i64 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            sql,
            values,
        ))
        .await
        .expect("count query failed")
        .expect("count row missing");
    row.try_get_by_index(0).unwrap()
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
