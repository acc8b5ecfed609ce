#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use uuid::Uuid;

pub const JWT_KEY: &str = "integration-secret";
pub const PASSWORD: &str = "pikachu";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub images: tempfile::TempDir,
    child: Child,
}

impl TestServer {
    fn spawn(database_url: &str) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let images = tempfile::tempdir().context("failed to create image directory")?;

        let child = Command::new(env!("CARGO_BIN_EXE_pokedex-api"))
            .arg("serve")
            .env("PORT_API", port.to_string())
            .env("BASE_URL", &base_url)
            .env("DATABASE_URL", database_url)
            .env("JWT_KEY", JWT_KEY)
            .env("IMAGES_DIR", images.path())
            .env("APP_ENV", "development")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            images,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

/// Seeded rows owned by one test.
pub struct Fixture {
    pub email: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub type_ids: Vec<Uuid>,
}

/// Everything a test needs, or `None` when no database is configured.
pub struct Env {
    pub server: &'static TestServer,
    pub pool: PgPool,
    pub client: reqwest::Client,
}

pub async fn setup() -> Result<Option<Env>> {
    let _ = dotenvy::dotenv();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("failed to connect to test database")?;
    // Tests run in parallel; serialize schema setup.
    let mut conn = pool.acquire().await?;
    (&mut *conn).execute("SELECT pg_advisory_lock(72616)").await?;
    let applied = (&mut *conn).execute(include_str!("../../schema/pokedex.sql")).await;
    (&mut *conn).execute("SELECT pg_advisory_unlock(72616)").await?;
    applied.context("failed to apply schema")?;
    drop(conn);

    let server = SERVER.get_or_init(|| TestServer::spawn(&database_url).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;

    Ok(Some(Env {
        server,
        pool,
        client: reqwest::Client::new(),
    }))
}

impl Env {
    /// A user holding `permissions`, plus a fresh category and `types` monster types.
    pub async fn seed(&self, permissions: &[&str], types: usize) -> Result<Fixture> {
        let tag = Uuid::new_v4().simple().to_string();

        let role_id: Uuid = sqlx::query_scalar("INSERT INTO roles (name) VALUES ($1) RETURNING id")
            .bind(format!("role-{}", tag))
            .fetch_one(&self.pool)
            .await?;
        for name in permissions {
            let permission_id: Uuid =
                sqlx::query_scalar("INSERT INTO permissions (name, action) VALUES ($1, 'ANY') RETURNING id")
                    .bind(*name)
                    .fetch_one(&self.pool)
                    .await?;
            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
                .bind(role_id)
                .bind(permission_id)
                .execute(&self.pool)
                .await?;
        }

        let email = format!("trainer-{}@pallet.town", tag);
        let hash = bcrypt::hash(PASSWORD, 4)?;
        sqlx::query("INSERT INTO users (name, email, encrypted_password, role_id) VALUES ($1, $2, $3, $4)")
            .bind("Trainer")
            .bind(&email)
            .bind(hash)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        let category_name = format!("Category {}", tag);
        let category_id: Uuid = sqlx::query_scalar("INSERT INTO monster_categories (name) VALUES ($1) RETURNING id")
            .bind(&category_name)
            .fetch_one(&self.pool)
            .await?;

        let mut type_ids = Vec::with_capacity(types);
        for i in 0..types {
            let id: Uuid = sqlx::query_scalar("INSERT INTO monster_types (name) VALUES ($1) RETURNING id")
                .bind(format!("Type {} {}", i, tag))
                .fetch_one(&self.pool)
                .await?;
            type_ids.push(id);
        }

        Ok(Fixture {
            email,
            category_id,
            category_name,
            type_ids,
        })
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.server.url("/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }

    /// Multipart form for a monster in the fixture's category and types.
    pub fn monster_form(&self, fixture: &Fixture, name: &str) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .text("monster_category_id", fixture.category_id.to_string())
            .text("description", format!("{} lives in tall grass", name))
            .text("length", "0.7")
            .text("weight", "7")
            .text("hp", "45")
            .text("attack", "49")
            .text("defends", "49")
            .text("speed", "45");
        for (i, id) in fixture.type_ids.iter().enumerate() {
            form = form.text(format!("monster_type_id[{}]", i), id.to_string());
        }
        form
    }

    pub async fn create_monster(&self, token: &str, form: reqwest::multipart::Form) -> Result<Uuid> {
        let res = self
            .client
            .post(self.server.url("/monster"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        let body: Value = res.json().await?;
        let id = body["data"]["id"].as_str().context("create response carried no id")?;
        Ok(Uuid::parse_str(id)?)
    }
}

pub fn png_part(file_name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("valid mime")
}
