#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_add_professor, api_add_student, api_add_subject, api_assign_subject, api_change_password,
    api_delete_account, api_delete_assignment, api_delete_enrollment, api_delete_subject,
    api_edit_professor, api_edit_student, api_enroll_student, api_get_accounts,
    api_get_assignments, api_get_prof_subject, api_get_professor_students,
    api_get_professor_subjects, api_get_student_grades, api_get_subjects, api_login, api_logout,
    api_me, api_me_unauthorized, api_search_student, api_update_grades, health,
};
use auth::{forbidden_api, unauthorized_api};
use db::{clean_expired_sessions, ensure_admin_account};
use env::load_environment;
use error::AppError;
use rocket::{Build, Rocket, tokio};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    init_tracing();

    if let Err(e) = load_environment() {
        error!("Failed to load environment files: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://school_portal.db?mode=rwc".to_string());

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    // No API route can create an admin account, so a fresh database gets one
    // from the environment.
    let admin_username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    match ensure_admin_account(&pool, &admin_username, &admin_password).await {
        Ok(true) => info!("Bootstrap admin account created"),
        Ok(false) => {}
        Err(e) => error!("Failed to seed admin account: {}", e),
    }

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting school portal");

    rocket::build()
        .manage(pool)
        .mount("/", routes![api_login])
        .mount(
            "/api",
            routes![
                api_me,
                api_me_unauthorized,
                api_logout,
                api_change_password,
                api_get_accounts,
                api_add_professor,
                api_add_student,
                api_edit_professor,
                api_edit_student,
                api_delete_account,
                api_get_subjects,
                api_add_subject,
                api_delete_subject,
                api_assign_subject,
                api_get_assignments,
                api_delete_assignment,
                api_get_professor_students,
                api_get_professor_subjects,
                api_search_student,
                api_enroll_student,
                api_update_grades,
                api_delete_enrollment,
                api_get_prof_subject,
                api_get_student_grades,
            ],
        )
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
}
