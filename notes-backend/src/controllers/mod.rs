use actix_web::web;

use crate::error::NotesError;

/// Build an initialized test service with every route and the shared JSON config.
#[cfg(test)]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .app_data($crate::controllers::json_config())
                .configure($crate::controllers::health::config_routes)
                .configure($crate::controllers::auth::config)
                .configure($crate::controllers::notes::config),
        )
        .await
    };
}

pub mod auth;
pub mod health;
pub mod notes;

/// Malformed or incomplete JSON bodies are validation errors, reported in
/// the same `{error, code}` shape as everything else.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err, _req| NotesError::Validation(err.to_string()).into())
}
