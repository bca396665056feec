mod axum_tests;
pub(crate) mod server_tests;
