/// Liveness probe handler.
///
/// The service has no dependencies to check, so this only reports that the
/// process is serving requests.
pub async fn health_check() -> &'static str {
    "OK"
}
