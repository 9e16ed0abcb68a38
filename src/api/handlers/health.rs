/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is running", body = String)),
    tag = "health"
)]
pub async fn health_check() -> &'static str {
    "OK"
}
