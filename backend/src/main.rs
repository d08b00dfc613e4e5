use backend::{app, AppState, PickerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = PickerConfig::from_env();
    let state = AppState::new(&config)
        .await
        .expect("invalid participant names");
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .expect("bind");
    tracing::info!(addr = %config.bind_addr, "gift picker listening");
    axum::serve(listener, app).await.expect("server error");
}
