use drawdash::{color, routes, state};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");
    let background = std::env::var("CANVAS_BACKGROUND")
        .unwrap_or_else(|_| color::DEFAULT_BACKGROUND.into());

    let state = state::AppState::new(color::normalize_hex_color(&background, color::DEFAULT_BACKGROUND));

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "drawdash listening");
    axum::serve(listener, app).await.expect("server failed");
}
