//! # Paygate RS
//!
//! Multi-provider payment gateway.
//!
//! ## Usage
//!
//! ```bash
//! # Provider secrets (override config/payments.toml)
//! export PAYSTACK_SECRET_KEY=sk_test_...
//! export STRIPE_SECRET_KEY=sk_test_...
//!
//! # Run the server
//! paygate
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Default provider: {}", state.manager.default_provider());
    info!(
        "Enabled providers: {:?}",
        state.manager.enabled_providers()
    );

    let app = routes::create_router(state);

    info!("Paygate starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/payments/health", addr);
        info!("Charge: POST http://{}/payments/charge", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  Paygate RS
  ━━━━━━━━━━━━━━━━━━━━━━━
  Multi-provider payments
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
