use lambda_http::{Error, Request, run, service_fn};
use maildest_auth::AuthContext;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    info!("Starting Maildest auth Lambda function");

    // Initialize auth context
    let ctx = AuthContext::new().await?;

    // Run the Lambda runtime with our handler
    run(service_fn(|event: Request| {
        let ctx = ctx.clone();
        async move { maildest_auth::handler(ctx, event).await }
    }))
    .await
}
