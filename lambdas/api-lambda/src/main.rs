mod http_handler;

use std::sync::Arc;

use http_handler::function_handler;
use hrhub_shared::AppState;
use lambda_http::{run, service_fn, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_http::tracing::init_default_subscriber();

    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let state = Arc::new(AppState {
        dynamo_client: aws_sdk_dynamodb::Client::new(&config),
        cognito_client: aws_sdk_cognitoidentityprovider::Client::new(&config),
        ses_client: aws_sdk_sesv2::Client::new(&config),
    });

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { function_handler(event, state).await }
    }))
    .await
}
