pub mod auth;
pub mod email;
pub mod stats;
pub mod types;

use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_sesv2::Client as SesClient;

/// Clients built once at cold start and shared across invocations
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub cognito_client: CognitoClient,
    pub ses_client: SesClient,
}

pub use hrhub_atoms::users;
