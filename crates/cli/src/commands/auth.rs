//! Account commands against a running woo-bridge server.
//!
//! # Usage
//!
//! ```bash
//! woo-bridge auth register -n "Ada" -e ada@example.com -p 'correct horse'
//! woo-bridge auth login -e ada@example.com -p 'correct horse'
//! woo-bridge auth whoami
//! woo-bridge auth logout
//! ```

use crate::client::{ApiClient, ClientError, RegisterRequest};

/// Create an account and keep its token.
///
/// # Errors
///
/// Returns the API error, including per-field validation failures.
pub async fn register(
    client: &ApiClient,
    name: &str,
    email: &str,
    password: &str,
    password_confirmation: Option<&str>,
) -> Result<(), ClientError> {
    let response = client
        .register(&RegisterRequest {
            name,
            email,
            password,
            password_confirmation,
        })
        .await?;

    tracing::info!("{} (user #{})", response.message, response.user.id);
    Ok(())
}

/// Log in and keep the issued token.
///
/// # Errors
///
/// Returns `ClientError::Unauthenticated` for wrong credentials.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> Result<(), ClientError> {
    let response = client.login(email, password).await?;
    tracing::info!("{} as {}", response.message, response.user.email);
    Ok(())
}

/// Revoke the stored token and forget it locally.
///
/// # Errors
///
/// Returns the API error; the local session is cleared regardless.
pub async fn logout(client: &ApiClient) -> Result<(), ClientError> {
    let response = client.logout().await?;
    tracing::info!(
        "{} (removed {})",
        response.message,
        client.tokens().path().display()
    );
    Ok(())
}

/// Print the account the stored token belongs to.
///
/// # Errors
///
/// Returns `ClientError::Unauthenticated` without a valid session.
pub async fn whoami(client: &ApiClient) -> Result<(), ClientError> {
    let user = client.get_user().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{} <{}> (user #{})", user.name, user.email, user.id);
    }
    Ok(())
}
