//! Mock identity providers for testing.

mod oauth2;

pub use oauth2::MockOAuth2Provider;
use warden_core::OAuth2Service;

/// Creates an OAuth2 service backed by a mock provider that knows no
/// tokens, so every access token is rejected.
pub fn create_mock_oauth2_service() -> OAuth2Service {
    OAuth2Service::new(MockOAuth2Provider::default())
}
