use super::pubsub_client::handshake;
use super::{RelayPublisher, subscribe};
use crate::utils::error::RelayError;

#[test]
fn test_handshake_messages() {
    let publisher = handshake(true);
    assert_eq!(publisher.to_text().unwrap(), r#"{"sender":true}"#);
    let subscriber = handshake(false);
    assert_eq!(subscriber.to_text().unwrap(), r#"{"sender":false}"#);
}

#[tokio::test]
async fn test_connect_rejects_bad_urls() {
    assert!(matches!(
        RelayPublisher::connect("not a url").await,
        Err(RelayError::InvalidUrl(_))
    ));
    assert!(matches!(
        subscribe("http://127.0.0.1:1/").await,
        Err(RelayError::InvalidUrl(_))
    ));
}
