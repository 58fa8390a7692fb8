use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;
use uuid::Uuid;

use crate::core::config::Settings;

/// Prefix of every object key this service hands out for recordings.
pub(crate) const AUDIO_KEY_PREFIX: &str = "audio/";

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    /// Returns `None` when no S3 credentials are configured.
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let s3 = settings.s3();
        if s3.access_key.is_empty() || s3.secret_key.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "langexam-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(s3.endpoint.clone())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        Ok(Some(Self { client: Client::new(&config), bucket: s3.bucket.clone() }))
    }

    pub(crate) async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }

    pub(crate) async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> anyhow::Result<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(PresigningConfig::expires_in(expires_in)?)
            .await?;

        Ok(presigned.uri().to_string())
    }
}

pub(crate) fn audio_object_key(user_id: &str, extension: &str) -> String {
    format!("{AUDIO_KEY_PREFIX}{user_id}/{}.{extension}", Uuid::new_v4())
}

/// Audio references without a URL scheme are object keys in our bucket.
pub(crate) fn is_storage_key(reference: &str) -> bool {
    !reference.contains("://")
}

/// Whether `key` lies under the upload prefix handed out to `user_id`.
pub(crate) fn is_owned_audio_key(user_id: &str, key: &str) -> bool {
    let Some(rest) = key.strip_prefix(AUDIO_KEY_PREFIX) else {
        return false;
    };
    let Some(name) = rest.strip_prefix(user_id).and_then(|rest| rest.strip_prefix('/')) else {
        return false;
    };
    !user_id.is_empty() && !name.is_empty() && !key.split('/').any(|part| part == "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn audio_keys_are_scoped_per_user() {
        let key = audio_object_key("user-1", "webm");
        assert!(key.starts_with("audio/user-1/"));
        assert!(key.ends_with(".webm"));
        assert!(is_storage_key(&key));
    }

    #[test]
    fn urls_are_not_storage_keys() {
        assert!(!is_storage_key("https://cdn.example.com/a.mp3"));
        assert!(!is_storage_key("s3://bucket/a.mp3"));
        assert!(is_storage_key("recordings/a.mp3"));
    }

    #[test]
    fn audio_key_ownership_follows_user_prefix() {
        let key = audio_object_key("user-1", "mp3");
        assert!(is_owned_audio_key("user-1", &key));
        assert!(!is_owned_audio_key("user-2", &key));
        assert!(!is_owned_audio_key("user", &key));
        assert!(!is_owned_audio_key("user-1", "audio/user-1/"));
        assert!(!is_owned_audio_key("user-1", "audio/user-1/../user-2/a.mp3"));
        assert!(!is_owned_audio_key("user-1", "recordings/user-1/a.mp3"));
    }

    #[tokio::test]
    async fn presign_put_and_get_return_urls() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_storage_env();

        let settings = crate::core::config::Settings::load().expect("settings");
        let storage = StorageService::from_settings(&settings)
            .await
            .expect("storage")
            .expect("storage enabled");

        let key = audio_object_key("user-1", "mp3");
        let put_url = storage
            .presign_put(&key, "audio/mpeg", Duration::from_secs(300))
            .await
            .expect("presign put");
        let get_url =
            storage.presign_get(&key, Duration::from_secs(300)).await.expect("presign get");

        assert!(put_url.contains("user-1"));
        assert!(get_url.contains("user-1"));
    }

    #[tokio::test]
    async fn missing_credentials_disable_storage() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = crate::core::config::Settings::load().expect("settings");
        assert!(StorageService::from_settings(&settings).await.expect("storage").is_none());
    }
}
