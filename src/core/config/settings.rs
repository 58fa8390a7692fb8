use super::parsing::{
    env_optional, env_or_default, is_supported_audio_extension, parse_assessment_mode, parse_bool,
    parse_cors_origins, parse_environment, parse_string_list, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    ApiSettings, AssessmentMode, AssessmentSettings, ConfigError, CorsSettings, DatabaseSettings,
    RedisSettings, RuntimeSettings, S3Settings, SecuritySettings, ServerHost, ServerPort,
    ServerSettings, Settings, StorageSettings, TelemetrySettings,
};

const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "webm", "m4a"];

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("LANGEXAM_HOST", "0.0.0.0");
        let port = env_or_default("LANGEXAM_PORT", "8000");

        let environment = parse_environment(
            env_optional("LANGEXAM_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("LANGEXAM_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Language Exam API");
        let service_name = env_or_default("SERVICE_NAME", "langexam");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "10080"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "langexam");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "langexam_db");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DATABASE_MAX_CONNECTIONS", env_or_default("DATABASE_MAX_CONNECTIONS", "20"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let assessment_mode = parse_assessment_mode(env_optional("ASSESSMENT_MODE"), environment)?;
        let assessment_base_url = env_or_default("ASSESSMENT_BASE_URL", "");
        let assessment_api_key = env_or_default("ASSESSMENT_API_KEY", "");
        let assessment_timeout = parse_u64(
            "ASSESSMENT_TIMEOUT_SECONDS",
            env_or_default("ASSESSMENT_TIMEOUT_SECONDS", "600"),
        )?;
        let stale_submission_minutes = parse_u64(
            "STALE_SUBMISSION_MINUTES",
            env_or_default("STALE_SUBMISSION_MINUTES", "30"),
        )?;

        let allowed_audio_extensions =
            parse_string_list(env_optional("ALLOWED_AUDIO_EXTENSIONS"), DEFAULT_AUDIO_EXTENSIONS);
        let presigned_url_expire_minutes = parse_u64(
            "PRESIGNED_URL_EXPIRE_MINUTES",
            env_or_default("PRESIGNED_URL_EXPIRE_MINUTES", "15"),
        )?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://storage.yandexcloud.net");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "langexam-audio");
        let s3_region = env_or_default("S3_REGION", "ru-central1");

        let log_level = env_or_default("LANGEXAM_LOG_LEVEL", "info");
        let json = env_optional("LANGEXAM_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings { host: ServerHost::parse(host)?, port: ServerPort::parse(port)? },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, service_name, version, api_v1_str },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            assessment: AssessmentSettings {
                mode: assessment_mode,
                base_url: assessment_base_url,
                api_key: assessment_api_key,
                timeout_seconds: assessment_timeout,
                stale_submission_minutes,
            },
            storage: StorageSettings { allowed_audio_extensions, presigned_url_expire_minutes },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn assessment(&self) -> &AssessmentSettings {
        &self.assessment
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.allowed_audio_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_AUDIO_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }
        for extension in &self.storage.allowed_audio_extensions {
            if !is_supported_audio_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_AUDIO_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.assessment.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ASSESSMENT_TIMEOUT_SECONDS",
                value: String::from("0"),
            });
        }

        // The startup sweep must not fail rows another replica is still assessing.
        if self.assessment.stale_submission_minutes.saturating_mul(60)
            <= self.assessment.timeout_seconds
        {
            return Err(ConfigError::InvalidValue {
                field: "STALE_SUBMISSION_MINUTES",
                value: self.assessment.stale_submission_minutes.to_string(),
            });
        }

        if self.assessment.mode == AssessmentMode::Remote && self.assessment.base_url.is_empty() {
            return Err(ConfigError::MissingSecret("ASSESSMENT_BASE_URL"));
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        if self.assessment.mode == AssessmentMode::Remote && self.assessment.api_key.is_empty() {
            return Err(ConfigError::MissingSecret("ASSESSMENT_API_KEY"));
        }

        if self.s3.access_key.is_empty() || self.s3.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }

        Ok(())
    }
}
