use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// One stateless translation request: text plus a language pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub text: String,
    /// Source language, or `"auto"` to let the backend detect it.
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub translated_text: String,
    /// Whether the response was served from the local cache.
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateError {
    pub kind: TranslateFailureKind,
    pub message: String,
}

impl TranslateError {
    pub(crate) fn new(kind: TranslateFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateFailureKind {
    /// No auth key configured. Surfaced through the settings test surface
    /// only; never retried.
    MissingCredentials,
    InvalidEndpoint,
    HttpStatus(u16),
    MalformedResponse,
    Network,
}

impl TranslateFailureKind {
    /// Configuration problems do not heal on their own; everything else is
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TranslateFailureKind::MissingCredentials | TranslateFailureKind::InvalidEndpoint
        )
    }
}

impl fmt::Display for TranslateFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslateFailureKind::MissingCredentials => write!(f, "missing credentials"),
            TranslateFailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
            TranslateFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            TranslateFailureKind::MalformedResponse => write!(f, "malformed response"),
            TranslateFailureKind::Network => write!(f, "network error"),
        }
    }
}

#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, TranslateError>;
}

#[derive(Debug, Clone)]
pub struct DeepLSettings {
    pub endpoint: String,
    pub auth_key: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DeepLSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api-free.deepl.com/v2/translate".to_string(),
            auth_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// DeepL-backed translator: a form-encoded POST per request.
#[derive(Debug, Clone)]
pub struct DeepLTranslator {
    settings: DeepLSettings,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

impl DeepLTranslator {
    pub fn new(settings: DeepLSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, TranslateError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| TranslateError::new(TranslateFailureKind::Network, err.to_string()))
    }
}

/// DeepL expects uppercase codes and supports regional variants (EN-GB,
/// PT-BR); underscores are tolerated on input.
fn normalize_lang(lang: &str) -> Option<String> {
    let normalized = lang.trim().replace('_', "-").to_uppercase();
    (!normalized.is_empty()).then_some(normalized)
}

#[async_trait::async_trait]
impl Translator for DeepLTranslator {
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, TranslateError> {
        let key = self.settings.auth_key.trim();
        if key.is_empty() {
            return Err(TranslateError::new(
                TranslateFailureKind::MissingCredentials,
                "DeepL auth key is required (set it in the options)",
            ));
        }
        let endpoint = url::Url::parse(&self.settings.endpoint).map_err(|err| {
            TranslateError::new(TranslateFailureKind::InvalidEndpoint, err.to_string())
        })?;

        let target = normalize_lang(&request.target_lang).unwrap_or_else(|| "EN".to_string());
        let mut params = vec![
            ("auth_key", key.to_string()),
            ("text", request.text.clone()),
            ("target_lang", target),
        ];
        if let Some(source) = normalize_lang(&request.source_lang) {
            if source != "AUTO" {
                params.push(("source_lang", source));
            }
        }

        let client = self.build_client()?;
        let response = client
            .post(endpoint)
            .form(&params)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::new(
                TranslateFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.text().await.map_err(map_reqwest_error)?;
        let decoded: DeepLResponse = serde_json::from_str(&body).map_err(|err| {
            TranslateError::new(TranslateFailureKind::MalformedResponse, err.to_string())
        })?;
        let translated_text = decoded
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| {
                TranslateError::new(
                    TranslateFailureKind::MalformedResponse,
                    "response carried no translations",
                )
            })?;

        Ok(Translation {
            translated_text,
            cached: false,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TranslateError {
    TranslateError::new(TranslateFailureKind::Network, err.to_string())
}

/// Identity backend: echoes the input. Useful for demos without credentials
/// and for exercising the placeholder round trip.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoTranslator;

#[async_trait::async_trait]
impl Translator for EchoTranslator {
    async fn translate(&self, request: &TranslateRequest) -> Result<Translation, TranslateError> {
        Ok(Translation {
            translated_text: request.text.clone(),
            cached: false,
        })
    }
}
