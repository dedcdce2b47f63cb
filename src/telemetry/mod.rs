//! Error telemetry initialization
//!
//! Builds the Sentry configuration the shipped application starts with. The
//! endpoint comes from the page at load time, never from the build, so the
//! same bundle runs against any environment. Both the page and the Sentry
//! client are passed in.

mod document;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

pub use document::HtmlDocument;

/// Meta tag carrying the endpoint
pub const DSN_META_NAME: &str = "sentry-dsn";

/// Default module URL for the remote profile
pub const DEFAULT_SDK_URL: &str = "https://browser.sentry-cdn.com/8.55.0/bundle.tracing.min.js";

/// Read access to the running page
pub trait DocumentAttributes {
    /// `content` of the first `<meta name="{name}">` tag
    fn meta_content(&self, name: &str) -> Option<String>;
}

/// The telemetry SDK's setup entry point
pub trait TelemetryClient {
    fn init(&self, config: &TelemetryConfig);
}

/// Optional telemetry features
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Performance tracing
    Tracing,
    /// Session replay
    Replay,
}

/// How the SDK reaches the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "lowercase")]
pub enum SdkLoading {
    /// Compiled into the client bundle
    Bundled,
    /// Imported from a module URL at runtime
    Remote(Url),
}

/// A deployment profile: where the SDK comes from and what it turns on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryProfile {
    pub loading: SdkLoading,
    pub capabilities: BTreeSet<Capability>,
}

impl TelemetryProfile {
    /// SDK bundled with the app, tracing and session replay
    pub fn bundled() -> Self {
        Self {
            loading: SdkLoading::Bundled,
            capabilities: BTreeSet::from([Capability::Tracing, Capability::Replay]),
        }
    }

    /// SDK loaded from `sdk_url`, tracing only
    pub fn remote(sdk_url: Url) -> Self {
        Self {
            loading: SdkLoading::Remote(sdk_url),
            capabilities: BTreeSet::from([Capability::Tracing]),
        }
    }
}

/// One enabled SDK integration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Integration {
    BrowserTracing,
    #[serde(rename_all = "camelCase")]
    Replay {
        mask_all_text: bool,
        block_all_media: bool,
    },
}

/// Configuration handed to the SDK
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Endpoint, exactly as the page provided it
    pub dsn: Option<String>,
    pub traces_sample_rate: f64,
    pub replays_session_sample_rate: f64,
    pub replays_on_error_sample_rate: f64,
    pub integrations: Vec<Integration>,
}

/// Configures the telemetry client once at application startup
#[derive(Debug, Clone)]
pub struct TelemetryInitializer {
    profile: TelemetryProfile,
}

impl TelemetryInitializer {
    pub fn new(profile: TelemetryProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &TelemetryProfile {
        &self.profile
    }

    /// Build the configuration for `document`
    pub fn config_for(&self, document: &dyn DocumentAttributes) -> TelemetryConfig {
        let dsn = document.meta_content(DSN_META_NAME);
        if dsn.is_none() {
            // The SDK stays disabled without a DSN.
            warn!("No <meta name=\"{}\"> on the page", DSN_META_NAME);
        }

        let integrations = self
            .profile
            .capabilities
            .iter()
            .map(|capability| match capability {
                Capability::Tracing => Integration::BrowserTracing,
                Capability::Replay => Integration::Replay {
                    mask_all_text: false,
                    block_all_media: false,
                },
            })
            .collect();

        TelemetryConfig {
            dsn,
            traces_sample_rate: 1.0,
            replays_session_sample_rate: 0.1,
            replays_on_error_sample_rate: 1.0,
            integrations,
        }
    }

    /// Hand the configuration to `client`. Called once per page load.
    pub fn initialize(&self, document: &dyn DocumentAttributes, client: &dyn TelemetryClient) {
        let config = self.config_for(document);
        debug!(loading = ?self.profile.loading, "Initializing telemetry");
        client.init(&config);
    }
}
