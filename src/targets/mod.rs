//! Build target configuration
//!
//! Derives the two immutable target configurations (browser client and
//! server-rendering bundle) from the invocation flags. Derivation is pure and
//! cannot fail.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{BuildSettings, Config, TargetSettings};
use crate::plugins::{self, Generate, PluginSpec};

/// Mode switches taken from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Keep running and rebuild on source changes
    pub watch: bool,

    /// Production build: minify, drop development affordances
    pub deploy: bool,
}

/// The two build targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Client,
    Server,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Client => f.write_str("client"),
            Target::Server => f.write_str("server"),
        }
    }
}

/// Source map emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMapMode {
    None,
    /// Appended to each output file as a data URL
    Inline,
    /// Written next to each output file
    External,
}

impl SourceMapMode {
    /// esbuild's `sourcemap` option value
    fn to_esbuild(self) -> Value {
        match self {
            SourceMapMode::None => Value::Bool(false),
            SourceMapMode::Inline => Value::String("inline".to_string()),
            SourceMapMode::External => Value::Bool(true),
        }
    }
}

/// Output module format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    Esm,
    Cjs,
}

/// Runtime the bundle is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Browser,
    Node,
}

/// Everything the target builder needs besides the flags
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub build: BuildSettings,
    pub client: TargetSettings,
    pub server: TargetSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            build: BuildSettings::default(),
            client: TargetSettings::client_defaults(),
            server: TargetSettings::server_defaults(),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            build: config.build.clone(),
            client: config.client_settings(),
            server: config.server_settings(),
        }
    }
}

/// Complete configuration of one build target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub target: Target,
    pub entry_points: Vec<String>,
    /// Module resolution conditions, in priority order
    pub conditions: Vec<String>,
    pub outdir: PathBuf,
    pub minify: bool,
    pub sourcemap: SourceMapMode,
    pub format: ModuleFormat,
    pub platform: Platform,
    /// Emit lazily loadable shared chunks
    pub splitting: bool,
    pub plugins: Vec<PluginSpec>,
    pub es_target: String,
    pub alias: BTreeMap<String, String>,
    pub tsconfig: String,
    pub log_level: String,
}

impl TargetConfig {
    /// Render as an esbuild build options object (plugins excluded)
    pub fn to_esbuild_options(&self) -> Value {
        json!({
            "entryPoints": self.entry_points,
            "bundle": true,
            "minify": self.minify,
            "conditions": self.conditions,
            "alias": self.alias,
            "outdir": self.outdir.to_string_lossy(),
            "logLevel": self.log_level,
            "target": self.es_target,
            "splitting": self.splitting,
            "format": self.format,
            "platform": self.platform,
            "sourcemap": self.sourcemap.to_esbuild(),
            "tsconfig": self.tsconfig,
        })
    }
}

/// Derive the client and server configurations for one invocation
pub fn build_configs(flags: BuildFlags, settings: &PipelineSettings) -> (TargetConfig, TargetConfig) {
    let dev = !flags.deploy;

    let client = TargetConfig {
        target: Target::Client,
        entry_points: settings.client.entry_points.clone(),
        conditions: conditions(&["svelte", "browser"], dev),
        outdir: settings.client.outdir.clone(),
        minify: flags.deploy,
        sourcemap: if flags.watch {
            SourceMapMode::Inline
        } else {
            SourceMapMode::External
        },
        format: ModuleFormat::Esm,
        platform: Platform::Browser,
        splitting: true,
        plugins: plugins::default_chain(Generate::Client, dev),
        es_target: settings.client.es_target.clone(),
        alias: svelte_alias(),
        tsconfig: settings.build.tsconfig.clone(),
        log_level: settings.build.log_level.clone(),
    };

    // The server bundle is never minified and never gets a map file.
    let server = TargetConfig {
        target: Target::Server,
        entry_points: settings.server.entry_points.clone(),
        conditions: conditions(&["svelte"], dev),
        outdir: settings.server.outdir.clone(),
        minify: false,
        sourcemap: if flags.watch {
            SourceMapMode::Inline
        } else {
            SourceMapMode::None
        },
        format: ModuleFormat::Cjs,
        platform: Platform::Node,
        splitting: false,
        plugins: plugins::default_chain(Generate::Server, dev),
        es_target: settings.server.es_target.clone(),
        alias: svelte_alias(),
        tsconfig: settings.build.tsconfig.clone(),
        log_level: settings.build.log_level.clone(),
    };

    (client, server)
}

fn conditions(base: &[&str], dev: bool) -> Vec<String> {
    let mut conditions: Vec<String> = base.iter().map(|c| c.to_string()).collect();
    if dev {
        conditions.push("development".to_string());
    }
    conditions
}

/// Pin `svelte` to the single copy installed at the asset root
fn svelte_alias() -> BTreeMap<String, String> {
    BTreeMap::from([("svelte".to_string(), "svelte".to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::SvelteOptions;
    use pretty_assertions::assert_eq;

    fn all_flags() -> Vec<BuildFlags> {
        let mut flags = Vec::new();
        for watch in [false, true] {
            for deploy in [false, true] {
                flags.push(BuildFlags { watch, deploy });
            }
        }
        flags
    }

    fn derive(flags: BuildFlags) -> (TargetConfig, TargetConfig) {
        build_configs(flags, &PipelineSettings::default())
    }

    #[test]
    fn test_development_condition_follows_deploy() {
        for flags in all_flags() {
            let (client, server) = derive(flags);
            for config in [&client, &server] {
                let ends_dev = config.conditions.last().map(String::as_str) == Some("development");
                assert_eq!(ends_dev, !flags.deploy, "{:?} {}", flags, config.target);
            }
        }
    }

    #[test]
    fn test_condition_sequences() {
        let (client, server) = derive(BuildFlags::default());
        assert_eq!(client.conditions, vec!["svelte", "browser", "development"]);
        assert_eq!(server.conditions, vec!["svelte", "development"]);

        let (client, server) = derive(BuildFlags { watch: false, deploy: true });
        assert_eq!(client.conditions, vec!["svelte", "browser"]);
        assert_eq!(server.conditions, vec!["svelte"]);
    }

    #[test]
    fn test_minify() {
        for flags in all_flags() {
            let (client, server) = derive(flags);
            assert_eq!(client.minify, flags.deploy);
            assert!(!server.minify);
        }
    }

    #[test]
    fn test_sourcemap_modes() {
        for flags in all_flags() {
            let (client, server) = derive(flags);
            if flags.watch {
                assert_eq!(client.sourcemap, SourceMapMode::Inline);
                assert_eq!(server.sourcemap, SourceMapMode::Inline);
            } else {
                assert_eq!(client.sourcemap, SourceMapMode::External);
                assert_eq!(server.sourcemap, SourceMapMode::None);
            }
        }
    }

    #[test]
    fn test_plugin_chains() {
        let (client, server) = derive(BuildFlags { watch: true, deploy: true });

        assert_eq!(client.plugins.len(), 2);
        assert_eq!(client.plugins[0], PluginSpec::ImportGlob);
        match (&client.plugins[1], &server.plugins[1]) {
            (PluginSpec::Svelte(c), PluginSpec::Svelte(s)) => {
                assert_eq!(c.generate, Generate::Client);
                assert_eq!(s.generate, Generate::Server);
                assert!(!c.dev && !s.dev);
            }
            other => panic!("unexpected chain: {:?}", other),
        }

        let (client, _) = derive(BuildFlags::default());
        assert!(matches!(
            client.plugins[1],
            PluginSpec::Svelte(SvelteOptions { dev: true, .. })
        ));
    }

    #[test]
    fn test_fixed_target_shape() {
        for flags in all_flags() {
            let (client, server) = derive(flags);

            assert_eq!(client.entry_points, vec!["js/app.js", "js/sentry.js"]);
            assert_eq!(client.outdir, PathBuf::from("../priv/static/assets"));
            assert_eq!(client.format, ModuleFormat::Esm);
            assert_eq!(client.platform, Platform::Browser);
            assert!(client.splitting);

            assert_eq!(server.entry_points, vec!["js/server.js"]);
            assert_eq!(server.outdir, PathBuf::from("../priv/svelte"));
            assert_eq!(server.format, ModuleFormat::Cjs);
            assert_eq!(server.platform, Platform::Node);
            assert!(!server.splitting);
        }
    }

    #[test]
    fn test_esbuild_options() {
        let (client, server) = derive(BuildFlags { watch: false, deploy: true });

        let options = client.to_esbuild_options();
        assert_eq!(options["sourcemap"], json!(true));
        assert_eq!(options["format"], json!("esm"));
        assert_eq!(options["target"], json!("es2022"));
        assert_eq!(options["alias"], json!({ "svelte": "svelte" }));
        assert_eq!(options["minify"], json!(true));

        let options = server.to_esbuild_options();
        assert_eq!(options["sourcemap"], json!(false));
        assert_eq!(options["platform"], json!("node"));
        assert_eq!(options["outdir"], json!("../priv/svelte"));

        let (client, _) = derive(BuildFlags { watch: true, deploy: false });
        assert_eq!(client.to_esbuild_options()["sourcemap"], json!("inline"));
    }
}
