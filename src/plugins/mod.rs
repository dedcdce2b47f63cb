//! Plugin chain descriptors
//!
//! The plugins themselves are esbuild JavaScript plugins. Each target carries
//! an ordered list of descriptors which the engine turns into plugin
//! instances.

use serde::{Deserialize, Serialize};

/// Which kind of code the Svelte compiler emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generate {
    /// Browser-executable components
    Client,
    /// Server-side rendering components
    Server,
}

/// How component styles are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssMode {
    /// Styles injected by the component at runtime
    Injected,
}

/// Svelte compiler plugin options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvelteOptions {
    pub generate: Generate,

    /// Development mode (runtime checks, dev warnings)
    pub dev: bool,

    pub css: CssMode,

    /// Run svelte-preprocess before compiling
    pub preprocess: bool,
}

/// One entry of a target's plugin chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum PluginSpec {
    /// Glob imports (`import * as pages from "./pages/**/*.svelte"`)
    ImportGlob,
    /// Svelte component compiler
    Svelte(SvelteOptions),
}

impl PluginSpec {
    /// Plugin name for logging and debugging
    pub fn name(&self) -> &'static str {
        match self {
            PluginSpec::ImportGlob => "import-glob",
            PluginSpec::Svelte(_) => "svelte",
        }
    }
}

/// Standard plugin chain: glob import aggregation, then the component compiler
pub fn default_chain(generate: Generate, dev: bool) -> Vec<PluginSpec> {
    vec![
        PluginSpec::ImportGlob,
        PluginSpec::Svelte(SvelteOptions {
            generate,
            dev,
            css: CssMode::Injected,
            preprocess: true,
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order() {
        let chain = default_chain(Generate::Server, false);
        let names: Vec<_> = chain.iter().map(PluginSpec::name).collect();

        assert_eq!(names, vec!["import-glob", "svelte"]);
    }

    #[test]
    fn test_descriptor_json() {
        let chain = default_chain(Generate::Client, true);
        let json = serde_json::to_value(&chain).unwrap();

        assert_eq!(json[0], serde_json::json!({ "name": "import-glob" }));
        assert_eq!(
            json[1],
            serde_json::json!({
                "name": "svelte",
                "generate": "client",
                "dev": true,
                "css": "injected",
                "preprocess": true
            })
        );
    }
}
