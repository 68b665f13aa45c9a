use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Result};
use serde::Deserialize;

/// Name of the configuration file looked up in the project root when no
/// explicit `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pkgstage.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Client {
    /// Directory the toolchain is run in.
    pub source_dir: PathBuf,
    /// Directory the toolchain writes the package to. Defaults to
    /// `<source_dir>/pkg`.
    pub build_output_dir: Option<PathBuf>,
}

impl Default for Client {
    fn default() -> Self {
        Client {
            source_dir: PathBuf::from("client"),
            build_output_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Publish {
    pub dir: PathBuf,
}

impl Default for Publish {
    fn default() -> Self {
        Publish {
            dir: PathBuf::from("public/pkg"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Appended to `args` for development builds.
    pub dev_args: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            program: "wasm-pack".to_owned(),
            args: vec!["build".to_owned(), "--target".to_owned(), "web".to_owned()],
            dev_args: vec!["--dev".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            program: "cargo".to_owned(),
            args: vec!["run".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub client: Client,
    pub publish: Publish,
    pub toolchain: ToolchainConfig,
    pub service: ServiceConfig,
}

/// A [Config] whose directories have been made absolute against a project
/// root. This is what the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub build_output_dir: PathBuf,
    pub publish_dir: PathBuf,
    pub toolchain: ToolchainConfig,
    pub service: ServiceConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(err) => bail!("Could not read file `{}`: {}", path.display(), err),
        };

        match Config::from_toml_str(&contents) {
            Ok(config) => Ok(config),
            Err(err) => bail!("Unable to load data from `{}`: {}", path.display(), err),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.toolchain.program.trim().is_empty(),
            "toolchain.program must not be empty"
        );
        ensure!(
            !self.service.program.trim().is_empty(),
            "service.program must not be empty"
        );
        ensure!(
            !self.publish.dir.as_os_str().is_empty(),
            "publish.dir must not be empty"
        );

        ok!()
    }

    /// Resolves every directory against `root`. Absolute paths in the
    /// configuration are kept as they are.
    pub fn resolve(&self, root: &Path) -> ResolvedConfig {
        let source_dir = root.join(&self.client.source_dir);
        let build_output_dir = match &self.client.build_output_dir {
            Some(dir) => root.join(dir),
            None => source_dir.join("pkg"),
        };

        ResolvedConfig {
            root: root.to_path_buf(),
            source_dir,
            build_output_dir,
            publish_dir: root.join(&self.publish.dir),
            toolchain: self.toolchain.clone(),
            service: self.service.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_project_layout() {
        let resolved = Config::default().resolve(Path::new("/project"));

        assert_eq!(resolved.source_dir, Path::new("/project/client"));
        assert_eq!(resolved.build_output_dir, Path::new("/project/client/pkg"));
        assert_eq!(resolved.publish_dir, Path::new("/project/public/pkg"));
        assert_eq!(resolved.toolchain.program, "wasm-pack");
        assert_eq!(resolved.toolchain.args, ["build", "--target", "web"]);
        assert_eq!(resolved.toolchain.dev_args, ["--dev"]);
        assert_eq!(resolved.service.program, "cargo");
        assert_eq!(resolved.service.args, ["run"]);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [client]
            source_dir = "web"

            [service]
            program = "./target/release/server"
            args = []
            "#,
        )
        .unwrap();

        assert_eq!(config.client.source_dir, Path::new("web"));
        assert_eq!(config.publish, Publish::default());
        assert_eq!(config.toolchain, ToolchainConfig::default());
        assert!(config.service.args.is_empty());

        let resolved = config.resolve(Path::new("/p"));
        assert_eq!(resolved.build_output_dir, Path::new("/p/web/pkg"));
    }

    #[test]
    fn explicit_build_output_dir() {
        let config = Config::from_toml_str(
            r#"
            [client]
            build_output_dir = "dist/pkg"
            "#,
        )
        .unwrap();

        let resolved = config.resolve(Path::new("/p"));
        assert_eq!(resolved.source_dir, Path::new("/p/client"));
        assert_eq!(resolved.build_output_dir, Path::new("/p/dist/pkg"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let config = Config::from_toml_str(
            r#"
            [publish]
            dir = "/srv/www/pkg"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.resolve(Path::new("/p")).publish_dir,
            Path::new("/srv/www/pkg")
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(Config::from_toml_str("[client]\nsrc = \"x\"\n").is_err());
    }

    #[test]
    fn rejects_empty_program() {
        let err = Config::from_toml_str("[toolchain]\nprogram = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("toolchain.program"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Could not read file"));
    }
}
