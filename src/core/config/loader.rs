use std::{fs, path::Path};

use tracing::debug;

use super::{ConfigError, ConfigPaths, Settings};
use crate::path::PathExpander;

pub struct ConfigLoader<'a> {
    paths: &'a ConfigPaths,
    expander: &'a PathExpander,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(paths: &'a ConfigPaths, expander: &'a PathExpander) -> Self {
        Self { paths, expander }
    }

    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::defaults(&self.paths.launch_dir);
        if let Some(rc_path) = &self.paths.rc_path {
            self.source_if_exists(rc_path, &mut settings)?;
        }
        Ok(settings)
    }

    fn source_if_exists(&self, path: &Path, settings: &mut Settings) -> Result<(), ConfigError> {
        if path.exists() {
            debug!(path = %path.display(), "loading rc file");
            let content = fs::read_to_string(path)?;
            for (index, line) in content.lines().enumerate() {
                self.process_line(index + 1, line, settings)?;
            }
        }
        Ok(())
    }

    fn process_line(
        &self,
        number: usize,
        line: &str,
        settings: &mut Settings,
    ) -> Result<(), ConfigError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        match line {
            s if s.starts_with("export ") => self.process_env_var(number, &s["export ".len()..]),
            s => match s.split_once('=') {
                Some((key, value)) => {
                    self.process_setting(number, key.trim(), strip_quotes(value.trim()), settings)
                }
                None => Err(ConfigError::Malformed {
                    line: number,
                    message: format!("expected 'key = value', got '{}'", s),
                }),
            },
        }
    }

    fn process_env_var(&self, number: usize, var_def: &str) -> Result<(), ConfigError> {
        let Some((name, value)) = var_def.split_once('=') else {
            return Err(ConfigError::Malformed {
                line: number,
                message: "export syntax: export NAME=VALUE".to_string(),
            });
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::Malformed {
                line: number,
                message: "variable name cannot be empty".to_string(),
            });
        }

        std::env::set_var(name, strip_quotes(value.trim()));
        Ok(())
    }

    fn process_setting(
        &self,
        number: usize,
        key: &str,
        value: &str,
        settings: &mut Settings,
    ) -> Result<(), ConfigError> {
        let launch_dir = &self.paths.launch_dir;
        match key {
            "history_file" => settings.history_file = self.expander.expand_from(launch_dir, value)?,
            "mount_point" => settings.mount_point = self.expander.expand_from(launch_dir, value)?,
            "task_query" => {
                let query: Vec<String> = value.split_whitespace().map(String::from).collect();
                if query.is_empty() {
                    return Err(ConfigError::Malformed {
                        line: number,
                        message: "task_query cannot be empty".to_string(),
                    });
                }
                settings.task_query = query;
            }
            other => {
                return Err(ConfigError::Malformed {
                    line: number,
                    message: format!("unknown setting '{}'", other),
                })
            }
        }
        Ok(())
    }
}

fn strip_quotes(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
