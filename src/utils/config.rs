use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::shell::signals::DEFAULT_REMINDER_SECS;

pub struct Config {
    pub name: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub reminder_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = Config::get_config_dir();
        Config {
            name: String::from(env!("CARGO_PKG_NAME")),
            history_file: config_dir.join(".ish_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
            reminder_secs: DEFAULT_REMINDER_SECS,
        }
    }
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/ish")
        } else {
            PathBuf::from("tmp")
        }
    }

    pub fn new() -> Self {
        // .env values first
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();
        config.apply_env(|key| env::var(key).ok());

        // Without this directory readline only logs a warning on save.
        if let Some(parent) = config.history_file.parent() {
            fs::create_dir_all(parent).ok();
        }

        config
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(editor) = lookup("ISH_EDITOR") {
            self.editor_mode = editor;
        }

        if let Some(history) = lookup("ISH_HISTORY") {
            self.history_file = PathBuf::from(history);
        }

        if let Some(level) = lookup("ISH_LOG_LEVEL") {
            self.logger_level = level;
        }

        if let Some(dir) = lookup("ISH_LOG_DIR") {
            self.logger_dir = PathBuf::from(dir);
        }

        if let Some(secs) = lookup("ISH_REMINDER_SECS") {
            match secs.trim().parse::<u32>() {
                Ok(secs) if secs > 0 => self.reminder_secs = secs,
                _ => eprintln!("ish: ignoring invalid ISH_REMINDER_SECS={}", secs),
            }
        }
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
