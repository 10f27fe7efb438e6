use std::{collections::BTreeMap, path::Path};

use figment::{providers::Serialized, Figment};
use log::{debug, info};

use crate::{
    error::{LectureError, LectureResult},
    models::Config,
};

pub const CONFIG_KEYS: [&str; 7] = [
    "EMAIL_ADDRESS",
    "EMAIL_PASSWORD",
    "HOST",
    "PORT",
    "SENDER_NAME",
    "COURSE_TITLE",
    "SIGNATURE",
];

/* values stay strings here, a numeric password must not turn into a number */
fn read_environment() -> BTreeMap<String, String> {
    CONFIG_KEYS
        .iter()
        .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_lowercase(), value)))
        .collect()
}

/* None when the file is absent, keys are lowercased to match Config */
fn read_dotenv(dotenv_path: &Path) -> LectureResult<Option<BTreeMap<String, String>>> {
    if !dotenv_path.exists() {
        debug!("No dotfile at {}", dotenv_path.display());
        return Ok(None);
    }
    let pairs = dotenvy::from_path_iter(dotenv_path)
        .and_then(|iter| iter.collect::<Result<Vec<_>, _>>())
        .map_err(|e| LectureError::Config(format!("{}: {}", dotenv_path.display(), e)))?;
    Ok(Some(
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect(),
    ))
}

/// Loads the mail configuration from `dotenv_path`, or from the environment
/// when the dotfile is missing or empty.
pub fn load_config(dotenv_path: &Path) -> LectureResult<Config> {
    let pairs = match read_dotenv(dotenv_path)? {
        Some(pairs) if !pairs.is_empty() => {
            info!(
                "Read config from {}",
                std::path::absolute(dotenv_path)?.display()
            );
            pairs
        }
        _ => {
            info!("Read config from environment");
            read_environment()
        }
    };

    Figment::from(Serialized::defaults(pairs))
        .extract()
        .map_err(|e| LectureError::Config(e.to_string()))
}
