// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::duration::parse_duration;
use crate::config::model::{ActionConfig, ConfigFile, RawActionConfig, RawConfigFile};
use crate::errors::{Result, TriplineError};
use crate::trigger::Schedule;
use crate::types::SignalId;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TriplineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_actions(&raw)?;

        let mut actions = BTreeMap::new();
        for (name, action) in raw.action {
            let validated = validate_action(&action).map_err(|source| TriplineError::InvalidAction {
                action: name.clone(),
                source: Box::new(source),
            })?;
            actions.insert(name, validated);
        }

        Ok(ConfigFile::new_unchecked(actions))
    }
}

fn ensure_has_actions(cfg: &RawConfigFile) -> Result<()> {
    if cfg.action.is_empty() {
        return Err(TriplineError::ConfigError(
            "config must contain at least one [action.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_action(raw: &RawActionConfig) -> Result<ActionConfig> {
    let schedule = Schedule {
        start_after: optional_duration("after", raw.after.as_deref())?,
        start_at: raw.at,
        interval: optional_duration("every", raw.every.as_deref())?,
        run_for: optional_duration("for", raw.run_for.as_deref())?,
        run_until: raw.until,
    };
    schedule.validate()?;

    let signals = raw
        .signals
        .iter()
        .map(|s| s.parse::<SignalId>().map_err(TriplineError::ConfigError))
        .collect::<Result<Vec<_>>>()?;

    if let Some(output) = &raw.output {
        if output.as_os_str().is_empty() {
            return Err(TriplineError::ConfigError(
                "`output` must not be an empty path".to_string(),
            ));
        }
    }

    Ok(ActionConfig {
        schedule,
        signals,
        output: raw.output.clone(),
        run: raw.run.clone(),
    })
}

fn optional_duration(field: &str, value: Option<&str>) -> Result<Option<std::time::Duration>> {
    value
        .map(|s| {
            parse_duration(s)
                .map_err(|e| TriplineError::ConfigError(format!("`{field}`: {e}")))
        })
        .transpose()
}
