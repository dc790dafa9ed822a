use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use profilestore::codec::ValueConverter;
use profilestore::event::keys;
use profilestore::profile::USER_PROFILE_DATASTORE_NAME;
use profilestore::{Event, EventSource, EventType, ProfileConfig, ProfileMap, ProfileStore, UserProfile};
use serde_json::{Value as JsonValue, json};
use std::path::PathBuf;

/// Inspect and edit a persisted user profile
#[derive(Debug, Parser)]
#[command(name = "profilestore", version)]
pub struct App {
    /// Directory holding the profile collection
    #[arg(long, short = 'd', default_value = ".profilestore")]
    pub data_dir: PathBuf,

    /// Name of the key-value collection
    #[arg(long, default_value = USER_PROFILE_DATASTORE_NAME)]
    pub collection: String,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Set an attribute. VALUE is parsed as JSON, falling back to a plain string; `null` removes it
    Set { key: String, value: String },
    /// Remove attributes
    Remove {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the listed attributes
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the whole persisted profile
    Show,
    /// Apply a rule consequence (`write` or `delete`) as the rules engine would
    Consequence {
        operation: String,
        key: String,
        value: Option<String>,
    },
}

impl App {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = ProfileConfig::new()
            .data_dir(&self.data_dir)
            .collection(&self.collection);

        match self.command {
            CliCommand::Show => {
                let mut store = ProfileStore::new(config.open_data_store()?);
                if !store.load() {
                    bail!("stored profile in '{}' is malformed", self.data_dir.display());
                }
                print_map(&store.snapshot())
            }
            CliCommand::Get { keys } => {
                let profile = UserProfile::start(config)?;
                let attributes = profile.get_user_attributes(keys).await?;
                profile.shutdown().await?;
                print_map(&attributes)
            }
            CliCommand::Set { key, value } => {
                let value = ValueConverter::from_json(&parse_value(&value))
                    .with_context(|| format!("cannot store value for '{}'", key))?;
                let profile = UserProfile::start(config)?;
                profile.update_user_attribute(&key, value).await?;
                let stored = profile.get_user_attributes([key]).await?;
                profile.shutdown().await?;
                print_map(&stored)
            }
            CliCommand::Remove { keys } => {
                let profile = UserProfile::start(config)?;
                profile.remove_user_attributes(keys).await?;
                profile.shutdown().await?;
                Ok(())
            }
            CliCommand::Consequence { operation, key, value } => {
                let mut detail = json!({ "operation": operation, "key": key.clone() });
                if let Some(value) = value {
                    detail[keys::CONSEQUENCE_VALUE] = parse_value(&value);
                }
                let event = Event::new("Consequence Rule", EventType::RulesEngine, EventSource::ResponseContent)
                    .with_entry(
                        keys::CONSEQUENCE_TRIGGERED,
                        json!({ "type": "csp", "id": "cli", "detail": detail }),
                    );
                let profile = UserProfile::start(config)?;
                profile.dispatch(event).await?;
                let stored = profile.get_user_attributes([key]).await?;
                profile.shutdown().await?;
                print_map(&stored)
            }
        }
    }
}

fn parse_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn print_map(map: &ProfileMap) -> anyhow::Result<()> {
    let object = ValueConverter::map_to_object(map)?;
    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_falls_back_to_text() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_value("gold"), json!("gold"));
        assert_eq!(parse_value("null"), JsonValue::Null);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let app = App::try_parse_from(["profilestore", "-d", "/tmp/p", "get", "k1", "k2"]).unwrap();
        assert_eq!(app.data_dir, PathBuf::from("/tmp/p"));
        assert!(matches!(app.command, CliCommand::Get { ref keys } if keys.len() == 2));

        assert!(App::try_parse_from(["profilestore", "remove"]).is_err());
    }
}
