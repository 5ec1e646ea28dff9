//! Put command implementation.

use std::io::Read;

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};

use padel_core::{DynRecord, Gateway, RecordId};

use super::{connect, parse_entity};
use crate::cli::GlobalArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Entity collection
    pub entity: String,

    /// Update this record instead of creating a new one
    #[arg(long)]
    pub id: Option<String>,

    /// Read the record body from a JSON file ('-' for stdin)
    #[arg(long, value_name = "FILE")]
    pub json: Option<String>,

    /// Set a field (KEY=VALUE, VALUE parsed as JSON when possible)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

pub async fn run(global: &GlobalArgs, args: PutArgs) -> Result<()> {
    let entity = parse_entity(&args.entity)?;
    let body = build_body(args.json.as_deref(), &args.fields)?;
    let (_, backend) = connect(global)?;

    let record: DynRecord = match &args.id {
        Some(id) => {
            let id = RecordId::new(id).context("Invalid record id")?;
            backend.update(&entity, &id, &body).await
        }
        None => backend.create(&entity, &body).await,
    }
    .map_err(|e| anyhow::anyhow!(e.summary()))?;

    let verb = if args.id.is_some() { "Updated" } else { "Created" };
    output::status(&format!("{} {} {}", verb, entity, record.id));
    output::record(&record, false)
}

fn build_body(json: Option<&str>, fields: &[String]) -> Result<Value> {
    let mut body = match json {
        Some(source) => match read_source(source)? {
            Value::Object(map) => map,
            _ => bail!("Record body must be a JSON object"),
        },
        None => Map::new(),
    };

    for field in fields {
        let (key, value) = field
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", field))?;
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        body.insert(key.to_string(), value);
    }

    if body.is_empty() {
        bail!("Nothing to send: pass --json or --set");
    }
    Ok(Value::Object(body))
}

fn read_source(source: &str) -> Result<Value> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))?
    };
    serde_json::from_str(&text).context("Invalid JSON body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_values_are_parsed_as_json_when_possible() {
        let fields = vec![
            "total=150".to_string(),
            "estado=CANCELADA".to_string(),
            "items=[]".to_string(),
        ];
        let body = build_body(None, &fields).unwrap();
        assert_eq!(body, json!({"total": 150, "estado": "CANCELADA", "items": []}));
    }

    #[test]
    fn set_overrides_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, r#"{"total": 1, "user": "u1"}"#).unwrap();

        let body = build_body(path.to_str(), &["total=2".to_string()]).unwrap();
        assert_eq!(body, json!({"total": 2, "user": "u1"}));
    }

    #[test]
    fn empty_and_malformed_bodies_are_rejected() {
        assert!(build_body(None, &[]).is_err());
        assert!(build_body(None, &["novalue".to_string()]).is_err());
    }
}
