use super::{delete, list, print_resource, read_file, resource_id, show, Context};
use anyhow::Context as _;
use clap::Subcommand;
use serde_json::{json, Value};
use solum::output;
use solum::resource::Lookup;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum LanguagepackCommand {
    /// Build a language pack from a git repository
    Create {
        /// Language pack name
        name: String,
        /// Git repository holding the language pack
        git_url: String,
        /// JSON file with metadata stored alongside the language pack
        #[arg(long)]
        lp_metadata: Option<PathBuf>,
        /// YAML or JSON file with build parameters
        #[arg(long)]
        lp_params: Option<PathBuf>,
    },
    /// List all language packs
    List,
    /// Show a language pack
    Show {
        /// Language pack name or UUID
        name_or_uuid: String,
    },
    /// Delete a language pack
    Delete {
        /// Language pack name or UUID
        name_or_uuid: String,
    },
    /// Show the build logs of a language pack
    Logs {
        /// Language pack name or UUID
        name_or_uuid: String,
    },
}

pub async fn run(cmd: LanguagepackCommand, ctx: &Context) -> anyhow::Result<()> {
    let languagepacks = ctx.client.manager("languagepack")?;

    match cmd {
        LanguagepackCommand::Create {
            name,
            git_url,
            lp_metadata,
            lp_params,
        } => {
            let mut fields = json!({
                "name": name,
                "source_uri": git_url,
            });
            if let Some(path) = lp_metadata {
                fields["lp_metadata"] = Value::String(load_metadata(&path)?);
            }
            if let Some(path) = lp_params {
                fields["lp_params"] = load_params(&path)?;
            }

            let languagepack = languagepacks.create(&fields).await?;
            print_resource(ctx, &languagepacks, &languagepack);
            Ok(())
        }
        LanguagepackCommand::List => list(ctx, &languagepacks).await,
        LanguagepackCommand::Show { name_or_uuid } => {
            show(ctx, &languagepacks, &name_or_uuid).await
        }
        LanguagepackCommand::Delete { name_or_uuid } => {
            delete(ctx, &languagepacks, &name_or_uuid).await
        }
        LanguagepackCommand::Logs { name_or_uuid } => {
            let languagepack = languagepacks.find(Lookup::NameOrId(&name_or_uuid)).await?;
            let id = resource_id(&languagepacks, &languagepack)?;
            let entries = languagepacks.logs(id).await?;
            output::print_logs(&entries, ctx.format);
            Ok(())
        }
    }
}

/// Metadata travels as a JSON string; it must be valid JSON
fn load_metadata(path: &Path) -> anyhow::Result<String> {
    let text = read_file(path)?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Error in language pack metadata file {}", path.display()))?;
    Ok(value.to_string())
}

fn load_params(path: &Path) -> anyhow::Result<Value> {
    let text = read_file(path)?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Error in language pack parameter file {}", path.display()))
}
