use super::workflow::show_logs;
use super::{delete, list, print_resource, read_file, resource_id, show, Context};
use anyhow::Context as _;
use clap::Subcommand;
use dialoguer::{Input, Password};
use serde_json::{json, Map, Value};
use solum::github::{parse_repo_url, register_app, GitHubAuth, GitHubCredentials, RepoSetup};
use solum::resource::Lookup;
use solum::Error;
use std::path::PathBuf;

/// Longest accepted app name
const MAX_NAME_LEN: usize = 100;

/// Actions run by `app deploy` when none are given
const DEFAULT_ACTIONS: &[&str] = &["build", "deploy"];

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Register an app
    Create {
        /// YAML or JSON app file; flags override its values
        #[arg(long)]
        app_file: Option<PathBuf>,
        /// App name
        #[arg(long)]
        name: Option<String>,
        /// Git repository of the app
        #[arg(long)]
        git_url: Option<String>,
        /// Language pack used to build the app
        #[arg(long)]
        languagepack: Option<String>,
        /// Register a GitHub webhook that triggers the app
        #[arg(long)]
        setup_trigger: bool,
        /// Actions run by the webhook trigger
        #[arg(long, value_delimiter = ',')]
        trigger_workflow: Vec<String>,
        /// The repository is private; upload the app's deploy key
        #[arg(long)]
        private_repo: bool,
        /// Upload the key to the GitHub account instead of the repository
        #[arg(long, requires = "private_repo")]
        user_key: bool,
        /// GitHub token, skips the username/password prompt
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,
    },
    /// List all apps
    List,
    /// Show an app
    Show {
        /// App name or id
        name_or_id: String,
    },
    /// Delete an app
    Delete {
        /// App name or id
        name_or_id: String,
    },
    /// Start a workflow for an app
    Deploy {
        /// App name or id
        name_or_id: String,
        /// Workflow actions
        #[arg(long, value_delimiter = ',')]
        actions: Vec<String>,
    },
    /// Show the logs of an app's workflows
    Logs {
        /// App name or id
        name_or_id: String,
        /// Only this workflow revision or UUID
        #[arg(long)]
        workflow: Option<String>,
    },
}

pub async fn run(cmd: AppCommand, ctx: &Context) -> anyhow::Result<()> {
    let apps = ctx.client.manager("app")?;

    match cmd {
        AppCommand::Create {
            app_file,
            name,
            git_url,
            languagepack,
            setup_trigger,
            trigger_workflow,
            private_repo,
            user_key,
            github_token,
        } => {
            let file_fields = match app_file {
                Some(path) => {
                    let text = read_file(&path)?;
                    Some(serde_yaml::from_str::<Value>(&text).with_context(|| {
                        format!("Error in app file {}", path.display())
                    })?)
                }
                None => None,
            };

            let fields = build_app_fields(
                file_fields,
                name.as_deref(),
                git_url.as_deref(),
                languagepack.as_deref(),
            )?;

            let setup = RepoSetup {
                setup_trigger,
                trigger_workflow,
                private_repo,
                user_key,
            };

            let app = if setup.needs_github() {
                let repository = fields
                    .pointer("/source/repository")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();

                let credentials = match github_token {
                    Some(token) => GitHubCredentials::Token(token),
                    None => prompt_credentials(&repository)?,
                };
                let mut gha =
                    GitHubAuth::with_api_url(&repository, credentials, &ctx.github_api_url)?
                        .with_otp_provider(Box::new(prompt_otp));

                register_app(&apps, fields, &mut gha, &setup).await?
            } else {
                apps.create(&fields).await?
            };

            print_resource(ctx, &apps, &app);
            Ok(())
        }
        AppCommand::List => list(ctx, &apps).await,
        AppCommand::Show { name_or_id } => show(ctx, &apps, &name_or_id).await,
        AppCommand::Delete { name_or_id } => delete(ctx, &apps, &name_or_id).await,
        AppCommand::Deploy {
            name_or_id,
            actions,
        } => {
            let app = apps.find(Lookup::NameOrId(&name_or_id)).await?;
            let app_id = resource_id(&apps, &app)?;

            let actions: Vec<String> = if actions.is_empty() {
                DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect()
            } else {
                actions
            };

            let workflows = ctx.client.workflows(app_id)?;
            let workflow = workflows.create(&json!({ "actions": actions })).await?;
            print_resource(ctx, &workflows, &workflow);
            Ok(())
        }
        AppCommand::Logs {
            name_or_id,
            workflow,
        } => {
            let app = apps.find(Lookup::NameOrId(&name_or_id)).await?;
            let app_id = resource_id(&apps, &app)?.to_string();

            match workflow {
                Some(revision) => show_logs(ctx, &app_id, &revision).await,
                None => {
                    let workflows = ctx.client.workflows(&app_id)?;
                    for wf in workflows.list(&[]).await? {
                        let revision = wf.display("wf_id");
                        let Some(id) = wf.id() else { continue };
                        println!("--- workflow {} ---", revision);
                        let entries = workflows.logs(id).await?;
                        solum::output::print_logs(&entries, ctx.format);
                    }
                    Ok(())
                }
            }
        }
    }
}

/// Merge an app file with command-line values and validate the result
fn build_app_fields(
    file: Option<Value>,
    name: Option<&str>,
    git_url: Option<&str>,
    languagepack: Option<&str>,
) -> solum::Result<Value> {
    let mut fields = match file {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(Error::Validation(
                "App file must contain a mapping".to_string(),
            ))
        }
    };

    if let Some(name) = name {
        fields.insert("name".to_string(), json!(name));
    }
    if let Some(languagepack) = languagepack {
        fields.insert("languagepack".to_string(), json!(languagepack));
    }
    if let Some(git_url) = git_url {
        let source = fields
            .entry("source")
            .or_insert_with(|| Value::Object(Map::new()));
        if !source.is_object() {
            *source = Value::Object(Map::new());
        }
        source["repository"] = json!(git_url);
    }

    let fields = Value::Object(fields);

    let name = fields.get("name").and_then(|v| v.as_str()).unwrap_or_default();
    if name.is_empty() {
        return Err(Error::Validation("An app name is required".to_string()));
    }
    validate_app_name(name)?;

    if fields.get("languagepack").and_then(|v| v.as_str()).is_none() {
        return Err(Error::Validation("A language pack is required".to_string()));
    }
    if fields.pointer("/source/repository").and_then(|v| v.as_str()).is_none() {
        return Err(Error::Validation(
            "A git repository URL is required".to_string(),
        ));
    }

    Ok(fields)
}

/// `[A-Za-z0-9][A-Za-z0-9_-]*`, at most 100 characters
fn validate_app_name(name: &str) -> solum::Result<()> {
    let mut chars = name.chars();
    let valid = name.len() <= MAX_NAME_LEN
        && chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Application name must be 1-{} characters long, start with a letter or digit, \
             and contain only letters, digits, '-' and '_': {}",
            MAX_NAME_LEN, name
        )))
    }
}

fn prompt_credentials(repository: &str) -> anyhow::Result<GitHubCredentials> {
    let username = Input::<String>::new()
        .with_prompt(format!("Username for {}", repository))
        .default(default_username(repository)?)
        .interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    Ok(GitHubCredentials::Basic { username, password })
}

/// The repository owner, offered as the GitHub username
fn default_username(repository: &str) -> solum::Result<String> {
    parse_repo_url(repository).map(|(owner, _)| owner)
}

fn prompt_otp() -> solum::Result<String> {
    Input::<String>::new()
        .with_prompt("2FA token")
        .interact_text()
        .map_err(|e| Error::Auth(format!("Could not read one-time password: {}", e)))
}
