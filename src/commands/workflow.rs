use super::{print_resource, resource_id, Context};
use clap::Subcommand;
use solum::output;
use solum::resource::Lookup;

#[derive(Subcommand, Debug)]
pub enum WorkflowCommand {
    /// List the workflows of an app
    List {
        /// App name or id
        app: String,
    },
    /// Show one workflow of an app
    Show {
        /// App name or id
        app: String,
        /// Workflow revision number or UUID
        revision_or_uuid: String,
    },
    /// Show the logs of one workflow
    Logs {
        /// App name or id
        app: String,
        /// Workflow revision number or UUID
        revision_or_uuid: String,
    },
}

pub async fn run(cmd: WorkflowCommand, ctx: &Context) -> anyhow::Result<()> {
    match cmd {
        WorkflowCommand::List { app } => {
            let app_id = app_id(ctx, &app).await?;
            let workflows = ctx.client.workflows(&app_id)?;
            super::list(ctx, &workflows).await
        }
        WorkflowCommand::Show {
            app,
            revision_or_uuid,
        } => {
            let app_id = app_id(ctx, &app).await?;
            let workflows = ctx.client.workflows(&app_id)?;
            let workflow = workflows.find(Lookup::NameOrId(&revision_or_uuid)).await?;
            print_resource(ctx, &workflows, &workflow);
            Ok(())
        }
        WorkflowCommand::Logs {
            app,
            revision_or_uuid,
        } => {
            let app_id = app_id(ctx, &app).await?;
            show_logs(ctx, &app_id, &revision_or_uuid).await
        }
    }
}

/// Resolve an app reference to its id
pub(super) async fn app_id(ctx: &Context, app: &str) -> anyhow::Result<String> {
    let apps = ctx.client.manager("app")?;
    let resource = apps.find(Lookup::NameOrId(app)).await?;
    Ok(resource_id(&apps, &resource)?.to_string())
}

/// Print the logs of one workflow of an app
pub(super) async fn show_logs(
    ctx: &Context,
    app_id: &str,
    revision_or_uuid: &str,
) -> anyhow::Result<()> {
    let workflows = ctx.client.workflows(app_id)?;
    let workflow = workflows.find(Lookup::NameOrId(revision_or_uuid)).await?;
    let id = resource_id(&workflows, &workflow)?;
    let entries = workflows.logs(id).await?;
    output::print_logs(&entries, ctx.format);
    Ok(())
}
