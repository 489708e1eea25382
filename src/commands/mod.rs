//! CLI commands, one module per resource noun

mod app;
mod assembly;
mod component;
mod languagepack;
mod pipeline;
mod plan;
mod workflow;

use anyhow::Context as _;
use clap::Subcommand;
use solum::api::SolumClient;
use solum::output::{self, OutputFormat};
use solum::resource::{Lookup, Resource, ResourceManager};
use std::path::Path;

/// Everything a command needs once the client is authenticated
pub struct Context {
    pub client: SolumClient,
    pub format: OutputFormat,
    pub github_api_url: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan documents
    #[command(subcommand)]
    Plan(plan::PlanCommand),
    /// Assemblies built from plans
    #[command(subcommand)]
    Assembly(assembly::AssemblyCommand),
    /// Pipelines built from plans and workbooks
    #[command(subcommand)]
    Pipeline(pipeline::PipelineCommand),
    /// Language packs
    #[command(subcommand)]
    Languagepack(languagepack::LanguagepackCommand),
    /// Assembly components
    #[command(subcommand)]
    Component(component::ComponentCommand),
    /// Applications
    #[command(subcommand)]
    App(app::AppCommand),
    /// Deploy runs of an application
    #[command(subcommand)]
    Workflow(workflow::WorkflowCommand),
}

pub async fn dispatch(command: Command, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Command::Plan(cmd) => plan::run(cmd, ctx).await,
        Command::Assembly(cmd) => assembly::run(cmd, ctx).await,
        Command::Pipeline(cmd) => pipeline::run(cmd, ctx).await,
        Command::Languagepack(cmd) => languagepack::run(cmd, ctx).await,
        Command::Component(cmd) => component::run(cmd, ctx).await,
        Command::App(cmd) => app::run(cmd, ctx).await,
        Command::Workflow(cmd) => workflow::run(cmd, ctx).await,
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Print every resource of a manager's collection
async fn list(ctx: &Context, manager: &ResourceManager<'_>) -> anyhow::Result<()> {
    let resources = manager.list(&[]).await?;
    output::print_list(&resources, &manager.kind().list_columns, ctx.format);
    Ok(())
}

/// Resolve and print one resource
async fn show(ctx: &Context, manager: &ResourceManager<'_>, name_or_id: &str) -> anyhow::Result<()> {
    let resource = manager.find(Lookup::NameOrId(name_or_id)).await?;
    print_resource(ctx, manager, &resource);
    Ok(())
}

/// Resolve a resource by name or UUID and delete it
async fn delete(ctx: &Context, manager: &ResourceManager<'_>, name_or_id: &str) -> anyhow::Result<()> {
    let resource = manager.find(Lookup::NameOrId(name_or_id)).await?;
    let id = resource_id(manager, &resource)?;
    manager.delete(id).await?;
    tracing::info!("Deleted {} {}", manager.kind().display_name, id);
    if ctx.format == OutputFormat::Table {
        println!("Deleted {} {}", manager.kind().display_name, name_or_id);
    }
    Ok(())
}

fn print_resource(ctx: &Context, manager: &ResourceManager<'_>, resource: &Resource) {
    output::print_dict(resource, &manager.kind().show_columns, ctx.format);
}

fn resource_id<'r>(manager: &ResourceManager<'_>, resource: &'r Resource) -> anyhow::Result<&'r str> {
    resource.id().with_context(|| {
        format!("{} has no identifier", manager.kind().display_name)
    })
}

/// A plan reference: URIs pass through, anything else is resolved to the plan's URI
async fn resolve_plan_uri(ctx: &Context, plan_uri_or_name: &str) -> anyhow::Result<String> {
    if plan_uri_or_name.starts_with("http://") || plan_uri_or_name.starts_with("https://") {
        return Ok(plan_uri_or_name.to_string());
    }

    let plan = ctx
        .client
        .manager("plan")?
        .find(Lookup::NameOrId(plan_uri_or_name))
        .await?;
    let uri = plan
        .uri()
        .with_context(|| format!("Plan {} has no uri", plan_uri_or_name))?;
    Ok(uri.to_string())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))
}
