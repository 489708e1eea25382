use super::{delete, list, print_resource, resolve_plan_uri, show, Context};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum PipelineCommand {
    /// Create a pipeline from a plan and a workbook
    Create {
        /// Plan URI, name or UUID
        plan_uri_or_name: String,
        /// Workbook name
        workbook_name: String,
        /// Pipeline name
        name: String,
    },
    /// List all pipelines
    List,
    /// Show a pipeline
    Show {
        /// Pipeline name or UUID
        name_or_uuid: String,
    },
    /// Delete a pipeline
    Delete {
        /// Pipeline name or UUID
        name_or_uuid: String,
    },
}

pub async fn run(cmd: PipelineCommand, ctx: &Context) -> anyhow::Result<()> {
    let pipelines = ctx.client.manager("pipeline")?;

    match cmd {
        PipelineCommand::Create {
            plan_uri_or_name,
            workbook_name,
            name,
        } => {
            let plan_uri = resolve_plan_uri(ctx, &plan_uri_or_name).await?;
            let fields = json!({
                "name": name,
                "plan_uri": plan_uri,
                "workbook_name": workbook_name,
            });

            let pipeline = pipelines.create(&fields).await?;
            print_resource(ctx, &pipelines, &pipeline);
            Ok(())
        }
        PipelineCommand::List => list(ctx, &pipelines).await,
        PipelineCommand::Show { name_or_uuid } => show(ctx, &pipelines, &name_or_uuid).await,
        PipelineCommand::Delete { name_or_uuid } => delete(ctx, &pipelines, &name_or_uuid).await,
    }
}
