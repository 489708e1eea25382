use super::{delete, list, print_resource, resolve_plan_uri, show, Context};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum AssemblyCommand {
    /// Create an assembly from a plan
    Create {
        /// Assembly name
        name: String,
        /// Plan URI, name or UUID
        plan_uri_or_name: String,
        /// Assembly description
        #[arg(long)]
        description: Option<String>,
    },
    /// List all assemblies
    List,
    /// Show an assembly
    Show {
        /// Assembly name or UUID
        name_or_uuid: String,
    },
    /// Delete an assembly
    Delete {
        /// Assembly name or UUID
        name_or_uuid: String,
    },
}

pub async fn run(cmd: AssemblyCommand, ctx: &Context) -> anyhow::Result<()> {
    let assemblies = ctx.client.manager("assembly")?;

    match cmd {
        AssemblyCommand::Create {
            name,
            plan_uri_or_name,
            description,
        } => {
            let plan_uri = resolve_plan_uri(ctx, &plan_uri_or_name).await?;

            let mut fields = json!({
                "name": name,
                "plan_uri": plan_uri,
            });
            if let Some(description) = description {
                fields["description"] = json!(description);
            }

            let assembly = assemblies.create(&fields).await?;
            print_resource(ctx, &assemblies, &assembly);
            Ok(())
        }
        AssemblyCommand::List => list(ctx, &assemblies).await,
        AssemblyCommand::Show { name_or_uuid } => show(ctx, &assemblies, &name_or_uuid).await,
        AssemblyCommand::Delete { name_or_uuid } => delete(ctx, &assemblies, &name_or_uuid).await,
    }
}
