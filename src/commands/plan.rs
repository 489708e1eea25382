use super::{delete, list, print_resource, read_file, show, Context};
use anyhow::bail;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Register a plan from a YAML or JSON file
    Create {
        /// Plan file
        plan_file: PathBuf,
    },
    /// List all plans
    List,
    /// Show a plan
    Show {
        /// Plan name or UUID
        name_or_uuid: String,
    },
    /// Delete a plan
    Delete {
        /// Plan name or UUID
        name_or_uuid: String,
    },
}

pub async fn run(cmd: PlanCommand, ctx: &Context) -> anyhow::Result<()> {
    let plans = ctx.client.manager("plan")?;

    match cmd {
        PlanCommand::Create { plan_file } => {
            let definition = read_file(&plan_file)?;
            check_plan(&definition)?;
            let plan = plans.create_document(&definition).await?;
            print_resource(ctx, &plans, &plan);
            Ok(())
        }
        PlanCommand::List => list(ctx, &plans).await,
        PlanCommand::Show { name_or_uuid } => show(ctx, &plans, &name_or_uuid).await,
        PlanCommand::Delete { name_or_uuid } => delete(ctx, &plans, &name_or_uuid).await,
    }
}

/// Plans are sent verbatim but must parse locally first
fn check_plan(definition: &str) -> anyhow::Result<()> {
    match serde_yaml::from_str::<serde_yaml::Value>(definition) {
        Ok(serde_yaml::Value::Mapping(_)) => Ok(()),
        Ok(_) => bail!(solum::Error::Validation(
            "Error in plan file: expected a mapping".to_string()
        )),
        Err(e) => bail!(solum::Error::Validation(format!("Error in plan file: {}", e))),
    }
}
