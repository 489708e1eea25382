use super::{list, show, Context};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ComponentCommand {
    /// List all components
    List,
    /// Show a component
    Show {
        /// Component name or UUID
        name_or_uuid: String,
    },
}

pub async fn run(cmd: ComponentCommand, ctx: &Context) -> anyhow::Result<()> {
    let components = ctx.client.manager("component")?;

    match cmd {
        ComponentCommand::List => list(ctx, &components).await,
        ComponentCommand::Show { name_or_uuid } => show(ctx, &components, &name_or_uuid).await,
    }
}
