use std::path::Path;

use crate::error::TaskError;
use crate::orchestrator::executor::{run_command, CommandSpec};
use crate::system;

use super::{dotnet_publish, TaskContext, DOTNET};

/// `--rid` or the host's runtime identifier.
pub fn desktop_rid(ctx: &TaskContext<'_>) -> String {
    ctx.options
        .rid
        .clone()
        .unwrap_or_else(|| system::host_rid().to_string())
}

pub fn publish_command(ctx: &TaskContext<'_>, output: &Path) -> CommandSpec {
    dotnet_publish(
        ctx,
        &desktop_rid(ctx),
        output,
        &["--self-contained", "true"],
    )
}

pub async fn run(ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    ctx.require_tool(DOTNET)?;

    let output = ctx.output_dir();
    ctx.engine.milestone(format!(
        "Publishing {} for {} ({})",
        ctx.settings.app_name,
        desktop_rid(ctx),
        ctx.options.build_type.configuration()
    ));
    run_command(&publish_command(ctx, &output), ctx.engine).await?;

    let assets_name = ctx
        .settings
        .assets_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "Assets".into());
    ctx.copy_assets(&output.join(assets_name))?;

    ctx.engine
        .milestone(format!("Desktop build ready in {}", output.display()));
    Ok(())
}
