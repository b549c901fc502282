//! WebAssembly build via the `browser-wasm` runtime.

use std::path::{Path, PathBuf};

use crate::error::TaskError;
use crate::orchestrator::executor::{run_command, CommandSpec};

use super::{dotnet_publish, TaskContext, DOTNET};

pub const WEB_RID: &str = "browser-wasm";

/// WebAssembly has exactly one runtime identifier; any other `--rid` is an error.
pub fn check_rid(rid: Option<&str>) -> Result<(), TaskError> {
    match rid {
        None | Some(WEB_RID) => Ok(()),
        Some(other) => Err(TaskError::InvalidProject(format!(
            "Web builds only support the {} runtime identifier, got '{}'",
            WEB_RID, other
        ))),
    }
}

pub fn publish_command(ctx: &TaskContext<'_>, output: &Path) -> CommandSpec {
    dotnet_publish(ctx, WEB_RID, output, &["-p:TrimMode=full"])
}

/// `index.html` in `<out>` or `<out>/wwwroot`.
pub fn find_index_html(output: &Path) -> Option<PathBuf> {
    [output.join("index.html"), output.join("wwwroot").join("index.html")]
        .into_iter()
        .find(|p| p.is_file())
}

pub async fn run(ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    check_rid(ctx.options.rid.as_deref())?;
    ctx.require_tool(DOTNET)?;

    let output = ctx.output_dir();
    ctx.engine.milestone(format!(
        "Publishing {} for WebAssembly ({})",
        ctx.settings.app_name,
        ctx.options.build_type.configuration()
    ));
    run_command(&publish_command(ctx, &output), ctx.engine).await?;

    let wwwroot = output.join("wwwroot");
    let assets_name = ctx
        .settings
        .assets_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "Assets".into());
    ctx.copy_assets(&wwwroot.join(assets_name))?;

    if ctx.engine.is_dry_run() {
        return Ok(());
    }

    match find_index_html(&output) {
        Some(index) => {
            ctx.engine
                .milestone(format!("Web build ready: {}", index.display()));
            Ok(())
        }
        None => Err(TaskError::ArtifactMissing(format!(
            "index.html not found in {}",
            output.display()
        ))),
    }
}
