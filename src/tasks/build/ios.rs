//! iOS build: NativeAOT static library linked by an Xcode project.

use std::path::PathBuf;

use crate::engine::MessageImportance;
use crate::error::TaskError;
use crate::models::Architecture;
use crate::orchestrator::executor::{run_command, CommandSpec};
use crate::system;
use crate::tasks::prepare;

use super::{dotnet_publish, TaskContext, DOTNET};

pub const IOS_RID: &str = "ios-arm64";

fn ios_dir(ctx: &TaskContext<'_>) -> PathBuf {
    ctx.paths.platform_dir(Architecture::Ios)
}

pub fn publish_command(ctx: &TaskContext<'_>) -> CommandSpec {
    let rid = ctx.options.rid.as_deref().unwrap_or(IOS_RID);
    dotnet_publish(ctx, rid, &ios_dir(ctx).join("libs"), &["-p:NativeLib=Static"])
}

pub fn xcodebuild_command(ctx: &TaskContext<'_>) -> CommandSpec {
    let app = &ctx.settings.app_name;
    let dir = ios_dir(ctx);
    CommandSpec::new("xcodebuild")
        .arg("-project")
        .path_arg(&dir.join(format!("{}.xcodeproj", app)))
        .args(["-scheme", app.as_str()])
        .args(["-configuration", ctx.options.build_type.configuration()])
        .args(["-sdk", "iphoneos"])
        .arg("-derivedDataPath")
        .path_arg(&dir.join("build"))
        .arg("build")
        .current_dir(dir)
}

/// `<derivedData>/Build/Products/<Cfg>-iphoneos/<App>.app`
pub fn app_bundle(ctx: &TaskContext<'_>) -> PathBuf {
    ios_dir(ctx)
        .join("build")
        .join("Build")
        .join("Products")
        .join(format!("{}-iphoneos", ctx.options.build_type.configuration()))
        .join(format!("{}.app", ctx.settings.app_name))
}

pub fn install_command(device: &str, bundle: &std::path::Path) -> CommandSpec {
    CommandSpec::new("xcrun")
        .args(["devicectl", "device", "install", "app", "--device", device])
        .path_arg(bundle)
}

/// Device to install on, or an error when `--install` has no `--device`.
pub fn install_target(install: bool, device: Option<&str>) -> Result<Option<&str>, TaskError> {
    match (install, device) {
        (true, None) => Err(TaskError::InvalidProject(
            "--install for iOS requires --device <id>".to_string(),
        )),
        (true, Some(id)) => Ok(Some(id)),
        (false, _) => Ok(None),
    }
}

pub async fn run(ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    let device = install_target(ctx.options.install, ctx.options.device.as_deref())?;

    if !system::is_macos_host() {
        return Err(TaskError::UnsupportedHost(
            "iOS builds require macOS with Xcode".to_string(),
        ));
    }

    ctx.require_tool(DOTNET)?;
    ctx.require_tool("xcodebuild")?;
    if device.is_some() {
        ctx.require_tool("xcrun")?;
    }

    if !ios_dir(ctx).is_dir() {
        ctx.engine.log_message(
            MessageImportance::High,
            "platform/ios missing, running prepare first",
        );
        prepare::run(ctx)?;
    }

    ctx.engine
        .milestone(format!("Publishing {} for iOS", ctx.settings.app_name));
    run_command(&publish_command(ctx), ctx.engine).await?;

    let assets_name = ctx
        .settings
        .assets_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "Assets".into());
    ctx.copy_assets(&ios_dir(ctx).join(assets_name))?;

    ctx.engine.milestone("Building Xcode project");
    run_command(&xcodebuild_command(ctx), ctx.engine).await?;

    let bundle = app_bundle(ctx);
    if !ctx.engine.is_dry_run() && !bundle.is_dir() {
        return Err(TaskError::ArtifactMissing(format!(
            "app bundle not found: {}",
            bundle.display()
        )));
    }

    if let Some(device) = device {
        run_command(&install_command(device, &bundle), ctx.engine).await?;
        ctx.engine.milestone(format!("Installed on {}", device));
    }

    Ok(())
}
