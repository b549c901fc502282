//! Android build: NativeAOT shared libraries per ABI, packaged by Gradle.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::MessageImportance;
use crate::error::TaskError;
use crate::models::{Architecture, BuildType};
use crate::orchestrator::executor::{run_command, CommandSpec};
use crate::tasks::prepare;

use super::{dotnet_publish, TaskContext, DOTNET};

/// .NET runtime identifier to Android ABI directory.
pub const ANDROID_ABIS: [(&str, &str); 2] = [
    ("linux-bionic-arm64", "arm64-v8a"),
    ("linux-bionic-x64", "x86_64"),
];

pub const SDK_VARS: [&str; 2] = ["ANDROID_HOME", "ANDROID_SDK_ROOT"];
pub const NDK_VARS: [&str; 2] = ["ANDROID_NDK_HOME", "ANDROID_NDK_ROOT"];

/// First of `vars` that `lookup` finds set and non-empty.
pub fn first_env<F>(vars: &[&str], lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    vars.iter()
        .filter_map(|v| lookup(*v))
        .find(|v| !v.trim().is_empty())
}

/// SDK and NDK roots, in that order.
pub fn check_environment<F>(lookup: &F) -> Result<(String, String), TaskError>
where
    F: Fn(&str) -> Option<String>,
{
    let sdk = first_env(&SDK_VARS, lookup)
        .ok_or_else(|| TaskError::MissingEnvironment(SDK_VARS.join(" or ")))?;
    let ndk = first_env(&NDK_VARS, lookup)
        .ok_or_else(|| TaskError::MissingEnvironment(NDK_VARS.join(" or ")))?;
    Ok((sdk, ndk))
}

/// ABIs to publish; `--rid` narrows to one.
pub fn target_abis(rid: Option<&str>) -> Result<Vec<(&'static str, &'static str)>, TaskError> {
    match rid {
        None => Ok(ANDROID_ABIS.to_vec()),
        Some(rid) => ANDROID_ABIS
            .iter()
            .find(|(r, _)| *r == rid)
            .map(|pair| vec![*pair])
            .ok_or_else(|| {
                TaskError::InvalidProject(format!(
                    "Unsupported Android runtime identifier '{}' (expected one of: {})",
                    rid,
                    ANDROID_ABIS
                        .iter()
                        .map(|(r, _)| *r)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }),
    }
}

fn app_dir(ctx: &TaskContext<'_>) -> PathBuf {
    ctx.paths.platform_dir(Architecture::Android).join("app")
}

pub fn jni_libs_dir(ctx: &TaskContext<'_>, abi: &str) -> PathBuf {
    app_dir(ctx).join("src").join("main").join("jniLibs").join(abi)
}

pub fn publish_command(ctx: &TaskContext<'_>, rid: &str, abi: &str) -> CommandSpec {
    dotnet_publish(
        ctx,
        rid,
        &jni_libs_dir(ctx, abi),
        &["-p:NativeLib=Shared", "-p:DisableUnsupportedError=true"],
    )
}

fn gradle_wrapper_name() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    }
}

pub fn gradle_command(ctx: &TaskContext<'_>) -> CommandSpec {
    let platform = ctx.paths.platform_dir(Architecture::Android);
    CommandSpec::new(platform.join(gradle_wrapper_name()).to_string_lossy().to_string())
        .arg(format!("assemble{}", ctx.options.build_type.configuration()))
        .current_dir(platform)
}

/// `app/build/outputs/apk/<debug|release>`
pub fn apk_dir(ctx: &TaskContext<'_>) -> PathBuf {
    let flavour = match ctx.options.build_type {
        BuildType::Debug => "debug",
        BuildType::Release => "release",
    };
    app_dir(ctx)
        .join("build")
        .join("outputs")
        .join("apk")
        .join(flavour)
}

/// First `.apk` in `dir`, by name.
pub fn find_apk(dir: &Path) -> Option<PathBuf> {
    let mut apks: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "apk"))
        .collect();
    apks.sort();
    apks.into_iter().next()
}

pub fn install_command(device: Option<&str>, apk: &Path) -> CommandSpec {
    let mut spec = CommandSpec::new("adb");
    if let Some(device) = device {
        spec = spec.args(["-s", device]);
    }
    spec.args(["install", "-r"]).path_arg(apk)
}

pub async fn run(ctx: &TaskContext<'_>) -> Result<(), TaskError> {
    let abis = target_abis(ctx.options.rid.as_deref())?;

    if ctx.engine.is_dry_run() {
        ctx.engine.log_message(
            MessageImportance::Low,
            "[dry-run] skipping Android SDK/NDK checks",
        );
    } else {
        let (sdk, ndk) = check_environment(&|v: &str| env::var(v).ok())?;
        ctx.engine
            .log_message(MessageImportance::Low, format!("SDK {}, NDK {}", sdk, ndk));
    }
    ctx.require_tool(DOTNET)?;
    if ctx.options.install {
        ctx.require_tool("adb")?;
    }

    let platform = ctx.paths.platform_dir(Architecture::Android);
    if !platform.is_dir() {
        ctx.engine.log_message(
            MessageImportance::High,
            "platform/android missing, running prepare first",
        );
        prepare::run(ctx)?;
    }

    for (rid, abi) in &abis {
        ctx.engine.milestone(format!("Publishing {} for {}", ctx.settings.app_name, abi));
        run_command(&publish_command(ctx, rid, abi), ctx.engine).await?;
    }

    ctx.copy_assets(&app_dir(ctx).join("src").join("main").join("assets"))?;

    let gradle = gradle_command(ctx);
    if !ctx.engine.is_dry_run() && !Path::new(&gradle.program).is_file() {
        return Err(TaskError::InvalidProject(format!(
            "Gradle wrapper not found: {}",
            gradle.program
        )));
    }
    ctx.engine.milestone("Packaging APK with Gradle");
    run_command(&gradle, ctx.engine).await?;

    if ctx.engine.is_dry_run() {
        if ctx.options.install {
            let apk = apk_dir(ctx).join("app.apk");
            run_command(&install_command(ctx.options.device.as_deref(), &apk), ctx.engine).await?;
        }
        return Ok(());
    }

    let apk = find_apk(&apk_dir(ctx)).ok_or_else(|| {
        TaskError::ArtifactMissing(format!("no APK in {}", apk_dir(ctx).display()))
    })?;

    let output = ctx.output_dir();
    fs::create_dir_all(&output)?;
    if let Some(name) = apk.file_name() {
        fs::copy(&apk, output.join(name))?;
    }
    ctx.engine.milestone(format!("APK ready: {}", apk.display()));

    if ctx.options.install {
        run_command(&install_command(ctx.options.device.as_deref(), &apk), ctx.engine).await?;
        ctx.engine.milestone("Installed on device");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BuildEngine;
    use crate::models::TaskKind;
    use crate::tasks::test_support::Fixture;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_check_environment() {
        let lookup = env_of(&[]);
        match check_environment(&lookup) {
            Err(TaskError::MissingEnvironment(vars)) => assert!(vars.contains("ANDROID_HOME")),
            other => panic!("expected missing SDK, got {:?}", other),
        }

        let lookup = env_of(&[("ANDROID_HOME", "/opt/sdk")]);
        match check_environment(&lookup) {
            Err(TaskError::MissingEnvironment(vars)) => assert!(vars.contains("ANDROID_NDK_HOME")),
            other => panic!("expected missing NDK, got {:?}", other),
        }

        let lookup = env_of(&[
            ("ANDROID_HOME", "  "),
            ("ANDROID_SDK_ROOT", "/opt/sdk"),
            ("ANDROID_NDK_ROOT", "/opt/ndk"),
        ]);
        assert_eq!(
            check_environment(&lookup).unwrap(),
            ("/opt/sdk".to_string(), "/opt/ndk".to_string())
        );
    }

    #[test]
    fn test_target_abis() {
        assert_eq!(target_abis(None).unwrap().len(), 2);
        assert_eq!(
            target_abis(Some("linux-bionic-x64")).unwrap(),
            vec![("linux-bionic-x64", "x86_64")]
        );
        assert!(target_abis(Some("android-arm64")).is_err());
    }

    #[test]
    fn test_publish_into_jni_libs() {
        let fixture = Fixture::new();
        let options = fixture.options(TaskKind::Build, Architecture::Android);
        let engine = BuildEngine::new("build/android", true);
        let ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();

        let spec = publish_command(&ctx, "linux-bionic-arm64", "arm64-v8a");
        assert!(spec.has_arg("linux-bionic-arm64"));
        assert!(spec.has_arg("-p:NativeLib=Shared"));
        assert!(spec.has_arg("-p:DisableUnsupportedError=true"));
        let o = spec.args.iter().position(|a| a == "-o").unwrap();
        assert!(spec.args[o + 1].ends_with("platform/android/app/src/main/jniLibs/arm64-v8a"));
    }

    #[test]
    fn test_gradle_and_adb_commands() {
        let fixture = Fixture::new();
        let options = fixture.options(TaskKind::Build, Architecture::Android);
        let engine = BuildEngine::new("build/android", true);
        let ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();

        let gradle = gradle_command(&ctx);
        assert!(gradle.program.contains("gradlew"));
        assert_eq!(gradle.args, vec!["assembleRelease".to_string()]);

        let apk = Path::new("/tmp/app-release.apk");
        assert_eq!(
            install_command(Some("emulator-5554"), apk).to_string(),
            "adb -s emulator-5554 install -r /tmp/app-release.apk"
        );
        assert_eq!(
            install_command(None, apk).to_string(),
            "adb install -r /tmp/app-release.apk"
        );
    }

    #[test]
    fn test_find_apk() {
        let temp = TempDir::new().unwrap();
        assert!(find_apk(temp.path()).is_none());
        fs::write(temp.path().join("output-metadata.json"), "{}").unwrap();
        fs::write(temp.path().join("app-release-unsigned.apk"), "apk").unwrap();
        assert!(find_apk(temp.path())
            .unwrap()
            .ends_with("app-release-unsigned.apk"));
    }

    #[tokio::test]
    async fn test_dry_run_needs_template() {
        let fixture = Fixture::new();
        let mut options = fixture.options(TaskKind::Build, Architecture::Android);
        options.dry_run = true;
        let engine = BuildEngine::new("build/android", true);
        let ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();

        assert!(matches!(run(&ctx).await, Err(TaskError::MissingTemplate { .. })));

        fs::create_dir_all(fixture.home.join("templates").join("android")).unwrap();
        assert!(run(&ctx).await.is_ok());
    }
}
