//! `build`: publish the project with `dotnet` and package it per architecture.
//!
//! Each target module exposes pure `*_command` constructors so the exact
//! command lines can be checked without a toolchain, plus an async `run`.

pub mod android;
pub mod desktop;
pub mod ios;
pub mod web;

use std::path::Path;

use crate::orchestrator::executor::CommandSpec;

use super::TaskContext;

pub const DOTNET: &str = "dotnet";

/// `dotnet publish <csproj> -c <Cfg> -r <rid> -p:PublishAot=true ... -o <out>`
///
/// `extra` carries the target-specific switches; the project's
/// `msbuild_properties` follow them so a project can override a default.
pub fn dotnet_publish(ctx: &TaskContext<'_>, rid: &str, output: &Path, extra: &[&str]) -> CommandSpec {
    let mut spec = CommandSpec::new(DOTNET)
        .arg("publish")
        .path_arg(ctx.paths.csproj())
        .args(["-c", ctx.options.build_type.configuration()])
        .args(["-r", rid])
        .arg("-p:PublishAot=true")
        .args(extra.iter().copied());

    for (key, value) in &ctx.settings.msbuild_properties {
        spec = spec.arg(format!("-p:{}={}", key, value));
    }

    spec.arg(format!("-maxcpucount:{}", num_cpus::get()))
        .arg("-o")
        .path_arg(output)
        .current_dir(ctx.paths.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BuildEngine;
    use crate::models::{Architecture, BuildType, TaskKind};
    use crate::tasks::test_support::Fixture;

    #[test]
    fn test_dotnet_publish_shape() {
        let fixture = Fixture::new();
        let mut options = fixture.options(TaskKind::Build, Architecture::Desktop);
        options.build_type = BuildType::Debug;
        let engine = BuildEngine::new("build/desktop", true);
        let mut ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();
        ctx.settings
            .msbuild_properties
            .insert("InvariantGlobalization".to_string(), "true".to_string());

        let out = ctx.output_dir();
        let spec = dotnet_publish(&ctx, "linux-x64", &out, &["--self-contained", "true"]);

        assert_eq!(spec.program, "dotnet");
        assert_eq!(spec.args[0], "publish");
        assert!(spec.args[1].ends_with("cube.csproj"));
        assert_eq!(&spec.args[2..6], &["-c", "Debug", "-r", "linux-x64"]);
        assert!(spec.has_arg("-p:PublishAot=true"));
        assert!(spec.has_arg("-p:InvariantGlobalization=true"));
        assert!(spec.args.iter().any(|a| a.starts_with("-maxcpucount:")));

        let o = spec.args.iter().position(|a| a == "-o").unwrap();
        assert!(spec.args[o + 1].ends_with("output/desktop/Debug"));
        assert_eq!(spec.cwd.as_deref(), Some(ctx.paths.root()));
    }
}
