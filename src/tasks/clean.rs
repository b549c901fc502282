//! `clean`: remove build outputs for one architecture.

use std::fs;
use std::path::PathBuf;

use crate::engine::MessageImportance;
use crate::error::TaskError;
use crate::models::Architecture;
use crate::system::paths::ProjectPaths;

use super::TaskContext;

/// Directories removed by `clean <arch>`, in removal order.
pub fn clean_targets(paths: &ProjectPaths, arch: Architecture) -> Vec<PathBuf> {
    let mut targets = vec![paths.bin_dir(), paths.obj_dir(), paths.arch_output_root(arch)];
    match arch {
        Architecture::Android => {
            targets.push(paths.platform_dir(arch).join("app").join("build"));
        }
        Architecture::Ios => targets.push(paths.platform_dir(arch).join("build")),
        Architecture::Desktop | Architecture::Web => {}
    }
    targets
}

/// Returns the directories that were (or in dry-run, would be) removed.
pub fn run(ctx: &TaskContext<'_>) -> Result<Vec<PathBuf>, TaskError> {
    let mut removed = Vec::new();

    for target in clean_targets(&ctx.paths, ctx.options.arch) {
        if !target.exists() {
            continue;
        }
        if !ctx.paths.is_within_project(&target) {
            ctx.engine.log_warning(format!(
                "Refusing to remove {} outside the project",
                target.display()
            ));
            continue;
        }

        if ctx.engine.is_dry_run() {
            ctx.engine.log_message(
                MessageImportance::High,
                format!("[dry-run] remove {}", target.display()),
            );
        } else {
            fs::remove_dir_all(&target)?;
            ctx.engine
                .log_message(MessageImportance::Normal, format!("Removed {}", target.display()));
        }
        removed.push(target);
    }

    if removed.is_empty() {
        ctx.engine
            .log_message(MessageImportance::High, "Nothing to clean");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BuildEngine;
    use crate::models::TaskKind;
    use crate::tasks::test_support::Fixture;

    fn populate(root: &std::path::Path) {
        for dir in [
            "bin/Release",
            "obj/Release",
            "output/android/Release",
            "output/web/Release",
            "platform/android/app/build/outputs",
            "platform/android/app/src",
        ] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    #[test]
    fn test_clean_targets_per_arch() {
        let fixture = Fixture::new();
        let paths = ProjectPaths::locate(&fixture.project).unwrap();

        let desktop = clean_targets(&paths, Architecture::Desktop);
        assert_eq!(desktop.len(), 3);

        let ios = clean_targets(&paths, Architecture::Ios);
        assert!(ios.last().unwrap().ends_with("platform/ios/build"));

        let android = clean_targets(&paths, Architecture::Android);
        assert!(android.last().unwrap().ends_with("platform/android/app/build"));
    }

    #[test]
    fn test_clean_android_removes_only_its_outputs() {
        let fixture = Fixture::new();
        populate(&fixture.project);

        let options = fixture.options(TaskKind::Clean, Architecture::Android);
        let engine = BuildEngine::new("clean/android", false);
        let ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();

        let removed = run(&ctx).unwrap();
        assert_eq!(removed.len(), 4);

        let root = ctx.paths.root();
        assert!(!root.join("bin").exists());
        assert!(!root.join("obj").exists());
        assert!(!root.join("output/android").exists());
        assert!(!root.join("platform/android/app/build").exists());
        assert!(root.join("output/web/Release").exists());
        assert!(root.join("platform/android/app/src").exists());
        assert!(root.join("cube.csproj").exists());
    }

    #[test]
    fn test_clean_with_nothing_to_do() {
        let fixture = Fixture::new();
        let options = fixture.options(TaskKind::Clean, Architecture::Web);
        let engine = BuildEngine::new("clean/web", false);
        let ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();
        assert!(run(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_clean_dry_run_lists_without_deleting() {
        let fixture = Fixture::new();
        populate(&fixture.project);

        let mut options = fixture.options(TaskKind::Clean, Architecture::Web);
        options.dry_run = true;
        let engine = BuildEngine::new("clean/web", true);
        let ctx = TaskContext::load(&options, &fixture.home_config, &engine).unwrap();

        let listed = run(&ctx).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(ctx.paths.root().join("bin").exists());
        assert!(ctx.paths.root().join("output/web").exists());
    }
}
