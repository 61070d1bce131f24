//! Plugin CLI commands: deploy, list, fetch, delete.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use plugdeploy_core::plugin::walker::RepositoryWalker;
use plugdeploy_core::service::deploy::DeployReport;
use plugdeploy_core::service::webhook::collect_plugin_files;
use plugdeploy_infra::source::local::LocalSourceTree;

use crate::state::ConcreteDeploymentService;

/// Walk `dir` and deploy every plugin directory below it.
///
/// # Examples
///
/// ```bash
/// plugdeploy deploy ./model_plugins
/// plugdeploy --config staging.toml deploy ./model_plugins --json
/// ```
pub async fn deploy_dir(
    deployer: &ConcreteDeploymentService,
    walker: &RepositoryWalker,
    dir: &Path,
    json: bool,
) -> Result<()> {
    let metadata = tokio::fs::metadata(dir)
        .await
        .with_context(|| format!("cannot read {}", dir.display()))?;
    anyhow::ensure!(metadata.is_dir(), "{} is not a directory", dir.display());

    let tree = LocalSourceTree::new(dir);
    let files = collect_plugin_files(walker, &tree, "").await?;
    if files.is_empty() {
        if json {
            println!("{}", serde_json::to_string_pretty(&DeployReport::default())?);
        } else {
            println!();
            println!(
                "  {} No plugin files found under {}",
                style("i").blue().bold(),
                style(dir.display()).yellow()
            );
            println!();
        }
        return Ok(());
    }

    let report = deployer.deploy(files).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Deployed {} artifact{}",
        style("✓").green().bold(),
        style(report.stored_artifacts).bold(),
        if report.stored_artifacts == 1 { "" } else { "s" }
    );
    if !report.deployed_types.is_empty() {
        println!(
            "  {} Schema types: {}",
            style("•").cyan(),
            report.deployed_types.join(", ")
        );
    }
    if !report.excluded_types.is_empty() {
        println!(
            "  {} Skipped built-in types: {}",
            style("•").dim(),
            style(report.excluded_types.join(", ")).dim()
        );
    }
    println!();
    Ok(())
}

/// List every deployed plugin.
pub async fn list_plugins(deployer: &ConcreteDeploymentService, json: bool) -> Result<()> {
    let plugins = deployer.list_plugins().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "plugin_list": plugins }))?
        );
        return Ok(());
    }

    if plugins.is_empty() {
        println!();
        println!(
            "  {} No plugins deployed. Deploy some with: {}",
            style("i").blue().bold(),
            style("plugdeploy deploy <dir>").yellow()
        );
        println!();
        return Ok(());
    }

    let bucket = deployer.plugin_store().bucket().to_string();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Plugin").fg(Color::White),
        Cell::new("Bucket").fg(Color::White),
    ]);
    for name in &plugins {
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(&bucket).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} plugin{}",
        style(plugins.len()).bold(),
        if plugins.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Download every artifact of `name` into `dir`, recreating the original
/// `<name>/<relative path>` layout.
pub async fn fetch_plugin(
    deployer: &ConcreteDeploymentService,
    name: &str,
    dir: &Path,
    json: bool,
) -> Result<()> {
    let files = deployer.fetch_plugin(name).await?;
    anyhow::ensure!(!files.is_empty(), "plugin '{name}' is not deployed");

    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        let target = target_path(dir, &file.path)
            .with_context(|| format!("refusing to write stored path '{}'", file.path))?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        tokio::fs::write(&target, &file.contents)
            .await
            .with_context(|| format!("cannot write {}", target.display()))?;
        written.push(target);
    }

    if json {
        let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "plugin": name, "files": paths }))?
        );
    } else {
        println!(
            "  {} Fetched {} file{} of {} into {}",
            style("✓").green().bold(),
            written.len(),
            if written.len() == 1 { "" } else { "s" },
            style(name).bold(),
            style(dir.display()).cyan()
        );
    }
    Ok(())
}

/// `dir` joined with a stored path, or `None` if the path would leave `dir`.
fn target_path(dir: &Path, stored_path: &str) -> Option<PathBuf> {
    let relative = Path::new(stored_path);
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| dir.join(relative))
}

/// Delete the named plugins. Unknown names are not an error.
pub async fn delete_plugins(
    deployer: &ConcreteDeploymentService,
    names: &[String],
    json: bool,
) -> Result<()> {
    let deleted = deployer.delete_plugins(names).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": names, "artifacts_removed": deleted })
        );
    } else {
        println!(
            "  {} Deleted {} ({} artifact{} removed)",
            style("✓").green().bold(),
            style(names.join(", ")).bold(),
            deleted,
            if deleted == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
