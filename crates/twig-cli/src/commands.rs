use std::collections::HashSet;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use twig_diff::{
    render_text_diff, ChangeStatus, Depth, DiffConfig, DiffEngine, DiffLine, LeafDiff, LeafReport,
};
use twig_store::{list_matching, LocalNode, NodeRef, PathPattern};
use twig_types::NodePath;

use crate::cli::{Cli, Command, DiffArgs, LsArgs, OutputFormat};

/// Counts gathered over one `diff` run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub changed: usize,
    pub errors: usize,
}

impl DiffSummary {
    /// 0 when identical, 1 when something differs, 2 when anything failed.
    pub fn exit_code(&self) -> ExitCode {
        if self.errors > 0 {
            ExitCode::from(2)
        } else if self.changed > 0 {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        }
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Diff(args) => Ok(cmd_diff(&args, cli.format, &mut out)?.exit_code()),
        Command::Ls(args) => {
            cmd_ls(&args, cli.format, &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_tree(path: &std::path::Path) -> anyhow::Result<NodeRef> {
    LocalNode::open(path).with_context(|| format!("cannot open {}", path.display()))
}

fn cmd_diff(args: &DiffArgs, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<DiffSummary> {
    let old_root = open_tree(&args.old)?;
    let new_root = open_tree(&args.new)?;
    let engine = DiffEngine::new(DiffConfig {
        max_depth: Depth::from(args.depth),
        structural: !args.no_structural,
        report_unchanged: false,
        fail_fast: args.fail_fast,
    });

    let globs = if args.patterns.is_empty() {
        vec!["/".to_string()]
    } else {
        args.patterns.clone()
    };

    let mut summary = DiffSummary::default();
    // Overlapping patterns can select the same leaf more than once.
    let mut reported: HashSet<NodePath> = HashSet::new();
    for glob in &globs {
        let pattern = PathPattern::new(glob)?;
        for result in engine.diff_pattern(&pattern, &old_root, &new_root) {
            match result {
                Ok(report) => {
                    if !reported.insert(report.pair.path.clone()) {
                        continue;
                    }
                    summary.changed += 1;
                    write_report(out, &report, args, format)?;
                }
                Err(err) => {
                    summary.errors += 1;
                    eprintln!("{} {err}", "error:".red().bold());
                    if args.fail_fast {
                        return Ok(summary);
                    }
                }
            }
        }
    }
    Ok(summary)
}

fn side_label(node: Option<&NodeRef>, report: &LeafReport) -> String {
    node.map_or_else(|| report.pair.path.to_string(), |n| n.display_path())
}

fn write_report(out: &mut impl Write, report: &LeafReport, args: &DiffArgs, format: OutputFormat) -> io::Result<()> {
    let status = report.status();
    let path = report.pair.path.to_string();
    let old_label = side_label(report.pair.old.as_ref(), report);
    let new_label = side_label(report.pair.new.as_ref(), report);

    if format == OutputFormat::Json {
        let line = json!({
            "path": path,
            "status": status,
            "old": old_label,
            "new": new_label,
            "changes": report.outcome.changes(),
        });
        return writeln!(out, "{line}");
    }
    if args.name_only {
        return writeln!(out, "{path}");
    }
    if args.name_status {
        let code = status.map_or(' ', |s| s.code());
        return writeln!(out, "{code}\t{path}");
    }

    match status {
        None => writeln!(out, "{} {path}", "unchanged".dimmed()),
        Some(ChangeStatus::Added) => writeln!(out, "{} {new_label}", "Only in new:".green()),
        Some(ChangeStatus::Deleted) => writeln!(out, "{} {old_label}", "Only in old:".red()),
        Some(ChangeStatus::Modified) => {
            writeln!(out, "{}", format!("diff --twig {old_label} {new_label}").bold())?;
            write_modified(out, &report.outcome)
        }
    }
}

fn write_modified(out: &mut impl Write, outcome: &LeafDiff) -> io::Result<()> {
    let LeafDiff::Changed { old, new, changes } = outcome else {
        return Ok(());
    };
    if !changes.is_empty() {
        for change in changes {
            writeln!(out, "  {change}")?;
        }
        return Ok(());
    }

    let lines = render_text_diff(old.as_deref(), new.as_deref());
    if lines.binary {
        writeln!(out, "Binary contents differ")?;
    }
    for hunk in &lines.hunks {
        let header = format!(
            "@@ -{},{} +{},{} @@",
            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
        );
        writeln!(out, "{}", header.cyan())?;
        for line in &hunk.lines {
            match line {
                DiffLine::Added(_) => writeln!(out, "{}", line.to_string().green())?,
                DiffLine::Removed(_) => writeln!(out, "{}", line.to_string().red())?,
                DiffLine::Context(_) => writeln!(out, "{line}")?,
            }
        }
    }
    Ok(())
}

fn cmd_ls(args: &LsArgs, format: OutputFormat, out: &mut impl Write) -> anyhow::Result<()> {
    let root = open_tree(&args.root)?;
    let globs = if args.patterns.is_empty() {
        vec!["/*".to_string()]
    } else {
        args.patterns.clone()
    };

    for glob in &globs {
        let pattern = PathPattern::new(glob)?;
        for node in list_matching(&root, &pattern) {
            let node = node?;
            let is_dir = node.is_dir();
            match format {
                OutputFormat::Json => {
                    writeln!(out, "{}", json!({ "path": node.path().to_string(), "dir": is_dir }))?;
                }
                OutputFormat::Text if is_dir && !node.path().is_root() => {
                    writeln!(out, "{}/", node.path())?;
                }
                OutputFormat::Text => writeln!(out, "{}", node.path())?,
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn args(old: &Path, new: &Path) -> DiffArgs {
        DiffArgs {
            old: old.to_path_buf(),
            new: new.to_path_buf(),
            patterns: Vec::new(),
            depth: None,
            name_only: false,
            name_status: false,
            no_structural: false,
            fail_fast: false,
        }
    }

    fn fixture() -> (tempfile::TempDir, tempfile::TempDir) {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        write(old.path(), "roles/web.json", r#"{"port": 80}"#);
        write(new.path(), "roles/web.json", r#"{"port": 81}"#);
        write(old.path(), "roles/db.json", "{}");
        write(new.path(), "roles/cache.json", "{}");
        write(old.path(), "notes.txt", "one\ntwo\n");
        write(new.path(), "notes.txt", "one\nthree\n");
        write(old.path(), "same.txt", "x");
        write(new.path(), "same.txt", "x");
        (old, new)
    }

    fn run(args: &DiffArgs, format: OutputFormat) -> (DiffSummary, String) {
        let mut out = Vec::new();
        let summary = cmd_diff(args, format, &mut out).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn name_status_lists_each_change() {
        let (old, new) = fixture();
        let mut args = args(old.path(), new.path());
        args.name_status = true;
        let (summary, output) = run(&args, OutputFormat::Text);
        assert_eq!(summary, DiffSummary { changed: 4, errors: 0 });
        assert_eq!(
            output,
            "M\t/notes.txt\nD\t/roles/db.json\nM\t/roles/web.json\nA\t/roles/cache.json\n"
        );
    }

    #[test]
    fn text_output_shows_structural_and_line_changes() {
        let (old, new) = fixture();
        let (_, output) = run(&args(old.path(), new.path()), OutputFormat::Text);
        assert!(output.contains("port is 81 in "));
        assert!(output.contains("-two"));
        assert!(output.contains("+three"));
        assert!(output.contains("Only in new:"));
        assert!(output.contains("Only in old:"));
    }

    #[test]
    fn pattern_narrows_the_comparison() {
        let (old, new) = fixture();
        let mut args = args(old.path(), new.path());
        args.patterns = vec!["/roles/web.json".to_string()];
        args.name_only = true;
        let (summary, output) = run(&args, OutputFormat::Text);
        assert_eq!(summary.changed, 1);
        assert_eq!(output, "/roles/web.json\n");
    }

    #[test]
    fn overlapping_patterns_report_each_leaf_once() {
        let (old, new) = fixture();
        let mut args = args(old.path(), new.path());
        args.patterns = vec!["/roles".to_string(), "/roles/*".to_string()];
        args.name_status = true;
        let (summary, output) = run(&args, OutputFormat::Text);
        assert_eq!(summary, DiffSummary { changed: 3, errors: 0 });
        assert_eq!(output, "D\t/roles/db.json\nM\t/roles/web.json\nA\t/roles/cache.json\n");
    }

    #[test]
    fn json_output_is_one_object_per_line() {
        let (old, new) = fixture();
        let mut args = args(old.path(), new.path());
        args.patterns = vec!["/roles/web.json".to_string()];
        let (_, output) = run(&args, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["path"], "/roles/web.json");
        assert_eq!(value["status"], "modified");
        assert_eq!(value["changes"][0]["kind"], "value_mismatch");
        assert_eq!(value["changes"][0]["path"], "port");
    }

    #[test]
    fn identical_trees_exit_cleanly() {
        let old = tempfile::tempdir().unwrap();
        let new = tempfile::tempdir().unwrap();
        write(old.path(), "a.json", r#"{"a":1,"b":2}"#);
        write(new.path(), "a.json", r#"{"b":2,"a":1}"#);
        let (summary, output) = run(&args(old.path(), new.path()), OutputFormat::Text);
        assert_eq!(summary, DiffSummary::default());
        assert!(output.is_empty());
    }

    #[test]
    fn parse_errors_are_counted_and_skipped() {
        let (old, new) = fixture();
        write(new.path(), "roles/web.json", "{broken");
        let mut args = args(old.path(), new.path());
        args.name_only = true;
        let (summary, output) = run(&args, OutputFormat::Text);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.changed, 3);
        assert!(!output.contains("web.json"));
    }

    #[test]
    fn missing_tree_is_an_error() {
        let old = tempfile::tempdir().unwrap();
        let args = args(old.path(), &old.path().join("nope"));
        let mut out = Vec::new();
        assert!(cmd_diff(&args, OutputFormat::Text, &mut out).is_err());
    }

    #[test]
    fn ls_lists_matches() {
        let (old, _new) = fixture();
        let args = LsArgs {
            root: old.path().to_path_buf(),
            patterns: vec!["/roles/*".to_string()],
        };
        let mut out = Vec::new();
        cmd_ls(&args, OutputFormat::Text, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/roles/db.json\n/roles/web.json\n"
        );
    }

    #[test]
    fn ls_defaults_to_top_level() {
        let (old, _new) = fixture();
        let args = LsArgs {
            root: old.path().to_path_buf(),
            patterns: Vec::new(),
        };
        let mut out = Vec::new();
        cmd_ls(&args, OutputFormat::Text, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/notes.txt\n/roles/\n/same.txt\n"
        );
    }
}
