use std::io::{self, IsTerminal};

use anyhow::Result;
use fuzzmatch_cli::pipeline::{DatasetProfile, RunOutcome, RunRequest, inspect_dataset, run_match};
use fuzzmatch_cli::settings::{load_run_file, merge};
use fuzzmatch_engine::ProgressUpdate;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::cli::{InspectArgs, MatchArgs};

pub fn run_match_command(args: &MatchArgs) -> Result<RunOutcome> {
    let base = args.config.as_deref().map(load_run_file).transpose()?;
    let config = merge(base, &args.overrides())?;

    let request = RunRequest {
        left: args.left.clone(),
        right: args.right.clone(),
        left_sheet: args.left_sheet.clone(),
        right_sheet: args.right_sheet.clone(),
        output: args.output.clone(),
        format: args.format.map(Into::into),
        config,
    };

    let bar = progress_bar(args.no_progress);
    let result = run_match(&request, |update| match update {
        ProgressUpdate::Progress { completed, total } => {
            bar.set_length(total as u64);
            bar.set_position(completed as u64);
        }
        ProgressUpdate::Done => bar.set_message("writing"),
    });
    bar.finish_and_clear();
    result
}

pub fn run_inspect(args: &InspectArgs) -> Result<DatasetProfile> {
    inspect_dataset(&args.file, args.sheet.as_deref())
}

fn progress_bar(hidden: bool) -> ProgressBar {
    let bar = ProgressBar::new(0);
    if hidden || !io::stderr().is_terminal() {
        bar.set_draw_target(ProgressDrawTarget::hidden());
        return bar;
    }
    if let Ok(style) = ProgressStyle::with_template(
        "{msg:>8} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("matching");
    bar
}
