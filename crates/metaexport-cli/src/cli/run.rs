use super::args::{Cli, InputFormat};
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use metaexport_core::config::{load_config, DEFAULT_CONFIG_FILE};
use metaexport_core::host::{self, libtest, HostEvent};
use metaexport_core::report::console;
use metaexport_core::{RecorderConfig, RunRecorder};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = resolve_config(&cli)?;
    let events = match &cli.events {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open event stream {}", path.display()))?;
            read_events(BufReader::new(file), cli.format)?
        }
        None => read_events(std::io::stdin().lock(), cli.format)?,
    };
    tracing::debug!(count = events.len(), "events loaded");

    let extra_options = if cli.collect_only {
        vec!["collect_only".to_string()]
    } else {
        Vec::new()
    };
    let mut recorder = RunRecorder::new(config);
    let outcome = host::replay(&mut recorder, events, &extra_options)?;
    console::print_outcome(&outcome);
    Ok(SUCCESS)
}

fn read_events(reader: impl BufRead, format: InputFormat) -> anyhow::Result<Vec<HostEvent>> {
    let events = match format {
        InputFormat::Native => host::parse_jsonl(reader)?,
        InputFormat::Libtest => libtest::translate(reader)?,
    };
    Ok(events)
}

/// File config (explicit, or the default file when present) overlaid with flags.
pub(crate) fn resolve_config(cli: &Cli) -> anyhow::Result<RecorderConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            load_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => RecorderConfig::default(),
    };
    if let Some(out) = &cli.metaexport_json {
        config.output = Some(out.clone());
    }
    if cli.always_emit {
        config.always_emit = true;
    }
    if cli.compact {
        config.pretty = false;
    }
    Ok(config)
}
