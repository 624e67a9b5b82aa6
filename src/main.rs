use clap::Parser;
use sentry_event_exporter::cli::Cli;
use sentry_event_exporter::export::{Exporter, ExporterConfig};
use sentry_event_exporter::logging::init_logging;
use sentry_event_exporter::render::CsvRenderer;
use sentry_event_exporter::{ExportError, Result};
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
        // Continue without logging rather than refusing to run.
    }

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => bail(&e),
    };

    if let Err(e) = export(config) {
        bail(&e);
    }
}

/// Run one export against stdout, buffered when stdout is not a terminal.
fn export(config: ExporterConfig) -> Result<()> {
    let stdout = io::stdout();
    if stdout.is_terminal() {
        Exporter::from_config(config, CsvRenderer::excel_csv(stdout.lock()))?.export()
    } else {
        let mut out = BufWriter::new(stdout.lock());
        let result = Exporter::from_config(config, CsvRenderer::excel_csv(&mut out))
            .and_then(Exporter::export);
        // Flush whatever was rendered even when a late fetch failed.
        let flushed = out.flush();
        result?;
        flushed?;
        Ok(())
    }
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg| {
            Path::new(&arg)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| env!("CARGO_BIN_NAME").to_string())
}

fn bail(err: &ExportError) -> ! {
    eprintln!("{}: {err}", program_name());
    std::process::exit(err.exit_code());
}
