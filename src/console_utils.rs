//! Log output that cooperates with progress spinners.

use std::io;

use console::style;
use indicatif::MultiProgress;
use tracing_core::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt::{
        FmtContext, FormatEvent, FormatFields, MakeWriter,
        format::{self, Format, Writer},
    },
    registry::LookupSpan,
    EnvFilter,
};

/// Writes to stderr while the progress bars are hidden, so that log lines
/// and spinners do not interleave.
#[derive(Clone)]
pub struct IndicatifWriter {
    progress_bars: MultiProgress,
}

impl IndicatifWriter {
    pub fn new(pb: MultiProgress) -> Self {
        Self { progress_bars: pb }
    }
}

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress_bars.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.progress_bars.suspend(|| io::stderr().flush())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Plain messages for our own `info` events, prefixed messages for warnings
/// and errors, and the default format for everything else.
pub struct TracingFormatter;

impl<S, N> FormatEvent<S, N> for TracingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let ours = metadata.target().starts_with("pysrpm");

        let level = *metadata.level();
        if !ours || level > Level::INFO {
            return Format::default().format_event(ctx, writer, event);
        }
        if level == Level::WARN {
            write!(writer, "{} ", style("warning:").yellow().bold())?;
        } else if level == Level::ERROR {
            write!(writer, "{} ", style("error:").red().bold())?;
        }

        let mut buffer = String::new();
        ctx.format_fields(Writer::new(&mut buffer), event)?;
        writeln!(writer, "{buffer}")
    }
}

/// The filter for our crates at the requested verbosity, `RUST_LOG` can add
/// more directives.
pub fn get_default_env_filter(verbose: clap_verbosity_flag::VerbosityFilter) -> EnvFilter {
    let level = match verbose {
        clap_verbosity_flag::VerbosityFilter::Off => LevelFilter::OFF,
        clap_verbosity_flag::VerbosityFilter::Error => LevelFilter::ERROR,
        clap_verbosity_flag::VerbosityFilter::Warn => LevelFilter::WARN,
        clap_verbosity_flag::VerbosityFilter::Info => LevelFilter::INFO,
        clap_verbosity_flag::VerbosityFilter::Debug => LevelFilter::DEBUG,
        clap_verbosity_flag::VerbosityFilter::Trace => LevelFilter::TRACE,
    };

    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    for target in [
        "pysrpm",
        "pysrpm_config",
        "pysrpm_template",
        "pysrpm_translate",
        "pysrpm_spec",
    ] {
        if let Ok(directive) = format!("{target}={level}").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}
