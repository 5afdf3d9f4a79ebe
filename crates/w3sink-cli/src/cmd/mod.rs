pub mod check;
pub mod convert;
pub mod replay;
pub mod stats;

use std::path::Path;

use w3sink_core::file_source::{FileSource, SourceError, SourceFormat, open_source};

use crate::output::{CliError, OutputMode, render_error};

/// Render `err` in the requested mode and turn it into the command failure.
pub fn report(output: OutputMode, err: SourceError) -> anyhow::Error {
    if let Err(render_err) = render_error(output, &CliError::from(&err)) {
        return render_err;
    }
    anyhow::Error::new(err)
}

/// Open `path` as a file source, rendering load failures.
pub fn open(
    path: &Path,
    source_id: &str,
    forced: Option<SourceFormat>,
    output: OutputMode,
) -> anyhow::Result<Box<dyn FileSource>> {
    open_source(path, source_id, forced).map_err(|err| report(output, err))
}
