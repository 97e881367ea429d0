use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::tools::words::{DEFAULT_TOP, export, read_text_file, render, word_frequencies};

#[derive(Args, Debug)]
pub struct WordsArgs {
    /// Text file to analyse (.txt)
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,

    /// Text to analyse
    #[arg(long)]
    pub(crate) text: Option<String>,

    /// Number of words to list
    #[arg(long, default_value_t = DEFAULT_TOP)]
    pub(crate) top: usize,

    /// Write the `word: count` lines to this file
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

pub fn handle(args: WordsArgs) -> anyhow::Result<()> {
    let text = match (&args.file, args.text) {
        (Some(path), None) => read_text_file(path)?,
        (None, Some(text)) => text,
        (Some(_), Some(_)) => anyhow::bail!("use either --file or --text, not both"),
        (None, None) => anyhow::bail!("either --file or --text is required"),
    };
    let frequencies = word_frequencies(&text, args.top)?;
    print!("{}", render(&frequencies));
    if let Some(path) = args.export {
        export(&path, &frequencies)?;
        info!(path = %path.display(), "results exported");
    }
    Ok(())
}
