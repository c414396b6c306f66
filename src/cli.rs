use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a single HR question from the command line.
    Ask {
        /// The question text
        question: String,

        /// Mapped employee context file (overrides config)
        #[clap(short, long)]
        context: Option<String>,

        /// Prebuilt corpus file (overrides config)
        #[clap(short = 'k', long)]
        corpus: Option<String>,
    },

    /// Start hrdesk as a service.
    Daemon {},

    /// Vectorize a raw corpus into a prebuilt knowledge file.
    ///
    /// Runs once per corpus change; the daemon and `ask` consume the
    /// output file so queries never re-embed the corpus.
    EmbedCorpus {
        /// Raw corpus JSON: an array of {text, metadata} records
        input: String,

        /// Where to write the vectorized corpus
        #[clap(short, long)]
        output: String,
    },
}
