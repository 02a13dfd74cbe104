use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "probe-page")]
#[command(about = "Walks and verifies live web pages from generated test instructions")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL (overrides config and WEBDRIVER_URL)
    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    /// Directory screenshots are written to
    #[arg(long, global = true)]
    pub screenshots_dir: Option<PathBuf>,

    /// Root directory of saved tests
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run instructions against a URL
    Run {
        /// Page to test
        url: String,

        /// File holding the instruction text
        #[arg(short, long)]
        instructions: Option<PathBuf>,

        /// Intent phrase for the navigation walk
        #[arg(long)]
        intent: Option<String>,

        /// Name shown in the report
        #[arg(long)]
        name: Option<String>,
    },

    /// Save generated instructions as a test
    Save {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        prompt: String,
        /// File holding the generated text
        #[arg(long)]
        code: PathBuf,
    },

    /// Run a saved test
    RunSaved {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test: String,
        /// Intent phrase for the navigation walk
        #[arg(long)]
        intent: Option<String>,
    },

    /// List saved tests
    List {
        #[arg(long)]
        project: Option<String>,
    },

    /// Print a saved test's config and instructions
    Show {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test: String,
    },

    /// Replace a saved test's instructions
    UpdateCode {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test: String,
        #[arg(long)]
        code: PathBuf,
    },

    /// Delete a saved test
    Delete {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test: String,
    },
}
