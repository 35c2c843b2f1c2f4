use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tripboard")]
#[command(about = "Plan a trip with friends around a shared list of places to stay")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a place to stay
    Add {
        /// Name of the place
        #[arg(required = true)]
        name: Vec<String>,
        #[command(flatten)]
        fields: PlaceFields,
    },
    /// List places, most votes first
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Vote for a place
    Vote {
        /// Place ID or unique ID prefix
        id: String,
        /// Number of votes to add
        #[arg(long, default_value = "1")]
        times: u32,
    },
    /// Edit a place (opens $EDITOR on the notes when no field is given)
    Edit {
        /// Place ID or unique ID prefix
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: PlaceFields,
        /// Remove all images before adding new ones
        #[arg(long)]
        clear_images: bool,
    },
    /// Delete a place
    #[command(alias = "rm")]
    Delete {
        /// Place ID or unique ID prefix
        id: String,
    },
    /// Delete every place on the list
    Clear {
        /// Confirm deleting everything
        #[arg(long)]
        yes: bool,
    },
    /// Show or set trip details (budget, party size, style)
    Details {
        #[command(flatten)]
        details: DetailFields,
        /// Remove the trip details
        #[arg(long, conflicts_with_all = ["budget", "people", "style"])]
        clear: bool,
    },
    /// Ask for suggested places and add them to the list
    Suggest {
        #[command(flatten)]
        details: DetailFields,
    },
    /// Share the trip and print its link
    Share {
        /// Address the link points at
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Include connection credentials in the link
        #[arg(long)]
        with_credentials: bool,
    },
    /// Open a shared trip by link or ID
    Open {
        /// Share link or trip ID
        target: String,
    },
    /// Leave the current trip and start an empty local draft
    New,
    /// Show recently visited trips
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow the trip and print the list whenever it changes
    Watch,
    /// Manage stored connection credentials
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

/// Descriptive fields of a place
#[derive(Args, Debug, Default, Clone)]
pub struct PlaceFields {
    /// Price per night, e.g. 1500 or 1200-1800
    #[arg(long)]
    pub price: Option<String>,
    /// Booking or search link
    #[arg(long)]
    pub link: Option<String>,
    /// Map link
    #[arg(long, value_name = "URL")]
    pub location_link: Option<String>,
    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
    /// Image file or URL (repeatable)
    #[arg(long = "image", value_name = "PATH|URL")]
    pub images: Vec<String>,
}

impl PlaceFields {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.link.is_none()
            && self.location_link.is_none()
            && self.notes.is_none()
            && self.images.is_empty()
    }
}

/// Trip details, each optional
#[derive(Args, Debug, Default, Clone)]
pub struct DetailFields {
    /// Budget per night
    #[arg(long)]
    pub budget: Option<String>,
    /// Party size
    #[arg(long)]
    pub people: Option<String>,
    /// Preferred style, e.g. beachfront, quiet, party
    #[arg(long)]
    pub style: Option<String>,
}

impl DetailFields {
    pub const fn is_empty(&self) -> bool {
        self.budget.is_none() && self.people.is_none() && self.style.is_none()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the connection in use and where it comes from
    Show,
    /// Store connection credentials
    Set {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: String,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: String,
    },
    /// Forget stored connection credentials
    Clear,
}
