use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todoc_api::endpoints::chat::AiMode;
use todoc_api::endpoints::community::Category;
use todoc_api::endpoints::daily_tips::Language;
use todoc_api::endpoints::kids::Gender;
use todoc_api::endpoints::records::{
    MealType, RecordType, SleepQuality, StoolAmount, StoolColor, StoolCondition, Symptom,
};

#[derive(Parser, Debug)]
#[command(name = "todoc")]
#[command(version)]
#[command(about = "Child-care records, AI chat and community from the terminal", long_about = None)]
pub struct Cli {
    /// Backend base address (overrides configuration)
    #[arg(long, env = "TODOC_API_URL")]
    pub api_url: Option<String>,

    /// Configuration file
    #[arg(short, long, env = "TODOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        email: String,
        #[arg(long, env = "TODOC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        email: String,
        username: String,
        #[arg(long, env = "TODOC_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show where the app would start (login, onboarding or home)
    Status,
    /// Manage kid profiles
    #[command(subcommand)]
    Kids(KidsCommand),
    /// Care records for the selected kid
    Records {
        /// Kid to act on; defaults to the selected kid
        #[arg(long, global = true)]
        kid: Option<i64>,
        #[command(subcommand)]
        command: RecordsCommand,
    },
    /// AI chat sessions
    #[command(subcommand)]
    Chat(ChatCommand),
    /// Community posts and comments
    #[command(subcommand)]
    Community(CommunityCommand),
    /// Show a random daily tip
    Tip {
        #[arg(long, default_value = "kor")]
        language: Language,
    },
}

#[derive(Subcommand, Debug)]
pub enum KidsCommand {
    List,
    Add {
        name: String,
        /// YYYY-MM-DD
        birth_date: NaiveDate,
        gender: Gender,
    },
    Show {
        id: i64,
    },
    Rename {
        id: i64,
        name: String,
    },
    Delete {
        id: i64,
    },
    /// Make this kid the default and finish onboarding
    Select {
        id: i64,
    },
    /// Upload a JPEG, PNG, GIF or WebP photo
    Photo {
        id: i64,
        path: PathBuf,
    },
    Dashboard {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    List {
        #[arg(long = "type")]
        record_type: Option<RecordType>,
        #[arg(long)]
        limit: Option<u32>,
    },
    Growth {
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        memo: Option<String>,
    },
    Sleep {
        /// YYYY-MM-DDTHH:MM:SS, UTC
        start: NaiveDateTime,
        end: NaiveDateTime,
        #[arg(long, default_value = "normal")]
        quality: SleepQuality,
        #[arg(long)]
        memo: Option<String>,
    },
    Meal {
        meal_type: MealType,
        #[arg(long)]
        detail: Option<String>,
        #[arg(long)]
        burp: Option<bool>,
        #[arg(long)]
        memo: Option<String>,
    },
    Health {
        symptom: Symptom,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        other: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    Stool {
        amount: StoolAmount,
        condition: StoolCondition,
        color: StoolColor,
        #[arg(long)]
        memo: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChatCommand {
    /// List sessions for a kid
    Sessions {
        #[arg(long)]
        kid: Option<i64>,
    },
    New {
        #[arg(long)]
        kid: Option<i64>,
    },
    Show {
        id: i64,
    },
    Send {
        session: i64,
        message: String,
        #[arg(long, default_value = "doctor")]
        mode: AiMode,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum CommunityCommand {
    Posts {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
    },
    Post {
        category: Category,
        title: String,
        content: String,
        #[arg(long)]
        kid: Option<i64>,
    },
    Show {
        id: i64,
    },
    Like {
        id: i64,
    },
    Delete {
        id: i64,
    },
    Comments {
        post: i64,
    },
    Comment {
        post: i64,
        content: String,
    },
    DeleteComment {
        id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_record_command() {
        let cli = Cli::try_parse_from([
            "todoc", "records", "--kid", "3", "health", "fever", "--temperature", "38.4",
        ])
        .unwrap();

        match cli.command {
            Commands::Records {
                kid,
                command: RecordsCommand::Health {
                    symptom,
                    temperature,
                    ..
                },
            } => {
                assert_eq!(kid, Some(3));
                assert_eq!(symptom, Symptom::Fever);
                assert_eq!(temperature, Some(38.4));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_enum_values() {
        assert!(Cli::try_parse_from(["todoc", "tip", "--language", "fra"]).is_err());
        assert!(Cli::try_parse_from(["todoc", "kids", "add", "Sky", "2024-01-15", "robot"]).is_err());
    }
}
