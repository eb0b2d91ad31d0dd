use anyhow::{bail, Result};
use todoc_api::endpoints::chat::{ChatMessage, ChatSession, Sender};
use todoc_api::endpoints::community::{Comment, Post};
use todoc_api::endpoints::kids::{Kid, KidChanges};
use todoc_api::endpoints::records::{
    Growth, Health, Meal, Record, RecordFields, Sleep, Stool,
};
use todoc_api::endpoints::KidId;

use super::{ChatCommand, Commands, CommunityCommand, KidsCommand, RecordsCommand};
use crate::onboarding::Route;
use crate::services::{NewPost, RecordFilter};
use crate::App;

/// Handle one CLI subcommand against the app
pub async fn handle_command(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let user = app.login(&email, &password).await?;
            println!("Logged in as {} <{}>", user.username, user.email);
            print_route(app.route()?);
        }
        Commands::Signup {
            email,
            username,
            password,
        } => {
            let user = app.signup(&email, &password, &username).await?;
            println!("Welcome, {}!", user.username);
            print_route(app.route()?);
        }
        Commands::Logout => {
            if app.logout()? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        Commands::Whoami => {
            let user = app.me().await?;
            println!("{} <{}> (id {})", user.username, user.email, user.id);
        }
        Commands::Status => print_route(app.route()?),
        Commands::Kids(command) => handle_kids(app, command).await?,
        Commands::Records { kid, command } => {
            let kid_id = resolve_kid(app, kid)?;
            handle_records(app, kid_id, command).await?;
        }
        Commands::Chat(command) => handle_chat(app, command).await?,
        Commands::Community(command) => handle_community(app, command).await?,
        Commands::Tip { language } => {
            let mut tips = app.tips();
            match tips.random(language).await? {
                Some(tip) => println!("{}", tip.content),
                None => println!("No tips yet"),
            }
        }
    }
    Ok(())
}

fn print_route(route: Route) {
    match route {
        Route::Login => println!("Not logged in. Run `todoc login <email>`."),
        Route::Onboarding => {
            println!("No kid selected yet. Add one with `todoc kids add` and `todoc kids select <id>`.")
        }
        Route::Home => println!("Ready"),
    }
}

fn resolve_kid(app: &App, kid: Option<KidId>) -> Result<KidId> {
    if let Some(kid) = kid {
        return Ok(kid);
    }
    match app.onboarding().selected_kid()? {
        Some(kid) => Ok(kid),
        None => bail!("No kid selected. Pass --kid or run `todoc kids select <id>`."),
    }
}

async fn handle_kids(app: &App, command: KidsCommand) -> Result<()> {
    let mut kids = app.kids();
    match command {
        KidsCommand::List => {
            let selected = app.onboarding().selected_kid()?;
            for kid in kids.load().await? {
                let marker = if Some(kid.id) == selected { "*" } else { " " };
                println!("{} {}", marker, format_kid(kid));
            }
        }
        KidsCommand::Add {
            name,
            birth_date,
            gender,
        } => {
            let kid = kids.create(&name, birth_date, gender).await?;
            println!("Added {}", format_kid(&kid));
            if !app.onboarding().is_completed()? {
                app.onboarding().complete(kid.id)?;
                println!("Selected {} as the default kid", kid.name);
            }
        }
        KidsCommand::Show { id } => println!("{}", format_kid(&kids.get(id).await?)),
        KidsCommand::Rename { id, name } => {
            let changes = KidChanges {
                name: Some(name),
                ..Default::default()
            };
            println!("Updated {}", format_kid(&kids.update(id, changes).await?));
        }
        KidsCommand::Delete { id } => {
            kids.delete(id).await?;
            if app.onboarding().selected_kid()? == Some(id) {
                app.onboarding().reset()?;
            }
            println!("Deleted kid {}", id);
        }
        KidsCommand::Select { id } => {
            let kid = kids.get(id).await?;
            app.onboarding().complete(kid.id)?;
            println!("Selected {}", format_kid(&kid));
        }
        KidsCommand::Photo { id, path } => {
            let kid = kids.upload_photo_file(id, &path).await?;
            println!(
                "Photo stored at {}",
                kid.image_url.as_deref().unwrap_or("(none)")
            );
        }
        KidsCommand::Dashboard { id } => {
            let dashboard = kids.dashboard(id).await?;
            println!("{}", format_kid(&dashboard.kid));
            let recent = [
                ("meal", &dashboard.recent_records.meal),
                ("sleep", &dashboard.recent_records.sleep),
                ("health", &dashboard.recent_records.health),
                ("growth", &dashboard.recent_records.growth),
            ];
            for (label, record) in recent {
                match record {
                    Some(record) => println!("  last {}: {}", label, record),
                    None => println!("  last {}: -", label),
                }
            }
        }
    }
    Ok(())
}

async fn handle_records(app: &App, kid_id: KidId, command: RecordsCommand) -> Result<()> {
    let mut records = app.records(kid_id);
    let memo_fields = |memo: Option<String>| RecordFields {
        memo,
        ..Default::default()
    };

    match command {
        RecordsCommand::List { record_type, limit } => {
            let filter = RecordFilter {
                record_type,
                limit,
                ..Default::default()
            };
            let listed = records.load(filter).await?;
            if listed.is_empty() {
                println!("No records");
            }
            for record in listed {
                println!("{}", format_record(record));
            }
        }
        RecordsCommand::Growth {
            height,
            weight,
            memo,
        } => {
            let detail = Growth {
                height_cm: height,
                weight_kg: weight,
            };
            let created = records.create(detail, memo_fields(memo)).await?;
            println!("Saved growth record {}", created.id);
        }
        RecordsCommand::Sleep {
            start,
            end,
            quality,
            memo,
        } => {
            let detail = Sleep {
                start_datetime: start.and_utc(),
                end_datetime: end.and_utc(),
                sleep_quality: quality,
            };
            let minutes = detail.duration().num_minutes();
            let created = records.create(detail, memo_fields(memo)).await?;
            println!("Saved sleep record {} ({} min)", created.id, minutes);
        }
        RecordsCommand::Meal {
            meal_type,
            detail,
            burp,
            memo,
        } => {
            let detail = Meal {
                meal_type,
                meal_detail: detail,
                burp,
            };
            let created = records.create(detail, memo_fields(memo)).await?;
            println!("Saved meal record {}", created.id);
        }
        RecordsCommand::Health {
            symptom,
            temperature,
            other,
            memo,
        } => {
            let detail = Health {
                temperature,
                symptom,
                symptom_other: other,
            };
            let created = records.create(detail, memo_fields(memo)).await?;
            println!("Saved health record {}", created.id);
        }
        RecordsCommand::Stool {
            amount,
            condition,
            color,
            memo,
        } => {
            let detail = Stool {
                amount,
                condition,
                color,
            };
            let created = records.create(detail, memo_fields(memo)).await?;
            println!("Saved stool record {}", created.id);
        }
        RecordsCommand::Delete { id } => {
            records.delete(id).await?;
            println!("Deleted record {}", id);
        }
    }
    Ok(())
}

async fn handle_chat(app: &App, command: ChatCommand) -> Result<()> {
    let mut chat = app.chat();
    match command {
        ChatCommand::Sessions { kid } => {
            let kid_id = resolve_kid(app, kid)?;
            for session in chat.load(kid_id).await? {
                println!("{}", format_session(session));
            }
        }
        ChatCommand::New { kid } => {
            let kid_id = resolve_kid(app, kid)?;
            let session = chat.start(kid_id).await?;
            println!("Started {}", format_session(&session));
        }
        ChatCommand::Show { id } => {
            let session = chat.open(id).await?;
            println!("{}", format_session(&session));
            for message in &session.messages {
                println!("{}", format_message(message));
            }
        }
        ChatCommand::Send {
            session,
            message,
            mode,
        } => {
            let reply = chat.send(session, &message, mode).await?;
            println!("{}", format_message(&reply));
        }
        ChatCommand::Delete { id } => {
            chat.delete(id).await?;
            println!("Deleted session {}", id);
        }
    }
    Ok(())
}

async fn handle_community(app: &App, command: CommunityCommand) -> Result<()> {
    let mut community = app.community();
    match command {
        CommunityCommand::Posts {
            category,
            page,
            limit,
        } => {
            for post in community.load(category, page, limit).await? {
                println!("{}", format_post(post));
            }
            if let Some(info) = community.page() {
                println!("page {} of {} posts", info.page, info.total);
                if info.has_more() {
                    println!("more: --page {}", info.page + 1);
                }
            }
        }
        CommunityCommand::Post {
            category,
            title,
            content,
            kid,
        } => {
            let post = community
                .create(NewPost {
                    category,
                    title,
                    content,
                    kid_id: kid,
                    image_url: None,
                })
                .await?;
            println!("Posted {}", format_post(&post));
        }
        CommunityCommand::Show { id } => {
            let post = community.get(id).await?;
            println!("{}", format_post(&post));
            println!("{}", post.content);
        }
        CommunityCommand::Like { id } => {
            let status = community.toggle_like(id).await?;
            let verb = if status.liked { "Liked" } else { "Unliked" };
            println!("{} post {} ({} likes)", verb, id, status.likes_count);
        }
        CommunityCommand::Delete { id } => {
            community.delete(id).await?;
            println!("Deleted post {}", id);
        }
        CommunityCommand::Comments { post } => {
            for comment in community.load_comments(post).await? {
                println!("{}", format_comment(comment));
            }
        }
        CommunityCommand::Comment { post, content } => {
            let comment = community.add_comment(post, &content).await?;
            println!("{}", format_comment(&comment));
        }
        CommunityCommand::DeleteComment { id } => {
            community.delete_comment(id).await?;
            println!("Deleted comment {}", id);
        }
    }
    Ok(())
}

fn format_kid(kid: &Kid) -> String {
    format!(
        "#{} {} ({}, born {})",
        kid.id, kid.name, kid.gender, kid.birth_date
    )
}

fn format_record(record: &Record) -> String {
    let details = &record.details;
    let summary = match (details.temperature, details.height_cm, details.weight_kg) {
        (Some(temperature), _, _) => format!("{:.1}°C", temperature),
        (None, Some(height), Some(weight)) => format!("{} cm, {} kg", height, weight),
        (None, Some(height), None) => format!("{} cm", height),
        (None, None, Some(weight)) => format!("{} kg", weight),
        (None, None, None) => record.fields.memo.clone().unwrap_or_default(),
    };
    format!(
        "#{} {} {} {}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.record_type,
        summary
    )
}

fn format_session(session: &ChatSession) -> String {
    format!(
        "#{} kid {} started {}",
        session.id,
        session.kid_id,
        session.created_at.format("%Y-%m-%d %H:%M")
    )
}

fn format_message(message: &ChatMessage) -> String {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Ai => "ai",
    };
    format!("[{}] {}", who, message.content)
}

fn format_post(post: &Post) -> String {
    let author = post
        .author
        .as_ref()
        .map(|a| a.username.as_str())
        .unwrap_or("unknown");
    format!(
        "#{} [{}] {} by {} ({} likes, {} comments)",
        post.id, post.category, post.title, author, post.likes_count, post.comment_count
    )
}

fn format_comment(comment: &Comment) -> String {
    format!(
        "#{} {}: {}",
        comment.id, comment.author.username, comment.content
    )
}
