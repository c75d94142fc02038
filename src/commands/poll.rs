use crate::commands::projects::parse_project_list;
use crate::errors::StoreError;
use crate::handlers::reveal::handle_reveal_command;
use crate::models::{Credential, ViewerId};
use crate::state::AppState;
use log::{info, warn};
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::*;

pub fn create_poll_command(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("poll")
        .description("Create polls and reveal their results")
        .create_option(|option| {
            option
                .name("register")
                .description("Register as an organizer")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("username")
                        .description("Organizer name shown on your polls")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("create")
                .description("Create a poll with its projects and vote counts")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("title")
                        .description("Name of the voting event")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("projects")
                        .description("`Team | Project | votes [| description]` separated by `;`, or a JSON array")
                        .kind(CommandOptionType::String)
                        .required(true)
                })
        })
        .create_option(|option| {
            option
                .name("mine")
                .description("List the polls you created")
                .kind(CommandOptionType::SubCommand)
        })
        .create_option(|option| {
            option
                .name("reveal")
                .description("Reveal the ranked results of a poll")
                .kind(CommandOptionType::SubCommand)
                .create_sub_option(|sub_option| {
                    sub_option
                        .name("poll")
                        .description("Poll id, `mock`, or a results link with `?voteId=`")
                        .kind(CommandOptionType::String)
                        .required(false)
                })
        })
}

pub async fn handle_poll_command(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Get the subcommand
    let subcommand = match command.data.options.first() {
        Some(option) => option,
        None => {
            send_ephemeral(ctx, command, "No subcommand provided").await?;
            return Ok(());
        }
    };

    match subcommand.name.as_str() {
        "register" => handle_register(state, ctx, command, &subcommand.options).await?,
        "create" => handle_create_poll(state, ctx, command, &subcommand.options).await?,
        "mine" => handle_list_polls(state, ctx, command).await?,
        "reveal" => handle_reveal_command(state, ctx, command, string_option(&subcommand.options, "poll")).await?,
        _ => {
            send_ephemeral(ctx, command, "Unknown subcommand").await?;
        }
    }

    Ok(())
}

fn string_option(options: &[CommandDataOption], name: &str) -> Option<String> {
    options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref())
        .and_then(|value| value.as_str())
        .map(str::to_string)
}

async fn handle_register(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    options: &[CommandDataOption],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let username = string_option(options, "username").unwrap_or_default();
    let reply = match state.database.register_organizer(&command.user.id.to_string(), &username).await {
        Ok(organizer) => format!("Welcome, **{}**! You can now create and reveal polls.", organizer.username),
        Err(StoreError::Conflict(reason)) | Err(StoreError::Invalid(reason)) => {
            format!("Could not register: {}.", reason)
        }
        Err(e) => return Err(e.into()),
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_create_poll(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    options: &[CommandDataOption],
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(owner_id) = require_organizer(state, ctx, command).await? else {
        return Ok(());
    };

    let title = string_option(options, "title").unwrap_or_default();
    let projects = match parse_project_list(&string_option(options, "projects").unwrap_or_default()) {
        Ok(projects) => projects,
        Err(e) => {
            send_ephemeral(ctx, command, &format!("Could not read the projects: {}", e)).await?;
            return Ok(());
        }
    };

    let reply = match state.store.create_poll(&title, owner_id, &projects).await {
        Ok(poll_id) => {
            info!("Organizer {} created poll {}", owner_id, poll_id);
            format!(
                "Created poll **{}** (id {}) with {} projects. Reveal it with `/poll reveal poll:{}`.",
                title.trim(),
                poll_id,
                projects.len(),
                poll_id
            )
        }
        Err(StoreError::Invalid(reason)) => format!("Could not create the poll: {}.", reason),
        Err(e) => return Err(e.into()),
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

async fn handle_list_polls(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(owner_id) = require_organizer(state, ctx, command).await? else {
        return Ok(());
    };

    let polls = state.store.list_polls_owned_by(owner_id).await?;
    let reply = if polls.is_empty() {
        "You have not created any polls yet.".to_string()
    } else {
        let mut listing = String::from("**Your polls**\n");
        for poll in &polls {
            listing.push_str(&format!(
                "`{}` {} · created {}\n",
                poll.id,
                poll.title,
                poll.created_at.format("%Y-%m-%d %H:%M UTC")
            ));
        }
        listing
    };
    send_ephemeral(ctx, command, &reply).await?;
    Ok(())
}

// Replies on its own and yields None when the caller is not a registered organizer
async fn require_organizer(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
) -> Result<Option<ViewerId>, serenity::Error> {
    let credential = Credential::new(command.user.id.to_string());
    match state.guard.verify(&credential).await {
        Ok(viewer_id) => Ok(Some(viewer_id)),
        Err(e) => {
            warn!("Rejected /poll from {}: {}", command.user.id, e);
            send_ephemeral(ctx, command, "Register first with `/poll register`.").await?;
            Ok(None)
        }
    }
}

async fn send_ephemeral(
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    content: &str,
) -> Result<(), serenity::Error> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await
}
