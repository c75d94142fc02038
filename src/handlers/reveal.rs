use crate::config::RevealConfig;
use crate::handlers::frames::{compose, list_frame, podium_frame, reveal_notice};
use crate::models::{Credential, RankedResult};
use crate::reveal::{
    acquire_results, compute_ranked_results, poll_token_from_location, Lookup, RevealSchedule, RevealSession,
    RevealStage,
};
use crate::state::AppState;
use log::{debug, error, info, warn};
use serenity::builder::CreateComponents;
use serenity::http::Http;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::id::{ChannelId, MessageId};
use serenity::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, sleep_until, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealAction {
    ShowPodium,
    ShowList,
}

// Format: reveal_(podium|list)_<session_id>
pub fn parse_reveal_custom_id(custom_id: &str) -> Option<(RevealAction, Uuid)> {
    let (action, session_id) = if let Some(rest) = custom_id.strip_prefix("reveal_podium_") {
        (RevealAction::ShowPodium, rest)
    } else if let Some(rest) = custom_id.strip_prefix("reveal_list_") {
        (RevealAction::ShowList, rest)
    } else {
        return None;
    };
    Uuid::parse_str(session_id).ok().map(|id| (action, id))
}

pub async fn handle_reveal_command(
    state: &AppState,
    ctx: &Context,
    command: &ApplicationCommandInteraction,
    location: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content("Loading results..."))
        })
        .await?;

    let poll_token = location.as_deref().and_then(poll_token_from_location);
    let credential = Credential::new(command.user.id.to_string());
    let acquisition = acquire_results(state.store.as_ref(), poll_token.as_deref(), &credential).await;

    let results = match compute_ranked_results(&acquisition.records) {
        Ok(results) => results,
        Err(e) => {
            error!("Cannot rank results for token {:?}: {}", poll_token, e);
            command
                .edit_original_interaction_response(&ctx.http, |response| {
                    response.content(format!("These results cannot be shown: {}", e))
                })
                .await?;
            return Ok(());
        }
    };

    let message = command.get_interaction_response(&ctx.http).await?;
    let session = RevealSession::start(results, state.reveal_config.clone());
    let session_id = state.reveals.insert(command.channel_id.0, command.user.id.0, session.clone());
    info!(
        "Started reveal {} in channel {} (sample data: {})",
        session_id, command.channel_id, acquisition.use_sample
    );

    let http = Arc::clone(&ctx.http);
    let reveals = Arc::clone(&state.reveals);
    let notice = reveal_notice(&acquisition);
    tokio::spawn(async move {
        let player = RevealPlayer { http, channel_id: message.channel_id, message_id: message.id, session_id, notice };
        if let Err(e) = player.play(session).await {
            // The message is unusable; retire the session with it
            warn!("Reveal {} stopped rendering: {}", session_id, e);
            reveals.remove(&session_id);
        }
    });

    Ok(())
}

pub async fn handle_reveal_button(
    state: &AppState,
    ctx: &Context,
    component: &MessageComponentInteraction,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let custom_id = &component.data.custom_id;
    let Some((action, session_id)) = parse_reveal_custom_id(custom_id) else {
        warn!("Unparseable reveal custom_id: {}", custom_id);
        return respond_ephemeral(ctx, component, "Unknown button action.").await;
    };

    match state.reveals.control(&session_id, component.user.id.0) {
        Ok(session) => {
            let changed = match action {
                RevealAction::ShowPodium => session.request_show_podium(),
                RevealAction::ShowList => session.request_show_list(),
            };
            debug!(
                "Reveal {} {:?} (changed: {}, now {:?})",
                session_id,
                action,
                changed,
                session.current_mode()
            );
            // The player re-renders the message on its own
            component
                .create_interaction_response(&ctx.http, |response| {
                    response.kind(InteractionResponseType::DeferredUpdateMessage)
                })
                .await?;
            Ok(())
        }
        Err(Lookup::Missing) => respond_ephemeral(ctx, component, "This reveal has ended.").await,
        Err(Lookup::NotPresenter) => {
            respond_ephemeral(ctx, component, "Only the presenter can control this reveal.").await
        }
    }
}

async fn respond_ephemeral(
    ctx: &Context,
    component: &MessageComponentInteraction,
    content: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    component
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;
    Ok(())
}

fn controls(components: &mut CreateComponents, session_id: Uuid, stage: RevealStage) -> &mut CreateComponents {
    components.create_action_row(|row| {
        row.create_button(|button| {
            button
                .custom_id(format!("reveal_podium_{}", session_id))
                .label("Show podium")
                .style(ButtonStyle::Primary)
                .disabled(stage != RevealStage::ListReveal)
        })
        .create_button(|button| {
            button
                .custom_id(format!("reveal_list_{}", session_id))
                .label("Show list")
                .style(ButtonStyle::Secondary)
                .disabled(stage != RevealStage::PodiumReveal)
        })
    })
}

enum Wake {
    Changed(bool),
    Played(Result<(), serenity::Error>),
}

// Edits one channel message to follow a session's stages
struct RevealPlayer {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    session_id: Uuid,
    notice: Option<String>,
}

impl RevealPlayer {
    async fn play(&self, session: RevealSession) -> Result<(), serenity::Error> {
        let results = session.results();
        let config = session.config();
        let Some(schedule) = session.schedule() else {
            return Ok(());
        };
        let mut updates = session.subscribe();

        loop {
            let snapshot = *updates.borrow_and_update();
            if snapshot.state.torn_down {
                self.finish(&results, &schedule).await?;
                return Ok(());
            }

            let playback = async {
                match snapshot.state.stage {
                    RevealStage::Loading => Ok(()),
                    RevealStage::ListReveal => {
                        // After a podium visit the list comes back fully revealed
                        let animate = snapshot.state.celebration_epoch == 0;
                        self.play_list(&results, &schedule, &config, snapshot.entered_at, animate).await
                    }
                    RevealStage::PodiumReveal => self.play_podium(&schedule, &config).await,
                }
            };

            let wake = tokio::select! {
                changed = updates.changed() => Wake::Changed(changed.is_ok()),
                played = playback => Wake::Played(played),
            };

            match wake {
                Wake::Changed(true) => continue,
                Wake::Changed(false) => return Ok(()),
                Wake::Played(played) => {
                    played?;
                    if updates.changed().await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn play_list(
        &self,
        results: &[RankedResult],
        schedule: &RevealSchedule,
        config: &RevealConfig,
        entered_at: Instant,
        animate: bool,
    ) -> Result<(), serenity::Error> {
        let mut revealed: HashSet<i64> = HashSet::new();
        if !animate {
            revealed.extend(results.iter().map(|result| result.id));
            return self.render(&list_frame(results, &revealed, schedule.max_votes), RevealStage::ListReveal).await;
        }

        self.render(&list_frame(results, &revealed, schedule.max_votes), RevealStage::ListReveal).await?;
        let start = entered_at + config.initial_delay;
        for entry in &schedule.entries {
            sleep_until(start + entry.reveal_delay).await;
            revealed.insert(entry.result_id);
            self.render(&list_frame(results, &revealed, schedule.max_votes), RevealStage::ListReveal).await?;
        }
        Ok(())
    }

    async fn play_podium(&self, schedule: &RevealSchedule, config: &RevealConfig) -> Result<(), serenity::Error> {
        // Restarted from the first frame on every podium entry
        for frame in 0..config.celebration_frames {
            self.render(&podium_frame(&schedule.top_three, Some(frame)), RevealStage::PodiumReveal).await?;
            sleep(config.celebration_frame_interval).await;
        }
        self.render(&podium_frame(&schedule.top_three, None), RevealStage::PodiumReveal).await
    }

    async fn render(&self, frame: &str, stage: RevealStage) -> Result<(), serenity::Error> {
        let content = compose(self.notice.as_deref(), frame);
        self.channel_id
            .edit_message(&self.http, self.message_id, |message| {
                message.content(content).components(|components| controls(components, self.session_id, stage))
            })
            .await?;
        Ok(())
    }

    // Final state without buttons once the session is gone
    async fn finish(&self, results: &[RankedResult], schedule: &RevealSchedule) -> Result<(), serenity::Error> {
        let revealed: HashSet<i64> = results.iter().map(|result| result.id).collect();
        let frame = format!(
            "{}\n{}",
            list_frame(results, &revealed, schedule.max_votes),
            podium_frame(&schedule.top_three, None)
        );
        let content = compose(self.notice.as_deref(), &frame);
        self.channel_id
            .edit_message(&self.http, self.message_id, |message| {
                message.content(content).components(|components| components)
            })
            .await?;
        info!("Reveal {} finished", self.session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reveal_button_ids() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_reveal_custom_id(&format!("reveal_podium_{}", id)),
            Some((RevealAction::ShowPodium, id))
        );
        assert_eq!(parse_reveal_custom_id(&format!("reveal_list_{}", id)), Some((RevealAction::ShowList, id)));
        assert_eq!(parse_reveal_custom_id("reveal_list_not-a-uuid"), None);
        assert_eq!(parse_reveal_custom_id(&format!("vote_{}", id)), None);
    }
}
