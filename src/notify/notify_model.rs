use std::collections::HashMap;

use serde::Serialize;

use crate::awards::awards_model::AwardTier;
use crate::tracking::tracking_model::{TransitionEvent, TransitionKind};

const COLOR_GREEN: u32 = 0x2ecc71;
const COLOR_RED: u32 = 0xe74c3c;
const COLOR_GOLD: u32 = 0xf1c40f;
const COLOR_BLUE: u32 = 0x3498db;

/// Destination-agnostic rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub title: String,
    pub color: u32,
    pub fields: Vec<MessageField>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl MessageField {
    fn inline(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: true,
        }
    }
}

/// Static mapping from event kind to destination ids. One kind may fan out
/// to several destinations.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<TransitionKind, Vec<String>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&mut self, kind: TransitionKind, destination: impl Into<String>) -> &mut Self {
        self.routes.entry(kind).or_default().push(destination.into());
        self
    }

    pub fn destinations(&self, kind: TransitionKind) -> &[String] {
        self.routes.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Route every event kind to one destination; a convenient starting
    /// point for single-channel hosts.
    pub fn all_to(destination: &str) -> Self {
        let mut table = Self::new();
        for kind in [
            TransitionKind::EnteredTopK,
            TransitionKind::RankImproved,
            TransitionKind::RankDecreased,
            TransitionKind::FellOutOfTopK,
            TransitionKind::TierIncreased,
            TransitionKind::AchievementEarned,
        ] {
            table.add_route(kind, destination);
        }
        table
    }
}

/// Render a transition event into a payload.
pub fn render(event: &TransitionEvent) -> MessagePayload {
    let mut fields = vec![MessageField::inline("Board", event.entity_id.clone())];

    let (title, color) = match event.kind {
        TransitionKind::EnteredTopK => {
            push_rank_fields(&mut fields, event);
            (
                format!(
                    "{} entered the top ranks at #{}",
                    event.subject_key,
                    event.new_rank.unwrap_or(0)
                ),
                COLOR_GREEN,
            )
        }
        TransitionKind::RankImproved => {
            push_rank_fields(&mut fields, event);
            (
                format!(
                    "{} climbed to rank #{}",
                    event.subject_key,
                    event.new_rank.unwrap_or(0)
                ),
                COLOR_GREEN,
            )
        }
        TransitionKind::RankDecreased => {
            push_rank_fields(&mut fields, event);
            (
                format!(
                    "{} slipped to rank #{}",
                    event.subject_key,
                    event.new_rank.unwrap_or(0)
                ),
                COLOR_RED,
            )
        }
        TransitionKind::FellOutOfTopK => {
            push_rank_fields(&mut fields, event);
            (
                format!("{} fell out of the top ranks", event.subject_key),
                COLOR_RED,
            )
        }
        TransitionKind::TierIncreased => {
            let tier = event.tier.unwrap_or(AwardTier::None);
            if let (Some(achieved), Some(total)) = (event.achieved_count, event.total_required) {
                fields.push(MessageField::inline(
                    "Progress",
                    format!("{}/{}", achieved, total),
                ));
            }
            (
                format!("{} reached {}", event.subject_key, tier),
                COLOR_GOLD,
            )
        }
        TransitionKind::AchievementEarned => {
            if let Some(id) = event.achievement_id {
                fields.push(MessageField::inline("Achievement", format!("#{}", id)));
            }
            (
                format!("{} earned a new achievement", event.subject_key),
                COLOR_BLUE,
            )
        }
    };

    MessagePayload {
        title,
        color,
        fields,
        thumbnail: None,
    }
}

fn push_rank_fields(fields: &mut Vec<MessageField>, event: &TransitionEvent) {
    if let Some(previous) = event.previous_rank {
        fields.push(MessageField::inline("Was", format!("#{}", previous)));
    }
    if let Some(new) = event.new_rank {
        fields.push(MessageField::inline("Now", format!("#{}", new)));
    }
}
