use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::{EventCursor, GameEventBus};
use crate::game::{Game, Mode};

const MAX_CUE_LOG: usize = 256;

/// Cues the playback backend knows how to render.
pub const CUES: [&str; 6] = ["jump", "double_jump", "land", "door", "death", "thunder"];

#[derive(Clone, Serialize, Deserialize)]
pub struct CueLog {
    pub frame: u64,
    pub name: String,
    pub volume: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_event: Option<String>,
}

/// The audio collaborator interface: one-shot cue triggers plus a continuous
/// rain-ambience intensity. Synthesis and mixing live outside the core; this
/// resource records what should be audible and at what level.
#[derive(Resource)]
pub struct AudioDirector {
    pub triggers: HashMap<String, String>,
    pub master_volume: f32,
    pub cue_volume: f32,
    pub ambience_volume: f32,
    /// Whether the looped rain bed is running at all.
    pub ambience_on: bool,
    pub ambience_intensity: f32,
    pub recent_cues: Vec<CueLog>,
}

impl Default for AudioDirector {
    fn default() -> Self {
        let mut triggers = HashMap::new();
        triggers.insert("player_jump".to_string(), "jump".to_string());
        triggers.insert("player_air_jump".to_string(), "double_jump".to_string());
        triggers.insert("player_land".to_string(), "land".to_string());
        triggers.insert("door_entered".to_string(), "door".to_string());
        triggers.insert("player_death".to_string(), "death".to_string());
        triggers.insert("thunder".to_string(), "thunder".to_string());
        Self {
            triggers,
            master_volume: 0.6,
            cue_volume: 1.0,
            ambience_volume: 1.0,
            ambience_on: false,
            ambience_intensity: 0.0,
            recent_cues: Vec::new(),
        }
    }
}

impl AudioDirector {
    pub fn trigger_cue(
        &mut self,
        name: &str,
        frame: u64,
        source_event: Option<String>,
    ) -> Result<(), String> {
        if !CUES.contains(&name) {
            return Err(format!("Unknown cue: {name}"));
        }
        let volume = self.cue_volume * self.master_volume;
        self.recent_cues.push(CueLog {
            frame,
            name: name.to_string(),
            volume,
            source_event,
        });
        if self.recent_cues.len() > MAX_CUE_LOG {
            let excess = self.recent_cues.len() - MAX_CUE_LOG;
            self.recent_cues.drain(0..excess);
        }
        Ok(())
    }

    pub fn set_volume(&mut self, channel: &str, value: f32) -> Result<(), String> {
        let v = value.clamp(0.0, 2.0);
        match channel {
            "master" => self.master_volume = v,
            "cue" => self.cue_volume = v,
            "ambience" => self.ambience_volume = v,
            _ => return Err(format!("Unknown volume channel: {channel}")),
        }
        Ok(())
    }

    /// Rain ambience level in [0, 1]; the backend ramps toward it.
    pub fn set_ambience(&mut self, intensity: f32) {
        self.ambience_intensity = intensity.clamp(0.0, 1.0);
    }
}

#[derive(Resource, Default)]
struct AudioEventCursor(EventCursor);

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(AudioDirector::default())
            .insert_resource(AudioEventCursor::default())
            .add_systems(
                Update,
                (cues_from_events, ambience_follows_climb).after(crate::game::tick_game),
            );
    }
}

fn cues_from_events(
    mut audio: ResMut<AudioDirector>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<AudioEventCursor>,
) {
    let events: Vec<(String, u64)> = cursor
        .0
        .drain(&bus)
        .iter()
        .map(|ev| (ev.name.clone(), ev.frame))
        .collect();
    for (name, frame) in events {
        if let Some(cue) = audio.triggers.get(&name).cloned() {
            if let Err(err) = audio.trigger_cue(&cue, frame, Some(name)) {
                warn!("[belfry audio] {err}");
            }
        }
    }
}

/// Climb progress drives the rain: silent on the menus, swelling toward the
/// top of the tower while playing.
fn ambience_follows_climb(game: Res<Game>, mut audio: ResMut<AudioDirector>) {
    match game.mode {
        Mode::Playing | Mode::Transition(_) => {
            audio.ambience_on = true;
            audio.set_ambience(game.climb_progress);
        }
        Mode::Start | Mode::End => {
            audio.ambience_on = false;
            audio.set_ambience(0.0);
        }
    }
}
