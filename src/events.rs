use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

const MAX_EVENTS: usize = 500;

/// One-shot simulation event carried to the presentation layer.
#[derive(Serialize, Clone)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
}

/// Bounded FIFO of recent events. Producers push; each consumer walks the
/// buffer with its own cursor so a slow consumer never blocks a fast one.
#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, name: impl Into<String>, data: serde_json::Value) {
        self.recent.push_back(GameEvent {
            name: name.into(),
            data,
            frame: self.frame,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[belfry events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }
}

/// Per-consumer read position into the bus. Events strictly newer than the
/// cursor are handed out exactly once.
#[derive(Default, Clone, Copy)]
pub struct EventCursor {
    last_frame: u64,
    seen_in_frame: usize,
}

impl EventCursor {
    pub fn drain<'a>(&mut self, bus: &'a GameEventBus) -> Vec<&'a GameEvent> {
        let mut out = Vec::new();
        let mut count_in_frame = 0usize;
        for ev in bus.recent.iter() {
            if ev.frame < self.last_frame {
                continue;
            }
            if ev.frame == self.last_frame {
                count_in_frame += 1;
                if count_in_frame <= self.seen_in_frame {
                    continue;
                }
            } else {
                count_in_frame = 1;
            }
            out.push(ev);
            self.last_frame = ev.frame;
            self.seen_in_frame = count_in_frame;
        }
        out
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameEventBus::default())
            .add_systems(PreUpdate, tick_event_frame);
    }
}

fn tick_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}
