// Timer-delayed game-flow actions (countdown, hole transitions, lobby return).
use bevy::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    Countdown(u32),
    BeginMatch,
    BeginHole(usize),
    ReturnToLobby,
}

#[derive(Debug)]
struct Pending {
    timer: Timer,
    action: FlowAction,
}

#[derive(Resource, Debug, Default)]
pub struct DelayedActions {
    pending: Vec<Pending>,
}

impl DelayedActions {
    pub fn schedule(&mut self, delay_secs: f32, action: FlowAction) {
        self.pending.push(Pending {
            timer: Timer::from_seconds(delay_secs.max(0.0), TimerMode::Once),
            action,
        });
    }

    /// Advances every timer; returns the actions that came due, in schedule order.
    pub fn tick(&mut self, delta: Duration) -> Vec<FlowAction> {
        let mut due = Vec::new();
        self.pending.retain_mut(|p| {
            p.timer.tick(delta);
            if p.timer.finished() {
                due.push(p.action);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, action: FlowAction) -> bool {
        self.pending.iter().any(|p| p.action == action)
    }
}
