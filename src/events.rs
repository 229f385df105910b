// Edge-triggered threshold events: one notification per transition, never per sample.

use crate::models::{ICON_ALERT, ICON_WARN, Notification, Sample};

pub const HIGH_LOAD_ENTER: f64 = 1.5;
pub const HIGH_LOAD_EXIT: f64 = 1.0;

pub const MSG_HIGH_LOAD: &str = "Pico de Carga (>1.5)";
pub const MSG_LOAD_RECOVERED: &str = "Carga Estabilizada";
pub const MSG_SSH_DOWN: &str = "SSH Caiu";
pub const MSG_SSH_RECOVERED: &str = "SSH Recuperado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Entered,
    Exited,
}

/// Remembers whether a condition is currently active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latch {
    active: bool,
}

impl Latch {
    /// `enter` is only honoured while released and `exit` only while latched, so
    /// transitions strictly alternate.
    pub fn update(&mut self, enter: bool, exit: bool) -> Option<Transition> {
        if !self.active && enter {
            self.active = true;
            Some(Transition::Entered)
        } else if self.active && exit {
            self.active = false;
            Some(Transition::Exited)
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug, Default)]
pub struct EventDetector {
    high_load: Latch,
    ssh_down: Latch,
}

impl EventDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events caused by this sample, high-load first.
    pub fn observe(&mut self, load: f64, ssh_up: bool) -> Vec<Notification> {
        let mut events = Vec::new();

        // 1.0..=1.5 is the hysteresis band: no change either way.
        match self
            .high_load
            .update(load > HIGH_LOAD_ENTER, load < HIGH_LOAD_EXIT)
        {
            Some(Transition::Entered) => events.push(Notification::warn(ICON_WARN, MSG_HIGH_LOAD)),
            Some(Transition::Exited) => events.push(Notification::success(MSG_LOAD_RECOVERED)),
            None => {}
        }

        match self.ssh_down.update(!ssh_up, ssh_up) {
            Some(Transition::Entered) => events.push(Notification::danger(ICON_ALERT, MSG_SSH_DOWN)),
            Some(Transition::Exited) => events.push(Notification::success(MSG_SSH_RECOVERED)),
            None => {}
        }

        events
    }

    pub fn observe_sample(&mut self, sample: &Sample) -> Vec<Notification> {
        self.observe(sample.cpu_load, sample.ssh_up)
    }

    pub fn high_load_active(&self) -> bool {
        self.high_load.is_active()
    }

    pub fn ssh_down_active(&self) -> bool {
        self.ssh_down.is_active()
    }
}
