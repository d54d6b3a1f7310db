//! Real-time feed/spindle override control loop.
//!
//! The manager steers the controller's override percentages toward a
//! target by issuing at most one corrective command per axis per accepted
//! status report, then waiting for the firmware to confirm the change in a
//! later report. A settle interval between corrections keeps the loop from
//! outrunning the firmware and oscillating.

use std::time::{Duration, Instant};

use millstream_core::{ControllerState, ControllerStatus, OverridePercents};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Minimum time between corrective commands.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(50);

/// Which override percentage a command or target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideType {
    Feed,
    Spindle,
}

impl OverrideType {
    pub fn minimum(self) -> i32 {
        10
    }

    pub fn maximum(self) -> i32 {
        200
    }

    pub fn major_step(self) -> i32 {
        10
    }

    pub fn minor_step(self) -> i32 {
        1
    }

    pub fn default_percent(self) -> i32 {
        100
    }
}

/// Opaque corrective commands handed to the sender.
///
/// Coarse commands move by the major step (10%), fine commands by the
/// minor step (1%). How these map onto the wire is the sender's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideCommand {
    FeedCoarsePlus,
    FeedCoarseMinus,
    FeedFinePlus,
    FeedFineMinus,
    SpindleCoarsePlus,
    SpindleCoarseMinus,
    SpindleFinePlus,
    SpindleFineMinus,
}

/// Sink for corrective commands, typically the transport layer.
pub trait OverrideCommandSender: Send + Sync {
    fn send_override_command(&self, command: OverrideCommand) -> anyhow::Result<()>;
}

#[derive(Debug)]
struct Inner {
    target_feed: i32,
    target_spindle: i32,
    reported: OverridePercents,
    state: ControllerState,
    capable: bool,
    running: bool,
    last_sent: Option<Instant>,
}

impl Inner {
    fn new() -> Self {
        Self {
            target_feed: OverrideType::Feed.default_percent(),
            target_spindle: OverrideType::Spindle.default_percent(),
            reported: OverridePercents::default(),
            state: ControllerState::Disconnected,
            capable: false,
            running: false,
            last_sent: None,
        }
    }

    fn available(&self) -> bool {
        self.capable
            && matches!(
                self.state,
                ControllerState::Idle | ControllerState::Run | ControllerState::Hold
            )
    }

    fn settled(&self) -> bool {
        self.target_feed == self.reported.feed && self.target_spindle == self.reported.spindle
    }

    fn target(&self, kind: OverrideType) -> i32 {
        match kind {
            OverrideType::Feed => self.target_feed,
            OverrideType::Spindle => self.target_spindle,
        }
    }
}

/// Drives override percentages toward their targets.
///
/// `set_target` is expected from a UI thread while status reports arrive
/// from the transport thread; all state lives behind one lock and commands
/// are sent after the lock is released.
pub struct OverrideManager<S> {
    sender: S,
    settle_interval: Duration,
    inner: Mutex<Inner>,
}

impl<S: OverrideCommandSender> OverrideManager<S> {
    pub fn new(sender: S) -> Self {
        Self::with_settle_interval(sender, DEFAULT_SETTLE_INTERVAL)
    }

    pub fn with_settle_interval(sender: S, settle_interval: Duration) -> Self {
        Self {
            sender,
            settle_interval,
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Record whether the connected firmware supports real-time overrides.
    pub fn set_capable(&self, capable: bool) {
        self.inner.lock().capable = capable;
    }

    /// Overrides are usable only while the machine is idle, running, or
    /// held, and only on capable firmware.
    pub fn is_available(&self) -> bool {
        self.inner.lock().available()
    }

    /// True while the manager is actively correcting toward a target.
    pub fn is_adjusting(&self) -> bool {
        self.inner.lock().running
    }

    /// True when both reported percentages equal their targets.
    pub fn has_settled(&self) -> bool {
        self.inner.lock().settled()
    }

    pub fn target(&self, kind: OverrideType) -> i32 {
        self.inner.lock().target(kind)
    }

    /// Begin adjusting toward the current targets.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if inner.available() {
            inner.running = true;
        }
    }

    /// Stop adjusting and adopt the reported values as the new targets.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        inner.running = false;
        inner.target_feed = inner.reported.feed;
        inner.target_spindle = inner.reported.spindle;
    }

    /// Set a target percentage and begin adjusting toward it.
    ///
    /// The percent is clamped to the valid range and snapped to the
    /// nearest minor step. One corrective command is issued immediately;
    /// further corrections are driven by incoming status reports. No-op
    /// when overrides are unavailable.
    pub fn set_target(&self, kind: OverrideType, percent: i32) {
        let command = {
            let mut inner = self.inner.lock();
            if !inner.available() {
                return;
            }
            let snapped = snap(kind, percent);
            match kind {
                OverrideType::Feed => inner.target_feed = snapped,
                OverrideType::Spindle => inner.target_spindle = snapped,
            }
            inner.running = true;

            let current = match kind {
                OverrideType::Feed => inner.reported.feed,
                OverrideType::Spindle => inner.reported.spindle,
            };
            let command = correction(kind, snapped, current);
            if command.is_some() {
                inner.last_sent = Some(Instant::now());
            }
            command
        };
        if let Some(command) = command {
            self.send(command);
        }
    }

    /// Reset both targets to 100%, typically at stream boundaries.
    pub fn reset_all(&self) {
        self.set_target(OverrideType::Feed, OverrideType::Feed.default_percent());
        self.set_target(
            OverrideType::Spindle,
            OverrideType::Spindle.default_percent(),
        );
    }

    /// Feed one controller status report into the loop.
    ///
    /// While idle the targets track the reported values, so overrides
    /// applied elsewhere (a physical dial, another sender) are not fought.
    /// While adjusting, a report is acted on only after the settle
    /// interval has elapsed since the last correction, and produces at
    /// most one command per axis.
    pub fn process_status(&self, status: &ControllerStatus) {
        let commands = {
            let mut inner = self.inner.lock();
            inner.state = status.state;
            inner.reported = status.overrides;

            if !inner.available() {
                return;
            }

            if !inner.running {
                inner.target_feed = inner.reported.feed;
                inner.target_spindle = inner.reported.spindle;
                return;
            }

            if inner.settled() {
                inner.running = false;
                debug!(
                    feed = inner.reported.feed,
                    spindle = inner.reported.spindle,
                    "override targets reached"
                );
                return;
            }

            if let Some(sent) = inner.last_sent {
                if sent.elapsed() < self.settle_interval {
                    return;
                }
            }

            let mut commands = Vec::with_capacity(2);
            if let Some(cmd) =
                correction(OverrideType::Feed, inner.target_feed, inner.reported.feed)
            {
                commands.push(cmd);
            }
            if let Some(cmd) = correction(
                OverrideType::Spindle,
                inner.target_spindle,
                inner.reported.spindle,
            ) {
                commands.push(cmd);
            }
            if !commands.is_empty() {
                inner.last_sent = Some(Instant::now());
            }
            commands
        };

        for command in commands {
            self.send(command);
        }
    }

    fn send(&self, command: OverrideCommand) {
        debug!(?command, "sending override correction");
        if let Err(err) = self.sender.send_override_command(command) {
            // The loop retries on the next status report.
            error!(?command, %err, "failed to send override command");
        }
    }
}

/// Clamp to the valid range and snap to the nearest minor step.
fn snap(kind: OverrideType, percent: i32) -> i32 {
    let step = kind.minor_step();
    let snapped = round_half_up(percent as f64 / step as f64) * step;
    snapped.clamp(kind.minimum(), kind.maximum())
}

/// One corrective step for a single axis, or `None` when on target.
fn correction(kind: OverrideType, target: i32, current: i32) -> Option<OverrideCommand> {
    let delta = (target - current) as f64;
    let major = round_half_up(delta / kind.major_step() as f64);
    let minor = round_half_up(delta / kind.minor_step() as f64);

    use OverrideCommand::*;
    let command = if major < 0 {
        match kind {
            OverrideType::Feed => FeedCoarseMinus,
            OverrideType::Spindle => SpindleCoarseMinus,
        }
    } else if major > 0 {
        match kind {
            OverrideType::Feed => FeedCoarsePlus,
            OverrideType::Spindle => SpindleCoarsePlus,
        }
    } else if minor < 0 {
        match kind {
            OverrideType::Feed => FeedFineMinus,
            OverrideType::Spindle => SpindleFineMinus,
        }
    } else if minor > 0 {
        match kind {
            OverrideType::Feed => FeedFinePlus,
            OverrideType::Spindle => SpindleFinePlus,
        }
    } else {
        return None;
    };
    Some(command)
}

// Rounds halves toward positive infinity. A residue of exactly half a
// major step must fall through to fine steps on the decreasing side,
// otherwise the loop ping-pongs around the target.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
