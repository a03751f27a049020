//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::host::{CommandOutput, CommandRunner, HostError};
use crate::provider::{ApiFuture, Attachment, AttachmentState, VolumeApi, VolumeDescription};

/// Builds an attachment record for scripted volume states.
#[must_use]
pub fn attachment(instance_id: &str, device: &str, state: AttachmentState) -> Attachment {
    Attachment {
        instance_id: instance_id.to_owned(),
        device: device.to_owned(),
        state,
    }
}

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: std::rc::Rc<std::cell::RefCell<VecDeque<CommandOutput>>>,
    invocations: std::rc::Rc<std::cell::RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: String::from("simulated failure"),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, HostError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| HostError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Records one attach call issued to [`ScriptedVolumeApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachCall {
    /// Volume the call targeted.
    pub volume_id: String,
    /// Instance the volume was attached to.
    pub instance_id: String,
    /// Device path passed along.
    pub device: String,
}

/// Records one detach call issued to [`ScriptedVolumeApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetachCall {
    /// Volume the call targeted.
    pub volume_id: String,
    /// Whether the detach carried the force flag.
    pub force: bool,
}

/// Errors raised by the scripted provider to model failure points.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedVolumeApiError {
    /// Simulated describe failure.
    #[error("describe failure")]
    Describe,
    /// Simulated attach failure.
    #[error("attach failure")]
    Attach,
    /// Simulated detach failure.
    #[error("detach failure")]
    Detach,
}

#[derive(Debug, Default)]
struct ScriptState {
    attachments: Vec<Attachment>,
    pending: VecDeque<Vec<Attachment>>,
    describe_calls: u32,
    attach_calls: Vec<AttachCall>,
    detach_calls: Vec<DetachCall>,
    fail_describe: bool,
    fail_attach: bool,
    fail_detach: bool,
    frozen: bool,
}

/// Scripted provider double that simulates attachment state transitions.
///
/// Mutations queue transitional states that successive describe calls pop
/// one at a time, so wait loops observe the same attaching/attached or
/// detaching/detached progressions a real provider reports. `freeze`
/// pins the current state to model a volume that never settles.
#[derive(Clone, Debug, Default)]
pub struct ScriptedVolumeApi {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedVolumeApi {
    /// Creates a double with no attachments (a detached volume).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a double whose volume starts with the given attachments.
    #[must_use]
    pub fn with_attachments(attachments: Vec<Attachment>) -> Self {
        let double = Self::new();
        double.lock("with_attachments").attachments = attachments;
        double
    }

    /// Queues attachment states served by successive describe calls.
    pub fn queue_states(&self, states: Vec<Vec<Attachment>>) {
        self.lock("queue_states").pending.extend(states);
    }

    /// Pins the current state; mutations stop queueing transitions.
    pub fn freeze(&self) {
        self.lock("freeze").frozen = true;
    }

    /// Makes subsequent describe calls fail.
    pub fn fail_describe(&self) {
        self.lock("fail_describe").fail_describe = true;
    }

    /// Makes subsequent attach calls fail.
    pub fn fail_attach(&self) {
        self.lock("fail_attach").fail_attach = true;
    }

    /// Makes subsequent detach calls fail.
    pub fn fail_detach(&self) {
        self.lock("fail_detach").fail_detach = true;
    }

    /// Number of describe calls observed so far.
    #[must_use]
    pub fn describe_calls(&self) -> u32 {
        self.lock("describe_calls").describe_calls
    }

    /// Snapshot of attach calls observed so far.
    #[must_use]
    pub fn attach_calls(&self) -> Vec<AttachCall> {
        self.lock("attach_calls").attach_calls.clone()
    }

    /// Snapshot of detach calls observed so far.
    #[must_use]
    pub fn detach_calls(&self) -> Vec<DetachCall> {
        self.lock("detach_calls").detach_calls.clone()
    }

    fn lock(&self, context: &str) -> MutexGuard<'_, ScriptState> {
        self.state
            .lock()
            .unwrap_or_else(|err| panic!("lock poisoned in {context}: {err}"))
    }
}

impl VolumeApi for ScriptedVolumeApi {
    type Error = ScriptedVolumeApiError;

    fn describe_volume<'a>(
        &'a self,
        volume_id: &'a str,
    ) -> ApiFuture<'a, VolumeDescription, Self::Error> {
        Box::pin(async move {
            let mut state = self.lock("describe_volume");
            state.describe_calls += 1;
            if state.fail_describe {
                return Err(ScriptedVolumeApiError::Describe);
            }
            if !state.frozen
                && let Some(next) = state.pending.pop_front()
            {
                state.attachments = next;
            }
            Ok(VolumeDescription {
                id: volume_id.to_owned(),
                attachments: state.attachments.clone(),
            })
        })
    }

    fn attach_volume<'a>(
        &'a self,
        volume_id: &'a str,
        instance_id: &'a str,
        device: &'a str,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.lock("attach_volume");
            state.attach_calls.push(AttachCall {
                volume_id: volume_id.to_owned(),
                instance_id: instance_id.to_owned(),
                device: device.to_owned(),
            });
            if state.fail_attach {
                return Err(ScriptedVolumeApiError::Attach);
            }
            if !state.frozen {
                state.pending.push_back(vec![attachment(
                    instance_id,
                    device,
                    AttachmentState::Attaching,
                )]);
                state.pending.push_back(vec![attachment(
                    instance_id,
                    device,
                    AttachmentState::Attached,
                )]);
            }
            Ok(())
        })
    }

    fn detach_volume<'a>(&'a self, volume_id: &'a str, force: bool) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.lock("detach_volume");
            state.detach_calls.push(DetachCall {
                volume_id: volume_id.to_owned(),
                force,
            });
            if state.fail_detach {
                return Err(ScriptedVolumeApiError::Detach);
            }
            if !state.frozen {
                let detaching = state
                    .attachments
                    .iter()
                    .map(|record| Attachment {
                        state: AttachmentState::Detaching,
                        ..record.clone()
                    })
                    .collect();
                state.pending.push_back(detaching);
                state.pending.push_back(Vec::new());
            }
            Ok(())
        })
    }
}
