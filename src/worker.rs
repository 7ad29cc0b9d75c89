// src/worker.rs

use std::{
    panic::{self, AssertUnwindSafe},
    thread,
};

use crossbeam::channel::{unbounded, Receiver, Sender};
use indexmap::IndexMap;

use crate::engine::{OperationResult, TweakEngine, TweakState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerMessage {
    RefreshStates,
    Apply(String),
    Revert(String),
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Apply,
    Revert,
}

#[derive(Clone, Debug)]
pub enum WorkerResult {
    States(IndexMap<String, TweakState>),
    Completed {
        id: String,
        action: Operation,
        result: OperationResult,
    },
}

/// Runs engine operations on a background thread, one at a time and in the
/// order they were sent.
pub struct TweakExecutor {
    pub sender: Sender<WorkerMessage>,
    pub receiver: Receiver<WorkerResult>,
}

impl TweakExecutor {
    pub fn new(mut engine: TweakEngine) -> Self {
        let (task_sender, task_receiver) = unbounded::<WorkerMessage>();
        let (result_sender, result_receiver) = unbounded::<WorkerResult>();

        thread::spawn(move || {
            // Wrap the entire thread in a catch_unwind so a panic is logged instead of lost
            let thread_result = panic::catch_unwind(AssertUnwindSafe(|| {
                while let Ok(message) = task_receiver.recv() {
                    let reply = match message {
                        WorkerMessage::RefreshStates => WorkerResult::States(engine.states()),
                        WorkerMessage::Apply(id) => {
                            tracing::info!("{} -> Starting apply.", id);
                            let result = engine.apply(&id);
                            WorkerResult::Completed {
                                id,
                                action: Operation::Apply,
                                result,
                            }
                        }
                        WorkerMessage::Revert(id) => {
                            tracing::info!("{} -> Starting revert.", id);
                            let result = engine.revert(&id);
                            WorkerResult::Completed {
                                id,
                                action: Operation::Revert,
                                result,
                            }
                        }
                        WorkerMessage::Shutdown => {
                            tracing::info!("TweakExecutor received shutdown signal.");
                            break;
                        }
                    };

                    if result_sender.send(reply).is_err() {
                        tracing::debug!("Result receiver dropped, stopping worker.");
                        break;
                    }
                }
            }));

            if let Err(e) = thread_result {
                tracing::error!("Worker thread panicked: {:?}", e);
            }

            tracing::info!("TweakExecutor thread terminating.");
        });

        Self {
            sender: task_sender,
            receiver: result_receiver,
        }
    }

    /// Queues a message. Returns `false` if the worker is gone.
    pub fn send(&self, message: WorkerMessage) -> bool {
        match self.sender.send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to send {:?} to the worker.", e.into_inner());
                false
            }
        }
    }

    /// A finished result, if one is waiting.
    pub fn try_recv(&self) -> Option<WorkerResult> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for TweakExecutor {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerMessage::Shutdown);
    }
}
