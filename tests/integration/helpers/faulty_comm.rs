//! A communicator that misbehaves on one chosen message.

#![allow(dead_code)]

use segsort_lib::comm::{Communicator, LocalComm, MessageTag};
use segsort_lib::errors::Result;
use segsort_lib::SegsortError;

/// What to do with the targeted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail the send with a communication error.
    FailSend,
    /// Deliver an image holding zero records instead of the real payload.
    EmptyPayload,
}

/// Wraps a [`LocalComm`], injecting `fault` when this rank sends `tag`.
pub struct FaultyComm {
    inner: LocalComm,
    fault: Option<(MessageTag, Fault)>,
}

impl FaultyComm {
    pub fn new(inner: LocalComm, fault: Option<(MessageTag, Fault)>) -> Self {
        Self { inner, fault }
    }
}

impl Communicator for FaultyComm {
    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn num_ranks(&self) -> usize {
        self.inner.num_ranks()
    }

    fn send(&self, dest: usize, tag: MessageTag, payload: Vec<u8>) -> Result<()> {
        match self.fault {
            Some((target, Fault::FailSend)) if target == tag => Err(SegsortError::communication(
                tag.label,
                format!("to rank {dest}"),
                "link down",
            )),
            Some((target, Fault::EmptyPayload)) if target == tag => {
                self.inner.send(dest, tag, 0u64.to_le_bytes().to_vec())
            }
            _ => self.inner.send(dest, tag, payload),
        }
    }

    fn recv(&self, src: usize, tag: MessageTag) -> Result<Vec<u8>> {
        self.inner.recv(src, tag)
    }

    fn all_gather(&self, value: u64) -> Result<Vec<u64>> {
        self.inner.all_gather(value)
    }
}
