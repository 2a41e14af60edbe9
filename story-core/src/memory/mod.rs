//! Narrative memory for story consistency.
//!
//! This module holds the running state of one story session: the world and
//! its rules, the cast, the objects that have appeared, the facts established
//! so far, the inconsistencies detected in generated text, and the turn
//! history.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     NarrativeState                       │
//! │                                                          │
//! │  ┌──────────┐  ┌────────────┐  ┌──────────────────────┐  │
//! │  │ World    │  │ Characters │  │ Items (unique name)  │  │
//! │  └──────────┘  └────────────┘  └──────────────────────┘  │
//! │  ┌──────────┐  ┌─────────────────┐  ┌────────────────┐   │
//! │  │ Facts    │  │ Inconsistencies │  │ Turn history   │   │
//! │  └──────────┘  └─────────────────┘  └────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Facts, inconsistencies and history are append-only. Items are keyed by
//! name and never updated once recorded.

mod fact;
mod inconsistency;
mod store;
mod world;

pub use fact::{Fact, Item};
pub use inconsistency::{BannedObject, Inconsistency, ViolationKind, SNIPPET_CHARS};
pub use store::{MergeSummary, NarrativeState, TurnRecord};
pub use world::{Character, World};
