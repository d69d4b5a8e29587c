//! Test support utilities
//!
//! In-memory mock implementations of the crate's seams. Available to this
//! crate's unit tests and, behind the `test-utils` feature, to downstream
//! crates' tests.

pub mod mocks;

pub use mocks::{
    MockCredentialStore, MockDriverOutcome, MockInteractionDriver, MockOAuthClient,
};
