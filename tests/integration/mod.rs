//! End-to-end tests of the session, composition and commit pipeline.
//!
//! Each submodule drives the public API the way a generator would: build a
//! session, run transformations, then assert on diffs or commit.

mod composition;
mod moves;
mod round_trip;
mod scenarios;
