//! Result matchers for supported engines.

mod google;

pub use google::{GoogleResultMatcher, MatcherRules};
