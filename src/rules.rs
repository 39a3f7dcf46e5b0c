//! Transition rule resolution.
//!
//! The resolver turns a validated zone identifier and a target year into a
//! [`TransitionRule`]. Each platform composes its strategies in a fixed
//! order; a year change re-runs the whole procedure rather than
//! extrapolating the prior rule.

use crate::error::Result;
use crate::rule::TransitionRule;
use crate::zone::ZoneName;

#[cfg(test)]
use mockall::automock;

#[cfg(any(unix, test))]
pub(crate) mod date;
#[cfg(any(windows, test))]
pub(crate) mod registry;
#[cfg(any(unix, test))]
pub(crate) mod zdump;

/// Rule resolution as seen by the offset engine.
#[cfg_attr(test, automock)]
pub trait ResolveRules {
    /// Produce the transition rule `zone` observes in `year`.
    fn resolve(&self, zone: &ZoneName, year: i32) -> Result<TransitionRule>;
}

/// The platform composition of the strategies: the transition dump first,
/// then the fixed offset query (Unix-likes); the timezone registry
/// (Windows).
#[derive(Debug, Default)]
pub struct HostRuleResolver;

#[cfg(unix)]
impl ResolveRules for HostRuleResolver {
    fn resolve(&self, zone: &ZoneName, year: i32) -> Result<TransitionRule> {
        use crate::exec::HostRunner;
        use tracing::debug;

        match zdump::resolve(&HostRunner, zone, year) {
            Ok(rule) => Ok(rule),
            Err(e) => {
                debug!("transition dump failed for {zone}: {e}, trying the fixed offset query");
                date::resolve(&HostRunner, zone, year)
            }
        }
    }
}

#[cfg(windows)]
impl ResolveRules for HostRuleResolver {
    fn resolve(&self, zone: &ZoneName, year: i32) -> Result<TransitionRule> {
        registry::resolve(&registry::HostRegistry, zone, year)
    }
}
